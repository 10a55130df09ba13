//! Port trait definitions (Hexagonal Architecture)
//!
//! The engine depends only on these capabilities:
//! - Executable: the opaque work bound to a task
//! - LifecycleNotifier / StoreListener: notification fan-out
//! - Clock / IdGenerator: time and identity sources
//! - EffectRunner: host effect execution for the request layer

pub mod clock;
pub mod effect_runner;
pub mod executable;
pub mod notifier;

pub use clock::{Clock, IdGenerator, SystemClock, UuidGenerator};
pub use effect_runner::{EffectRunner, ExecutionContext};
pub use executable::{work, Executable};
pub use notifier::{LifecycleNotifier, NoopNotifier, StoreListener};
