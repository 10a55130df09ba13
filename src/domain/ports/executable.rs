//! Opaque unit of deferred work.

use std::future::Future;

use anyhow::Result;
use async_trait::async_trait;

/// Work bound to a deferred task.
///
/// `run` consumes the boxed value, so a task's work can be started at most
/// once. Failures are reported through the returned `Result`; the engine logs
/// them and never propagates them to the caller that triggered execution.
#[async_trait]
pub trait Executable: Send + 'static {
    async fn run(self: Box<Self>) -> Result<()>;
}

#[async_trait]
impl<F, Fut> Executable for F
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    async fn run(self: Box<Self>) -> Result<()> {
        (*self)().await
    }
}

/// Box a closure as task work.
pub fn work<F, Fut>(f: F) -> Box<dyn Executable>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Box::new(f)
}
