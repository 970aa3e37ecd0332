//! Task abstraction accepted by the scheduler.

use std::future::Future;

use async_trait::async_trait;

use super::AppResult;

/// A unit of work that can be started once and eventually yields a value or fails.
///
/// The scheduler never inspects the task; it only bounds how many of them are
/// in flight. Closures returning a future of `Result<T, E>` are tasks through
/// the blanket implementation below, so most callers never implement this
/// trait by hand. Closure tasks must own what they touch (`'static`), the
/// same bound a spawned future carries.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use prometheus_scheduler::core::{AppResult, Task};
///
/// struct Download {
///     url: String,
/// }
///
/// #[async_trait]
/// impl Task for Download {
///     type Output = usize;
///
///     async fn run(self) -> AppResult<usize> {
///         Ok(self.url.len())
///     }
/// }
/// ```
#[async_trait]
pub trait Task: Send {
    /// Value produced on success.
    type Output: Send;

    /// Start the task and drive it to completion.
    async fn run(self) -> AppResult<Self::Output>;
}

#[async_trait]
impl<F, Fut, T, E> Task for F
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Into<anyhow::Error> + 'static,
{
    type Output = T;

    async fn run(self) -> AppResult<T> {
        (self)().await.map_err(Into::into)
    }
}
