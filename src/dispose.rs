//! Disposal traits for resource cleanup, run in LIFO order at scope end and
//! container teardown.

/// Implement for services that need structured synchronous teardown (closing
/// files, flushing caches). Disposal hooks run in LIFO order.
pub trait Dispose: Send + Sync + 'static {
    fn dispose(&self);
}

/// Implement for services that need async teardown (closing network
/// connections). Async hooks run before sync hooks, also LIFO.
#[async_trait::async_trait]
pub trait AsyncDispose: Send + Sync + 'static {
    async fn dispose(&self);
}
