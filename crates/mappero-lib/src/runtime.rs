//! Task spawning for background route requests
//!
//! Remote routers run their HTTP request on the tokio runtime the embedding
//! application provides; nothing here creates a runtime of its own.

/// Spawn an async task on the ambient tokio runtime.
pub(crate) fn spawn<F>(future: F) -> tokio::task::JoinHandle<F::Output>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    // Tag spawned requests in profiling traces
    #[cfg(feature = "profiling")]
    {
        tokio::spawn(async move {
            profiling::scope!(
                "runtime::spawn",
                format!("task_type={}", std::any::type_name::<F>()).as_str()
            );
            future.await
        })
    }
    #[cfg(not(feature = "profiling"))]
    {
        tokio::spawn(future)
    }
}

/// Check if we're running inside a tokio runtime context.
pub(crate) fn in_runtime_context() -> bool {
    tokio::runtime::Handle::try_current().is_ok()
}
