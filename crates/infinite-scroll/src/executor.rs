//! Where fetch futures run

use std::future::Future;
use std::pin::Pin;

/// A spawned unit of loader work
pub type Task = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Runs loader tasks to completion in the background
pub trait Executor: Send + Sync + 'static {
    fn spawn(&self, task: Task);
}

/// Spawns onto the ambient tokio runtime. Must be used from within a runtime context.
#[cfg(feature = "tokio")]
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioExecutor;

#[cfg(feature = "tokio")]
impl Executor for TokioExecutor {
    fn spawn(&self, task: Task) {
        tokio::spawn(task);
    }
}

/// Adapts any spawn function (e.g. `wasm_bindgen_futures::spawn_local` behind a `SendWrapper`)
pub struct FnExecutor<F>(pub F);

impl<F> Executor for FnExecutor<F>
where
    F: Fn(Task) + Send + Sync + 'static,
{
    fn spawn(&self, task: Task) {
        (self.0)(task)
    }
}
