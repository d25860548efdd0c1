//! Page data sources

use std::future::Future;

use crate::error::FetchError;

/// Produces pages of items on request.
///
/// Page numbers start at 1. A source may be backed by anything (network, database,
/// local generator); the loader only requires that the returned future be `Send`
/// so it can be spawned onto an [`Executor`](crate::Executor).
///
/// Any `Fn(u32, usize) -> impl Future<Output = Result<Vec<T>, E>>` closure is a source,
/// with `E` converted through its `Display` output.
pub trait PageSource<T>: Send + Sync + 'static {
    fn fetch(&self, page: u32, items_per_page: usize) -> impl Future<Output = Result<Vec<T>, FetchError>> + Send;
}

impl<T, F, Fut, E> PageSource<T> for F
where
    F: Fn(u32, usize) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<T>, E>> + Send,
    E: std::fmt::Display,
{
    fn fetch(&self, page: u32, items_per_page: usize) -> impl Future<Output = Result<Vec<T>, FetchError>> + Send {
        let request = self(page, items_per_page);
        async move { request.await.map_err(|e| FetchError::new(e.to_string())) }
    }
}
