//! Infinite Scroll - scroll-triggered incremental list loader

pub mod accumulator;
pub mod config;
pub mod controller;
pub mod error;
pub mod executor;
pub mod proximity;
pub mod session;
pub mod source;
pub mod surface;

use std::fmt::Debug;
use std::hash::Hash;

// Re-export key types
pub use accumulator::{ItemAccumulator, Merged};
pub use config::LoaderConfig;
pub use controller::{FetchTicket, PageFetchController};
pub use error::{ConfigError, FetchError, LoadError};
#[cfg(feature = "tokio")]
pub use executor::TokioExecutor;
pub use executor::{Executor, FnExecutor, Task};
pub use proximity::{ProximityMonitor, TriggerCheck};
pub use session::{LoadOutcome, Session};
pub use source::PageSource;
pub use surface::{ManualSurface, ScrollMetrics, ScrollSurface, SurfaceListener, SurfaceSubscription};
pub use ankurah_signals;

// ============================================================================
// Core Types
// ============================================================================

/// An item the loader can accumulate.
///
/// The loader looks at nothing but the identifier, which must be unique across
/// everything loaded in one session.
///
/// ```ignore
/// #[derive(Clone, ListItem)]
/// #[list_item(id_field = "post_id")]
/// struct Post {
///     post_id: u64,
///     title: String,
/// }
/// ```
pub trait ListItem {
    type Id: Clone + Eq + Hash + Debug + Send + Sync + 'static;

    fn id(&self) -> Self::Id;
}

/// Loader state exposed to the renderer
#[derive(Clone, Debug, PartialEq)]
pub struct LoaderState<T> {
    /// Every item loaded so far: seed items first, then pages in arrival order
    pub items: Vec<T>,
    /// The most recently fetched page, exactly as the source returned it
    pub last_batch: Vec<T>,
    /// True while a fetch is in flight
    pub is_loading: bool,
    /// Next page to request (1-based)
    pub page: u32,
    /// False once a short page arrived, when the config stops on short pages
    pub has_more: bool,
    /// Message of the most recent fetch failure, cleared by the next success
    pub error: Option<String>,
}

impl<T> Default for LoaderState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            last_batch: Vec::new(),
            is_loading: false,
            page: 1,
            has_more: true,
            error: None,
        }
    }
}

pub use infinite_scroll_derive::ListItem;
