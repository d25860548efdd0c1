//! Per-session loader configuration

use crate::error::ConfigError;

/// Immutable configuration for one loading session.
///
/// Every parameter change flows through [`Session::reset`](crate::Session::reset);
/// a running session never mutates its configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct LoaderConfig<T> {
    /// Items requested per fetch
    pub items_per_page: usize,
    /// Remaining distance to the bottom edge (surface units) at or below which a fetch triggers
    pub threshold: f64,
    /// Items seeded before any fetch, in display order
    pub initial_items: Vec<T>,
    /// Stop loading once the source returns fewer than `items_per_page` items
    pub stop_on_short_page: bool,
}

impl<T> LoaderConfig<T> {
    pub fn new(items_per_page: usize, threshold: f64) -> Self {
        Self { items_per_page, threshold, initial_items: Vec::new(), stop_on_short_page: false }
    }

    pub fn with_initial_items(mut self, items: impl IntoIterator<Item = T>) -> Self {
        self.initial_items = items.into_iter().collect();
        self
    }

    pub fn with_stop_on_short_page(mut self, stop: bool) -> Self {
        self.stop_on_short_page = stop;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.items_per_page == 0 {
            return Err(ConfigError::ZeroItemsPerPage);
        }
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(ConfigError::InvalidThreshold(self.threshold));
        }
        Ok(())
    }
}
