//! Scrollable surface abstraction

use std::sync::{Arc, Mutex, Weak};

/// Geometry of a scrollable surface, in the surface's own units (usually pixels)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollMetrics {
    /// Distance scrolled from the top of the content
    pub scroll_offset: f64,
    /// Visible extent of the surface
    pub viewport_extent: f64,
    /// Total extent of the content
    pub content_extent: f64,
}

impl ScrollMetrics {
    pub fn new(scroll_offset: f64, viewport_extent: f64, content_extent: f64) -> Self {
        Self { scroll_offset, viewport_extent, content_extent }
    }

    /// Largest valid scroll offset
    pub fn max_scroll_offset(&self) -> f64 {
        (self.content_extent - self.viewport_extent).max(0.0)
    }
}

/// Listener invoked with fresh metrics whenever the surface scrolls, resizes or its content changes
pub type SurfaceListener = Arc<dyn Fn(ScrollMetrics) + Send + Sync>;

/// A scrollable region the loader can watch
pub trait ScrollSurface: Send + Sync + 'static {
    /// Current geometry
    fn metrics(&self) -> ScrollMetrics;

    /// Register for change notifications. Dropping the returned guard unsubscribes.
    fn subscribe(&self, listener: SurfaceListener) -> SurfaceSubscription;
}

/// Keeps a surface listener registered until dropped
#[must_use = "dropping the subscription unsubscribes immediately"]
pub struct SurfaceSubscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl SurfaceSubscription {
    pub fn new(unsubscribe: impl FnOnce() + Send + 'static) -> Self {
        Self { unsubscribe: Some(Box::new(unsubscribe)) }
    }

    /// A subscription with nothing to release (for surfaces that never notify)
    pub fn detached() -> Self {
        Self { unsubscribe: None }
    }

    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl Drop for SurfaceSubscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for SurfaceSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceSubscription").field("active", &self.unsubscribe.is_some()).finish()
    }
}

// ============================================================================
// ManualSurface
// ============================================================================

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, SurfaceListener)>,
}

/// In-memory surface driven by explicit calls.
///
/// Suitable for headless hosts that compute layout themselves, and for tests. Every
/// mutation notifies subscribers with the resulting metrics, the way a browser
/// container reports scroll and resize events. Scroll offsets are clamped to
/// `[0, content_extent - viewport_extent]`.
pub struct ManualSurface {
    metrics: Mutex<ScrollMetrics>,
    listeners: Arc<Mutex<Listeners>>,
}

impl ManualSurface {
    pub fn new(viewport_extent: f64, content_extent: f64) -> Self {
        Self {
            metrics: Mutex::new(ScrollMetrics::new(0.0, viewport_extent, content_extent)),
            listeners: Arc::new(Mutex::new(Listeners::default())),
        }
    }

    pub fn scroll_to(&self, offset: f64) {
        self.update(|m| m.scroll_offset = offset);
    }

    pub fn scroll_by(&self, delta: f64) {
        self.update(|m| m.scroll_offset += delta);
    }

    pub fn scroll_to_end(&self) {
        self.update(|m| m.scroll_offset = m.max_scroll_offset());
    }

    pub fn set_viewport_extent(&self, viewport_extent: f64) {
        self.update(|m| m.viewport_extent = viewport_extent);
    }

    pub fn set_content_extent(&self, content_extent: f64) {
        self.update(|m| m.content_extent = content_extent);
    }

    /// Number of live subscriptions
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap_or_else(|e| e.into_inner()).entries.len()
    }

    fn update(&self, mutate: impl FnOnce(&mut ScrollMetrics)) {
        let metrics = {
            let mut metrics = self.metrics.lock().unwrap_or_else(|e| e.into_inner());
            mutate(&mut metrics);
            metrics.scroll_offset = metrics.scroll_offset.clamp(0.0, metrics.max_scroll_offset());
            *metrics
        };
        // Snapshot so listeners may re-enter the surface
        let listeners: Vec<SurfaceListener> = self
            .listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entries
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(metrics);
        }
    }
}

impl ScrollSurface for ManualSurface {
    fn metrics(&self) -> ScrollMetrics {
        *self.metrics.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn subscribe(&self, listener: SurfaceListener) -> SurfaceSubscription {
        let id = {
            let mut listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
            let id = listeners.next_id;
            listeners.next_id += 1;
            listeners.entries.push((id, listener));
            id
        };
        let registry: Weak<Mutex<Listeners>> = Arc::downgrade(&self.listeners);
        SurfaceSubscription::new(move || {
            if let Some(registry) = registry.upgrade() {
                registry.lock().unwrap_or_else(|e| e.into_inner()).entries.retain(|(entry, _)| *entry != id);
            }
        })
    }
}

impl std::fmt::Debug for ManualSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualSurface")
            .field("metrics", &self.metrics())
            .field("listeners", &self.listener_count())
            .finish()
    }
}
