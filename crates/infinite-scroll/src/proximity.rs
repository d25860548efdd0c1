//! Scroll Proximity Monitor
//!
//! Watches a [`ScrollSurface`] and reports when the remaining distance to the bottom
//! edge drops to the configured threshold. It never debounces: every qualifying
//! event invokes the callback, and the consumer decides whether to act on it.

use std::sync::Arc;

use crate::surface::{ScrollMetrics, ScrollSurface, SurfaceSubscription};

// ============================================================================
// Proximity Math
// ============================================================================

/// Distance left to scroll before the viewport reaches the end of the content.
///
/// Negative when the content is shorter than the viewport.
pub fn remaining_distance(metrics: &ScrollMetrics) -> f64 {
    metrics.content_extent - metrics.scroll_offset - metrics.viewport_extent
}

/// Result of evaluating surface geometry against the threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriggerCheck {
    /// Not close enough to the bottom edge
    None,
    /// Within threshold; carries the remaining distance
    Crossed(f64),
}

impl TriggerCheck {
    pub fn is_crossed(&self) -> bool {
        matches!(self, TriggerCheck::Crossed(_))
    }
}

pub fn check_trigger(metrics: &ScrollMetrics, threshold: f64) -> TriggerCheck {
    let remaining = remaining_distance(metrics);
    if remaining <= threshold {
        TriggerCheck::Crossed(remaining)
    } else {
        TriggerCheck::None
    }
}

// ============================================================================
// ProximityMonitor
// ============================================================================

/// Callback fired when the threshold is crossed
pub type ThresholdCallback = Arc<dyn Fn() + Send + Sync>;

struct Attachment {
    surface: Arc<dyn ScrollSurface>,
    _subscription: SurfaceSubscription,
}

pub struct ProximityMonitor {
    threshold: f64,
    attachment: Option<Attachment>,
}

impl ProximityMonitor {
    pub fn new(threshold: f64) -> Self {
        Self { threshold, attachment: None }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Subscribe to `surface`, replacing any previous attachment.
    ///
    /// Only subsequent surface events are evaluated. The owner runs the initial
    /// layout pass with [`probe`](Self::probe) once it is ready to receive the callback,
    /// so that content shorter than the viewport still triggers a first load.
    pub fn attach(&mut self, surface: Arc<dyn ScrollSurface>, on_crossed: ThresholdCallback) {
        self.detach();
        let threshold = self.threshold;
        let subscription = surface.subscribe(Arc::new(move |metrics: ScrollMetrics| {
            if let TriggerCheck::Crossed(remaining) = check_trigger(&metrics, threshold) {
                tracing::debug!("proximity: remaining={} <= threshold={}", remaining, threshold);
                on_crossed();
            }
        }));
        self.attachment = Some(Attachment { surface, _subscription: subscription });
    }

    /// Drop the surface subscription. Calling this while detached does nothing.
    pub fn detach(&mut self) {
        if self.attachment.take().is_some() {
            tracing::debug!("proximity: detached");
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attachment.is_some()
    }

    pub fn surface(&self) -> Option<Arc<dyn ScrollSurface>> {
        self.attachment.as_ref().map(|a| a.surface.clone())
    }

    /// Evaluate the attached surface's current geometry without waiting for an event
    pub fn probe(&self) -> TriggerCheck {
        match &self.attachment {
            Some(attachment) => check_trigger(&attachment.surface.metrics(), self.threshold),
            None => TriggerCheck::None,
        }
    }
}

impl std::fmt::Debug for ProximityMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProximityMonitor")
            .field("threshold", &self.threshold)
            .field("attached", &self.is_attached())
            .finish()
    }
}
