//! Session Controller
//!
//! Composes the proximity monitor, the page fetch controller and the item
//! accumulator, and publishes their combined state through a signal.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use ankurah_signals::{Mut, Peek, Read};

use crate::accumulator::ItemAccumulator;
use crate::config::LoaderConfig;
use crate::controller::{FetchTicket, PageFetchController, Settled};
use crate::error::{ConfigError, LoadError};
use crate::executor::Executor;
use crate::proximity::ProximityMonitor;
use crate::source::PageSource;
use crate::surface::ScrollSurface;
use crate::{ListItem, LoaderState};

/// What became of a load that ran to completion without failing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The page was applied to the live session
    Loaded {
        page: u32,
        /// Items returned by the source
        fetched: usize,
        /// Items that were new to the accumulated list
        added: usize,
    },
    /// A reset happened while the fetch was in flight; the result was discarded
    Stale,
}

// ============================================================================
// Internal state
// ============================================================================

struct Core<T: ListItem> {
    items_per_page: usize,
    threshold: f64,
    accumulator: ItemAccumulator<T>,
    controller: PageFetchController,
    last_batch: Vec<T>,
    error: Option<String>,
    version: u64,
}

impl<T: ListItem + Clone> Core<T> {
    fn new(config: LoaderConfig<T>) -> Self {
        let mut accumulator = ItemAccumulator::new();
        accumulator.seed(config.initial_items);
        let mut controller = PageFetchController::new();
        controller.set_stop_on_short_page(config.stop_on_short_page);
        Self {
            items_per_page: config.items_per_page,
            threshold: config.threshold,
            accumulator,
            controller,
            last_batch: Vec::new(),
            error: None,
            version: 0,
        }
    }

    /// Discard everything and adopt `config`. Outstanding fetches become stale.
    fn reinitialize(&mut self, config: LoaderConfig<T>) {
        self.controller.invalidate();
        self.controller.set_stop_on_short_page(config.stop_on_short_page);
        self.accumulator.seed(config.initial_items);
        self.items_per_page = config.items_per_page;
        self.threshold = config.threshold;
        self.last_batch.clear();
        self.error = None;
    }

    fn snapshot(&mut self) -> (u64, LoaderState<T>) {
        self.version += 1;
        let state = LoaderState {
            items: self.accumulator.items().to_vec(),
            last_batch: self.last_batch.clone(),
            is_loading: self.controller.is_loading(),
            page: self.controller.page(),
            has_more: self.controller.has_more(),
            error: self.error.clone(),
        };
        (self.version, state)
    }
}

struct Inner<T: ListItem, S> {
    source: S,
    executor: Arc<dyn Executor>,
    core: Mutex<Core<T>>,
    monitor: Mutex<ProximityMonitor>,
    state: Mut<LoaderState<T>>,
    /// Newest snapshot handed to `publish`, with its version
    latest: Mutex<(u64, LoaderState<T>)>,
}

impl<T, S> Inner<T, S>
where
    T: ListItem + Clone + Send + Sync + 'static,
    S: PageSource<T>,
{
    fn core(&self) -> MutexGuard<'_, Core<T>> {
        self.core.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn monitor(&self) -> MutexGuard<'_, ProximityMonitor> {
        self.monitor.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Publish a snapshot unless a newer one was already handed in. Never called with a
    /// lock held, so subscribers may call back into the session.
    ///
    /// Racing publishers may `set` out of order. Each one re-reads the newest snapshot
    /// after its `set` and publishes again until nothing newer has arrived, so the
    /// signal always ends on the newest state.
    fn publish(&self, (version, state): (u64, LoaderState<T>)) {
        {
            let mut latest = self.latest.lock().unwrap_or_else(|e| e.into_inner());
            if latest.0 >= version {
                return;
            }
            *latest = (version, state);
        }
        let mut delivered = 0;
        loop {
            let (version, state) = {
                let latest = self.latest.lock().unwrap_or_else(|e| e.into_inner());
                if latest.0 == delivered {
                    break;
                }
                (latest.0, latest.1.clone())
            };
            self.state.set(state);
            delivered = version;
        }
    }

    fn try_trigger(self: &Arc<Self>) -> bool {
        match self.begin_load() {
            Some(load) => {
                self.executor.spawn(Box::pin(async move {
                    // Failures are recorded in the state and logged by `complete`
                    let _ = load.await;
                }));
                true
            }
            None => false,
        }
    }

    /// Claim the in-flight slot and return the future that performs the fetch
    fn begin_load(self: &Arc<Self>) -> Option<impl Future<Output = Result<LoadOutcome, LoadError>> + Send + 'static> {
        let (ticket, snapshot) = {
            let mut core = self.core();
            let items_per_page = core.items_per_page;
            match core.controller.begin(items_per_page) {
                Ok(ticket) => (ticket, core.snapshot()),
                Err(reason) => {
                    tracing::debug!("trigger dropped: {:?} (page={})", reason, core.controller.page());
                    return None;
                }
            }
        };
        tracing::debug!(
            "loading page {} ({} per page, generation {})",
            ticket.page,
            ticket.items_per_page,
            ticket.generation
        );
        self.publish(snapshot);

        let pending = PendingLoad { inner: self.clone(), ticket: Some(ticket) };
        Some(pending.run())
    }

    /// Release the slot held by a load whose future was dropped before the fetch resolved.
    /// The page is not advanced, so the next trigger requests it again.
    fn abandon(&self, ticket: FetchTicket) {
        let snapshot = {
            let mut core = self.core();
            if core.controller.fail(&ticket) == Settled::Stale {
                return;
            }
            tracing::debug!("load of page {} dropped before completion", ticket.page);
            core.snapshot()
        };
        self.publish(snapshot);
    }

    async fn complete(&self, ticket: FetchTicket) -> Result<LoadOutcome, LoadError> {
        let result = self.source.fetch(ticket.page, ticket.items_per_page).await;

        let (outcome, snapshot) = {
            let mut core = self.core();
            let outcome = match result {
                Ok(page) => {
                    let fetched = page.len();
                    if core.controller.succeed(&ticket, fetched) == Settled::Stale {
                        tracing::debug!("discarding stale page {} from generation {}", ticket.page, ticket.generation);
                        return Ok(LoadOutcome::Stale);
                    }
                    let merged = core.accumulator.merge(page);
                    if merged.skipped() > 0 {
                        tracing::debug!("page {}: skipped {} duplicate items", ticket.page, merged.skipped());
                    }
                    let added = merged.added;
                    core.last_batch = merged.batch;
                    core.error = None;
                    Ok(LoadOutcome::Loaded { page: ticket.page, fetched, added })
                }
                Err(source) => {
                    if core.controller.fail(&ticket) == Settled::Stale {
                        tracing::debug!("discarding stale failure for page {}: {}", ticket.page, source);
                        return Ok(LoadOutcome::Stale);
                    }
                    tracing::warn!("fetching page {} failed: {}", ticket.page, source);
                    core.error = Some(source.to_string());
                    Err(LoadError::Fetch { page: ticket.page, source })
                }
            };
            (outcome, core.snapshot())
        };
        self.publish(snapshot);
        outcome
    }

    fn attach(self: &Arc<Self>, surface: Arc<dyn ScrollSurface>) {
        let weak = Arc::downgrade(self);
        self.monitor().attach(
            surface,
            Arc::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.try_trigger();
                }
            }),
        );
        self.schedule_probe();
    }

    /// Evaluate the freshly attached surface once, after the caller has observed the
    /// initial state. Content shorter than the viewport never produces a scroll event,
    /// so without this the first page would never load.
    fn schedule_probe(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        let generation = self.core().controller.generation();
        self.executor.spawn(Box::pin(async move {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            if inner.core().controller.generation() != generation {
                return;
            }
            let check = inner.monitor().probe();
            if check.is_crossed() {
                tracing::debug!("initial layout probe: {:?}", check);
                inner.try_trigger();
            }
        }));
    }
}

/// An in-flight load. Dropping it before the fetch settles frees the slot.
struct PendingLoad<T, S>
where
    T: ListItem + Clone + Send + Sync + 'static,
    S: PageSource<T>,
{
    inner: Arc<Inner<T, S>>,
    ticket: Option<FetchTicket>,
}

impl<T, S> PendingLoad<T, S>
where
    T: ListItem + Clone + Send + Sync + 'static,
    S: PageSource<T>,
{
    async fn run(mut self) -> Result<LoadOutcome, LoadError> {
        let Some(ticket) = self.ticket else {
            return Ok(LoadOutcome::Stale);
        };
        let outcome = self.inner.complete(ticket).await;
        // `complete` settled the ticket
        self.ticket = None;
        outcome
    }
}

impl<T, S> Drop for PendingLoad<T, S>
where
    T: ListItem + Clone + Send + Sync + 'static,
    S: PageSource<T>,
{
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            self.inner.abandon(ticket);
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// A live loading session bound to one configuration and (optionally) one surface.
///
/// Cloning the state signal is cheap; the session itself is usually held in an `Arc`
/// by whatever renders it.
pub struct Session<T: ListItem, S> {
    inner: Arc<Inner<T, S>>,
}

impl<T, S> Session<T, S>
where
    T: ListItem + Clone + Send + Sync + 'static,
    S: PageSource<T>,
{
    /// Start a session: seed the items, attach to `surface`, and schedule the initial
    /// layout probe on `executor`.
    ///
    /// # Arguments
    /// * `config` - Page size, trigger threshold and seed items
    /// * `source` - Data source queried for pages 1, 2, ...
    /// * `surface` - Scrollable surface to watch
    /// * `executor` - Runs fetches and the initial probe
    pub fn start(
        config: LoaderConfig<T>,
        source: S,
        surface: Arc<dyn ScrollSurface>,
        executor: impl Executor,
    ) -> Result<Self, ConfigError> {
        let session = Self::new(config, source, executor)?;
        session.inner.attach(surface);
        Ok(session)
    }

    /// Create a session with no surface attached. Loading happens only through
    /// [`load_next`](Self::load_next)/[`try_trigger`](Self::try_trigger) until
    /// [`attach`](Self::attach) is called.
    pub fn new(config: LoaderConfig<T>, source: S, executor: impl Executor) -> Result<Self, ConfigError> {
        config.validate()?;
        let threshold = config.threshold;
        let mut core = Core::new(config);
        let (version, initial) = core.snapshot();
        tracing::debug!("session start: {} seed items, threshold {}", initial.items.len(), threshold);

        let inner = Arc::new(Inner {
            source,
            executor: Arc::new(executor),
            core: Mutex::new(core),
            monitor: Mutex::new(ProximityMonitor::new(threshold)),
            state: Mut::new(initial.clone()),
            latest: Mutex::new((version, initial)),
        });
        Ok(Self { inner })
    }

    // Accessors
    pub fn state(&self) -> Read<LoaderState<T>> {
        self.inner.state.read()
    }

    /// Current state without registering as an observer
    pub fn snapshot(&self) -> LoaderState<T> {
        self.inner.state.peek()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.core().controller.is_loading()
    }

    /// Next page that will be requested
    pub fn page(&self) -> u32 {
        self.inner.core().controller.page()
    }

    pub fn items_per_page(&self) -> usize {
        self.inner.core().items_per_page
    }

    pub fn threshold(&self) -> f64 {
        self.inner.core().threshold
    }

    /// Request the next page in the background unless a fetch is already in flight
    /// or the session stopped on a short page. Returns whether a fetch was started.
    pub fn try_trigger(&self) -> bool {
        self.inner.try_trigger()
    }

    /// Like [`try_trigger`](Self::try_trigger), but hands the fetch to the caller.
    ///
    /// The loading flag is set before this returns. Dropping the future before it
    /// completes clears the flag again without advancing the page.
    pub fn load_next(&self) -> Option<impl Future<Output = Result<LoadOutcome, LoadError>> + Send + 'static> {
        self.inner.begin_load()
    }

    /// Watch `surface`, replacing the current one. Accumulated items are kept.
    pub fn attach(&self, surface: Arc<dyn ScrollSurface>) {
        self.inner.attach(surface);
    }

    pub fn detach(&self) {
        self.inner.monitor().detach();
    }

    pub fn is_attached(&self) -> bool {
        self.inner.monitor().is_attached()
    }

    /// Throw away all state and start over with `config`.
    ///
    /// The monitor is detached and reattached to `surface`, or to the current surface
    /// when `None`. Any fetch still in flight is orphaned: its result is ignored. An
    /// invalid `config` is rejected and leaves the session as it was.
    pub fn reset(&self, config: LoaderConfig<T>, surface: Option<Arc<dyn ScrollSurface>>) -> Result<(), ConfigError> {
        config.validate()?;
        let surface = surface.or_else(|| self.inner.monitor().surface());
        let threshold = config.threshold;

        // Replacing the monitor drops the old subscription
        *self.inner.monitor() = ProximityMonitor::new(threshold);

        let snapshot = {
            let mut core = self.inner.core();
            core.reinitialize(config);
            tracing::debug!(
                "session reset: generation {}, {} seed items",
                core.controller.generation(),
                core.accumulator.len()
            );
            core.snapshot()
        };
        self.inner.publish(snapshot);

        if let Some(surface) = surface {
            self.inner.attach(surface);
        }
        Ok(())
    }
}

impl<T: ListItem, S> Drop for Session<T, S> {
    fn drop(&mut self) {
        // In-flight fetches keep `inner` alive; stop reacting to the surface now
        self.inner.monitor.lock().unwrap_or_else(|e| e.into_inner()).detach();
    }
}
