//! Test utilities for infinite-scroll integration tests
#![allow(dead_code, unused_imports)]

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Semaphore};
use tracing::Level;

pub use infinite_scroll::ankurah_signals::{Get, Read, Subscribe, SubscriptionGuard};
pub use infinite_scroll::{
    FetchError, ListItem, LoaderConfig, LoaderState, ManualSurface, PageSource, ScrollSurface, Session,
    TokioExecutor,
};

/// Test post model, shaped like the demo page's posts
#[derive(ListItem, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestPost {
    pub id: u64,
    pub title: String,
}

impl TestPost {
    pub fn new(id: u64) -> Self {
        Self { id, title: format!("Post {}", id) }
    }
}

// Initialize tracing for tests
#[ctor::ctor]
fn init_tracing() {
    if let Ok(level) = std::env::var("LOG_LEVEL") {
        let level = level.parse::<Level>().unwrap_or(Level::INFO);
        let _ = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_test_writer()
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_max_level(Level::INFO)
            .with_test_writer()
            .try_init();
    }
}

/// Posts with the given ids, in order
pub fn posts(ids: impl IntoIterator<Item = u64>) -> Vec<TestPost> {
    ids.into_iter().map(TestPost::new).collect()
}

/// Seed posts, titled the way the demo page titles its initial items
pub fn initial_posts(ids: impl IntoIterator<Item = u64>) -> Vec<TestPost> {
    ids.into_iter()
        .map(|id| TestPost { id, title: format!("Initial Post {}", id) })
        .collect()
}

/// Extract ids from a list of posts
pub fn ids(items: &[TestPost]) -> Vec<u64> {
    items.iter().map(|item| item.id).collect()
}

/// Let spawned tasks run until they block
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

pub fn surface(viewport: f64, content: f64) -> Arc<ManualSurface> {
    Arc::new(ManualSurface::new(viewport, content))
}

// ============================================================================
// MockSource
// ============================================================================

/// Page source generating sequential posts.
///
/// Page `p` with `n` items per page yields ids `offset + (p-1)*n + 1 ..= offset + p*n`.
/// With offset 0 this reproduces a source that ignores seed items, so page 1 overlaps
/// any seeded ids 1..n. Fetches can be held behind a gate, made to fail, or capped
/// at a total item count.
#[derive(Clone)]
pub struct MockSource {
    inner: Arc<MockInner>,
}

struct MockInner {
    id_offset: u64,
    total: Option<u64>,
    gate: Option<Semaphore>,
    calls: Mutex<Vec<(u32, usize)>>,
    failures: Mutex<VecDeque<String>>,
    overrides: Mutex<HashMap<u32, Vec<TestPost>>>,
}

impl MockSource {
    pub fn new(id_offset: u64) -> Self {
        Self::build(id_offset, None, false)
    }

    /// Every fetch waits for a [`release`](Self::release)
    pub fn gated(id_offset: u64) -> Self {
        Self::build(id_offset, None, true)
    }

    /// Only `total` items exist beyond the offset
    pub fn with_total(id_offset: u64, total: u64) -> Self {
        Self::build(id_offset, Some(total), false)
    }

    fn build(id_offset: u64, total: Option<u64>, gated: bool) -> Self {
        Self {
            inner: Arc::new(MockInner {
                id_offset,
                total,
                gate: gated.then(|| Semaphore::new(0)),
                calls: Mutex::new(Vec::new()),
                failures: Mutex::new(VecDeque::new()),
                overrides: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Let `n` pending or future fetches complete
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.inner.gate {
            gate.add_permits(n);
        }
    }

    /// The next fetch fails with `message`
    pub fn fail_next(&self, message: &str) {
        self.inner.failures.lock().unwrap().push_back(message.to_string());
    }

    /// Serve `items` for `page` instead of the generated sequence
    pub fn set_page(&self, page: u32, items: Vec<TestPost>) {
        self.inner.overrides.lock().unwrap().insert(page, items);
    }

    /// (page, items_per_page) of every fetch so far
    pub fn calls(&self) -> Vec<(u32, usize)> {
        self.inner.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.inner.calls.lock().unwrap().len()
    }
}

impl PageSource<TestPost> for MockSource {
    fn fetch(
        &self,
        page: u32,
        items_per_page: usize,
    ) -> impl Future<Output = Result<Vec<TestPost>, FetchError>> + Send {
        self.inner.calls.lock().unwrap().push((page, items_per_page));
        let inner = self.inner.clone();
        async move {
            if let Some(gate) = &inner.gate {
                gate.acquire().await.expect("gate closed").forget();
            }
            if let Some(message) = inner.failures.lock().unwrap().pop_front() {
                return Err(FetchError::new(message));
            }
            if let Some(items) = inner.overrides.lock().unwrap().get(&page) {
                return Ok(items.clone());
            }
            let per_page = items_per_page as u64;
            let first = inner.id_offset + (page as u64 - 1) * per_page + 1;
            let mut last = inner.id_offset + page as u64 * per_page;
            if let Some(total) = inner.total {
                last = last.min(inner.id_offset + total);
            }
            Ok(posts(first..=last))
        }
    }
}

// ============================================================================
// StateWatcher
// ============================================================================

/// Collects LoaderState updates published by a Session, the way a renderer would.
pub struct StateWatcher {
    signal: Read<LoaderState<TestPost>>,
    rx: mpsc::UnboundedReceiver<LoaderState<TestPost>>,
    _guard: SubscriptionGuard,
}

impl StateWatcher {
    pub fn new(signal: Read<LoaderState<TestPost>>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let guard = signal.subscribe(move |state: LoaderState<TestPost>| {
            let _ = tx.send(state);
        });
        Self { signal, rx, _guard: guard }
    }

    pub fn current(&self) -> LoaderState<TestPost> {
        self.signal.get()
    }

    /// Wait until the state satisfies `pred`, panicking after 500ms.
    pub async fn wait_for(
        &mut self,
        what: &str,
        pred: impl Fn(&LoaderState<TestPost>) -> bool,
    ) -> LoaderState<TestPost> {
        let wait = async {
            loop {
                let state = self.current();
                if pred(&state) {
                    return state;
                }
                self.rx.recv().await.expect("channel closed");
            }
        };
        match tokio::time::timeout(Duration::from_millis(500), wait).await {
            Ok(state) => state,
            Err(_) => panic!("timed out waiting for {}", what),
        }
    }

    /// Assert no update is published within 20ms
    pub async fn assert_quiet(&mut self) {
        while self.rx.try_recv().is_ok() {}
        match tokio::time::timeout(Duration::from_millis(20), self.rx.recv()).await {
            Ok(Some(state)) => panic!("unexpected state update: {:?}", state),
            Ok(None) => panic!("channel closed"),
            Err(_) => {} // timeout - good
        }
    }
}

/// Assert the state equals what a fresh session with these seed items publishes
pub fn assert_fresh(state: &LoaderState<TestPost>, seed: &[TestPost]) {
    assert_eq!(
        state,
        &LoaderState {
            items: seed.to_vec(),
            last_batch: Vec::new(),
            is_loading: false,
            page: 1,
            has_more: true,
            error: None,
        },
        "state is not fresh"
    );
}
