//! Page Fetch Controller
//!
//! Synchronous bookkeeping for page requests: the next page number, the
//! at-most-one-in-flight guard, optional end-of-data, and the generation tag that lets a
//! reset orphan whatever request was outstanding. The async fetch itself is driven
//! by the session; this type only decides whether a fetch may start and how its
//! result is settled.

/// A dispatched page request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchTicket {
    /// Session generation that issued the request
    pub generation: u64,
    /// Page number requested (1-based)
    pub page: u32,
    pub items_per_page: usize,
}

/// Why a trigger did not start a fetch
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Declined {
    /// A fetch is already in flight
    Loading,
    /// A short page has already been received and the controller stops on short pages
    Exhausted,
}

/// How a settled ticket related to the controller's current generation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Settled {
    /// The ticket belonged to the live session and its result was applied
    Current,
    /// The ticket was issued before a reset; its result must be discarded
    Stale,
}

#[derive(Clone, Debug)]
pub struct PageFetchController {
    page: u32,
    generation: u64,
    in_flight: Option<FetchTicket>,
    stop_on_short_page: bool,
    exhausted: bool,
}

impl Default for PageFetchController {
    fn default() -> Self {
        Self { page: 1, generation: 0, in_flight: None, stop_on_short_page: false, exhausted: false }
    }
}

impl PageFetchController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next page to request
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Treat a page shorter than requested as the end of data. Off by default, in
    /// which case a short page advances like any other.
    pub fn set_stop_on_short_page(&mut self, stop: bool) {
        self.stop_on_short_page = stop;
    }

    pub fn has_more(&self) -> bool {
        !self.exhausted
    }

    pub fn in_flight(&self) -> Option<FetchTicket> {
        self.in_flight
    }

    /// Claim the in-flight slot for the next page
    pub fn begin(&mut self, items_per_page: usize) -> Result<FetchTicket, Declined> {
        if self.in_flight.is_some() {
            return Err(Declined::Loading);
        }
        if self.exhausted {
            return Err(Declined::Exhausted);
        }
        let ticket = FetchTicket { generation: self.generation, page: self.page, items_per_page };
        self.in_flight = Some(ticket);
        Ok(ticket)
    }

    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        self.in_flight.as_ref() == Some(ticket)
    }

    /// Settle a successful fetch that returned `received` items.
    ///
    /// Advances the page and releases the slot. With stop-on-short-page enabled, a page
    /// shorter than requested marks the end of data.
    pub fn succeed(&mut self, ticket: &FetchTicket, received: usize) -> Settled {
        if !self.is_current(ticket) {
            return Settled::Stale;
        }
        self.in_flight = None;
        self.page += 1;
        if self.stop_on_short_page && received < ticket.items_per_page {
            self.exhausted = true;
        }
        Settled::Current
    }

    /// Settle a failed fetch. The page is not advanced, so the next trigger retries it.
    pub fn fail(&mut self, ticket: &FetchTicket) -> Settled {
        if !self.is_current(ticket) {
            return Settled::Stale;
        }
        self.in_flight = None;
        Settled::Current
    }

    /// Start a new generation: page 1, idle, not exhausted. Outstanding tickets become stale.
    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.page = 1;
        self.in_flight = None;
        self.exhausted = false;
    }
}
