//! Incremental page accumulation for search.
//!
//! One pass keeps fetching consecutive upstream pages until it has collected
//! enough good items, runs out of upstream pages, or hits the per-pass page
//! ceiling. [`SearchSessions`] owns one [`AccumulationState`] per UI session and
//! guards it against overlapping passes and stale results.

use serde::{Deserialize, Serialize};
use std::collections::{hash_map::Entry, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::{sync::Mutex, time::Instant};

use crate::{
    error::AppError,
    models::{CatalogItem, CatalogKey},
    services::{
        normalize::normalize_page,
        providers::{CatalogFetcher, FetchRequest},
        quality::{filter_batch, remember, QualityThresholds},
        ranking::rank,
    },
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccumulationPhase {
    #[default]
    Idle,
    Accumulating,
    /// Every upstream page has been fetched
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassKind {
    /// Start over from page 1
    Fresh,
    /// Continue after the last fetched page
    LoadMore,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccumulatorSettings {
    pub initial_target: usize,
    pub load_more_target: usize,
    pub page_ceiling: u32,
    pub quality: QualityThresholds,
    /// Sessions untouched for this long are dropped
    pub session_idle_ttl: Duration,
}

impl Default for AccumulatorSettings {
    fn default() -> Self {
        Self {
            initial_target: 20,
            load_more_target: 10,
            page_ceiling: 5,
            quality: QualityThresholds::default(),
            session_idle_ttl: Duration::from_secs(1800),
        }
    }
}

impl AccumulatorSettings {
    /// Items a pass of this kind tries to add
    pub fn target(&self, kind: PassKind) -> usize {
        match kind {
            PassKind::Fresh => self.initial_target,
            PassKind::LoadMore => self.load_more_target,
        }
    }
}

/// Running result set of one query
#[derive(Debug, Clone, Default)]
pub struct AccumulationState {
    pub query: String,
    pub phase: AccumulationPhase,
    /// 0 until the first page arrives
    pub last_fetched_page: u32,
    /// Upstream page count as last reported
    pub total_pages: Option<u32>,
    pub results: Vec<CatalogItem>,
    accepted: HashSet<CatalogKey>,
}

impl AccumulationState {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    fn next_page(&self) -> u32 {
        self.last_fetched_page + 1
    }

    fn pages_remaining(&self) -> bool {
        match self.total_pages {
            Some(total) => self.next_page() <= total,
            None => true,
        }
    }

    fn restart(&mut self) {
        *self = Self::new(std::mem::take(&mut self.query));
    }
}

/// Why a pass stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    TargetReached,
    PagesExhausted,
    PageCeiling,
    FetchFailed,
    /// Nothing left to fetch before the pass started
    AlreadyExhausted,
}

#[derive(Debug)]
pub struct PassReport {
    pub state: AccumulationState,
    pub pages_fetched: u32,
    pub added: usize,
    pub stop: StopReason,
    /// Set when a page fetch failed; results gathered before it are kept
    pub error: Option<AppError>,
}

/// Runs one accumulation pass over `request`
///
/// Everything accepted during the pass is ranked as one set and appended after
/// the existing results, so items already in `state.results` never move. A
/// failed fetch ends the pass with the phase left `Idle` so the same pass can
/// be retried.
pub async fn run_pass(
    fetcher: &dyn CatalogFetcher,
    request: &FetchRequest,
    mut state: AccumulationState,
    kind: PassKind,
    settings: &AccumulatorSettings,
) -> PassReport {
    if kind == PassKind::Fresh {
        state.restart();
    }

    if state.phase == AccumulationPhase::Exhausted || !state.pages_remaining() {
        state.phase = AccumulationPhase::Exhausted;
        return PassReport {
            state,
            pages_fetched: 0,
            added: 0,
            stop: StopReason::AlreadyExhausted,
            error: None,
        };
    }

    state.phase = AccumulationPhase::Accumulating;
    let target = settings.target(kind);
    let hint = request.category_hint();
    let mut pages_fetched = 0;
    let mut added = 0;
    let mut accepted_this_pass = Vec::new();
    let mut error = None;

    let stop = loop {
        if added >= target {
            break StopReason::TargetReached;
        }
        if !state.pages_remaining() {
            break StopReason::PagesExhausted;
        }
        if pages_fetched >= settings.page_ceiling {
            break StopReason::PageCeiling;
        }

        let page = state.next_page();
        let raw = match fetcher.fetch_page(request, page).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(
                    request = %request,
                    page = page,
                    kept = state.results.len(),
                    error = %e,
                    "Page fetch failed, ending pass"
                );
                error = Some(e);
                break StopReason::FetchFailed;
            }
        };

        pages_fetched += 1;
        state.last_fetched_page = page;
        state.total_pages = Some(raw.total_pages);

        let kept = filter_batch(normalize_page(&raw, hint), &state.accepted, &settings.quality);
        remember(&mut state.accepted, &kept);
        added += kept.len();
        accepted_this_pass.extend(kept);
    };

    state.results.extend(rank(accepted_this_pass));

    state.phase = if state.pages_remaining() {
        AccumulationPhase::Idle
    } else {
        AccumulationPhase::Exhausted
    };

    tracing::debug!(
        request = %request,
        pages_fetched = pages_fetched,
        added = added,
        total = state.results.len(),
        stop = ?stop,
        phase = ?state.phase,
        "Accumulation pass finished"
    );

    PassReport {
        state,
        pages_fetched,
        added,
        stop,
        error,
    }
}

/// What happened to one trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerOutcome {
    /// The pass ran and its results were committed
    Completed,
    /// The pass ran until a page fetch failed; earlier results were committed
    Failed,
    /// Another pass for the same query was already running
    Dropped,
    /// The query changed or the session was discarded while the pass ran
    Stale,
    /// Nothing left to fetch
    NoOp,
    /// Blank query; the session was removed
    Cleared,
}

/// Client view of a session
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SessionSnapshot {
    pub query: String,
    pub phase: AccumulationPhase,
    pub last_fetched_page: u32,
    pub total_pages: Option<u32>,
    pub results: Vec<CatalogItem>,
}

impl From<&AccumulationState> for SessionSnapshot {
    fn from(state: &AccumulationState) -> Self {
        Self {
            query: state.query.clone(),
            phase: state.phase,
            last_fetched_page: state.last_fetched_page,
            total_pages: state.total_pages,
            results: state.results.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TriggerResult {
    pub outcome: TriggerOutcome,
    pub pages_fetched: u32,
    pub added: usize,
    /// Recoverable fetch error of this pass
    pub error: Option<String>,
    pub session: SessionSnapshot,
}

impl TriggerResult {
    fn untouched(outcome: TriggerOutcome, state: &AccumulationState) -> Self {
        Self {
            outcome,
            pages_fetched: 0,
            added: 0,
            error: None,
            session: state.into(),
        }
    }
}

#[derive(Debug)]
struct SessionSlot {
    state: AccumulationState,
    /// Assigned per query; passes carrying another generation are discarded
    generation: u64,
    last_touched: Instant,
}

impl SessionSlot {
    fn new(query: &str, generation: u64) -> Self {
        Self {
            state: AccumulationState::new(query),
            generation,
            last_touched: Instant::now(),
        }
    }
}

#[derive(Debug, Default)]
struct SessionRegistry {
    slots: HashMap<String, SessionSlot>,
    /// Never reused, also not after a session is discarded and recreated
    next_generation: u64,
}

impl SessionRegistry {
    /// Drops sessions idle for at least `ttl`; sessions with a pass in flight stay
    fn evict_idle(&mut self, ttl: Duration) {
        let before = self.slots.len();
        self.slots.retain(|_, slot| {
            slot.state.phase == AccumulationPhase::Accumulating || slot.last_touched.elapsed() < ttl
        });

        let evicted = before - self.slots.len();
        if evicted > 0 {
            tracing::debug!(evicted = evicted, remaining = self.slots.len(), "Evicted idle search sessions");
        }
    }

    /// The slot for `session_id`, reset under a new generation when its query differs
    fn slot_for(&mut self, session_id: &str, query: &str) -> &mut SessionSlot {
        match self.slots.entry(session_id.to_string()) {
            Entry::Occupied(entry) if entry.get().state.query == query => entry.into_mut(),
            entry => {
                self.next_generation += 1;
                let fresh = SessionSlot::new(query, self.next_generation);
                match entry {
                    Entry::Occupied(mut entry) => {
                        entry.insert(fresh);
                        entry.into_mut()
                    }
                    Entry::Vacant(entry) => entry.insert(fresh),
                }
            }
        }
    }
}

type SessionMap = Arc<Mutex<SessionRegistry>>;

/// Per-session search state, one writer per session at a time
pub struct SearchSessions {
    fetcher: Arc<dyn CatalogFetcher>,
    settings: AccumulatorSettings,
    sessions: SessionMap,
}

impl SearchSessions {
    pub fn new(fetcher: Arc<dyn CatalogFetcher>, settings: AccumulatorSettings) -> Self {
        Self {
            fetcher,
            settings,
            sessions: Arc::new(Mutex::new(SessionRegistry::default())),
        }
    }

    /// Handles one UI action (query change or "load more") for a session
    ///
    /// The pass runs on its own task and commits even if the caller goes away,
    /// so a session is never left stuck in `Accumulating`.
    pub async fn trigger(&self, session_id: &str, query: &str, kind: PassKind) -> TriggerResult {
        let query = query.trim().to_string();

        let (work, kind, generation) = {
            let mut registry = self.sessions.lock().await;
            registry.evict_idle(self.settings.session_idle_ttl);

            if query.is_empty() {
                if registry.slots.remove(session_id).is_some() {
                    tracing::debug!(session_id = %session_id, "Query cleared, session removed");
                }
                return TriggerResult::untouched(TriggerOutcome::Cleared, &AccumulationState::default());
            }

            let slot = registry.slot_for(session_id, &query);
            slot.last_touched = Instant::now();

            if slot.state.phase == AccumulationPhase::Accumulating {
                tracing::debug!(session_id = %session_id, query = %query, "Pass already running, dropping trigger");
                return TriggerResult::untouched(TriggerOutcome::Dropped, &slot.state);
            } else if kind == PassKind::LoadMore
                && slot.state.phase == AccumulationPhase::Exhausted
            {
                return TriggerResult::untouched(TriggerOutcome::NoOp, &slot.state);
            }

            // A first pass on a new query is always a fresh pass
            let kind = if slot.state.last_fetched_page == 0 {
                PassKind::Fresh
            } else {
                kind
            };

            let work = slot.state.clone();
            slot.state.phase = AccumulationPhase::Accumulating;
            (work, kind, slot.generation)
        };

        let fetcher = Arc::clone(&self.fetcher);
        let sessions = Arc::clone(&self.sessions);
        let settings = self.settings;
        let id = session_id.to_string();

        let task = tokio::spawn(async move {
            let request = FetchRequest::Search { query };
            let report = run_pass(fetcher.as_ref(), &request, work, kind, &settings).await;
            commit(&sessions, &id, generation, report).await
        });

        match task.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(session_id = %session_id, error = %e, "Search pass task failed");
                let mut registry = self.sessions.lock().await;
                let state = match registry.slots.get_mut(session_id) {
                    Some(slot) if slot.generation == generation => {
                        slot.state.phase = AccumulationPhase::Idle;
                        slot.state.clone()
                    }
                    Some(slot) => slot.state.clone(),
                    None => AccumulationState::default(),
                };
                TriggerResult {
                    error: Some(AppError::Internal(e.to_string()).to_string()),
                    ..TriggerResult::untouched(TriggerOutcome::Failed, &state)
                }
            }
        }
    }

    /// Current view of a session, if it exists
    pub async fn snapshot(&self, session_id: &str) -> Option<SessionSnapshot> {
        let registry = self.sessions.lock().await;
        registry.slots.get(session_id).map(|slot| (&slot.state).into())
    }

    /// Forgets a session; any pass still running for it is discarded on completion
    pub async fn discard(&self, session_id: &str) -> bool {
        self.sessions.lock().await.slots.remove(session_id).is_some()
    }
}

/// Stores a finished pass unless its query generation has been superseded
async fn commit(
    sessions: &Mutex<SessionRegistry>,
    session_id: &str,
    generation: u64,
    report: PassReport,
) -> TriggerResult {
    let mut registry = sessions.lock().await;
    let slot = match registry.slots.get_mut(session_id) {
        Some(slot) if slot.generation == generation => slot,
        Some(slot) => {
            tracing::debug!(session_id = %session_id, query = %report.state.query, "Discarding stale pass");
            return TriggerResult::untouched(TriggerOutcome::Stale, &slot.state);
        }
        None => {
            return TriggerResult::untouched(TriggerOutcome::Stale, &report.state);
        }
    };

    let outcome = match (&report.error, report.stop) {
        (Some(_), _) => TriggerOutcome::Failed,
        (None, StopReason::AlreadyExhausted) => TriggerOutcome::NoOp,
        (None, _) => TriggerOutcome::Completed,
    };

    slot.state = report.state;
    slot.last_touched = Instant::now();

    tracing::info!(
        session_id = %session_id,
        query = %slot.state.query,
        outcome = ?outcome,
        pages_fetched = report.pages_fetched,
        added = report.added,
        results = slot.state.results.len(),
        "Search pass committed"
    );

    TriggerResult {
        outcome,
        pages_fetched: report.pages_fetched,
        added: report.added,
        error: report.error.map(|e| e.to_string()),
        session: (&slot.state).into(),
    }
}
