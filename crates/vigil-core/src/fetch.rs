//! Bounded fetch-state container.
//!
//! Every captured-data panel (app logs, console, network, diagnostics,
//! status, health) carries the same state shape and the same transition
//! rules; this module owns them once. The transition function is total —
//! any action applies in any state, nothing panics — and pure: callers get
//! a new state value, the input is never touched.
//!
//! Ordering between overlapping fetches is NOT the reducer's problem.
//! [`FetchStore`] layers a monotonically increasing completion token on top
//! so a stale in-flight completion cannot clobber the outcome of a newer
//! fetch; the reducer itself stays total.

use chrono::{DateTime, Utc};

// ── FetchState ────────────────────────────────────────────────────────────────

/// State of one captured-data panel.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchState<T> {
    /// The payload. Domain-specific; reset to the initial value on failure.
    pub data: T,
    /// Total count available upstream, independent of local retention.
    /// `None` means unknown (never fetched, or the last fetch failed).
    pub total: Option<usize>,
    /// True while a fetch is in flight.
    pub loading: bool,
    /// Last fetch failure, human-readable. Cleared on start and on success.
    pub error: Option<String>,
    /// Pure UI visibility flag; has no bearing on fetch behavior.
    pub expanded: bool,
    /// Wall-clock time of the last successful fetch.
    pub fetched_at: Option<DateTime<Utc>>,
    /// Whether this panel's data should be bundled into an outgoing report.
    pub include: bool,
}

impl<T> FetchState<T> {
    /// The initial state: no data fetched, nothing in flight, included by
    /// default.
    pub fn initial(data: T) -> Self {
        Self {
            data,
            total: None,
            loading: false,
            error: None,
            expanded: false,
            fetched_at: None,
            include: true,
        }
    }
}

// ── FetchAction ───────────────────────────────────────────────────────────────

/// Transition vocabulary for [`reduce`].
#[derive(Debug, Clone)]
pub enum FetchAction<T> {
    /// A fetch started: raise `loading`, clear any previous error.
    Start,
    /// A fetch succeeded. `total` is the untruncated upstream count so the
    /// truncation flag stays computable after local capping.
    Success {
        data: T,
        total: Option<usize>,
        fetched_at: DateTime<Utc>,
    },
    /// A fetch failed. Resets the payload — failed fetches never leave
    /// stale-but-displayed data behind.
    Error(String),
    /// UI visibility toggle.
    SetExpanded(bool),
    /// Report-inclusion toggle.
    SetInclude(bool),
    /// Back to the initial state entirely, `include` included.
    Reset,
}

/// Apply one action to a panel state, returning the next state.
///
/// Total over all `(state, action)` pairs; the input state is never mutated.
/// `initial` supplies the payload value that `Error` and `Reset` restore.
pub fn reduce<T: Clone>(
    initial: &T,
    state: &FetchState<T>,
    action: FetchAction<T>,
) -> FetchState<T> {
    match action {
        FetchAction::Start => FetchState {
            loading: true,
            error: None,
            ..state.clone()
        },
        FetchAction::Success {
            data,
            total,
            fetched_at,
        } => FetchState {
            data,
            total,
            loading: false,
            error: None,
            fetched_at: Some(fetched_at),
            ..state.clone()
        },
        FetchAction::Error(message) => FetchState {
            data: initial.clone(),
            total: None,
            loading: false,
            error: Some(message),
            fetched_at: None,
            ..state.clone()
        },
        FetchAction::SetExpanded(expanded) => FetchState {
            expanded,
            ..state.clone()
        },
        FetchAction::SetInclude(include) => FetchState {
            include,
            ..state.clone()
        },
        FetchAction::Reset => FetchState::initial(initial.clone()),
    }
}

/// True iff more data exists upstream than was retained locally.
///
/// An unknown total is never "truncated", and neither is retaining more than
/// the reported total (stale totals from a previous window).
pub fn is_truncated(total: Option<usize>, retained: usize) -> bool {
    total.is_some_and(|t| t > retained)
}

// ── FetchStore ────────────────────────────────────────────────────────────────

/// A panel's state cell: initial payload, current state, completion token.
///
/// Orchestration code calls [`begin`](Self::begin) (or
/// [`reserve`](Self::reserve) for fallback-first paths that skip the
/// `Start` dispatch) to obtain a token, then hands the outcome to
/// [`complete`](Self::complete). A completion whose token is no longer
/// current is dropped — the fetch it belongs to has been superseded.
#[derive(Debug)]
pub struct FetchStore<T: Clone> {
    initial: T,
    state: FetchState<T>,
    epoch: u64,
}

impl<T: Clone> FetchStore<T> {
    pub fn new(initial: T) -> Self {
        let state = FetchState::initial(initial.clone());
        Self {
            initial,
            state,
            epoch: 0,
        }
    }

    /// Current panel state.
    pub fn state(&self) -> &FetchState<T> {
        &self.state
    }

    /// Start a fetch: bump the completion token and dispatch `Start`.
    pub fn begin(&mut self) -> u64 {
        self.epoch += 1;
        self.apply(FetchAction::Start);
        self.epoch
    }

    /// Bump the completion token without dispatching `Start`.
    ///
    /// Used by fallback-first paths, which dispatch a single `Success` (or
    /// `Error`) with no loading phase.
    pub fn reserve(&mut self) -> u64 {
        self.epoch += 1;
        self.epoch
    }

    /// Apply a fetch outcome if `token` is still current.
    ///
    /// Returns `true` when the action was applied, `false` when it was
    /// dropped as stale.
    pub fn complete(&mut self, token: u64, action: FetchAction<T>) -> bool {
        if token != self.epoch {
            return false;
        }
        self.apply(action);
        true
    }

    /// Apply an action unconditionally (UI toggles, resets, synchronous
    /// failures that never raced anything).
    pub fn dispatch(&mut self, action: FetchAction<T>) {
        self.apply(action);
    }

    /// Reset to the initial state and invalidate any in-flight completion.
    pub fn reset(&mut self) {
        self.epoch += 1;
        self.apply(FetchAction::Reset);
    }

    fn apply(&mut self, action: FetchAction<T>) {
        self.state = reduce(&self.initial, &self.state, action);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
