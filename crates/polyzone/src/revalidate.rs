//! Lazy revalidation: a stale flag plus a cheap freshness predicate gate an
//! expensive rebuild, which then runs at most once per invalidation.
//!
//! The rebuild closure and the predicate are supplied per call rather than
//! stored, so an owner can keep the `Validator` next to the state it guards
//! and borrow disjoint fields in both closures:
//!
//! ```ignore
//! let built = self.built_from;
//! self.validator.ensure_valid(
//!     || built == Some(upstream_generation),
//!     || self.built_from = Some(regenerate(&mut self.derived, &self.source)),
//! );
//! ```
//!
//! Dependency chaining is explicit: a downstream owner calls its upstream's
//! `ensure_valid` before its own, and compares an upstream generation counter
//! in its predicate. There is no implicit broadcast.

/// Validator state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidatorState {
    /// Initial, or after `invalidate()`, or after a failed rebuild.
    Stale,
    /// A rebuild is in progress. Observed afterwards only if the rebuild panicked;
    /// treated as stale by the next call.
    Checking,
    Valid,
}

/// Outcome of a successful `ensure_valid`; both variants mean "valid on return".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Freshness {
    /// Nothing to do; no side effects.
    Fresh,
    /// The rebuild ran to completion during this call.
    Rebuilt,
}

impl Freshness {
    #[inline]
    pub fn rebuilt(self) -> bool {
        matches!(self, Freshness::Rebuilt)
    }
}

/// Dirty-flag gate for one derived-state cache.
#[derive(Clone, Debug)]
pub struct Validator {
    state: ValidatorState,
    rebuilds: u64,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    #[inline]
    pub fn new() -> Self {
        Self {
            state: ValidatorState::Stale,
            rebuilds: 0,
        }
    }

    /// Idempotent; marks stale regardless of the current state.
    #[inline]
    pub fn invalidate(&mut self) {
        self.state = ValidatorState::Stale;
    }

    #[inline]
    pub fn state(&self) -> ValidatorState {
        self.state
    }

    /// True unless the last rebuild completed and nothing invalidated since.
    /// Does not evaluate any freshness predicate.
    #[inline]
    pub fn is_stale(&self) -> bool {
        self.state != ValidatorState::Valid
    }

    /// Number of completed rebuilds so far.
    #[inline]
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    /// Infallible form of [`Validator::try_ensure_valid`].
    #[inline]
    pub fn ensure_valid(
        &mut self,
        is_fresh: impl FnOnce() -> bool,
        rebuild: impl FnOnce(),
    ) -> Freshness {
        match self.try_ensure_valid::<std::convert::Infallible>(is_fresh, || {
            rebuild();
            Ok(())
        }) {
            Ok(f) => f,
            Err(never) => match never {},
        }
    }

    /// Return immediately if valid and `is_fresh()` holds; otherwise run `rebuild`
    /// once and mark valid.
    ///
    /// `is_fresh` is evaluated on every call that finds the state `Valid`, so it must
    /// be an O(1) comparison. On `Err` the validator stays stale and the error is
    /// returned; the next call retries.
    pub fn try_ensure_valid<E>(
        &mut self,
        is_fresh: impl FnOnce() -> bool,
        rebuild: impl FnOnce() -> Result<(), E>,
    ) -> Result<Freshness, E> {
        if self.state == ValidatorState::Valid {
            if is_fresh() {
                return Ok(Freshness::Fresh);
            }
            self.state = ValidatorState::Stale;
        }
        self.state = ValidatorState::Checking;
        match rebuild() {
            Ok(()) => {
                self.state = ValidatorState::Valid;
                self.rebuilds += 1;
                Ok(Freshness::Rebuilt)
            }
            Err(e) => {
                self.state = ValidatorState::Stale;
                Err(e)
            }
        }
    }
}
