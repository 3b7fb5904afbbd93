//! Circuit breaker shared across concurrent chat requests.
//!
//! One [`FailoverBreaker`] is owned by one gateway instance and injected into
//! every request path through it. No process-wide statics, so tests can
//! construct and reset breakers freely.
//!
//! State machine per non-primary backend:
//! `AVAILABLE --(timeout/exception)--> UNAVAILABLE --(elapsed > reset_window)--> AVAILABLE`
//!
//! While a backend is unavailable, all requests for it are silently routed to
//! the primary backend. The trip timestamp is last-write-wins: concurrent
//! trips only shift when the breaker re-opens, never whether it does.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::config::ModelId;

/// Mutex-guarded map of trip instants, keyed by logical model.
#[derive(Debug)]
pub struct FailoverBreaker {
    reset_window: Duration,
    tripped: Mutex<HashMap<ModelId, Instant>>,
}

impl FailoverBreaker {
    /// Creates a breaker with the given auto-close window.
    pub fn new(reset_window: Duration) -> Self {
        Self {
            reset_window,
            tripped: Mutex::new(HashMap::new()),
        }
    }

    /// Marks `model` unavailable as of now.
    pub fn trip(&self, model: ModelId) {
        warn!(model = %model, reset_window_secs = self.reset_window.as_secs(), "circuit opened for backend");
        self.lock().insert(model, Instant::now());
    }

    /// Whether the circuit for `model` is currently open.
    ///
    /// Automatically closes the circuit (and logs it) once the reset window
    /// has elapsed, so the next call probes the original backend again.
    pub fn is_open(&self, model: ModelId) -> bool {
        let mut tripped = self.lock();
        match tripped.get(&model) {
            Some(at) if at.elapsed() > self.reset_window => {
                tripped.remove(&model);
                info!(model = %model, "circuit closed, probing backend again");
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ModelId, Instant>> {
        // A poisoned lock only means another thread panicked mid-update; the
        // map stays structurally valid, so keep serving.
        match self.tripped.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_closed() {
        let breaker = FailoverBreaker::new(Duration::from_secs(300));
        assert!(!breaker.is_open(ModelId::Mistral8));
    }

    #[test]
    fn trip_opens_only_that_model() {
        let breaker = FailoverBreaker::new(Duration::from_secs(300));
        breaker.trip(ModelId::Mistral8);
        assert!(breaker.is_open(ModelId::Mistral8));
        assert!(!breaker.is_open(ModelId::Llama3));
    }

    #[test]
    fn auto_closes_after_reset_window() {
        let breaker = FailoverBreaker::new(Duration::from_millis(5));
        breaker.trip(ModelId::Qwen2);
        assert!(breaker.is_open(ModelId::Qwen2));

        std::thread::sleep(Duration::from_millis(10));
        assert!(!breaker.is_open(ModelId::Qwen2));
        // The close is sticky until the next trip.
        assert!(!breaker.is_open(ModelId::Qwen2));
    }
}
