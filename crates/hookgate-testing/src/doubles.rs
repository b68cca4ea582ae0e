//! Recording and counting test doubles.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use hookgate_core::{SecurityCategory, SecurityEvent, SecurityEventSink};
use hookgate_security::SignatureVerifier;

/// Security event sink that keeps every event for later assertions.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<SecurityEvent>>>,
}

impl RecordingSink {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded events in arrival order.
    pub fn events(&self) -> Vec<SecurityEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }

    /// Number of events with the given category.
    pub fn count(&self, category: SecurityCategory) -> usize {
        self.events().iter().filter(|e| e.category == category).count()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.events().is_empty()
    }
}

impl SecurityEventSink for RecordingSink {
    fn record(&self, event: &SecurityEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// Signature verifier wrapper that counts invocations.
#[derive(Debug, Clone)]
pub struct CountingVerifier {
    inner: Arc<dyn SignatureVerifier>,
    calls: Arc<AtomicUsize>,
}

impl CountingVerifier {
    /// Wraps `inner`.
    pub fn new(inner: Arc<dyn SignatureVerifier>) -> Self {
        Self { inner, calls: Arc::new(AtomicUsize::new(0)) }
    }

    /// Number of `verify` calls so far, across all clones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SignatureVerifier for CountingVerifier {
    fn verify(&self, body: &[u8], signature: &str) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.verify(body, signature)
    }
}
