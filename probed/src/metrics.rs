use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide counters for the aggregator's data path.
///
/// Counters are updated from pump tasks, so every field is either an atomic
/// or a lock guarding a map keyed by probe source tag, never a hot-path mutex
/// around a scalar.
pub struct Metrics {
    events_total: AtomicU64,
    dropped_events_total: AtomicU64,
    rb_overflows: AtomicU64,
    decode_errors: AtomicU64,
    enrich_failures: AtomicU64,
    per_probe: RwLock<HashMap<String, AtomicU64>>,
    per_probe_dropped: RwLock<HashMap<String, AtomicU64>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            events_total: AtomicU64::new(0),
            dropped_events_total: AtomicU64::new(0),
            rb_overflows: AtomicU64::new(0),
            decode_errors: AtomicU64::new(0),
            enrich_failures: AtomicU64::new(0),
            per_probe: RwLock::new(HashMap::new()),
            per_probe_dropped: RwLock::new(HashMap::new()),
        }
    }

    /// Record one successfully published event from `source`.
    pub fn record_event(&self, source: &str) {
        self.events_total.fetch_add(1, Ordering::Relaxed);
        Self::bump(&self.per_probe, source);
    }

    /// Record one dropped event (queue full under lossy-drop policy, or
    /// enrichment failure under the drop policy) from `source`.
    pub fn record_drop(&self, source: &str) {
        self.dropped_events_total.fetch_add(1, Ordering::Relaxed);
        Self::bump(&self.per_probe_dropped, source);
    }

    pub fn inc_rb_overflow(&self) {
        self.rb_overflows.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_enrich_failure(&self) {
        self.enrich_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total(&self) -> u64 {
        self.events_total.load(Ordering::Relaxed)
    }

    pub fn dropped_total(&self) -> u64 {
        self.dropped_events_total.load(Ordering::Relaxed)
    }

    pub fn rb_overflows(&self) -> u64 {
        self.rb_overflows.load(Ordering::Relaxed)
    }

    pub fn decode_errors(&self) -> u64 {
        self.decode_errors.load(Ordering::Relaxed)
    }

    pub fn enrich_failures(&self) -> u64 {
        self.enrich_failures.load(Ordering::Relaxed)
    }

    /// Snapshot of per-probe published-event counts.
    pub fn per_probe(&self) -> HashMap<String, u64> {
        Self::snapshot(&self.per_probe)
    }

    /// Snapshot of per-probe dropped-event counts.
    pub fn per_probe_dropped(&self) -> HashMap<String, u64> {
        Self::snapshot(&self.per_probe_dropped)
    }

    fn bump(map: &RwLock<HashMap<String, AtomicU64>>, source: &str) {
        if let Ok(guard) = map.read() {
            if let Some(counter) = guard.get(source) {
                counter.fetch_add(1, Ordering::Relaxed);
                return;
            }
        }
        let mut guard = map.write().expect("metrics map poisoned");
        guard
            .entry(source.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(map: &RwLock<HashMap<String, AtomicU64>>) -> HashMap<String, u64> {
        map.read()
            .expect("metrics map poisoned")
            .iter()
            .map(|(k, v)| (k.clone(), v.load(Ordering::Relaxed)))
            .collect()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_probe_counts_isolate_sources() {
        let m = Metrics::new();
        for _ in 0..3 {
            m.record_event("ringbuf:connect");
        }
        m.record_event("perf:accept");
        assert_eq!(m.total(), 4);
        let snap = m.per_probe();
        assert_eq!(snap.get("ringbuf:connect"), Some(&3));
        assert_eq!(snap.get("perf:accept"), Some(&1));
    }

    #[test]
    fn drops_are_tracked_separately_from_successes() {
        let m = Metrics::new();
        m.record_event("ringbuf:connect");
        m.record_drop("ringbuf:connect");
        assert_eq!(m.total(), 1);
        assert_eq!(m.dropped_total(), 1);
        assert_eq!(m.per_probe_dropped().get("ringbuf:connect"), Some(&1));
    }
}
