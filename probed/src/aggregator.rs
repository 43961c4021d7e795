//! Fans multiple probes into one ordered-per-source, unordered-overall
//! stream of decoded events. Each probe gets its own blocking pump task;
//! pumps publish into one shared bounded channel that `next()` drains.
//! Back-pressure is the default: a full queue blocks the slowest pump's
//! producer. Setting `lossy_drop` in configuration switches a pump to
//! drop-and-count instead of blocking, trading completeness for latency
//! on the other probes.

use crate::error::ProbeError;
use crate::k8s::PodWatcher;
use crate::metrics::Metrics;
use crate::parser::{self, DecodedEvent, EnrichPolicy};
use crate::probe::{ProbeHandle, ReadOutcome};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum State {
    New,
    Started,
    Closed,
}

pub struct Aggregator {
    pending: Vec<Box<dyn ProbeHandle>>,
    watcher: Option<Arc<dyn PodWatcher>>,
    policy: EnrichPolicy,
    queue_capacity: usize,
    lossy_drop: bool,
    metrics: Arc<Metrics>,
    state: State,
    closers: Vec<Arc<AtomicBool>>,
    pumps: Vec<JoinHandle<()>>,
    rx: Option<mpsc::Receiver<DecodedEvent>>,
}

/// Constructs a fresh, unstarted aggregator. Named to match the external
/// consumer-facing API (`new_detector` / `add` / `set_watcher` / `start`).
pub fn new_detector(
    queue_capacity: usize,
    lossy_drop: bool,
    policy: EnrichPolicy,
    metrics: Arc<Metrics>,
) -> Aggregator {
    Aggregator::new(queue_capacity, lossy_drop, policy, metrics)
}

impl Aggregator {
    pub fn new(queue_capacity: usize, lossy_drop: bool, policy: EnrichPolicy, metrics: Arc<Metrics>) -> Self {
        Self {
            pending: Vec::new(),
            watcher: None,
            policy,
            queue_capacity,
            lossy_drop,
            metrics,
            state: State::New,
            closers: Vec::new(),
            pumps: Vec::new(),
            rx: None,
        }
    }

    /// Registers a probe. Only valid before `start()`.
    pub fn add(&mut self, probe: Box<dyn ProbeHandle>) -> Result<(), ProbeError> {
        if self.state != State::New {
            return Err(ProbeError::AggregatorClosed);
        }
        self.pending.push(probe);
        Ok(())
    }

    pub fn set_watcher(&mut self, watcher: Arc<dyn PodWatcher>) {
        self.watcher = Some(watcher);
    }

    /// Number of probes this aggregator is (or will be) pumping.
    pub fn count(&self) -> usize {
        if self.state == State::New {
            self.pending.len()
        } else {
            self.closers.len()
        }
    }

    /// Spawns one pump per registered probe. Each pump blocks on its probe's
    /// reader inside `spawn_blocking`, decodes, and publishes onto the
    /// shared queue until its probe reports `Closed`.
    pub fn start(&mut self) -> Result<(), ProbeError> {
        if self.state != State::New {
            return Err(ProbeError::AggregatorClosed);
        }
        self.state = State::Started;
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        self.rx = Some(rx);

        for probe in self.pending.drain(..) {
            self.closers.push(probe.closer());
            let tx = tx.clone();
            let watcher = self.watcher.clone();
            let policy = self.policy;
            let metrics = self.metrics.clone();
            let lossy_drop = self.lossy_drop;
            self.pumps
                .push(tokio::task::spawn_blocking(move || {
                    pump(probe, tx, watcher, policy, metrics, lossy_drop)
                }));
        }
        Ok(())
    }

    /// Yields the next decoded event, or `Err(ProbeError::AggregatorClosed)`
    /// once every pump has exited and the queue has drained (end of stream).
    pub async fn next(&mut self) -> Result<DecodedEvent, ProbeError> {
        match &mut self.rx {
            Some(rx) => rx.recv().await.ok_or(ProbeError::AggregatorClosed),
            None => Err(ProbeError::AggregatorClosed),
        }
    }

    /// Signals every pump to stop reading once its probe's buffer is
    /// drained. Idempotent; does not itself wait for pumps to exit — call
    /// `next()` until it returns `None` to observe drain completion.
    pub fn close(&mut self) {
        for closer in &self.closers {
            closer.store(true, Ordering::Release);
        }
        self.state = State::Closed;
    }

    pub fn total(&self) -> u64 {
        self.metrics.total()
    }

    pub fn per_probe(&self) -> std::collections::HashMap<String, u64> {
        self.metrics.per_probe()
    }
}

fn pump(
    mut probe: Box<dyn ProbeHandle>,
    tx: mpsc::Sender<DecodedEvent>,
    watcher: Option<Arc<dyn PodWatcher>>,
    policy: EnrichPolicy,
    metrics: Arc<Metrics>,
    lossy_drop: bool,
) {
    let source = probe.source_tag().to_string();
    loop {
        match probe.read() {
            Ok(ReadOutcome::Record(raw)) => {
                match parser::parse(&raw.bytes, watcher.as_deref(), policy) {
                    Ok(event) => {
                        metrics.record_event(&source);
                        if lossy_drop {
                            if tx.try_send(event).is_err() {
                                metrics.record_drop(&source);
                            }
                        } else if tx.blocking_send(event).is_err() {
                            break;
                        }
                    }
                    Err(ProbeError::Decode(e)) => {
                        metrics.inc_decode_error();
                        log::warn!("decode error on {source}: {e}");
                    }
                    Err(ProbeError::Enrich(e)) => {
                        metrics.inc_enrich_failure();
                        log::warn!("enrich error on {source}: {e}");
                    }
                    Err(e) => log::warn!("parse error on {source}: {e}"),
                }
            }
            Ok(ReadOutcome::LostSamples) => {
                metrics.inc_rb_overflow();
            }
            Ok(ReadOutcome::Closed) => {
                probe.close();
                break;
            }
            Err(e) => {
                log::warn!("transport error on {source}: {e}");
                break;
            }
        }
    }
}
