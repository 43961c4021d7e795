//! Owns one kernel program's link and its buffer reader behind a single
//! trait, so the aggregator's pump loop does not need to know whether a
//! given probe is backed by a ring buffer or a perf buffer. The two kernel
//! buffer kinds close differently (see module docs on [`RawRecord`]); this
//! abstraction normalises that into one `Closed` vs `LostSamples` vs
//! `TransientIo` vocabulary.

use crate::error::TransportError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One raw record pulled off a probe's buffer, tagged with the source that
/// produced it so the aggregator can attribute per-probe counters.
#[derive(Debug, Clone)]
pub struct RawRecord {
    pub source_tag: String,
    pub bytes: Vec<u8>,
}

/// Outcome of one [`ProbeHandle::read`] call.
pub enum ReadOutcome {
    Record(RawRecord),
    /// The buffer reader was closed (normal shutdown via `close()`).
    Closed,
    /// The buffer overran before being drained (lost samples). Transient:
    /// the pump logs and keeps reading.
    LostSamples,
}

/// A source of raw records, backed by either a ring buffer or a perf
/// buffer. Implementations own exactly one kernel link and one reader;
/// `close()` must be safe to call from a different task than the one
/// calling `read()`; it is the only method allowed to touch the reader from
/// outside the owning pump.
pub trait ProbeHandle: Send {
    /// Source tag used for per-probe counters and log attribution.
    fn source_tag(&self) -> &str;

    /// Blocks until a record is available, the reader is closed, or an
    /// overrun is observed.
    fn read(&mut self) -> Result<ReadOutcome, TransportError>;

    /// Releases the kernel link and buffer reader. Idempotent.
    fn close(&mut self);

    /// A cloneable shutdown flag the owner can set from another task to
    /// unblock a pump's `read()` loop without needing `&mut self` across
    /// threads. Implementations must poll this between blocking attempts.
    fn closer(&self) -> Arc<AtomicBool>;

    /// Cheap non-blocking check; default false (not every backend can
    /// answer without blocking).
    fn ready(&self) -> bool {
        false
    }
}

/// In-process channel-backed test/demo implementation of [`ProbeHandle`],
/// standing in for a real ring-buffer or perf-buffer reader. Feeding it is
/// how the synthetic-encoder tests in this crate and in `aggregator`
/// exercise the pump without a kernel.
pub struct ChannelProbeHandle {
    source_tag: String,
    rx: tokio::sync::mpsc::Receiver<Vec<u8>>,
    closed: Arc<AtomicBool>,
}

impl ChannelProbeHandle {
    pub fn new(
        source_tag: impl Into<String>,
    ) -> (Self, tokio::sync::mpsc::Sender<Vec<u8>>, Arc<AtomicBool>) {
        let (tx, rx) = tokio::sync::mpsc::channel(64);
        let closed = Arc::new(AtomicBool::new(false));
        (
            Self {
                source_tag: source_tag.into(),
                rx,
                closed: closed.clone(),
            },
            tx,
            closed,
        )
    }
}

impl ProbeHandle for ChannelProbeHandle {
    fn source_tag(&self) -> &str {
        &self.source_tag
    }

    fn read(&mut self) -> Result<ReadOutcome, TransportError> {
        use tokio::sync::mpsc::error::TryRecvError;
        loop {
            match self.rx.try_recv() {
                Ok(bytes) => {
                    return Ok(ReadOutcome::Record(RawRecord {
                        source_tag: self.source_tag.clone(),
                        bytes,
                    }))
                }
                Err(TryRecvError::Disconnected) => return Ok(ReadOutcome::Closed),
                Err(TryRecvError::Empty) => {
                    if self.closed.load(Ordering::Acquire) {
                        return Ok(ReadOutcome::Closed);
                    }
                    std::thread::sleep(std::time::Duration::from_millis(2));
                }
            }
        }
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::Release);
        self.rx.close();
    }

    fn closer(&self) -> Arc<AtomicBool> {
        self.closed.clone()
    }

    fn ready(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
    }
}
