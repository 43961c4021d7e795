//! Scoped error taxonomy. Each variant carries an originator tag so logs can
//! attribute a failure to the subsystem that raised it without the caller
//! having to inspect a backtrace.

use thiserror::Error;

/// Errors raised while turning a raw byte slice into a [`crate::parser::DecodedEvent`].
/// Per-record; never fatal to the aggregator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeError {
    #[error("buffer underrun at offset {at}: needed {needed} more byte(s)")]
    Underrun { at: usize, needed: usize },
    #[error("no schema registered for event id {event_id}")]
    MissingEvent { event_id: i32 },
    #[error("string field at offset {at} was not valid utf-8")]
    MalformedString { at: usize },
}

/// Errors raised while resolving container/pod context for a record. Per
/// record; the configured policy decides whether the event is dropped or
/// emitted with `kubernetes: None`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EnrichError {
    #[error("could not resolve a container id for pid {pid}")]
    NoContainerId { pid: u32 },
    #[error("no pod found for container id {container_id}")]
    PodNotFound { container_id: String },
}

/// Errors surfaced by a kernel buffer reader. `ReaderClosed` terminates the
/// owning pump; the others are logged and the pump keeps reading.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    #[error("buffer reader for {source} closed")]
    ReaderClosed { source: String },
    #[error("buffer reader for {source} lost samples (overrun)")]
    LostSamples { source: String },
    #[error("transient I/O error reading {source}: {source_err}")]
    TransientIo {
        source: String,
        #[source]
        source_err: std::io::Error,
    },
}

/// Errors raised during module preparation or probe attachment. Fatal to
/// startup; surfaced to the caller rather than recovered locally.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SetupError {
    #[error("failed to create reader(s) for map {map_name}: {reason}")]
    MapCreateFailed { map_name: String, reason: String },
    #[error("failed to attach probe {probe_name} to hook {hook_name}: {reason}")]
    AttachFailed {
        probe_name: String,
        hook_name: String,
        reason: String,
    },
}

/// A single top-level error type composing the taxonomy, used at the crate's
/// public boundary (e.g. `Parser::parse`, `Module::attach`) so callers can
/// match on originator without reaching into each bucket by hand.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProbeError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Enrich(#[from] EnrichError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Setup(#[from] SetupError),
    /// Sentinel returned by `Aggregator::next()` once the aggregator has
    /// fully drained and closed; not a failure, just an end-of-stream tag
    /// consumers that want a `Result`-shaped API can match on.
    #[error("aggregator is closed")]
    AggregatorClosed,
}

impl ProbeError {
    /// The originator tag used for log attribution, matching the style of
    /// dotted subsystem paths (e.g. `"eventparser.parser"`).
    pub fn originator(&self) -> &'static str {
        match self {
            ProbeError::Decode(_) => "eventparser.parser",
            ProbeError::Enrich(_) => "eventparser.enricher",
            ProbeError::Transport(_) => "ebpf.probe",
            ProbeError::Setup(_) => "ebpf.module",
            ProbeError::AggregatorClosed => "eventparser.aggregator",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn originator_tags_are_stable() {
        assert_eq!(
            ProbeError::from(DecodeError::Underrun { at: 4, needed: 8 }).originator(),
            "eventparser.parser"
        );
        assert_eq!(ProbeError::AggregatorClosed.originator(), "eventparser.aggregator");
    }

    #[test]
    fn decode_errors_compare_by_value() {
        let a = DecodeError::MissingEvent { event_id: 9999 };
        let b = DecodeError::MissingEvent { event_id: 9999 };
        assert_eq!(a, b);
    }
}
