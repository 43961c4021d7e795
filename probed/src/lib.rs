pub mod aggregator;
pub mod bytestream;
pub mod config;
pub mod error;
pub mod formatters;
pub mod k8s;
pub mod metadata;
pub mod metrics;
pub mod module;
pub mod parser;
pub mod probe;
pub mod schema;
pub mod util;

pub use aggregator::{new_detector, Aggregator};
pub use config::{Config, LoggingConfig, ProbesConfig, RuntimeConfig};
pub use error::{DecodeError, EnrichError, ProbeError, SetupError, TransportError};
pub use k8s::{Kubernetes, PodRecord, PodWatcher};
pub use metrics::Metrics;
pub use module::{Handler, HookInfo, MapInfo, Module, ProbeLink, ProgramInfo};
pub use parser::{Arg, DecodedEvent, EnrichPolicy};
pub use probe::{ChannelProbeHandle, ProbeHandle, ReadOutcome};
