//! Given a host pid, resolves a container id from `/proc/<pid>/cgroup` and
//! then pod metadata through an injected lookup capability. The capability
//! itself (talking to the Kubernetes API or a local cache) is out of scope;
//! this module only owns the cgroup-path heuristic and the record shape.

use crate::error::EnrichError;
use serde::Serialize;
use std::collections::HashMap;

/// Exact length of a container runtime's id (a full sha256 hex digest).
const CONTAINER_ID_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct PodRecord {
    pub uid: String,
    pub name: String,
    pub generate_name: String,
    pub kind: String,
    pub api_version: String,
    pub labels: HashMap<String, String>,
    pub annotations: HashMap<String, String>,
    pub namespace: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Kubernetes {
    pub uid: String,
    pub name: String,
    pub generate_name: String,
    pub kind: String,
    pub api_version: String,
    pub labels: HashMap<String, String>,
    pub annotations: HashMap<String, String>,
    pub container_id: String,
    pub namespace: String,
}

/// Capability the enricher needs injected; implementations resolve a
/// container id to the owning pod's metadata, typically via a watched
/// Kubernetes informer cache.
pub trait PodWatcher: Send + Sync {
    fn find_pod(&self, container_id: &str) -> Option<PodRecord>;
}

/// Resolves the container id for `pid` from its cgroup membership: the last
/// line's path component is taken, a trailing `.scope` trimmed, and the
/// slice after its last `-` kept if it's exactly [`CONTAINER_ID_LEN`] hex
/// characters. This mirrors how container runtimes name the cgroup
/// directory (e.g. `.../docker-<id>.scope` or
/// `.../cri-containerd-<id>.scope`).
pub fn container_id_for_pid(pid: u32) -> Result<String, EnrichError> {
    let cgroup_path = format!("/proc/{pid}/cgroup");
    let contents = std::fs::read_to_string(&cgroup_path).map_err(|_| EnrichError::NoContainerId { pid })?;
    extract_container_id(&contents).ok_or(EnrichError::NoContainerId { pid })
}

fn extract_container_id(cgroup_file: &str) -> Option<String> {
    cgroup_file
        .lines()
        .rev()
        .find_map(|line| {
            let path = line.rsplit(':').next()?;
            let dir_name = path.rsplit('/').next()?;
            let clean = dir_name.trim_end_matches(".scope");
            let id = clean.rfind('-').map(|idx| &clean[idx + 1..]).unwrap_or(clean);
            (id.len() == CONTAINER_ID_LEN && id.chars().all(|c| c.is_ascii_hexdigit()))
                .then(|| id.to_string())
        })
}

/// Resolves container id then pod metadata for `pid`, propagating whichever
/// step fails.
pub fn enrich(pid: u32, watcher: &dyn PodWatcher) -> Result<Kubernetes, EnrichError> {
    let container_id = container_id_for_pid(pid)?;
    enrich_with_id(&container_id, watcher)
}

/// Resolves pod metadata for an already-known container id, propagating a
/// `PodNotFound` if the watcher has no record of it. Split out from
/// [`enrich`] so callers that already have a container id (and tests that
/// want to exercise the pod-lookup failure without a real `/proc` entry) can
/// call the pod-lookup step directly.
pub fn enrich_with_id(container_id: &str, watcher: &dyn PodWatcher) -> Result<Kubernetes, EnrichError> {
    let pod = watcher
        .find_pod(container_id)
        .ok_or_else(|| EnrichError::PodNotFound {
            container_id: container_id.to_string(),
        })?;
    Ok(Kubernetes {
        uid: pod.uid,
        name: pod.name,
        generate_name: pod.generate_name,
        kind: pod.kind,
        api_version: pod.api_version,
        labels: pod.labels,
        annotations: pod.annotations,
        container_id: container_id.to_string(),
        namespace: pod.namespace,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeWatcher(Option<PodRecord>);

    impl PodWatcher for FakeWatcher {
        fn find_pod(&self, _container_id: &str) -> Option<PodRecord> {
            self.0.clone()
        }
    }

    #[test]
    fn extract_container_id_reads_suffix_after_last_dash() {
        let cgroup = "0::/system.slice/docker-abcdef0123456789abcdef0123456789abcdef0123456789abcdef0123456789.scope\n";
        let id = extract_container_id(cgroup).unwrap();
        assert_eq!(id.len(), 64);
        assert!(id.starts_with("abcdef"));
    }

    #[test]
    fn extract_container_id_none_when_no_candidate() {
        assert_eq!(extract_container_id("0::/user.slice\n"), None);
    }

    #[test]
    fn extract_container_id_rejects_short_non_hex_suffix() {
        assert_eq!(extract_container_id("0::/system.slice/crond.service\n"), None);
    }

    #[test]
    fn enrich_with_id_propagates_pod_not_found() {
        let watcher = FakeWatcher(None);
        let err = enrich_with_id("deadbeefdeadbeefdeadbeefdeadbeef", &watcher).unwrap_err();
        assert_eq!(
            err,
            EnrichError::PodNotFound {
                container_id: "deadbeefdeadbeefdeadbeefdeadbeef".to_string()
            }
        );
    }

    #[test]
    fn enrich_with_id_returns_pod_record_fields_on_success() {
        let record = PodRecord {
            uid: "u1".to_string(),
            name: "demo-pod".to_string(),
            namespace: "default".to_string(),
            ..Default::default()
        };
        let watcher = FakeWatcher(Some(record));
        let k8s = enrich_with_id("cafebabecafebabecafebabecafebabe", &watcher).unwrap();
        assert_eq!(k8s.name, "demo-pod");
        assert_eq!(k8s.container_id, "cafebabecafebabecafebabecafebabe");
    }

    #[test]
    fn enrich_propagates_pod_not_found() {
        // pid 1 (init) never has a cgroup entry matching a 64-hex-char
        // container id, so container_id_for_pid fails before find_pod runs.
        let watcher = FakeWatcher(None);
        let err = enrich(1, &watcher).unwrap_err();
        assert!(matches!(err, EnrichError::NoContainerId { pid: 1 }));
    }
}
