//! Kind keys for visitor dispatch
//!
//! Centralizes the group/version/kind identifiers the engine dispatches on,
//! instead of scattering string literals through the visitor implementations.

use std::fmt;

/// The (group, version, kind) triple a typed visitor registers under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KindKey {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl KindKey {
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }

    /// The `apiVersion` form of this key (`group/version`, or just `version`
    /// for the core group).
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    // Well-known kinds with registered visitors.

    pub fn service() -> Self {
        Self::new("", "v1", "Service")
    }

    pub fn pod() -> Self {
        Self::new("", "v1", "Pod")
    }

    pub fn ingress() -> Self {
        Self::new("networking.k8s.io", "v1", "Ingress")
    }

    pub fn deployment() -> Self {
        Self::new("apps", "v1", "Deployment")
    }

    pub fn replica_set() -> Self {
        Self::new("apps", "v1", "ReplicaSet")
    }

    pub fn stateful_set() -> Self {
        Self::new("apps", "v1", "StatefulSet")
    }

    pub fn daemon_set() -> Self {
        Self::new("apps", "v1", "DaemonSet")
    }
}

impl fmt::Display for KindKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.api_version(), self.kind)
    }
}
