//! Graph value model
//!
//! Value types describing the endpoints of a relationship edge. Edges are
//! reported to an [`crate::visitor::ObjectHandler`] as `(source, target)`
//! pairs; direction encodes "source references target". The handler owns
//! accumulation and rendering, this crate only discovers.

use std::fmt;

use kube::core::DynamicObject;

use crate::error::VisitError;
use crate::gvk::KindKey;

/// Canonical key for a cluster object: group, version, kind, namespace, name.
///
/// Two references are equal iff their keys are equal, independent of where
/// the underlying objects came from. Cluster-scoped objects have no
/// namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceRef {
    pub group: String,
    pub version: String,
    pub kind: String,
    pub namespace: Option<String>,
    pub name: String,
}

impl ResourceRef {
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        kind: impl Into<String>,
        namespace: Option<&str>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
            namespace: namespace.map(|ns| ns.to_string()),
            name: name.into(),
        }
    }

    /// Extract the canonical reference from a dynamic object.
    ///
    /// Objects missing type metadata or a name cannot be keyed and are
    /// rejected; the traversal surfaces that as a conversion failure rather
    /// than skipping the object.
    pub fn from_object(object: &DynamicObject) -> Result<Self, VisitError> {
        let types = object
            .types
            .as_ref()
            .ok_or(VisitError::IncompleteObject { field: "type metadata" })?;
        let name = object
            .metadata
            .name
            .clone()
            .ok_or(VisitError::IncompleteObject { field: "name" })?;

        let (group, version) = match types.api_version.split_once('/') {
            Some((group, version)) => (group.to_string(), version.to_string()),
            None => (String::new(), types.api_version.clone()),
        };

        Ok(Self {
            group,
            version,
            kind: types.kind.clone(),
            namespace: object.metadata.namespace.clone(),
            name,
        })
    }

    /// The dispatch key for this reference's kind.
    pub fn kind_key(&self) -> KindKey {
        KindKey::new(&self.group, &self.version, &self.kind)
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{} {}/{}", self.kind_key(), ns, self.name),
            None => write!(f, "{} {}", self.kind_key(), self.name),
        }
    }
}

/// How an edge endpoint was established.
///
/// Open enumeration: downstream matching must carry a wildcard arm so new
/// connector types can be added without breaking consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConnectorType {
    /// The source selects the target by label selector
    Selector,
    /// The target matches via its labels (dual of `Selector`)
    Label,
    /// The relationship exists but has no finer classification
    Unknown,
}

/// One endpoint of a relationship edge.
///
/// `connector` is human-readable text explaining why the edge exists (a
/// rendered label selector, for example); empty when the relationship type
/// carries no descriptive text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeDefinition {
    pub object: ResourceRef,
    pub connector: String,
    pub connector_type: ConnectorType,
}

impl EdgeDefinition {
    pub fn new(
        object: ResourceRef,
        connector: impl Into<String>,
        connector_type: ConnectorType,
    ) -> Self {
        Self {
            object,
            connector: connector.into(),
            connector_type,
        }
    }

    /// An endpoint with no descriptive text and no classification.
    pub fn unknown(object: ResourceRef) -> Self {
        Self::new(object, "", ConnectorType::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dynamic(api_version: &str, kind: &str, namespace: Option<&str>, name: &str) -> DynamicObject {
        let mut value = serde_json::json!({
            "apiVersion": api_version,
            "kind": kind,
            "metadata": { "name": name },
        });
        if let Some(ns) = namespace {
            value["metadata"]["namespace"] = ns.into();
        }
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_from_object_core_group() {
        let reference =
            ResourceRef::from_object(&dynamic("v1", "Service", Some("default"), "web")).unwrap();
        assert_eq!(reference, ResourceRef::new("", "v1", "Service", Some("default"), "web"));
        assert_eq!(reference.kind_key(), KindKey::service());
    }

    #[test]
    fn test_from_object_named_group() {
        let reference =
            ResourceRef::from_object(&dynamic("apps/v1", "Deployment", Some("prod"), "api"))
                .unwrap();
        assert_eq!(reference.group, "apps");
        assert_eq!(reference.version, "v1");
        assert_eq!(reference.to_string(), "apps/v1 Deployment prod/api");
    }

    #[test]
    fn test_from_object_without_types_fails() {
        let mut object = dynamic("v1", "Pod", Some("default"), "web-0");
        object.types = None;
        let err = ResourceRef::from_object(&object).unwrap_err();
        assert!(matches!(err, VisitError::IncompleteObject { field: "type metadata" }));
    }

    #[test]
    fn test_from_object_without_name_fails() {
        let mut object = dynamic("v1", "Pod", Some("default"), "web-0");
        object.metadata.name = None;
        let err = ResourceRef::from_object(&object).unwrap_err();
        assert!(matches!(err, VisitError::IncompleteObject { field: "name" }));
    }

    #[test]
    fn test_cluster_scoped_display() {
        let reference = ResourceRef::from_object(&dynamic("v1", "Node", None, "worker-1")).unwrap();
        assert_eq!(reference.to_string(), "v1 Node worker-1");
    }

    #[test]
    fn test_edge_definition_structural_equality() {
        let pod = ResourceRef::new("", "v1", "Pod", Some("default"), "web-0");
        let a = EdgeDefinition::new(pod.clone(), "app: web", ConnectorType::Label);
        let b = EdgeDefinition::new(pod.clone(), "app: web", ConnectorType::Label);
        assert_eq!(a, b);

        assert_ne!(a, EdgeDefinition::new(pod.clone(), "app: web", ConnectorType::Selector));
        assert_ne!(a, EdgeDefinition::new(pod, "app: other", ConnectorType::Label));
    }

    #[test]
    fn test_unknown_endpoint_has_empty_connector() {
        let ingress = ResourceRef::new("networking.k8s.io", "v1", "Ingress", Some("default"), "fe");
        let endpoint = EdgeDefinition::unknown(ingress);
        assert_eq!(endpoint.connector, "");
        assert_eq!(endpoint.connector_type, ConnectorType::Unknown);
    }
}
