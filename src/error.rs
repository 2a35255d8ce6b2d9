//! Traversal error taxonomy
//!
//! Errors are never swallowed inside the engine: every concurrent unit's
//! failure is observed by its join point and becomes the result of the
//! enclosing visit. An unregistered kind is not an error (see
//! [`crate::visitor::ObjectVisitor`]).

use thiserror::Error;

use crate::graph::ResourceRef;
use crate::gvk::KindKey;

/// Error produced by a traversal or by visitor registration.
#[derive(Debug, Error)]
pub enum VisitError {
    /// A resource could not cross the typed <-> dynamic boundary.
    #[error("convert {object}: {source}")]
    Conversion {
        /// Kind (and name, when known) of the object that failed to convert
        object: String,
        #[source]
        source: serde_json::Error,
    },

    /// An object is missing the metadata needed to compute its canonical key.
    #[error("object has no {field}")]
    IncompleteObject { field: &'static str },

    /// The queryer failed to answer a relationship lookup.
    #[error("query {relation} for {object}: {error}")]
    Discovery {
        relation: &'static str,
        object: ResourceRef,
        error: anyhow::Error,
    },

    /// The handler rejected an edge.
    #[error("add edge {edge_source} -> {edge_target}: {error}")]
    Handler {
        edge_source: ResourceRef,
        edge_target: ResourceRef,
        error: anyhow::Error,
    },

    /// A visit failed deeper in the graph; wraps the failing subtree's error
    /// with the identity of the object whose visit produced it.
    #[error("visit {object}")]
    Visit {
        object: ResourceRef,
        #[source]
        source: Box<VisitError>,
    },

    /// Two typed visitors claimed the same kind at construction time.
    #[error("duplicate visitor registered for {0}")]
    DuplicateVisitor(KindKey),
}

impl VisitError {
    /// Walk to the innermost error of a chain of [`VisitError::Visit`] wrappers.
    pub fn root_cause(&self) -> &VisitError {
        let mut current = self;
        while let VisitError::Visit { source, .. } = current {
            current = source;
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discovery_error() -> VisitError {
        VisitError::Discovery {
            relation: "pods for service",
            object: ResourceRef::new("", "v1", "Service", Some("default"), "web"),
            error: anyhow::anyhow!("connection refused"),
        }
    }

    #[test]
    fn test_display_includes_relation_and_object() {
        let err = discovery_error();
        let text = err.to_string();
        assert!(text.contains("pods for service"));
        assert!(text.contains("web"));
        assert!(text.contains("connection refused"));
    }

    #[test]
    fn test_root_cause_unwraps_visit_layers() {
        let inner = discovery_error();
        let wrapped = VisitError::Visit {
            object: ResourceRef::new("", "v1", "Service", Some("default"), "web"),
            source: Box::new(VisitError::Visit {
                object: ResourceRef::new("", "v1", "Pod", Some("default"), "web-0"),
                source: Box::new(inner),
            }),
        };

        assert!(matches!(
            wrapped.root_cause(),
            VisitError::Discovery { relation: "pods for service", .. }
        ));
    }
}
