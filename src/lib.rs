//! Dependency-graph visitor engine for cluster resource dashboards
//!
//! Given a root object, the engine dispatches to the typed visitor
//! registered for its kind, discovers related objects through the
//! [`Queryer`] collaborator, reports typed edges to the [`ObjectHandler`]
//! collaborator, and recurses. Discovery fans out concurrently with
//! first-error semantics, and a per-traversal visited set keeps cyclic
//! relationship graphs finite.
//!
//! The crate owns no I/O: the queryer answers relationship lookups and the
//! handler accumulates the graph, both supplied by the embedding
//! application.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # async fn example(
//! #     queryer: Arc<dyn objectgraph::Queryer>,
//! #     handler: &dyn objectgraph::ObjectHandler,
//! #     root: kube::core::DynamicObject,
//! # ) -> Result<(), objectgraph::VisitError> {
//! use objectgraph::ObjectVisitor;
//!
//! let engine = ObjectVisitor::with_default_visitors(queryer)?;
//! engine.visit(&root, handler, true).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod graph;
pub mod gvk;
pub mod object;
pub mod queryer;
pub mod visitor;

// Re-export commonly used types for convenience
pub use error::VisitError;
pub use graph::{ConnectorType, EdgeDefinition, ResourceRef};
pub use gvk::KindKey;
pub use queryer::Queryer;
pub use visitor::{ObjectHandler, ObjectVisitor, TypedVisitor, Visitor};
