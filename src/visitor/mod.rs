//! Visitor engine
//!
//! The recursive entry point of the crate: [`ObjectVisitor`] resolves the
//! [`TypedVisitor`] registered for an object's kind, invokes it, and recurses
//! into discovered objects. Each top-level [`ObjectVisitor::visit`] call is
//! one traversal: it owns a fresh visited set (the cycle breaker) and fails
//! with the first error any concurrent branch produces.

mod ingress;
mod pod;
mod service;
mod workload;

pub use ingress::IngressVisitor;
pub use pod::PodVisitor;
pub use service::ServiceVisitor;
pub use workload::{DaemonSetVisitor, DeploymentVisitor, ReplicaSetVisitor, StatefulSetVisitor};

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use kube::core::DynamicObject;
use tokio::sync::Mutex;

use crate::error::VisitError;
use crate::graph::{EdgeDefinition, ResourceRef};
use crate::gvk::KindKey;
use crate::queryer::Queryer;

/// Accumulates discovered nodes and edges into the final graph.
///
/// Implemented by the surrounding application, consumed here. Must be safe
/// for concurrent invocation; a failed edge report aborts the traversal
/// branch that produced it.
#[async_trait]
pub trait ObjectHandler: Send + Sync {
    async fn add_edge(
        &self,
        source: EdgeDefinition,
        target: EdgeDefinition,
    ) -> anyhow::Result<()>;
}

/// Recursive dispatch handle passed to typed visitors so they can ask for
/// descendants to be visited.
#[async_trait]
pub trait Visitor: Send + Sync {
    async fn visit(
        &self,
        object: &DynamicObject,
        handler: &dyn ObjectHandler,
        visit_descendants: bool,
    ) -> Result<(), VisitError>;
}

/// Per-kind discovery logic.
///
/// An implementation may assume nothing about objects other than its
/// supported kind. For every discovered object it reports exactly one edge,
/// and recurses through the supplied [`Visitor`] when `visit_descendants`
/// is set.
#[async_trait]
pub trait TypedVisitor: Send + Sync {
    /// The exact kind this visitor handles.
    fn supports(&self) -> KindKey;

    async fn visit(
        &self,
        object: &DynamicObject,
        handler: &dyn ObjectHandler,
        visitor: &dyn Visitor,
        visit_descendants: bool,
    ) -> Result<(), VisitError>;
}

/// The dispatcher. Holds the kind registry, fixed at construction time.
pub struct ObjectVisitor {
    visitors: HashMap<KindKey, Box<dyn TypedVisitor>>,
}

impl std::fmt::Debug for ObjectVisitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectVisitor")
            .field("kinds", &self.visitors.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ObjectVisitor {
    /// Build a dispatcher from a set of typed visitors.
    ///
    /// Registering two visitors for the same kind is a construction-time
    /// error, not a runtime one.
    pub fn new(typed_visitors: Vec<Box<dyn TypedVisitor>>) -> Result<Self, VisitError> {
        let mut visitors = HashMap::new();
        for typed in typed_visitors {
            let key = typed.supports();
            if visitors.insert(key.clone(), typed).is_some() {
                return Err(VisitError::DuplicateVisitor(key));
            }
        }
        Ok(Self { visitors })
    }

    /// Build a dispatcher covering every kind this crate ships a visitor for.
    pub fn with_default_visitors(queryer: Arc<dyn Queryer>) -> Result<Self, VisitError> {
        Self::new(vec![
            Box::new(ServiceVisitor::new(queryer.clone())),
            Box::new(IngressVisitor::new(queryer.clone())),
            Box::new(PodVisitor::new(queryer.clone())),
            Box::new(DeploymentVisitor::new(queryer.clone())),
            Box::new(ReplicaSetVisitor::new(queryer.clone())),
            Box::new(StatefulSetVisitor::new(queryer.clone())),
            Box::new(DaemonSetVisitor::new(queryer)),
        ])
    }

    /// Visit `object` and everything reachable from it.
    ///
    /// One call is one traversal: a fresh visited set guarantees each
    /// reachable object is dispatched at most once, which also terminates
    /// cyclic relationship graphs. Objects of unregistered kinds are
    /// terminal leaves, not errors.
    pub async fn visit(
        &self,
        object: &DynamicObject,
        handler: &dyn ObjectHandler,
        visit_descendants: bool,
    ) -> Result<(), VisitError> {
        let traversal = Traversal {
            visitors: &self.visitors,
            visited: Mutex::new(HashSet::new()),
        };
        let result = traversal.visit(object, handler, visit_descendants).await;
        if let Err(err) = &result {
            tracing::warn!(error = %err, "traversal failed");
        }
        result
    }
}

/// State of one in-flight traversal. The visited set is the only mutable
/// state shared across concurrent branches; the lock is never held across
/// an await point.
struct Traversal<'a> {
    visitors: &'a HashMap<KindKey, Box<dyn TypedVisitor>>,
    visited: Mutex<HashSet<ResourceRef>>,
}

#[async_trait]
impl Visitor for Traversal<'_> {
    async fn visit(
        &self,
        object: &DynamicObject,
        handler: &dyn ObjectHandler,
        visit_descendants: bool,
    ) -> Result<(), VisitError> {
        let reference = ResourceRef::from_object(object)?;

        {
            let mut visited = self.visited.lock().await;
            if !visited.insert(reference.clone()) {
                tracing::trace!(object = %reference, "already visited");
                return Ok(());
            }
        }

        let Some(typed) = self.visitors.get(&reference.kind_key()) else {
            tracing::debug!(object = %reference, "no visitor registered, terminal leaf");
            return Ok(());
        };

        tracing::debug!(object = %reference, "visiting");
        typed
            .visit(object, handler, self, visit_descendants)
            .await
            .map_err(|err| VisitError::Visit {
                object: reference,
                source: Box::new(err),
            })
    }
}

/// Report one edge, tagging handler failures with both endpoint identities.
pub(crate) async fn report_edge(
    handler: &dyn ObjectHandler,
    source: EdgeDefinition,
    target: EdgeDefinition,
) -> Result<(), VisitError> {
    let edge_source = source.object.clone();
    let edge_target = target.object.clone();
    handler
        .add_edge(source, target)
        .await
        .map_err(|error| VisitError::Handler {
            edge_source,
            edge_target,
            error,
        })
}
