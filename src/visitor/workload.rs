//! Typed visitors for owner-style workloads
//!
//! Deployments, replica sets, stateful sets and daemon sets all relate to
//! their descendants the same way: the queryer lists the objects they own,
//! and the edge carries the workload's rendered label selector. One macro
//! stamps out the visitor for each kind.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet};
use kube::core::DynamicObject;

use crate::error::VisitError;
use crate::graph::{ConnectorType, EdgeDefinition, ResourceRef};
use crate::gvk::KindKey;
use crate::object::{from_dynamic, selector_text};
use crate::queryer::Queryer;
use crate::visitor::{ObjectHandler, TypedVisitor, Visitor, report_edge};

/// Report an edge for every child of `owner_ref` and recurse into it.
async fn visit_children(
    queryer: &dyn Queryer,
    handler: &dyn ObjectHandler,
    visitor: &dyn Visitor,
    owner_ref: &ResourceRef,
    connector: &str,
    relation: &'static str,
    visit_descendants: bool,
) -> Result<(), VisitError> {
    let children = queryer
        .children(owner_ref)
        .await
        .map_err(|error| VisitError::Discovery {
            relation,
            object: owner_ref.clone(),
            error,
        })?;

    try_join_all(children.iter().map(|child| async move {
        if visit_descendants {
            visitor.visit(child, handler, true).await?;
        }
        let child_ref = ResourceRef::from_object(child)?;
        report_edge(
            handler,
            EdgeDefinition::new(owner_ref.clone(), connector, ConnectorType::Selector),
            EdgeDefinition::new(child_ref, connector, ConnectorType::Label),
        )
        .await
    }))
    .await?;

    Ok(())
}

macro_rules! impl_owner_visitor {
    ($(#[$meta:meta])* $name:ident, $resource:ty, $key:ident, $relation:literal) => {
        $(#[$meta])*
        pub struct $name {
            queryer: Arc<dyn Queryer>,
        }

        impl $name {
            pub fn new(queryer: Arc<dyn Queryer>) -> Self {
                Self { queryer }
            }
        }

        #[async_trait]
        impl TypedVisitor for $name {
            fn supports(&self) -> KindKey {
                KindKey::$key()
            }

            async fn visit(
                &self,
                object: &DynamicObject,
                handler: &dyn ObjectHandler,
                visitor: &dyn Visitor,
                visit_descendants: bool,
            ) -> Result<(), VisitError> {
                let workload: $resource = from_dynamic(object)?;
                let owner_ref = ResourceRef::from_object(object)?;
                let connector = selector_text(
                    workload
                        .spec
                        .as_ref()
                        .and_then(|spec| spec.selector.match_labels.as_ref()),
                );
                visit_children(
                    self.queryer.as_ref(),
                    handler,
                    visitor,
                    &owner_ref,
                    &connector,
                    $relation,
                    visit_descendants,
                )
                .await
            }
        }
    };
}

impl_owner_visitor!(
    /// Visits a deployment: expands into the replica sets it owns.
    DeploymentVisitor,
    Deployment,
    deployment,
    "replica sets for deployment"
);

impl_owner_visitor!(
    /// Visits a replica set: expands into the pods it owns.
    ReplicaSetVisitor,
    ReplicaSet,
    replica_set,
    "pods for replica set"
);

impl_owner_visitor!(
    /// Visits a stateful set: expands into the pods it owns.
    StatefulSetVisitor,
    StatefulSet,
    stateful_set,
    "pods for stateful set"
);

impl_owner_visitor!(
    /// Visits a daemon set: expands into the pods it owns.
    DaemonSetVisitor,
    DaemonSet,
    daemon_set,
    "pods for daemon set"
);
