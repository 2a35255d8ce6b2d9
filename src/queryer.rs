//! Queryer collaborator contract
//!
//! The engine consumes this trait and never implements it: the surrounding
//! application owns the data-access layer (caching, pagination, API client).
//! Every method must be safe for concurrent invocation and returns an empty
//! result, not an error, when no related objects exist.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Pod, Service};
use k8s_openapi::api::networking::v1::Ingress;
use kube::core::DynamicObject;

use crate::graph::ResourceRef;

/// Per-kind relationship lookups backing the typed visitors.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Queryer: Send + Sync {
    /// Pods matched by a service's label selector.
    async fn pods_for_service(&self, service: &Service) -> anyhow::Result<Vec<Pod>>;

    /// Ingresses with a rule routing to a service.
    async fn ingresses_for_service(&self, service: &Service) -> anyhow::Result<Vec<Ingress>>;

    /// Services an ingress routes to.
    async fn services_for_ingress(&self, ingress: &Ingress) -> anyhow::Result<Vec<Service>>;

    /// Services whose selector matches a pod's labels.
    async fn services_for_pod(&self, pod: &Pod) -> anyhow::Result<Vec<Service>>;

    /// Objects owned by the referenced object (ReplicaSets of a Deployment,
    /// Pods of a ReplicaSet, and so on).
    async fn children(&self, owner: &ResourceRef) -> anyhow::Result<Vec<DynamicObject>>;

    /// The controlling owner of an object, if it has one.
    async fn owner_reference(
        &self,
        object: &DynamicObject,
    ) -> anyhow::Result<Option<DynamicObject>>;
}
