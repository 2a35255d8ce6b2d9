//! Typed visitor for ingresses

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use k8s_openapi::api::networking::v1::Ingress;
use kube::core::DynamicObject;

use crate::error::VisitError;
use crate::graph::{EdgeDefinition, ResourceRef};
use crate::gvk::KindKey;
use crate::object::{from_dynamic, to_dynamic};
use crate::queryer::Queryer;
use crate::visitor::{ObjectHandler, TypedVisitor, Visitor, report_edge};

/// Visits an ingress: discovers the services its rules route to. Routing
/// rules carry no single descriptive string, so edges stay unclassified.
pub struct IngressVisitor {
    queryer: Arc<dyn Queryer>,
}

impl IngressVisitor {
    pub fn new(queryer: Arc<dyn Queryer>) -> Self {
        Self { queryer }
    }
}

#[async_trait]
impl TypedVisitor for IngressVisitor {
    fn supports(&self) -> KindKey {
        KindKey::ingress()
    }

    async fn visit(
        &self,
        object: &DynamicObject,
        handler: &dyn ObjectHandler,
        visitor: &dyn Visitor,
        visit_descendants: bool,
    ) -> Result<(), VisitError> {
        let ingress: Ingress = from_dynamic(object)?;
        let ingress_ref = ResourceRef::from_object(object)?;

        let services = self
            .queryer
            .services_for_ingress(&ingress)
            .await
            .map_err(|error| VisitError::Discovery {
                relation: "services for ingress",
                object: ingress_ref.clone(),
                error,
            })?;

        let ingress_ref = &ingress_ref;
        try_join_all(services.iter().map(|service| async move {
            let child = to_dynamic(service)?;
            if visit_descendants {
                visitor.visit(&child, handler, true).await?;
            }
            let service_ref = ResourceRef::from_object(&child)?;
            report_edge(
                handler,
                EdgeDefinition::unknown(ingress_ref.clone()),
                EdgeDefinition::unknown(service_ref),
            )
            .await
        }))
        .await?;

        Ok(())
    }
}
