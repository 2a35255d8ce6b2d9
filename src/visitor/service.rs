//! Typed visitor for services

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use k8s_openapi::api::core::v1::Service;
use kube::core::DynamicObject;

use crate::error::VisitError;
use crate::graph::{ConnectorType, EdgeDefinition, ResourceRef};
use crate::gvk::KindKey;
use crate::object::{from_dynamic, selector_text, to_dynamic};
use crate::queryer::Queryer;
use crate::visitor::{ObjectHandler, TypedVisitor, Visitor, report_edge};

/// Visits a service: discovers the pods behind its selector and the
/// ingresses routing to it. Both queries fan out concurrently.
pub struct ServiceVisitor {
    queryer: Arc<dyn Queryer>,
}

impl ServiceVisitor {
    pub fn new(queryer: Arc<dyn Queryer>) -> Self {
        Self { queryer }
    }
}

#[async_trait]
impl TypedVisitor for ServiceVisitor {
    fn supports(&self) -> KindKey {
        KindKey::service()
    }

    async fn visit(
        &self,
        object: &DynamicObject,
        handler: &dyn ObjectHandler,
        visitor: &dyn Visitor,
        visit_descendants: bool,
    ) -> Result<(), VisitError> {
        let service: Service = from_dynamic(object)?;
        let service_ref = ResourceRef::from_object(object)?;

        let pods = {
            let service = &service;
            let service_ref = &service_ref;
            async move {
                let pods = self.queryer.pods_for_service(service).await.map_err(|error| {
                    VisitError::Discovery {
                        relation: "pods for service",
                        object: service_ref.clone(),
                        error,
                    }
                })?;

                let connector =
                    selector_text(service.spec.as_ref().and_then(|spec| spec.selector.as_ref()));

                try_join_all(pods.iter().map(|pod| {
                    let connector = connector.clone();
                    async move {
                        let child = to_dynamic(pod)?;
                        if visit_descendants {
                            visitor.visit(&child, handler, true).await?;
                        }
                        let pod_ref = ResourceRef::from_object(&child)?;
                        report_edge(
                            handler,
                            EdgeDefinition::new(
                                service_ref.clone(),
                                connector.clone(),
                                ConnectorType::Selector,
                            ),
                            EdgeDefinition::new(pod_ref, connector, ConnectorType::Label),
                        )
                        .await
                    }
                }))
                .await?;

                Ok::<_, VisitError>(())
            }
        };

        let ingresses = {
            let service = &service;
            let service_ref = &service_ref;
            async move {
                let ingresses =
                    self.queryer
                        .ingresses_for_service(service)
                        .await
                        .map_err(|error| VisitError::Discovery {
                            relation: "ingresses for service",
                            object: service_ref.clone(),
                            error,
                        })?;

                // Routing rules are not reduced to a descriptive string, so
                // both endpoints stay unclassified.
                try_join_all(ingresses.iter().map(|ingress| async move {
                    let child = to_dynamic(ingress)?;
                    if visit_descendants {
                        visitor.visit(&child, handler, true).await?;
                    }
                    let ingress_ref = ResourceRef::from_object(&child)?;
                    report_edge(
                        handler,
                        EdgeDefinition::unknown(service_ref.clone()),
                        EdgeDefinition::unknown(ingress_ref),
                    )
                    .await
                }))
                .await?;

                Ok::<_, VisitError>(())
            }
        };

        futures::try_join!(pods, ingresses)?;
        Ok(())
    }
}
