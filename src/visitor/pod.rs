//! Typed visitor for pods

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use k8s_openapi::api::core::v1::Pod;
use kube::core::DynamicObject;

use crate::error::VisitError;
use crate::graph::{ConnectorType, EdgeDefinition, ResourceRef};
use crate::gvk::KindKey;
use crate::object::{from_dynamic, selector_text, to_dynamic};
use crate::queryer::Queryer;
use crate::visitor::{ObjectHandler, TypedVisitor, Visitor, report_edge};

/// Visits a pod: discovers the services selecting it and its controlling
/// owner. The owner is visited with descendants off so an upward hop records
/// the edge without re-expanding the whole tree from there.
pub struct PodVisitor {
    queryer: Arc<dyn Queryer>,
}

impl PodVisitor {
    pub fn new(queryer: Arc<dyn Queryer>) -> Self {
        Self { queryer }
    }
}

#[async_trait]
impl TypedVisitor for PodVisitor {
    fn supports(&self) -> KindKey {
        KindKey::pod()
    }

    async fn visit(
        &self,
        object: &DynamicObject,
        handler: &dyn ObjectHandler,
        visitor: &dyn Visitor,
        visit_descendants: bool,
    ) -> Result<(), VisitError> {
        let pod: Pod = from_dynamic(object)?;
        let pod_ref = ResourceRef::from_object(object)?;

        let services = {
            let pod = &pod;
            let pod_ref = &pod_ref;
            async move {
                let services =
                    self.queryer
                        .services_for_pod(pod)
                        .await
                        .map_err(|error| VisitError::Discovery {
                            relation: "services for pod",
                            object: pod_ref.clone(),
                            error,
                        })?;

                try_join_all(services.iter().map(|service| async move {
                    let parent = to_dynamic(service)?;
                    if visit_descendants {
                        visitor.visit(&parent, handler, true).await?;
                    }
                    let service_ref = ResourceRef::from_object(&parent)?;
                    let connector = selector_text(
                        service.spec.as_ref().and_then(|spec| spec.selector.as_ref()),
                    );
                    report_edge(
                        handler,
                        EdgeDefinition::new(service_ref, connector.clone(), ConnectorType::Selector),
                        EdgeDefinition::new(pod_ref.clone(), connector, ConnectorType::Label),
                    )
                    .await
                }))
                .await?;

                Ok::<_, VisitError>(())
            }
        };

        let owner = {
            let pod_ref = &pod_ref;
            async move {
                let owner = self.queryer.owner_reference(object).await.map_err(|error| {
                    VisitError::Discovery {
                        relation: "owner of pod",
                        object: pod_ref.clone(),
                        error,
                    }
                })?;

                if let Some(owner) = owner {
                    if visit_descendants {
                        visitor.visit(&owner, handler, false).await?;
                    }
                    let owner_ref = ResourceRef::from_object(&owner)?;
                    report_edge(
                        handler,
                        EdgeDefinition::unknown(owner_ref),
                        EdgeDefinition::unknown(pod_ref.clone()),
                    )
                    .await?;
                }

                Ok::<_, VisitError>(())
            }
        };

        futures::try_join!(services, owner)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queryer::MockQueryer;
    use crate::visitor::testing::{RecordingHandler, RecordingVisitor};
    use k8s_openapi::api::apps::v1::ReplicaSet;
    use k8s_openapi::api::core::v1::{Service, ServiceSpec};
    use std::collections::BTreeMap;

    fn pod_fixture() -> Pod {
        let mut pod = Pod::default();
        pod.metadata.name = Some("web-0".to_string());
        pod.metadata.namespace = Some("default".to_string());
        pod
    }

    #[tokio::test]
    async fn test_pod_visit_reports_service_and_owner_edges() {
        let mut queryer = MockQueryer::new();

        let mut service = Service::default();
        service.metadata.name = Some("web".to_string());
        service.metadata.namespace = Some("default".to_string());
        service.spec = Some(ServiceSpec {
            selector: Some(BTreeMap::from([("app".to_string(), "web".to_string())])),
            ..Default::default()
        });
        queryer
            .expect_services_for_pod()
            .returning(move |_| Ok(vec![service.clone()]));

        let mut replica_set = ReplicaSet::default();
        replica_set.metadata.name = Some("web-7d4b".to_string());
        replica_set.metadata.namespace = Some("default".to_string());
        let owner = to_dynamic(&replica_set).unwrap();
        queryer
            .expect_owner_reference()
            .returning(move |_| Ok(Some(owner.clone())));

        let handler = RecordingHandler::new();
        let recorder = RecordingVisitor::new();
        let typed = PodVisitor::new(Arc::new(queryer));

        let object = to_dynamic(&pod_fixture()).unwrap();
        typed.visit(&object, &handler, &recorder, true).await.unwrap();

        let pod_ref = ResourceRef::new("", "v1", "Pod", Some("default"), "web-0");
        let service_ref = ResourceRef::new("", "v1", "Service", Some("default"), "web");
        let owner_ref = ResourceRef::new("apps", "v1", "ReplicaSet", Some("default"), "web-7d4b");

        let edges = handler.edges().await;
        assert_eq!(edges.len(), 2);
        assert!(edges.contains(&(
            EdgeDefinition::new(service_ref.clone(), "app: web", ConnectorType::Selector),
            EdgeDefinition::new(pod_ref.clone(), "app: web", ConnectorType::Label),
        )));
        assert!(edges.contains(&(
            EdgeDefinition::unknown(owner_ref.clone()),
            EdgeDefinition::unknown(pod_ref),
        )));

        // The owner hop must not keep expanding descendants.
        let visits = recorder.visits().await;
        assert!(visits.contains(&(service_ref, true)));
        assert!(visits.contains(&(owner_ref, false)));
    }

    #[tokio::test]
    async fn test_pod_visit_without_owner() {
        let mut queryer = MockQueryer::new();
        queryer.expect_services_for_pod().returning(|_| Ok(vec![]));
        queryer.expect_owner_reference().returning(|_| Ok(None));

        let handler = RecordingHandler::new();
        let recorder = RecordingVisitor::new();
        let typed = PodVisitor::new(Arc::new(queryer));

        let object = to_dynamic(&pod_fixture()).unwrap();
        typed.visit(&object, &handler, &recorder, true).await.unwrap();

        assert!(handler.edges().await.is_empty());
        assert!(recorder.visits().await.is_empty());
    }
}
