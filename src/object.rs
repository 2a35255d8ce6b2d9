//! Typed <-> dynamic conversion boundary
//!
//! Discovery queries return strongly typed resources, while the traversal
//! itself works over [`DynamicObject`]s so a single dispatcher can route any
//! kind. Conversion failures are distinct traversal errors, never skipped.

use std::collections::BTreeMap;

use kube::core::DynamicObject;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::VisitError;

/// Convert a typed resource into the dynamic representation used as the
/// unit of traversal.
///
/// Typed structs do not carry `apiVersion`/`kind` fields, so both are
/// re-attached from the type's metadata before the round-trip.
pub fn to_dynamic<K>(resource: &K) -> Result<DynamicObject, VisitError>
where
    K: kube::Resource<DynamicType = ()> + Serialize,
{
    let mut value = serde_json::to_value(resource).map_err(|source| VisitError::Conversion {
        object: K::kind(&()).into_owned(),
        source,
    })?;

    if let Some(map) = value.as_object_mut() {
        map.insert(
            "apiVersion".to_string(),
            serde_json::Value::String(K::api_version(&()).into_owned()),
        );
        map.insert(
            "kind".to_string(),
            serde_json::Value::String(K::kind(&()).into_owned()),
        );
    }

    serde_json::from_value(value).map_err(|source| VisitError::Conversion {
        object: K::kind(&()).into_owned(),
        source,
    })
}

/// Convert a dynamic object back into its typed form.
///
/// The typed deserializer validates `apiVersion`/`kind` when present, so
/// feeding a Pod to a visitor that expects a Service fails here instead of
/// producing a half-empty struct.
pub fn from_dynamic<K>(object: &DynamicObject) -> Result<K, VisitError>
where
    K: kube::Resource<DynamicType = ()> + DeserializeOwned,
{
    let describe = || {
        let name = object.metadata.name.as_deref().unwrap_or("<unnamed>");
        format!("{} {}", K::kind(&()), name)
    };

    let value = serde_json::to_value(object).map_err(|source| VisitError::Conversion {
        object: describe(),
        source,
    })?;

    serde_json::from_value(value).map_err(|source| VisitError::Conversion {
        object: describe(),
        source,
    })
}

/// Render a label selector as connector text: `"key: value"` pairs joined by
/// `", "`. BTreeMap iteration keeps key order stable, so the same selector
/// always renders to the same string.
pub fn selector_text(selector: Option<&BTreeMap<String, String>>) -> String {
    match selector {
        Some(labels) => labels
            .iter()
            .map(|(key, value)| format!("{key}: {value}"))
            .collect::<Vec<_>>()
            .join(", "),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ResourceRef;
    use k8s_openapi::api::core::v1::{Pod, Service, ServiceSpec};

    fn service_with_selector(name: &str, selector: &[(&str, &str)]) -> Service {
        let mut service = Service::default();
        service.metadata.name = Some(name.to_string());
        service.metadata.namespace = Some("default".to_string());
        service.spec = Some(ServiceSpec {
            selector: Some(
                selector
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
            ..Default::default()
        });
        service
    }

    #[test]
    fn test_to_dynamic_attaches_type_metadata() {
        let service = service_with_selector("web", &[("app", "octant")]);
        let object = to_dynamic(&service).unwrap();

        let types = object.types.as_ref().unwrap();
        assert_eq!(types.api_version, "v1");
        assert_eq!(types.kind, "Service");

        let reference = ResourceRef::from_object(&object).unwrap();
        assert_eq!(reference, ResourceRef::new("", "v1", "Service", Some("default"), "web"));
    }

    #[test]
    fn test_round_trip_preserves_spec() {
        let service = service_with_selector("web", &[("app", "octant")]);
        let object = to_dynamic(&service).unwrap();
        let back: Service = from_dynamic(&object).unwrap();
        assert_eq!(back, service);
    }

    #[test]
    fn test_from_dynamic_rejects_wrong_kind() {
        let service = service_with_selector("web", &[("app", "octant")]);
        let object = to_dynamic(&service).unwrap();
        let err = from_dynamic::<Pod>(&object).unwrap_err();
        assert!(matches!(err, VisitError::Conversion { .. }));
    }

    #[test]
    fn test_selector_text_sorted_and_stable() {
        let service = service_with_selector("web", &[("tier", "web"), ("app", "octant")]);
        let selector = service.spec.as_ref().and_then(|s| s.selector.as_ref());

        let first = selector_text(selector);
        assert_eq!(first, "app: octant, tier: web");
        assert_eq!(selector_text(selector), first);
    }

    #[test]
    fn test_selector_text_empty() {
        assert_eq!(selector_text(None), "");
        assert_eq!(selector_text(Some(&BTreeMap::new())), "");
    }
}
