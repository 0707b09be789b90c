//! HTTP registry importer
//!
//! CREATE is a `POST` to the collection URL, UPDATE a `PUT` to the member URL:
//!
//! ```text
//! Organization  orgs/                                   orgs/<id>/
//! Source        orgs/<owner>/sources/                   orgs/<owner>/sources/<id>/
//! Collection    orgs/<owner>/collections/               orgs/<owner>/collections/<id>/
//! Concept       orgs/<owner>/sources/<repo>/concepts/   orgs/<owner>/sources/<repo>/concepts/<id>/
//! Mapping       orgs/<owner>/sources/<repo>/mappings/   orgs/<owner>/sources/<repo>/mappings/<id>/
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use serde_json::{Map, Value};

use metasync_core::fetch::join_url;
use metasync_core::{
    ActionKind, Credential, ImportEntry, RecordImportError, RegistryImporter, RegistryTarget,
    ResourceType, SourceDescriptor, SubmitError, TransportError,
};

use crate::client::{authorize, error_body, is_gateway_failure};

#[derive(Debug, Clone)]
pub struct HttpRegistryImporter {
    client: Client,
    base_url: String,
    target: RegistryTarget,
    credential: Credential,
    timeout: Duration,
}

impl HttpRegistryImporter {
    /// Importer writing into `target` on the registry described by `registry`.
    pub fn new(client: Client, registry: &SourceDescriptor, target: RegistryTarget) -> Self {
        Self {
            client,
            base_url: registry.base_url.clone(),
            target,
            credential: registry.credential.clone(),
            timeout: registry.timeout(),
        }
    }

    /// Collection URL for a resource type.
    pub fn collection_url(&self, resource_type: ResourceType) -> String {
        let owner = &self.target.owner;
        let repository = &self.target.repository;
        let path = match resource_type {
            ResourceType::Organization => "orgs/".to_string(),
            ResourceType::Source => format!("orgs/{owner}/sources/"),
            ResourceType::Collection => format!("orgs/{owner}/collections/"),
            ResourceType::Concept => format!("orgs/{owner}/sources/{repository}/concepts/"),
            ResourceType::Mapping => format!("orgs/{owner}/sources/{repository}/mappings/"),
        };
        join_url(&self.base_url, &path)
    }

    /// URL and method for one entry.
    ///
    /// The id becomes a single percent-encoded path segment, so ids holding
    /// `/`, `?` or `#` still address their own member.
    pub fn request_target(&self, entry: &ImportEntry) -> Result<(Method, Url), TransportError> {
        let collection = self.collection_url(entry.resource_type);
        let mut url = Url::parse(&collection).map_err(|e| {
            TransportError::new(format!("invalid registry URL {collection}: {e}"))
        })?;

        if entry.action != ActionKind::Update {
            return Ok((Method::POST, url));
        }
        url.path_segments_mut()
            .map_err(|_| {
                TransportError::new(format!("registry URL {collection} cannot be a base"))
            })?
            .pop_if_empty()
            .push(&entry.external_id)
            .push("");
        Ok((Method::PUT, url))
    }
}

/// Request body: the desired state plus the id.
fn body(entry: &ImportEntry) -> Value {
    let mut body: Map<String, Value> = entry
        .payload
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    body.insert("id".to_string(), Value::from(entry.external_id.clone()));
    Value::Object(body)
}

#[async_trait]
impl RegistryImporter for HttpRegistryImporter {
    async fn submit(&self, entry: &ImportEntry) -> Result<(), SubmitError> {
        if entry.action == ActionKind::Noop {
            return Ok(());
        }
        let (method, url) = self.request_target(entry)?;
        tracing::debug!(%method, %url, external_id = %entry.external_id, "Submitting entry");

        let request = authorize(self.client.request(method, url), &self.credential)
            .timeout(self.timeout)
            .json(&body(entry));
        let response = request
            .send()
            .await
            .map_err(|e| TransportError::new(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let detail = error_body(response).await;
        if is_gateway_failure(status) {
            return Err(TransportError::new(format!("HTTP {status}: {detail}")).into());
        }
        Err(RecordImportError::new(Some(status.as_u16()), detail).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metasync_core::{Attributes, WireFormat};

    fn importer() -> HttpRegistryImporter {
        let registry = SourceDescriptor::new("ocl", "https://api.example.org/", "export", WireFormat::Ocl);
        HttpRegistryImporter::new(
            Client::new(),
            &registry,
            RegistryTarget {
                owner: "PEPFAR".into(),
                repository: "DATIM".into(),
            },
        )
    }

    fn entry(resource_type: ResourceType, action: ActionKind) -> ImportEntry {
        ImportEntry {
            resource_type,
            external_id: "X1".into(),
            action,
            payload: Attributes::new(),
        }
    }

    #[test]
    fn create_posts_to_collection() {
        let (method, url) = importer()
            .request_target(&entry(ResourceType::Concept, ActionKind::Create))
            .unwrap();
        assert_eq!(method, Method::POST);
        assert_eq!(url.as_str(), "https://api.example.org/orgs/PEPFAR/sources/DATIM/concepts/");
    }

    #[test]
    fn update_puts_to_member() {
        let (method, url) = importer()
            .request_target(&entry(ResourceType::Collection, ActionKind::Update))
            .unwrap();
        assert_eq!(method, Method::PUT);
        assert_eq!(url.as_str(), "https://api.example.org/orgs/PEPFAR/collections/X1/");
    }

    #[test]
    fn member_id_is_one_encoded_segment() {
        let mut e = entry(ResourceType::Concept, ActionKind::Update);
        e.external_id = "a/b?c#d".into();

        let (_, url) = importer().request_target(&e).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.org/orgs/PEPFAR/sources/DATIM/concepts/a%2Fb%3Fc%23d/"
        );
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn unparsable_base_url_is_transport_error() {
        let registry = SourceDescriptor::new("ocl", "not a url", "export", WireFormat::Ocl);
        let importer = HttpRegistryImporter::new(
            Client::new(),
            &registry,
            RegistryTarget {
                owner: "PEPFAR".into(),
                repository: "DATIM".into(),
            },
        );
        assert!(
            importer
                .request_target(&entry(ResourceType::Concept, ActionKind::Create))
                .is_err()
        );
    }

    #[test]
    fn organizations_live_at_the_root() {
        assert_eq!(
            importer().collection_url(ResourceType::Organization),
            "https://api.example.org/orgs/"
        );
    }

    #[test]
    fn body_carries_id_and_payload() {
        let mut e = entry(ResourceType::Concept, ActionKind::Create);
        e.payload.insert("name".into(), Value::from("TX_CURR"));
        assert_eq!(body(&e), serde_json::json!({"id": "X1", "name": "TX_CURR"}));
    }
}
