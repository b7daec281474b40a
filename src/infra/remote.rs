//! Appwrite document-API client.
//!
//! Implements [`DocumentStore`] over Appwrite's REST surface. Queries are
//! serialized as the JSON method objects the v1.5+ API expects, and the
//! `$`-prefixed system attributes are mapped into domain records at the
//! boundary so nothing above this module knows about the wire shape.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use time::OffsetDateTime;
use tracing::debug;
use url::Url;

use crate::application::repos::{
    AUTO_ID, DocumentStore, ListQuery, RemoteError, SortOrder,
};
use crate::config::RemoteSettings;
use crate::domain::entities::{CategoryRecord, NewCategory, NewPoem, PoemRecord};
use crate::domain::types::LanguageAvailability;

pub struct AppwriteClient {
    http: Client,
    endpoint: Url,
    database_id: String,
    poems_collection_id: String,
    categories_collection_id: String,
}

impl AppwriteClient {
    pub fn new(settings: &RemoteSettings) -> Result<Self, RemoteError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "X-Appwrite-Project",
            HeaderValue::from_str(&settings.project_id)
                .map_err(|err| RemoteError::transport(err.to_string()))?,
        );
        if let Some(key) = settings.api_key.as_deref() {
            let mut value = HeaderValue::from_str(key)
                .map_err(|err| RemoteError::transport(err.to_string()))?;
            value.set_sensitive(true);
            headers.insert("X-Appwrite-Key", value);
        }

        let http = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|err| RemoteError::transport(err.to_string()))?;

        Ok(Self {
            http,
            endpoint: settings.endpoint.clone(),
            database_id: settings.database_id.clone(),
            poems_collection_id: settings.poems_collection_id.clone(),
            categories_collection_id: settings.categories_collection_id.clone(),
        })
    }

    fn documents_url(&self, collection_id: &str) -> Result<Url, RemoteError> {
        self.endpoint
            .join(&format!(
                "databases/{}/collections/{}/documents",
                self.database_id, collection_id
            ))
            .map_err(|err| RemoteError::transport(err.to_string()))
    }

    async fn list<T: DeserializeOwned>(
        &self,
        collection_id: &str,
        query: &ListQuery,
    ) -> Result<Vec<T>, RemoteError> {
        let mut url = self.documents_url(collection_id)?;
        for part in build_queries(query) {
            url.query_pairs_mut().append_pair("queries[]", &part);
        }

        debug!(collection = collection_id, %url, "Listing documents");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| RemoteError::transport(err.to_string()))?;
        let list: DocumentList<T> = decode(response).await?;
        Ok(list.documents)
    }

    async fn create<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        collection_id: &str,
        draft: &B,
    ) -> Result<T, RemoteError> {
        let url = self.documents_url(collection_id)?;
        let body = json!({
            "documentId": AUTO_ID,
            "data": draft,
        });

        let response = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|err| RemoteError::transport(err.to_string()))?;
        decode(response).await
    }
}

#[async_trait]
impl DocumentStore for AppwriteClient {
    async fn list_poems(&self, query: &ListQuery) -> Result<Vec<PoemRecord>, RemoteError> {
        let documents: Vec<PoemDocument> = self.list(&self.poems_collection_id, query).await?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn list_categories(
        &self,
        query: &ListQuery,
    ) -> Result<Vec<CategoryRecord>, RemoteError> {
        let documents: Vec<CategoryDocument> =
            self.list(&self.categories_collection_id, query).await?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn create_poem(&self, draft: &NewPoem) -> Result<PoemRecord, RemoteError> {
        let document: PoemDocument = self.create(&self.poems_collection_id, draft).await?;
        Ok(document.into())
    }

    async fn create_category(&self, draft: &NewCategory) -> Result<CategoryRecord, RemoteError> {
        let document: CategoryDocument =
            self.create(&self.categories_collection_id, draft).await?;
        Ok(document.into())
    }

    async fn get_poem(&self, id: &str) -> Result<PoemRecord, RemoteError> {
        let mut url = self.documents_url(&self.poems_collection_id)?;
        url.path_segments_mut()
            .map_err(|_| RemoteError::transport("endpoint cannot be a base"))?
            .push(id);

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| RemoteError::transport(err.to_string()))?;
        let document: PoemDocument = decode(response).await?;
        Ok(document.into())
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, RemoteError> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(RemoteError::NotFound);
    }
    if !status.is_success() {
        let message = response
            .json::<ErrorEnvelope>()
            .await
            .map(|envelope| envelope.message)
            .unwrap_or_else(|_| status.to_string());
        return Err(RemoteError::Service {
            status: status.as_u16(),
            message,
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|err| RemoteError::decode(err.to_string()))
}

fn build_queries(query: &ListQuery) -> Vec<String> {
    let mut parts = Vec::new();
    match query.order {
        Some(SortOrder::CreatedDesc) => {
            parts.push(json!({"method": "orderDesc", "attribute": "$createdAt"}).to_string());
        }
        None => {}
    }
    if let Some(equals) = query.equals.as_ref() {
        parts.push(
            json!({
                "method": "equal",
                "attribute": equals.field,
                "values": [equals.value],
            })
            .to_string(),
        );
    }
    if let Some(limit) = query.limit {
        parts.push(json!({"method": "limit", "values": [limit]}).to_string());
    }
    parts
}

// ============================================================================
// Wire DTOs
// ============================================================================

#[derive(Deserialize)]
struct DocumentList<T> {
    documents: Vec<T>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    message: String,
}

#[derive(Deserialize)]
struct PoemDocument {
    #[serde(rename = "$id")]
    id: String,
    #[serde(rename = "$createdAt", with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
    #[serde(default)]
    title_en: String,
    #[serde(default)]
    title_ur: Option<String>,
    #[serde(default)]
    content_en: String,
    #[serde(default)]
    content_ur: Option<String>,
    #[serde(default)]
    category: String,
    #[serde(default)]
    language: LanguageAvailability,
    #[serde(default)]
    featured: bool,
    #[serde(default)]
    description_en: Option<String>,
    #[serde(default)]
    description_ur: Option<String>,
}

impl From<PoemDocument> for PoemRecord {
    fn from(doc: PoemDocument) -> Self {
        Self {
            id: doc.id,
            title_en: doc.title_en,
            title_ur: doc.title_ur,
            content_en: doc.content_en,
            content_ur: doc.content_ur,
            category: doc.category,
            language: doc.language,
            featured: doc.featured,
            description_en: doc.description_en,
            description_ur: doc.description_ur,
            created_at: doc.created_at,
        }
    }
}

#[derive(Deserialize)]
struct CategoryDocument {
    #[serde(rename = "$id")]
    id: String,
    #[serde(default)]
    slug: String,
    #[serde(default)]
    name_en: String,
    #[serde(default)]
    name_ur: Option<String>,
}

impl From<CategoryDocument> for CategoryRecord {
    fn from(doc: CategoryDocument) -> Self {
        Self {
            id: doc.id,
            slug: doc.slug,
            name_en: doc.name_en,
            name_ur: doc.name_ur,
        }
    }
}
