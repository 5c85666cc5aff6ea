use crate::core::UserDirectory;
use crate::error::RecommendError;
use crate::models::{BlockRecord, UserRecord};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

/// Page size used when walking a whole collection
const PAGE_SIZE: usize = 100;

/// Errors that can occur when interacting with Appwrite
#[derive(Debug, Error)]
pub enum AppwriteError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Unauthorized: invalid API key or project")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Appwrite API client
///
/// Handles all communication with the Appwrite document store:
/// - Resolving student records
/// - Querying alumni by skill
/// - Mirroring recommendation blocks into the app's collection
pub struct AppwriteClient {
    base_url: String,
    api_key: String,
    project_id: String,
    database_id: String,
    client: Client,
    collections: AppwriteCollections,
}

/// Collection IDs in Appwrite
#[derive(Debug, Clone)]
pub struct AppwriteCollections {
    pub users: String,
    pub recommendation_blocks: String,
}

impl AppwriteClient {
    /// Create a new Appwrite client
    pub fn new(
        base_url: String,
        api_key: String,
        project_id: String,
        database_id: String,
        collections: AppwriteCollections,
        timeout: Duration,
    ) -> Result<Self, AppwriteError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            api_key,
            project_id,
            database_id,
            client,
            collections,
        })
    }

    fn documents_url(&self, collection: &str) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.base_url.trim_end_matches('/'),
            self.database_id,
            collection
        )
    }

    /// Fetch a user document by its document id
    pub async fn get_user_document(&self, id: &str) -> Result<Option<UserRecord>, AppwriteError> {
        let url = format!(
            "{}/{}",
            self.documents_url(&self.collections.users),
            urlencoding::encode(id)
        );

        tracing::debug!("Fetching user document: {}", id);

        let response = self
            .client
            .get(&url)
            .header("X-Appwrite-Key", &self.api_key)
            .header("X-Appwrite-Project", &self.project_id)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => return Ok(None),
            StatusCode::UNAUTHORIZED => return Err(AppwriteError::Unauthorized),
            status if !status.is_success() => {
                let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
                tracing::error!("Failed to fetch user {}: {} - {}", id, status, body);
                return Err(AppwriteError::ApiError(format!(
                    "Failed to fetch user: {}",
                    status
                )));
            }
            _ => {}
        }

        let doc: Value = response.json().await?;
        parse_user_document(&doc)
            .map(Some)
            .ok_or_else(|| AppwriteError::InvalidResponse(format!("Malformed user document {}", id)))
    }

    /// Find the first user whose `id` field equals `id`
    pub async fn find_user_by_id_field(&self, id: &str) -> Result<Option<UserRecord>, AppwriteError> {
        let queries = vec![
            json!({"method": "equal", "attribute": "id", "values": [id]}),
            json!({"method": "limit", "values": [1]}),
        ];

        let users = self.list_documents(&self.collections.users, &queries).await?;
        Ok(users.into_iter().next())
    }

    /// Alumni whose `skills` array contains any of `tags`
    pub async fn search_alumni_by_skills(
        &self,
        tags: &[String],
        limit: usize,
    ) -> Result<Vec<UserRecord>, AppwriteError> {
        let queries = vec![
            json!({"method": "equal", "attribute": "role", "values": ["alumni"]}),
            json!({"method": "contains", "attribute": "skills", "values": tags}),
            json!({"method": "limit", "values": [limit]}),
        ];

        let alumni = self.list_documents(&self.collections.users, &queries).await?;
        tracing::debug!("Skill query over {} tags returned {} alumni", tags.len(), alumni.len());
        Ok(alumni)
    }

    /// Every alumni document, fetched page by page
    pub async fn list_all_alumni(&self) -> Result<Vec<UserRecord>, AppwriteError> {
        let mut alumni = Vec::new();
        let mut offset = 0;

        loop {
            let queries = vec![
                json!({"method": "equal", "attribute": "role", "values": ["alumni"]}),
                json!({"method": "limit", "values": [PAGE_SIZE]}),
                json!({"method": "offset", "values": [offset]}),
            ];

            let (page, returned) = self
                .list_documents_page(&self.collections.users, &queries)
                .await?;
            alumni.extend(page);

            if returned < PAGE_SIZE {
                break;
            }
            offset += returned;
        }

        tracing::debug!("Loaded {} alumni from full collection scan", alumni.len());
        Ok(alumni)
    }

    async fn list_documents(
        &self,
        collection: &str,
        queries: &[Value],
    ) -> Result<Vec<UserRecord>, AppwriteError> {
        Ok(self.list_documents_page(collection, queries).await?.0)
    }

    /// One page of documents plus the number of raw documents returned
    async fn list_documents_page(
        &self,
        collection: &str,
        queries: &[Value],
    ) -> Result<(Vec<UserRecord>, usize), AppwriteError> {
        let query_string = queries
            .iter()
            .map(|q| format!("queries[]={}", urlencoding::encode(&q.to_string())))
            .collect::<Vec<_>>()
            .join("&");
        let url = format!("{}?{}", self.documents_url(collection), query_string);

        let response = self
            .client
            .get(&url)
            .header("X-Appwrite-Key", &self.api_key)
            .header("X-Appwrite-Project", &self.project_id)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(AppwriteError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Failed to list documents in {}: {} - {}", collection, status, body);
            return Err(AppwriteError::ApiError(format!(
                "Failed to list documents: {}",
                status
            )));
        }

        let json: Value = response.json().await?;

        let documents = json
            .get("documents")
            .and_then(|d| d.as_array())
            .ok_or_else(|| AppwriteError::InvalidResponse("Missing documents array".into()))?;

        let records = documents.iter().filter_map(parse_user_document).collect();
        Ok((records, documents.len()))
    }

    /// Mirror a block into the app's own blocks collection
    pub async fn record_block(&self, block: &BlockRecord) -> Result<(), AppwriteError> {
        let url = self.documents_url(&self.collections.recommendation_blocks);

        let payload = json!({
            "documentId": uuid::Uuid::new_v4().to_string(),
            "data": block,
        });

        let response = self
            .client
            .post(&url)
            .header("X-Appwrite-Key", &self.api_key)
            .header("X-Appwrite-Project", &self.project_id)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppwriteError::ApiError(format!(
                "Failed to record block: {}",
                response.status()
            )));
        }

        tracing::debug!("Mirrored block: {} -> {}", block.student_id, block.alumni_id);

        Ok(())
    }
}

#[async_trait]
impl UserDirectory for AppwriteClient {
    async fn get_user(&self, id: &str) -> Result<Option<UserRecord>, RecommendError> {
        if let Some(user) = self.get_user_document(id).await? {
            return Ok(Some(user));
        }
        Ok(self.find_user_by_id_field(id).await?)
    }

    async fn query_alumni_by_skills(
        &self,
        tags: &[String],
        limit: usize,
    ) -> Result<Vec<UserRecord>, RecommendError> {
        Ok(self.search_alumni_by_skills(tags, limit).await?)
    }

    async fn list_alumni(&self) -> Result<Vec<UserRecord>, RecommendError> {
        Ok(self.list_all_alumni().await?)
    }
}

/// Decode a user document, taking the id from `$id` when the record has none
pub fn parse_user_document(doc: &Value) -> Option<UserRecord> {
    let data = doc.get("data").unwrap_or(doc);

    let mut record: UserRecord = match serde_json::from_value(data.clone()) {
        Ok(record) => record,
        Err(e) => {
            tracing::debug!("Skipping malformed user document: {}", e);
            return None;
        }
    };

    if record.id().is_none() {
        record.id = doc
            .get("$id")
            .and_then(Value::as_str)
            .map(str::to_string);
    }

    Some(record)
}
