//! Document operations against the remote store

mod query;

use std::sync::{Arc, Mutex};

use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;

use crate::auth::Session;
use crate::error::Error;
use crate::fetch::{Fetch, FetchBuilder};

pub use query::Query;

/// A page of documents as returned by the store
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentList<T> {
    /// Total number of matching documents
    pub total: u64,
    /// The documents on this page
    pub documents: Vec<T>,
}

/// Client for one collection of the remote store
#[derive(Clone)]
pub struct CollectionClient {
    /// The base URL for the remote store
    url: String,

    /// The project API key
    key: String,

    /// The database identifier
    database_id: String,

    /// The collection identifier
    collection_id: String,

    /// HTTP client
    client: Client,

    /// The current session, shared with the account client
    session: Arc<Mutex<Option<Session>>>,
}

impl CollectionClient {
    /// Create a new CollectionClient
    pub(crate) fn new(
        url: &str,
        key: &str,
        database_id: &str,
        collection_id: &str,
        client: Client,
        session: Arc<Mutex<Option<Session>>>,
    ) -> Self {
        Self {
            url: url.to_string(),
            key: key.to_string(),
            database_id: database_id.to_string(),
            collection_id: collection_id.to_string(),
            client,
            session,
        }
    }

    /// Base URL for document requests against this collection
    fn documents_url(&self) -> String {
        format!(
            "{}/v1/databases/{}/collections/{}/documents",
            self.url, self.database_id, self.collection_id
        )
    }

    fn authorize<'a>(&self, fetch: FetchBuilder<'a>) -> FetchBuilder<'a> {
        let token = {
            let session = self.session.lock().unwrap();
            session.as_ref().map(|s| s.access_token.clone())
        };
        let fetch = fetch.header("apikey", &self.key);
        match token {
            Some(token) => fetch.bearer_auth(&token),
            None => fetch,
        }
    }

    /// List documents matching the given queries
    pub async fn list<T: DeserializeOwned>(
        &self,
        queries: &[Query],
    ) -> Result<DocumentList<T>, Error> {
        let fetch = self
            .authorize(Fetch::get(&self.client, &self.documents_url()))
            .query(Query::to_params(queries));

        fetch.execute::<DocumentList<T>>().await
    }

    /// Fetch a single document by id
    pub async fn get<T: DeserializeOwned>(&self, document_id: &str) -> Result<T, Error> {
        let url = format!("{}/{}", self.documents_url(), document_id);
        let fetch = self.authorize(Fetch::get(&self.client, &url));

        fetch.execute::<T>().await
    }

    /// Create a document with an explicit id
    pub async fn create<T: DeserializeOwned, D: Serialize>(
        &self,
        document_id: &str,
        data: &D,
    ) -> Result<T, Error> {
        let body = json!({
            "documentId": document_id,
            "data": data,
        });
        let fetch = self
            .authorize(Fetch::post(&self.client, &self.documents_url()))
            .json(&body)?;

        fetch.execute::<T>().await
    }

    /// Update fields of a single document
    pub async fn update<T: DeserializeOwned, D: Serialize>(
        &self,
        document_id: &str,
        data: &D,
    ) -> Result<T, Error> {
        let url = format!("{}/{}", self.documents_url(), document_id);
        let body = json!({ "data": data });
        let fetch = self
            .authorize(Fetch::patch(&self.client, &url))
            .json(&body)?;

        fetch.execute::<T>().await
    }

    /// Update fields of every document matching the given queries
    pub async fn update_matching<T: DeserializeOwned, D: Serialize>(
        &self,
        queries: &[Query],
        data: &D,
    ) -> Result<Vec<T>, Error> {
        let body = json!({ "data": data });
        let fetch = self
            .authorize(Fetch::patch(&self.client, &self.documents_url()))
            .query(Query::to_params(queries))
            .json(&body)?;

        let result = fetch.execute::<DocumentList<T>>().await?;
        Ok(result.documents)
    }
}
