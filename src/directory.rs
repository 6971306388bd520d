//! Directory client: the set of registered user records

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::Identity;
use crate::error::Error;
use crate::store::{CollectionClient, Query};

/// A registered user record in the directory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// The document id; equals the identity id for provisioned records
    #[serde(rename = "$id")]
    pub id: String,

    /// The identity id
    pub user_id: String,

    /// The user's email address
    #[serde(default)]
    pub email: Option<String>,

    /// The user's display name
    #[serde(default)]
    pub name: Option<String>,

    /// When the record was provisioned
    pub registration_date: DateTime<Utc>,

    /// Set once at provisioning, not refreshed on later logins
    pub last_login: DateTime<Utc>,

    /// The auth provider tag
    pub provider: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewUserRecord<'a> {
    user_id: &'a str,
    email: Option<&'a str>,
    name: Option<&'a str>,
    registration_date: DateTime<Utc>,
    last_login: DateTime<Utc>,
    provider: &'a str,
}

/// Client for the users collection
#[derive(Clone)]
pub struct DirectoryClient {
    collection: CollectionClient,
    page_size: u32,
}

impl DirectoryClient {
    /// Create a new DirectoryClient
    pub(crate) fn new(collection: CollectionClient, page_size: u32) -> Self {
        Self {
            collection,
            page_size,
        }
    }

    /// Fetch every user record, page by page, deduplicated by identity id
    pub async fn list(&self) -> Result<Vec<UserRecord>, Error> {
        let mut pages = self.pages(self.page_size);
        let mut records = Vec::new();
        while let Some(page) = pages.next_page().await? {
            records.extend(page);
        }
        Ok(dedup_by_user_id(records))
    }

    /// A lazy, restartable page cursor over the directory
    pub fn pages(&self, page_size: u32) -> UserPages {
        UserPages {
            collection: self.collection.clone(),
            page_size: page_size.max(1),
            offset: 0,
            done: false,
        }
    }

    /// Fetch one record by identity id
    pub async fn get_by_id(&self, user_id: &str) -> Result<UserRecord, Error> {
        self.collection.get::<UserRecord>(user_id).await
    }

    /// Remote search across name and email. The empty term is not valid
    /// input; callers route empty queries to [`list`](Self::list) instead.
    pub async fn search(&self, term: &str) -> Result<Vec<UserRecord>, Error> {
        if term.trim().is_empty() {
            return Err(Error::invalid_input("search term must not be empty"));
        }

        let queries = [Query::or(vec![
            Query::search("name", term),
            Query::search("email", term),
        ])];
        let result = self.collection.list::<UserRecord>(&queries).await?;
        Ok(dedup_by_user_id(result.documents))
    }

    /// Create the directory record for a freshly authenticated identity.
    /// The identity id doubles as the document id, so the store rejects a
    /// second record for the same identity.
    pub async fn provision(
        &self,
        identity: &Identity,
        provider: &str,
    ) -> Result<UserRecord, Error> {
        let now = Utc::now();
        let record = NewUserRecord {
            user_id: &identity.id,
            email: identity.email.as_deref(),
            name: identity.name.as_deref(),
            registration_date: now,
            last_login: now,
            provider,
        };

        debug!(user_id = %identity.id, provider, "provisioning directory record");
        self.collection.create::<UserRecord, _>(&identity.id, &record).await
    }
}

/// Lazy page cursor over the users collection
pub struct UserPages {
    collection: CollectionClient,
    page_size: u32,
    offset: u32,
    done: bool,
}

impl UserPages {
    /// Fetch the next page, or `None` when the directory is exhausted
    pub async fn next_page(&mut self) -> Result<Option<Vec<UserRecord>>, Error> {
        if self.done {
            return Ok(None);
        }

        let queries = [Query::limit(self.page_size), Query::offset(self.offset)];
        let page = self.collection.list::<UserRecord>(&queries).await?;

        let fetched = page.documents.len() as u32;
        self.offset += fetched;
        if fetched < self.page_size || u64::from(self.offset) >= page.total {
            self.done = true;
        }

        if page.documents.is_empty() {
            Ok(None)
        } else {
            Ok(Some(page.documents))
        }
    }

    /// Restart the cursor from the first page
    pub fn rewind(&mut self) {
        self.offset = 0;
        self.done = false;
    }
}

/// Keep the first record seen for each identity id, preserving order
pub(crate) fn dedup_by_user_id(records: Vec<UserRecord>) -> Vec<UserRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(record.user_id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(doc_id: &str, user_id: &str) -> UserRecord {
        UserRecord {
            id: doc_id.to_string(),
            user_id: user_id.to_string(),
            email: None,
            name: None,
            registration_date: Utc::now(),
            last_login: Utc::now(),
            provider: "github".to_string(),
        }
    }

    #[test]
    fn dedup_keeps_first_occurrence_in_order() {
        let records = vec![
            record("a", "u1"),
            record("b", "u2"),
            record("c", "u1"),
            record("d", "u3"),
        ];
        let deduped = dedup_by_user_id(records);
        let ids: Vec<_> = deduped.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "d"]);
    }

    #[test]
    fn user_record_round_trips_store_field_names() {
        let json = serde_json::json!({
            "$id": "u1",
            "userId": "u1",
            "email": "a@example.com",
            "name": "Ada",
            "registrationDate": "2026-01-02T03:04:05Z",
            "lastLogin": "2026-01-02T03:04:05Z",
            "provider": "github",
        });
        let record: UserRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.id, "u1");
        assert_eq!(record.user_id, "u1");
        assert_eq!(record.email.as_deref(), Some("a@example.com"));
    }
}
