//! Configuration options for the duochat client

use std::time::Duration;

use crate::error::Error;

/// Configuration options for the duochat client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// The database identifier on the remote store
    pub database_id: String,

    /// The users collection identifier
    pub users_collection: String,

    /// The messages collection identifier
    pub messages_collection: String,

    /// The request timeout
    pub request_timeout: Option<Duration>,

    /// Maximum number of recent messages scanned when building the
    /// last-message-per-peer index
    pub last_message_scan_cap: u32,

    /// Page size used by the directory page cursor
    pub directory_page_size: u32,

    /// Delay applied to search input before a remote query fires
    pub search_debounce: Duration,

    /// How long the provisioning surface waits before sending a failed
    /// first login back to the entry surface
    pub provision_retry_delay: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            database_id: "default".to_string(),
            users_collection: "users".to_string(),
            messages_collection: "messages".to_string(),
            request_timeout: Some(Duration::from_secs(30)),
            last_message_scan_cap: 100,
            directory_page_size: 25,
            search_debounce: Duration::from_millis(300),
            provision_retry_delay: Duration::from_secs(3),
        }
    }
}

impl ClientOptions {
    /// Set the database identifier
    pub fn with_database_id(mut self, value: &str) -> Self {
        self.database_id = value.to_string();
        self
    }

    /// Set the users collection identifier
    pub fn with_users_collection(mut self, value: &str) -> Self {
        self.users_collection = value.to_string();
        self
    }

    /// Set the messages collection identifier
    pub fn with_messages_collection(mut self, value: &str) -> Self {
        self.messages_collection = value.to_string();
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the last-message scan cap
    pub fn with_last_message_scan_cap(mut self, value: u32) -> Self {
        self.last_message_scan_cap = value;
        self
    }

    /// Set the directory page size
    pub fn with_directory_page_size(mut self, value: u32) -> Self {
        self.directory_page_size = value;
        self
    }

    /// Set the search debounce delay
    pub fn with_search_debounce(mut self, value: Duration) -> Self {
        self.search_debounce = value;
        self
    }

    /// Set the provisioning retry delay
    pub fn with_provision_retry_delay(mut self, value: Duration) -> Self {
        self.provision_retry_delay = value;
        self
    }
}

/// Connection settings for the remote store, typically loaded from the
/// environment
#[derive(Debug, Clone)]
pub struct Credentials {
    /// The base URL for the remote store
    pub url: String,
    /// The project API key
    pub api_key: String,
}

impl Credentials {
    /// Create new credentials, rejecting an empty key
    pub fn new(url: &str, api_key: &str) -> Result<Self, Error> {
        url::Url::parse(url)?;
        if api_key.is_empty() {
            return Err(Error::config("api_key cannot be empty"));
        }
        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Attempt to create credentials from `DUOCHAT_URL` and `DUOCHAT_KEY`
    pub fn from_env() -> Result<Self, Error> {
        let url = std::env::var("DUOCHAT_URL")
            .map_err(|_| Error::config("DUOCHAT_URL environment variable not found"))?;
        let api_key = std::env::var("DUOCHAT_KEY")
            .map_err(|_| Error::config("DUOCHAT_KEY environment variable not found"))?;
        Self::new(&url, &api_key)
    }
}
