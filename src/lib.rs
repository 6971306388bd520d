//! duochat client library
//!
//! A Rust client for a two-party messaging service backed by a hosted
//! document store: a directory of registered users, directional message
//! records, and an event-driven conversation view on top of both.

pub mod auth;
pub mod config;
pub mod directory;
pub mod error;
pub mod fetch;
pub mod flow;
pub mod messages;
pub mod store;
pub mod view;

use std::sync::{Arc, Mutex};

use reqwest::Client;

use crate::auth::{Account, Session};
use crate::config::{ClientOptions, Credentials};
use crate::directory::DirectoryClient;
use crate::error::Error;
use crate::messages::MessageClient;
use crate::store::CollectionClient;
use crate::view::ConversationView;

/// The main entry point for the duochat client
pub struct Duochat {
    /// The base URL for the remote store
    pub url: String,
    /// The project API key
    pub key: String,
    /// HTTP client used for requests
    pub http_client: Client,
    /// Client options
    pub options: ClientOptions,
    /// Account client for the authentication boundary
    account: Account,
    /// The current session, shared across all service clients
    session: Arc<Mutex<Option<Session>>>,
}

impl Duochat {
    /// Create a new duochat client with default options
    ///
    /// # Example
    ///
    /// ```
    /// use duochat::Duochat;
    ///
    /// let client = Duochat::new("https://store.example.com", "anon-key");
    /// ```
    pub fn new(url: &str, key: &str) -> Self {
        Self::new_with_options(url, key, ClientOptions::default())
    }

    /// Create a new duochat client with custom options
    pub fn new_with_options(url: &str, key: &str, options: ClientOptions) -> Self {
        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build().unwrap_or_default();

        let session = Arc::new(Mutex::new(None));
        let account = Account::new(url, key, http_client.clone(), session.clone());

        Self {
            url: url.trim_end_matches('/').to_string(),
            key: key.to_string(),
            http_client,
            options,
            account,
            session,
        }
    }

    /// Create a client from `DUOCHAT_URL` and `DUOCHAT_KEY`
    pub fn from_env() -> Result<Self, Error> {
        let creds = Credentials::from_env()?;
        Ok(Self::new(&creds.url, &creds.api_key))
    }

    /// Get a reference to the account client
    pub fn account(&self) -> &Account {
        &self.account
    }

    /// Create a client for an arbitrary collection of the configured database
    pub fn collection(&self, collection_id: &str) -> CollectionClient {
        CollectionClient::new(
            &self.url,
            &self.key,
            &self.options.database_id,
            collection_id,
            self.http_client.clone(),
            self.session.clone(),
        )
    }

    /// Create a directory client over the users collection
    pub fn directory(&self) -> DirectoryClient {
        DirectoryClient::new(
            self.collection(&self.options.users_collection),
            self.options.directory_page_size,
        )
    }

    /// Create a message client over the messages collection
    pub fn messages(&self) -> MessageClient {
        MessageClient::new(
            self.collection(&self.options.messages_collection),
            self.options.last_message_scan_cap,
        )
    }

    /// Create a conversation view bound to this client
    pub fn conversation_view(&self) -> ConversationView {
        ConversationView::new(
            self.account.clone(),
            self.directory(),
            self.messages(),
            self.options.search_debounce,
        )
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::config::ClientOptions;
    pub use crate::error::Error;
    pub use crate::Duochat;
}
