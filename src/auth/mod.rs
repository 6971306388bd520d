//! Authentication boundary: session storage and the account endpoint
//!
//! The OAuth flow itself belongs to the external identity provider; this
//! module only holds the session it issued and reads the current identity
//! from it.

mod session;
mod types;

use std::sync::{Arc, Mutex};

use reqwest::Client;

use crate::error::Error;
use crate::fetch::Fetch;

pub use session::Session;
pub use types::Identity;

/// Client for the account endpoint of the remote store
#[derive(Clone)]
pub struct Account {
    /// The base URL for the remote store
    url: String,

    /// The project API key
    key: String,

    /// HTTP client used for requests
    client: Client,

    /// The current session
    session: Arc<Mutex<Option<Session>>>,
}

impl Account {
    /// Create a new Account client
    pub(crate) fn new(
        url: &str,
        key: &str,
        client: Client,
        session: Arc<Mutex<Option<Session>>>,
    ) -> Self {
        Self {
            url: url.to_string(),
            key: key.to_string(),
            client,
            session,
        }
    }

    fn account_url(&self, path: &str) -> String {
        format!("{}/v1/account{}", self.url, path)
    }

    fn require_token(&self) -> Result<String, Error> {
        let session = self.session.lock().unwrap();
        match session.as_ref() {
            Some(s) if !s.is_expired() => Ok(s.access_token.clone()),
            Some(_) => Err(Error::unauthenticated("session expired")),
            None => Err(Error::unauthenticated("no session")),
        }
    }

    /// Get the identity for the current session
    pub async fn get(&self) -> Result<Identity, Error> {
        let token = self.require_token()?;

        let identity = Fetch::get(&self.client, &self.account_url(""))
            .header("apikey", &self.key)
            .bearer_auth(&token)
            .execute::<Identity>()
            .await?;

        Ok(identity)
    }

    /// Sign out the current session, locally and on the remote store
    pub async fn sign_out(&self) -> Result<(), Error> {
        let token = self.require_token()?;

        Fetch::delete(&self.client, &self.account_url("/sessions/current"))
            .header("apikey", &self.key)
            .bearer_auth(&token)
            .execute_raw()
            .await?;

        let mut session = self.session.lock().unwrap();
        *session = None;

        Ok(())
    }

    /// Get the current session
    pub fn get_session(&self) -> Option<Session> {
        let session = self.session.lock().unwrap();
        session.clone()
    }

    /// Set the session
    pub fn set_session(&self, session: Session) {
        let mut current = self.session.lock().unwrap();
        *current = Some(session);
    }

    /// Whether a live (present, unexpired) session is held
    pub fn is_authenticated(&self) -> bool {
        let session = self.session.lock().unwrap();
        matches!(session.as_ref(), Some(s) if !s.is_expired())
    }
}
