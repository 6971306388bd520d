//! Entry surfaces: login, provisioning, and the gated conversation view

use std::time::Duration;

use tracing::warn;

use crate::directory::UserRecord;
use crate::error::Error;
use crate::Duochat;

/// The user-facing surface to present next
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    /// No valid session; show the entry/login surface
    Login,
    /// Authenticated but no directory record yet; run provisioning
    Provision,
    /// Authenticated and provisioned; show the conversation view
    Chat,
}

/// Result of the one-time provisioning step
#[derive(Debug)]
pub enum ProvisionOutcome {
    /// Record created; continue to the conversation view
    Chat(UserRecord),
    /// Provisioning failed; return to the login surface after the delay
    BackToLogin {
        /// How long the provisioning surface lingers before redirecting
        retry_after: Duration,
    },
}

/// Decide which surface to show for the current session state.
/// Unauthenticated resolves to [`Route::Login`]; a missing directory
/// record resolves to [`Route::Provision`]; other failures propagate.
pub async fn resolve_entry(client: &Duochat) -> Result<Route, Error> {
    if !client.account().is_authenticated() {
        return Ok(Route::Login);
    }

    let identity = match client.account().get().await {
        Ok(identity) => identity,
        Err(Error::Unauthenticated(_)) => return Ok(Route::Login),
        Err(err) => return Err(err),
    };

    match client.directory().get_by_id(&identity.id).await {
        Ok(_) => Ok(Route::Chat),
        Err(Error::NotFound(_)) => Ok(Route::Provision),
        Err(err) => Err(err),
    }
}

/// Create the directory record for the current identity. On failure the
/// flow is fatal: the caller redirects back to login after `retry_after`.
pub async fn provision_identity(client: &Duochat, provider: &str) -> ProvisionOutcome {
    let result = async {
        let identity = client.account().get().await?;
        client.directory().provision(&identity, provider).await
    }
    .await;

    match result {
        Ok(record) => ProvisionOutcome::Chat(record),
        Err(err) => {
            warn!(%err, "provisioning failed, returning to login");
            ProvisionOutcome::BackToLogin {
                retry_after: client.options.provision_retry_delay,
            }
        }
    }
}
