//! Session synchronizer: keeps the server-side session cookies converged
//! with the identity provider's current subject.
//!
//! The synchronizer consumes subject-change notifications from a watch
//! channel and drives the issue/revoke endpoints. All writes are serialized
//! by the single `run` loop: a snapshot is fully applied (awaited) before the
//! next one is observed, and bursts are coalesced to the latest value via
//! `borrow_and_update`, so a stale issue can never land after a newer revoke.
//!
//! Only transitions drive network calls. A notification repeating the synced
//! subject (the provider refreshing its token) is a no-op, and a failed write
//! leaves the synced subject untouched so the very next notification retries.

use anyhow::{bail, Context, Result};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tokio::sync::watch;
use tracing::{debug, warn};
use url::Url;

use crate::piscina::guard::{self, RouteClass};
use crate::APP_USER_AGENT;

/// What an identity-change notification carries. The token itself is fetched
/// separately and only held transiently.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub subject: String,
    pub email: String,
}

/// Source of fresh identity tokens for the current subject.
pub trait TokenSource: Send + Sync {
    fn fresh_token(
        &self,
        subject: &str,
    ) -> impl std::future::Future<Output = Result<SecretString>> + Send;
}

/// The session cookie store's issue/revoke endpoints.
pub trait SessionEndpoints: Send + Sync {
    fn issue(
        &self,
        token: &SecretString,
        email: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn revoke(&self) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Client-side location access, for the sign-out redirect.
pub trait Navigation: Send + Sync {
    fn current_path(&self) -> String;
    fn goto(&self, path: &str);
}

/// Embedders without a navigable surface.
#[derive(Clone, Debug)]
pub struct NoopNavigation;

impl Navigation for NoopNavigation {
    fn current_path(&self) -> String {
        "/".to_string()
    }

    fn goto(&self, _path: &str) {}
}

pub struct SessionSynchronizer<T, E, N> {
    tokens: T,
    endpoints: E,
    navigation: N,
    /// Subject last successfully written to the cookie store.
    synced: Option<String>,
}

impl<T, E, N> SessionSynchronizer<T, E, N>
where
    T: TokenSource,
    E: SessionEndpoints,
    N: Navigation,
{
    #[must_use]
    pub fn new(tokens: T, endpoints: E, navigation: N) -> Self {
        Self {
            tokens,
            endpoints,
            navigation,
            synced: None,
        }
    }

    /// Consume identity notifications until the sender goes away.
    pub async fn run(mut self, mut identity: watch::Receiver<Option<Identity>>) {
        while identity.changed().await.is_ok() {
            // Latest snapshot only; intermediate values are superseded.
            let snapshot = identity.borrow_and_update().clone();
            self.apply(snapshot).await;
        }
    }

    async fn apply(&mut self, snapshot: Option<Identity>) {
        match snapshot {
            Some(identity) => {
                if self.synced.as_deref() == Some(identity.subject.as_str()) {
                    debug!(
                        subject = %identity.subject,
                        "token refresh with unchanged subject, no cookie write"
                    );
                    return;
                }

                let token = match self.tokens.fresh_token(&identity.subject).await {
                    Ok(token) => token,
                    Err(err) => {
                        warn!("failed to fetch a fresh identity token: {err:#}");
                        return;
                    }
                };

                match self.endpoints.issue(&token, &identity.email).await {
                    Ok(()) => {
                        debug!(subject = %identity.subject, "session cookie issued");
                        self.synced = Some(identity.subject);
                    }
                    Err(err) => {
                        warn!("session issue failed, converging on the next notification: {err:#}");
                    }
                }
            }
            None => {
                if self.synced.is_none() {
                    return;
                }

                match self.endpoints.revoke().await {
                    Ok(()) => {
                        debug!("session cookie revoked");
                        self.synced = None;
                    }
                    Err(err) => {
                        warn!(
                            "session revoke failed, converging on the next notification: {err:#}"
                        );
                    }
                }

                // The identity is gone client-side either way; leave any
                // protected page.
                if guard::classify(&self.navigation.current_path()) == RouteClass::Protected {
                    self.navigation.goto(guard::LOGIN_PATH);
                }
            }
        }
    }
}

/// HTTP client for the gateway's session endpoints.
pub struct HttpSessionEndpoints {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpSessionEndpoints {
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(base_url: Url) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .build()
            .context("Error creating reqwest client")?;

        Ok(Self { client, base_url })
    }
}

impl SessionEndpoints for HttpSessionEndpoints {
    async fn issue(&self, token: &SecretString, email: &str) -> Result<()> {
        let url = self.base_url.join("/auth/session/issue")?;
        let response = self
            .client
            .post(url)
            .json(&json!({ "token": token.expose_secret(), "email": email }))
            .send()
            .await?;

        if !response.status().is_success() {
            bail!("session issue failed: {}", response.status());
        }
        Ok(())
    }

    async fn revoke(&self) -> Result<()> {
        let url = self.base_url.join("/auth/session/revoke")?;
        let response = self.client.post(url).send().await?;

        if !response.status().is_success() {
            bail!("session revoke failed: {}", response.status());
        }
        Ok(())
    }
}
