//! Gateway configuration and shared request state.

use std::time::Duration;

use crate::piscina::policy::AllowList;

const DEFAULT_TOKEN_COOKIE_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;
const DEFAULT_EMAIL_COOKIE_TTL_SECONDS: i64 = 24 * 60 * 60;
const DEFAULT_HANDLER_BUDGET_MS: u64 = 9500;

#[derive(Clone, Debug)]
pub struct GatewayConfig {
    frontend_base_url: String,
    token_cookie_ttl_seconds: i64,
    email_cookie_ttl_seconds: i64,
    handler_budget_ms: u64,
    dev_mode: bool,
}

impl GatewayConfig {
    #[must_use]
    pub fn new(frontend_base_url: String) -> Self {
        Self {
            frontend_base_url,
            token_cookie_ttl_seconds: DEFAULT_TOKEN_COOKIE_TTL_SECONDS,
            email_cookie_ttl_seconds: DEFAULT_EMAIL_COOKIE_TTL_SECONDS,
            handler_budget_ms: DEFAULT_HANDLER_BUDGET_MS,
            dev_mode: false,
        }
    }

    #[must_use]
    pub fn with_token_cookie_ttl_seconds(mut self, seconds: i64) -> Self {
        self.token_cookie_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_email_cookie_ttl_seconds(mut self, seconds: i64) -> Self {
        self.email_cookie_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_handler_budget_ms(mut self, millis: u64) -> Self {
        self.handler_budget_ms = millis;
        self
    }

    #[must_use]
    pub fn with_dev_mode(mut self, dev_mode: bool) -> Self {
        self.dev_mode = dev_mode;
        self
    }

    pub(crate) fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    pub(crate) fn token_cookie_ttl_seconds(&self) -> i64 {
        self.token_cookie_ttl_seconds
    }

    pub(crate) fn email_cookie_ttl_seconds(&self) -> i64 {
        self.email_cookie_ttl_seconds
    }

    #[must_use]
    pub fn handler_budget(&self) -> Duration {
        Duration::from_millis(self.handler_budget_ms)
    }

    #[must_use]
    pub fn dev_mode(&self) -> bool {
        self.dev_mode
    }

    // Only mark cookies secure when the frontend is served over HTTPS.
    pub(crate) fn session_cookie_secure(&self) -> bool {
        self.frontend_base_url.starts_with("https://")
    }
}

pub struct GatewayState {
    config: GatewayConfig,
    allow_list: AllowList,
}

impl GatewayState {
    #[must_use]
    pub fn new(config: GatewayConfig, allow_list: AllowList) -> Self {
        Self { config, allow_list }
    }

    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    #[must_use]
    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }
}
