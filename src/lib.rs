//! # Piscina (Authentication & Session Gateway)
//!
//! `piscina` is the auth front door of a pool-service management product
//! (client records, visit logs, subscriptions). It keeps a server-observable
//! session cookie in step with the client-held identity token, gates page
//! routes through a pure per-request guard, enforces an allow-list
//! authorization policy, and wraps privileged handlers in a timeout and
//! resource budget.
//!
//! ## Session model
//!
//! Two cookies carry the session: `session-token` (`HttpOnly`, proof of
//! identity for server-verified calls) and `session-email` (readable by the
//! client, used only as a fast-path allow-list hint). Both are written and
//! cleared exclusively by the `/auth/session/issue` and `/auth/session/revoke`
//! endpoints, which the [`piscina::sync::SessionSynchronizer`] calls whenever
//! the identity provider reports a subject change.
//!
//! ## Authorization
//!
//! Authorization is explicit allow-list membership, independent of
//! authentication validity. Roles (`admin`, `tester`, `user`) are orthogonal
//! metadata; an email absent from the list is always unauthorized. The guard
//! trusts the email cookie only as a hint: handlers that need strong identity
//! verify the token against the identity provider themselves.

pub mod cli;
pub mod piscina;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
