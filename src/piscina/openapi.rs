//! OpenAPI document for the gateway's documented endpoints.
//!
//! Page routes are deliberately undocumented; only the health and session
//! endpoints are part of the API surface.

use utoipa::OpenApi;

use crate::piscina::handlers::{health, session};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "piscina",
        description = "Pool service management - authentication and session gateway"
    ),
    paths(health::health, session::issue, session::revoke),
    components(schemas(session::IssueRequest, session::ErrorResponse)),
    tags(
        (name = "session", description = "Session cookie store endpoints"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_names_the_session_endpoints() {
        let doc = ApiDoc::openapi();
        let paths: Vec<_> = doc.paths.paths.keys().cloned().collect();

        assert!(paths.contains(&"/auth/session/issue".to_string()));
        assert!(paths.contains(&"/auth/session/revoke".to_string()));
        assert!(paths.contains(&"/health".to_string()));
    }
}
