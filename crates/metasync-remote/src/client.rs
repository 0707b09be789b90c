//! Shared reqwest plumbing

use reqwest::{Client, RequestBuilder, StatusCode};

use metasync_core::{Credential, Error, Result};

const USER_AGENT: &str = concat!("metasync/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client shared by fetchers and the importer.
///
/// Timeouts are set per request from each system's descriptor.
pub fn http_client() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| Error::invalid_config(format!("Failed to build HTTP client: {e}")))
}

/// Attach a credential to a request.
pub fn authorize(builder: RequestBuilder, credential: &Credential) -> RequestBuilder {
    match credential {
        Credential::None => builder,
        Credential::Token(token) => builder.header("Authorization", format!("Token {token}")),
        Credential::Basic { username, password } => builder.basic_auth(username, Some(password)),
    }
}

/// Gateway statuses that mean the registry is unreachable, not that it
/// refused a record.
pub fn is_gateway_failure(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
    )
}

/// Response body for error reporting.
pub async fn error_body(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "<no body>".to_string())
}
