//! Client credentials token exchange

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::TOKEN_PATH;
use crate::error::{ConnectError, Result};
use crate::retry::RetryPolicy;
use crate::transport::HttpTransport;
use crate::types::{AccessToken, PipelineStep};

#[derive(Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
}

/// Exchange the client id and secret for a bearer token
#[instrument(skip_all, fields(client_id = %client_id))]
pub async fn authenticate(
    transport: &HttpTransport,
    client_id: &str,
    client_secret: &str,
    retry: &RetryPolicy,
) -> Result<AccessToken> {
    let body = TokenRequest {
        client_id,
        client_secret,
        grant_type: "client_credentials",
    };
    let body = &body;

    let value = retry
        .run(PipelineStep::Authenticate, move || async move {
            Ok(transport.post_json(TOKEN_PATH, &[], body, None).await?)
        })
        .await
        .map_err(|e| match e {
            ConnectError::Transport(e) => ConnectError::Auth(e.to_string()),
            other => other,
        })?;

    let response: TokenResponse = serde_json::from_value(value)
        .map_err(|e| ConnectError::Auth(format!("unexpected token response: {}", e)))?;

    match response.access_token {
        Some(token) if !token.is_empty() => {
            if let Some(expires_in) = response.expires_in {
                debug!(expires_in, "token issued");
            }
            info!("Authenticated");
            Ok(AccessToken::new(token))
        }
        _ => Err(ConnectError::Auth(
            "token response did not contain access_token".to_string(),
        )),
    }
}
