//! App file registration and review submission

use tracing::{info, instrument};

use super::{FILE_INFO_PATH, SUBMIT_PATH};
use crate::error::{ConnectError, Result};
use crate::retry::RetryPolicy;
use crate::transport::HttpTransport;
use crate::types::{AccessToken, ArtifactProfile, PipelineStep, StorageReference};

/// Register an uploaded file against the app
#[instrument(skip(transport, token, profile, retry))]
pub async fn attach_file(
    transport: &HttpTransport,
    token: &AccessToken,
    app_id: &str,
    storage: &StorageReference,
    profile: &ArtifactProfile,
    retry: &RetryPolicy,
) -> Result<()> {
    let body = profile.manifest_update(storage);
    let body = &body;
    let query = [("appId", app_id)];
    let query = &query;

    retry
        .run(PipelineStep::Attach, move || async move {
            Ok(transport.put_json(FILE_INFO_PATH, query, body, Some(token)).await?)
        })
        .await
        .map_err(|e| match e {
            ConnectError::Transport(e) => ConnectError::Attach(e.to_string()),
            other => other,
        })?;

    info!(file_name = %profile.file_name, "File attached to app");
    Ok(())
}

/// Submit the app for review
///
/// Sent exactly once: resubmission semantics belong to the platform.
#[instrument(skip(transport, token))]
pub async fn submit(transport: &HttpTransport, token: &AccessToken, app_id: &str) -> Result<()> {
    transport
        .post_empty(SUBMIT_PATH, &[("appId", app_id)], Some(token))
        .await
        .map_err(|e| ConnectError::Submission(e.to_string()))?;

    info!("App submitted for review");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ClientOptions;
    use mockito::{Matcher, Server};

    fn transport(server: &Server) -> HttpTransport {
        HttpTransport::new(&ClientOptions::default().with_base_url(server.url()), "cid").unwrap()
    }

    #[tokio::test]
    async fn test_attach_sends_manifest() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", FILE_INFO_PATH)
            .match_query(Matcher::UrlEncoded("appId".into(), "1234".into()))
            .match_header("authorization", "Bearer tok")
            .match_body(Matcher::Json(serde_json::json!({
                "fileType": "5",
                "files": {"fileName": "app.apk", "fileDestUrl": "https://cdn.example/x.apk"}
            })))
            .with_status(200)
            .with_body(r#"{"ret":{"code":0,"msg":"success"}}"#)
            .create_async()
            .await;

        attach_file(
            &transport(&server),
            &AccessToken::new("tok"),
            "1234",
            &StorageReference::new("https://cdn.example/x.apk"),
            &ArtifactProfile::default(),
            &RetryPolicy::none(),
        )
        .await
        .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_attach_uses_custom_profile() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", FILE_INFO_PATH)
            .match_query(Matcher::Any)
            .match_body(Matcher::PartialJson(serde_json::json!({
                "fileType": "3",
                "files": {"fileName": "bundle.aab"}
            })))
            .with_status(200)
            .create_async()
            .await;

        let profile = ArtifactProfile {
            file_type: "3".to_string(),
            file_name: "bundle.aab".to_string(),
            mime_type: "application/octet-stream".to_string(),
        };
        attach_file(
            &transport(&server),
            &AccessToken::new("tok"),
            "1234",
            &StorageReference::new("https://cdn.example/x.aab"),
            &profile,
            &RetryPolicy::none(),
        )
        .await
        .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_attach_api_error_is_attach_error() {
        let mut server = Server::new_async().await;
        server
            .mock("PUT", FILE_INFO_PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"ret":{"code":204144641,"msg":"file not found"}}"#)
            .create_async()
            .await;

        let err = attach_file(
            &transport(&server),
            &AccessToken::new("tok"),
            "1234",
            &StorageReference::new("https://cdn.example/x.apk"),
            &ArtifactProfile::default(),
            &RetryPolicy::none(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ConnectError::Attach(ref m) if m.contains("file not found")));
    }

    #[tokio::test]
    async fn test_submit_is_never_retried() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", SUBMIT_PATH)
            .match_query(Matcher::UrlEncoded("appId".into(), "1234".into()))
            .with_status(503)
            .with_body("unavailable")
            .expect(1)
            .create_async()
            .await;

        let err = submit(&transport(&server), &AccessToken::new("tok"), "1234")
            .await
            .unwrap_err();

        assert!(matches!(err, ConnectError::Submission(ref m) if m.contains("503")));
        mock.assert_async().await;
    }
}
