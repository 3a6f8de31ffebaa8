//! Upload session negotiation and artifact transfer

use std::io;
use std::path::Path;

use reqwest::multipart::{Form, Part};
use reqwest::Body;
use serde::Deserialize;
use serde_json::Value;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, instrument};

use super::UPLOAD_URL_PATH;
use crate::error::{ConnectError, Result};
use crate::retry::RetryPolicy;
use crate::transport::HttpTransport;
use crate::types::{AccessToken, ArtifactProfile, PipelineStep, StorageReference, UploadSession};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadUrlResponse {
    upload_url: Option<String>,
    auth_code: Option<String>,
}

// Upload response: result.UploadFileRsp.fileInfoList[0].fileDestUrl

#[derive(Debug, Deserialize)]
struct UploadResponse {
    result: Option<UploadResult>,
}

#[derive(Debug, Deserialize)]
struct UploadResult {
    #[serde(rename = "UploadFileRsp")]
    upload_file_rsp: Option<UploadFileRsp>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadFileRsp {
    file_info_list: Option<Vec<FileInfo>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileInfo {
    /// Older responses spell this field `fileDestUlr`
    #[serde(alias = "fileDestUlr")]
    file_dest_url: Option<String>,
}

/// Request a one-time upload URL for the app
#[instrument(skip(transport, token, retry))]
pub async fn request_upload_session(
    transport: &HttpTransport,
    token: &AccessToken,
    app_id: &str,
    suffix: &str,
    retry: &RetryPolicy,
) -> Result<UploadSession> {
    let query = [("appId", app_id), ("suffix", suffix)];
    let query = &query;

    let value = retry
        .run(PipelineStep::Negotiate, move || async move {
            Ok(transport.get(UPLOAD_URL_PATH, query, Some(token)).await?)
        })
        .await?;

    let response: UploadUrlResponse = serde_json::from_value(value)
        .map_err(|e| ConnectError::Negotiation(format!("unexpected upload URL response: {}", e)))?;

    let upload_url = non_empty(response.upload_url)
        .ok_or_else(|| ConnectError::Negotiation("response has no uploadUrl".to_string()))?;
    let auth_code = non_empty(response.auth_code)
        .ok_or_else(|| ConnectError::Negotiation("response has no authCode".to_string()))?;

    debug!(upload_url = %upload_url, "upload session negotiated");
    Ok(UploadSession {
        upload_url,
        auth_code,
    })
}

/// Upload the artifact to the negotiated destination
///
/// The session is consumed. The artifact is opened before any request is
/// made and streamed from the open handle, which is released when the
/// request completes or is dropped.
#[instrument(skip(transport, session, token, profile), fields(path = %path.display()))]
pub async fn upload_artifact(
    transport: &HttpTransport,
    session: UploadSession,
    token: &AccessToken,
    path: &Path,
    profile: &ArtifactProfile,
) -> Result<StorageReference> {
    let not_found = |source: io::Error| ConnectError::ArtifactNotFound {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).await.map_err(not_found)?;
    let metadata = file.metadata().await.map_err(not_found)?;
    if !metadata.is_file() {
        return Err(not_found(io::Error::new(
            io::ErrorKind::InvalidInput,
            "not a regular file",
        )));
    }

    let size = metadata.len();
    let part = Part::stream_with_length(Body::wrap_stream(ReaderStream::new(file)), size)
        .mime_str(&profile.mime_type)
        .map_err(|e| {
            ConnectError::Configuration(format!("invalid MIME type '{}': {}", profile.mime_type, e))
        })?;

    let form = Form::new()
        .part("file", part)
        .text("authCode", session.auth_code)
        .text("fileCount", "1")
        .text("parseType", "1");

    info!(size, "Uploading {}", path.display());
    let value = transport
        .post_multipart(&session.upload_url, form, Some(token))
        .await?;

    let storage = extract_storage_reference(value)?;
    info!(file_dest_url = %storage, "Upload complete");
    Ok(storage)
}

/// Pull `result.UploadFileRsp.fileInfoList[0].fileDestUrl` out of an upload response
pub fn extract_storage_reference(value: Value) -> Result<StorageReference> {
    let shape = |message: &str| ConnectError::UploadResponseShape(message.to_string());

    let response: UploadResponse = serde_json::from_value(value)
        .map_err(|e| ConnectError::UploadResponseShape(format!("malformed response: {}", e)))?;

    let file_info = response
        .result
        .ok_or_else(|| shape("response has no result"))?
        .upload_file_rsp
        .ok_or_else(|| shape("response has no result.UploadFileRsp"))?
        .file_info_list
        .ok_or_else(|| shape("response has no result.UploadFileRsp.fileInfoList"))?
        .into_iter()
        .next()
        .ok_or_else(|| shape("result.UploadFileRsp.fileInfoList is empty"))?;

    non_empty(file_info.file_dest_url)
        .map(StorageReference::new)
        .ok_or_else(|| shape("fileInfoList[0] has no fileDestUrl"))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
