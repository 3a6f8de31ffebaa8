//! AppGallery Connect publishing API
//!
//! The publishing workflow is five calls against the Connect API:
//!
//! 1. [`authenticate`]: client credentials for a bearer token
//! 2. [`request_upload_session`]: one-time upload URL and auth code
//! 3. [`upload_artifact`]: multipart upload, returns the storage URL
//! 4. [`attach_file`]: registers the storage URL on the app
//! 5. [`submit`]: sends the app to review
//!
//! The functions are sequenced by [`crate::pipeline::Pipeline`].
//!
//! ## Usage
//!
//! ```ignore
//! use gallery_connect::appgallery;
//!
//! let token = appgallery::authenticate(&transport, client_id, secret, &retry).await?;
//! let session = appgallery::request_upload_session(&transport, &token, app_id, "apk", &retry).await?;
//! ```

mod app;
mod credentials;
mod upload;

pub use app::{attach_file, submit};
pub use credentials::authenticate;
pub use upload::{extract_storage_reference, request_upload_session, upload_artifact};

/// Token endpoint
pub const TOKEN_PATH: &str = "/api/oauth2/v1/token";

/// Upload URL endpoint
pub const UPLOAD_URL_PATH: &str = "/api/publish/v2/upload-url";

/// App file info endpoint
pub const FILE_INFO_PATH: &str = "/api/publish/v2/app-file-info";

/// App submission endpoint
pub const SUBMIT_PATH: &str = "/api/publish/v2/app-submit";
