//! AppGallery Connect publishing pipeline for Gallery
//!
//! This crate uploads a built Android artifact to AppGallery Connect and
//! submits the app for review.
//!
//! ## Steps
//!
//! - **Authenticate**: exchange client credentials for a bearer token
//! - **Negotiate**: obtain a one-time upload URL and auth code
//! - **Upload**: stream the artifact as a multipart request
//! - **Attach**: register the stored file on the app
//! - **Submit**: send the app to review
//!
//! Steps run strictly in order and the first failure stops the run. Token
//! exchange, negotiation and attach are retried on transient errors; upload
//! and submit are sent once.
//!
//! ## Usage
//!
//! ```ignore
//! use gallery_connect::{ClientOptions, Pipeline, PublishRequest};
//!
//! let request = PublishRequest::new("app-release.apk", client_id, secret, app_id, "apk");
//! let outcome = Pipeline::new(request, &ClientOptions::default())?.run().await?;
//! println!("submitted {}", outcome.app_id);
//! ```

pub mod appgallery;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod retry;
pub mod transport;
pub mod types;

pub use error::{ConnectError, PipelineError, Result, TransportError};
pub use pipeline::{Pipeline, PublishOptions};
pub use progress::{NullSink, ProgressSink, TracingSink};
pub use retry::RetryPolicy;
pub use transport::{ClientOptions, HttpTransport, DEFAULT_BASE_URL};
pub use types::{
    AccessToken, ArtifactProfile, PipelineState, PipelineStep, PublishOutcome, PublishRequest,
    StepTiming, StorageReference, UploadSession,
};

pub use tokio_util::sync::CancellationToken;
