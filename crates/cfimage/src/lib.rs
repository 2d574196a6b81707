//! Cloudflare Images client
//!
//! Thin wrapper over the Cloudflare Images HTTP API for embedding in a
//! server-side application. Five operations are exposed:
//!
//! - verify credentials (`/user/tokens/verify`)
//! - obtain a direct upload URL (`/accounts/{id}/images/v2/direct_upload`)
//! - upload an image (multipart POST to the direct upload URL)
//! - delete an image (`/accounts/{id}/images/v1/{image_id}`)
//! - update an image (delete, then upload)
//!
//! Every operation returns an [`OperationResult`]; failures never escape as
//! errors or panics.
//!
//! # Requirements
//!
//! Credentials are resolved per key from explicit values, then the settings
//! file (`~/.config/cfimage/config.yaml` or `CFIMAGE_CONFIG_PATH`), then the
//! `CLOUDFLARE_API_KEY`, `CLOUDFLARE_ACCOUNT_ID` and `APP_NAME` env vars.
//!
//! # Example
//!
//! ```ignore
//! use cfimage::{ClientConfig, ImageApiClient, Overrides};
//!
//! let config = ClientConfig::load(&Overrides::default(), None)?;
//! let client = ImageApiClient::from_config(config)?;
//!
//! let uploaded = client.upload_image("/tmp/a.png", "pic.png").await;
//! if let Some(photo_id) = uploaded.photo_id() {
//!     // replace it later
//!     let updated = client.update_image(photo_id, "/tmp/b.png", "pic.png").await;
//!     println!("{}", updated.to_json());
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod result;
pub mod source;
pub mod transport;

pub use client::ImageApiClient;
pub use config::{ClientConfig, Credentials, Overrides, Settings};
pub use error::{ConfigError, ErrorKind, ImageApiError, Result};
pub use result::{OperationResult, Outcome};
pub use source::{ImageSource, UploadedFile};
pub use transport::{ApiRequest, ApiResponse, HttpMethod, HttpTransport, RequestBody, Transport};
