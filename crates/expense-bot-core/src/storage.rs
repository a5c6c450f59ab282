//! Receipt object storage
//!
//! Uploads receipt photos and returns a shareable link. Google Drive is the
//! default backend (see [`crate::google::DriveStorage`]); Cloudflare R2 / AWS
//! S3 is available through [`R2Storage`].

use crate::config::TrackerSettings;
use crate::google::GoogleApiError;
use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use aws_types::region::Region;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

/// Longest validity S3 allows for a presigned URL (7 days)
pub const MAX_PRESIGNED_LINK_SECS: u64 = 7 * 24 * 60 * 60;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Google Drive call failed
    #[error(transparent)]
    Google(#[from] GoogleApiError),
    /// Error putting object into S3
    #[error("S3 put error: {0}")]
    S3Put(String),
    /// Presigned link could not be generated
    #[error("Presign error: {0}")]
    Presign(String),
    /// Backend answered without the expected fields
    #[error("Unexpected upload response: {0}")]
    Response(String),
    /// Standard I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Configuration error (missing credentials, etc.)
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A stored receipt object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedReceipt {
    /// Backend object identifier
    pub id: String,
    /// Link the user can open to view the receipt
    pub view_link: String,
}

/// Interface for receipt storage backends
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReceiptStorage: Send + Sync {
    /// Upload the file at `path` under `file_name` into the configured folder.
    async fn upload(
        &self,
        path: &Path,
        file_name: &str,
        mime_type: &str,
    ) -> Result<UploadedReceipt, StorageError>;
    /// Check connection to storage
    async fn check_connection(&self) -> Result<(), String>;
}

/// R2-backed receipt storage
pub struct R2Storage {
    client: Client,
    bucket: String,
    folder: String,
    public_url: Option<String>,
}

impl R2Storage {
    /// Create a new R2 storage instance
    ///
    /// # Errors
    ///
    /// Returns an error if R2 configuration is missing.
    pub async fn new(settings: &TrackerSettings) -> Result<Self, StorageError> {
        let endpoint_url = settings
            .r2_endpoint_url
            .as_ref()
            .ok_or_else(|| StorageError::Config("R2_ENDPOINT_URL is missing".into()))?;
        let access_key = settings
            .r2_access_key_id
            .as_ref()
            .ok_or_else(|| StorageError::Config("R2_ACCESS_KEY_ID is missing".into()))?;
        let secret_key = settings
            .r2_secret_access_key
            .as_ref()
            .ok_or_else(|| StorageError::Config("R2_SECRET_ACCESS_KEY is missing".into()))?;
        let bucket = settings
            .r2_bucket_name
            .as_ref()
            .ok_or_else(|| StorageError::Config("R2_BUCKET_NAME is missing".into()))?;

        let credentials = Credentials::new(access_key, secret_key, None, None, "r2-storage");

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new("auto"))
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .endpoint_url(endpoint_url)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(s3_config),
            bucket: bucket.clone(),
            folder: settings.receipt_folder.clone(),
            public_url: settings.r2_public_url.clone(),
        })
    }

    async fn view_link(&self, key: &str) -> Result<String, StorageError> {
        if let Some(base) = self.public_url.as_deref() {
            return Ok(public_link(base, key));
        }

        let presigning = PresigningConfig::expires_in(Duration::from_secs(MAX_PRESIGNED_LINK_SECS))
            .map_err(|e| StorageError::Presign(e.to_string()))?;
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::Presign(e.to_string()))?;
        Ok(request.uri().to_string())
    }
}

#[async_trait]
impl ReceiptStorage for R2Storage {
    async fn upload(
        &self,
        path: &Path,
        file_name: &str,
        mime_type: &str,
    ) -> Result<UploadedReceipt, StorageError> {
        let key = object_key(&self.folder, file_name);
        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::Io(std::io::Error::other(e)))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(body)
            .content_type(mime_type)
            .send()
            .await
            .map_err(|e| StorageError::S3Put(e.to_string()))?;

        let view_link = self.view_link(&key).await?;
        info!("Uploaded receipt to R2 as {}", key);
        Ok(UploadedReceipt { id: key, view_link })
    }

    /// Check connection to R2 storage
    async fn check_connection(&self) -> Result<(), String> {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => {
                info!("Successfully connected to R2 storage.");
                Ok(())
            }
            Err(e) => {
                let err_msg = format!("R2 connectivity test failed: {e:#?}");
                error!("{}", err_msg);
                Err(err_msg)
            }
        }
    }
}

/// Returns the object key for a receipt inside `folder`
#[must_use]
pub fn object_key(folder: &str, file_name: &str) -> String {
    let folder = folder.trim_matches('/');
    if folder.is_empty() {
        file_name.to_string()
    } else {
        format!("{folder}/{file_name}")
    }
}

/// Returns the public link for `key` under the bucket's public base URL
#[must_use]
pub fn public_link(base: &str, key: &str) -> String {
    format!("{}/{key}", base.trim_end_matches('/'))
}
