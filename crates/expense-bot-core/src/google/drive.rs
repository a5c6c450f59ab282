//! Google Drive v3: receipt uploads and spreadsheet lookup.

use super::{api_url, check_status, GoogleApiError, GoogleAuth};
use crate::storage::{ReceiptStorage, StorageError, UploadedReceipt};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

/// Production Drive API host
pub const DRIVE_API_BASE: &str = "https://www.googleapis.com";

const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    web_view_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

/// Thin client over the Drive endpoints the bot uses.
#[derive(Clone)]
pub struct DriveClient {
    auth: Arc<GoogleAuth>,
    http: reqwest::Client,
    base_url: String,
}

impl DriveClient {
    /// Create a client for the production API.
    #[must_use]
    pub fn new(auth: Arc<GoogleAuth>, http: reqwest::Client) -> Self {
        Self {
            auth,
            http,
            base_url: DRIVE_API_BASE.to_string(),
        }
    }

    /// Point the client at another host.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Find the ID of a spreadsheet the service account can see, by title.
    ///
    /// # Errors
    ///
    /// Returns an error if the search request fails.
    pub async fn find_spreadsheet_by_name(
        &self,
        name: &str,
    ) -> Result<Option<String>, GoogleApiError> {
        let url = api_url(&self.base_url, &["drive", "v3", "files"])?;
        let token = self.auth.access_token().await?;
        let query = spreadsheet_query(name);

        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(&[
                ("q", query.as_str()),
                ("fields", "files(id,name)"),
                ("supportsAllDrives", "true"),
                ("includeItemsFromAllDrives", "true"),
            ])
            .send()
            .await?;
        let list: FileList = check_status(response).await?.json().await?;

        if list.files.len() > 1 {
            info!(
                "{} spreadsheets are named {:?}, using the first one",
                list.files.len(),
                name
            );
        }
        Ok(list.files.into_iter().next().map(|f| f.id))
    }

    /// Create `file_name` inside `folder_id` and return its view link.
    ///
    /// # Errors
    ///
    /// Returns an error if the upload fails or the response lacks a link.
    pub async fn upload_file(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        mime_type: &str,
        folder_id: &str,
    ) -> Result<UploadedReceipt, StorageError> {
        let mut url = api_url(&self.base_url, &["upload", "drive", "v3", "files"])?;
        url.query_pairs_mut()
            .append_pair("uploadType", "multipart")
            .append_pair("fields", "id,webViewLink")
            .append_pair("supportsAllDrives", "true");

        let metadata = json!({ "name": file_name, "parents": [folder_id] });
        let boundary = format!("receipt-{}", uuid::Uuid::new_v4().simple());
        let body = multipart_related(&metadata, mime_type, &bytes, &boundary);

        let token = self
            .auth
            .access_token()
            .await
            .map_err(GoogleApiError::from)?;
        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={boundary}"),
            )
            .body(body)
            .send()
            .await
            .map_err(GoogleApiError::from)?;

        let file: DriveFile = check_status(response)
            .await?
            .json()
            .await
            .map_err(GoogleApiError::from)?;
        let view_link = file.web_view_link.ok_or_else(|| {
            StorageError::Response(format!("Drive file {} has no webViewLink", file.id))
        })?;

        Ok(UploadedReceipt {
            id: file.id,
            view_link,
        })
    }

    /// Verify the service account can reach Drive.
    ///
    /// # Errors
    ///
    /// Returns an error if the `about` endpoint cannot be read.
    pub async fn check_connection(&self) -> Result<(), GoogleApiError> {
        let url = api_url(&self.base_url, &["drive", "v3", "about"])?;
        let token = self.auth.access_token().await?;
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(&[("fields", "user")])
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

/// Receipt storage in a Drive folder.
pub struct DriveStorage {
    client: DriveClient,
    folder_id: String,
}

impl DriveStorage {
    /// Store receipts in `folder_id`.
    #[must_use]
    pub fn new(client: DriveClient, folder_id: impl Into<String>) -> Self {
        Self {
            client,
            folder_id: folder_id.into(),
        }
    }
}

#[async_trait]
impl ReceiptStorage for DriveStorage {
    async fn upload(
        &self,
        path: &Path,
        file_name: &str,
        mime_type: &str,
    ) -> Result<UploadedReceipt, StorageError> {
        let bytes = tokio::fs::read(path).await?;
        let uploaded = self
            .client
            .upload_file(bytes, file_name, mime_type, &self.folder_id)
            .await?;
        info!("Uploaded receipt to Drive as {}", uploaded.id);
        Ok(uploaded)
    }

    async fn check_connection(&self) -> Result<(), String> {
        match self.client.check_connection().await {
            Ok(()) => {
                info!("Successfully connected to Google Drive.");
                Ok(())
            }
            Err(e) => {
                let err_msg = format!("Drive connectivity test failed: {e}");
                error!("{}", err_msg);
                Err(err_msg)
            }
        }
    }
}

/// Drive search query for a non-trashed spreadsheet titled `name`.
fn spreadsheet_query(name: &str) -> String {
    let escaped = name.replace('\\', "\\\\").replace('\'', "\\'");
    format!("name = '{escaped}' and mimeType = '{SPREADSHEET_MIME}' and trashed = false")
}

/// Build a `multipart/related` body: JSON metadata part, then the media part.
fn multipart_related(
    metadata: &serde_json::Value,
    mime_type: &str,
    media: &[u8],
    boundary: &str,
) -> Vec<u8> {
    let mut body = Vec::with_capacity(media.len() + 512);
    body.extend_from_slice(
        format!("--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(format!("--{boundary}\r\nContent-Type: {mime_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(media);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}
