//! services/api/src/adapters/blob.rs
//!
//! This module contains the adapter for durable blob storage. It implements
//! the `BlobStorage` port by PUT-ing bytes to an Azure-style container URL
//! with a pre-issued SAS token, then handing back the public artifact URL.

use async_trait::async_trait;
use caretaker_core::ports::{BlobStorage, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `BlobStorage` port against an HTTP blob
/// container.
#[derive(Clone)]
pub struct HttpBlobAdapter {
    client: reqwest::Client,
    /// Base container URL without a trailing slash.
    container_url: String,
    /// SAS query string granting write access, without the leading `?`.
    sas_token: String,
}

impl HttpBlobAdapter {
    /// Creates a new `HttpBlobAdapter`.
    pub fn new(client: reqwest::Client, container_url: String, sas_token: String) -> Self {
        Self {
            client,
            container_url: container_url.trim_end_matches('/').to_string(),
            sas_token,
        }
    }
}

//=========================================================================================
// `BlobStorage` Trait Implementation
//=========================================================================================

#[async_trait]
impl BlobStorage for HttpBlobAdapter {
    /// Publishes the bytes under `name` and returns the public URL.
    async fn publish(&self, bytes: &[u8], name: &str) -> PortResult<String> {
        let public_url = format!("{}/{}", self.container_url, name);
        let upload_url = format!("{}?{}", public_url, self.sas_token);

        self.client
            .put(&upload_url)
            .header("x-ms-blob-type", "BlockBlob")
            .header("Content-Type", "audio/wav")
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(|e| PortError::Upstream(e.to_string()))?
            .error_for_status()
            .map_err(|e| PortError::Upstream(e.to_string()))?;

        Ok(public_url)
    }
}
