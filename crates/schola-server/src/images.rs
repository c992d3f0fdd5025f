//! Photo uploads to a Cloudinary-style unsigned upload endpoint.

use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use reqwest::{
  Client,
  multipart::{Form, Part},
};
use schola_core::ports::{CollaboratorError, ImageStore, Photo};
use serde::Deserialize;

use crate::ImageConfig;

#[derive(Debug, Deserialize)]
struct UploadResponse {
  secure_url: String,
}

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpImageStore {
  client: Client,
  config: ImageConfig,
}

impl HttpImageStore {
  pub fn new(config: &ImageConfig) -> anyhow::Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config: config.clone() })
  }
}

#[async_trait]
impl ImageStore for HttpImageStore {
  async fn upload(&self, photo: Photo) -> Result<String, CollaboratorError> {
    let part = Part::bytes(photo.bytes)
      .file_name(photo.file_name)
      .mime_str(&photo.content_type)
      .map_err(CollaboratorError::new)?;
    let form = Form::new()
      .text("upload_preset", self.config.upload_preset.clone())
      .part("file", part);

    let resp = self
      .client
      .post(&self.config.upload_url)
      .multipart(form)
      .send()
      .await
      .map_err(CollaboratorError::new)?;
    if !resp.status().is_success() {
      return Err(CollaboratorError::new(format!(
        "POST {} → {}",
        self.config.upload_url,
        resp.status()
      )));
    }

    let body: UploadResponse = resp.json().await.map_err(CollaboratorError::new)?;
    Ok(body.secure_url)
  }
}
