//! Catalog source capability and its HTTP implementation.

use std::future::Future;
use std::time::Duration;

use color_eyre::{eyre::eyre, Result};
use reqwest::StatusCode;

use crate::config::ApiConfig;
use crate::error::SyncError;

use super::types::{DetailResponse, PageResponse};

/// Remote capability producing a bounded page of item summaries given a
/// pagination window, and a full detail record given an item id.
///
/// The sync engine is generic over this trait so tests can substitute a
/// scripted in-memory source for the real HTTP client.
pub trait CatalogSource: Send + Sync {
  fn list_page(
    &self,
    limit: u32,
    offset: u32,
  ) -> impl Future<Output = Result<PageResponse, SyncError>> + Send;

  fn get_detail(&self, id: i64) -> impl Future<Output = Result<DetailResponse, SyncError>> + Send;
}

/// HTTP client for the public catalog API.
#[derive(Clone)]
pub struct PokeApiClient {
  http: reqwest::Client,
  base_url: String,
}

impl PokeApiClient {
  pub fn new(config: &ApiConfig) -> Result<Self> {
    let http = reqwest::Client::builder()
      .user_agent(concat!("pokesync/", env!("CARGO_PKG_VERSION")))
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(|e| eyre!("Failed to create API client: {}", e))?;

    // Endpoint paths are joined onto the base, so it must end with a slash.
    let mut base_url = config.base_url.clone();
    if !base_url.ends_with('/') {
      base_url.push('/');
    }

    Ok(Self { http, base_url })
  }
}

impl CatalogSource for PokeApiClient {
  async fn list_page(&self, limit: u32, offset: u32) -> Result<PageResponse, SyncError> {
    let endpoint = format!(
      "{}pokemon?limit={}&offset={}",
      self.base_url, limit, offset
    );

    let response = self
      .http
      .get(&endpoint)
      .send()
      .await?
      .error_for_status()?
      .json::<PageResponse>()
      .await?;

    Ok(response)
  }

  async fn get_detail(&self, id: i64) -> Result<DetailResponse, SyncError> {
    let endpoint = format!("{}pokemon/{}", self.base_url, id);

    let response = self.http.get(&endpoint).send().await?;
    if response.status() == StatusCode::NOT_FOUND {
      return Err(SyncError::NotFound { id });
    }

    let detail = response.error_for_status()?.json::<DetailResponse>().await?;
    Ok(detail)
  }
}
