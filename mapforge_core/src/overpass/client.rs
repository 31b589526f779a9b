use super::{FeatureSource, OverpassQuery, OverpassResponse};
use crate::{area::AreaDescriptor, layer::Layer};
use anyhow::{Result, bail};
use async_trait::async_trait;
use mapforge_derive::context;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::{Client, StatusCode, Url, header};
use std::time::Duration;
use tokio::time::sleep;

pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

const MAX_RETRIES: u32 = 3;
/// Extra time granted to the HTTP request on top of the server side query timeout.
const TIMEOUT_MARGIN: Duration = Duration::from_secs(15);
const ERROR_EXCERPT_LEN: usize = 200;

fn is_retryable_error(err: &reqwest::Error) -> bool {
	err.is_connect() || err.is_timeout() || err.is_body()
}

fn is_retryable_status(status: StatusCode) -> bool {
	status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::GATEWAY_TIMEOUT
}

/// Fetches layer features from an Overpass API endpoint.
#[derive(Debug, Clone)]
pub struct OverpassClient {
	client: Client,
	url: Url,
	timeout_seconds: u64,
	retry_base: Duration,
}

impl OverpassClient {
	pub fn new(url: &str, timeout_seconds: u64, user_agent: &str) -> Result<OverpassClient> {
		let url = Url::parse(url)?;
		match url.scheme() {
			"http" | "https" => (),
			other => bail!("unsupported URL scheme '{other}' in '{url}', expected 'http' or 'https'"),
		}

		let client = Client::builder()
			.user_agent(user_agent)
			.timeout(Duration::from_secs(timeout_seconds) + TIMEOUT_MARGIN)
			.use_rustls_tls()
			.build()?;

		Ok(OverpassClient {
			client,
			url,
			timeout_seconds,
			retry_base: Duration::from_secs(1),
		})
	}

	/// Shortens the pause between retries.
	pub fn with_retry_base(mut self, retry_base: Duration) -> Self {
		self.retry_base = retry_base;
		self
	}

	pub fn url(&self) -> &Url {
		&self.url
	}

	/// Posts a raw Overpass QL query and parses the answer.
	#[context("querying Overpass at '{}'", self.url)]
	pub async fn run_query(&self, query: &str) -> Result<OverpassResponse> {
		let body = format!("data={}", utf8_percent_encode(query, NON_ALPHANUMERIC));

		for attempt in 0..=MAX_RETRIES {
			if attempt > 0 {
				let backoff = self.retry_base * (1 << (attempt - 1));
				log::warn!(
					"retry attempt {attempt}/{MAX_RETRIES} querying '{}', waiting {backoff:?}",
					self.url
				);
				sleep(backoff).await;
			}

			let request = self
				.client
				.post(self.url.clone())
				.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
				.body(body.clone());

			let response = match request.send().await {
				Ok(r) => r,
				Err(e) if is_retryable_error(&e) && attempt < MAX_RETRIES => {
					log::warn!("retryable error: {e}");
					continue;
				}
				Err(e) => return Err(e.into()),
			};

			let status = response.status();
			if is_retryable_status(status) && attempt < MAX_RETRIES {
				log::warn!("Overpass answered {status}");
				continue;
			}

			let bytes = match response.bytes().await {
				Ok(b) => b,
				Err(e) if is_retryable_error(&e) && attempt < MAX_RETRIES => {
					log::warn!("retryable error reading response body: {e}");
					continue;
				}
				Err(e) => return Err(e.into()),
			};

			if !status.is_success() {
				let text = String::from_utf8_lossy(&bytes);
				let excerpt: String = text.chars().take(ERROR_EXCERPT_LEN).collect();
				bail!("Overpass answered {status}: {}", excerpt.trim());
			}

			log::trace!("received {} bytes from '{}'", bytes.len(), self.url);
			return OverpassResponse::parse(&bytes);
		}

		bail!("request failed after {MAX_RETRIES} retries")
	}
}

#[async_trait]
impl FeatureSource for OverpassClient {
	#[context("fetching layer '{}' for {}", layer.name, area)]
	async fn fetch(&self, layer: &Layer, area: &AreaDescriptor) -> Result<OverpassResponse> {
		let query = OverpassQuery::new(layer, area).with_timeout(self.timeout_seconds).build();
		log::debug!("overpass query: {query}");
		self.run_query(&query).await
	}
}
