//! Retrieval of frame pixel data from a WADO-RS store

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use tracing::{debug, warn};

use crate::config::HttpSettings;
use crate::error::FetchError;
use crate::media_type::MediaType;

pub mod multipart;

/// Pixel bytes of one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFrame {
    pub pixel_data: Bytes,
}

/// What the store returned for a frame request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelDataResult {
    /// `Content-Type` describing the frame, as announced by the store
    pub content_type: Option<String>,
    pub image_frame: ImageFrame,
}

/// Fetches frame pixel data for a retrieval URI
#[async_trait]
pub trait PixelDataFetcher: Send + Sync {
    async fn fetch(
        &self,
        uri: &str,
        image_id: &str,
        media_type: MediaType,
    ) -> Result<PixelDataResult, FetchError>;
}

/// `PixelDataFetcher` speaking WADO-RS over HTTP
#[derive(Debug, Clone)]
pub struct HttpPixelDataFetcher {
    client: reqwest::Client,
    headers: HeaderMap,
}

impl HttpPixelDataFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            headers: HeaderMap::new(),
        }
    }

    /// Build a fetcher with the user agent and extra headers from settings
    pub fn from_settings(settings: &HttpSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .build()?;
        let headers = header_map(&settings.headers).map_err(FetchError::InvalidHeader)?;
        Ok(Self { client, headers })
    }
}

/// Convert configured header pairs into a `HeaderMap`
pub fn header_map(headers: &HashMap<String, String>) -> Result<HeaderMap, String> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| format!("invalid header name '{}': {}", name, e))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| format!("invalid value for header '{}': {}", name, e))?;
        map.insert(name, value);
    }
    Ok(map)
}

#[async_trait]
impl PixelDataFetcher for HttpPixelDataFetcher {
    async fn fetch(
        &self,
        uri: &str,
        image_id: &str,
        media_type: MediaType,
    ) -> Result<PixelDataResult, FetchError> {
        let url = url::Url::parse(uri).map_err(|e| FetchError::InvalidUri {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;

        debug!("GET {} for {} (Accept: {})", url, image_id, media_type);

        let response = self
            .client
            .get(url)
            .headers(self.headers.clone())
            .header(ACCEPT, media_type.as_str())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("WADO-RS store returned {} for {}", status, uri);
            return Err(FetchError::Status {
                status,
                uri: uri.to_string(),
            });
        }

        let response_content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response.bytes().await?;
        let frame = multipart::extract_first_part(&body)?;

        debug!(
            "Received {} frame bytes for {} (part content type: {:?})",
            frame.data.len(),
            image_id,
            frame.content_type
        );

        Ok(PixelDataResult {
            content_type: frame.content_type.or(response_content_type),
            image_frame: ImageFrame {
                pixel_data: frame.data,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_map_accepts_valid_pairs() {
        let mut headers = HashMap::new();
        headers.insert("Authorization".to_string(), "Bearer abc".to_string());
        let map = header_map(&headers).expect("valid headers");
        assert_eq!(map.get("authorization").and_then(|v| v.to_str().ok()), Some("Bearer abc"));
    }

    #[test]
    fn header_map_rejects_bad_name() {
        let mut headers = HashMap::new();
        headers.insert("bad header".to_string(), "x".to_string());
        assert!(header_map(&headers).is_err());
    }

    #[tokio::test]
    async fn invalid_uri_is_a_fetch_error() {
        let fetcher = HttpPixelDataFetcher::new(reqwest::Client::new());
        let err = fetcher
            .fetch("not a url", "wadors:not a url", MediaType::OctetStream)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::InvalidUri { .. }));
    }
}
