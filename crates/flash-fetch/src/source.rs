//! Firmware source trait and HTTP implementation

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, instrument};
use url::Url;

use flash_core::FirmwareImage;

use super::FetchError;

/// Byte-addressable source of the firmware image to flash.
///
/// Fetched once per flash attempt; the image is buffered fully in memory
/// before flashing begins (no streaming).
#[async_trait]
pub trait FirmwareSource: Send + Sync {
    /// Retrieve the full image.
    async fn fetch(&self) -> Result<FirmwareImage, FetchError>;

    /// Human-readable description of where the image comes from, for the
    /// session log.
    fn describe(&self) -> String;
}

/// Firmware source performing a single GET of a fixed URL
#[derive(Debug, Clone)]
pub struct HttpFirmwareSource {
    client: Client,
    url: Url,
}

impl HttpFirmwareSource {
    pub fn new(url: &str) -> Result<Self, FetchError> {
        Ok(Self {
            client: Client::new(),
            url: Url::parse(url)?,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl FirmwareSource for HttpFirmwareSource {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch(&self) -> Result<FirmwareImage, FetchError> {
        debug!("fetching firmware image");
        let response = self.client.get(self.url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                text: status
                    .canonical_reason()
                    .unwrap_or("Unknown status")
                    .to_string(),
            });
        }

        let body = response.bytes().await?;
        info!(bytes = body.len(), "firmware image fetched");
        Ok(FirmwareImage::new(body))
    }

    fn describe(&self) -> String {
        self.url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    use crate::testing::FixtureServer;

    #[tokio::test]
    async fn test_fetch_success_buffers_full_body() {
        let image = Bytes::from(vec![0xE9; 2048]);
        let server = FixtureServer::start(image.clone()).await;

        let source = HttpFirmwareSource::new(&server.image_url()).unwrap();
        let fetched = source.fetch().await.unwrap();
        assert_eq!(fetched.len(), 2048);
        assert_eq!(fetched.data(), &image);
        assert_eq!(fetched.load_address(), 0x10000);
    }

    #[tokio::test]
    async fn test_fetch_missing_image_surfaces_status_text() {
        let server = FixtureServer::start(Bytes::from_static(b"unused")).await;

        let source = HttpFirmwareSource::new(&server.missing_url()).unwrap();
        let err = source.fetch().await.unwrap_err();
        match err {
            FetchError::Status { status, ref text } => {
                assert_eq!(status, 404);
                assert_eq!(text, "Not Found");
            }
            other => panic!("expected status error, got {:?}", other),
        }
        assert!(err.to_string().contains("Not Found"));
    }

    #[tokio::test]
    async fn test_invalid_url_rejected() {
        assert!(matches!(
            HttpFirmwareSource::new("not a url"),
            Err(FetchError::Url(_))
        ));
    }
}
