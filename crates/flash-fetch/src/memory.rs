//! In-memory firmware source for deterministic tests

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use flash_core::FirmwareImage;

use super::{FetchError, FirmwareSource};

enum Response {
    Image(Bytes),
    Status { status: u16, text: String },
}

/// Firmware source serving a canned response.
///
/// The response can be swapped between attempts to script
/// fail-then-retry sequences.
pub struct InMemorySource {
    response: Mutex<Response>,
}

impl InMemorySource {
    /// Source that serves `data` successfully.
    pub fn new(data: Bytes) -> Self {
        Self {
            response: Mutex::new(Response::Image(data)),
        }
    }

    /// Source that fails with an HTTP-style status.
    pub fn failing(status: u16, text: &str) -> Self {
        Self {
            response: Mutex::new(Response::Status {
                status,
                text: text.to_string(),
            }),
        }
    }

    /// Replace the canned response with a success.
    pub fn set_image(&self, data: Bytes) {
        *self.response.lock() = Response::Image(data);
    }

    /// Replace the canned response with a failure.
    pub fn set_failure(&self, status: u16, text: &str) {
        *self.response.lock() = Response::Status {
            status,
            text: text.to_string(),
        };
    }
}

#[async_trait]
impl FirmwareSource for InMemorySource {
    async fn fetch(&self) -> Result<FirmwareImage, FetchError> {
        match &*self.response.lock() {
            Response::Image(data) => Ok(FirmwareImage::new(data.clone())),
            Response::Status { status, text } => Err(FetchError::Status {
                status: *status,
                text: text.clone(),
            }),
        }
    }

    fn describe(&self) -> String {
        "in-memory image".to_string()
    }
}
