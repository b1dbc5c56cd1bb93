//! Test fixture server
//!
//! Spins up a real HTTP server on an ephemeral port so fetch and session
//! tests exercise the actual client path instead of a stubbed one.

use std::net::SocketAddr;

use axum::routing::get;
use axum::Router;
use bytes::Bytes;
use tokio::task::JoinHandle;

use flash_core::DEFAULT_IMAGE_PATH;

/// A small HTTP server serving one firmware image.
///
/// `GET /firmware.bin` returns the image with 200; any other path is a
/// plain 404.
pub struct FixtureServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl FixtureServer {
    /// Bind an ephemeral port and start serving `image`.
    pub async fn start(image: Bytes) -> Self {
        let app = Router::new().route(
            &format!("/{}", DEFAULT_IMAGE_PATH),
            get(move || {
                let image = image.clone();
                async move { image }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fixture server");
        let addr = listener.local_addr().expect("fixture server addr");

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, handle }
    }

    /// URL of the served image.
    pub fn image_url(&self) -> String {
        format!("http://{}/{}", self.addr, DEFAULT_IMAGE_PATH)
    }

    /// URL of a path that returns 404.
    pub fn missing_url(&self) -> String {
        format!("http://{}/missing.bin", self.addr)
    }
}

impl Drop for FixtureServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
