//! flash-fetch - Firmware image source for the flashing session
//!
//! The session fetches the image once per flash attempt through the
//! [`FirmwareSource`] seam. The HTTP implementation performs a single GET
//! and buffers the full body before flashing begins; any non-2xx response
//! surfaces its status text verbatim so the session can log it.

pub mod error;
pub mod memory;
pub mod source;
pub mod testing;

pub use error::FetchError;
pub use memory::InMemorySource;
pub use source::{FirmwareSource, HttpFirmwareSource};
