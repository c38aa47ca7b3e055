#![doc = include_str!("../README.md")]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

pub mod metrics;

#[macro_use]
pub mod macros;

/// Renders every registered metric in the prometheus text exposition format
#[must_use]
pub fn render() -> String {
    use prometheus::{Encoder, TextEncoder};

    let mut buffer = Vec::new();
    if let Err(error) = TextEncoder::new().encode(&prometheus::gather(), &mut buffer) {
        log::warn!("Failed to encode metrics: {}", error);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
