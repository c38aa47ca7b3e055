#![doc = include_str!("../README.md")]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

pub mod dispatch;
pub mod error;
pub mod protocols;
mod view;

#[cfg(test)]
mod test_utils;

pub use dispatch::{
    classify_inbound, classify_outbound, translate_inbound, translate_outbound, Decision,
    Direction, Translator,
};
pub use error::{Malformed, RejectReason, Unmapped, Unsupported};
pub use protocols::MAX_HEADER_GROWTH;
pub use view::PacketView;
