#![doc = include_str!("../README.md")]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

mod adjust;
mod pseudo;
mod sum;

pub use adjust::checksum_adjust;
pub use pseudo::{ipv4_pseudo_header_sum, ipv6_pseudo_header_sum};
pub use sum::{checksum_add, checksum_finish, checksum_fold, ipv4_header_checksum};
