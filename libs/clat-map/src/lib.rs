#![doc = include_str!("../README.md")]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

mod control;
mod error;
mod store;
mod table;

pub use control::ControlAddress;
pub use error::{Error, Result};
pub use store::{MappingReader, MappingStore};
pub use table::{AddressMapping, MappingTable, DEFAULT_DEVICE_COUNT, PLAT_PREFIX_LEN};
