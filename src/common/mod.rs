//! Common code used by the `clatxlat` binary

pub mod config;
pub mod hex;
pub mod logging;
pub mod plat;
pub mod profiler;
