//! CLI command modules.

pub mod http;
pub mod identity;
pub mod peers;
pub mod ping;
pub mod status;
