//! CLI command implementations

pub mod complete;
pub mod info;
pub mod login;
pub mod logout;
pub mod sign;
pub mod status;
