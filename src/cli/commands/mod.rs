//! CLI command implementations
//!
//! This module contains all CLI command implementations.

pub mod init;
pub mod restore;
pub mod run;
pub mod validate;
