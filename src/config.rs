//! Configuration: file format, persistence, and credential resolution.

pub mod credentials;
pub mod persistence;
pub mod types;
