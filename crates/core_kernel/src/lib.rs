//! Core Kernel - Foundational types shared by the talks catalogue crates
//!
//! This crate provides the fundamental building blocks used across the workspace:
//! - Strongly-typed identifiers and opaque version tokens
//! - Port error and health check abstractions for store adapters
//! - Paging arithmetic for 1-based page requests

pub mod identifiers;
pub mod paging;
pub mod ports;

pub use identifiers::{SpeakerId, TalkId, VersionToken};
pub use paging::Page;
pub use ports::{
    AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, PortError,
};
