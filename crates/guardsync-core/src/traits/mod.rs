//! Core traits for the guardsync system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`ApplianceClient`]: Read and write the resources of one instance
//! - [`ClientFactory`]: Build a client for an instance descriptor

pub mod client;

pub use client::{ApplianceClient, ClientFactory};
