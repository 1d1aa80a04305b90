//! Core types shared across modres facilities
//!
//! This crate provides foundational types used by both the resolver's
//! error facility and its logging facility:
//!
//! - **Correlation types**: RequestId, RequestContext
//! - **Schema constants**: Canonical field keys and event names

pub mod correlation;
pub mod schema;

pub use correlation::{RequestContext, RequestId};
