//! HTTP REST API
//!
//! - `common`: response envelope, error mapping, validated extractors
//! - `modules`: per-feature DTOs and handlers
//! - `router`: route table and Swagger documentation

pub mod common;
pub mod modules;
pub mod router;

pub use router::{create_api_router, ApiDoc, ApiState};
