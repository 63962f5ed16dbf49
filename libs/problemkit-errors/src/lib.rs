//! Core error payloads for problemkit
//!
//! This crate provides pure data types for client error responses, with no
//! dependency on the result pipeline. It includes:
//! - RFC 7807 / RFC 9457 Problem Details (`Problem`)
//! - Problem Details carrying per-field validation errors (`ValidationProblem`)
//! - Per-request validation state (`ModelState`)
//! - Media type constants and, behind the `xml` feature, XML rendering
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod media_types;
pub mod model_state;
pub mod problem;
#[cfg(feature = "xml")]
pub mod xml;

pub use media_types::{
    APPLICATION_JSON, APPLICATION_PROBLEM_JSON, APPLICATION_PROBLEM_XML, APPLICATION_XML,
};
pub use model_state::ModelState;
pub use problem::{Problem, RESERVED_MEMBERS, VALIDATION_PROBLEM_TITLE, ValidationProblem};
