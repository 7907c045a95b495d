//! Shared test utilities for docpipe integration tests.
//!
//! - `TestHarness` for isolated data/output directories and service wiring
//! - builders for synthetic PDF, DOCX and PNG documents
//! - counting fakes for the OCR and page rendering seams

pub mod builders;
pub mod fakes;
pub mod harness;

pub use builders::*;
pub use fakes::*;
pub use harness::{wait_for_job, TestHarness};
