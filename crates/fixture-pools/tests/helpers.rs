//! Shared models and utilities for fixture-pools integration tests.

#![allow(dead_code)]

#[path = "helpers/log_capture.rs"]
pub mod log_capture;
#[path = "helpers/models.rs"]
pub mod models;
