//! apkscan-core — MobSF scan pipeline for Android packages.
//!
//! Validates APKs locally, uploads them to a MobSF instance, starts the
//! analysis, polls for the finished report under a fixed retry budget and
//! writes the JSON and PDF reports to disk. Used by the `apkscan` CLI.

pub mod config;
pub mod error;
pub mod mobsf;
pub mod persist;
pub mod pipeline;
pub mod poll;
pub mod report;
pub mod service;
pub mod submit;
pub mod validate;
