//! Radar processing API service library.
//!
//! This module exposes the internal modules for testing purposes.

pub mod config;
pub mod fetch;
pub mod handlers;
pub mod jobs;
pub mod pipeline;
pub mod reaper;
pub mod state;
