//! File processing and formatting pipeline.
//!
//! This module orchestrates the two-pass formatting process:
//!
//! **Pre-processing:**
//! - Skip files carrying the configured marker
//! - Run caller-supplied [`Processor`] hooks, any of which may skip the file
//!
//! **Pass 1 - Import sorting** and **Pass 2 - Formatting:**
//! - Each pass is a [`Transform`] fed the output of the previous one
//! - The CLI uses [`CommandTransform`] to drive external tools
//!
//! **Post-processing:**
//! - Run [`Processor`] hooks over the formatted content
//!
//! The main entry point is [`Pipeline::format_paths`], which expands paths,
//! formats files in parallel and returns one [`crate::FileResult`] per file.

pub mod pipeline;
pub mod processor;
pub mod transform;

pub use pipeline::{Pipeline, PipelineOptions};
pub use processor::{MarkerSkip, Processed, Processor};
pub use transform::{CommandTransform, Transform};
