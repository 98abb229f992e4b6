//! NF-e legislation RAG pipeline.
//!
//! Term extraction → corpus build → retrieval → analysis report, run in-process
//! through [`pipeline::Pipeline`].

pub mod config;
pub mod error;
pub mod pipeline;
pub mod progress;

pub use config::PipelineConfig;
pub use error::{ErrorKind, PipelineError};
pub use pipeline::{Pipeline, PipelineRun};
