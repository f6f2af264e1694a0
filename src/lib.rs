//! Annotates clinic appointment tables with attendance predictions from a
//! pre-fit scaler and classifier.

pub mod api;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod logging;
pub mod model;
pub mod pipeline;

pub use error::PipelineError;
