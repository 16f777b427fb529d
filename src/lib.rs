// src/lib.rs
pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod grid;
pub mod io;
pub mod processing;
pub mod render;
pub mod utils;

pub use error::{AnalysisError, Result};
