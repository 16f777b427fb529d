// src/render/mod.rs
pub mod chart;
pub mod palette;

pub use chart::{DiagnosticChart, DiagnosticRenderer, RendererConfig};
pub use palette::classification_map;
