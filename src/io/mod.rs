// src/io/mod.rs
pub mod export;
#[cfg(feature = "gdal")]
pub mod reader;
pub mod scene;
#[cfg(feature = "gdal")]
pub mod writer;

pub use export::export_bundle;
pub use scene::{load_observation, Epoch, FileSceneSource, InMemorySource, SceneFile, SceneSource};
