//! # Mesh Pipeline
//!
//! Turns partition files into mesh files, and drives the whole
//! ingest → partition → mesh sequence.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐    ┌──────────────┐    ┌──────────────────────────────┐
//! │ ColumnStore│───▶│RangePartition│───▶│ MeshBuildOrchestrator        │
//! │  (ingest)  │    │  (.divf)     │    │  worker: assemble → voxelize │
//! └────────────┘    └──────────────┘    │  → extract → split → weld    │
//!                                        │  → <lo>_<hi>[_<n>].imf       │
//!                                        └──────────────────────────────┘
//! ```
//!
//! The mesh phase starts only after partitioning has finished. Within the
//! phase a fixed pool of workers drains a shared stack of partition files;
//! a file that fails is reported and skipped.
//!
//! ## Example
//!
//! ```rust,no_run
//! use isomesh::pipeline::{BuildRequest, Pipeline};
//! use isomesh::store::CacheLayout;
//!
//! let request = BuildRequest {
//!     source: "cells.csv".into(),
//!     divisions: 10,
//!     attribute: "Temperature".to_string(),
//!     resolution: 100_000,
//!     threads: 4,
//!     axes: ["X".to_string(), "Y".to_string(), "Z".to_string()],
//!     iso_level: 0.1,
//!     split_columns: Vec::new(),
//! };
//! let summary = Pipeline::new(CacheLayout::new("cache")).run(&request)?;
//! println!("{} meshes", summary.meshes.meshes.len());
//! # Ok::<(), isomesh::pipeline::PipelineError>(())
//! ```

mod assembler;
mod driver;
mod error;
mod orchestrator;

#[cfg(test)]
mod tests;

pub use assembler::{AttCoordCell, PointCloudAssembler};
pub use driver::{BuildRequest, Pipeline, PipelineOptions, PipelineSummary};
pub use error::{PipelineError, MIN_CLOUD_POINTS};
pub use orchestrator::{
    default_threads, MeshBuildConfig, MeshBuildOrchestrator, MeshBuildReport, MeshFailure,
    MeshFile,
};
