//! Error types for the capture pass.
//!
//! Only caller contract violations are errors. Everything the pass decides not
//! to draw (unsupported vertex factory, missing permutation, absent target) is
//! reported as `None`/`false`/skip instead.

use thiserror::Error;

use crate::mesh_pass::MeshPass;
use crate::scene::ShadingPath;

/// Capture pass error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CaptureError {
    #[error("Mesh batch has no vertex factory")]
    MissingVertexFactory,
    #[error("Mesh batch has no elements")]
    EmptyMeshBatch,
    #[error("Invalid view rect: min ({min_x}, {min_y}) exceeds max ({max_x}, {max_y})")]
    InvalidViewRect {
        min_x: i32,
        min_y: i32,
        max_x: i32,
        max_y: i32,
    },
    #[error("Failed to compile shader {shader}: {message}")]
    ShaderCompilation { shader: String, message: String },
    #[error("Shader entry point not found: {0}")]
    MissingEntryPoint(String),
    #[error("Pass processor already registered for {pass:?} on {path:?}")]
    DuplicatePassProcessor { path: ShadingPath, pass: MeshPass },
}

pub type CaptureResult<T> = Result<T, CaptureError>;
