//! Resource management
//!
//! Vertex factory types, materials and the mesh batches that reference them.

mod material;
mod mesh_batch;
mod vertex_factory;

pub use material::*;
pub use mesh_batch::*;
pub use vertex_factory::*;
