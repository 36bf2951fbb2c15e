//! Primitive scene proxies and their per-view relevance

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

use crate::backend::UniformBufferHandle;
use crate::resources::MeshBatch;
use crate::scene::ViewInfo;

/// Identity of a primitive in the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrimitiveId(pub u32);

/// Identity of a static mesh batch: the owning primitive and the batch index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StaticMeshId {
    pub primitive: PrimitiveId,
    pub index: u32,
}

/// Primitive uniform data for GPU
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct PrimitiveUniformParameters {
    pub local_to_world: Mat4,
    /// xyz = bounds origin, w = bounds radius
    pub object_bounds: Vec4,
}

impl Default for PrimitiveUniformParameters {
    fn default() -> Self {
        Self {
            local_to_world: Mat4::IDENTITY,
            object_bounds: Vec4::new(0.0, 0.0, 0.0, 1.0),
        }
    }
}

/// How a primitive relates to one view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PrimitiveViewRelevance {
    pub draw_relevance: bool,
    /// Batches come from the cached static mesh list
    pub static_relevance: bool,
    /// Batches are gathered per view each frame
    pub dynamic_relevance: bool,
    pub render_in_main_pass: bool,
    pub render_custom_capture: bool,
}

impl PrimitiveViewRelevance {
    pub fn wants_custom_capture(&self) -> bool {
        self.draw_relevance && self.render_custom_capture
    }
}

/// Render-thread representation of a primitive
#[derive(Debug, Clone)]
pub struct PrimitiveSceneProxy {
    id: PrimitiveId,
    pub name: String,
    uniform_buffer: UniformBufferHandle,
    pub uniform_parameters: PrimitiveUniformParameters,
    pub visible: bool,
    pub render_in_main_pass: bool,
    pub render_custom_capture: bool,
    /// Static primitives have their batches cached across frames
    pub is_static: bool,
    pub planar_shadow_base_height: f32,
    mesh_batches: Vec<MeshBatch>,
}

impl PrimitiveSceneProxy {
    pub fn new(id: PrimitiveId, uniform_buffer: UniformBufferHandle) -> Self {
        Self {
            id,
            name: format!("Primitive{}", id.0),
            uniform_buffer,
            uniform_parameters: PrimitiveUniformParameters::default(),
            visible: true,
            render_in_main_pass: true,
            render_custom_capture: false,
            is_static: true,
            planar_shadow_base_height: 0.0,
            mesh_batches: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_custom_capture(mut self, render_custom_capture: bool) -> Self {
        self.render_custom_capture = render_custom_capture;
        self
    }

    pub fn with_main_pass(mut self, render_in_main_pass: bool) -> Self {
        self.render_in_main_pass = render_in_main_pass;
        self
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn with_planar_shadow_base_height(mut self, height: f32) -> Self {
        self.planar_shadow_base_height = height;
        self
    }

    pub fn with_transform(mut self, local_to_world: Mat4) -> Self {
        self.uniform_parameters.local_to_world = local_to_world;
        self
    }

    pub fn with_bounds(mut self, origin: Vec3, radius: f32) -> Self {
        self.uniform_parameters.object_bounds = origin.extend(radius);
        self
    }

    pub fn with_mesh_batch(mut self, batch: MeshBatch) -> Self {
        self.mesh_batches.push(batch);
        self
    }

    pub fn id(&self) -> PrimitiveId {
        self.id
    }

    pub fn uniform_buffer(&self) -> UniformBufferHandle {
        self.uniform_buffer
    }

    pub fn mesh_batches(&self) -> &[MeshBatch] {
        &self.mesh_batches
    }

    pub fn static_mesh_id(&self, index: usize) -> StaticMeshId {
        StaticMeshId {
            primitive: self.id,
            index: index as u32,
        }
    }

    pub fn should_render_in_main_pass(&self) -> bool {
        self.render_in_main_pass
    }

    pub fn should_render_custom_capture(&self) -> bool {
        self.render_custom_capture
    }

    pub fn planar_shadow_base_height(&self) -> f32 {
        self.planar_shadow_base_height
    }

    pub fn view_relevance(&self, view: &ViewInfo) -> PrimitiveViewRelevance {
        PrimitiveViewRelevance {
            draw_relevance: self.visible && !view.is_hidden(self.id),
            static_relevance: self.is_static,
            dynamic_relevance: !self.is_static,
            render_in_main_pass: self.render_in_main_pass,
            render_custom_capture: self.render_custom_capture,
        }
    }
}
