//! Built mesh draw commands and their shader bindings

use std::sync::Arc;

use crate::backend::{CullMode, FillMode, UniformBufferHandle};
use crate::pipeline::PassRenderState;
use crate::resources::{MaterialProxyId, MaterialResourceId, MeshBatchElement, VertexFactoryType};
use crate::scene::{PrimitiveId, StaticMeshId};
use crate::shader::{CompiledShader, ShaderFrequency, ShaderId, ShaderParameter};

/// Ordering key of a draw command: vertex shader id in the high half,
/// pixel shader id in the low half.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshDrawCommandSortKey(pub u64);

impl MeshDrawCommandSortKey {
    pub fn from_shaders(vertex_shader: ShaderId, pixel_shader: ShaderId) -> Self {
        Self(((vertex_shader.0 as u64) << 32) | pixel_shader.0 as u64)
    }

    pub fn vertex_shader(&self) -> ShaderId {
        ShaderId((self.0 >> 32) as u32)
    }

    pub fn pixel_shader(&self) -> ShaderId {
        ShaderId(self.0 as u32)
    }
}

/// Value bound to a shader parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShaderBindingValue {
    UniformBuffer(UniformBufferHandle),
    Float(f32),
}

/// Bindings of one shader stage
#[derive(Debug, Clone, PartialEq)]
pub struct SingleShaderBindings {
    frequency: ShaderFrequency,
    entries: Vec<(ShaderParameter, ShaderBindingValue)>,
}

impl SingleShaderBindings {
    pub fn new(frequency: ShaderFrequency) -> Self {
        Self {
            frequency,
            entries: Vec::new(),
        }
    }

    pub fn frequency(&self) -> ShaderFrequency {
        self.frequency
    }

    pub fn add_uniform_buffer(&mut self, parameter: ShaderParameter, buffer: UniformBufferHandle) {
        self.set(parameter, ShaderBindingValue::UniformBuffer(buffer));
    }

    pub fn add_float(&mut self, parameter: ShaderParameter, value: f32) {
        self.set(parameter, ShaderBindingValue::Float(value));
    }

    fn set(&mut self, parameter: ShaderParameter, value: ShaderBindingValue) {
        match self.entries.iter_mut().find(|(p, _)| *p == parameter) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((parameter, value)),
        }
    }

    pub fn get(&self, parameter: ShaderParameter) -> Option<ShaderBindingValue> {
        self.entries
            .iter()
            .find(|(p, _)| *p == parameter)
            .map(|(_, value)| *value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(ShaderParameter, ShaderBindingValue)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Bindings of every stage of a draw
#[derive(Debug, Clone, PartialEq)]
pub struct MeshDrawShaderBindings {
    pub vertex: SingleShaderBindings,
    pub pixel: SingleShaderBindings,
}

impl Default for MeshDrawShaderBindings {
    fn default() -> Self {
        Self {
            vertex: SingleShaderBindings::new(ShaderFrequency::Vertex),
            pixel: SingleShaderBindings::new(ShaderFrequency::Pixel),
        }
    }
}

/// A fully built draw for one mesh batch
#[derive(Debug, Clone)]
pub struct MeshDrawCommand {
    pub vertex_shader: Arc<CompiledShader>,
    pub pixel_shader: Arc<CompiledShader>,
    pub shader_bindings: MeshDrawShaderBindings,
    pub vertex_factory: VertexFactoryType,
    pub material_proxy_id: MaterialProxyId,
    pub material_resource_id: MaterialResourceId,
    pub fill_mode: FillMode,
    pub cull_mode: CullMode,
    pub pass_state: PassRenderState,
    pub sort_key: MeshDrawCommandSortKey,
    pub elements: Vec<MeshBatchElement>,
    pub primitive_id: PrimitiveId,
    pub static_mesh_id: Option<StaticMeshId>,
}

impl MeshDrawCommand {
    /// Total triangles over all instances of all elements.
    pub fn primitive_count(&self) -> u64 {
        self.elements
            .iter()
            .map(|e| e.num_primitives as u64 * e.num_instances as u64)
            .sum()
    }
}
