//! Shader platforms, compiled shaders and per-material shader maps
//!
//! Shaders are compiled per (shader type, vertex factory) permutation by the
//! [`ShaderLibrary`]. Each compiled stage carries the parameter map reflected
//! from its entry point, which is what shader binding consults.

mod capture_shaders;
mod library;

pub use capture_shaders::*;
pub use library::*;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::resources::{MaterialResource, VertexFactoryFilter, VertexFactoryType};

/// Shader platform a permutation is compiled for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderPlatform {
    Gles31,
    VulkanEs31Android,
    MetalIos,
    MetalEs31,
    Sm5,
    Sm6,
    VulkanSm5,
    MetalSm5,
}

impl ShaderPlatform {
    pub fn is_mobile(self) -> bool {
        matches!(
            self,
            ShaderPlatform::Gles31
                | ShaderPlatform::VulkanEs31Android
                | ShaderPlatform::MetalIos
                | ShaderPlatform::MetalEs31
        )
    }
}

/// Pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderFrequency {
    Vertex,
    Pixel,
}

impl ShaderFrequency {
    pub fn naga_stage(self) -> naga::ShaderStage {
        match self {
            ShaderFrequency::Vertex => naga::ShaderStage::Vertex,
            ShaderFrequency::Pixel => naga::ShaderStage::Fragment,
        }
    }
}

/// Mesh material shader types known to the library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderType {
    CapturePassVs,
    CapturePassPs,
}

impl ShaderType {
    pub const ALL: [ShaderType; 2] = [ShaderType::CapturePassVs, ShaderType::CapturePassPs];

    pub fn name(self) -> &'static str {
        match self {
            ShaderType::CapturePassVs => "CapturePassVs",
            ShaderType::CapturePassPs => "CapturePassPs",
        }
    }

    pub fn frequency(self) -> ShaderFrequency {
        match self {
            ShaderType::CapturePassVs => ShaderFrequency::Vertex,
            ShaderType::CapturePassPs => ShaderFrequency::Pixel,
        }
    }

    pub fn entry_point(self) -> &'static str {
        match self {
            ShaderType::CapturePassVs => "main_vs",
            ShaderType::CapturePassPs => "main_ps",
        }
    }

    /// Whether this permutation should exist at all.
    pub fn should_compile_permutation(
        self,
        parameters: &PermutationParameters,
        filter: &VertexFactoryFilter,
    ) -> bool {
        match self {
            ShaderType::CapturePassVs => CapturePassVs::should_compile_permutation(parameters, filter),
            ShaderType::CapturePassPs => CapturePassPs::should_compile_permutation(parameters, filter),
        }
    }
}

/// Input to a permutation decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermutationParameters {
    pub platform: ShaderPlatform,
    pub vertex_factory: Option<VertexFactoryType>,
}

/// Unique identity of a compiled shader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderId(pub u32);

impl ShaderId {
    /// Allocate a process-unique id.
    pub fn next() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Bind slot of a shader parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderParameter {
    pub group: u32,
    pub binding: u32,
}

/// Parameters a compiled stage actually uses, by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderParameterMap {
    parameters: HashMap<String, ShaderParameter>,
}

impl ShaderParameterMap {
    pub fn insert(&mut self, name: impl Into<String>, parameter: ShaderParameter) {
        self.parameters.insert(name.into(), parameter);
    }

    pub fn find(&self, name: &str) -> Option<ShaderParameter> {
        self.parameters.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parameters.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

/// One compiled permutation
#[derive(Debug)]
pub struct CompiledShader {
    pub id: ShaderId,
    pub shader_type: ShaderType,
    pub vertex_factory: VertexFactoryType,
    pub platform: ShaderPlatform,
    pub parameters: ShaderParameterMap,
    /// Pixel stage outputs a second color usable as a blend factor.
    pub writes_second_blend_source: bool,
}

impl CompiledShader {
    pub fn frequency(&self) -> ShaderFrequency {
        self.shader_type.frequency()
    }
}

/// Compiled permutations of one material
#[derive(Debug, Default)]
pub struct ShaderMap {
    shaders: HashMap<(ShaderType, VertexFactoryType), Arc<CompiledShader>>,
}

impl ShaderMap {
    pub fn insert(&mut self, shader: Arc<CompiledShader>) {
        self.shaders
            .insert((shader.shader_type, shader.vertex_factory), shader);
    }

    pub fn get(
        &self,
        shader_type: ShaderType,
        vertex_factory: VertexFactoryType,
    ) -> Option<&Arc<CompiledShader>> {
        self.shaders.get(&(shader_type, vertex_factory))
    }

    pub fn len(&self) -> usize {
        self.shaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shaders.is_empty()
    }
}

/// Looks up compiled shaders. Absence is a normal outcome.
pub trait ShaderResolver: Send + Sync {
    fn get_compiled_shader(
        &self,
        shader_type: ShaderType,
        vertex_factory: VertexFactoryType,
        material: &MaterialResource,
    ) -> Option<Arc<CompiledShader>>;
}

/// Resolves from the material's own shader map.
///
/// Vertex factories rejected by the filter resolve to `None` even if a stale
/// permutation is present in the map.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialShaderResolver {
    filter: VertexFactoryFilter,
}

impl MaterialShaderResolver {
    pub fn new(filter: VertexFactoryFilter) -> Self {
        Self { filter }
    }
}

impl ShaderResolver for MaterialShaderResolver {
    fn get_compiled_shader(
        &self,
        shader_type: ShaderType,
        vertex_factory: VertexFactoryType,
        material: &MaterialResource,
    ) -> Option<Arc<CompiledShader>> {
        if !self.filter.is_supported(Some(vertex_factory)) {
            return None;
        }
        material.shader_map().get(shader_type, vertex_factory).cloned()
    }
}
