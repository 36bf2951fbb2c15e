//! Capture pass vertex/pixel shader pair

use std::sync::Arc;

use crate::backend::UniformBufferHandle;
use crate::mesh_pass::SingleShaderBindings;
use crate::pipeline::PassRenderState;
use crate::resources::{MaterialRenderProxy, MaterialResource, MeshBatch, VertexFactoryFilter};
use crate::scene::{PrimitiveId, PrimitiveSceneProxy, StaticMeshId, ViewId};
use crate::shader::{CompiledShader, PermutationParameters, ShaderId, ShaderParameterMap};

/// WGSL source of the capture pass.
///
/// The vertex stage flattens geometry along the view's shadow direction onto
/// the plane `y = ShadowBaseHeight`.
pub const CAPTURE_PASS_SHADER: &str = r#"
struct View {
    view_proj: mat4x4<f32>,
    view_origin: vec4<f32>,
    viewport_size: vec4<f32>,
    shadow_direction: vec4<f32>,
}

struct BasePass {
    ambient_color: vec4<f32>,
}

struct Primitive {
    local_to_world: mat4x4<f32>,
    object_bounds: vec4<f32>,
}

struct Material {
    base_color: vec4<f32>,
    emissive: vec4<f32>,
}

@group(0) @binding(0) var<uniform> view: View;
@group(0) @binding(1) var<uniform> mobile_base_pass: BasePass;
@group(1) @binding(0) var<uniform> primitive: Primitive;
@group(2) @binding(0) var<uniform> material: Material;
@group(3) @binding(0) var<uniform> ShadowBaseHeight: f32;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) color: vec4<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
}

@vertex
fn main_vs(in: VertexInput) -> VertexOutput {
    let world = primitive.local_to_world * vec4<f32>(in.position, 1.0);
    let dir = view.shadow_direction.xyz;
    let t = (world.y - ShadowBaseHeight) / min(dir.y, -0.0001);
    let projected = world.xyz - dir * t;

    var out: VertexOutput;
    out.clip_position = view.view_proj * vec4<f32>(projected, 1.0);
    out.color = in.color;
    return out;
}

struct PixelOutput {
    @location(0) color: vec4<f32>,
    @location(0) @second_blend_source transmittance: vec4<f32>,
}

@fragment
fn main_ps(in: VertexOutput) -> PixelOutput {
    let lit = in.color * material.base_color;
    var out: PixelOutput;
    out.color = lit + material.emissive + mobile_base_pass.ambient_color * lit.a;
    out.transmittance = vec4<f32>(1.0 - lit.a);
    return out;
}
"#;

pub const VIEW_UNIFORM_PARAMETER: &str = "view";
pub const INSTANCED_VIEW_UNIFORM_PARAMETER: &str = "instanced_view";
pub const PASS_UNIFORM_PARAMETER: &str = "mobile_base_pass";
pub const PRIMITIVE_UNIFORM_PARAMETER: &str = "primitive";
pub const MATERIAL_UNIFORM_PARAMETER: &str = "material";
pub const SHADOW_BASE_HEIGHT_PARAMETER: &str = "ShadowBaseHeight";

/// Per-draw data every mesh material shader binds from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshMaterialElementData {
    /// Only set for dynamic (per-view) commands.
    pub view_id: Option<ViewId>,
    pub primitive_id: Option<PrimitiveId>,
    pub static_mesh_id: Option<StaticMeshId>,
    pub dithered_lod_transition: bool,
}

impl MeshMaterialElementData {
    pub fn initialize(
        view_id: Option<ViewId>,
        primitive: Option<&PrimitiveSceneProxy>,
        batch: &MeshBatch,
        static_mesh_id: Option<StaticMeshId>,
    ) -> Self {
        Self {
            view_id,
            primitive_id: primitive.map(|p| p.id()),
            static_mesh_id,
            dithered_lod_transition: batch.dithered_lod_transition && static_mesh_id.is_some(),
        }
    }
}

/// Element data handed to the capture pass shaders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShaderElementData {
    Base(MeshMaterialElementData),
    WithShadowBaseHeight {
        base: MeshMaterialElementData,
        shadow_base_height: f32,
    },
}

impl ShaderElementData {
    pub fn base(&self) -> &MeshMaterialElementData {
        match self {
            ShaderElementData::Base(base) => base,
            ShaderElementData::WithShadowBaseHeight { base, .. } => base,
        }
    }

    pub fn shadow_base_height(&self) -> Option<f32> {
        match self {
            ShaderElementData::Base(_) => None,
            ShaderElementData::WithShadowBaseHeight {
                shadow_base_height, ..
            } => Some(*shadow_base_height),
        }
    }
}

/// Generic mesh material binding.
///
/// Binds the view, pass, primitive and material uniform buffers for each of
/// them the stage actually uses.
pub fn bind_mesh_material(
    parameters: &ShaderParameterMap,
    primitive: Option<&PrimitiveSceneProxy>,
    material_proxy: &MaterialRenderProxy,
    material: &MaterialResource,
    draw_state: &PassRenderState,
    bindings: &mut SingleShaderBindings,
) {
    let mut bind = |name: &str, buffer: Option<UniformBufferHandle>| {
        if let (Some(parameter), Some(buffer)) = (parameters.find(name), buffer) {
            bindings.add_uniform_buffer(parameter, buffer);
        }
    };

    bind(VIEW_UNIFORM_PARAMETER, Some(draw_state.view_uniform_buffer));
    bind(
        INSTANCED_VIEW_UNIFORM_PARAMETER,
        Some(draw_state.instanced_view_uniform_buffer),
    );
    bind(PASS_UNIFORM_PARAMETER, draw_state.pass_uniform_buffer);
    bind(PRIMITIVE_UNIFORM_PARAMETER, primitive.map(|p| p.uniform_buffer()));
    bind(MATERIAL_UNIFORM_PARAMETER, Some(material.uniform_buffer));

    log::trace!(
        "Bound {} parameters for material '{}'",
        bindings.len(),
        material_proxy.name
    );
}

fn should_compile_capture_permutation(
    parameters: &PermutationParameters,
    filter: &VertexFactoryFilter,
) -> bool {
    parameters.platform.is_mobile() && filter.is_supported(parameters.vertex_factory)
}

/// Capture pass vertex shader
#[derive(Debug, Clone)]
pub struct CapturePassVs {
    shader: Arc<CompiledShader>,
}

impl CapturePassVs {
    pub fn should_compile_permutation(
        parameters: &PermutationParameters,
        filter: &VertexFactoryFilter,
    ) -> bool {
        should_compile_capture_permutation(parameters, filter)
    }

    pub fn new(shader: Arc<CompiledShader>) -> Self {
        Self { shader }
    }

    pub fn id(&self) -> ShaderId {
        self.shader.id
    }

    pub fn shader(&self) -> &Arc<CompiledShader> {
        &self.shader
    }

    /// Whether this permutation exposes the shadow height scalar.
    pub fn has_shadow_base_height(&self) -> bool {
        self.shader.parameters.contains(SHADOW_BASE_HEIGHT_PARAMETER)
    }

    pub fn get_shader_bindings(
        &self,
        primitive: Option<&PrimitiveSceneProxy>,
        material_proxy: &MaterialRenderProxy,
        material: &MaterialResource,
        draw_state: &PassRenderState,
        element_data: &ShaderElementData,
        bindings: &mut SingleShaderBindings,
    ) {
        bind_mesh_material(
            &self.shader.parameters,
            primitive,
            material_proxy,
            material,
            draw_state,
            bindings,
        );

        if let (Some(height), Some(parameter)) = (
            element_data.shadow_base_height(),
            self.shader.parameters.find(SHADOW_BASE_HEIGHT_PARAMETER),
        ) {
            bindings.add_float(parameter, height);
        }
    }
}

/// Capture pass pixel shader
#[derive(Debug, Clone)]
pub struct CapturePassPs {
    shader: Arc<CompiledShader>,
}

impl CapturePassPs {
    pub fn should_compile_permutation(
        parameters: &PermutationParameters,
        filter: &VertexFactoryFilter,
    ) -> bool {
        should_compile_capture_permutation(parameters, filter)
    }

    pub fn new(shader: Arc<CompiledShader>) -> Self {
        Self { shader }
    }

    pub fn id(&self) -> ShaderId {
        self.shader.id
    }

    pub fn shader(&self) -> &Arc<CompiledShader> {
        &self.shader
    }

    /// Whether this permutation can feed a dual source blend state.
    pub fn writes_second_blend_source(&self) -> bool {
        self.shader.writes_second_blend_source
    }

    pub fn get_shader_bindings(
        &self,
        primitive: Option<&PrimitiveSceneProxy>,
        material_proxy: &MaterialRenderProxy,
        material: &MaterialResource,
        draw_state: &PassRenderState,
        _element_data: &MeshMaterialElementData,
        bindings: &mut SingleShaderBindings,
    ) {
        bind_mesh_material(
            &self.shader.parameters,
            primitive,
            material_proxy,
            material,
            draw_state,
            bindings,
        );
    }
}

/// The resolved shader pair of one draw
#[derive(Debug, Clone)]
pub struct CapturePassShaders {
    pub vertex: CapturePassVs,
    pub pixel: CapturePassPs,
}
