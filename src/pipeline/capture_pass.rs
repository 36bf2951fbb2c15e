//! Custom capture pass processor
//!
//! Selects eligible mesh batches, resolves the capture shader pair for the
//! batch's vertex factory and builds a sort-keyed [`MeshDrawCommand`].

use std::sync::Arc;

use rayon::prelude::*;

use crate::backend::{CullMode, FillMode};
use crate::error::CaptureResult;
use crate::mesh_pass::{
    MeshDrawCommand, MeshDrawCommandList, MeshDrawCommandSortKey, MeshDrawShaderBindings,
    MeshPass, MeshPassDrawListContext, MeshPassFlags, MeshPassProcessor, PassProcessorRegistry,
};
use crate::pipeline::{MeshBatchSelector, PassRenderState};
use crate::resources::{BatchElementMask, FeatureLevel, MaterialRenderProxy, MaterialResource, MeshBatch};
use crate::scene::{PrimitiveSceneProxy, SceneInfo, SceneUniformBuffers, ShadingPath, StaticMeshId, ViewId};
use crate::shader::{
    CapturePassPs, CapturePassShaders, CapturePassVs, MeshMaterialElementData, ShaderElementData,
    ShaderResolver, ShaderType,
};
use crate::CapturePassConfig;

/// Rasterizer overrides requested by a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MeshOverrideSettings {
    pub two_sided: bool,
    pub reverse_culling: bool,
    pub wireframe: bool,
    pub dithered_lod_transition: bool,
}

impl MeshOverrideSettings {
    pub fn compute(batch: &MeshBatch) -> Self {
        Self {
            two_sided: batch.disable_backface_culling,
            reverse_culling: batch.reverse_culling,
            wireframe: batch.wireframe,
            dithered_lod_transition: batch.dithered_lod_transition,
        }
    }

    pub fn fill_mode(&self, material: &MaterialResource) -> FillMode {
        if material.wireframe || self.wireframe {
            FillMode::Wireframe
        } else {
            FillMode::Solid
        }
    }

    pub fn cull_mode(&self, material: &MaterialResource) -> CullMode {
        if material.two_sided || self.two_sided {
            CullMode::None
        } else if self.reverse_culling {
            CullMode::Ccw
        } else {
            CullMode::Cw
        }
    }
}

/// Builds capture pass draw commands for one scene.
///
/// With a view id the commands are dynamic and only valid for that view;
/// without one they can be cached across frames.
pub struct CapturePassProcessor {
    feature_level: FeatureLevel,
    view_id: Option<ViewId>,
    base_state: PassRenderState,
    uniform_buffers: SceneUniformBuffers,
    selector: MeshBatchSelector,
    resolver: Arc<dyn ShaderResolver>,
    bind_shadow_base_height: bool,
}

impl CapturePassProcessor {
    pub fn new(
        scene: &SceneInfo,
        view_id: Option<ViewId>,
        config: &CapturePassConfig,
        resolver: Arc<dyn ShaderResolver>,
    ) -> Self {
        let uniform_buffers = scene.uniform_buffers.clone();
        let base_state = PassRenderState::new(
            uniform_buffers.view_uniform_buffer,
            uniform_buffers.instanced_view_uniform_buffer,
        );
        Self {
            feature_level: scene.feature_level,
            view_id,
            base_state,
            uniform_buffers,
            selector: MeshBatchSelector::new(config.material_domains),
            resolver,
            bind_shadow_base_height: config.shadow_base_height,
        }
    }

    pub fn base_state(&self) -> &PassRenderState {
        &self.base_state
    }

    pub fn selector(&self) -> &MeshBatchSelector {
        &self.selector
    }

    pub fn view_id(&self) -> Option<ViewId> {
        self.view_id
    }

    /// Both capture shaders for the batch's vertex factory, or `None` if
    /// either permutation does not exist.
    pub fn resolve_shaders(&self, batch: &MeshBatch, material: &MaterialResource) -> Option<CapturePassShaders> {
        let vertex_factory = batch.vertex_factory();
        let vertex = self
            .resolver
            .get_compiled_shader(ShaderType::CapturePassVs, vertex_factory, material)?;
        let pixel = self
            .resolver
            .get_compiled_shader(ShaderType::CapturePassPs, vertex_factory, material)?;
        Some(CapturePassShaders {
            vertex: CapturePassVs::new(vertex),
            pixel: CapturePassPs::new(pixel),
        })
    }

    /// Build the draw command of an already selected batch.
    #[allow(clippy::too_many_arguments)]
    pub fn process(
        &self,
        batch: &MeshBatch,
        element_mask: BatchElementMask,
        static_mesh_id: Option<StaticMeshId>,
        primitive: &PrimitiveSceneProxy,
        material_proxy: &MaterialRenderProxy,
        material: &MaterialResource,
        pass_state: &PassRenderState,
    ) -> Option<MeshDrawCommand> {
        let Some(shaders) = self.resolve_shaders(batch, material) else {
            log::trace!(
                "No capture shaders for {:?} in '{}', dropping batch of {}",
                batch.vertex_factory(),
                material.name,
                primitive.name
            );
            return None;
        };

        if pass_state.blend_state.uses_dual_source() && !shaders.pixel.writes_second_blend_source() {
            log::trace!(
                "Pixel shader of '{}' has no second blend source, dropping translucent batch of {}",
                material.name,
                primitive.name
            );
            return None;
        }

        let elements = batch.selected_elements(element_mask);
        if elements.is_empty() {
            return None;
        }

        let overrides = MeshOverrideSettings::compute(batch);
        let fill_mode = overrides.fill_mode(material);
        let cull_mode = overrides.cull_mode(material);

        let base = MeshMaterialElementData::initialize(self.view_id, Some(primitive), batch, static_mesh_id);
        let element_data = if self.bind_shadow_base_height {
            ShaderElementData::WithShadowBaseHeight {
                base,
                shadow_base_height: primitive.planar_shadow_base_height(),
            }
        } else {
            ShaderElementData::Base(base)
        };

        let sort_key = MeshDrawCommandSortKey::from_shaders(shaders.vertex.id(), shaders.pixel.id());

        let mut shader_bindings = MeshDrawShaderBindings::default();
        shaders.vertex.get_shader_bindings(
            Some(primitive),
            material_proxy,
            material,
            pass_state,
            &element_data,
            &mut shader_bindings.vertex,
        );
        shaders.pixel.get_shader_bindings(
            Some(primitive),
            material_proxy,
            material,
            pass_state,
            element_data.base(),
            &mut shader_bindings.pixel,
        );

        Some(MeshDrawCommand {
            vertex_shader: shaders.vertex.shader().clone(),
            pixel_shader: shaders.pixel.shader().clone(),
            shader_bindings,
            vertex_factory: batch.vertex_factory(),
            material_proxy_id: material_proxy.id(),
            material_resource_id: material.id(),
            fill_mode,
            cull_mode,
            pass_state: *pass_state,
            sort_key,
            elements,
            primitive_id: primitive.id(),
            static_mesh_id,
        })
    }

    /// Resolve the batch material, select, and build.
    pub fn build_mesh_batch(
        &self,
        batch: &MeshBatch,
        element_mask: BatchElementMask,
        primitive: Option<&PrimitiveSceneProxy>,
        static_mesh_id: Option<StaticMeshId>,
    ) -> Option<MeshDrawCommand> {
        let Some((material_proxy, material)) = batch.material.material_with_fallback(self.feature_level) else {
            log::trace!(
                "Material '{}' has no resource for {:?}",
                batch.material.name,
                self.feature_level
            );
            return None;
        };

        if !self.selector.is_eligible(batch, primitive, material) {
            return None;
        }
        let primitive = primitive?;

        let pass_state = self
            .selector
            .select_pass_state(&self.base_state, material, &self.uniform_buffers);
        self.process(
            batch,
            element_mask,
            static_mesh_id,
            primitive,
            material_proxy,
            material,
            &pass_state,
        )
    }
}

impl MeshPassProcessor for CapturePassProcessor {
    fn mesh_pass(&self) -> MeshPass {
        MeshPass::CustomCapturePass
    }

    fn add_mesh_batch(
        &self,
        batch: &MeshBatch,
        element_mask: BatchElementMask,
        primitive: Option<&PrimitiveSceneProxy>,
        static_mesh_id: Option<StaticMeshId>,
        context: &mut dyn MeshPassDrawListContext,
    ) {
        if let Some(command) = self.build_mesh_batch(batch, element_mask, primitive, static_mesh_id) {
            context.finalize_command(command);
        }
    }
}

/// Register the capture pass processor for the mobile shading path.
pub fn register_custom_capture_pass(
    registry: &mut PassProcessorRegistry,
    config: &CapturePassConfig,
    resolver: Arc<dyn ShaderResolver>,
) -> CaptureResult<()> {
    let config = config.clone();
    registry.register(
        ShadingPath::Mobile,
        MeshPass::CustomCapturePass,
        MeshPassFlags::CACHED_MESH_COMMANDS | MeshPassFlags::MAIN_VIEW,
        Arc::new(
            move |scene: &SceneInfo, view: Option<ViewId>| -> Box<dyn MeshPassProcessor> {
                Box::new(CapturePassProcessor::new(scene, view, &config, resolver.clone()))
            },
        ),
    )
}

/// One batch queued for command building
#[derive(Debug, Clone, Copy)]
pub struct MeshBatchAndRelevance<'a> {
    pub batch: &'a MeshBatch,
    pub element_mask: BatchElementMask,
    pub primitive: Option<&'a PrimitiveSceneProxy>,
    pub static_mesh_id: Option<StaticMeshId>,
}

/// Build a sorted draw list from `batches` using `build` for each.
///
/// In parallel mode batches are built on the rayon pool. Either way the list
/// holds commands in submission order before the stable sort.
pub fn build_draw_list<F>(batches: &[MeshBatchAndRelevance<'_>], parallel: bool, build: F) -> MeshDrawCommandList
where
    F: Fn(&MeshBatchAndRelevance<'_>) -> Vec<MeshDrawCommand> + Sync,
{
    let per_batch: Vec<Vec<MeshDrawCommand>> = if parallel {
        batches.par_iter().map(&build).collect()
    } else {
        batches.iter().map(&build).collect()
    };

    let mut list = MeshDrawCommandList::new();
    list.extend(per_batch.into_iter().flatten());
    list.finish();
    list
}

/// Build the dynamic commands of one view with `processor`.
pub fn build_view_commands(
    processor: &dyn MeshPassProcessor,
    batches: &[MeshBatchAndRelevance<'_>],
    parallel: bool,
) -> MeshDrawCommandList {
    build_draw_list(batches, parallel, |item| {
        let mut commands = Vec::new();
        processor.add_mesh_batch(
            item.batch,
            item.element_mask,
            item.primitive,
            item.static_mesh_id,
            &mut commands,
        );
        commands
    })
}
