//! Mobile rendering pipeline
//!
//! The renderer gathers relevance per view, builds the capture pass draw
//! lists (through the command cache for static meshes) and runs the capture
//! pass orchestrator:
//! 1. Relevance - decides which views have capture primitives
//! 2. Mesh pass setup - selects batches and builds sorted draw lists
//! 3. Capture pass - target transitions, render pass, per-view dispatch

pub mod capture_pass;
pub mod orchestrator;
pub mod selector;

pub use capture_pass::*;
pub use orchestrator::*;
pub use selector::*;

use std::sync::Arc;

use crate::backend::{CaptureTargetAllocator, RhiCommandList};
use crate::error::CaptureResult;
use crate::mesh_pass::{
    CachedCommandKey, CachedMeshDrawCommands, MeshPass, MeshPassFlags, MeshPassProcessor,
    PassProcessorRegistry,
};
use crate::resources::ALL_ELEMENTS;
use crate::scene::{PrimitiveId, PrimitiveSceneProxy, SceneInfo, ViewInfo};
use crate::shader::{MaterialShaderResolver, ShaderResolver};
use crate::CapturePassConfig;

/// Frame driver for the mobile shading path
#[derive(Debug)]
pub struct MobileSceneRenderer {
    config: CapturePassConfig,
    registry: PassProcessorRegistry,
    cached_commands: CachedMeshDrawCommands,
    orchestrator: CapturePassOrchestrator,
}

impl MobileSceneRenderer {
    pub fn new(config: CapturePassConfig, resolver: Arc<dyn ShaderResolver>) -> CaptureResult<Self> {
        let mut registry = PassProcessorRegistry::new();
        register_custom_capture_pass(&mut registry, &config, resolver)?;

        let orchestrator = CapturePassOrchestrator::new(config.view_pass_mode, config.clear_color);
        Ok(Self {
            config,
            registry,
            cached_commands: CachedMeshDrawCommands::new(),
            orchestrator,
        })
    }

    /// Renderer resolving shaders from each material's shader map.
    pub fn with_material_shaders(config: CapturePassConfig) -> CaptureResult<Self> {
        let resolver = Arc::new(MaterialShaderResolver::new(config.vertex_factory_filter()));
        Self::new(config, resolver)
    }

    pub fn config(&self) -> &CapturePassConfig {
        &self.config
    }

    pub fn registry(&self) -> &PassProcessorRegistry {
        &self.registry
    }

    /// Static mesh command cache; invalidate it when scene content changes.
    pub fn cached_commands(&self) -> &CachedMeshDrawCommands {
        &self.cached_commands
    }

    pub fn orchestrator(&self) -> &CapturePassOrchestrator {
        &self.orchestrator
    }

    /// Remove a primitive from `scene` together with its cached draw commands.
    pub fn remove_primitive(
        &self,
        scene: &mut SceneInfo,
        id: PrimitiveId,
    ) -> Option<Arc<PrimitiveSceneProxy>> {
        let removed = scene.remove_primitive(id)?;
        let invalidated = self.cached_commands.invalidate_primitive(id);
        log::trace!("Removed {:?} and {} cached command entries", id, invalidated);
        Some(removed)
    }

    /// Build the capture pass draw list of `view`.
    pub fn setup_mesh_pass(&self, scene: &SceneInfo, view: &mut ViewInfo) {
        let pass = MeshPass::CustomCapturePass;
        let Some(flags) = self.registry.flags(scene.shading_path, pass) else {
            return;
        };
        let Some(dynamic) = self
            .registry
            .create_processor(scene.shading_path, pass, scene, Some(view.id()))
        else {
            return;
        };
        let cached: Option<Box<dyn MeshPassProcessor>> =
            if self.config.cached_mesh_commands && flags.contains(MeshPassFlags::CACHED_MESH_COMMANDS) {
                self.registry.create_processor(scene.shading_path, pass, scene, None)
            } else {
                None
            };

        let mut batches = Vec::new();
        for &id in view.visible_primitives() {
            let Some(proxy) = scene.primitive(id) else {
                continue;
            };
            if !view.primitive_relevance(id).is_some_and(|r| r.draw_relevance) {
                continue;
            }
            for (index, batch) in proxy.mesh_batches().iter().enumerate() {
                batches.push(MeshBatchAndRelevance {
                    batch,
                    element_mask: ALL_ELEMENTS,
                    primitive: Some(proxy.as_ref()),
                    static_mesh_id: proxy.is_static.then(|| proxy.static_mesh_id(index)),
                });
            }
        }

        let cache = &self.cached_commands;
        let list = build_draw_list(&batches, self.config.parallel_build, |item| {
            let mut commands = Vec::new();
            match (&cached, item.static_mesh_id) {
                (Some(processor), Some(static_mesh)) => {
                    let key = CachedCommandKey {
                        static_mesh,
                        material_proxy: item.batch.material.id(),
                    };
                    let built = cache.get_or_build(key, |out| {
                        processor.add_mesh_batch(
                            item.batch,
                            item.element_mask,
                            item.primitive,
                            item.static_mesh_id,
                            out,
                        )
                    });
                    commands.extend(built.iter().cloned());
                }
                _ => dynamic.add_mesh_batch(
                    item.batch,
                    item.element_mask,
                    item.primitive,
                    item.static_mesh_id,
                    &mut commands,
                ),
            }
            commands
        });

        log::trace!(
            "View {:?}: {} capture commands from {} batches",
            view.id(),
            list.len(),
            batches.len()
        );
        *view.draw_list_mut(pass) = list;
    }

    /// Render one frame of the capture pass.
    ///
    /// Views that opt out of rendering are not set up at all.
    pub fn render_frame(
        &mut self,
        scene: &mut SceneInfo,
        views: &mut [ViewInfo],
        allocator: &mut dyn CaptureTargetAllocator,
        cmd: &mut dyn RhiCommandList,
    ) -> CapturePassOutcome {
        for view in views.iter_mut() {
            view.reset_draw_lists();
            view.gather_relevance(scene.primitives());
        }

        if CapturePassOrchestrator::has_capture_primitives(scene, views) {
            for view in views.iter_mut() {
                if view.should_render_view() && view.has_custom_capture_primitives {
                    self.setup_mesh_pass(scene, view);
                }
            }
        }

        self.orchestrator
            .render_custom_capture_pass(cmd, allocator, scene, views)
    }
}
