//! Per-frame driver of the capture pass
//!
//! Requests the capture target, brackets the render pass with the two target
//! transitions and dispatches each view's prebuilt draw list.

use crate::backend::{
    CaptureTargetAllocator, LoadOp, RenderPassInfo, ResourceAccess, RhiCommandList, StoreOp,
    TextureHandle,
};
use crate::mesh_pass::{MeshDrawCommand, MeshPass};
use crate::scene::{SceneInfo, ViewInfo};

pub const CUSTOM_CAPTURE_PASS_LABEL: &str = "CustomCaptureRendering";

/// How views share the capture target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewPassMode {
    /// One render pass for all views, cleared once.
    #[default]
    Combined,
    /// One render pass per view. The first clears, later ones load.
    PerView,
}

/// Orchestrator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturePassPhase {
    Idle,
    TargetRequested,
    TargetAbsent,
    TargetPresent,
    TransitioningIn,
    RenderPassOpen,
    Dispatching,
    RenderPassClose,
    TransitioningOut,
}

/// Why a frame rendered nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The scene's world never renders the pass.
    WorldExcluded,
    /// No view has custom capture primitives.
    NoCapturePrimitives,
    /// Primitives exist but the allocator handed out no target.
    TargetUnavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CapturePassStats {
    pub views_rendered: usize,
    pub views_skipped: usize,
    pub render_passes: usize,
    pub draws: usize,
    /// Triangles submitted, over all instances.
    pub primitives: u64,
    pub uniform_updates: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturePassOutcome {
    Skipped(SkipReason),
    Rendered(CapturePassStats),
}

impl CapturePassOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, CapturePassOutcome::Rendered(_))
    }

    pub fn stats(&self) -> Option<&CapturePassStats> {
        match self {
            CapturePassOutcome::Rendered(stats) => Some(stats),
            CapturePassOutcome::Skipped(_) => None,
        }
    }
}

/// Runs the capture pass state machine once per frame.
#[derive(Debug)]
pub struct CapturePassOrchestrator {
    mode: ViewPassMode,
    clear_color: [f32; 4],
    phase: CapturePassPhase,
    history: Vec<CapturePassPhase>,
}

impl CapturePassOrchestrator {
    pub fn new(mode: ViewPassMode, clear_color: [f32; 4]) -> Self {
        Self {
            mode,
            clear_color,
            phase: CapturePassPhase::Idle,
            history: Vec::new(),
        }
    }

    pub fn mode(&self) -> ViewPassMode {
        self.mode
    }

    pub fn phase(&self) -> CapturePassPhase {
        self.phase
    }

    /// Phases entered during the last frame, starting after `Idle`.
    pub fn history(&self) -> &[CapturePassPhase] {
        &self.history
    }

    fn enter(&mut self, phase: CapturePassPhase) {
        log::trace!("Capture pass: {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
        self.history.push(phase);
    }

    /// Whether any view wants the pass, honoring world gating.
    pub fn has_capture_primitives(scene: &SceneInfo, views: &[ViewInfo]) -> bool {
        scene.allows_custom_capture() && views.iter().any(|v| v.has_custom_capture_primitives)
    }

    pub fn render_custom_capture_pass(
        &mut self,
        cmd: &mut dyn RhiCommandList,
        allocator: &mut dyn CaptureTargetAllocator,
        scene: &mut SceneInfo,
        views: &[ViewInfo],
    ) -> CapturePassOutcome {
        debug_assert_eq!(self.phase, CapturePassPhase::Idle, "capture pass re-entered");
        self.history.clear();

        let has_primitives = Self::has_capture_primitives(scene, views);
        self.enter(CapturePassPhase::TargetRequested);
        let textures = allocator.request_custom_capture(has_primitives);

        let Some(target) = textures.custom_color else {
            self.enter(CapturePassPhase::TargetAbsent);
            self.enter(CapturePassPhase::Idle);
            let reason = if !scene.allows_custom_capture() {
                SkipReason::WorldExcluded
            } else if !has_primitives {
                SkipReason::NoCapturePrimitives
            } else {
                SkipReason::TargetUnavailable
            };
            log::debug!("Capture pass skipped: {:?}", reason);
            return CapturePassOutcome::Skipped(reason);
        };
        self.enter(CapturePassPhase::TargetPresent);

        self.enter(CapturePassPhase::TransitioningIn);
        cmd.transition(target, ResourceAccess::ShaderResource, ResourceAccess::RenderTarget);

        let stats = match self.mode {
            ViewPassMode::Combined => self.dispatch_combined(cmd, target, scene, views),
            ViewPassMode::PerView => self.dispatch_per_view(cmd, target, scene, views),
        };

        self.enter(CapturePassPhase::TransitioningOut);
        cmd.transition(target, ResourceAccess::RenderTarget, ResourceAccess::ShaderResource);
        self.enter(CapturePassPhase::Idle);

        log::debug!(
            "Capture pass rendered {} views ({} skipped), {} draws, {} triangles",
            stats.views_rendered,
            stats.views_skipped,
            stats.draws,
            stats.primitives
        );
        CapturePassOutcome::Rendered(stats)
    }

    fn pass_info(&self, target: TextureHandle, load_op: LoadOp) -> RenderPassInfo {
        RenderPassInfo {
            label: CUSTOM_CAPTURE_PASS_LABEL.to_string(),
            color_target: target,
            load_op,
            store_op: StoreOp::Store,
        }
    }

    fn dispatch_combined(
        &mut self,
        cmd: &mut dyn RhiCommandList,
        target: TextureHandle,
        scene: &mut SceneInfo,
        views: &[ViewInfo],
    ) -> CapturePassStats {
        let mut stats = CapturePassStats::default();

        self.enter(CapturePassPhase::RenderPassOpen);
        cmd.begin_render_pass(&self.pass_info(target, LoadOp::Clear(self.clear_color)));
        stats.render_passes += 1;

        self.enter(CapturePassPhase::Dispatching);
        for view in views {
            if !view.should_render_view() {
                stats.views_skipped += 1;
                continue;
            }
            dispatch_view(cmd, scene, view, &mut stats);
        }

        self.enter(CapturePassPhase::RenderPassClose);
        cmd.end_render_pass();
        stats
    }

    fn dispatch_per_view(
        &mut self,
        cmd: &mut dyn RhiCommandList,
        target: TextureHandle,
        scene: &mut SceneInfo,
        views: &[ViewInfo],
    ) -> CapturePassStats {
        let mut stats = CapturePassStats::default();

        for view in views {
            if !view.should_render_view() {
                stats.views_skipped += 1;
                continue;
            }

            // Only the first pass clears the shared target
            let load_op = if stats.render_passes == 0 {
                LoadOp::Clear(self.clear_color)
            } else {
                LoadOp::Load
            };

            self.enter(CapturePassPhase::RenderPassOpen);
            cmd.begin_render_pass(&self.pass_info(target, load_op));
            stats.render_passes += 1;

            self.enter(CapturePassPhase::Dispatching);
            dispatch_view(cmd, scene, view, &mut stats);

            self.enter(CapturePassPhase::RenderPassClose);
            cmd.end_render_pass();
        }
        stats
    }
}

impl Default for CapturePassOrchestrator {
    fn default() -> Self {
        Self::new(ViewPassMode::default(), [0.0, 0.0, 0.0, 0.0])
    }
}

fn dispatch_view(
    cmd: &mut dyn RhiCommandList,
    scene: &mut SceneInfo,
    view: &ViewInfo,
    stats: &mut CapturePassStats,
) {
    let buffers = &mut scene.uniform_buffers;
    if buffers.update_view_uniform_buffer(view) {
        let view_data = bytemuck::bytes_of(&view.uniform_parameters);
        cmd.update_uniform_buffer(buffers.view_uniform_buffer, view_data);
        cmd.update_uniform_buffer(buffers.instanced_view_uniform_buffer, view_data);
        cmd.update_uniform_buffer(
            buffers.mobile_opaque_base_pass_uniform_buffer,
            bytemuck::bytes_of(&buffers.opaque_base_pass),
        );
        cmd.update_uniform_buffer(
            buffers.mobile_translucent_base_pass_uniform_buffer,
            bytemuck::bytes_of(&buffers.translucent_base_pass),
        );
        stats.uniform_updates += 1;
    }

    cmd.set_viewport(view.rect().to_viewport());
    if let Some(list) = view.draw_list(MeshPass::CustomCapturePass) {
        stats.draws += list.dispatch_draw(cmd);
        stats.primitives += list
            .commands()
            .iter()
            .map(MeshDrawCommand::primitive_count)
            .sum::<u64>();
    }
    stats.views_rendered += 1;
}
