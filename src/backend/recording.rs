//! Recording command list for testing and debugging.
//!
//! This backend doesn't talk to a GPU. Every call is appended to a command log
//! that can be inspected afterwards, which makes pass behavior observable
//! without hardware.

use crate::backend::traits::*;
use crate::backend::types::*;
use crate::mesh_pass::{MeshDrawCommand, MeshDrawCommandSortKey};
use crate::scene::PrimitiveId;

/// A single recorded command list call.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCommand {
    Transition {
        texture: TextureHandle,
        from: ResourceAccess,
        to: ResourceAccess,
    },
    BeginRenderPass(RenderPassInfo),
    EndRenderPass,
    SetViewport(Viewport),
    UpdateUniformBuffer {
        buffer: UniformBufferHandle,
        size: usize,
    },
    Draw {
        primitive: PrimitiveId,
        sort_key: MeshDrawCommandSortKey,
        blend: BlendState,
        elements: usize,
    },
}

/// Command list that records calls instead of executing them.
#[derive(Debug, Default)]
pub struct RecordingCommandList {
    commands: Vec<RecordedCommand>,
    render_pass_open: bool,
}

impl RecordingCommandList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the backend name.
    pub fn name(&self) -> &'static str {
        "Recording"
    }

    /// All recorded calls in submission order.
    pub fn commands(&self) -> &[RecordedCommand] {
        &self.commands
    }

    /// Drop the recorded log (e.g. between frames).
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn is_render_pass_open(&self) -> bool {
        self.render_pass_open
    }

    pub fn render_passes(&self) -> impl Iterator<Item = &RenderPassInfo> {
        self.commands.iter().filter_map(|c| match c {
            RecordedCommand::BeginRenderPass(info) => Some(info),
            _ => None,
        })
    }

    pub fn transitions(&self) -> impl Iterator<Item = &RecordedCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, RecordedCommand::Transition { .. }))
    }

    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, RecordedCommand::Draw { .. }))
            .count()
    }

    pub fn viewports(&self) -> Vec<Viewport> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                RecordedCommand::SetViewport(v) => Some(*v),
                _ => None,
            })
            .collect()
    }
}

impl RhiCommandList for RecordingCommandList {
    fn transition(&mut self, texture: TextureHandle, from: ResourceAccess, to: ResourceAccess) {
        log::trace!("RecordingCommandList: transition {:?} {:?} -> {:?}", texture, from, to);
        self.commands
            .push(RecordedCommand::Transition { texture, from, to });
    }

    fn begin_render_pass(&mut self, info: &RenderPassInfo) {
        debug_assert!(!self.render_pass_open, "render pass already open");
        log::trace!("RecordingCommandList: begin render pass '{}'", info.label);
        self.render_pass_open = true;
        self.commands
            .push(RecordedCommand::BeginRenderPass(info.clone()));
    }

    fn end_render_pass(&mut self) {
        debug_assert!(self.render_pass_open, "no render pass open");
        self.render_pass_open = false;
        self.commands.push(RecordedCommand::EndRenderPass);
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.commands.push(RecordedCommand::SetViewport(viewport));
    }

    fn update_uniform_buffer(&mut self, buffer: UniformBufferHandle, data: &[u8]) {
        self.commands.push(RecordedCommand::UpdateUniformBuffer {
            buffer,
            size: data.len(),
        });
    }

    fn draw_mesh_command(&mut self, command: &MeshDrawCommand) {
        debug_assert!(self.render_pass_open, "draw outside of a render pass");
        self.commands.push(RecordedCommand::Draw {
            primitive: command.primitive_id,
            sort_key: command.sort_key,
            blend: command.pass_state.blend_state,
            elements: command.elements.len(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_render_pass_bracket() {
        let mut cmd = RecordingCommandList::new();
        let target = TextureHandle::new(7);

        cmd.transition(target, ResourceAccess::ShaderResource, ResourceAccess::RenderTarget);
        cmd.begin_render_pass(&RenderPassInfo {
            label: "test".into(),
            color_target: target,
            load_op: LoadOp::Clear([0.0; 4]),
            store_op: StoreOp::Store,
        });
        assert!(cmd.is_render_pass_open());
        cmd.end_render_pass();
        assert!(!cmd.is_render_pass_open());

        assert_eq!(cmd.commands().len(), 3);
        assert_eq!(cmd.transitions().count(), 1);
        assert_eq!(cmd.render_passes().count(), 1);
        assert_eq!(cmd.name(), "Recording");
    }
}
