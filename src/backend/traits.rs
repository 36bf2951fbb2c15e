//! Collaborator traits the capture pass talks to
//!
//! The pass never owns GPU objects. It records work through [`RhiCommandList`]
//! and asks a [`CaptureTargetAllocator`] for its color target once per frame.

use crate::backend::types::*;
use crate::mesh_pass::MeshDrawCommand;

/// Handle to a GPU texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub(crate) u64);

impl TextureHandle {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Handle to a GPU uniform buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformBufferHandle(pub(crate) u64);

impl UniformBufferHandle {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Render pass with a single color attachment and no depth
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPassInfo {
    pub label: String,
    pub color_target: TextureHandle,
    pub load_op: LoadOp,
    pub store_op: StoreOp,
}

/// Capture textures handed out for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CustomCaptureTextures {
    pub custom_color: Option<TextureHandle>,
}

/// Decides whether the capture color target exists for the current frame.
pub trait CaptureTargetAllocator {
    /// Called once per frame. When `has_primitives` is false the allocator
    /// should not allocate and may release a previously held target.
    fn request_custom_capture(&mut self, has_primitives: bool) -> CustomCaptureTextures;
}

/// Immediate command list the pass records into.
///
/// Not safe to append to from several threads; dispatch is sequential.
pub trait RhiCommandList {
    /// Move a texture between access states
    fn transition(&mut self, texture: TextureHandle, from: ResourceAccess, to: ResourceAccess);

    /// Begin a render pass
    fn begin_render_pass(&mut self, info: &RenderPassInfo);

    /// End the current render pass
    fn end_render_pass(&mut self);

    /// Set viewport
    fn set_viewport(&mut self, viewport: Viewport);

    /// Upload new contents for a uniform buffer
    fn update_uniform_buffer(&mut self, buffer: UniformBufferHandle, data: &[u8]);

    /// Submit one built mesh draw command (all of its elements)
    fn draw_mesh_command(&mut self, command: &MeshDrawCommand);
}
