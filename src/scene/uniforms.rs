//! Scene-wide uniform buffers shared by mesh passes

use bytemuck::{Pod, Zeroable};
use glam::Vec4;

use crate::backend::UniformBufferHandle;
use crate::scene::{ViewInfo, ViewUniformParameters};

/// Mobile base pass uniform data for GPU
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MobileBasePassUniformParameters {
    pub ambient_color: Vec4,
}

impl Default for MobileBasePassUniformParameters {
    fn default() -> Self {
        Self {
            ambient_color: Vec4::new(0.03, 0.03, 0.03, 1.0),
        }
    }
}

/// Uniform buffers owned by the scene.
///
/// The view buffer is shared by every view, so its contents are swapped in
/// before each view is drawn.
#[derive(Debug, Clone)]
pub struct SceneUniformBuffers {
    pub view_uniform_buffer: UniformBufferHandle,
    pub instanced_view_uniform_buffer: UniformBufferHandle,
    pub mobile_opaque_base_pass_uniform_buffer: UniformBufferHandle,
    pub mobile_translucent_base_pass_uniform_buffer: UniformBufferHandle,
    pub opaque_base_pass: MobileBasePassUniformParameters,
    pub translucent_base_pass: MobileBasePassUniformParameters,
    cached_view_parameters: Option<ViewUniformParameters>,
}

impl SceneUniformBuffers {
    pub fn new(
        view_uniform_buffer: UniformBufferHandle,
        instanced_view_uniform_buffer: UniformBufferHandle,
        mobile_opaque_base_pass_uniform_buffer: UniformBufferHandle,
        mobile_translucent_base_pass_uniform_buffer: UniformBufferHandle,
    ) -> Self {
        Self {
            view_uniform_buffer,
            instanced_view_uniform_buffer,
            mobile_opaque_base_pass_uniform_buffer,
            mobile_translucent_base_pass_uniform_buffer,
            opaque_base_pass: MobileBasePassUniformParameters::default(),
            translucent_base_pass: MobileBasePassUniformParameters::default(),
            cached_view_parameters: None,
        }
    }

    /// Record `view` as the current contents of the view buffer.
    ///
    /// Returns true when the contents changed and the buffers need uploading.
    pub fn update_view_uniform_buffer(&mut self, view: &ViewInfo) -> bool {
        let parameters = view.uniform_parameters;
        let unchanged = self
            .cached_view_parameters
            .as_ref()
            .is_some_and(|cached| bytemuck::bytes_of(cached) == bytemuck::bytes_of(&parameters));
        if unchanged {
            return false;
        }
        self.cached_view_parameters = Some(parameters);
        true
    }

    /// Forget the cached contents so the next update always reports a change.
    pub fn invalidate_view_uniform_buffer(&mut self) {
        self.cached_view_parameters = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{IntRect, ViewId};
    use glam::{Mat4, Vec3};

    fn buffers() -> SceneUniformBuffers {
        SceneUniformBuffers::new(
            UniformBufferHandle::new(1),
            UniformBufferHandle::new(2),
            UniformBufferHandle::new(3),
            UniformBufferHandle::new(4),
        )
    }

    #[test]
    fn view_update_reports_changes_only() {
        let mut buffers = buffers();
        let rect = IntRect::new(0, 0, 64, 64).unwrap();
        let view = ViewInfo::new(ViewId(0), rect);

        assert!(buffers.update_view_uniform_buffer(&view));
        assert!(!buffers.update_view_uniform_buffer(&view));

        let moved = view.clone().with_uniform_parameters(ViewUniformParameters::new(
            Mat4::from_translation(Vec3::X),
            Vec3::X,
            &rect,
            Vec3::NEG_Y,
        ));
        assert!(buffers.update_view_uniform_buffer(&moved));

        buffers.invalidate_view_uniform_buffer();
        assert!(buffers.update_view_uniform_buffer(&moved));
    }
}
