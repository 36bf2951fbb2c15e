//! Mesh batch eligibility and pass render state selection

use bitflags::bitflags;

use crate::backend::{BlendState, DepthStencilState, UniformBufferHandle};
use crate::resources::{MaterialDomain, MaterialResource, MeshBatch};
use crate::scene::{PrimitiveSceneProxy, SceneUniformBuffers};

bitflags! {
    /// Material domains a pass accepts.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MaterialDomainFilter: u32 {
        const SURFACE = 1 << 0;
        const DEFERRED_DECAL = 1 << 1;
        const LIGHT_FUNCTION = 1 << 2;
        const VOLUME = 1 << 3;
        const POST_PROCESS = 1 << 4;
        const USER_INTERFACE = 1 << 5;
    }
}

impl MaterialDomainFilter {
    pub fn from_domain(domain: MaterialDomain) -> Self {
        match domain {
            MaterialDomain::Surface => Self::SURFACE,
            MaterialDomain::DeferredDecal => Self::DEFERRED_DECAL,
            MaterialDomain::LightFunction => Self::LIGHT_FUNCTION,
            MaterialDomain::Volume => Self::VOLUME,
            MaterialDomain::PostProcess => Self::POST_PROCESS,
            MaterialDomain::UserInterface => Self::USER_INTERFACE,
        }
    }

    pub fn includes(self, domain: MaterialDomain) -> bool {
        self.contains(Self::from_domain(domain))
    }
}

impl Default for MaterialDomainFilter {
    /// Mesh passes draw every domain except volumes.
    fn default() -> Self {
        Self::all().difference(Self::VOLUME)
    }
}

/// Fixed-function state and pass-level uniform buffers of a draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassRenderState {
    pub blend_state: BlendState,
    pub depth_stencil_state: DepthStencilState,
    pub view_uniform_buffer: UniformBufferHandle,
    pub instanced_view_uniform_buffer: UniformBufferHandle,
    pub pass_uniform_buffer: Option<UniformBufferHandle>,
}

impl PassRenderState {
    /// RGBA write without a depth target.
    pub fn new(
        view_uniform_buffer: UniformBufferHandle,
        instanced_view_uniform_buffer: UniformBufferHandle,
    ) -> Self {
        Self {
            blend_state: BlendState::color_write(),
            depth_stencil_state: DepthStencilState::DISABLED,
            view_uniform_buffer,
            instanced_view_uniform_buffer,
            pass_uniform_buffer: None,
        }
    }

    pub fn with_blend_state(mut self, blend_state: BlendState) -> Self {
        self.blend_state = blend_state;
        self
    }

    pub fn with_pass_uniform_buffer(mut self, buffer: UniformBufferHandle) -> Self {
        self.pass_uniform_buffer = Some(buffer);
        self
    }
}

/// Decides which batches the capture pass draws and with which state
#[derive(Debug, Clone, Copy, Default)]
pub struct MeshBatchSelector {
    domains: MaterialDomainFilter,
}

impl MeshBatchSelector {
    pub fn new(domains: MaterialDomainFilter) -> Self {
        Self { domains }
    }

    pub fn domains(&self) -> MaterialDomainFilter {
        self.domains
    }

    /// A batch is drawn when its primitive renders in the main pass (or has no
    /// proxy), its material domain is accepted, and the primitive opted into
    /// custom capture. Without a proxy the last condition cannot hold.
    pub fn is_eligible(
        &self,
        batch: &MeshBatch,
        primitive: Option<&PrimitiveSceneProxy>,
        material: &MaterialResource,
    ) -> bool {
        let main_pass = primitive.map_or(true, PrimitiveSceneProxy::should_render_in_main_pass);
        let domain = self.domains.includes(material.domain);
        let capture = primitive.is_some_and(PrimitiveSceneProxy::should_render_custom_capture);

        let eligible = main_pass && domain && capture;
        if !eligible {
            log::trace!(
                "Skipping {:?} batch with '{}': main_pass={} domain={} capture={}",
                batch.vertex_factory(),
                material.name,
                main_pass,
                domain,
                capture
            );
        }
        eligible
    }

    /// State for a draw with `material`, derived from the pass base state.
    ///
    /// Translucent materials blend additively using the pixel shader's second
    /// output and read the translucent base pass buffer. Everything else writes
    /// color and reads the opaque base pass buffer.
    pub fn select_pass_state(
        &self,
        base: &PassRenderState,
        material: &MaterialResource,
        uniform_buffers: &SceneUniformBuffers,
    ) -> PassRenderState {
        if material.is_translucent() {
            base.with_blend_state(BlendState::dual_source_additive())
                .with_pass_uniform_buffer(uniform_buffers.mobile_translucent_base_pass_uniform_buffer)
        } else {
            base.with_blend_state(BlendState::color_write())
                .with_pass_uniform_buffer(uniform_buffers.mobile_opaque_base_pass_uniform_buffer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_domains_exclude_volume() {
        let filter = MaterialDomainFilter::default();
        assert!(filter.includes(MaterialDomain::Surface));
        assert!(filter.includes(MaterialDomain::DeferredDecal));
        assert!(!filter.includes(MaterialDomain::Volume));
        assert!(!MaterialDomainFilter::SURFACE.includes(MaterialDomain::PostProcess));
    }

    #[test]
    fn base_state_disables_depth() {
        let state = PassRenderState::new(UniformBufferHandle::new(1), UniformBufferHandle::new(2));
        assert_eq!(state.depth_stencil_state, DepthStencilState::DISABLED);
        assert_eq!(state.blend_state, BlendState::color_write());
        assert_eq!(state.pass_uniform_buffer, None);
    }
}
