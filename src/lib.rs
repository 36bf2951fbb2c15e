//! Custom Capture Pass - an auxiliary color capture mesh pass for the mobile renderer
//!
//! Primitives that opt into custom capture are drawn into a dedicated color
//! target with a small vertex/pixel shader pair. The pass:
//! - Filters mesh batches by vertex factory, material domain and primitive flags
//! - Builds sort-keyed, cacheable draw commands (optionally in parallel)
//! - Brackets the render pass with target transitions and dispatches per view
//!
//! GPU work goes through [`backend::RhiCommandList`]; the crate ships a
//! recording implementation for tests and debugging, and conversions of its
//! pass state to wgpu types.

pub mod backend;
pub mod error;
pub mod mesh_pass;
pub mod pipeline;
pub mod resources;
pub mod scene;
pub mod shader;

pub use error::{CaptureError, CaptureResult};
pub use pipeline::{CapturePassOutcome, MobileSceneRenderer, ViewPassMode};

use backend::TextureFormat;
use pipeline::MaterialDomainFilter;
use resources::VertexFactoryFilter;

/// Configuration of the capture pass
#[derive(Debug, Clone)]
pub struct CapturePassConfig {
    /// How views share the capture target
    pub view_pass_mode: ViewPassMode,
    /// Material domains the pass draws
    pub material_domains: MaterialDomainFilter,
    /// Compile and draw mesh particle vertex factories
    pub include_mesh_particles: bool,
    /// Bind the primitive's planar shadow height to the vertex shader
    pub shadow_base_height: bool,
    /// Cache static mesh commands across frames
    pub cached_mesh_commands: bool,
    /// Build draw commands on the rayon thread pool
    pub parallel_build: bool,
    /// Color the target is cleared to once per frame
    pub clear_color: [f32; 4],
    /// Format of the capture color target
    pub target_format: TextureFormat,
}

impl Default for CapturePassConfig {
    fn default() -> Self {
        Self {
            view_pass_mode: ViewPassMode::Combined,
            material_domains: MaterialDomainFilter::default(),
            include_mesh_particles: false,
            shadow_base_height: true,
            cached_mesh_commands: true,
            parallel_build: false,
            clear_color: [0.0, 0.0, 0.0, 0.0],
            target_format: TextureFormat::Rgba8Unorm,
        }
    }
}

impl CapturePassConfig {
    pub fn with_view_pass_mode(mut self, mode: ViewPassMode) -> Self {
        self.view_pass_mode = mode;
        self
    }

    pub fn with_material_domains(mut self, domains: MaterialDomainFilter) -> Self {
        self.material_domains = domains;
        self
    }

    pub fn with_mesh_particles(mut self, include: bool) -> Self {
        self.include_mesh_particles = include;
        self
    }

    pub fn with_shadow_base_height(mut self, enabled: bool) -> Self {
        self.shadow_base_height = enabled;
        self
    }

    pub fn with_cached_mesh_commands(mut self, enabled: bool) -> Self {
        self.cached_mesh_commands = enabled;
        self
    }

    pub fn with_parallel_build(mut self, enabled: bool) -> Self {
        self.parallel_build = enabled;
        self
    }

    pub fn with_clear_color(mut self, color: [f32; 4]) -> Self {
        self.clear_color = color;
        self
    }

    pub fn with_target_format(mut self, format: TextureFormat) -> Self {
        self.target_format = format;
        self
    }

    /// Vertex factory allow-list matching this configuration.
    pub fn vertex_factory_filter(&self) -> VertexFactoryFilter {
        VertexFactoryFilter::new(self.include_mesh_particles)
    }

    /// Descriptor of the capture color target.
    pub fn target_descriptor(&self, width: u32, height: u32) -> backend::TextureDescriptor {
        backend::TextureDescriptor::color_target("CustomCaptureColor", width, height, self.target_format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = CapturePassConfig::default();
        assert_eq!(config.view_pass_mode, ViewPassMode::Combined);
        assert!(config.cached_mesh_commands);
        assert!(!config.vertex_factory_filter().is_supported(Some(resources::VertexFactoryType::NiagaraMesh)));
    }

    #[test]
    fn builder_overrides() {
        let config = CapturePassConfig::default()
            .with_view_pass_mode(ViewPassMode::PerView)
            .with_mesh_particles(true)
            .with_target_format(TextureFormat::Rgba16Float);
        assert_eq!(config.view_pass_mode, ViewPassMode::PerView);
        assert!(config.vertex_factory_filter().is_supported(Some(resources::VertexFactoryType::NiagaraMesh)));
        assert_eq!(config.target_descriptor(64, 64).format, TextureFormat::Rgba16Float);
    }
}
