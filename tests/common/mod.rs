//! Common fixtures for capture pass integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use custom_capture_pass::backend::{RecordedCommand, RecordingCommandList, UniformBufferHandle};
use custom_capture_pass::resources::{
    BlendMode, FeatureLevel, MaterialDomain, MaterialRenderProxy, MaterialResource, MeshBatch,
    MeshBatchBuilder, MeshBatchElement, VertexFactoryFilter, VertexFactoryType,
};
use custom_capture_pass::scene::{
    IntRect, PrimitiveId, PrimitiveSceneProxy, SceneInfo, SceneUniformBuffers, ViewId, ViewInfo,
};
use custom_capture_pass::shader::{ShaderLibrary, ShaderPlatform};

pub const VIEW_BUFFER: UniformBufferHandle = UniformBufferHandle::new(1);
pub const INSTANCED_VIEW_BUFFER: UniformBufferHandle = UniformBufferHandle::new(2);
pub const OPAQUE_PASS_BUFFER: UniformBufferHandle = UniformBufferHandle::new(3);
pub const TRANSLUCENT_PASS_BUFFER: UniformBufferHandle = UniformBufferHandle::new(4);

/// Install env_logger once so `RUST_LOG=trace` shows pass decisions.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn uniform_buffers() -> SceneUniformBuffers {
    SceneUniformBuffers::new(
        VIEW_BUFFER,
        INSTANCED_VIEW_BUFFER,
        OPAQUE_PASS_BUFFER,
        TRANSLUCENT_PASS_BUFFER,
    )
}

/// Scene plus a mobile shader library to compile materials with.
pub struct TestScene {
    pub scene: SceneInfo,
    pub library: ShaderLibrary,
    pub filter: VertexFactoryFilter,
    next_buffer: u64,
    next_primitive: u32,
}

impl TestScene {
    pub fn new() -> Self {
        Self::with_library(ShaderLibrary::new(ShaderPlatform::Gles31).expect("capture shader compiles"))
    }

    pub fn with_library(library: ShaderLibrary) -> Self {
        init_logging();
        Self {
            scene: SceneInfo::new(FeatureLevel::Es31, uniform_buffers()),
            library,
            filter: VertexFactoryFilter::default(),
            next_buffer: 100,
            next_primitive: 1,
        }
    }

    fn buffer(&mut self) -> UniformBufferHandle {
        self.next_buffer += 1;
        UniformBufferHandle::new(self.next_buffer)
    }

    /// Surface material with compiled capture shaders.
    pub fn material(&mut self, name: &str, blend_mode: BlendMode) -> Arc<MaterialRenderProxy> {
        self.material_in_domain(name, blend_mode, MaterialDomain::Surface)
    }

    pub fn material_in_domain(
        &mut self,
        name: &str,
        blend_mode: BlendMode,
        domain: MaterialDomain,
    ) -> Arc<MaterialRenderProxy> {
        let buffer = self.buffer();
        let resource = MaterialResource::new(name, buffer)
            .with_blend_mode(blend_mode)
            .with_domain(domain);
        self.material_from(resource)
    }

    pub fn material_from(&mut self, mut resource: MaterialResource) -> Arc<MaterialRenderProxy> {
        self.library
            .compile_material_shaders(&mut resource, &self.filter)
            .expect("material shaders compile");
        let name = resource.name.clone();
        Arc::new(MaterialRenderProxy::new(&name).with_resource(FeatureLevel::Es31, Arc::new(resource)))
    }

    /// Add a primitive. `configure` receives a proxy with custom capture on.
    pub fn add_primitive(
        &mut self,
        batches: Vec<MeshBatch>,
        configure: impl FnOnce(PrimitiveSceneProxy) -> PrimitiveSceneProxy,
    ) -> Arc<PrimitiveSceneProxy> {
        let id = PrimitiveId(self.next_primitive);
        self.next_primitive += 1;
        let buffer = self.buffer();
        let proxy = batches.into_iter().fold(
            PrimitiveSceneProxy::new(id, buffer).with_custom_capture(true),
            PrimitiveSceneProxy::with_mesh_batch,
        );
        self.scene.add_primitive(configure(proxy))
    }

    pub fn add_capture_primitive(&mut self, batches: Vec<MeshBatch>) -> Arc<PrimitiveSceneProxy> {
        self.add_primitive(batches, |p| p)
    }

    /// View seeing every primitive currently in the scene.
    pub fn view(&self, id: u32, rect: IntRect) -> ViewInfo {
        ViewInfo::new(ViewId(id), rect).with_visible_primitives(self.scene.primitives().iter().map(|p| p.id()))
    }
}

pub fn batch(material: &Arc<MaterialRenderProxy>, vertex_factory: VertexFactoryType) -> MeshBatch {
    MeshBatchBuilder::new(material.clone())
        .vertex_factory(vertex_factory)
        .element(MeshBatchElement::new(0, 12))
        .build()
        .expect("valid batch")
}

pub fn rect(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> IntRect {
    IntRect::new(min_x, min_y, max_x, max_y).expect("valid rect")
}

/// Primitive ids of recorded draws in submission order.
pub fn drawn_primitives(cmd: &RecordingCommandList) -> Vec<PrimitiveId> {
    cmd.commands()
        .iter()
        .filter_map(|c| match c {
            RecordedCommand::Draw { primitive, .. } => Some(*primitive),
            _ => None,
        })
        .collect()
}
