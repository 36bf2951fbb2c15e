//! Scene management
//!
//! Primitives, views and the scene-wide uniform buffers the mesh passes read.

mod primitive;
mod uniforms;
mod view;

pub use primitive::*;
pub use uniforms::*;
pub use view::*;

use std::sync::Arc;

use crate::resources::FeatureLevel;

/// Renderer family a pass processor belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShadingPath {
    Deferred,
    Mobile,
}

/// Kind of world a scene belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorldType {
    Game,
    Editor,
    PlayInEditor,
    GamePreview,
    EditorPreview,
    Inactive,
}

impl WorldType {
    /// Preview and inactive worlds never render the capture pass.
    pub fn allows_custom_capture(self) -> bool {
        !matches!(self, WorldType::EditorPreview | WorldType::Inactive)
    }
}

/// The scene being rendered
#[derive(Debug)]
pub struct SceneInfo {
    /// `None` for scenes not owned by a world
    pub world_type: Option<WorldType>,
    pub feature_level: FeatureLevel,
    pub shading_path: ShadingPath,
    pub uniform_buffers: SceneUniformBuffers,
    primitives: Vec<Arc<PrimitiveSceneProxy>>,
}

impl SceneInfo {
    pub fn new(feature_level: FeatureLevel, uniform_buffers: SceneUniformBuffers) -> Self {
        Self {
            world_type: None,
            feature_level,
            shading_path: ShadingPath::Mobile,
            uniform_buffers,
            primitives: Vec::new(),
        }
    }

    pub fn with_world_type(mut self, world_type: WorldType) -> Self {
        self.world_type = Some(world_type);
        self
    }

    pub fn allows_custom_capture(&self) -> bool {
        self.world_type.map_or(true, WorldType::allows_custom_capture)
    }

    pub fn add_primitive(&mut self, proxy: PrimitiveSceneProxy) -> Arc<PrimitiveSceneProxy> {
        let proxy = Arc::new(proxy);
        self.primitives.push(proxy.clone());
        proxy
    }

    pub fn remove_primitive(&mut self, id: PrimitiveId) -> Option<Arc<PrimitiveSceneProxy>> {
        let index = self.primitives.iter().position(|p| p.id() == id)?;
        Some(self.primitives.remove(index))
    }

    pub fn primitives(&self) -> &[Arc<PrimitiveSceneProxy>] {
        &self.primitives
    }

    pub fn primitive(&self, id: PrimitiveId) -> Option<&Arc<PrimitiveSceneProxy>> {
        self.primitives.iter().find(|p| p.id() == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::UniformBufferHandle;

    #[test]
    fn preview_worlds_skip_capture() {
        assert!(WorldType::Game.allows_custom_capture());
        assert!(WorldType::PlayInEditor.allows_custom_capture());
        assert!(!WorldType::EditorPreview.allows_custom_capture());
        assert!(!WorldType::Inactive.allows_custom_capture());
    }

    #[test]
    fn primitives_are_tracked_by_id() {
        let buffers = SceneUniformBuffers::new(
            UniformBufferHandle::new(1),
            UniformBufferHandle::new(2),
            UniformBufferHandle::new(3),
            UniformBufferHandle::new(4),
        );
        let mut scene = SceneInfo::new(FeatureLevel::Es31, buffers);
        assert!(scene.allows_custom_capture());

        scene.add_primitive(PrimitiveSceneProxy::new(PrimitiveId(7), UniformBufferHandle::new(10)));
        assert!(scene.primitive(PrimitiveId(7)).is_some());
        assert!(scene.remove_primitive(PrimitiveId(7)).is_some());
        assert!(scene.primitives().is_empty());

        let preview = scene.with_world_type(WorldType::EditorPreview);
        assert!(!preview.allows_custom_capture());
    }
}
