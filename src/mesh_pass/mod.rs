//! Mesh passes
//!
//! A mesh pass turns mesh batches into [`MeshDrawCommand`]s through a
//! [`MeshPassProcessor`]. Processors are registered per shading path in a
//! [`PassProcessorRegistry`] together with flags saying how their commands are
//! built and where they are used.

mod draw_command;
mod draw_list;
mod processor;

pub use draw_command::*;
pub use draw_list::*;
pub use processor::*;

use std::collections::HashMap;
use std::sync::Arc;

use bitflags::bitflags;

use crate::error::{CaptureError, CaptureResult};
use crate::scene::{SceneInfo, ShadingPath, ViewId};

/// Mesh pass identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshPass {
    DepthPass,
    BasePass,
    TranslucencyAll,
    CustomCapturePass,
}

bitflags! {
    /// How a mesh pass is set up.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MeshPassFlags: u32 {
        /// Static mesh commands are built once and cached across frames.
        const CACHED_MESH_COMMANDS = 1 << 0;
        /// The pass is set up for main views.
        const MAIN_VIEW = 1 << 1;
    }
}

/// Creates a processor for a scene, optionally bound to a view for dynamic commands.
pub type PassProcessorFactory =
    Arc<dyn Fn(&SceneInfo, Option<ViewId>) -> Box<dyn MeshPassProcessor> + Send + Sync>;

struct RegisteredPass {
    flags: MeshPassFlags,
    factory: PassProcessorFactory,
}

/// Registered pass processors, keyed by shading path and mesh pass
#[derive(Default)]
pub struct PassProcessorRegistry {
    passes: HashMap<(ShadingPath, MeshPass), RegisteredPass>,
}

impl PassProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        path: ShadingPath,
        pass: MeshPass,
        flags: MeshPassFlags,
        factory: PassProcessorFactory,
    ) -> CaptureResult<()> {
        if self.passes.contains_key(&(path, pass)) {
            return Err(CaptureError::DuplicatePassProcessor { path, pass });
        }
        log::debug!("Registered {:?} processor on {:?} ({:?})", pass, path, flags);
        self.passes.insert((path, pass), RegisteredPass { flags, factory });
        Ok(())
    }

    pub fn is_registered(&self, path: ShadingPath, pass: MeshPass) -> bool {
        self.passes.contains_key(&(path, pass))
    }

    pub fn flags(&self, path: ShadingPath, pass: MeshPass) -> Option<MeshPassFlags> {
        self.passes.get(&(path, pass)).map(|p| p.flags)
    }

    pub fn create_processor(
        &self,
        path: ShadingPath,
        pass: MeshPass,
        scene: &SceneInfo,
        view: Option<ViewId>,
    ) -> Option<Box<dyn MeshPassProcessor>> {
        self.passes
            .get(&(path, pass))
            .map(|registered| (registered.factory)(scene, view))
    }

    /// Passes of `path` whose flags contain `flags`.
    pub fn passes_with(&self, path: ShadingPath, flags: MeshPassFlags) -> Vec<MeshPass> {
        self.passes
            .iter()
            .filter(|((p, _), registered)| *p == path && registered.flags.contains(flags))
            .map(|((_, pass), _)| *pass)
            .collect()
    }
}

impl std::fmt::Debug for PassProcessorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.passes.iter().map(|(key, registered)| (key, registered.flags)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{BatchElementMask, MeshBatch};
    use crate::scene::{PrimitiveSceneProxy, StaticMeshId};

    struct NullProcessor;

    impl MeshPassProcessor for NullProcessor {
        fn mesh_pass(&self) -> MeshPass {
            MeshPass::DepthPass
        }

        fn add_mesh_batch(
            &self,
            _batch: &MeshBatch,
            _element_mask: BatchElementMask,
            _primitive: Option<&PrimitiveSceneProxy>,
            _static_mesh_id: Option<StaticMeshId>,
            _context: &mut dyn MeshPassDrawListContext,
        ) {
        }
    }

    fn null_factory() -> PassProcessorFactory {
        Arc::new(|_: &SceneInfo, _: Option<ViewId>| -> Box<dyn MeshPassProcessor> {
            Box::new(NullProcessor)
        })
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = PassProcessorRegistry::new();
        registry
            .register(
                ShadingPath::Mobile,
                MeshPass::DepthPass,
                MeshPassFlags::MAIN_VIEW,
                null_factory(),
            )
            .unwrap();

        let err = registry
            .register(
                ShadingPath::Mobile,
                MeshPass::DepthPass,
                MeshPassFlags::MAIN_VIEW,
                null_factory(),
            )
            .unwrap_err();
        assert_eq!(
            err,
            CaptureError::DuplicatePassProcessor {
                path: ShadingPath::Mobile,
                pass: MeshPass::DepthPass
            }
        );

        // Same pass on another shading path is a separate slot
        assert!(registry
            .register(
                ShadingPath::Deferred,
                MeshPass::DepthPass,
                MeshPassFlags::empty(),
                null_factory(),
            )
            .is_ok());
    }

    #[test]
    fn passes_are_filtered_by_flags() {
        let mut registry = PassProcessorRegistry::new();
        registry
            .register(
                ShadingPath::Mobile,
                MeshPass::DepthPass,
                MeshPassFlags::MAIN_VIEW,
                null_factory(),
            )
            .unwrap();
        registry
            .register(
                ShadingPath::Mobile,
                MeshPass::BasePass,
                MeshPassFlags::CACHED_MESH_COMMANDS | MeshPassFlags::MAIN_VIEW,
                null_factory(),
            )
            .unwrap();

        assert_eq!(
            registry.passes_with(ShadingPath::Mobile, MeshPassFlags::CACHED_MESH_COMMANDS),
            vec![MeshPass::BasePass]
        );
        assert_eq!(registry.passes_with(ShadingPath::Mobile, MeshPassFlags::MAIN_VIEW).len(), 2);
        assert!(registry.flags(ShadingPath::Deferred, MeshPass::BasePass).is_none());
    }
}
