//! Mesh pass processor interface

use crate::mesh_pass::{MeshDrawCommand, MeshPass};
use crate::resources::{BatchElementMask, MeshBatch};
use crate::scene::{PrimitiveSceneProxy, StaticMeshId};

/// Receives the commands a processor builds.
pub trait MeshPassDrawListContext {
    fn finalize_command(&mut self, command: MeshDrawCommand);
}

impl MeshPassDrawListContext for Vec<MeshDrawCommand> {
    fn finalize_command(&mut self, command: MeshDrawCommand) {
        self.push(command);
    }
}

/// Turns mesh batches into draw commands for one mesh pass.
///
/// Processors are immutable once created so batches can be processed from
/// several threads at once.
pub trait MeshPassProcessor: Send + Sync {
    fn mesh_pass(&self) -> MeshPass;

    /// Process one batch. Inapplicable batches emit nothing.
    fn add_mesh_batch(
        &self,
        batch: &MeshBatch,
        element_mask: BatchElementMask,
        primitive: Option<&PrimitiveSceneProxy>,
        static_mesh_id: Option<StaticMeshId>,
        context: &mut dyn MeshPassDrawListContext,
    );
}
