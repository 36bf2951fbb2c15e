//! Per-view draw lists and the cross-frame command cache

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::backend::RhiCommandList;
use crate::mesh_pass::{MeshDrawCommand, MeshPassDrawListContext};
use crate::resources::MaterialProxyId;
use crate::scene::{PrimitiveId, StaticMeshId};

/// Draw commands of one pass for one view
#[derive(Debug, Clone, Default)]
pub struct MeshDrawCommandList {
    commands: Vec<MeshDrawCommand>,
    sorted: bool,
}

impl MeshDrawCommandList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: MeshDrawCommand) {
        self.commands.push(command);
        self.sorted = false;
    }

    pub fn extend(&mut self, commands: impl IntoIterator<Item = MeshDrawCommand>) {
        self.commands.extend(commands);
        self.sorted = false;
    }

    pub fn commands(&self) -> &[MeshDrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
        self.sorted = true;
    }

    /// Stable sort by sort key. Equal keys keep submission order.
    pub fn finish(&mut self) {
        if !self.sorted {
            self.commands.sort_by_key(|c| c.sort_key);
            self.sorted = true;
        }
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted || self.commands.is_empty()
    }

    /// Submit every command in sort key order. Returns the number submitted.
    pub fn dispatch_draw(&self, cmd: &mut dyn RhiCommandList) -> usize {
        if self.is_sorted() {
            for command in &self.commands {
                cmd.draw_mesh_command(command);
            }
        } else {
            log::warn!("Dispatching unfinished draw list of {} commands", self.commands.len());
            let mut order: Vec<&MeshDrawCommand> = self.commands.iter().collect();
            order.sort_by_key(|c| c.sort_key);
            for command in order {
                cmd.draw_mesh_command(command);
            }
        }
        self.commands.len()
    }
}

impl MeshPassDrawListContext for MeshDrawCommandList {
    fn finalize_command(&mut self, command: MeshDrawCommand) {
        self.push(command);
    }
}

/// Cache key of a static mesh batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CachedCommandKey {
    pub static_mesh: StaticMeshId,
    pub material_proxy: MaterialProxyId,
}

/// Draw commands of static meshes, kept across frames.
///
/// Entries are only dropped through the `invalidate_*` calls; the owner of the
/// scene is responsible for calling them when a material, transform or
/// visibility changes.
#[derive(Debug, Default)]
pub struct CachedMeshDrawCommands {
    entries: RwLock<HashMap<CachedCommandKey, Arc<Vec<MeshDrawCommand>>>>,
}

impl CachedMeshDrawCommands {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CachedCommandKey) -> Option<Arc<Vec<MeshDrawCommand>>> {
        self.entries.read().get(key).cloned()
    }

    /// Cached commands for `key`, building and storing them on a miss.
    ///
    /// An empty entry records that the batch draws nothing in this pass.
    pub fn get_or_build(
        &self,
        key: CachedCommandKey,
        build: impl FnOnce(&mut Vec<MeshDrawCommand>),
    ) -> Arc<Vec<MeshDrawCommand>> {
        if let Some(commands) = self.entries.read().get(&key) {
            return commands.clone();
        }

        let mut commands = Vec::new();
        build(&mut commands);
        let commands = Arc::new(commands);
        self.entries
            .write()
            .entry(key)
            .or_insert(commands)
            .clone()
    }

    pub fn invalidate_static_mesh(&self, id: StaticMeshId) -> usize {
        self.invalidate_where(|key| key.static_mesh == id)
    }

    pub fn invalidate_primitive(&self, id: PrimitiveId) -> usize {
        self.invalidate_where(|key| key.static_mesh.primitive == id)
    }

    pub fn invalidate_material(&self, id: MaterialProxyId) -> usize {
        self.invalidate_where(|key| key.material_proxy == id)
    }

    pub fn invalidate_all(&self) {
        self.entries.write().clear();
    }

    fn invalidate_where(&self, predicate: impl Fn(&CachedCommandKey) -> bool) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|key, _| !predicate(key));
        let removed = before - entries.len();
        if removed > 0 {
            log::debug!("Invalidated {} cached draw command entries", removed);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
