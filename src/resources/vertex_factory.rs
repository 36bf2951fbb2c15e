//! Vertex factory types and the capture pass allow-list

use std::collections::HashMap;
use std::sync::LazyLock;

/// Known vertex factory (vertex layout) kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VertexFactoryType {
    /// Static mesh
    Local,
    /// Skinned mesh, skinning done in a compute pre-pass
    GpuSkinPassthrough,
    /// Skinned mesh, skinning done in the vertex shader
    GpuSkinDefault,
    InstancedStaticMesh,
    NiagaraRibbon,
    NiagaraSprite,
    NiagaraSpriteEx,
    NiagaraMesh,
    NiagaraMeshEx,
    Landscape,
    GeometryCache,
    Water,
    SplineMesh,
}

impl VertexFactoryType {
    pub const COUNT: usize = 13;

    pub const ALL: [VertexFactoryType; Self::COUNT] = [
        VertexFactoryType::Local,
        VertexFactoryType::GpuSkinPassthrough,
        VertexFactoryType::GpuSkinDefault,
        VertexFactoryType::InstancedStaticMesh,
        VertexFactoryType::NiagaraRibbon,
        VertexFactoryType::NiagaraSprite,
        VertexFactoryType::NiagaraSpriteEx,
        VertexFactoryType::NiagaraMesh,
        VertexFactoryType::NiagaraMeshEx,
        VertexFactoryType::Landscape,
        VertexFactoryType::GeometryCache,
        VertexFactoryType::Water,
        VertexFactoryType::SplineMesh,
    ];

    /// Engine name of the vertex factory.
    pub fn name(self) -> &'static str {
        match self {
            VertexFactoryType::Local => "FLocalVertexFactory",
            VertexFactoryType::GpuSkinPassthrough => "FGPUSkinPassthroughVertexFactory",
            VertexFactoryType::GpuSkinDefault => "TGPUSkinVertexFactoryDefault",
            VertexFactoryType::InstancedStaticMesh => "FInstancedStaticMeshVertexFactory",
            VertexFactoryType::NiagaraRibbon => "FNiagaraRibbonVertexFactory",
            VertexFactoryType::NiagaraSprite => "FNiagaraSpriteVertexFactory",
            VertexFactoryType::NiagaraSpriteEx => "FNiagaraSpriteVertexFactoryEx",
            VertexFactoryType::NiagaraMesh => "FNiagaraMeshVertexFactory",
            VertexFactoryType::NiagaraMeshEx => "FNiagaraMeshVertexFactoryEx",
            VertexFactoryType::Landscape => "FLandscapeVertexFactory",
            VertexFactoryType::GeometryCache => "FGeometryCacheVertexFactory",
            VertexFactoryType::Water => "FWaterVertexFactory",
            VertexFactoryType::SplineMesh => "FSplineMeshVertexFactory",
        }
    }

    /// Resolve an engine name. Unknown names return `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        static BY_NAME: LazyLock<HashMap<&'static str, VertexFactoryType>> = LazyLock::new(|| {
            VertexFactoryType::ALL
                .iter()
                .map(|&vf| (vf.name(), vf))
                .collect()
        });
        BY_NAME.get(name).copied()
    }

    /// Mesh particle factories are only supported when the filter opts in.
    pub fn is_mesh_particle(self) -> bool {
        matches!(
            self,
            VertexFactoryType::NiagaraMesh | VertexFactoryType::NiagaraMeshEx
        )
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Support table for the capture pass shader permutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexFactoryFilter {
    supported: [bool; VertexFactoryType::COUNT],
}

impl VertexFactoryFilter {
    pub fn new(include_mesh_particles: bool) -> Self {
        let mut supported = [false; VertexFactoryType::COUNT];
        for vf in VertexFactoryType::ALL {
            supported[vf.index()] = match vf {
                VertexFactoryType::Local
                | VertexFactoryType::GpuSkinPassthrough
                | VertexFactoryType::GpuSkinDefault
                | VertexFactoryType::InstancedStaticMesh
                | VertexFactoryType::NiagaraRibbon
                | VertexFactoryType::NiagaraSprite
                | VertexFactoryType::NiagaraSpriteEx => true,
                VertexFactoryType::NiagaraMesh | VertexFactoryType::NiagaraMeshEx => {
                    include_mesh_particles
                }
                VertexFactoryType::Landscape
                | VertexFactoryType::GeometryCache
                | VertexFactoryType::Water
                | VertexFactoryType::SplineMesh => false,
            };
        }
        Self { supported }
    }

    pub fn is_supported(&self, vertex_factory: Option<VertexFactoryType>) -> bool {
        vertex_factory.is_some_and(|vf| self.supported[vf.index()])
    }

    pub fn supported_types(&self) -> impl Iterator<Item = VertexFactoryType> + '_ {
        VertexFactoryType::ALL
            .into_iter()
            .filter(|vf| self.supported[vf.index()])
    }
}

impl Default for VertexFactoryFilter {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Check against the default allow-list (mesh particles excluded).
pub fn is_supported_vertex_factory_type(vertex_factory: Option<VertexFactoryType>) -> bool {
    static DEFAULT_FILTER: LazyLock<VertexFactoryFilter> =
        LazyLock::new(VertexFactoryFilter::default);
    DEFAULT_FILTER.is_supported(vertex_factory)
}
