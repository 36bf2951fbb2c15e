//! Mesh batches submitted by primitive proxies

use std::sync::Arc;

use crate::error::{CaptureError, CaptureResult};
use crate::resources::{MaterialRenderProxy, VertexFactoryType};

/// Bit i selects element i of a batch.
pub type BatchElementMask = u64;

/// Mask selecting every element.
pub const ALL_ELEMENTS: BatchElementMask = u64::MAX;

/// One indexed draw range of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshBatchElement {
    pub first_index: u32,
    pub num_primitives: u32,
    pub num_instances: u32,
    pub base_vertex_index: u32,
}

impl MeshBatchElement {
    pub fn new(first_index: u32, num_primitives: u32) -> Self {
        Self {
            first_index,
            num_primitives,
            num_instances: 1,
            base_vertex_index: 0,
        }
    }

    pub fn with_instances(mut self, num_instances: u32) -> Self {
        self.num_instances = num_instances;
        self
    }
}

/// A drawable unit submitted for one frame.
///
/// Always has a vertex factory and at least one element; see [`MeshBatchBuilder`].
#[derive(Debug, Clone)]
pub struct MeshBatch {
    vertex_factory: VertexFactoryType,
    pub material: Arc<MaterialRenderProxy>,
    elements: Vec<MeshBatchElement>,
    pub wireframe: bool,
    pub reverse_culling: bool,
    pub disable_backface_culling: bool,
    pub dithered_lod_transition: bool,
    pub cast_shadow: bool,
}

impl MeshBatch {
    pub fn vertex_factory(&self) -> VertexFactoryType {
        self.vertex_factory
    }

    pub fn elements(&self) -> &[MeshBatchElement] {
        &self.elements
    }

    /// Elements whose bit is set in `mask`, in element order.
    pub fn selected_elements(&self, mask: BatchElementMask) -> Vec<MeshBatchElement> {
        self.elements
            .iter()
            .take(BatchElementMask::BITS as usize)
            .enumerate()
            .filter(|(i, _)| mask & (1u64 << i) != 0)
            .map(|(_, element)| *element)
            .collect()
    }
}

/// Builder for [`MeshBatch`].
#[derive(Debug, Clone)]
pub struct MeshBatchBuilder {
    vertex_factory: Option<VertexFactoryType>,
    material: Arc<MaterialRenderProxy>,
    elements: Vec<MeshBatchElement>,
    wireframe: bool,
    reverse_culling: bool,
    disable_backface_culling: bool,
    dithered_lod_transition: bool,
    cast_shadow: bool,
}

impl MeshBatchBuilder {
    pub fn new(material: Arc<MaterialRenderProxy>) -> Self {
        Self {
            vertex_factory: None,
            material,
            elements: Vec::new(),
            wireframe: false,
            reverse_culling: false,
            disable_backface_culling: false,
            dithered_lod_transition: false,
            cast_shadow: true,
        }
    }

    pub fn vertex_factory(mut self, vertex_factory: VertexFactoryType) -> Self {
        self.vertex_factory = Some(vertex_factory);
        self
    }

    pub fn element(mut self, element: MeshBatchElement) -> Self {
        self.elements.push(element);
        self
    }

    pub fn wireframe(mut self, wireframe: bool) -> Self {
        self.wireframe = wireframe;
        self
    }

    pub fn reverse_culling(mut self, reverse_culling: bool) -> Self {
        self.reverse_culling = reverse_culling;
        self
    }

    pub fn disable_backface_culling(mut self, disable: bool) -> Self {
        self.disable_backface_culling = disable;
        self
    }

    pub fn dithered_lod_transition(mut self, dithered: bool) -> Self {
        self.dithered_lod_transition = dithered;
        self
    }

    pub fn cast_shadow(mut self, cast_shadow: bool) -> Self {
        self.cast_shadow = cast_shadow;
        self
    }

    pub fn build(self) -> CaptureResult<MeshBatch> {
        let vertex_factory = self.vertex_factory.ok_or_else(|| {
            log::warn!("Rejecting mesh batch for '{}': no vertex factory", self.material.name);
            CaptureError::MissingVertexFactory
        })?;
        if self.elements.is_empty() {
            log::warn!("Rejecting mesh batch for '{}': no elements", self.material.name);
            return Err(CaptureError::EmptyMeshBatch);
        }

        Ok(MeshBatch {
            vertex_factory,
            material: self.material,
            elements: self.elements,
            wireframe: self.wireframe,
            reverse_culling: self.reverse_culling,
            disable_backface_culling: self.disable_backface_culling,
            dithered_lod_transition: self.dithered_lod_transition,
            cast_shadow: self.cast_shadow,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material() -> Arc<MaterialRenderProxy> {
        Arc::new(MaterialRenderProxy::new("test"))
    }

    #[test]
    fn build_requires_vertex_factory() {
        let result = MeshBatchBuilder::new(material())
            .element(MeshBatchElement::new(0, 12))
            .build();
        assert_eq!(result.unwrap_err(), CaptureError::MissingVertexFactory);
    }

    #[test]
    fn build_requires_elements() {
        let result = MeshBatchBuilder::new(material())
            .vertex_factory(VertexFactoryType::Local)
            .build();
        assert_eq!(result.unwrap_err(), CaptureError::EmptyMeshBatch);
    }

    #[test]
    fn element_mask_selects_elements() {
        let batch = MeshBatchBuilder::new(material())
            .vertex_factory(VertexFactoryType::Local)
            .element(MeshBatchElement::new(0, 4))
            .element(MeshBatchElement::new(12, 4))
            .element(MeshBatchElement::new(24, 4))
            .build()
            .unwrap();

        assert_eq!(batch.selected_elements(ALL_ELEMENTS).len(), 3);
        let odd = batch.selected_elements(0b101);
        assert_eq!(odd.len(), 2);
        assert_eq!(odd[1].first_index, 24);
        assert!(batch.selected_elements(0).is_empty());
    }
}
