//! Views rendered in a frame

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{IVec2, Mat4, Vec3, Vec4};

use crate::backend::Viewport;
use crate::error::{CaptureError, CaptureResult};
use crate::mesh_pass::{MeshDrawCommandList, MeshPass};
use crate::scene::{PrimitiveId, PrimitiveSceneProxy, PrimitiveViewRelevance};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(pub u32);

/// Pixel rectangle, `min` inclusive and `max` exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntRect {
    pub min: IVec2,
    pub max: IVec2,
}

impl IntRect {
    pub fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> CaptureResult<Self> {
        if min_x > max_x || min_y > max_y {
            return Err(CaptureError::InvalidViewRect {
                min_x,
                min_y,
                max_x,
                max_y,
            });
        }
        Ok(Self {
            min: IVec2::new(min_x, min_y),
            max: IVec2::new(max_x, max_y),
        })
    }

    pub fn width(&self) -> u32 {
        self.max.x.abs_diff(self.min.x)
    }

    pub fn height(&self) -> u32 {
        self.max.y.abs_diff(self.min.y)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Viewport covering the rect with the full 0..1 depth range.
    pub fn to_viewport(&self) -> Viewport {
        Viewport {
            min_x: self.min.x as f32,
            min_y: self.min.y as f32,
            min_z: 0.0,
            max_x: self.max.x as f32,
            max_y: self.max.y as f32,
            max_z: 1.0,
        }
    }
}

/// View uniform data for GPU
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ViewUniformParameters {
    pub view_proj: Mat4,
    pub view_origin: Vec4,
    /// xy = size in pixels, zw = inverse size
    pub viewport_size: Vec4,
    /// Direction planar shadows are projected along
    pub shadow_direction: Vec4,
}

impl ViewUniformParameters {
    pub fn new(view_proj: Mat4, view_origin: Vec3, rect: &IntRect, shadow_direction: Vec3) -> Self {
        let size = glam::Vec2::new(rect.width().max(1) as f32, rect.height().max(1) as f32);
        Self {
            view_proj,
            view_origin: view_origin.extend(1.0),
            viewport_size: Vec4::new(size.x, size.y, 1.0 / size.x, 1.0 / size.y),
            shadow_direction: shadow_direction.normalize_or_zero().extend(0.0),
        }
    }
}

/// Per-frame state of one view
#[derive(Debug, Clone)]
pub struct ViewInfo {
    id: ViewId,
    rect: IntRect,
    pub should_render: bool,
    pub has_custom_capture_primitives: bool,
    pub uniform_parameters: ViewUniformParameters,
    visible_primitives: Vec<PrimitiveId>,
    hidden_primitives: HashSet<PrimitiveId>,
    relevance: HashMap<PrimitiveId, PrimitiveViewRelevance>,
    draw_lists: HashMap<MeshPass, MeshDrawCommandList>,
}

impl ViewInfo {
    pub fn new(id: ViewId, rect: IntRect) -> Self {
        Self {
            id,
            rect,
            should_render: true,
            has_custom_capture_primitives: false,
            uniform_parameters: ViewUniformParameters::new(
                Mat4::IDENTITY,
                Vec3::ZERO,
                &rect,
                Vec3::NEG_Y,
            ),
            visible_primitives: Vec::new(),
            hidden_primitives: HashSet::new(),
            relevance: HashMap::new(),
            draw_lists: HashMap::new(),
        }
    }

    pub fn with_uniform_parameters(mut self, parameters: ViewUniformParameters) -> Self {
        self.uniform_parameters = parameters;
        self
    }

    pub fn with_visible_primitives(mut self, primitives: impl IntoIterator<Item = PrimitiveId>) -> Self {
        self.set_visible_primitives(primitives);
        self
    }

    pub fn id(&self) -> ViewId {
        self.id
    }

    pub fn rect(&self) -> IntRect {
        self.rect
    }

    pub fn should_render_view(&self) -> bool {
        self.should_render
    }

    /// Replace the culling result for this frame.
    pub fn set_visible_primitives(&mut self, primitives: impl IntoIterator<Item = PrimitiveId>) {
        self.visible_primitives = primitives.into_iter().collect();
    }

    pub fn visible_primitives(&self) -> &[PrimitiveId] {
        &self.visible_primitives
    }

    pub fn hide_primitive(&mut self, id: PrimitiveId) {
        self.hidden_primitives.insert(id);
    }

    pub fn is_hidden(&self, id: PrimitiveId) -> bool {
        self.hidden_primitives.contains(&id)
    }

    /// Compute relevance of the visible primitives and derive
    /// `has_custom_capture_primitives` from it.
    pub fn gather_relevance(&mut self, primitives: &[Arc<PrimitiveSceneProxy>]) {
        let visible: HashSet<PrimitiveId> = self.visible_primitives.iter().copied().collect();

        self.relevance.clear();
        for proxy in primitives.iter().filter(|p| visible.contains(&p.id())) {
            let relevance = proxy.view_relevance(self);
            self.relevance.insert(proxy.id(), relevance);
        }

        self.has_custom_capture_primitives = self
            .relevance
            .values()
            .any(PrimitiveViewRelevance::wants_custom_capture);
    }

    pub fn primitive_relevance(&self, id: PrimitiveId) -> Option<&PrimitiveViewRelevance> {
        self.relevance.get(&id)
    }

    pub fn draw_list(&self, pass: MeshPass) -> Option<&MeshDrawCommandList> {
        self.draw_lists.get(&pass)
    }

    pub fn draw_list_mut(&mut self, pass: MeshPass) -> &mut MeshDrawCommandList {
        self.draw_lists.entry(pass).or_default()
    }

    /// Drop last frame's draw lists.
    pub fn reset_draw_lists(&mut self) {
        self.draw_lists.clear();
    }
}
