//! Conversion of pass state to wgpu types.

use crate::backend::types::*;
use crate::mesh_pass::MeshDrawCommand;

pub fn convert_texture_format(format: TextureFormat) -> wgpu::TextureFormat {
    match format {
        TextureFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
        TextureFormat::Rgba8UnormSrgb => wgpu::TextureFormat::Rgba8UnormSrgb,
        TextureFormat::Bgra8Unorm => wgpu::TextureFormat::Bgra8Unorm,
        TextureFormat::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
        TextureFormat::R32Float => wgpu::TextureFormat::R32Float,
    }
}

pub fn convert_compare_function(func: CompareFunction) -> wgpu::CompareFunction {
    match func {
        CompareFunction::Never => wgpu::CompareFunction::Never,
        CompareFunction::Less => wgpu::CompareFunction::Less,
        CompareFunction::Equal => wgpu::CompareFunction::Equal,
        CompareFunction::LessEqual => wgpu::CompareFunction::LessEqual,
        CompareFunction::Greater => wgpu::CompareFunction::Greater,
        CompareFunction::NotEqual => wgpu::CompareFunction::NotEqual,
        CompareFunction::GreaterEqual => wgpu::CompareFunction::GreaterEqual,
        CompareFunction::Always => wgpu::CompareFunction::Always,
    }
}

pub fn convert_blend_factor(factor: BlendFactor) -> wgpu::BlendFactor {
    match factor {
        BlendFactor::Zero => wgpu::BlendFactor::Zero,
        BlendFactor::One => wgpu::BlendFactor::One,
        BlendFactor::Src => wgpu::BlendFactor::Src,
        BlendFactor::OneMinusSrc => wgpu::BlendFactor::OneMinusSrc,
        BlendFactor::SrcAlpha => wgpu::BlendFactor::SrcAlpha,
        BlendFactor::OneMinusSrcAlpha => wgpu::BlendFactor::OneMinusSrcAlpha,
        BlendFactor::Dst => wgpu::BlendFactor::Dst,
        BlendFactor::OneMinusDst => wgpu::BlendFactor::OneMinusDst,
        BlendFactor::DstAlpha => wgpu::BlendFactor::DstAlpha,
        BlendFactor::OneMinusDstAlpha => wgpu::BlendFactor::OneMinusDstAlpha,
        BlendFactor::Src1 => wgpu::BlendFactor::Src1,
        BlendFactor::Src1Alpha => wgpu::BlendFactor::Src1Alpha,
    }
}

pub fn convert_blend_operation(op: BlendOperation) -> wgpu::BlendOperation {
    match op {
        BlendOperation::Add => wgpu::BlendOperation::Add,
        BlendOperation::Subtract => wgpu::BlendOperation::Subtract,
        BlendOperation::ReverseSubtract => wgpu::BlendOperation::ReverseSubtract,
        BlendOperation::Min => wgpu::BlendOperation::Min,
        BlendOperation::Max => wgpu::BlendOperation::Max,
    }
}

fn convert_blend_component(component: BlendComponent) -> wgpu::BlendComponent {
    wgpu::BlendComponent {
        src_factor: convert_blend_factor(component.src_factor),
        dst_factor: convert_blend_factor(component.dst_factor),
        operation: convert_blend_operation(component.operation),
    }
}

/// Color target state for the capture target with the given blend state.
///
/// A non-blending state maps to `blend: None`.
pub fn convert_color_target(format: TextureFormat, blend: &BlendState) -> wgpu::ColorTargetState {
    wgpu::ColorTargetState {
        format: convert_texture_format(format),
        blend: blend.is_blending().then(|| wgpu::BlendState {
            color: convert_blend_component(blend.color),
            alpha: convert_blend_component(blend.alpha),
        }),
        write_mask: wgpu::ColorWrites::from_bits_truncate(blend.write_mask.bits()),
    }
}

/// Front face and culled face for a cull mode, assuming counter-clockwise front faces.
pub fn convert_cull_mode(mode: CullMode) -> (wgpu::FrontFace, Option<wgpu::Face>) {
    match mode {
        CullMode::None => (wgpu::FrontFace::Ccw, None),
        CullMode::Cw => (wgpu::FrontFace::Ccw, Some(wgpu::Face::Back)),
        CullMode::Ccw => (wgpu::FrontFace::Ccw, Some(wgpu::Face::Front)),
    }
}

pub fn convert_fill_mode(mode: FillMode) -> wgpu::PolygonMode {
    match mode {
        FillMode::Solid => wgpu::PolygonMode::Fill,
        FillMode::Wireframe => wgpu::PolygonMode::Line,
    }
}

pub fn convert_load_op(op: LoadOp) -> wgpu::LoadOp<wgpu::Color> {
    match op {
        LoadOp::Clear([r, g, b, a]) => wgpu::LoadOp::Clear(wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: a as f64,
        }),
        LoadOp::Load => wgpu::LoadOp::Load,
    }
}

pub fn convert_store_op(op: StoreOp) -> wgpu::StoreOp {
    match op {
        StoreOp::Store => wgpu::StoreOp::Store,
        StoreOp::Discard => wgpu::StoreOp::Discard,
    }
}

/// Render pipeline state of one capture pass draw
#[derive(Debug, Clone, PartialEq)]
pub struct CapturePipelineState {
    pub color_target: wgpu::ColorTargetState,
    pub primitive: wgpu::PrimitiveState,
    /// Features the device must have enabled for this pipeline.
    pub required_features: wgpu::Features,
}

/// Pipeline state for `command` rendering into a target of `format`.
///
/// The capture pass binds no depth target, so there is no depth/stencil state.
pub fn convert_pipeline_state(command: &MeshDrawCommand, format: TextureFormat) -> CapturePipelineState {
    let blend = &command.pass_state.blend_state;
    let (front_face, cull_mode) = convert_cull_mode(command.cull_mode);

    let mut required_features = wgpu::Features::empty();
    if blend.uses_dual_source() {
        required_features |= wgpu::Features::DUAL_SOURCE_BLENDING;
    }
    if command.fill_mode == FillMode::Wireframe {
        required_features |= wgpu::Features::POLYGON_MODE_LINE;
    }

    CapturePipelineState {
        color_target: convert_color_target(format, blend),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face,
            cull_mode,
            polygon_mode: convert_fill_mode(command.fill_mode),
            ..Default::default()
        },
        required_features,
    }
}
