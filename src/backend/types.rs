//! Fixed-function state and render target types shared by the pass and the command list

use bitflags::bitflags;

/// Texture format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    Rgba8Unorm,
    Rgba8UnormSrgb,
    Bgra8Unorm,
    Rgba16Float,
    R32Float,
}

impl TextureFormat {
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            TextureFormat::Rgba8Unorm
            | TextureFormat::Rgba8UnormSrgb
            | TextureFormat::Bgra8Unorm
            | TextureFormat::R32Float => 4,
            TextureFormat::Rgba16Float => 8,
        }
    }
}

bitflags! {
    /// Usage flags for textures.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u32 {
        const COPY_SRC = 1 << 0;
        const COPY_DST = 1 << 1;
        /// Texture can be sampled in a shader.
        const TEXTURE_BINDING = 1 << 2;
        /// Texture can be used as a render attachment.
        const RENDER_ATTACHMENT = 1 << 4;
    }
}

/// Texture descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDescriptor {
    pub label: Option<String>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub usage: TextureUsage,
}

impl TextureDescriptor {
    /// Descriptor for a color target that is rendered to and later sampled.
    pub fn color_target(label: &str, width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            label: Some(label.to_string()),
            width,
            height,
            format,
            usage: TextureUsage::RENDER_ATTACHMENT | TextureUsage::TEXTURE_BINDING,
        }
    }
}

/// GPU access state of a texture, used for transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceAccess {
    /// Sampled from graphics shaders
    ShaderResource,
    /// Bound as a color attachment
    RenderTarget,
}

/// Rasterizer fill mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FillMode {
    #[default]
    Solid,
    Wireframe,
}

/// Rasterizer cull mode.
///
/// `Cw` culls clockwise-wound triangles, `Ccw` culls counter-clockwise ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullMode {
    None,
    #[default]
    Cw,
    Ccw,
}

/// Compare function for depth/stencil
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareFunction {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

/// Blend factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    Src,
    OneMinusSrc,
    SrcAlpha,
    OneMinusSrcAlpha,
    Dst,
    OneMinusDst,
    DstAlpha,
    OneMinusDstAlpha,
    /// Second pixel shader output color (dual source blending)
    Src1,
    /// Second pixel shader output alpha (dual source blending)
    Src1Alpha,
}

/// Blend operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendOperation {
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

/// Blend component state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendComponent {
    pub src_factor: BlendFactor,
    pub dst_factor: BlendFactor,
    pub operation: BlendOperation,
}

impl BlendComponent {
    pub const REPLACE: Self = Self {
        src_factor: BlendFactor::One,
        dst_factor: BlendFactor::Zero,
        operation: BlendOperation::Add,
    };
}

impl Default for BlendComponent {
    fn default() -> Self {
        Self::REPLACE
    }
}

bitflags! {
    /// Color channel write mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ColorWrites: u32 {
        const RED = 1 << 0;
        const GREEN = 1 << 1;
        const BLUE = 1 << 2;
        const ALPHA = 1 << 3;
        const ALL = 0xF;
    }
}

/// Blend state for the single color target of a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendState {
    pub color: BlendComponent,
    pub alpha: BlendComponent,
    pub write_mask: ColorWrites,
}

impl BlendState {
    /// Plain RGBA write, no blending.
    pub fn color_write() -> Self {
        Self {
            color: BlendComponent::REPLACE,
            alpha: BlendComponent::REPLACE,
            write_mask: ColorWrites::ALL,
        }
    }

    /// Premultiplied additive blend where the pixel shader's second output
    /// carries the destination factor.
    pub fn dual_source_additive() -> Self {
        Self {
            color: BlendComponent {
                src_factor: BlendFactor::One,
                dst_factor: BlendFactor::Src1,
                operation: BlendOperation::Add,
            },
            alpha: BlendComponent {
                src_factor: BlendFactor::One,
                dst_factor: BlendFactor::Src1Alpha,
                operation: BlendOperation::Add,
            },
            write_mask: ColorWrites::ALL,
        }
    }

    /// Whether this state actually blends with the destination.
    pub fn is_blending(&self) -> bool {
        self.color != BlendComponent::REPLACE || self.alpha != BlendComponent::REPLACE
    }

    /// Whether a factor reads the pixel shader's second output.
    pub fn uses_dual_source(&self) -> bool {
        [self.color, self.alpha].iter().any(|c| {
            [c.src_factor, c.dst_factor]
                .iter()
                .any(|f| matches!(f, BlendFactor::Src1 | BlendFactor::Src1Alpha))
        })
    }
}

impl Default for BlendState {
    fn default() -> Self {
        Self::color_write()
    }
}

/// Depth/stencil state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthStencilState {
    pub depth_write_enabled: bool,
    pub depth_compare: CompareFunction,
}

impl DepthStencilState {
    /// No depth target is bound: writes off, test never passes.
    pub const DISABLED: Self = Self {
        depth_write_enabled: false,
        depth_compare: CompareFunction::Never,
    };
}

/// Operation to perform when loading an attachment at the start of a render pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoadOp {
    Clear([f32; 4]),
    Load,
}

impl LoadOp {
    pub fn is_clear(&self) -> bool {
        matches!(self, LoadOp::Clear(_))
    }
}

/// Operation to perform when storing an attachment at the end of a render pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Store,
    Discard,
}

/// Viewport in pixels plus depth range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub min_x: f32,
    pub min_y: f32,
    pub min_z: f32,
    pub max_x: f32,
    pub max_y: f32,
    pub max_z: f32,
}

impl Viewport {
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }
}
