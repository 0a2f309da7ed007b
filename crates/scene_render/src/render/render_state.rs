//! Fixed-function render state types
//!
//! Plain enums for the pipeline state a [`RenderData`](crate::render::RenderData)
//! carries, plus the draw-order queue bands.

use bitflags::bitflags;

/// Coarse draw-order band; each band spans [`RenderQueue::BAND_WIDTH`] orders
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RenderQueue {
    /// Stencil writers, drawn first
    Stencil = -1000,
    /// Skybox, far background
    Background = 1000,
    /// Opaque solid objects
    Geometry = 2000,
    /// Transparent objects (back-to-front sorted)
    Transparent = 3000,
    /// UI, screen-space effects
    Overlay = 4000,
}

impl RenderQueue {
    /// Number of rendering orders in one band
    pub const BAND_WIDTH: i32 = 1000;

    /// Rendering order at the start of the band
    pub const fn order(self) -> i32 {
        self as i32
    }

    /// Band a rendering order falls in; anything below `Background` is `Stencil`
    pub fn band_of(order: i32) -> Self {
        [Self::Overlay, Self::Transparent, Self::Geometry, Self::Background]
            .into_iter()
            .find(|band| order >= band.order())
            .unwrap_or(Self::Stencil)
    }

    /// Position of `order` inside its band, clamped to the band width
    pub fn offset_in_band(order: i32) -> i32 {
        (order - Self::band_of(order).order()).clamp(0, Self::BAND_WIDTH - 1)
    }
}

/// Blend equation factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    /// 0
    Zero,
    /// 1
    One,
    /// Source color
    SrcColor,
    /// 1 - source color
    OneMinusSrcColor,
    /// Destination color
    DstColor,
    /// 1 - destination color
    OneMinusDstColor,
    /// Source alpha
    SrcAlpha,
    /// 1 - source alpha
    OneMinusSrcAlpha,
    /// Destination alpha
    DstAlpha,
    /// 1 - destination alpha
    OneMinusDstAlpha,
}

/// Depth/stencil comparison function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompareFunc {
    /// Never passes
    Never,
    /// Passes if less
    Less,
    /// Passes if equal
    Equal,
    /// Passes if less or equal
    LessEqual,
    /// Passes if greater
    Greater,
    /// Passes if not equal
    NotEqual,
    /// Passes if greater or equal
    GreaterEqual,
    /// Always passes
    #[default]
    Always,
}

/// Stencil buffer update operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StencilOp {
    /// Keep the current value
    #[default]
    Keep,
    /// Set to zero
    Zero,
    /// Replace with the reference value
    Replace,
    /// Increment, clamping at max
    Increment,
    /// Increment, wrapping to zero
    IncrementWrap,
    /// Decrement, clamping at zero
    Decrement,
    /// Decrement, wrapping to max
    DecrementWrap,
    /// Bitwise invert
    Invert,
}

/// Face culling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullFace {
    /// Cull back faces
    #[default]
    Back,
    /// Cull front faces
    Front,
    /// No culling
    None,
}

/// Primitive assembly mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DrawMode {
    /// Point list
    Points,
    /// Line list
    Lines,
    /// Connected line strip
    LineStrip,
    /// Closed line loop
    LineLoop,
    /// Triangle list
    #[default]
    Triangles,
    /// Triangle strip
    TriangleStrip,
    /// Triangle fan
    TriangleFan,
}

bitflags! {
    /// Eyes a renderable is drawn for
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RenderMask: u32 {
        /// Left eye (or the mono view)
        const LEFT = 0x1;
        /// Right eye
        const RIGHT = 0x2;
    }
}

impl Default for RenderMask {
    fn default() -> Self {
        Self::LEFT | Self::RIGHT
    }
}
