//! The programmable shader contract (§4.3) and the small configuration
//! structs a [`crate::graphics::Graphics`] facade exposes as draw state
//! (§6): viewport, depth range, depth test/write/func, backface culling.

use crate::interpolate::Interpolate;
use vek::{Rgba, Vec4};

/// A depth-test function, selected from the eight standard comparisons.
///
/// The default, [`DepthFunc::Greater`], is paired by convention with a
/// `0.0` depth clear and the reversed-Z viewport mapping (§4.4.1 step 4)
/// to spread floating-point precision evenly across the frustum.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DepthFunc {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

impl Default for DepthFunc {
    fn default() -> Self {
        DepthFunc::Greater
    }
}

impl DepthFunc {
    /// Evaluate the test: does `new` pass against the `old` depth already
    /// stored in the framebuffer?
    ///
    /// `EQUAL`/`NOTEQUAL` use a tolerance scaled by the magnitude of the
    /// compared values, matching hardware depth-compare semantics instead
    /// of a bit-exact float comparison.
    #[inline]
    pub fn test(self, new: f32, old: f32) -> bool {
        match self {
            DepthFunc::Never => false,
            DepthFunc::Always => true,
            DepthFunc::Less => new < old,
            DepthFunc::LessEqual => new <= old,
            DepthFunc::Greater => new > old,
            DepthFunc::GreaterEqual => new >= old,
            DepthFunc::Equal => nearly_eq(new, old),
            DepthFunc::NotEqual => !nearly_eq(new, old),
        }
    }
}

#[inline]
fn nearly_eq(a: f32, b: f32) -> bool {
    let tol = f32::EPSILON * a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= tol
}

/// The viewport transform's destination rectangle, in window pixels.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn for_size(width: usize, height: usize) -> Self {
        Self { x: 0.0, y: 0.0, width: width as f32, height: height as f32 }
    }
}

/// The depth range `[n, f]` window coordinates are mapped into (§4.4.1).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DepthRange {
    pub near: f32,
    pub far: f32,
}

impl Default for DepthRange {
    fn default() -> Self {
        Self { near: 0.1, far: 100.0 }
    }
}

/// Draw-call state a [`crate::graphics::Graphics`] facade mutates between
/// draws: viewport, depth range, depth test/write/func, and backface
/// culling. Grouped the way `euc`'s `DepthMode`/`CoordinateMode` group
/// related knobs into small `Copy` structs rather than loose fields on the
/// facade.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RasterConfig {
    pub viewport: Viewport,
    pub depth_range: DepthRange,
    pub depth_test_enable: bool,
    pub depth_write_mask: bool,
    pub depth_func: DepthFunc,
    pub backface_cull_enable: bool,
    /// Side length of a rasterizer work-item block (§4.4.2). An
    /// implementation constant exposed here for testing, not part of the
    /// external interface contract in §6.
    pub block_size: usize,
}

impl RasterConfig {
    pub fn for_target_size(width: usize, height: usize) -> Self {
        Self { viewport: Viewport::for_size(width, height), ..Self::default() }
    }
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::new(0.0, 0.0, 0.0, 0.0),
            depth_range: DepthRange::default(),
            depth_test_enable: true,
            depth_write_mask: true,
            depth_func: DepthFunc::default(),
            backface_cull_enable: true,
            block_size: 32,
        }
    }
}

/// Everything the fragment stage reads besides its own varyings and the
/// uniforms: `gl_FragCoord`, `gl_FrontFacing`, and the enclosing 2x2 quad's
/// four corner varyings, from which a shader can derive its own
/// screen-space derivatives for `texture_2d`'s automatic LOD (§4.3, §4.5 —
/// "derivatives come from the 2x2 quad's varying deltas").
///
/// `quad_varyings` is always populated, in pixel-scan order
/// `[(0,0), (1,0), (0,1), (1,1)]` relative to the quad's top-left corner,
/// even for corners outside the triangle or the framebuffer bounds (defined
/// via the same off-triangle float barycentric weights used for inside
/// pixels, so the varyings — and their deltas — stay well-defined across
/// the whole quad).
#[derive(Clone, Debug)]
pub struct FragmentContext<Va> {
    /// `(x_window, y_window, z_ndc_mapped, 1/clip_w)`.
    pub frag_coord: Vec4<f32>,
    pub front_facing: bool,
    pub quad_varyings: [Va; 4],
}

/// Everything the fragment stage writes besides the varyings-derived
/// color: an optional depth override and the discard flag (§4.3).
#[derive(Copy, Clone, Debug)]
pub struct FragmentOutput<Pixel> {
    pub color: Pixel,
    /// Overrides `gl_FragCoord.z` for the depth test/write if set.
    pub depth_override: Option<f32>,
    pub discard: bool,
}

impl<Pixel> FragmentOutput<Pixel> {
    pub fn new(color: Pixel) -> Self {
        Self { color, depth_override: None, discard: false }
    }

    pub fn discarded() -> Self
    where
        Pixel: Default,
    {
        Self { color: Pixel::default(), depth_override: None, discard: true }
    }
}

/// Pairs a vertex stage and fragment stage with a shared uniform block and
/// a shared varyings layout (§4.3).
///
/// A `Program` must be safely shareable across the rasterizer's worker
/// threads: `Uniform` is read-only for the whole draw, and varyings travel
/// between threads by value (each fragment-stage invocation gets its own
/// interpolated copy), so both carry `Send + Sync`.
pub trait Program: Send + Sync {
    /// Shared, read-only uniform state (transformation matrices, bound
    /// samplers, material constants).
    type Uniform: Send + Sync;
    /// Per-vertex input attributes.
    type Vertex;
    /// Varyings passed from the vertex stage to the fragment stage,
    /// perspective-correctly interpolated in between.
    type VertexData: Clone + Send + Sync + Interpolate;
    /// The color type written to the framebuffer's color plane. Must
    /// convert to linear `RGBA` float so the rasterizer can quantize it
    /// into the framebuffer's fixed 8-bit-per-channel color plane (§4.1),
    /// while still letting a `Program` work in whatever color type (e.g.
    /// `Rgb<f32>` with an implied opaque alpha) its fragment stage prefers.
    type Pixel: Clone + Send + Sync + Default + Into<Rgba<f32>>;

    /// The vertex stage: writes `gl_Position` (returned as clip-space
    /// `[x, y, z, w]`) and the varyings passed to the fragment stage.
    fn vertex(&self, uniform: &Self::Uniform, vertex: &Self::Vertex) -> ([f32; 4], Self::VertexData);

    /// The fragment stage: reads interpolated varyings and `gl_FragCoord`/
    /// `gl_FrontFacing`, produces a color, optional depth override, and
    /// discard flag.
    fn fragment(
        &self,
        uniform: &Self::Uniform,
        ctx: FragmentContext<Self::VertexData>,
        varyings: &Self::VertexData,
    ) -> FragmentOutput<Self::Pixel>;
}
