//! Texture sampling from shaders (§4.2, §4.5): wrap modes, filter modes,
//! 2D and cube sampling.

use crate::math::rem_euclid_i32;
use crate::texture::{CubeFace, CubeTexture, Texture, TextureBuffer};
use vek::{Rgba, Vec2, Vec3};

/// How an out-of-`[0, W)` texel coordinate is resolved.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum WrapMode {
    Repeat,
    MirroredRepeat,
    ClampToEdge,
    ClampToBorder,
    ClampToZero,
}

/// Opaque black, zero alpha — the fixed color `CLAMP_TO_BORDER` returns.
/// No API exposes a user-settable border color (§9 Open Questions).
pub const BORDER_COLOR: Rgba<f32> = Rgba { r: 0.0, g: 0.0, b: 0.0, a: 0.0 };

/// Resolve one axis of a texel coordinate against `size` under `mode`.
/// Returns `None` when the mode says to emit a constant color instead of
/// reading a texel (`CLAMP_TO_BORDER`/`CLAMP_TO_ZERO` out of range).
#[inline]
fn wrap_axis(mode: WrapMode, x: i32, size: i32) -> Option<i32> {
    if size <= 0 {
        return None;
    }
    match mode {
        WrapMode::Repeat => Some(rem_euclid_i32(x, size)),
        WrapMode::MirroredRepeat => {
            let period = 2 * size;
            let m = rem_euclid_i32(x, period);
            Some(if m < size { m } else { period - 1 - m })
        }
        WrapMode::ClampToEdge => Some(x.clamp(0, size - 1)),
        WrapMode::ClampToBorder | WrapMode::ClampToZero => {
            if x >= 0 && x < size {
                Some(x)
            } else {
                None
            }
        }
    }
}

/// Color to substitute for an axis that resolved to "out of range" under a
/// clamp-to-constant wrap mode.
#[inline]
fn constant_for(mode: WrapMode) -> Rgba<f32> {
    match mode {
        WrapMode::ClampToBorder => BORDER_COLOR,
        _ => Rgba::zero(),
    }
}

fn sample_texel(buf: &TextureBuffer<Rgba<f32>>, x: i32, y: i32, wrap: WrapMode) -> Rgba<f32> {
    let w = buf.width() as i32;
    let h = buf.height() as i32;
    match (wrap_axis(wrap, x, w), wrap_axis(wrap, y, h)) {
        (Some(x), Some(y)) => buf.get(x as usize, y as usize),
        _ => constant_for(wrap),
    }
}

/// Nearest-neighbor sample: round `(u, v) * (W, H)` to the nearest texel
/// center, then apply the integer `offset` (post-wrap, §4.5
/// `texture_2d_lod_offset`).
fn sample_nearest(buf: &TextureBuffer<Rgba<f32>>, uv: Vec2<f32>, wrap: WrapMode, offset: Vec2<i32>) -> Rgba<f32> {
    let x = (uv.x * buf.width() as f32).floor() as i32 + offset.x;
    let y = (uv.y * buf.height() as f32).floor() as i32 + offset.y;
    sample_texel(buf, x, y, wrap)
}

/// Bilinear sample between the four nearest texels; fractional offsets
/// derived from `(u*W - 0.5, v*H - 0.5)` per §4.2.
fn sample_bilinear(buf: &TextureBuffer<Rgba<f32>>, uv: Vec2<f32>, wrap: WrapMode, offset: Vec2<i32>) -> Rgba<f32> {
    let fx = uv.x * buf.width() as f32 - 0.5;
    let fy = uv.y * buf.height() as f32 - 0.5;
    let x0 = fx.floor() as i32 + offset.x;
    let y0 = fy.floor() as i32 + offset.y;
    let tx = fx - fx.floor();
    let ty = fy - fy.floor();

    let t00 = sample_texel(buf, x0, y0, wrap);
    let t10 = sample_texel(buf, x0 + 1, y0, wrap);
    let t01 = sample_texel(buf, x0, y0 + 1, wrap);
    let t11 = sample_texel(buf, x0 + 1, y0 + 1, wrap);

    let top = t00 * (1.0 - tx) + t10 * tx;
    let bottom = t01 * (1.0 - tx) + t11 * tx;
    top * (1.0 - ty) + bottom * ty
}

/// Filtering strategy, including the four mipmap variants (§4.2).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FilterMode {
    Nearest,
    Linear,
    NearestMipmapNearest,
    LinearMipmapNearest,
    NearestMipmapLinear,
    LinearMipmapLinear,
}

impl FilterMode {
    fn uses_mipmaps(self) -> bool {
        !matches!(self, FilterMode::Nearest | FilterMode::Linear)
    }

    fn base_filter(self) -> BaseFilter {
        match self {
            FilterMode::Nearest | FilterMode::NearestMipmapNearest | FilterMode::NearestMipmapLinear => {
                BaseFilter::Nearest
            }
            FilterMode::Linear | FilterMode::LinearMipmapNearest | FilterMode::LinearMipmapLinear => {
                BaseFilter::Linear
            }
        }
    }

    fn mip_blend(self) -> MipBlend {
        match self {
            FilterMode::NearestMipmapLinear | FilterMode::LinearMipmapLinear => MipBlend::Linear,
            _ => MipBlend::Nearest,
        }
    }
}

#[derive(Copy, Clone)]
enum BaseFilter {
    Nearest,
    Linear,
}

#[derive(Copy, Clone)]
enum MipBlend {
    Nearest,
    Linear,
}

fn sample_level(buf: &TextureBuffer<Rgba<f32>>, uv: Vec2<f32>, filter: BaseFilter, wrap: WrapMode, offset: Vec2<i32>) -> Rgba<f32> {
    match filter {
        BaseFilter::Nearest => sample_nearest(buf, uv, wrap, offset),
        BaseFilter::Linear => sample_bilinear(buf, uv, wrap, offset),
    }
}

/// A 2D texture sampler: a wrap mode and a filter mode bound together, as a
/// fragment shader would hold it as a uniform (§4.5).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Sampler2D {
    pub wrap: WrapMode,
    pub filter: FilterMode,
}

impl Default for Sampler2D {
    fn default() -> Self {
        Self { wrap: WrapMode::Repeat, filter: FilterMode::Linear }
    }
}

impl Sampler2D {
    pub fn new(wrap: WrapMode, filter: FilterMode) -> Self {
        Self { wrap, filter }
    }

    /// `texture_2d`/`texture_2d_lod`/`texture_2d_lod_offset` (§4.5).
    pub fn sample(&self, texture: &Texture, uv: Vec2<f32>, lod: f32, offset: Vec2<i32>) -> Rgba<f32> {
        if !self.filter.uses_mipmaps() {
            return sample_level(texture.level(0), uv, self.filter.base_filter(), self.wrap, offset);
        }

        let max_level = texture.max_level() as f32;
        let lod = lod.clamp(0.0, max_level);
        let base = self.filter.base_filter();
        match self.filter.mip_blend() {
            MipBlend::Nearest => {
                let level = lod.round() as usize;
                sample_level(texture.level(level), uv, base, self.wrap, offset)
            }
            MipBlend::Linear => {
                let l1 = lod.floor() as usize;
                let l2 = lod.ceil() as usize;
                let s1 = sample_level(texture.level(l1), uv, base, self.wrap, offset);
                let s2 = sample_level(texture.level(l2), uv, base, self.wrap, offset);
                let t = lod - lod.floor();
                s1 * (1.0 - t) + s2 * t
            }
        }
    }

    /// A reasonable screen-space-derivative LOD estimate (§4.5): grows
    /// monotonically with the quad's UV footprint, scaled by the texture's
    /// texel density.
    pub fn estimate_lod(texture: &Texture, duv_dx: Vec2<f32>, duv_dy: Vec2<f32>) -> f32 {
        let w2 = (texture.width() * texture.width()) as f32;
        let h2 = (texture.height() * texture.height()) as f32;
        let footprint = duv_dx.magnitude_squared().max(duv_dy.magnitude_squared());
        if footprint <= 0.0 {
            return 0.0;
        }
        (0.5 * (footprint * (w2 + h2)).log2()).max(0.0)
    }
}

/// A cube sampler: wrap mode applies per-face (edges of adjoining faces are
/// not stitched), filter mode as in [`Sampler2D`] (§4.5 `texture_cube`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SamplerCube {
    pub filter: FilterMode,
}

impl Default for SamplerCube {
    fn default() -> Self {
        Self { filter: FilterMode::Linear }
    }
}

impl SamplerCube {
    /// Select the major axis of `dir` to pick a face and project the
    /// remaining two components into a `[0, 1]` UV, then delegate to 2D
    /// sampling on that face.
    pub fn sample(&self, cube: &CubeTexture, dir: Vec3<f32>, lod: f32) -> Rgba<f32> {
        let (face, uv) = major_axis_uv(dir);
        let sampler_2d = Sampler2D { wrap: WrapMode::ClampToEdge, filter: self.filter };
        sampler_2d.sample(cube.face(face), uv, lod, Vec2::zero())
    }
}

/// Major-axis face selection and per-face UV projection, as used by the GL
/// cube-map sampling convention.
fn major_axis_uv(dir: Vec3<f32>) -> (CubeFace, Vec2<f32>) {
    let (ax, ay, az) = (dir.x.abs(), dir.y.abs(), dir.z.abs());
    let (face, sc, tc, ma) = if ax >= ay && ax >= az {
        if dir.x > 0.0 {
            (CubeFace::PositiveX, -dir.z, -dir.y, ax)
        } else {
            (CubeFace::NegativeX, dir.z, -dir.y, ax)
        }
    } else if ay >= ax && ay >= az {
        if dir.y > 0.0 {
            (CubeFace::PositiveY, dir.x, dir.z, ay)
        } else {
            (CubeFace::NegativeY, dir.x, -dir.z, ay)
        }
    } else {
        if dir.z > 0.0 {
            (CubeFace::PositiveZ, dir.x, -dir.y, az)
        } else {
            (CubeFace::NegativeZ, -dir.x, -dir.y, az)
        }
    };
    let u = 0.5 * (sc / ma + 1.0);
    let v = 0.5 * (tc / ma + 1.0);
    (face, Vec2::new(u, v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::TextureLayout;

    fn checker() -> Texture {
        let mut buf = TextureBuffer::new(2, 2, TextureLayout::Linear);
        buf.set(0, 0, Rgba::new(1.0, 0.0, 0.0, 1.0)); // red
        buf.set(1, 0, Rgba::new(0.0, 1.0, 0.0, 1.0)); // green
        buf.set(0, 1, Rgba::new(0.0, 0.0, 1.0, 1.0)); // blue
        buf.set(1, 1, Rgba::new(1.0, 1.0, 1.0, 1.0)); // white
        Texture::new(buf)
    }

    #[test]
    fn wrap_repeat_matches_shifted_uv() {
        let tex = checker();
        let s = Sampler2D::new(WrapMode::Repeat, FilterMode::Nearest);
        let a = s.sample(&tex, Vec2::new(0.25, 0.25), 0.0, Vec2::zero());
        let b = s.sample(&tex, Vec2::new(1.25, 0.25), 0.0, Vec2::zero());
        let c = s.sample(&tex, Vec2::new(-0.75, 0.25), 0.0, Vec2::zero());
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn wrap_repeat_nearest_out_of_range_uv_matches_its_wrapped_equivalent() {
        // uv=(1.25, 0.25) and uv=(0.25, 0.25) floor to the same wrapped
        // texel (0, 0), i.e. red under the checker layout above.
        let tex = checker();
        let s = Sampler2D::new(WrapMode::Repeat, FilterMode::Nearest);
        let sample = s.sample(&tex, Vec2::new(1.25, 0.25), 0.0, Vec2::zero());
        assert_eq!(sample, Rgba::new(1.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn wrap_clamp_to_edge_idempotent() {
        let tex = checker();
        let s = Sampler2D::new(WrapMode::ClampToEdge, FilterMode::Nearest);
        let a = s.sample(&tex, Vec2::new(1.5, 0.0), 0.0, Vec2::zero());
        let b = s.sample(&tex, Vec2::new(1.0, 0.0), 0.0, Vec2::zero());
        assert_eq!(a, b);
    }

    #[test]
    fn clamp_to_border_returns_opaque_black_zero_alpha() {
        let tex = checker();
        let s = Sampler2D::new(WrapMode::ClampToBorder, FilterMode::Nearest);
        let sample = s.sample(&tex, Vec2::new(5.0, 5.0), 0.0, Vec2::zero());
        assert_eq!(sample, BORDER_COLOR);
    }

    #[test]
    fn clamp_to_zero_returns_transparent_black() {
        let tex = checker();
        let s = Sampler2D::new(WrapMode::ClampToZero, FilterMode::Nearest);
        let sample = s.sample(&tex, Vec2::new(5.0, 5.0), 0.0, Vec2::zero());
        assert_eq!(sample, Rgba::zero());
    }

    #[test]
    fn mipmap_fallback_before_ready_equals_level_zero_sample() {
        let tex = checker();
        let s = Sampler2D::new(WrapMode::ClampToEdge, FilterMode::LinearMipmapLinear);
        let mip = s.sample(&tex, Vec2::new(0.5, 0.5), 2.0, Vec2::zero());
        let base = s.sample(&tex, Vec2::new(0.5, 0.5), 0.0, Vec2::zero());
        assert_eq!(mip, base);
    }
}
