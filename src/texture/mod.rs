//! Texture storage and the mipmap chain (§4.2).

pub mod layout;

pub use layout::TextureLayout;

use crate::math::round_up_pow2;
use core::sync::atomic::{AtomicBool, Ordering};
use vek::Rgba;

/// A width x height container for `T`, with the index-mapping layout
/// chosen at construction time and hidden behind `get`/`set`.
#[derive(Clone, Debug)]
pub struct TextureBuffer<T> {
    width: usize,
    height: usize,
    inner_width: usize,
    inner_height: usize,
    layout: TextureLayout,
    data: Vec<T>,
}

impl<T: Clone + Default> TextureBuffer<T> {
    pub fn new(width: usize, height: usize, layout: TextureLayout) -> Self {
        let (inner_width, inner_height) = layout.inner_size(width, height);
        Self {
            width,
            height,
            inner_width,
            inner_height,
            layout,
            data: vec![T::default(); inner_width * inner_height],
        }
    }
}

impl<T: Clone> TextureBuffer<T> {
    pub fn filled(width: usize, height: usize, layout: TextureLayout, value: T) -> Self {
        let (inner_width, inner_height) = layout.inner_size(width, height);
        Self {
            width,
            height,
            inner_width,
            inner_height,
            layout,
            data: vec![value; inner_width * inner_height],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn idx(&self, x: usize, y: usize) -> usize {
        self.layout.index(x as u32, y as u32, self.inner_width as u32, self.inner_height as u32) as usize
    }

    /// Read the texel at `(x, y)`. Panics if out of bounds (callers are
    /// expected to wrap/clamp coordinates before calling this — see
    /// `crate::sampler`).
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> T {
        debug_assert!(x < self.width && y < self.height);
        self.data[self.idx(x, y)].clone()
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        debug_assert!(x < self.width && y < self.height);
        let idx = self.idx(x, y);
        self.data[idx] = value;
    }
}

/// A 2x2 box filter of `src`, clamping to the edge at the boundary, used to
/// build each mipmap level from the previous one.
fn box_filter_down(src: &TextureBuffer<Rgba<f32>>) -> TextureBuffer<Rgba<f32>> {
    let (sw, sh) = (src.width(), src.height());
    let (dw, dh) = ((sw / 2).max(1), (sh / 2).max(1));
    let mut dst = TextureBuffer::filled(dw, dh, TextureLayout::Linear, Rgba::zero());
    for y in 0..dh {
        for x in 0..dw {
            let x0 = (x * 2).min(sw - 1);
            let y0 = (y * 2).min(sh - 1);
            let x1 = (x * 2 + 1).min(sw - 1);
            let y1 = (y * 2 + 1).min(sh - 1);
            let sum = src.get(x0, y0) + src.get(x1, y0) + src.get(x0, y1) + src.get(x1, y1);
            dst.set(x, y, sum / 4.0);
        }
    }
    dst
}

/// Bilinear-resample `src` into a `dst_w x dst_h` buffer, used to build
/// mipmap level 0 when the source isn't already square power-of-two.
fn resample_bilinear(src: &TextureBuffer<Rgba<f32>>, dst_w: usize, dst_h: usize) -> TextureBuffer<Rgba<f32>> {
    let (sw, sh) = (src.width(), src.height());
    if sw == dst_w && sh == dst_h {
        return src.clone();
    }
    let mut dst = TextureBuffer::filled(dst_w, dst_h, TextureLayout::Linear, Rgba::zero());
    for y in 0..dst_h {
        for x in 0..dst_w {
            let u = (x as f32 + 0.5) / dst_w as f32 * sw as f32 - 0.5;
            let v = (y as f32 + 0.5) / dst_h as f32 * sh as f32 - 0.5;
            let x0 = u.floor().max(0.0) as usize;
            let y0 = v.floor().max(0.0) as usize;
            let x1 = (x0 + 1).min(sw - 1);
            let y1 = (y0 + 1).min(sh - 1);
            let x0 = x0.min(sw - 1);
            let y0 = y0.min(sh - 1);
            let fx = (u - u.floor()).clamp(0.0, 1.0);
            let fy = (v - v.floor()).clamp(0.0, 1.0);
            let t00 = src.get(x0, y0);
            let t10 = src.get(x1, y0);
            let t01 = src.get(x0, y1);
            let t11 = src.get(x1, y1);
            let top = t00 * (1.0 - fx) + t10 * fx;
            let bottom = t01 * (1.0 - fx) + t11 * fx;
            dst.set(x, y, top * (1.0 - fy) + bottom * fy);
        }
    }
    dst
}

/// A sampleable 2D texture: a base image plus a lazily-built mipmap chain.
pub struct Texture {
    base: TextureBuffer<Rgba<f32>>,
    mipmaps: Vec<TextureBuffer<Rgba<f32>>>,
    ready: AtomicBool,
    generating: AtomicBool,
}

impl Texture {
    pub fn new(base: TextureBuffer<Rgba<f32>>) -> Self {
        Self { base, mipmaps: Vec::new(), ready: AtomicBool::new(false), generating: AtomicBool::new(false) }
    }

    pub fn width(&self) -> usize {
        self.base.width()
    }

    pub fn height(&self) -> usize {
        self.base.height()
    }

    pub fn base(&self) -> &TextureBuffer<Rgba<f32>> {
        &self.base
    }

    pub fn mipmaps_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// The highest valid mip level: `0` until the chain is built.
    pub fn max_level(&self) -> usize {
        if self.mipmaps_ready() {
            self.mipmaps.len() - 1
        } else {
            0
        }
    }

    /// Fetch level `level`, clamped to `[0, max_level()]`. Falls back to
    /// the base image while the chain isn't ready yet (§4.2 "Mipmap
    /// fallback").
    pub fn level(&self, level: usize) -> &TextureBuffer<Rgba<f32>> {
        if !self.mipmaps_ready() {
            return &self.base;
        }
        &self.mipmaps[level.min(self.mipmaps.len() - 1)]
    }

    /// Trigger mipmap generation if it hasn't started yet, building
    /// synchronously on the calling (first-requesting) thread.
    ///
    /// Requires `&mut self` to actually build, since the chain is owned
    /// storage rather than behind interior mutability — callers that only
    /// have `&Texture` (fragment-shader samplers) instead consult
    /// [`Texture::mipmaps_ready`] and fall back to level 0, exactly as
    /// spec'd; the one-shot build itself happens at bind/load time through
    /// [`crate::graphics::Graphics`], which holds `&mut Texture`.
    pub fn ensure_mipmaps(&mut self) {
        if self.mipmaps_ready() {
            return;
        }
        if self.generating.swap(true, Ordering::AcqRel) {
            return;
        }
        log::debug!(
            "building mipmap chain for a {}x{} texture",
            self.base.width(),
            self.base.height()
        );
        self.build_mipmaps();
    }

    fn build_mipmaps(&mut self) {
        let m = round_up_pow2(self.base.width().max(self.base.height()) as u32) as usize;
        let mut level0 = resample_bilinear(&self.base, m, m);
        // `resample_bilinear` early-returns a clone when sizes already
        // match, which covers the "pure copy" case from §4.2 step 1.
        let mut chain = Vec::new();
        let mut size = m;
        loop {
            chain.push(core::mem::replace(&mut level0, TextureBuffer::filled(1, 1, TextureLayout::Linear, Rgba::zero())));
            if size == 1 {
                break;
            }
            let next = box_filter_down(chain.last().unwrap());
            size = next.width();
            level0 = next;
        }
        self.mipmaps = chain;
        self.ready.store(true, Ordering::Release);
    }
}

/// The six faces of a cube map, indexed by [`CubeFace`].
pub struct CubeTexture {
    pub faces: [Texture; 6],
}

/// A cube map face, named the way a `TextureSource` binds +X/-X/+Y/-Y/+Z/-Z
/// images (§4.5 `texture_cube`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CubeFace {
    PositiveX = 0,
    NegativeX = 1,
    PositiveY = 2,
    NegativeY = 3,
    PositiveZ = 4,
    NegativeZ = 5,
}

impl CubeTexture {
    pub fn face(&self, face: CubeFace) -> &Texture {
        &self.faces[face as usize]
    }
}
