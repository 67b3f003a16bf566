//! Pixel-index layouts a [`super::TextureBuffer`] can choose at construction
//! time (§4.2, §9 "Polymorphic texture buffers").
//!
//! Layout is opaque to callers: `TextureBuffer::get`/`set` never expose
//! `index`. A tagged enum with a per-variant `convert_index` is used
//! instead of `dyn Trait` dispatch, since the index computation sits in
//! the rasterizer's innermost 2x2-quad sampling loop.

/// Selects how `(x, y)` texel coordinates map to a linear storage index.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TextureLayout {
    /// `index(x, y) = y * W + x`.
    Linear,
    /// 4x4 tiles for 2x2-quad spatial locality, with the tile side a power
    /// of two so the index can be computed with shifts and masks.
    Tiled,
    /// Reserved: plug-in Morton/Z-order layout. The core supports it
    /// through this same enum; no production code path selects it yet.
    Morton,
}

/// Tile side length for [`TextureLayout::Tiled`]. `TILE` is a power of two
/// (`BITS = log2(TILE)`) so `/` and `%` become `>>` and `&`.
const TILE: u32 = 4;
const BITS: u32 = 2;

impl TextureLayout {
    /// The padded storage dimensions for a `width x height` buffer under
    /// this layout (may exceed `width`/`height` so that tiles/blocks divide
    /// evenly).
    pub fn inner_size(self, width: usize, height: usize) -> (usize, usize) {
        match self {
            TextureLayout::Linear => (width, height),
            TextureLayout::Tiled => {
                let tw = (width + TILE as usize - 1) / TILE as usize;
                let th = (height + TILE as usize - 1) / TILE as usize;
                (tw * TILE as usize, th * TILE as usize)
            }
            TextureLayout::Morton => (width.next_power_of_two(), height.next_power_of_two()),
        }
    }

    /// Map `(x, y)` to a linear index into the buffer's backing storage.
    ///
    /// `inner_width`/`inner_height` are this layout's `inner_size` for the
    /// buffer being indexed.
    #[inline]
    pub fn index(self, x: u32, y: u32, inner_width: u32, _inner_height: u32) -> u32 {
        match self {
            TextureLayout::Linear => y * inner_width + x,
            TextureLayout::Tiled => {
                let tile_w = inner_width >> BITS;
                let tile_x = x >> BITS;
                let tile_y = y >> BITS;
                let in_tile_x = x & (TILE - 1);
                let in_tile_y = y & (TILE - 1);
                ((tile_y * tile_w + tile_x) << BITS << BITS) + (in_tile_y << BITS) + in_tile_x
            }
            TextureLayout::Morton => morton_interleave(x, y),
        }
    }
}

/// Interleave the bits of `x` and `y` into a Morton (Z-order) code.
/// Reserved for [`TextureLayout::Morton`]; not exercised by any sampler
/// path in this crate yet (see the struct doc).
fn morton_interleave(x: u32, y: u32) -> u32 {
    fn spread(mut v: u32) -> u32 {
        v &= 0x0000ffff;
        v = (v | (v << 8)) & 0x00ff00ff;
        v = (v | (v << 4)) & 0x0f0f0f0f;
        v = (v | (v << 2)) & 0x33333333;
        v = (v | (v << 1)) & 0x55555555;
        v
    }
    spread(x) | (spread(y) << 1)
}
