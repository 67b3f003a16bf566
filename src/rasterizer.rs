//! Edge-function scan conversion with 32x32 block tiling and 2x2 fragment
//! quads (§4.4).

use crate::framebuffer::Framebuffer;
use crate::interpolate::lerp3_perspective;
use crate::pipeline::{FragmentContext, Program, RasterConfig};
use crate::threadpool::ThreadPool;
use crate::vertex::{FaceRecord, VertexRecord};
use vek::{Rgba, Vec2, Vec4};

/// The three integer edge-function coefficients for one triangle edge
/// (`I_k`, `J_k`, `K_k` in §4.4.2).
#[derive(Copy, Clone, Debug)]
struct Edge {
    i: i32,
    j: i32,
    k: i32,
}

impl Edge {
    /// Build the edge function for the directed edge `a -> b`.
    fn new(a: (i32, i32), b: (i32, i32)) -> Self {
        Self {
            i: a.1 - b.1,
            j: b.0 - a.0,
            k: a.0 * b.1 - a.1 * b.0,
        }
    }

    #[inline(always)]
    fn eval(&self, x: i32, y: i32) -> i32 {
        self.i * x + self.j * y + self.k
    }
}

/// Truncate a window-space coordinate to the pixel grid, snapping `+0.5`
/// first as §4.4.2 specifies.
#[inline]
fn snap(v: f32) -> i32 {
    (v + 0.5).floor() as i32
}

/// Rasterize every non-discarded face of one draw call into `framebuffer`,
/// invoking `program`'s fragment stage per covered fragment.
///
/// `vertices` and `faces` have already been through VertexAssembly,
/// VertexShading, PerspectiveDivide, ViewportTransform and FaceAssembly/Cull
/// (§4.4.1 steps 1-5); this function performs step 6 only.
pub fn rasterize<P: Program>(
    program: &P,
    uniform: &P::Uniform,
    vertices: &[VertexRecord<P::VertexData>],
    faces: &[FaceRecord],
    framebuffer: &Framebuffer,
    config: &RasterConfig,
    pool: &ThreadPool,
) {
    for face in faces {
        if face.discard {
            continue;
        }
        rasterize_triangle(program, uniform, vertices, face, framebuffer, config, pool);
        pool.wait_for_tasks();
    }
}

fn rasterize_triangle<P: Program>(
    program: &P,
    uniform: &P::Uniform,
    vertices: &[VertexRecord<P::VertexData>],
    face: &FaceRecord,
    framebuffer: &Framebuffer,
    config: &RasterConfig,
    pool: &ThreadPool,
) {
    let v0 = &vertices[face.indices[0] as usize];
    let v1 = &vertices[face.indices[1] as usize];
    let v2 = &vertices[face.indices[2] as usize];

    let a = (snap(v0.window_position.x), snap(v0.window_position.y));
    let b = (snap(v1.window_position.x), snap(v1.window_position.y));
    let c = (snap(v2.window_position.x), snap(v2.window_position.y));

    let e01 = Edge::new(a, b);
    let e12 = Edge::new(b, c);
    let e20 = Edge::new(c, a);

    // Signed double-area, §4.4.2: sum of the three edge functions evaluated
    // at any shared point collapses to the standard cross-product area.
    let area2 = e01.eval(c.0, c.1) + e12.eval(a.0, a.1) + e20.eval(b.0, b.1);
    if area2 <= 0 {
        return;
    }
    let inv_area = 1.0 / area2 as f32;

    let min_x = a.0.min(b.0).min(c.0).max(0);
    let min_y = a.1.min(b.1).min(c.1).max(0);
    let max_x = a.0.max(b.0).max(c.0).min(framebuffer.width() as i32 - 1);
    let max_y = a.1.max(b.1).max(c.1).min(framebuffer.height() as i32 - 1);
    if min_x > max_x || min_y > max_y {
        return;
    }

    let block_size = config.block_size.max(1) as i32;
    let inv_w = (v0.inv_w, v1.inv_w, v2.inv_w);

    let mut by = min_y;
    while by <= max_y {
        let mut bx = min_x;
        while bx <= max_x {
            let block = Block {
                x0: bx,
                y0: by,
                x1: (bx + block_size - 1).min(max_x),
                y1: (by + block_size - 1).min(max_y),
            };
            let ctx = TriangleContext {
                e12,
                e20,
                e01,
                inv_area,
                inv_w,
                front_facing: face.front_facing,
                v0,
                v1,
                v2,
            };
            // SAFETY: every block covers a disjoint pixel rectangle within
            // this triangle's bounding box, so concurrent
            // `write_exclusive_unchecked` calls across blocks never alias.
            // `program`/`uniform`/the vertex records/`config` all outlive
            // the `wait_for_tasks()` call the caller issues right after
            // this triangle, which the pool's safety contract requires.
            unsafe {
                pool.push_task_scoped(move || {
                    rasterize_block(program, uniform, &ctx, block, framebuffer, config);
                });
            }
            bx += block_size;
        }
        by += block_size;
    }
}

#[derive(Copy, Clone)]
struct Block {
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
}

struct TriangleContext<'a, Va> {
    e12: Edge,
    e20: Edge,
    e01: Edge,
    inv_area: f32,
    inv_w: (f32, f32, f32),
    front_facing: bool,
    v0: &'a VertexRecord<Va>,
    v1: &'a VertexRecord<Va>,
    v2: &'a VertexRecord<Va>,
}

fn rasterize_block<P: Program>(
    program: &P,
    uniform: &P::Uniform,
    ctx: &TriangleContext<P::VertexData>,
    block: Block,
    framebuffer: &Framebuffer,
    config: &RasterConfig,
) {
    let mut qy = block.y0;
    while qy <= block.y1 {
        let mut qx = block.x0;
        while qx <= block.x1 {
            shade_quad(program, uniform, ctx, qx, qy, block, framebuffer, config);
            qx += 2;
        }
        qy += 2;
    }
}

/// One corner of a 2x2 fragment quad: integer edge values, inside flag, and
/// whether the corner is within the block/bounding-box clip.
struct Corner {
    x: i32,
    y: i32,
    f12: i32,
    f20: i32,
    f01: i32,
    inside: bool,
    in_bounds: bool,
}

#[allow(clippy::too_many_arguments)]
fn shade_quad<P: Program>(
    program: &P,
    uniform: &P::Uniform,
    ctx: &TriangleContext<P::VertexData>,
    qx: i32,
    qy: i32,
    block: Block,
    framebuffer: &Framebuffer,
    config: &RasterConfig,
) {
    let offsets = [(0, 0), (1, 0), (0, 1), (1, 1)];
    let corners: [Corner; 4] = offsets.map(|(dx, dy)| {
        let (x, y) = (qx + dx, qy + dy);
        let f12 = ctx.e12.eval(x, y);
        let f20 = ctx.e20.eval(x, y);
        let f01 = ctx.e01.eval(x, y);
        let inside = f12 >= 0 && f20 >= 0 && f01 >= 0;
        let in_bounds = x >= block.x0 && x <= block.x1 && y >= block.y0 && y <= block.y1;
        Corner { x, y, f12, f20, f01, inside, in_bounds }
    });

    if !corners.iter().any(|c| c.inside && c.in_bounds) {
        return;
    }

    // Perspective-corrected barycentric weights and varyings for every
    // corner, defined everywhere in the quad (inside or not) so derivatives
    // between corners are well-formed for automatic texture LOD (§4.5).
    let weights: [(f32, f32, f32); 4] = core::array::from_fn(|i| {
        let corner = &corners[i];
        if corner.inside {
            (
                corner.f12 as f32 * ctx.inv_area,
                corner.f20 as f32 * ctx.inv_area,
                corner.f01 as f32 * ctx.inv_area,
            )
        } else {
            float_barycentric(ctx, corner.x as f32 + 0.5, corner.y as f32 + 0.5)
        }
    });
    let quad_varyings: [P::VertexData; 4] = core::array::from_fn(|i| {
        lerp3_perspective(
            ctx.v0.varyings.0.clone(),
            ctx.v1.varyings.0.clone(),
            ctx.v2.varyings.0.clone(),
            weights[i],
            ctx.inv_w,
        )
    });

    for (i, corner) in corners.iter().enumerate() {
        if !corner.in_bounds {
            continue;
        }

        let (wa, wb, wc) = weights[i];

        let (zw, inv_w_interp) = lerp3_perspective(
            VaryingScalarPair(ctx.v0.window_position.z, ctx.v0.inv_w),
            VaryingScalarPair(ctx.v1.window_position.z, ctx.v1.inv_w),
            VaryingScalarPair(ctx.v2.window_position.z, ctx.v2.inv_w),
            (wa, wb, wc),
            ctx.inv_w,
        )
        .into();

        let frag_coord = Vec4::new(corner.x as f32 + 0.5, corner.y as f32 + 0.5, zw, inv_w_interp);
        let fctx = FragmentContext { frag_coord, front_facing: ctx.front_facing, quad_varyings: quad_varyings.clone() };
        let output = program.fragment(uniform, fctx, &quad_varyings[i]);

        if output.discard || !corner.inside {
            continue;
        }

        let depth = output.depth_override.unwrap_or(zw);
        let (x, y) = (corner.x as usize, corner.y as usize);

        let passes = if config.depth_test_enable {
            let old = unsafe { framebuffer.read_depth_exclusive_unchecked(x, y) };
            config.depth_func.test(depth, old)
        } else {
            true
        };

        if !passes {
            continue;
        }

        let color = pixel_to_rgba8(output.color);
        let depth_to_write = if config.depth_test_enable && config.depth_write_mask {
            Some(depth)
        } else {
            None
        };
        unsafe {
            framebuffer.write_exclusive_unchecked(x, y, Some(color), depth_to_write);
        }
    }
}

/// A helper newtype so `(f32, f32)` pairs (`z_window`, `1/w`) can ride
/// through [`lerp3_perspective`]'s `Interpolate` bound without reaching for
/// the blanket tuple impls, which would also interpolate unrelated tuple
/// varyings the same way.
#[derive(Copy, Clone)]
struct VaryingScalarPair(f32, f32);

impl crate::interpolate::Interpolate for VaryingScalarPair {
    fn lerp2(a: Self, b: Self, x: f32, y: f32) -> Self {
        VaryingScalarPair(a.0 * x + b.0 * y, a.1 * x + b.1 * y)
    }
    fn lerp3(a: Self, b: Self, c: Self, x: f32, y: f32, z: f32) -> Self {
        VaryingScalarPair(a.0 * x + b.0 * y + c.0 * z, a.1 * x + b.1 * y + c.1 * z)
    }
}

impl From<VaryingScalarPair> for (f32, f32) {
    fn from(p: VaryingScalarPair) -> Self {
        (p.0, p.1)
    }
}

/// Floating-point cross-product barycentric weights at `(px, py)`, used for
/// the outside pixels of an active quad so that varyings (and their
/// derivatives) are defined everywhere in the quad (§4.4.2).
fn float_barycentric<Va>(ctx: &TriangleContext<Va>, px: f32, py: f32) -> (f32, f32, f32) {
    let a = Vec2::new(ctx.v0.window_position.x, ctx.v0.window_position.y);
    let b = Vec2::new(ctx.v1.window_position.x, ctx.v1.window_position.y);
    let c = Vec2::new(ctx.v2.window_position.x, ctx.v2.window_position.y);
    let p = Vec2::new(px, py);

    let area = |u: Vec2<f32>, v: Vec2<f32>, w: Vec2<f32>| (v.x - u.x) * (w.y - u.y) - (v.y - u.y) * (w.x - u.x);
    let total = area(a, b, c);
    if total.abs() < f32::EPSILON {
        return (1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0);
    }
    let wa = area(b, c, p) / total;
    let wb = area(c, a, p) / total;
    let wc = area(a, b, p) / total;
    (wa, wb, wc)
}

#[inline]
fn pixel_to_rgba8<Pixel: Into<Rgba<f32>>>(pixel: Pixel) -> Rgba<u8> {
    let Rgba { r, g, b, a } = pixel.into();
    let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    Rgba::new(q(r), q(g), q(b), q(a))
}

/// Screen-space derivative estimate for a varying across one 2x2 quad,
/// used by samplers computing a texture LOD (§4.5).
pub fn quad_derivative(v00: Vec2<f32>, v10: Vec2<f32>, v01: Vec2<f32>) -> (Vec2<f32>, Vec2<f32>) {
    (v10 - v00, v01 - v00)
}
