//! End-to-end draws through the public `Graphics` facade: one triangle
//! against a clear background, a full-screen constant-color quad, the two
//! depth-test conventions, a wrapped texture sample, and a perspective
//! foreshortening sanity check.

use softrast::{
    DepthFunc, FragmentContext, FragmentOutput, Graphics, MatrixUniforms, Mesh, Program, Submesh, Vertex,
};
use vek::{Mat4, Rgba, Vec2, Vec3};

/// A uniform block with nothing a shader needs beyond what the bound
/// `Program` already carries by value; the facade still requires
/// `MatrixUniforms` to drive `set_model_matrix` and friends; none of these
/// tests use them so the setters are no-ops.
#[derive(Default)]
struct EmptyUniform;

impl MatrixUniforms for EmptyUniform {
    fn set_model_matrix(&mut self, _m: Mat4<f32>) {}
    fn set_view_matrix(&mut self, _m: Mat4<f32>) {}
    fn set_proj_matrix(&mut self, _m: Mat4<f32>) {}
}

fn quad(v0: Vertex, v1: Vertex, v2: Vertex, v3: Vertex) -> Mesh {
    Mesh { submeshes: vec![Submesh { vertices: vec![v0, v1, v2, v3], indices: vec![0, 1, 2, 0, 2, 3] }] }
}

fn vertex_at(x: f32, y: f32, z: f32) -> Vertex {
    Vertex { position: Vec3::new(x, y, z), ..Vertex::default() }
}

/// Maps a desired window-space coordinate back to NDC for a viewport
/// covering `[0, dim)`, so a vertex shader that passes `position` straight
/// through as clip-space lands exactly on that window coordinate.
fn window_to_ndc(window: f32, dim: f32) -> f32 {
    window / (0.5 * dim) - 1.0
}

/// A constant-color program: the vertex stage treats `position` as clip
/// space directly (`w = 1`), the fragment stage writes `self.color` and,
/// when set, overrides the depth with `self.depth_override`.
struct ConstantProgram {
    color: Rgba<f32>,
    depth_override: Option<f32>,
}

#[derive(Clone, Copy, Default)]
struct NoVaryings;
impl softrast::Interpolate for NoVaryings {
    fn lerp2(_: Self, _: Self, _: f32, _: f32) -> Self {
        NoVaryings
    }
    fn lerp3(_: Self, _: Self, _: Self, _: f32, _: f32, _: f32) -> Self {
        NoVaryings
    }
}

impl Program for ConstantProgram {
    type Uniform = EmptyUniform;
    type Vertex = Vertex;
    type VertexData = NoVaryings;
    type Pixel = Rgba<f32>;

    fn vertex(&self, _uniform: &Self::Uniform, vertex: &Self::Vertex) -> ([f32; 4], Self::VertexData) {
        ([vertex.position.x, vertex.position.y, vertex.position.z, 1.0], NoVaryings)
    }

    fn fragment(
        &self,
        _uniform: &Self::Uniform,
        _ctx: FragmentContext<Self::VertexData>,
        _varyings: &Self::VertexData,
    ) -> FragmentOutput<Self::Pixel> {
        let mut out = FragmentOutput::new(self.color);
        out.depth_override = self.depth_override;
        out
    }
}

#[test]
fn triangle_covers_its_interior_and_leaves_the_background_clear() {
    let mut gfx = Graphics::<ConstantProgram>::init(8, 8).unwrap();
    gfx.use_program(ConstantProgram { color: Rgba::new(1.0, 0.0, 0.0, 1.0), depth_override: None });
    gfx.set_depth_test_enable(false);
    gfx.clear(0.0, 0.0, 0.0, 1.0);

    // A big right triangle over window coordinates (2,2)-(6,2)-(2,6): its
    // centroid-ish pixel (3,3) is solidly interior, far corners of the
    // framebuffer are solidly outside its bounding box.
    let v = |wx: f32, wy: f32| vertex_at(window_to_ndc(wx, 8.0), window_to_ndc(wy, 8.0), 0.0);
    let mesh = Mesh {
        submeshes: vec![Submesh {
            vertices: vec![v(2.0, 2.0), v(6.0, 2.0), v(2.0, 6.0)],
            indices: vec![0, 1, 2],
        }],
    };
    gfx.draw_mesh(&mesh).unwrap();
    gfx.swap_buffers();

    let bytes = gfx.get_output().color_bytes();
    let pixel = |x: usize, y: usize| &bytes[(y * 8 + x) * 4..(y * 8 + x) * 4 + 4];
    assert_eq!(pixel(3, 3), &[255, 0, 0, 255]);
    assert_eq!(pixel(7, 7), &[0, 0, 0, 255]);
    assert_eq!(pixel(0, 0), &[0, 0, 0, 255]);
}

#[test]
fn full_screen_quad_fills_every_pixel_with_the_constant_color() {
    let mut gfx = Graphics::<ConstantProgram>::init(16, 16).unwrap();
    gfx.use_program(ConstantProgram { color: Rgba::new(0.0, 1.0, 0.0, 1.0), depth_override: None });
    gfx.set_depth_test_enable(false);
    gfx.clear(0.0, 0.0, 0.0, 1.0);

    let v = |x: f32, y: f32| vertex_at(x, y, 0.0);
    let mesh = quad(v(-1.0, -1.0), v(1.0, -1.0), v(1.0, 1.0), v(-1.0, 1.0));
    gfx.draw_mesh(&mesh).unwrap();
    gfx.swap_buffers();

    for chunk in gfx.get_output().color_bytes().chunks_exact(4) {
        assert_eq!(chunk, &[0, 255, 0, 255]);
    }
}

#[test]
fn depth_test_less_keeps_the_nearer_draw() {
    let mut gfx = Graphics::<ConstantProgram>::init(8, 8).unwrap();
    gfx.set_depth_func(DepthFunc::Less);
    gfx.clear(0.0, 0.0, 0.0, 1.0);
    gfx.clear_depth(1.0);

    let v = |x: f32, y: f32| vertex_at(x, y, 0.0);
    let mesh = quad(v(-1.0, -1.0), v(1.0, -1.0), v(1.0, 1.0), v(-1.0, 1.0));

    gfx.use_program(ConstantProgram { color: Rgba::new(1.0, 0.0, 0.0, 1.0), depth_override: Some(0.3) });
    gfx.draw_mesh(&mesh).unwrap();
    gfx.use_program(ConstantProgram { color: Rgba::new(0.0, 1.0, 0.0, 1.0), depth_override: Some(0.7) });
    gfx.draw_mesh(&mesh).unwrap();
    gfx.swap_buffers();

    for chunk in gfx.get_output().color_bytes().chunks_exact(4) {
        assert_eq!(chunk, &[255, 0, 0, 255]);
    }
    for &z in gfx.get_output().depth_slice() {
        assert!((z - 0.3).abs() < 1e-6);
    }
}

#[test]
fn reversed_z_with_greater_keeps_the_farther_draw() {
    let mut gfx = Graphics::<ConstantProgram>::init(8, 8).unwrap();
    // `Greater` + a `0.0` depth clear is the facade's default (reversed-Z).
    gfx.clear(0.0, 0.0, 0.0, 1.0);
    gfx.clear_depth(0.0);

    let v = |x: f32, y: f32| vertex_at(x, y, 0.0);
    let mesh = quad(v(-1.0, -1.0), v(1.0, -1.0), v(1.0, 1.0), v(-1.0, 1.0));

    gfx.use_program(ConstantProgram { color: Rgba::new(1.0, 0.0, 0.0, 1.0), depth_override: Some(0.3) });
    gfx.draw_mesh(&mesh).unwrap();
    gfx.use_program(ConstantProgram { color: Rgba::new(0.0, 1.0, 0.0, 1.0), depth_override: Some(0.7) });
    gfx.draw_mesh(&mesh).unwrap();
    gfx.swap_buffers();

    for chunk in gfx.get_output().color_bytes().chunks_exact(4) {
        assert_eq!(chunk, &[0, 255, 0, 255]);
    }
    for &z in gfx.get_output().depth_slice() {
        assert!((z - 0.7).abs() < 1e-6);
    }
}

struct TexturedProgram {
    texture: softrast::Texture,
    sampler: softrast::Sampler2D,
}

impl Program for TexturedProgram {
    type Uniform = EmptyUniform;
    type Vertex = Vertex;
    type VertexData = Vec2<f32>;
    type Pixel = Rgba<f32>;

    fn vertex(&self, _uniform: &Self::Uniform, vertex: &Self::Vertex) -> ([f32; 4], Self::VertexData) {
        ([vertex.position.x, vertex.position.y, vertex.position.z, 1.0], vertex.texcoord)
    }

    fn fragment(
        &self,
        _uniform: &Self::Uniform,
        _ctx: FragmentContext<Self::VertexData>,
        uv: &Self::VertexData,
    ) -> FragmentOutput<Self::Pixel> {
        FragmentOutput::new(self.sampler.sample(&self.texture, *uv, 0.0, Vec2::zero()))
    }
}

#[test]
fn wrapped_texture_sample_through_the_full_pipeline() {
    use softrast::{FilterMode, TextureBuffer, TextureLayout, WrapMode};

    let mut buf = TextureBuffer::new(2, 2, TextureLayout::Linear);
    buf.set(0, 0, Rgba::new(1.0, 0.0, 0.0, 1.0));
    buf.set(1, 0, Rgba::new(0.0, 1.0, 0.0, 1.0));
    buf.set(0, 1, Rgba::new(0.0, 0.0, 1.0, 1.0));
    buf.set(1, 1, Rgba::new(1.0, 1.0, 1.0, 1.0));
    let texture = softrast::Texture::new(buf);

    let mut gfx = Graphics::<TexturedProgram>::init(1, 1).unwrap();
    gfx.set_depth_test_enable(false);
    gfx.clear(0.0, 0.0, 0.0, 1.0);
    gfx.use_program(TexturedProgram {
        texture,
        sampler: softrast::Sampler2D::new(WrapMode::Repeat, FilterMode::Nearest),
    });

    // Every vertex carries the same (1.25, 0.25) texcoord, so every covered
    // fragment samples exactly that uv regardless of interpolation weights.
    let mk = |x: f32, y: f32| Vertex { position: Vec3::new(x, y, 0.0), texcoord: Vec2::new(1.25, 0.25), ..Vertex::default() };
    let mesh = quad(mk(-1.0, -1.0), mk(1.0, -1.0), mk(1.0, 1.0), mk(-1.0, 1.0));
    gfx.draw_mesh(&mesh).unwrap();
    gfx.swap_buffers();

    // uv=(1.25, 0.25) wraps to the same texel as uv=(0.25, 0.25): (0, 0), red.
    assert_eq!(gfx.get_output().color_bytes(), &[255, 0, 0, 255]);
}

struct StripeProgram;
impl Program for StripeProgram {
    type Uniform = EmptyUniform;
    type Vertex = Vertex;
    type VertexData = f32;
    type Pixel = Rgba<f32>;

    fn vertex(&self, _uniform: &Self::Uniform, vertex: &Self::Vertex) -> ([f32; 4], Self::VertexData) {
        let z = vertex.position.z;
        ([vertex.position.x, vertex.position.y, z, z], vertex.texcoord.y)
    }

    fn fragment(
        &self,
        _uniform: &Self::Uniform,
        _ctx: FragmentContext<Self::VertexData>,
        v: &Self::VertexData,
    ) -> FragmentOutput<Self::Pixel> {
        let band = (*v * 4.0).floor().clamp(0.0, 3.0) as u32;
        let color = match band {
            0 => Rgba::new(1.0, 0.0, 0.0, 1.0),
            1 => Rgba::new(0.0, 1.0, 0.0, 1.0),
            2 => Rgba::new(0.0, 0.0, 1.0, 1.0),
            _ => Rgba::new(1.0, 1.0, 1.0, 1.0),
        };
        FragmentOutput::new(color)
    }
}

/// Perspective foreshortening: a ground-plane quad receding from `z=1`
/// (near) to `z=10` (far), striped into four equal world-space depth bands
/// via `texcoord.y`. A true perspective (`w = z`) projection compresses
/// equal world-space depth intervals into progressively smaller screen-space
/// gaps toward the horizon, so the on-screen stripe closest to the far edge
/// must be narrower than the one closest to the near edge.
#[test]
fn perspective_divide_compresses_distant_stripes() {
    let height = 128usize;
    let mut gfx = Graphics::<StripeProgram>::init(height, height).unwrap();
    gfx.use_program(StripeProgram);
    gfx.set_depth_test_enable(false);
    gfx.clear(0.0, 0.0, 0.0, 1.0);

    let mk = |x: f32, z: f32, v: f32| Vertex {
        position: Vec3::new(x, -1.0, z),
        texcoord: Vec2::new(0.0, v),
        ..Vertex::default()
    };
    // y = -1 (constant height) the whole way across; only z (and so the
    // perspective-divided screen row) varies with the v texcoord.
    let mesh = quad(mk(-1.0, 1.0, 0.0), mk(1.0, 1.0, 0.0), mk(1.0, 10.0, 1.0), mk(-1.0, 10.0, 1.0));
    gfx.draw_mesh(&mesh).unwrap();
    gfx.swap_buffers();

    let bytes = gfx.get_output().color_bytes();
    let mid_x = height / 2;
    let row_color = |y: usize| {
        let idx = (y * height + mid_x) * 4;
        &bytes[idx..idx + 4]
    };

    // Walk down the middle column and record the first row at which each
    // band's color appears.
    let colors = [[255u8, 0, 0, 255], [0, 255, 0, 255], [0, 0, 255, 255], [255, 255, 255, 255]];
    let mut band_start = [None; 4];
    for y in 0..height {
        let c = row_color(y);
        for (band, expected) in colors.iter().enumerate() {
            if band_start[band].is_none() && c == expected {
                band_start[band] = Some(y);
            }
        }
    }
    let starts: Vec<usize> = band_start.iter().map(|s| s.expect("every band must appear on screen")).collect();

    let near_gap = starts[1] as f32 - starts[0] as f32;
    let far_gap = starts[3] as f32 - starts[2] as f32;
    assert!(
        far_gap < near_gap,
        "far stripe (gap {far_gap}) should be narrower on screen than the near stripe (gap {near_gap})"
    );
}
