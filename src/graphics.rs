//! The `Graphics` facade (§6): the stateful entry point a host application
//! drives one frame at a time.

use crate::error::{RasterError, Result};
use crate::framebuffer::Framebuffer;
use crate::pipeline::{DepthFunc, DepthRange, Program, RasterConfig, Viewport};
use crate::rasterizer;
use crate::texture::{Texture, TextureBuffer, TextureLayout};
use crate::threadpool::ThreadPool;
use crate::vertex::{AlignedVaryings, FaceRecord, Vertex, VertexRecord};
use vek::{Mat4, Rgba, Vec3, Vec4};

/// A shared uniform block a [`Graphics`] facade can drive generically: the
/// three standard transform matrices. A `Program::Uniform` that wants
/// `set_model_matrix`/`set_view_matrix`/`set_proj_matrix` support from the
/// facade implements this; the fragment/vertex stages still read whatever
/// else they need straight off the concrete `Uniform` type.
pub trait MatrixUniforms {
    fn set_model_matrix(&mut self, m: Mat4<f32>);
    fn set_view_matrix(&mut self, m: Mat4<f32>);
    fn set_proj_matrix(&mut self, m: Mat4<f32>);
}

/// One drawable piece of a [`Mesh`]: an independent vertex/index array pair
/// (§6 "per submesh, a vertex array and an index array").
#[derive(Clone, Debug, Default)]
pub struct Submesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

/// A drawable collection of submeshes, as `draw_mesh` consumes it.
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    pub submeshes: Vec<Submesh>,
}

/// An external mesh provider the core consumes but never implements (§6).
pub trait MeshSource {
    fn to_mesh(&self) -> Mesh;
}

/// An external pixel data provider for textures (§6).
pub trait TextureSource {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    /// The color at `(x, y)`, already decoded to linear `RGBA` float.
    fn get_pixel(&self, x: usize, y: usize) -> Rgba<f32>;
}

/// Build a [`Texture`] by sampling every texel of a [`TextureSource`] once.
pub fn texture_from_source<S: TextureSource>(source: &S) -> Texture {
    let (w, h) = (source.width(), source.height());
    let mut buf = TextureBuffer::new(w, h, TextureLayout::Linear);
    for y in 0..h {
        for x in 0..w {
            buf.set(x, y, source.get_pixel(x, y));
        }
    }
    Texture::new(buf)
}

/// An `image` crate decode, adapted to [`TextureSource`] (gated behind the
/// `image` feature, not part of the core's external-interface contract —
/// §6 explicitly keeps image decoding out of the core).
#[cfg(feature = "image")]
pub struct DecodedImage(image_::RgbaImage);

#[cfg(feature = "image")]
impl DecodedImage {
    pub fn new(image: image_::DynamicImage) -> Self {
        Self(image.to_rgba8())
    }
}

#[cfg(feature = "image")]
impl TextureSource for DecodedImage {
    fn width(&self) -> usize {
        self.0.width() as usize
    }

    fn height(&self) -> usize {
        self.0.height() as usize
    }

    fn get_pixel(&self, x: usize, y: usize) -> Rgba<f32> {
        let px = self.0.get_pixel(x as u32, y as u32);
        Rgba::new(
            px[0] as f32 / 255.0,
            px[1] as f32 / 255.0,
            px[2] as f32 / 255.0,
            px[3] as f32 / 255.0,
        )
    }
}

/// An external camera/scene matrix provider the core consumes (§6). A host
/// calls [`Graphics::sync_matrices_from`] once per frame to pull the three
/// matrices into the bound program's uniform.
pub trait MatrixProvider {
    fn model_matrix(&self) -> Mat4<f32>;
    fn view_matrix(&self) -> Mat4<f32>;
    fn proj_matrix(&self) -> Mat4<f32>;
}

/// The stateful rendering facade (§6). Generic over one bound [`Program`]
/// whose vertex input is the crate's fixed [`Vertex`] attribute record — the
/// spec's data model fixes vertex attributes once, at the `MeshSource`
/// boundary, rather than per-material.
pub struct Graphics<P: Program<Vertex = Vertex>>
where
    P::Uniform: MatrixUniforms,
{
    front: Framebuffer,
    back: Framebuffer,
    config: RasterConfig,
    program: Option<P>,
    uniform: Option<P::Uniform>,
    pool: ThreadPool,
}

impl<P: Program<Vertex = Vertex>> Graphics<P>
where
    P::Uniform: MatrixUniforms,
{
    /// Allocate front and back framebuffers, with the default viewport
    /// `{0, 0, W, H}` and default depth range `{n=0.1, f=100.0}` (§6).
    pub fn init(width: usize, height: usize) -> Result<Self> {
        let front = Framebuffer::new(width, height)?;
        let back = Framebuffer::new(width, height)?;
        let config = RasterConfig::for_target_size(width, height);
        let pool = ThreadPool::with_hardware_parallelism();
        Ok(Self { front, back, config, program: None, uniform: None, pool })
    }

    /// Bind a program; any subsequent draw uses its shader pair and
    /// uniforms. The uniform block is reset to `Default`.
    pub fn use_program(&mut self, program: P)
    where
        P::Uniform: Default,
    {
        log::debug!("binding a new program; uniform block reset to its default");
        self.uniform = Some(P::Uniform::default());
        self.program = Some(program);
    }

    pub fn set_model_matrix(&mut self, m: Mat4<f32>) {
        if let Some(u) = &mut self.uniform {
            u.set_model_matrix(m);
        }
    }

    pub fn set_view_matrix(&mut self, m: Mat4<f32>) {
        if let Some(u) = &mut self.uniform {
            u.set_view_matrix(m);
        }
    }

    pub fn set_proj_matrix(&mut self, m: Mat4<f32>) {
        if let Some(u) = &mut self.uniform {
            u.set_proj_matrix(m);
        }
    }

    /// Pull all three matrices from an external [`MatrixProvider`] in one
    /// call.
    pub fn sync_matrices_from(&mut self, provider: &dyn MatrixProvider) {
        self.set_model_matrix(provider.model_matrix());
        self.set_view_matrix(provider.view_matrix());
        self.set_proj_matrix(provider.proj_matrix());
    }

    pub fn set_viewport(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.config.viewport = Viewport::new(x, y, width, height);
    }

    pub fn set_depth_range(&mut self, near: f32, far: f32) {
        self.config.depth_range = DepthRange { near, far };
    }

    pub fn set_depth_test_enable(&mut self, enable: bool) {
        self.config.depth_test_enable = enable;
    }

    pub fn set_depth_write_mask(&mut self, enable: bool) {
        self.config.depth_write_mask = enable;
    }

    pub fn set_depth_func(&mut self, func: DepthFunc) {
        self.config.depth_func = func;
    }

    pub fn set_backface_cull_enable(&mut self, enable: bool) {
        self.config.backface_cull_enable = enable;
    }

    /// Clear both front and back color planes (§6).
    pub fn clear(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.front.clear_color(r, g, b, a);
        self.back.clear_color(r, g, b, a);
    }

    /// Clear the back depth plane (§6).
    pub fn clear_depth(&mut self, z: f32) {
        self.back.clear_depth(z);
    }

    /// Run the full pipeline for every submesh in `mesh` with non-empty
    /// vertices and indices (§6).
    pub fn draw_mesh(&mut self, mesh: &Mesh) -> Result<()> {
        let program = self.program.as_ref().ok_or_else(|| {
            log::error!("draw_mesh called with no program bound");
            RasterError::NoProgramBound
        })?;
        let uniform = self.uniform.as_ref().ok_or(RasterError::NoProgramBound)?;

        for submesh in &mesh.submeshes {
            if submesh.vertices.is_empty() || submesh.indices.is_empty() {
                continue;
            }
            draw_submesh(program, uniform, submesh, &self.config, &self.back, &self.pool)?;
        }
        Ok(())
    }

    /// Exchange front and back buffers (an ownership swap, no copy) (§6).
    pub fn swap_buffers(&mut self) {
        core::mem::swap(&mut self.front, &mut self.back);
    }

    /// The current front framebuffer, for a presenter to blit (§6).
    pub fn get_output(&self) -> &Framebuffer {
        &self.front
    }
}

/// Steps 1-5 of §4.4.1 (VertexAssembly through FaceAssembly/Cull) for one
/// submesh, followed by step 6 (rasterize) via [`rasterizer::rasterize`].
fn draw_submesh<P: Program<Vertex = Vertex>>(
    program: &P,
    uniform: &P::Uniform,
    submesh: &Submesh,
    config: &RasterConfig,
    target: &Framebuffer,
    pool: &ThreadPool,
) -> Result<()> {
    let count = submesh.vertices.len();
    let mut vertex_records: Vec<VertexRecord<P::VertexData>> = Vec::new();
    vertex_records
        .try_reserve_exact(count)
        .map_err(|_| RasterError::VaryingAllocFailed { count })?;
    vertex_records.extend(submesh.vertices.iter().enumerate().map(|(id, attrs)| {
        let (clip, varyings) = program.vertex(uniform, attrs);
        let clip_position = Vec4::new(clip[0], clip[1], clip[2], clip[3]);
        let inv_w = 1.0 / clip_position.w;
        let ndc = Vec3::new(clip_position.x * inv_w, clip_position.y * inv_w, clip_position.z * inv_w);
        let window_position = viewport_transform(ndc, &config.viewport, &config.depth_range);
        VertexRecord {
            id: id as u32,
            attrs: *attrs,
            clip_position,
            inv_w,
            window_position,
            varyings: AlignedVaryings::from(varyings),
            clip_mask: 0,
        }
    }));

    let faces: Vec<FaceRecord> = submesh
        .indices
        .chunks_exact(3)
        .map(|tri| {
            let indices = [tri[0], tri[1], tri[2]];
            let mut face = FaceRecord::new(indices);
            let a = vertex_records[indices[0] as usize].window_position;
            let b = vertex_records[indices[1] as usize].window_position;
            let c = vertex_records[indices[2] as usize].window_position;
            let area2 = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
            face.front_facing = area2 > 0.0;
            if config.backface_cull_enable && !face.front_facing {
                face.discard = true;
            }
            face
        })
        .collect();

    rasterizer::rasterize(program, uniform, &vertex_records, &faces, target, config, pool);
    Ok(())
}

/// Map NDC `(x, y, z)` to window coordinates (§4.4.1 step 4). Uses the
/// reversed-Z mapping unconditionally: `z_w = 0.5*((Zf+Zn) - (Zf-Zn)*z_ndc)`
/// sends NDC `[-1, 1]` to window `[Zf, Zn]`, which combined with the
/// default `GREATER` depth func and a `0.0` depth clear implements
/// reversed-Z; a standard `LESS`-configured draw still gets a valid (if
/// inverted-range) window z from the same formula, since both ends of the
/// spec's open question 2 resolution keep one formula and only vary
/// `depth_func`/clear depth.
fn viewport_transform(ndc: Vec3<f32>, viewport: &Viewport, depth_range: &DepthRange) -> Vec3<f32> {
    let x_w = (ndc.x + 1.0) * 0.5 * viewport.width + viewport.x;
    let y_w = (ndc.y + 1.0) * 0.5 * viewport.height + viewport.y;
    let (zn, zf) = (depth_range.near, depth_range.far);
    let z_w = 0.5 * ((zf + zn) - (zf - zn) * ndc.z);
    Vec3::new(x_w, y_w, z_w)
}
