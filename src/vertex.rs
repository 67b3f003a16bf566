//! The fixed input attribute record and the pipeline-internal per-vertex /
//! per-face bookkeeping built from it during `VertexAssembly`.

use core::ops::{Deref, DerefMut};
use vek::{Rgba, Vec2, Vec3, Vec4};

/// A 32-byte aligned wrapper around a vertex's varyings block (spec §3's
/// "contiguous float-aligned... implementation constant, e.g. 32-byte,
/// block"), grounded on the original engine's `Memory::alignedMalloc` /
/// `SOFTGL_ALIGNMENT = 32`. Wraps the bound program's generic
/// `VertexData` rather than a raw float buffer — the varyings layout
/// here is ordinary Rust struct layout, not a hand-packed offset table,
/// so the alignment constant applies to the whole per-vertex block
/// instead of to bytes within it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[repr(align(32))]
pub struct AlignedVaryings<Va>(pub Va);

impl<Va> Deref for AlignedVaryings<Va> {
    type Target = Va;
    fn deref(&self) -> &Va {
        &self.0
    }
}

impl<Va> DerefMut for AlignedVaryings<Va> {
    fn deref_mut(&mut self) -> &mut Va {
        &mut self.0
    }
}

impl<Va> From<Va> for AlignedVaryings<Va> {
    fn from(varyings: Va) -> Self {
        Self(varyings)
    }
}

/// A fixed vertex attribute record, as supplied by a `MeshSource`.
///
/// Attribute presence is implicit: a `MeshSource` that doesn't populate a
/// given attribute for a submesh leaves it at its `Default` (zero vector,
/// transparent black colour). The rasterizer never branches on which
/// attributes are "present" — it always reads all five fields.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub position: Vec3<f32>,
    pub texcoord: Vec2<f32>,
    pub normal: Vec3<f32>,
    pub tangent: Vec4<f32>,
    pub color: Rgba<f32>,
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            position: Vec3::zero(),
            texcoord: Vec2::zero(),
            normal: Vec3::zero(),
            tangent: Vec4::zero(),
            color: Rgba::zero(),
        }
    }
}

/// Pipeline-internal record for a single vertex after `VertexAssembly` and
/// `VertexShading`.
///
/// One `VertexRecord` is allocated per input vertex for the duration of a
/// single draw call; the varyings it owns are dropped (or reused for the
/// next draw) once rasterization of every face referencing it has
/// completed.
#[derive(Clone, Debug)]
pub struct VertexRecord<Va> {
    pub id: u32,
    pub attrs: Vertex,
    /// Clip-space position written by the vertex stage (`gl_Position`).
    pub clip_position: Vec4<f32>,
    /// `1 / clip_position.w`, cached during `PerspectiveDivide`.
    pub inv_w: f32,
    /// Window-space position after `ViewportTransform`: `(x, y, z)`.
    pub window_position: Vec3<f32>,
    /// The varyings the vertex shader produced, to be interpolated
    /// per-fragment.
    pub varyings: AlignedVaryings<Va>,
    /// Frustum-plane membership bitmask. The core rasterizer treats
    /// triangles as already accepted whole (see the Rasterizer module's
    /// edge-case notes on clipping); a non-core clipper may consult this.
    pub clip_mask: u32,
}

/// Pipeline-internal record for one triangle, built during `FaceAssembly`.
#[derive(Clone, Copy, Debug)]
pub struct FaceRecord {
    pub indices: [u32; 3],
    /// Set when the face should be skipped entirely: failed backface cull,
    /// degenerate after viewport snap, or entirely outside the bounding
    /// box of the target.
    pub discard: bool,
    pub front_facing: bool,
}

impl FaceRecord {
    pub fn new(indices: [u32; 3]) -> Self {
        Self { indices, discard: false, front_facing: true }
    }
}
