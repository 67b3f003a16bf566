//! A CPU-only programmable rasterization pipeline: tiled barycentric scan
//! conversion, perspective-correct interpolation and a small GL-ES-2-style
//! shader model.

pub mod error;
pub mod framebuffer;
pub mod graphics;
pub mod interpolate;
pub mod math;
pub mod pipeline;
pub mod rasterizer;
pub mod sampler;
pub mod texture;
pub mod threadpool;
pub mod vertex;

pub use error::{RasterError, Result};
pub use framebuffer::Framebuffer;
pub use graphics::{Graphics, MatrixProvider, MatrixUniforms, Mesh, MeshSource, Submesh, TextureSource};
pub use interpolate::Interpolate;
pub use pipeline::{DepthFunc, DepthRange, FragmentContext, FragmentOutput, Program, RasterConfig, Viewport};
pub use sampler::{FilterMode, Sampler2D, SamplerCube, WrapMode};
pub use texture::{CubeFace, CubeTexture, Texture, TextureBuffer, TextureLayout};
pub use vertex::Vertex;
