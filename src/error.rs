use thiserror::Error;

/// Errors surfaced at the `Graphics` facade boundary.
///
/// Per the error-handling design, only programmer contract violations and
/// resource allocation failures become [`RasterError`]s. Degenerate
/// triangles, out-of-bounds pixel writes and clamp-to-border/zero texture
/// samples are domain edge cases with defined (non-error) semantics and
/// never reach this type.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RasterError {
    /// A framebuffer or texture was requested with a zero width or height.
    #[error("cannot create a {width}x{height} surface: both dimensions must be non-zero")]
    ZeroDimension { width: usize, height: usize },

    /// `draw_mesh` was called before `use_program` bound a program.
    #[error("no program is bound; call `use_program` before drawing")]
    NoProgramBound,

    /// The per-draw varyings arena for `count` vertices could not be
    /// allocated (`Vec::try_reserve_exact` failed).
    #[error("failed to allocate varyings storage for {count} vertices")]
    VaryingAllocFailed { count: usize },
}

pub type Result<T> = core::result::Result<T, RasterError>;
