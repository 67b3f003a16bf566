/// A trait used to enable types to be interpolated throughout the rasterization process
pub trait Interpolate {
    /// Linearly scale two items of this type and sum them
    #[inline(always)]
    fn lerp2(a: Self, b: Self, x: f32, y: f32) -> Self;

    /// Linearly scale three items of this type and sum them
    #[inline(always)]
    fn lerp3(a: Self, b: Self, c: Self, x: f32, y: f32, z: f32) -> Self;
}

// Default impls for certain types
macro_rules! impl_interpolate_for {
    ($t:ty) => {
        impl Interpolate for $t {
            #[inline(always)]
            fn lerp2(a: Self, b: Self, x: f32, y: f32) -> Self {
                a * x + b * y
            }
            #[inline(always)]
            fn lerp3(a: Self, b: Self, c: Self, x: f32, y: f32, z: f32) -> Self {
                a * x + b * y + c * z
            }
        }
    };
}
impl_interpolate_for!(f32);
impl_interpolate_for!(vek::Vec2<f32>);
impl_interpolate_for!(vek::Vec3<f32>);
impl_interpolate_for!(vek::Vec4<f32>);
impl_interpolate_for!(vek::Rgb<f32>);
impl_interpolate_for!(vek::Rgba<f32>);

impl<T: Interpolate, U: Interpolate> Interpolate for (T, U) {
    #[inline(always)]
    fn lerp2(a: Self, b: Self, x: f32, y: f32) -> Self {
        (T::lerp2(a.0, b.0, x, y), U::lerp2(a.1, b.1, x, y))
    }

    #[inline(always)]
    fn lerp3(a: Self, b: Self, c: Self, x: f32, y: f32, z: f32) -> Self {
        (
            T::lerp3(a.0, b.0, c.0, x, y, z),
            U::lerp3(a.1, b.1, c.1, x, y, z),
        )
    }
}

impl<T: Interpolate, U: Interpolate, V: Interpolate> Interpolate for (T, U, V) {
    #[inline(always)]
    fn lerp2(a: Self, b: Self, x: f32, y: f32) -> Self {
        (
            T::lerp2(a.0, b.0, x, y),
            U::lerp2(a.1, b.1, x, y),
            V::lerp2(a.2, b.2, x, y),
        )
    }

    #[inline(always)]
    fn lerp3(a: Self, b: Self, c: Self, x: f32, y: f32, z: f32) -> Self {
        (
            T::lerp3(a.0, b.0, c.0, x, y, z),
            U::lerp3(a.1, b.1, c.1, x, y, z),
            V::lerp3(a.2, b.2, c.2, x, y, z),
        )
    }
}

impl<T: Interpolate, U: Interpolate, V: Interpolate, W: Interpolate> Interpolate for (T, U, V, W) {
    #[inline(always)]
    fn lerp2(a: Self, b: Self, x: f32, y: f32) -> Self {
        (
            T::lerp2(a.0, b.0, x, y),
            U::lerp2(a.1, b.1, x, y),
            V::lerp2(a.2, b.2, x, y),
            W::lerp2(a.3, b.3, x, y),
        )
    }

    #[inline(always)]
    fn lerp3(a: Self, b: Self, c: Self, x: f32, y: f32, z: f32) -> Self {
        (
            T::lerp3(a.0, b.0, c.0, x, y, z),
            U::lerp3(a.1, b.1, c.1, x, y, z),
            V::lerp3(a.2, b.2, c.2, x, y, z),
            W::lerp3(a.3, b.3, c.3, x, y, z),
        )
    }
}

impl Interpolate for () {
    #[inline(always)]
    fn lerp2(_: Self, _: Self, _: f32, _: f32) -> Self {
        ()
    }
    #[inline(always)]
    fn lerp3(_: Self, _: Self, _: Self, _: f32, _: f32, _: f32) -> Self {
        ()
    }
}

/// Perspective-correct barycentric weights and the interpolated varyings
/// they produce.
///
/// `screen_weights` are the affine (screen-space) barycentric weights
/// `(a, b, c)` produced by the edge-function test; they sum to 1 by
/// construction. `inv_w` are the three vertices' cached `1 / clip_w`
/// values. The result renormalizes so the *perspective-corrected* weights
/// also sum to 1 (to within float epsilon — this is the barycentric-sum
/// invariant).
#[inline(always)]
pub fn perspective_correct(screen_weights: (f32, f32, f32), inv_w: (f32, f32, f32)) -> (f32, f32, f32) {
    let (a, b, c) = screen_weights;
    let (wa, wb, wc) = inv_w;
    let pa = a * wa;
    let pb = b * wb;
    let pc = c * wc;
    let sum = pa + pb + pc;
    // `sum` is the interpolated `1/w` at this fragment (gl_FragCoord.w).
    let rec = 1.0 / sum;
    (pa * rec, pb * rec, pc * rec)
}

/// Interpolate a varying value using perspective-corrected weights.
#[inline(always)]
pub fn lerp3_perspective<T: Interpolate>(
    a: T,
    b: T,
    c: T,
    screen_weights: (f32, f32, f32),
    inv_w: (f32, f32, f32),
) -> T {
    let (x, y, z) = perspective_correct(screen_weights, inv_w);
    T::lerp3(a, b, c, x, y, z)
}
