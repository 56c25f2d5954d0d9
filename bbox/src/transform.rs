use super::{Rect, LTRB};
use crate::{common::*, HW};

/// Axis-aligned scale and translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Transform<T> {
    pub sy: T,
    pub sx: T,
    pub ty: T,
    pub tx: T,
}

impl<T> Transform<T>
where
    T: Copy + Num + PartialOrd,
{
    fn from_rects<R>(src: &R, tgt: &R) -> Self
    where
        R: Rect<Type = T>,
    {
        let sy = tgt.h() / src.h();
        let sx = tgt.w() / src.w();
        let ty = tgt.t() - src.t() * sy;
        let tx = tgt.l() - src.l() * sx;

        Self { sy, sx, ty, tx }
    }

    /// Stretch the `src_size` canvas onto the `tgt_size` canvas.
    pub fn from_sizes_exact(src_size: HW<T>, tgt_size: HW<T>) -> Self {
        let zero = T::zero();
        let src = LTRB::new(zero, zero, src_size.w(), src_size.h());
        let tgt = LTRB::new(zero, zero, tgt_size.w(), tgt_size.h());
        Self::from_rects(&src, &tgt)
    }

    /// Map pixel coordinates on a `size` image to the unit square.
    pub fn normalize(size: HW<T>) -> Self {
        Self::from_sizes_exact(size, HW::from_hw([T::one(), T::one()]))
    }
}

impl<T> Transform<T>
where
    T: Copy + Num + Neg<Output = T>,
{
    pub fn inverse(&self) -> Self {
        let sy = T::one() / self.sy;
        let sx = T::one() / self.sx;
        let ty = -self.ty / self.sy;
        let tx = -self.tx / self.sx;

        Self { sy, sx, ty, tx }
    }
}

impl<T> Mul<&LTRB<T>> for &Transform<T>
where
    T: Copy + Num,
{
    type Output = LTRB<T>;

    fn mul(self, rhs: &LTRB<T>) -> Self::Output {
        rhs.transform(self)
    }
}
