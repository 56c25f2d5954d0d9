use crate::common::*;

/// The generic rectangle.
pub trait Rect {
    type Type;

    fn t(&self) -> Self::Type;
    fn l(&self) -> Self::Type;
    fn b(&self) -> Self::Type;
    fn r(&self) -> Self::Type;
    fn h(&self) -> Self::Type;
    fn w(&self) -> Self::Type;
}

pub trait RectNum: Rect
where
    Self::Type: Num + PartialOrd,
{
    /// Whether `l <= r` and `t <= b`.
    fn is_ordered(&self) -> bool {
        self.l() <= self.r() && self.t() <= self.b()
    }
}

impl<T> RectNum for T
where
    T: Rect,
    T::Type: Num + PartialOrd,
{
}
