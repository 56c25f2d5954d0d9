use super::Rect;
use crate::{common::*, Transform};

/// Bounding box in LTRB format.
///
/// The constructor does not check the ordering of the sides. Records in flight
/// may temporarily violate `left <= right` or `top <= bottom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LTRB<T> {
    left: T,
    top: T,
    right: T,
    bottom: T,
}

impl<T> LTRB<T> {
    pub fn new(left: T, top: T, right: T, bottom: T) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn try_cast<V>(self) -> Option<LTRB<V>>
    where
        T: ToPrimitive,
        V: NumCast,
    {
        Some(LTRB {
            left: V::from(self.left)?,
            top: V::from(self.top)?,
            right: V::from(self.right)?,
            bottom: V::from(self.bottom)?,
        })
    }

    pub fn cast<V>(self) -> LTRB<V>
    where
        T: ToPrimitive,
        V: NumCast,
    {
        self.try_cast().unwrap()
    }
}

impl<T> LTRB<T>
where
    T: Copy,
{
    pub fn left(&self) -> T {
        self.left
    }

    pub fn top(&self) -> T {
        self.top
    }

    pub fn right(&self) -> T {
        self.right
    }

    pub fn bottom(&self) -> T {
        self.bottom
    }

    /// The sides in `[left, top, right, bottom]` order.
    pub fn ltrb(&self) -> [T; 4] {
        [self.left, self.top, self.right, self.bottom]
    }
}

impl<T> LTRB<T>
where
    T: Copy + Num,
{
    pub fn transform(&self, transform: &Transform<T>) -> Self {
        LTRB {
            left: self.left * transform.sx + transform.tx,
            top: self.top * transform.sy + transform.ty,
            right: self.right * transform.sx + transform.tx,
            bottom: self.bottom * transform.sy + transform.ty,
        }
    }
}

impl<T> From<[T; 4]> for LTRB<T> {
    fn from([left, top, right, bottom]: [T; 4]) -> Self {
        Self::new(left, top, right, bottom)
    }
}

impl<T> Rect for LTRB<T>
where
    T: Copy + Num + PartialOrd,
{
    type Type = T;

    fn t(&self) -> Self::Type {
        self.top
    }

    fn l(&self) -> Self::Type {
        self.left
    }

    fn b(&self) -> Self::Type {
        self.bottom
    }

    fn r(&self) -> Self::Type {
        self.right
    }

    fn h(&self) -> Self::Type {
        self.bottom - self.top
    }

    fn w(&self) -> Self::Type {
        self.right - self.left
    }
}
