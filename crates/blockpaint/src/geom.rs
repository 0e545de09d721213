//! Integer geometry for the block canvas.
//!
//! Conventions
//! - Origin is the bottom-left pixel; `y` grows upward.
//! - A `Shape` covers `[ll.x, ur.x) × [ll.y, ur.y)`: lower-left inclusive,
//!   upper-right exclusive, never empty.

use std::fmt;

/// Pixel coordinate or offset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Axis of a line cut. `X` cuts at an x offset (vertical line).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Orientation {
    X,
    Y,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::X => f.write_str("X"),
            Orientation::Y => f.write_str("Y"),
        }
    }
}

/// Axis-aligned, non-empty rectangle.
///
/// Invariant: `ll.x < ur.x` and `ll.y < ur.y`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Shape {
    ll: Point,
    ur: Point,
}

impl Shape {
    /// Rectangle from left, bottom, right, top. Panics on an empty rectangle.
    #[inline]
    pub fn new(left: i32, bottom: i32, right: i32, top: i32) -> Self {
        Self::try_new(Point::new(left, bottom), Point::new(right, top))
            .unwrap_or_else(|| panic!("empty shape [{left},{bottom}]..[{right},{top}]"))
    }

    /// Rectangle from its corners, `None` when it would be empty.
    #[inline]
    pub fn try_new(ll: Point, ur: Point) -> Option<Self> {
        (ll.x < ur.x && ll.y < ur.y).then_some(Self { ll, ur })
    }

    /// Canvas-sized rectangle anchored at the origin.
    #[inline]
    pub fn canvas(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i32, height as i32)
    }

    #[inline]
    pub fn lower_left(&self) -> Point {
        self.ll
    }
    #[inline]
    pub fn upper_right(&self) -> Point {
        self.ur
    }
    #[inline]
    pub fn left(&self) -> i32 {
        self.ll.x
    }
    #[inline]
    pub fn bottom(&self) -> i32 {
        self.ll.y
    }
    #[inline]
    pub fn right(&self) -> i32 {
        self.ur.x
    }
    #[inline]
    pub fn top(&self) -> i32 {
        self.ur.y
    }
    #[inline]
    pub fn width(&self) -> i32 {
        self.ur.x - self.ll.x
    }
    #[inline]
    pub fn height(&self) -> i32 {
        self.ur.y - self.ll.y
    }

    /// Area in pixels.
    #[inline]
    pub fn size(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Integer midpoint (rounded toward the lower-left).
    #[inline]
    pub fn midpoint(&self) -> Point {
        Point::new(
            self.ll.x + self.width() / 2,
            self.ll.y + self.height() / 2,
        )
    }

    /// Span along an axis as `(start, end)`.
    #[inline]
    pub fn span(&self, axis: Orientation) -> (i32, i32) {
        match axis {
            Orientation::X => (self.ll.x, self.ur.x),
            Orientation::Y => (self.ll.y, self.ur.y),
        }
    }

    /// Pixel membership.
    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        self.ll.x <= p.x && p.x < self.ur.x && self.ll.y <= p.y && p.y < self.ur.y
    }

    /// `true` when `offset` lies strictly inside the span on `axis`.
    #[inline]
    pub fn strictly_inside(&self, axis: Orientation, offset: i32) -> bool {
        let (lo, hi) = self.span(axis);
        lo < offset && offset < hi
    }

    /// `true` when the point lies strictly inside on both axes.
    #[inline]
    pub fn strictly_contains(&self, p: Point) -> bool {
        self.strictly_inside(Orientation::X, p.x) && self.strictly_inside(Orientation::Y, p.y)
    }

    #[inline]
    pub fn contains_shape(&self, other: &Shape) -> bool {
        self.ll.x <= other.ll.x
            && self.ll.y <= other.ll.y
            && other.ur.x <= self.ur.x
            && other.ur.y <= self.ur.y
    }

    pub fn intersect(&self, other: &Shape) -> Option<Shape> {
        Shape::try_new(
            Point::new(self.ll.x.max(other.ll.x), self.ll.y.max(other.ll.y)),
            Point::new(self.ur.x.min(other.ur.x), self.ur.y.min(other.ur.y)),
        )
    }

    #[inline]
    pub fn overlaps(&self, other: &Shape) -> bool {
        self.intersect(other).is_some()
    }

    /// Same width and same height (order-sensitive, not just area).
    #[inline]
    pub fn same_size(&self, other: &Shape) -> bool {
        self.width() == other.width() && self.height() == other.height()
    }

    /// One shape sits directly on top of the other with a full shared edge.
    pub fn vertically_aligned(&self, other: &Shape) -> bool {
        self.ll.x == other.ll.x
            && self.ur.x == other.ur.x
            && (self.ur.y == other.ll.y || other.ur.y == self.ll.y)
    }

    /// The shapes are side by side with a full shared edge.
    pub fn horizontally_aligned(&self, other: &Shape) -> bool {
        self.ll.y == other.ll.y
            && self.ur.y == other.ur.y
            && (self.ur.x == other.ll.x || other.ur.x == self.ll.x)
    }

    /// Bounding rectangle of two aligned shapes; `None` unless the union is an
    /// exact rectangle.
    pub fn union_rect(&self, other: &Shape) -> Option<Shape> {
        if !(self.vertically_aligned(other) || self.horizontally_aligned(other)) {
            return None;
        }
        Shape::try_new(
            Point::new(self.ll.x.min(other.ll.x), self.ll.y.min(other.ll.y)),
            Point::new(self.ur.x.max(other.ur.x), self.ur.y.max(other.ur.y)),
        )
    }

    /// Same size, lower-left moved to `ll`.
    #[inline]
    pub fn translate_to(&self, ll: Point) -> Shape {
        Shape {
            ll,
            ur: Point::new(ll.x + self.width(), ll.y + self.height()),
        }
    }

    /// Split at `offset` on `axis` into (lower/left, upper/right).
    pub fn split_line(&self, axis: Orientation, offset: i32) -> Option<(Shape, Shape)> {
        if !self.strictly_inside(axis, offset) {
            return None;
        }
        Some(match axis {
            Orientation::X => (
                Shape::new(self.left(), self.bottom(), offset, self.top()),
                Shape::new(offset, self.bottom(), self.right(), self.top()),
            ),
            Orientation::Y => (
                Shape::new(self.left(), self.bottom(), self.right(), offset),
                Shape::new(self.left(), offset, self.right(), self.top()),
            ),
        })
    }

    /// Split at an interior point into lower-left, lower-right, upper-right,
    /// upper-left quadrants.
    pub fn split_point(&self, p: Point) -> Option<[Shape; 4]> {
        if !self.strictly_contains(p) {
            return None;
        }
        Some([
            Shape::new(self.left(), self.bottom(), p.x, p.y),
            Shape::new(p.x, self.bottom(), self.right(), p.y),
            Shape::new(p.x, p.y, self.right(), self.top()),
            Shape::new(self.left(), p.y, p.x, self.top()),
        ])
    }

    /// Iterate pixels row by row, bottom row first.
    pub fn pixels(&self) -> impl Iterator<Item = Point> + '_ {
        (self.ll.y..self.ur.y)
            .flat_map(move |y| (self.ll.x..self.ur.x).map(move |x| Point::new(x, y)))
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{})", self.ll, self.ur)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_shapes_are_rejected() {
        assert!(Shape::try_new(Point::new(2, 0), Point::new(2, 5)).is_none());
        assert!(Shape::try_new(Point::new(0, 3), Point::new(4, 1)).is_none());
        assert!(Shape::try_new(Point::new(0, 0), Point::new(1, 1)).is_some());
    }

    #[test]
    fn split_point_quadrant_order() {
        let s = Shape::new(0, 0, 4, 4);
        let q = s.split_point(Point::new(1, 3)).unwrap();
        assert_eq!(q[0], Shape::new(0, 0, 1, 3));
        assert_eq!(q[1], Shape::new(1, 0, 4, 3));
        assert_eq!(q[2], Shape::new(1, 3, 4, 4));
        assert_eq!(q[3], Shape::new(0, 3, 1, 4));
        let total: u64 = q.iter().map(Shape::size).sum();
        assert_eq!(total, s.size());
        // boundary points are not interior
        assert!(s.split_point(Point::new(0, 2)).is_none());
        assert!(s.split_point(Point::new(2, 4)).is_none());
    }

    #[test]
    fn split_line_bounds_are_strict() {
        let s = Shape::new(2, 2, 6, 5);
        assert!(s.split_line(Orientation::X, 2).is_none());
        assert!(s.split_line(Orientation::Y, 5).is_none());
        let (lo, hi) = s.split_line(Orientation::Y, 3).unwrap();
        assert_eq!(lo, Shape::new(2, 2, 6, 3));
        assert_eq!(hi, Shape::new(2, 3, 6, 5));
    }

    #[test]
    fn union_requires_full_shared_edge() {
        let a = Shape::new(0, 0, 2, 4);
        let b = Shape::new(2, 0, 4, 4);
        assert!(a.horizontally_aligned(&b));
        assert_eq!(a.union_rect(&b), Some(Shape::new(0, 0, 4, 4)));
        let c = Shape::new(2, 0, 4, 3);
        assert!(a.union_rect(&c).is_none());
        let d = Shape::new(0, 4, 2, 6);
        assert!(a.vertically_aligned(&d));
        assert_eq!(d.union_rect(&a), Some(Shape::new(0, 0, 2, 6)));
        // touching corners only
        let e = Shape::new(2, 4, 4, 6);
        assert!(a.union_rect(&e).is_none());
    }

    #[test]
    fn same_size_is_order_sensitive() {
        let a = Shape::new(0, 0, 2, 3);
        let b = Shape::new(5, 5, 8, 7);
        assert_eq!(a.size(), b.size());
        assert!(!a.same_size(&b));
        assert!(a.same_size(&a.translate_to(Point::new(9, 9))));
    }

    #[test]
    fn pixels_cover_shape() {
        let s = Shape::new(1, 1, 3, 4);
        let px: Vec<Point> = s.pixels().collect();
        assert_eq!(px.len() as u64, s.size());
        assert!(px.iter().all(|&p| s.contains(p)));
        assert_eq!(px[0], Point::new(1, 1));
    }
}
