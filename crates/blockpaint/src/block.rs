//! Block identifiers and block contents.

use std::fmt;
use std::str::FromStr;

use crate::color::Color;
use crate::geom::{Point, Shape};

/// Hierarchical block id (`0`, `0.1`, `0.1.3`, ...).
///
/// Cuts append the child position to the parent id; merges allocate a fresh
/// root number. Ordering is lexicographic on the components.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(Vec<u32>);

impl BlockId {
    #[inline]
    pub fn root(n: u32) -> Self {
        Self(vec![n])
    }

    /// Child id `self.index`.
    pub fn child(&self, index: u32) -> Self {
        let mut parts = Vec::with_capacity(self.0.len() + 1);
        parts.extend_from_slice(&self.0);
        parts.push(index);
        Self(parts)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, p) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{p}")?;
        }
        Ok(())
    }
}

impl FromStr for BlockId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .split('.')
            .map(str::parse)
            .collect::<Result<Vec<u32>, _>>()
            .map(BlockId)
    }
}

/// A rectangular region of the canvas.
///
/// `Merged` is the state right after a merge: it still shows the pieces it was
/// built from and has no single color until a Color instruction turns it into
/// a `Simple` block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Block {
    Simple { shape: Shape, color: Color },
    Merged { shape: Shape, parts: Vec<(Shape, Color)> },
}

impl Block {
    #[inline]
    pub fn simple(shape: Shape, color: Color) -> Self {
        Block::Simple { shape, color }
    }

    #[inline]
    pub fn shape(&self) -> Shape {
        match self {
            Block::Simple { shape, .. } | Block::Merged { shape, .. } => *shape,
        }
    }

    #[inline]
    pub fn size(&self) -> u64 {
        self.shape().size()
    }

    /// Uniform color; `None` for a merged block that has not been recolored.
    #[inline]
    pub fn color(&self) -> Option<Color> {
        match self {
            Block::Simple { color, .. } => Some(*color),
            Block::Merged { .. } => None,
        }
    }

    /// Visible pieces as `(shape, color)`; a simple block has one.
    pub fn pieces(&self) -> Vec<(Shape, Color)> {
        match self {
            Block::Simple { shape, color } => vec![(*shape, *color)],
            Block::Merged { parts, .. } => parts.clone(),
        }
    }

    /// Color shown at `p`, if `p` lies inside the block.
    pub fn color_at(&self, p: Point) -> Option<Color> {
        match self {
            Block::Simple { shape, color } => shape.contains(p).then_some(*color),
            Block::Merged { parts, .. } => parts
                .iter()
                .find(|(s, _)| s.contains(p))
                .map(|(_, c)| *c),
        }
    }

    /// The same block content restricted to `sub` (a sub-rectangle of it).
    pub(crate) fn restrict(&self, sub: Shape) -> Block {
        match self {
            Block::Simple { color, .. } => Block::simple(sub, *color),
            Block::Merged { parts, .. } => {
                let parts: Vec<(Shape, Color)> = parts
                    .iter()
                    .filter_map(|(s, c)| s.intersect(&sub).map(|i| (i, *c)))
                    .collect();
                // a single remaining piece is plain again
                match parts.as_slice() {
                    [(s, c)] if *s == sub => Block::simple(sub, *c),
                    _ => Block::Merged { shape: sub, parts },
                }
            }
        }
    }

    /// The same content moved so its lower-left sits at `ll`.
    pub(crate) fn moved_to(&self, ll: Point) -> Block {
        match self {
            Block::Simple { shape, color } => Block::simple(shape.translate_to(ll), *color),
            Block::Merged { shape, parts } => {
                let dx = ll.x - shape.left();
                let dy = ll.y - shape.bottom();
                Block::Merged {
                    shape: shape.translate_to(ll),
                    parts: parts
                        .iter()
                        .map(|(s, c)| {
                            (
                                s.translate_to(Point::new(s.left() + dx, s.bottom() + dy)),
                                *c,
                            )
                        })
                        .collect(),
                }
            }
        }
    }

    /// Combine two blocks whose union is `shape`.
    pub(crate) fn merged(a: &Block, b: &Block, shape: Shape) -> Block {
        let mut parts = a.pieces();
        parts.extend(b.pieces());
        Block::Merged { shape, parts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_render_and_parse() {
        let id = BlockId::root(0).child(1).child(3);
        assert_eq!(id.to_string(), "0.1.3");
        assert_eq!("0.1.3".parse::<BlockId>().unwrap(), id);
        assert!(" 12 ".parse::<BlockId>().is_ok());
        assert!("0..1".parse::<BlockId>().is_err());
    }

    #[test]
    fn merged_block_has_no_color_until_restricted_to_one_piece() {
        let left = Block::simple(Shape::new(0, 0, 2, 4), Color::BLACK);
        let right = Block::simple(Shape::new(2, 0, 4, 4), Color::WHITE);
        let m = Block::merged(&left, &right, Shape::new(0, 0, 4, 4));
        assert_eq!(m.color(), None);
        assert_eq!(m.color_at(Point::new(3, 1)), Some(Color::WHITE));
        let lower_left = m.restrict(Shape::new(0, 0, 2, 2));
        assert_eq!(lower_left.color(), Some(Color::BLACK));
        let bottom = m.restrict(Shape::new(0, 0, 4, 2));
        assert_eq!(bottom.pieces().len(), 2);
    }

    #[test]
    fn moving_a_merged_block_moves_its_parts() {
        let m = Block::Merged {
            shape: Shape::new(0, 0, 2, 2),
            parts: vec![
                (Shape::new(0, 0, 1, 2), Color::BLACK),
                (Shape::new(1, 0, 2, 2), Color::WHITE),
            ],
        };
        let moved = m.moved_to(Point::new(5, 3));
        assert_eq!(moved.shape(), Shape::new(5, 3, 7, 5));
        assert_eq!(moved.color_at(Point::new(6, 4)), Some(Color::WHITE));
        assert_eq!(moved.color_at(Point::new(5, 3)), Some(Color::BLACK));
    }
}
