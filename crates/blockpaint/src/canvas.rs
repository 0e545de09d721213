//! The block partition and the instruction semantics.
//!
//! Invariants
//! - Block shapes are pairwise disjoint and cover the full canvas rectangle.
//! - `next_root` is larger than every root number ever handed out, so merge ids
//!   never collide with historical ids.
//!
//! Every `apply_*` checks its preconditions before touching the map; a failed
//! move leaves the canvas unchanged.

use std::collections::BTreeMap;
use std::fmt;

use crate::block::{Block, BlockId};
use crate::color::Color;
use crate::geom::{Orientation, Point, Shape};
use crate::moves::Move;
use crate::scoring::instruction_cost;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    UnknownBlock(BlockId),
    CutOutside { block: BlockId, shape: Shape },
    ShapeMismatch { a: Shape, b: Shape },
    NotAdjacent { a: BlockId, b: BlockId },
    SameBlock(BlockId),
    /// Starting canvas and target differ in size.
    SizeMismatch { canvas: (u32, u32), target: (u32, u32) },
}

impl fmt::Display for MoveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownBlock(id) => write!(f, "no block with id {id}"),
            Self::CutOutside { block, shape } => {
                write!(f, "cut position outside block {block} {shape}")
            }
            Self::ShapeMismatch { a, b } => write!(f, "swap of differently sized {a} and {b}"),
            Self::NotAdjacent { a, b } => {
                write!(f, "blocks {a} and {b} do not form a rectangle")
            }
            Self::SameBlock(id) => write!(f, "block {id} used twice"),
            Self::SizeMismatch { canvas, target } => write!(
                f,
                "canvas {}x{} does not match target {}x{}",
                canvas.0, canvas.1, target.0, target.1
            ),
        }
    }
}

impl std::error::Error for MoveError {}

/// Block ids removed and created by one instruction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Change {
    pub removed: Vec<(BlockId, Block)>,
    pub added: Vec<BlockId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
    blocks: BTreeMap<BlockId, Block>,
    next_root: u32,
}

impl Canvas {
    /// One root block `0` covering everything.
    pub fn new(width: u32, height: u32, color: Color) -> Self {
        let mut blocks = BTreeMap::new();
        blocks.insert(
            BlockId::root(0),
            Block::simple(Shape::canvas(width, height), color),
        );
        Self {
            width,
            height,
            blocks,
            next_root: 1,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }
    #[inline]
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
    #[inline]
    pub fn shape(&self) -> Shape {
        Shape::canvas(self.width, self.height)
    }
    #[inline]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
    #[inline]
    pub fn get(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.get(id)
    }
    #[inline]
    pub fn contains(&self, id: &BlockId) -> bool {
        self.blocks.contains_key(id)
    }

    /// Blocks in id order.
    pub fn blocks(&self) -> impl Iterator<Item = (&BlockId, &Block)> {
        self.blocks.iter()
    }

    pub fn ids(&self) -> Vec<BlockId> {
        self.blocks.keys().cloned().collect()
    }

    fn block(&self, id: &BlockId) -> Result<&Block, MoveError> {
        self.blocks
            .get(id)
            .ok_or_else(|| MoveError::UnknownBlock(id.clone()))
    }

    /// Price of `mv` against the current partition.
    pub fn cost(&self, mv: &Move) -> Result<u64, MoveError> {
        let affected = match mv {
            Move::LineCut { block, .. }
            | Move::PointCut { block, .. }
            | Move::Color { block, .. } => self.block(block)?.size(),
            Move::Swap { a, .. } => self.block(a)?.size(),
            Move::Merge { a, b } => self.block(a)?.size().max(self.block(b)?.size()),
        };
        Ok(instruction_cost(mv.base_cost(), self.area(), affected))
    }

    /// Apply one instruction in place.
    pub fn apply(&mut self, mv: &Move) -> Result<Change, MoveError> {
        match mv {
            Move::LineCut {
                block,
                orientation,
                offset,
            } => self.apply_line_cut(block, *orientation, *offset),
            Move::PointCut { block, point } => self.apply_point_cut(block, *point),
            Move::Color { block, color } => self.apply_color(block, *color),
            Move::Swap { a, b } => self.apply_swap(a, b),
            Move::Merge { a, b } => self.apply_merge(a, b),
        }
    }

    fn replace_with_children(&mut self, id: &BlockId, shapes: &[Shape]) -> Change {
        let Some(parent) = self.blocks.remove(id) else {
            return Change::default();
        };
        let mut added = Vec::with_capacity(shapes.len());
        for (i, s) in shapes.iter().enumerate() {
            let child = id.child(i as u32);
            self.blocks.insert(child.clone(), parent.restrict(*s));
            added.push(child);
        }
        Change {
            removed: vec![(id.clone(), parent)],
            added,
        }
    }

    fn apply_line_cut(
        &mut self,
        id: &BlockId,
        orientation: Orientation,
        offset: i32,
    ) -> Result<Change, MoveError> {
        let shape = self.block(id)?.shape();
        let (lo, hi) = shape
            .split_line(orientation, offset)
            .ok_or_else(|| MoveError::CutOutside {
                block: id.clone(),
                shape,
            })?;
        Ok(self.replace_with_children(id, &[lo, hi]))
    }

    fn apply_point_cut(&mut self, id: &BlockId, point: Point) -> Result<Change, MoveError> {
        let shape = self.block(id)?.shape();
        let quads = shape
            .split_point(point)
            .ok_or_else(|| MoveError::CutOutside {
                block: id.clone(),
                shape,
            })?;
        Ok(self.replace_with_children(id, &quads))
    }

    fn apply_color(&mut self, id: &BlockId, color: Color) -> Result<Change, MoveError> {
        let old = self.block(id)?.clone();
        self.blocks
            .insert(id.clone(), Block::simple(old.shape(), color));
        Ok(Change {
            removed: vec![(id.clone(), old)],
            added: vec![id.clone()],
        })
    }

    fn apply_swap(&mut self, a: &BlockId, b: &BlockId) -> Result<Change, MoveError> {
        if a == b {
            return Err(MoveError::SameBlock(a.clone()));
        }
        let (block_a, block_b) = (self.block(a)?, self.block(b)?);
        let (sa, sb) = (block_a.shape(), block_b.shape());
        if !sa.same_size(&sb) {
            return Err(MoveError::ShapeMismatch { a: sa, b: sb });
        }
        let (old_a, old_b) = (block_a.clone(), block_b.clone());
        self.blocks.insert(a.clone(), old_a.moved_to(sb.lower_left()));
        self.blocks.insert(b.clone(), old_b.moved_to(sa.lower_left()));
        Ok(Change {
            removed: vec![(a.clone(), old_a), (b.clone(), old_b)],
            added: vec![a.clone(), b.clone()],
        })
    }

    fn apply_merge(&mut self, a: &BlockId, b: &BlockId) -> Result<Change, MoveError> {
        if a == b {
            return Err(MoveError::SameBlock(a.clone()));
        }
        let (block_a, block_b) = (self.block(a)?, self.block(b)?);
        let union = block_a
            .shape()
            .union_rect(&block_b.shape())
            .ok_or_else(|| MoveError::NotAdjacent {
                a: a.clone(),
                b: b.clone(),
            })?;
        let merged = Block::merged(block_a, block_b, union);
        let (old_a, old_b) = (block_a.clone(), block_b.clone());
        let id = BlockId::root(self.next_root);
        self.next_root += 1;
        self.blocks.remove(a);
        self.blocks.remove(b);
        self.blocks.insert(id.clone(), merged);
        Ok(Change {
            removed: vec![(a.clone(), old_a), (b.clone(), old_b)],
            added: vec![id],
        })
    }

    /// Id allocated by the most recent merge, while that block still exists.
    pub fn last_merge_id(&self) -> Option<BlockId> {
        let id = BlockId::root(self.next_root.checked_sub(1).filter(|&n| n > 0)?);
        self.blocks.contains_key(&id).then_some(id)
    }

    /// Color shown at pixel `p`.
    pub fn color_at(&self, p: Point) -> Option<Color> {
        self.blocks.values().find_map(|b| b.color_at(p))
    }

    /// Bottom-up, row-major rendering of the canvas.
    pub fn render(&self) -> Vec<Color> {
        let w = self.width as usize;
        let mut out = vec![Color::default(); w * self.height as usize];
        for block in self.blocks.values() {
            for (shape, color) in block.pieces() {
                for y in shape.bottom()..shape.top() {
                    let row = y as usize * w;
                    out[row + shape.left() as usize..row + shape.right() as usize].fill(color);
                }
            }
        }
        out
    }

    /// Full cover and pairwise disjointness of block shapes.
    pub fn is_partition(&self) -> bool {
        let full = self.shape();
        let shapes: Vec<Shape> = self.blocks.values().map(Block::shape).collect();
        if !shapes.iter().all(|s| full.contains_shape(s)) {
            return false;
        }
        let total: u64 = shapes.iter().map(Shape::size).sum();
        if total != full.size() {
            return false;
        }
        for (i, a) in shapes.iter().enumerate() {
            if shapes[i + 1..].iter().any(|b| a.overlaps(b)) {
                return false;
            }
        }
        true
    }

    /// Pairs of blocks that a Merge would accept, in id order.
    pub fn mergeable_pairs(&self) -> Vec<(BlockId, BlockId)> {
        let entries: Vec<(&BlockId, Shape)> =
            self.blocks.iter().map(|(id, b)| (id, b.shape())).collect();
        let mut pairs = Vec::new();
        for (i, (ia, sa)) in entries.iter().enumerate() {
            for (ib, sb) in &entries[i + 1..] {
                if sa.union_rect(sb).is_some() {
                    pairs.push(((*ia).clone(), (*ib).clone()));
                }
            }
        }
        pairs
    }
}
