//! Greedy swaps of equally sized blocks.

use std::collections::{BTreeMap, BTreeSet};

use crate::block::BlockId;
use crate::canvas::MoveError;
use crate::color::Color;
use crate::geom::Shape;
use crate::moves::Move;
use crate::scoring::rect_error;
use crate::state::ProgramState;

use super::{Tactic, TacticStorage};

/// Each pass applies the single swap with the best total-score gain among
/// unconsumed simple blocks of identical width and height; both blocks are
/// then consumed. Stops after a pass without an improving swap.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimilaritySwapper;

impl SimilaritySwapper {
    /// Best improving swap and its score change (negative is better).
    fn best_swap(
        state: &ProgramState,
        consumed: &BTreeSet<BlockId>,
    ) -> Option<(f64, BlockId, BlockId)> {
        let mut groups: BTreeMap<(i32, i32), Vec<(&BlockId, Shape, Color)>> = BTreeMap::new();
        for (id, block) in state.canvas().blocks() {
            if consumed.contains(id) {
                continue;
            }
            let Some(color) = block.color() else {
                continue;
            };
            let shape = block.shape();
            groups
                .entry((shape.width(), shape.height()))
                .or_default()
                .push((id, shape, color));
        }

        let target = state.target();
        let mut best: Option<(f64, BlockId, BlockId)> = None;
        for members in groups.values() {
            for (i, (ia, sa, ca)) in members.iter().enumerate() {
                for (ib, sb, cb) in &members[i + 1..] {
                    if ca == cb {
                        continue;
                    }
                    let before =
                        state.block_error(ia).unwrap_or(0) + state.block_error(ib).unwrap_or(0);
                    let after = rect_error(target, sb, *ca) + rect_error(target, sa, *cb);
                    let mv = Move::Swap {
                        a: (*ia).clone(),
                        b: (*ib).clone(),
                    };
                    let Ok(price) = state.canvas().cost(&mv) else {
                        continue;
                    };
                    let delta = state.cfg().penalty_delta(before, after) + price as f64;
                    if delta < 0.0 && best.as_ref().map_or(true, |(d, _, _)| delta < *d) {
                        best = Some((delta, (*ia).clone(), (*ib).clone()));
                    }
                }
            }
        }
        best
    }
}

impl Tactic for SimilaritySwapper {
    fn name(&self) -> &'static str {
        "swapper"
    }

    fn apply(
        &self,
        mut state: ProgramState,
        _storage: &mut TacticStorage,
    ) -> Result<ProgramState, MoveError> {
        let mut consumed = BTreeSet::new();
        while let Some((_, a, b)) = Self::best_swap(&state, &consumed) {
            state = state.apply(Move::Swap {
                a: a.clone(),
                b: b.clone(),
            })?;
            consumed.insert(a);
            consumed.insert(b);
        }
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::geom::{Orientation, Point};
    use crate::image::TargetImage;

    fn id(s: &str) -> BlockId {
        s.parse().unwrap()
    }

    #[test]
    fn swaps_misplaced_halves() {
        let red = Color::new(255, 0, 0, 255);
        let blue = Color::new(0, 0, 255, 255);
        let pixels = (0..20)
            .flat_map(|_| (0..40).map(|x| if x < 20 { red } else { blue }))
            .collect();
        let target = Arc::new(TargetImage::from_pixels(40, 20, pixels).unwrap());
        let start = ProgramState::new(target)
            .apply_all([
                Move::LineCut {
                    block: id("0"),
                    orientation: Orientation::X,
                    offset: 20,
                },
                Move::Color {
                    block: id("0.0"),
                    color: blue,
                },
                Move::Color {
                    block: id("0.1"),
                    color: red,
                },
            ])
            .unwrap();
        let out = SimilaritySwapper
            .apply(start.clone(), &mut TacticStorage::default())
            .unwrap();
        assert_eq!(out.len(), start.len() + 1);
        assert!(matches!(out.last_move(), Some(Move::Swap { .. })));
        assert_eq!(out.similarity(), 0);
        assert!(out.score().total() < start.score().total());
        assert_eq!(out.canvas().color_at(Point::new(0, 0)), Some(red));
    }

    #[test]
    fn leaves_a_good_canvas_alone() {
        let target = Arc::new(TargetImage::uniform(6, 6, Color::WHITE).unwrap());
        let start = ProgramState::new(target)
            .apply(Move::PointCut {
                block: id("0"),
                point: Point::new(3, 3),
            })
            .unwrap();
        let out = SimilaritySwapper
            .apply(start.clone(), &mut TacticStorage::default())
            .unwrap();
        assert_eq!(out.len(), start.len());
    }
}
