//! End-to-end behaviour of small tactic chains.

use std::sync::Arc;

use super::*;
use crate::block::Block;
use crate::canvas::Canvas;
use crate::color::ColorMethod;
use crate::geom::{Orientation, Point, Shape};
use crate::image::TargetImage;
use crate::scoring::ScoringCfg;

fn id(s: &str) -> BlockId {
    s.parse().unwrap()
}

const RED: Color = Color::new(255, 0, 0, 255);
const BLUE: Color = Color::new(0, 0, 255, 255);

/// 4x4 with the top-left 2x2 quadrant red and the rest blue.
fn red_corner() -> Arc<TargetImage> {
    let pixels = (0..4)
        .flat_map(|y| (0..4).map(move |x| if x < 2 && y >= 2 { RED } else { BLUE }))
        .collect();
    Arc::new(TargetImage::from_pixels(4, 4, pixels).unwrap())
}

#[test]
fn coloring_a_black_canvas_white() {
    let target = Arc::new(TargetImage::uniform(4, 4, Color::WHITE).unwrap());
    let start =
        ProgramState::with_canvas(target, Canvas::new(4, 4, Color::BLACK), ScoringCfg::default())
            .unwrap();
    let out = ColorTactic::default()
        .apply(start, &mut TacticStorage::default())
        .unwrap();
    assert_eq!(
        out.moves(),
        vec![Move::Color {
            block: id("0"),
            color: Color::WHITE
        }]
    );
    assert_eq!(out.similarity(), 0);
    assert_eq!(out.cost(), 5);
}

#[test]
fn cutter_then_color_paints_exact_quadrants() {
    let mut storage = TacticStorage::default();
    let cut = Cutter::new(CutterCfg {
        size_limit: 2,
        ..CutterCfg::default()
    })
    .apply(ProgramState::new(red_corner()), &mut storage)
    .unwrap();
    assert_eq!(
        cut.moves(),
        vec![Move::PointCut {
            block: id("0"),
            point: Point::new(2, 2)
        }]
    );
    assert_eq!(storage.left_blocks.len(), 4);

    let colored = ColorTactic::default().apply(cut, &mut storage).unwrap();
    let colors: Vec<Move> = colored.moves().into_iter().skip(1).collect();
    assert_eq!(colors.len(), 4);
    assert!(colors.iter().all(|m| matches!(m, Move::Color { .. })));
    assert_eq!(colored.canvas().get(&id("0.3")).unwrap().color(), Some(RED));
    for quad in ["0.0", "0.1", "0.2"] {
        assert_eq!(colored.canvas().get(&id(quad)).unwrap().color(), Some(BLUE));
    }
    assert_eq!(colored.similarity(), 0);
}

#[test]
fn merge_to_one_unites_equal_halves() {
    let target = Arc::new(TargetImage::uniform(4, 4, BLUE).unwrap());
    let start = ProgramState::new(target)
        .apply_all([
            Move::LineCut {
                block: id("0"),
                orientation: Orientation::X,
                offset: 2,
            },
            Move::Color {
                block: id("0.0"),
                color: BLUE,
            },
            Move::Color {
                block: id("0.1"),
                color: BLUE,
            },
        ])
        .unwrap();
    let out = MergeToOne.apply(start, &mut TacticStorage::default()).unwrap();
    let merges = out
        .moves()
        .iter()
        .filter(|m| matches!(m, Move::Merge { .. }))
        .count();
    assert_eq!(merges, 1);
    let merged: &Block = out.canvas().get(&id("1")).unwrap();
    assert_eq!(merged.shape(), Shape::new(0, 0, 4, 4));
    assert_eq!(out.similarity(), 0);
}

#[test]
fn background_is_recorded_and_painted_once() {
    let target = red_corner();
    let mut storage = TacticStorage::default();
    let out = BackgroundTactic
        .apply(ProgramState::new(target), &mut storage)
        .unwrap();
    assert_eq!(storage.background, Some(BLUE));
    assert_eq!(out.len(), 1);
    let again = BackgroundTactic.apply(out.clone(), &mut storage).unwrap();
    assert_eq!(again.len(), out.len());
    // blue root now matches the average of a blue block: nothing to color
    let cut = again
        .apply(Move::PointCut {
            block: id("0"),
            point: Point::new(2, 2),
        })
        .unwrap();
    let colored = ColorTactic::default().apply(cut.clone(), &mut storage).unwrap();
    assert_eq!(colored.len(), cut.len() + 1);
}

#[test]
fn recorded_background_replaces_a_worse_average() {
    // blue block with a single red pixel
    let mut pixels = vec![BLUE; 16];
    pixels[5] = RED;
    let target = Arc::new(TargetImage::from_pixels(4, 4, pixels).unwrap());
    let tactic = ColorTactic::new(ColorMethod::Average);

    let plain = tactic
        .apply(ProgramState::new(Arc::clone(&target)), &mut TacticStorage::default())
        .unwrap();
    assert_eq!(plain.len(), 1);
    assert_ne!(plain.canvas().get(&id("0")).unwrap().color(), Some(BLUE));

    let mut storage = TacticStorage {
        background: Some(BLUE),
        ..TacticStorage::default()
    };
    let snapped = tactic
        .apply(ProgramState::new(Arc::clone(&target)), &mut storage)
        .unwrap();
    assert_eq!(
        snapped.moves(),
        vec![Move::Color {
            block: id("0"),
            color: BLUE
        }]
    );
    assert!(snapped.score().total() < plain.score().total());

    // already showing the background: no instruction at all
    let blue =
        ProgramState::with_canvas(target, Canvas::new(4, 4, BLUE), ScoringCfg::default()).unwrap();
    assert!(tactic.apply(blue.clone(), &mut storage).unwrap().is_empty());
    assert_eq!(
        tactic.apply(blue, &mut TacticStorage::default()).unwrap().len(),
        1
    );
}

#[test]
fn unprofitable_colors_are_skipped() {
    // one slightly off pixel in a big white image
    let mut pixels = vec![Color::WHITE; 40 * 40];
    pixels[0] = Color::new(250, 250, 250, 255);
    let target = Arc::new(TargetImage::from_pixels(40, 40, pixels).unwrap());
    let start = ProgramState::new(target)
        .apply(Move::PointCut {
            block: id("0"),
            point: Point::new(1, 1),
        })
        .unwrap();
    let tactic = ColorTactic {
        method: ColorMethod::Average,
        only_if_improves: true,
    };
    let out = tactic.apply(start.clone(), &mut TacticStorage::default()).unwrap();
    assert_eq!(out.len(), start.len());
    let eager = ColorTactic::new(ColorMethod::Average)
        .apply(start.clone(), &mut TacticStorage::default())
        .unwrap();
    assert_eq!(eager.len(), start.len() + 1);
}

#[test]
fn each_block_skips_vanished_ids() {
    struct MergeWithNext;
    impl BlockTactic for MergeWithNext {
        fn name(&self) -> &'static str {
            "merge-with-next"
        }
        fn apply_block(
            &self,
            state: ProgramState,
            block: &BlockId,
            _storage: &mut TacticStorage,
        ) -> Result<ProgramState, MoveError> {
            let partner = state
                .canvas()
                .mergeable_pairs()
                .into_iter()
                .find(|(a, _)| a == block);
            match partner {
                Some((a, b)) => state.apply(Move::Merge { a, b }),
                None => Ok(state),
            }
        }
    }

    let target = Arc::new(TargetImage::uniform(4, 4, Color::WHITE).unwrap());
    let start = ProgramState::new(target)
        .apply(Move::LineCut {
            block: id("0"),
            orientation: Orientation::Y,
            offset: 2,
        })
        .unwrap();
    // 0.0 merges with 0.1; 0.1 is gone by the time its turn comes
    let out = EachBlock(MergeWithNext)
        .apply(start, &mut TacticStorage::default())
        .unwrap();
    assert_eq!(out.canvas().ids(), vec![id("1")]);
    assert_eq!(out.len(), 2);
}
