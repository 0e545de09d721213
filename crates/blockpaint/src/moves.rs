//! Canvas instructions, their base prices and their text form.
//!
//! Text form, one instruction per line:
//! - `cut [<id>] [<X|Y>] [<offset>]`
//! - `cut [<id>] [<x>, <y>]`
//! - `color [<id>] [<r>, <g>, <b>, <a>]`
//! - `swap [<a>] [<b>]`
//! - `merge [<a>] [<b>]`

use std::fmt;
use std::str::FromStr;

use crate::block::BlockId;
use crate::color::Color;
use crate::geom::{Orientation, Point};

pub const LINE_CUT_COST: u64 = 7;
pub const POINT_CUT_COST: u64 = 10;
pub const COLOR_COST: u64 = 5;
pub const SWAP_COST: u64 = 3;
pub const MERGE_COST: u64 = 1;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Move {
    LineCut {
        block: BlockId,
        orientation: Orientation,
        offset: i32,
    },
    PointCut {
        block: BlockId,
        point: Point,
    },
    Color {
        block: BlockId,
        color: Color,
    },
    Swap {
        a: BlockId,
        b: BlockId,
    },
    Merge {
        a: BlockId,
        b: BlockId,
    },
}

impl Move {
    /// Price before scaling by the canvas/block area ratio.
    #[inline]
    pub fn base_cost(&self) -> u64 {
        match self {
            Move::LineCut { .. } => LINE_CUT_COST,
            Move::PointCut { .. } => POINT_CUT_COST,
            Move::Color { .. } => COLOR_COST,
            Move::Swap { .. } => SWAP_COST,
            Move::Merge { .. } => MERGE_COST,
        }
    }

    #[inline]
    pub fn is_cut(&self) -> bool {
        matches!(self, Move::LineCut { .. } | Move::PointCut { .. })
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::LineCut {
                block,
                orientation,
                offset,
            } => write!(f, "cut [{block}] [{orientation}] [{offset}]"),
            Move::PointCut { block, point } => {
                write!(f, "cut [{block}] [{}, {}]", point.x, point.y)
            }
            Move::Color { block, color } => write!(f, "color [{block}] {color}"),
            Move::Swap { a, b } => write!(f, "swap [{a}] [{b}]"),
            Move::Merge { a, b } => write!(f, "merge [{a}] [{b}]"),
        }
    }
}

/// Newline-joined text of a program.
pub fn program_text(moves: &[Move]) -> String {
    moves
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub line: usize,
    pub reason: String,
}

impl ParseError {
    fn at(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.reason)
    }
}

impl std::error::Error for ParseError {}

/// Split `word [a] [b, c]` into the word and the bracket contents.
fn tokens(s: &str) -> Result<(&str, Vec<&str>), String> {
    let s = s.trim();
    let (word, mut rest) = s.split_once(' ').unwrap_or((s, ""));
    let mut args = Vec::new();
    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }
        let body = rest
            .strip_prefix('[')
            .ok_or_else(|| format!("expected '[' at {rest:?}"))?;
        let end = body.find(']').ok_or("unclosed '['")?;
        args.push(body[..end].trim());
        rest = &body[end + 1..];
    }
    Ok((word, args))
}

fn parse_num<T: FromStr>(s: &str) -> Result<T, String> {
    s.trim().parse().map_err(|_| format!("bad number {s:?}"))
}

fn parse_id(s: &str) -> Result<BlockId, String> {
    s.parse().map_err(|_| format!("bad block id {s:?}"))
}

impl FromStr for Move {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (word, args) = tokens(s)?;
        match (word.to_ascii_lowercase().as_str(), args.as_slice()) {
            ("cut", [id, axis @ ("X" | "x" | "Y" | "y"), offset]) => Ok(Move::LineCut {
                block: parse_id(id)?,
                orientation: if axis.eq_ignore_ascii_case("x") {
                    Orientation::X
                } else {
                    Orientation::Y
                },
                offset: parse_num(offset)?,
            }),
            ("cut", [id, point]) => {
                let (x, y) = point.split_once(',').ok_or("point needs two coordinates")?;
                Ok(Move::PointCut {
                    block: parse_id(id)?,
                    point: Point::new(parse_num(x)?, parse_num(y)?),
                })
            }
            ("color", [id, rgba]) => {
                let ch: Vec<u8> = rgba
                    .split(',')
                    .map(parse_num)
                    .collect::<Result<_, _>>()?;
                let [r, g, b, a] = ch[..] else {
                    return Err(format!("color needs four channels, got {}", ch.len()));
                };
                Ok(Move::Color {
                    block: parse_id(id)?,
                    color: Color::new(r, g, b, a),
                })
            }
            ("swap", [a, b]) => Ok(Move::Swap {
                a: parse_id(a)?,
                b: parse_id(b)?,
            }),
            ("merge", [a, b]) => Ok(Move::Merge {
                a: parse_id(a)?,
                b: parse_id(b)?,
            }),
            _ => Err(format!("unrecognised instruction {s:?}")),
        }
    }
}

/// Parse program text; blank lines and `#` comments are skipped.
pub fn parse_program(text: &str) -> Result<Vec<Move>, ParseError> {
    text.lines()
        .enumerate()
        .filter(|(_, l)| {
            let t = l.trim();
            !t.is_empty() && !t.starts_with('#')
        })
        .map(|(i, l)| l.parse().map_err(|e: String| ParseError::at(i + 1, e)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> BlockId {
        s.parse().unwrap()
    }

    #[test]
    fn renders_instruction_lines() {
        let cut = Move::LineCut {
            block: id("0.1"),
            orientation: Orientation::X,
            offset: 12,
        };
        assert_eq!(cut.to_string(), "cut [0.1] [X] [12]");
        let pcut = Move::PointCut {
            block: id("0"),
            point: Point::new(2, 3),
        };
        assert_eq!(pcut.to_string(), "cut [0] [2, 3]");
        let color = Move::Color {
            block: id("1.2"),
            color: Color::new(1, 2, 3, 4),
        };
        assert_eq!(color.to_string(), "color [1.2] [1, 2, 3, 4]");
        let swap = Move::Swap {
            a: id("0.0"),
            b: id("0.3"),
        };
        assert_eq!(swap.to_string(), "swap [0.0] [0.3]");
        let merge = Move::Merge {
            a: id("2"),
            b: id("0.1"),
        };
        assert_eq!(merge.to_string(), "merge [2] [0.1]");
    }

    #[test]
    fn program_text_parses_back() {
        let moves = vec![
            Move::PointCut {
                block: id("0"),
                point: Point::new(200, 100),
            },
            Move::LineCut {
                block: id("0.2"),
                orientation: Orientation::Y,
                offset: 300,
            },
            Move::Color {
                block: id("0.2.1"),
                color: Color::new(10, 20, 30, 255),
            },
            Move::Swap {
                a: id("0.0"),
                b: id("0.1"),
            },
            Move::Merge {
                a: id("0.3"),
                b: id("0.2.0"),
            },
        ];
        let text = program_text(&moves);
        assert_eq!(parse_program(&text).unwrap(), moves);
    }

    #[test]
    fn parse_skips_comments_and_reports_lines() {
        let text = "# header\n\ncolor [0] [1, 2, 3, 4]\ncut [0] [Z] [3]\n";
        let err = parse_program(text).unwrap_err();
        assert_eq!(err.line, 4);
        let ok = parse_program("# only a comment\n").unwrap();
        assert!(ok.is_empty());
        assert!("color [0] [1, 2, 3]".parse::<Move>().is_err());
        assert!("color [0] [1, 2, 3, 256]".parse::<Move>().is_err());
    }
}
