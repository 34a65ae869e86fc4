//! Guillotine cut sequence for a packed board.
//!
//! Cuts are emitted in the order a panel saw would make them:
//! 1. horizontal cuts separating the shelves, top to bottom, full board width
//! 2. vertical cuts between pieces, shelf by shelf, left to right, shelf height
//! 3. horizontal trims under pieces shorter than their shelf
//!
//! Ids start at 1 on every board.

use crate::error::{OptimizeError, Result};
use crate::types::{Board, Cut, CutOrientation, Placement};

/// Placements sharing a shelf, as recovered from the board layout.
#[derive(Debug, Clone, Copy)]
pub struct ShelfSpan<'a> {
    pub y: u32,
    pub height: u32,
    pub placements: &'a [Placement],
}

impl ShelfSpan<'_> {
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

/// Groups consecutive placements with the same top edge. Relies on the
/// packer's shelf-then-x ordering.
pub fn shelves(board: &Board) -> Vec<ShelfSpan<'_>> {
    board
        .placements
        .chunk_by(|a, b| a.y == b.y)
        .map(|placements| ShelfSpan {
            y: placements[0].y,
            height: placements.iter().map(|p| p.height).max().unwrap_or(0),
            placements,
        })
        .collect()
}

pub fn derive_cuts(board: &Board) -> Result<Vec<Cut>> {
    check_layout(board)?;

    let spans = shelves(board);
    let mut list = CutList::default();

    for shelf in &spans {
        let y = shelf.bottom();
        if y < board.height {
            list.push(CutOrientation::Horizontal, (0, y), (board.width, y));
        }
    }

    for shelf in &spans {
        for p in shelf.placements {
            let x = p.right();
            if x < board.width {
                list.push(CutOrientation::Vertical, (x, shelf.y), (x, shelf.bottom()));
            }
        }
    }

    for shelf in &spans {
        for p in shelf.placements {
            if p.height < shelf.height {
                let y = p.bottom();
                list.push(CutOrientation::Horizontal, (p.x, y), (p.right(), y));
            }
        }
    }

    Ok(list.cuts)
}

#[derive(Default)]
struct CutList {
    cuts: Vec<Cut>,
}

impl CutList {
    fn push(&mut self, orientation: CutOrientation, from: (u32, u32), to: (u32, u32)) {
        let length = match orientation {
            CutOrientation::Horizontal => to.0 - from.0,
            CutOrientation::Vertical => to.1 - from.1,
        };
        self.cuts.push(Cut {
            id: self.cuts.len() as u32 + 1,
            orientation,
            x1: from.0,
            y1: from.1,
            x2: to.0,
            y2: to.1,
            length,
        });
    }
}

/// Bounds and pairwise overlap check. A failure here is a packer bug.
fn check_layout(board: &Board) -> Result<()> {
    let violation = |message: String| OptimizeError::InvariantViolation {
        board: Some(board.index),
        message,
    };

    for (i, p) in board.placements.iter().enumerate() {
        if p.x as u64 + p.width as u64 > board.width as u64
            || p.y as u64 + p.height as u64 > board.height as u64
        {
            return Err(violation(format!(
                "placement {i} ({}x{} @ {},{}) exceeds the {}x{} board",
                p.width, p.height, p.x, p.y, board.width, board.height
            )));
        }
    }

    for (i, a) in board.placements.iter().enumerate() {
        for (j, b) in board.placements.iter().enumerate().skip(i + 1) {
            if a.overlaps(b) {
                return Err(violation(format!(
                    "placement {i} @ ({},{}) overlaps placement {j} @ ({},{})",
                    a.x, a.y, b.x, b.y
                )));
            }
        }
    }
    Ok(())
}
