use std::time::{Duration, Instant};

use crate::error::{OptimizeError, Result};
use crate::shelf::ShelfBoard;
use crate::types::{Alignment, Board, Piece, Rect, StockSheet};

const UNROTATED: &[bool] = &[false];
const ROTATED: &[bool] = &[true];
const EITHER: &[bool] = &[false, true];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackOptions {
    pub kerf: u32,
    pub allow_rotation: bool,
    /// Once the first board is opened, every later board has its size.
    pub single_sheet_size: bool,
    /// Unconstrained pieces keep the orientation they were requested in.
    pub consider_grain: bool,
    pub time_limit: Option<Duration>,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            kerf: 0,
            allow_rotation: true,
            single_sheet_size: false,
            consider_grain: false,
            time_limit: None,
        }
    }
}

/// Greedy shelf packer. Deterministic: the same pieces and sheets always
/// produce the same boards in the same order.
pub struct Packer<'a> {
    sheets: &'a [StockSheet],
    options: PackOptions,
}

impl<'a> Packer<'a> {
    pub fn new(sheets: &'a [StockSheet], options: PackOptions) -> Self {
        Self { sheets, options }
    }

    /// Orientations a piece may be placed in, preferred first.
    pub fn rotations(&self, piece: &Piece) -> &'static [bool] {
        match piece.alignment {
            Alignment::Vertical => UNROTATED,
            Alignment::Horizontal => ROTATED,
            Alignment::None => {
                if !self.options.allow_rotation
                    || self.options.consider_grain
                    || piece.rect().is_square()
                {
                    UNROTATED
                } else {
                    EITHER
                }
            }
        }
    }

    fn fits_sheet(piece: Rect, rotations: &[bool], sheet: Rect) -> bool {
        rotations.iter().any(|&r| piece.oriented(r).fits_in(&sheet))
    }

    /// Fails on the first piece, in request order, that no sheet can hold.
    fn check_feasible(&self, pieces: &[Piece]) -> Result<()> {
        for piece in pieces {
            let rotations = self.rotations(piece);
            let fits_any = self
                .sheets
                .iter()
                .any(|s| Self::fits_sheet(piece.rect(), rotations, s.board_rect()));
            if !fits_any {
                return Err(infeasible(piece));
            }
        }
        Ok(())
    }

    pub fn pack(&self, pieces: &[Piece]) -> Result<Vec<Board>> {
        let started = Instant::now();
        self.check_feasible(pieces)?;

        let order = packing_order(pieces);
        let mut remaining: Vec<u32> = self.sheets.iter().map(|s| s.quantity).collect();
        let mut locked_size: Option<Rect> = None;
        let mut closed: Vec<ShelfBoard> = Vec::new();
        let mut current: Option<ShelfBoard> = None;

        for idx in order {
            if let Some(limit) = self.options.time_limit
                && started.elapsed() > limit
            {
                return Err(OptimizeError::RequestTooLarge {
                    reason: format!(
                        "packing exceeded the {} ms time limit",
                        limit.as_millis()
                    ),
                });
            }

            let piece = &pieces[idx];
            let rotations = self.rotations(piece);

            if let Some(board) = current.as_mut()
                && let Some(slot) = board.find_slot(piece.rect(), rotations)
            {
                board.place(slot, piece);
                continue;
            }

            let sheet = self.next_sheet(piece, rotations, &remaining, locked_size)?;
            remaining[sheet] -= 1;
            let size = self.sheets[sheet].board_rect();
            if self.options.single_sheet_size {
                locked_size.get_or_insert(size);
            }

            let mut board = ShelfBoard::new(sheet, size, self.options.kerf);
            let slot = board.find_slot(piece.rect(), rotations).ok_or_else(|| {
                OptimizeError::InvariantViolation {
                    board: Some(closed.len() + usize::from(current.is_some())),
                    message: format!("piece {} does not fit the fresh sheet {size}", piece.id),
                }
            })?;
            board.place(slot, piece);
            tracing::debug!(
                sheet,
                size = %size,
                piece = piece.id,
                "opened board {}",
                closed.len() + usize::from(current.is_some()) + 1
            );
            if let Some(previous) = current.replace(board) {
                closed.push(previous);
            }
        }
        closed.extend(current);

        Ok(closed
            .into_iter()
            .enumerate()
            .map(|(index, board)| board.into_board(index))
            .collect())
    }

    /// First sheet, in caller order, with stock left that holds the piece.
    fn next_sheet(
        &self,
        piece: &Piece,
        rotations: &[bool],
        remaining: &[u32],
        locked_size: Option<Rect>,
    ) -> Result<usize> {
        let mut fits_some_size = false;
        for (idx, sheet) in self.sheets.iter().enumerate() {
            let size = sheet.board_rect();
            if locked_size.is_some_and(|locked| locked != size) {
                continue;
            }
            if !Self::fits_sheet(piece.rect(), rotations, size) {
                continue;
            }
            fits_some_size = true;
            if remaining[idx] > 0 {
                return Ok(idx);
            }
        }

        if fits_some_size {
            Err(OptimizeError::StockExhausted {
                panel_index: piece.panel_index,
                label: piece.label.clone(),
                width: piece.width,
                length: piece.length,
            })
        } else {
            Err(infeasible(piece))
        }
    }
}

fn infeasible(piece: &Piece) -> OptimizeError {
    OptimizeError::InfeasiblePiece {
        panel_index: piece.panel_index,
        label: piece.label.clone(),
        width: piece.width,
        length: piece.length,
    }
}

/// Descending area, then descending long side, then request order.
pub fn packing_order(pieces: &[Piece]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..pieces.len()).collect();
    order.sort_by(|&a, &b| {
        let (pa, pb) = (&pieces[a], &pieces[b]);
        pb.area()
            .cmp(&pa.area())
            .then_with(|| pb.rect().long_side().cmp(&pa.rect().long_side()))
            .then_with(|| pa.id.cmp(&pb.id))
    });
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::expander::expand;
    use crate::types::{Edging, PanelRequest, Placement};

    /// Validates a complete packing:
    /// 1. Every placement fits within its board
    /// 2. No two placements on the same board overlap or sit closer than kerf
    /// 3. Every requested piece is placed exactly once
    fn assert_packing_valid(boards: &[Board], panels: &[PanelRequest], kerf: u32) {
        let mut per_panel = vec![0u32; panels.len()];
        let mut seen = std::collections::BTreeSet::new();

        for (bi, board) in boards.iter().enumerate() {
            assert_eq!(board.index, bi);
            for (pi, p) in board.placements.iter().enumerate() {
                assert!(
                    p.right() <= board.width,
                    "board {bi}, piece {pi} exceeds width: x={} + w={} > {}",
                    p.x,
                    p.width,
                    board.width
                );
                assert!(
                    p.bottom() <= board.height,
                    "board {bi}, piece {pi} exceeds height: y={} + h={} > {}",
                    p.y,
                    p.height,
                    board.height
                );
                per_panel[p.panel_index] += 1;
                assert!(seen.insert(p.piece), "piece {} placed twice", p.piece);
            }
            assert_separated(bi, &board.placements, kerf);
            assert_eq!(board.used_area + board.waste_area, board.area());
        }

        for (idx, panel) in panels.iter().enumerate() {
            assert_eq!(per_panel[idx], panel.quantity, "panel {idx} count mismatch");
        }
    }

    fn assert_separated(board_idx: usize, placements: &[Placement], kerf: u32) {
        for i in 0..placements.len() {
            for j in (i + 1)..placements.len() {
                let (a, b) = (&placements[i], &placements[j]);
                match a.gap_to(b) {
                    None => panic!("board {board_idx}: piece {i} overlaps piece {j}"),
                    Some(gap) => assert!(
                        gap >= kerf,
                        "board {board_idx}: pieces {i} and {j} only {gap} apart (kerf {kerf})"
                    ),
                }
            }
        }
    }

    fn pack(
        panels: &[PanelRequest],
        sheets: &[StockSheet],
        options: PackOptions,
    ) -> Result<Vec<Board>> {
        let pieces = expand(panels, 10_000)?;
        Packer::new(sheets, options).pack(&pieces)
    }

    fn plenty(length: u32, width: u32) -> Vec<StockSheet> {
        vec![StockSheet::new(length, width, 1000)]
    }

    #[test]
    fn test_single_piece() {
        let panels = vec![PanelRequest::new(50, 50, 1)];
        let boards = pack(&panels, &plenty(100, 100), PackOptions::default()).unwrap();
        assert_packing_valid(&boards, &panels, 0);
        assert_eq!(boards.len(), 1);
    }

    #[test]
    fn test_exact_fit_four_pieces() {
        let panels = vec![PanelRequest::new(50, 50, 4)];
        let options = PackOptions {
            allow_rotation: false,
            ..PackOptions::default()
        };
        let boards = pack(&panels, &plenty(100, 100), options).unwrap();
        assert_packing_valid(&boards, &panels, 0);
        assert_eq!(boards.len(), 1);
    }

    #[test]
    fn test_needs_four_boards() {
        let panels = vec![PanelRequest::new(60, 60, 4)];
        let boards = pack(&panels, &plenty(100, 100), PackOptions::default()).unwrap();
        assert_packing_valid(&boards, &panels, 0);
        assert_eq!(boards.len(), 4);
    }

    #[test]
    fn test_rotation_helps() {
        // 100 wide, 50 long board; the 100 long piece only fits turned.
        let panels = vec![PanelRequest::new(50, 100, 1)];
        let boards = pack(&panels, &plenty(50, 100), PackOptions::default()).unwrap();
        assert_packing_valid(&boards, &panels, 0);
        assert!(boards[0].placements[0].rotated);
    }

    #[test]
    fn test_no_rotation_makes_piece_infeasible() {
        let panels = vec![PanelRequest::new(50, 100, 1)];
        let options = PackOptions {
            allow_rotation: false,
            ..PackOptions::default()
        };
        let err = pack(&panels, &plenty(50, 100), options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InfeasiblePiece);
    }

    #[test]
    fn test_grain_keeps_requested_orientation() {
        let panels = vec![PanelRequest::new(50, 100, 1)];
        let options = PackOptions {
            consider_grain: true,
            ..PackOptions::default()
        };
        assert!(pack(&panels, &plenty(50, 100), options).is_err());
        let boards = pack(&panels, &plenty(100, 100), options).unwrap();
        assert!(!boards[0].placements[0].rotated);
    }

    #[test]
    fn test_alignment_pins_orientation() {
        let panels = vec![
            PanelRequest::new(30, 80, 1).with_alignment(Alignment::Horizontal),
            PanelRequest::new(30, 80, 1).with_alignment(Alignment::Vertical),
        ];
        let boards = pack(&panels, &plenty(200, 200), PackOptions::default()).unwrap();
        assert_packing_valid(&boards, &panels, 0);
        let by_panel: Vec<(usize, bool, u32)> = boards[0]
            .placements
            .iter()
            .map(|p| (p.panel_index, p.rotated, p.width))
            .collect();
        assert!(by_panel.contains(&(0, true, 80)));
        assert!(by_panel.contains(&(1, false, 30)));
    }

    #[test]
    fn test_kerf_reduces_capacity() {
        let panels = vec![PanelRequest::new(50, 100, 2)];
        let no_rotate = PackOptions {
            allow_rotation: false,
            ..PackOptions::default()
        };

        let boards = pack(&panels, &plenty(100, 100), no_rotate).unwrap();
        assert_packing_valid(&boards, &panels, 0);
        assert_eq!(boards.len(), 1);

        // 50 + 5 + 50 = 105 > 100
        let with_kerf = PackOptions { kerf: 5, ..no_rotate };
        let boards = pack(&panels, &plenty(100, 100), with_kerf).unwrap();
        assert_packing_valid(&boards, &panels, 5);
        assert_eq!(boards.len(), 2);
    }

    #[test]
    fn test_sort_order_ties_keep_request_order() {
        let panels = vec![
            PanelRequest::new(20, 50, 1),
            PanelRequest::new(50, 20, 1),
            PanelRequest::new(40, 40, 1),
            PanelRequest::new(10, 100, 1),
        ];
        let pieces = expand(&panels, 100).unwrap();
        // areas: 1000, 1000, 1600, 1000; long sides 50, 50, 40, 100
        assert_eq!(packing_order(&pieces), vec![2, 3, 0, 1]);
    }

    #[test]
    fn test_heterogeneous_sheets_in_caller_order() {
        let panels = vec![PanelRequest::new(90, 90, 2)];
        let sheets = vec![StockSheet::new(50, 50, 5), StockSheet::new(100, 100, 1), StockSheet::new(200, 100, 1)];
        let boards = pack(&panels, &sheets, PackOptions::default()).unwrap();
        assert_packing_valid(&boards, &panels, 0);
        let used: Vec<usize> = boards.iter().map(|b| b.sheet).collect();
        assert_eq!(used, vec![1, 2]);
    }

    #[test]
    fn test_stock_quantity_is_a_hard_cap() {
        let panels = vec![PanelRequest::new(90, 90, 3)];
        let sheets = vec![StockSheet::new(100, 100, 2)];
        let err = pack(&panels, &sheets, PackOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientStock);
    }

    #[test]
    fn test_single_sheet_size_locks_first_choice() {
        let panels = vec![PanelRequest::new(90, 90, 2)];
        let sheets = vec![StockSheet::new(100, 100, 1), StockSheet::new(200, 200, 5)];

        let mixed = pack(&panels, &sheets, PackOptions::default()).unwrap();
        assert_eq!(mixed.iter().map(|b| b.sheet).collect::<Vec<_>>(), vec![0, 1]);

        let options = PackOptions {
            single_sheet_size: true,
            ..PackOptions::default()
        };
        let err = pack(&panels, &sheets, options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientStock);
    }

    #[test]
    fn test_single_sheet_size_reuses_locked_size() {
        let panels = vec![PanelRequest::new(90, 90, 1), PanelRequest::new(150, 150, 1)];
        let sheets = vec![StockSheet::new(200, 200, 5), StockSheet::new(100, 100, 5)];
        let options = PackOptions {
            single_sheet_size: true,
            ..PackOptions::default()
        };
        // the large piece goes first and locks 200x200; the small one fits it
        let boards = pack(&panels, &sheets, options).unwrap();
        assert!(boards.iter().all(|b| b.sheet == 0));
    }

    #[test]
    fn test_infeasible_names_first_offending_panel() {
        let panels = vec![
            PanelRequest::new(100, 100, 1),
            PanelRequest::new(1300, 2500, 1).with_label("Too big"),
            PanelRequest::new(1400, 2600, 1),
        ];
        let err = pack(&panels, &plenty(2440, 1220), PackOptions::default()).unwrap_err();
        match err {
            OptimizeError::InfeasiblePiece { panel_index, label, .. } => {
                assert_eq!(panel_index, 1);
                assert_eq!(label, "Too big");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_only_current_board_receives_pieces() {
        // Both 60x100 boards keep a 40 wide strip; once the second board is
        // open the first is never revisited.
        let panels = vec![PanelRequest::new(60, 100, 2), PanelRequest::new(40, 40, 2)];
        let options = PackOptions {
            allow_rotation: false,
            ..PackOptions::default()
        };
        let boards = pack(&panels, &plenty(100, 100), options).unwrap();
        assert_packing_valid(&boards, &panels, 0);
        let counts: Vec<usize> = boards.iter().map(|b| b.placements.len()).collect();
        assert_eq!(counts, vec![1, 2, 1]);
    }

    #[test]
    fn test_deterministic() {
        let panels = vec![
            PanelRequest::new(800, 600, 5),
            PanelRequest::new(400, 300, 8).with_edging(Edging::all()),
            PanelRequest::new(600, 400, 4),
            PanelRequest::new(1200, 600, 3),
        ];
        let options = PackOptions {
            kerf: 3,
            ..PackOptions::default()
        };
        let a = pack(&panels, &plenty(2440, 1220), options).unwrap();
        let b = pack(&panels, &plenty(2440, 1220), options).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_time_limit_aborts() {
        let panels = vec![PanelRequest::new(10, 10, 50)];
        let options = PackOptions {
            time_limit: Some(Duration::ZERO),
            ..PackOptions::default()
        };
        // A zero budget is exceeded as soon as the clock moves at all.
        match pack(&panels, &plenty(100, 100), options) {
            Err(err) => assert_eq!(err.kind(), ErrorKind::RequestTooLarge),
            Ok(boards) => assert_packing_valid(&boards, &panels, 0),
        }
    }

    /// 30 pieces, 6 different sizes, standard 2440x1220 sheet, no kerf.
    #[test]
    fn test_complex_mixed_sizes_no_kerf() {
        let panels = vec![
            PanelRequest::new(800, 600, 5),
            PanelRequest::new(400, 300, 8),
            PanelRequest::new(600, 400, 4),
            PanelRequest::new(1200, 600, 3),
            PanelRequest::new(300, 200, 6),
            PanelRequest::new(500, 500, 4).with_alignment(Alignment::Vertical),
        ];
        let boards = pack(&panels, &plenty(2440, 1220), PackOptions::default()).unwrap();
        assert_packing_valid(&boards, &panels, 0);

        let total_area: u64 = boards.iter().map(|b| b.used_area).sum();
        let min_boards = total_area.div_ceil(1220 * 2440) as usize;
        assert!(boards.len() >= min_boards);
    }

    /// 35 pieces, 7 different sizes, kerf 3.
    #[test]
    fn test_complex_mixed_sizes_with_kerf() {
        let panels = vec![
            PanelRequest::new(700, 500, 6),
            PanelRequest::new(350, 250, 5),
            PanelRequest::new(1000, 400, 3),
            PanelRequest::new(450, 450, 4),
            PanelRequest::new(600, 300, 7).with_alignment(Alignment::Horizontal),
            PanelRequest::new(250, 150, 5),
            PanelRequest::new(800, 400, 5),
        ];
        let options = PackOptions {
            kerf: 3,
            ..PackOptions::default()
        };
        let boards = pack(&panels, &plenty(2440, 1220), options).unwrap();
        assert_packing_valid(&boards, &panels, 3);
    }

    /// 32 pieces on small stock, forcing many boards.
    #[test]
    fn test_complex_small_stock_many_boards() {
        let panels = vec![
            PanelRequest::new(200, 150, 8),
            PanelRequest::new(300, 200, 6),
            PanelRequest::new(150, 100, 7),
            PanelRequest::new(250, 180, 5),
            PanelRequest::new(400, 300, 6),
        ];
        let boards = pack(&panels, &plenty(400, 500), PackOptions::default()).unwrap();
        assert_packing_valid(&boards, &panels, 0);
        assert!(boards.len() >= 5);
    }
}
