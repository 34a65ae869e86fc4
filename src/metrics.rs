use serde::Serialize;

use crate::types::{Board, Cut, PanelRequest, Piece, StockSheet};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardMetrics {
    pub used_area_mm2: u64,
    pub waste_area_mm2: u64,
    pub efficiency_percent: f64,
    pub edging_mm: u64,
    pub edging_meters: f64,
    pub cut_count: usize,
    pub cut_length_mm: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetUsage {
    pub sheet: usize,
    pub width: u32,
    pub length: u32,
    pub boards: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobMetrics {
    pub total_boards: usize,
    pub total_pieces: usize,
    pub unique_panel_types: usize,
    pub total_edging_meters: f64,
    pub total_used_mm2: u64,
    pub total_waste_mm2: u64,
    pub total_waste_percent: f64,
    pub total_cuts: usize,
    pub total_cut_length_mm: u64,
    pub sheets: Vec<SheetUsage>,
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

pub fn mm_to_m(mm: u64) -> f64 {
    mm as f64 / 1000.0
}

/// Edging follows the sides flagged on the originating panel, whatever the
/// placement's rotation or position on the board.
pub fn board_metrics(board: &Board, cuts: &[Cut], pieces: &[Piece]) -> BoardMetrics {
    let used: u64 = board.placements.iter().map(|p| p.area()).sum();
    let area = board.area();
    let edging_mm: u64 = board
        .placements
        .iter()
        .filter_map(|p| pieces.get(p.piece))
        .map(|piece| piece.edge_length_mm())
        .sum();

    BoardMetrics {
        used_area_mm2: used,
        waste_area_mm2: area - used,
        efficiency_percent: round1(percent(used, area)),
        edging_mm,
        edging_meters: mm_to_m(edging_mm),
        cut_count: cuts.len(),
        cut_length_mm: cuts.iter().map(|c| c.length as u64).sum(),
    }
}

pub fn job_metrics(
    panels: &[PanelRequest],
    pieces: &[Piece],
    sheets: &[StockSheet],
    boards: &[(&Board, &BoardMetrics)],
) -> JobMetrics {
    let total_area: u64 = boards.iter().map(|(b, _)| b.area()).sum();
    let total_used: u64 = boards.iter().map(|(_, m)| m.used_area_mm2).sum();
    let total_waste: u64 = boards.iter().map(|(_, m)| m.waste_area_mm2).sum();
    let edging_mm: u64 = boards.iter().map(|(_, m)| m.edging_mm).sum();

    let sheets = sheets
        .iter()
        .enumerate()
        .filter_map(|(idx, sheet)| {
            let used = boards.iter().filter(|(b, _)| b.sheet == idx).count();
            (used > 0).then_some(SheetUsage {
                sheet: idx,
                width: sheet.width,
                length: sheet.length,
                boards: used,
            })
        })
        .collect();

    JobMetrics {
        total_boards: boards.len(),
        total_pieces: pieces.len(),
        unique_panel_types: panels.len(),
        total_edging_meters: mm_to_m(edging_mm),
        total_used_mm2: total_used,
        total_waste_mm2: total_waste,
        total_waste_percent: round1(percent(total_waste, total_area)),
        total_cuts: boards.iter().map(|(_, m)| m.cut_count).sum(),
        total_cut_length_mm: boards.iter().map(|(_, m)| m.cut_length_mm).sum(),
        sheets,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cuts::derive_cuts;
    use crate::expander::expand;
    use crate::packer::{PackOptions, Packer};
    use crate::types::{Edging, StockSheet};

    fn run(panels: &[PanelRequest], sheets: &[StockSheet], kerf: u32) -> (Vec<Piece>, Vec<Board>, Vec<BoardMetrics>) {
        let pieces = expand(panels, 1000).unwrap();
        let options = PackOptions {
            kerf,
            ..PackOptions::default()
        };
        let boards = Packer::new(sheets, options).pack(&pieces).unwrap();
        let metrics = boards
            .iter()
            .map(|b| board_metrics(b, &derive_cuts(b).unwrap(), &pieces))
            .collect();
        (pieces, boards, metrics)
    }

    #[test]
    fn test_edging_all_four_sides() {
        let panels = vec![PanelRequest::new(500, 700, 2).with_edging(Edging::all())];
        let sheets = vec![StockSheet::new(2440, 1220, 10)];
        let (pieces, boards, metrics) = run(&panels, &sheets, 3);
        let pairs: Vec<(&Board, &BoardMetrics)> = boards.iter().zip(&metrics).collect();
        let job = job_metrics(&panels, &pieces, &sheets, &pairs);
        assert_eq!(job.total_edging_meters, 4.8);
        assert_eq!(metrics[0].edging_mm, 4800);
    }

    #[test]
    fn test_edging_ignores_unflagged_sides_and_rotation() {
        let edging = Edging {
            left: true,
            ..Edging::default()
        };
        // 100 wide board forces the 50x100 piece to rotate
        let panels = vec![PanelRequest::new(50, 100, 1).with_edging(edging)];
        let sheets = vec![StockSheet::new(50, 100, 1)];
        let (_, boards, metrics) = run(&panels, &sheets, 0);
        assert!(boards[0].placements[0].rotated);
        assert_eq!(metrics[0].edging_mm, 100);
        assert_eq!(metrics[0].edging_meters, 0.1);
    }

    #[test]
    fn test_area_and_efficiency() {
        let panels = vec![PanelRequest::new(400, 600, 5)];
        let sheets = vec![StockSheet::new(2440, 1220, 10)];
        let (pieces, boards, metrics) = run(&panels, &sheets, 3);
        assert_eq!(boards.len(), 1);
        let m = &metrics[0];
        assert_eq!(m.used_area_mm2, 1_200_000);
        assert_eq!(m.used_area_mm2 + m.waste_area_mm2, 1220 * 2440);
        // 1_200_000 / 2_976_800 = 40.31 %
        assert_eq!(m.efficiency_percent, 40.3);
        assert_eq!(m.cut_count, 7);
        assert_eq!(m.cut_length_mm, 2 * 1220 + 5 * 600);

        let pairs: Vec<(&Board, &BoardMetrics)> = boards.iter().zip(&metrics).collect();
        let job = job_metrics(&panels, &pieces, &sheets, &pairs);
        assert_eq!(job.total_pieces, 5);
        assert_eq!(job.total_boards, 1);
        assert_eq!(job.total_waste_percent, 59.7);
        assert_eq!(job.sheets, vec![SheetUsage { sheet: 0, width: 1220, length: 2440, boards: 1 }]);
    }

    #[test]
    fn test_total_pieces_counts_requests() {
        let panels = vec![PanelRequest::new(100, 100, 3), PanelRequest::new(200, 100, 2)];
        let sheets = vec![StockSheet::new(1000, 1000, 10)];
        let (pieces, boards, metrics) = run(&panels, &sheets, 0);
        let pairs: Vec<(&Board, &BoardMetrics)> = boards.iter().zip(&metrics).collect();
        let job = job_metrics(&panels, &pieces, &sheets, &pairs);
        assert_eq!(job.total_pieces, 5);
        assert_eq!(job.unique_panel_types, 2);
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(40.3114), 40.3);
        assert_eq!(round1(59.6886), 59.7);
        assert_eq!(percent(1, 0), 0.0);
    }
}
