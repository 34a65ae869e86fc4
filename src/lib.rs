//! Board cutting layouts and quotes.
//!
//! [`optimize`] runs the whole pipeline for one request: expand panels into
//! pieces, pack them onto stock boards, derive each board's cut list,
//! aggregate metrics and price the job. It is a pure function of its inputs.

pub mod boq;
pub mod catalog;
pub mod config;
pub mod cuts;
pub mod error;
pub mod expander;
pub mod metrics;
pub mod packer;
pub mod pricing;
pub mod render;
pub mod request;
pub mod shelf;
pub mod types;

use std::time::Duration;

use serde::Serialize;

use crate::boq::{BoqItem, EdgingSummary};
use crate::catalog::Catalog;
use crate::error::{OptimizeError, Result};
use crate::metrics::{BoardMetrics, JobMetrics};
use crate::packer::{PackOptions, Packer};
use crate::pricing::{PricingInput, PricingResult};
use crate::request::{CuttingRequest, Supply};
use crate::types::{Board, Cut, StockSheet};

pub use crate::error::ErrorKind;

pub const MAX_SHEET_DIMENSION_MM: u32 = 5000;
pub const MAX_SHEET_QUANTITY: u32 = 1000;

/// Guards against pathological requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_pieces: usize,
    pub time_limit: Option<Duration>,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_pieces: 5000,
            time_limit: Some(Duration::from_millis(2000)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardLayout {
    #[serde(flatten)]
    pub board: Board,
    pub cuts: Vec<Cut>,
    pub metrics: BoardMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestSummary {
    pub project_name: Option<String>,
    pub customer_name: Option<String>,
    pub board_type: String,
    pub company: String,
    pub color_code: String,
    pub supplied_by: String,
    pub kerf_mm: u32,
    pub total_boards: usize,
    pub total_pieces: usize,
    pub total_edging_meters: f64,
    pub waste_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CuttingResult {
    pub summary: RequestSummary,
    pub layouts: Vec<BoardLayout>,
    pub metrics: JobMetrics,
    pub edging: EdgingSummary,
    pub boq: Vec<BoqItem>,
    pub pricing: PricingResult,
}

pub fn optimize(request: &CuttingRequest, catalog: &Catalog, limits: &Limits) -> Result<CuttingResult> {
    let result = run(request, catalog, limits);
    match &result {
        Ok(result) => tracing::info!(
            boards = result.summary.total_boards,
            pieces = result.summary.total_pieces,
            waste_percent = result.summary.waste_percent,
            total = result.pricing.total,
            "optimized"
        ),
        Err(err @ OptimizeError::InvariantViolation { .. }) => tracing::error!(
            error = %err,
            request = serde_json::to_string(request).unwrap_or_default(),
            "layout invariant violated"
        ),
        Err(err) => tracing::warn!(kind = %err.kind(), error = %err, "request rejected"),
    }
    result
}

fn run(request: &CuttingRequest, catalog: &Catalog, limits: &Limits) -> Result<CuttingResult> {
    let supply = request.supply.resolve()?;
    let kerf = request.kerf(catalog.default_kerf_mm)?;
    let pieces = expander::expand(&request.panels, limits.max_pieces)?;
    let sheets = stock_sheets(request, catalog, pieces.len())?;

    let options = PackOptions {
        kerf,
        allow_rotation: request.options.allow_rotation,
        single_sheet_size: request.options.use_single_sheet,
        consider_grain: request.options.consider_grain,
        time_limit: limits.time_limit,
    };
    let boards = Packer::new(&sheets, options).pack(&pieces)?;
    check_counts(request, &boards)?;

    let mut layouts = Vec::with_capacity(boards.len());
    for board in boards {
        let cuts = cuts::derive_cuts(&board)?;
        let metrics = metrics::board_metrics(&board, &cuts, &pieces);
        layouts.push(BoardLayout {
            board,
            cuts,
            metrics,
        });
    }

    let pairs: Vec<(&Board, &BoardMetrics)> = layouts.iter().map(|l| (&l.board, &l.metrics)).collect();
    let job = metrics::job_metrics(&request.panels, &pieces, &sheets, &pairs);

    let pricing = pricing::price(
        &PricingInput {
            boards_used: job.total_boards,
            edging_meters: job.total_edging_meters,
            board: &request.board,
            supply,
            edge_banding: request.options.edge_banding,
            consider_material: request.options.consider_material,
        },
        catalog,
    )?;

    Ok(CuttingResult {
        summary: summary(request, supply, kerf, &job),
        layouts,
        edging: boq::edging_summary(&request.panels),
        boq: boq::items(&request.panels),
        metrics: job,
        pricing,
    })
}

/// The request's stock, validated, or the catalog's default board in a
/// quantity that never limits the job.
fn stock_sheets(request: &CuttingRequest, catalog: &Catalog, piece_count: usize) -> Result<Vec<StockSheet>> {
    let Some(sheets) = &request.stock_sheets else {
        let quantity = u32::try_from(piece_count).unwrap_or(u32::MAX);
        return Ok(vec![catalog.default_stock(quantity)]);
    };

    if sheets.is_empty() {
        return Err(OptimizeError::validation(
            "stock_sheets",
            "at least one stock sheet is required when stock_sheets is given",
        ));
    }
    for (idx, sheet) in sheets.iter().enumerate() {
        for (name, value) in [("length", sheet.length), ("width", sheet.width)] {
            if value == 0 || value > MAX_SHEET_DIMENSION_MM {
                return Err(OptimizeError::validation(
                    format!("stock_sheets[{idx}].{name}"),
                    format!("{value} mm is outside 1..={MAX_SHEET_DIMENSION_MM} mm"),
                ));
            }
        }
        if sheet.quantity == 0 || sheet.quantity > MAX_SHEET_QUANTITY {
            return Err(OptimizeError::validation(
                format!("stock_sheets[{idx}].quantity"),
                format!("{} is outside 1..={MAX_SHEET_QUANTITY}", sheet.quantity),
            ));
        }
    }
    Ok(sheets.clone())
}

fn check_counts(request: &CuttingRequest, boards: &[Board]) -> Result<()> {
    let mut placed = vec![0u64; request.panels.len()];
    for placement in boards.iter().flat_map(|b| &b.placements) {
        if let Some(count) = placed.get_mut(placement.panel_index) {
            *count += 1;
        }
    }
    for (idx, (panel, count)) in request.panels.iter().zip(&placed).enumerate() {
        if *count != panel.quantity as u64 {
            return Err(OptimizeError::InvariantViolation {
                board: None,
                message: format!(
                    "panel {} placed {count} times, {} requested",
                    idx + 1,
                    panel.quantity
                ),
            });
        }
    }
    Ok(())
}

fn summary(request: &CuttingRequest, supply: Supply, kerf: u32, job: &JobMetrics) -> RequestSummary {
    RequestSummary {
        project_name: request.project_name.clone(),
        customer_name: request.customer_name.clone(),
        board_type: request.board.board_type(),
        company: request.board.company.clone(),
        color_code: request.board.color_code.clone(),
        supplied_by: supply.label().to_string(),
        kerf_mm: kerf,
        total_boards: job.total_boards,
        total_pieces: job.total_pieces,
        total_edging_meters: job.total_edging_meters,
        waste_percent: job.total_waste_percent,
    }
}
