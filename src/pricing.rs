//! Quote lines and totals for a packed job.
//!
//! Amounts are accumulated in minor currency units (cents) so that
//! `subtotal + tax_amount == total` holds exactly after conversion back.

use serde::Serialize;

use crate::catalog::Catalog;
use crate::error::{OptimizeError, Result};
use crate::request::{BoardSelection, Supply};

pub const MATERIAL: &str = "MATERIAL";
pub const CUTTING: &str = "CUTTING";
pub const EDGING: &str = "EDGING";
pub const EDGING_LABOUR: &str = "EDGING-LABOUR";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingLine {
    pub item: String,
    pub description: String,
    pub quantity: f64,
    pub unit: String,
    pub unit_price: f64,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingResult {
    pub lines: Vec<PricingLine>,
    pub subtotal: f64,
    pub tax_name: String,
    pub tax_rate: f64,
    pub tax_amount: f64,
    pub total: f64,
    pub currency: String,
    pub supplied_by: String,
}

impl PricingResult {
    pub fn line(&self, item: &str) -> Option<&PricingLine> {
        self.lines.iter().find(|l| l.item == item)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PricingInput<'a> {
    pub boards_used: usize,
    /// Edging the layout needs, from the job metrics.
    pub edging_meters: f64,
    pub board: &'a BoardSelection,
    pub supply: Supply,
    pub edge_banding: bool,
    pub consider_material: bool,
}

/// Rounds half-up to the currency's minor unit. The epsilon absorbs binary
/// representation error on values like 1.125.
pub fn to_minor(value: f64) -> i64 {
    (value * 100.0 + 1e-6).round() as i64
}

pub fn from_minor(minor: i64) -> f64 {
    minor as f64 / 100.0
}

struct Line {
    line: PricingLine,
    minor: i64,
}

fn line(item: &str, description: String, quantity: f64, unit: &str, unit_price: f64) -> Line {
    let minor = to_minor(quantity * unit_price);
    Line {
        line: PricingLine {
            item: item.to_string(),
            description,
            quantity,
            unit: unit.to_string(),
            unit_price,
            amount: from_minor(minor),
        },
        minor,
    }
}

fn material_description(board: &BoardSelection, catalog: &Catalog) -> String {
    let color = board
        .color_name
        .as_deref()
        .or_else(|| catalog.color_name(&board.company, &board.color_code))
        .unwrap_or(&board.color_code);
    format!("{} {} ({color})", board.board_type(), board.company)
}

pub fn price(input: &PricingInput<'_>, catalog: &Catalog) -> Result<PricingResult> {
    let boards = input.boards_used as f64;
    let mut lines: Vec<Line> = Vec::with_capacity(4);

    let description = material_description(input.board, catalog);
    match input.supply {
        Supply::Client { board_qty, .. } => {
            if (board_qty as usize) < input.boards_used {
                return Err(OptimizeError::InsufficientSuppliedBoards {
                    required: input.boards_used,
                    supplied: board_qty,
                });
            }
            lines.push(line(
                MATERIAL,
                format!("{description}, client supplied"),
                boards,
                "sheet",
                0.0,
            ));
        }
        Supply::Factory if input.consider_material => {
            let unit_price = catalog.unit_price(input.board)?;
            lines.push(line(MATERIAL, description, boards, "sheet", unit_price));
        }
        Supply::Factory => {
            lines.push(line(
                MATERIAL,
                format!("{description}, material not charged"),
                boards,
                "sheet",
                0.0,
            ));
        }
    }

    lines.push(line(
        CUTTING,
        "Board cutting service".to_string(),
        boards,
        "board",
        catalog.cutting_price_per_board,
    ));

    if input.edge_banding {
        let required = input.edging_meters.max(0.0);
        let declared = match input.supply {
            Supply::Client {
                edging_meters: Some(meters),
                ..
            } => meters.min(required),
            _ => 0.0,
        };

        lines.push(line(
            EDGING,
            "Edge banding service".to_string(),
            (required - declared).max(0.0),
            "m",
            catalog.edging_price_per_meter,
        ));

        if declared > 0.0 && catalog.client_edging_price_per_meter > 0.0 {
            lines.push(line(
                EDGING_LABOUR,
                "Edge banding labour, client supplied edging".to_string(),
                declared,
                "m",
                catalog.client_edging_price_per_meter,
            ));
        }
    }

    let subtotal_minor: i64 = lines.iter().map(|l| l.minor).sum();
    let tax_minor = (subtotal_minor as f64 * catalog.tax_rate_percent / 100.0 + 1e-6).round() as i64;

    Ok(PricingResult {
        lines: lines.into_iter().map(|l| l.line).collect(),
        subtotal: from_minor(subtotal_minor),
        tax_name: catalog.tax_name.clone(),
        tax_rate: catalog.tax_rate_percent,
        tax_amount: from_minor(tax_minor),
        total: from_minor(subtotal_minor + tax_minor),
        currency: catalog.currency.clone(),
        supplied_by: input.supply.label().to_string(),
    })
}
