use serde::Serialize;

use crate::metrics::mm_to_m;
use crate::types::PanelRequest;

/// One requested panel type in the bill of quantities.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoqItem {
    pub item_no: usize,
    pub description: String,
    pub size: String,
    pub quantity: u32,
    pub unit: String,
    pub edges: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgingDetail {
    pub panel_label: String,
    pub quantity: u32,
    pub edge_per_panel_m: f64,
    pub total_edge_m: f64,
    pub edges_applied: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgingSummary {
    pub total_meters: f64,
    pub details: Vec<EdgingDetail>,
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn items(panels: &[PanelRequest]) -> Vec<BoqItem> {
    panels
        .iter()
        .enumerate()
        .map(|(idx, panel)| BoqItem {
            item_no: idx + 1,
            description: panel.display_label(idx),
            size: format!("{} x {} mm", panel.width, panel.length),
            quantity: panel.quantity,
            unit: "pcs".to_string(),
            edges: panel.edging.code(),
        })
        .collect()
}

/// Edging per panel type. Panels without edging are left out of the details.
pub fn edging_summary(panels: &[PanelRequest]) -> EdgingSummary {
    let details: Vec<EdgingDetail> = panels
        .iter()
        .enumerate()
        .filter(|(_, panel)| !panel.edging.is_empty())
        .map(|(idx, panel)| {
            let per_panel_mm = panel.edge_length_mm();
            EdgingDetail {
                panel_label: panel.display_label(idx),
                quantity: panel.quantity,
                edge_per_panel_m: round_to(mm_to_m(per_panel_mm), 3),
                total_edge_m: round_to(mm_to_m(per_panel_mm * panel.quantity as u64), 2),
                edges_applied: panel.edging.code(),
            }
        })
        .collect();

    let total_mm: u64 = panels
        .iter()
        .map(|p| p.edge_length_mm() * p.quantity as u64)
        .sum();

    EdgingSummary {
        total_meters: round_to(mm_to_m(total_mm), 2),
        details,
    }
}
