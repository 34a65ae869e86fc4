//! Board and service price catalog.
//!
//! Board prices are keyed core type → thickness → company → color code.
//! The catalog is read-only input to pricing; callers load it once and share
//! it between requests.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{OptimizeError, Result};
use crate::request::BoardSelection;
use crate::types::StockSheet;

pub type PriceTable = BTreeMap<String, BTreeMap<u32, BTreeMap<String, BTreeMap<String, f64>>>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorSwatch {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub hex: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSize {
    pub width: u32,
    pub length: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    pub currency: String,
    pub tax_name: String,
    pub tax_rate_percent: f64,
    pub cutting_price_per_board: f64,
    pub edging_price_per_meter: f64,
    /// Labour rate for applying edging the client brings.
    pub client_edging_price_per_meter: f64,
    pub default_kerf_mm: u32,
    pub default_board: BoardSize,
    pub colors: BTreeMap<String, Vec<ColorSwatch>>,
    pub boards: PriceTable,
}

impl Catalog {
    /// Catalog with service prices but no boards.
    pub fn empty() -> Self {
        Self {
            currency: "KES".to_string(),
            tax_name: "VAT".to_string(),
            tax_rate_percent: 16.0,
            cutting_price_per_board: 350.0,
            edging_price_per_meter: 75.0,
            client_edging_price_per_meter: 55.0,
            default_kerf_mm: 3,
            default_board: BoardSize {
                width: 1220,
                length: 2440,
            },
            colors: BTreeMap::new(),
            boards: BTreeMap::new(),
        }
    }

    pub fn with_color(mut self, company: &str, code: &str, name: &str, hex: &str) -> Self {
        self.colors
            .entry(company.to_string())
            .or_default()
            .push(ColorSwatch {
                code: code.to_string(),
                name: name.to_string(),
                hex: Some(hex.to_string()),
            });
        self
    }

    /// Prices one exact key.
    pub fn with_board_price(
        mut self,
        core_type: &str,
        thickness_mm: u32,
        company: &str,
        color_code: &str,
        price: f64,
    ) -> Self {
        self.boards
            .entry(core_type.to_string())
            .or_default()
            .entry(thickness_mm)
            .or_default()
            .entry(company.to_string())
            .or_default()
            .insert(color_code.to_string(), price);
        self
    }

    /// Prices every known color of `company` the same.
    pub fn with_company_price(self, core_type: &str, thickness_mm: u32, company: &str, price: f64) -> Self {
        let codes: Vec<String> = self
            .colors
            .get(company)
            .map(|swatches| swatches.iter().map(|s| s.code.clone()).collect())
            .unwrap_or_default();
        codes.iter().fold(self, |catalog, code| {
            catalog.with_board_price(core_type, thickness_mm, company, code, price)
        })
    }

    pub fn unit_price(&self, board: &BoardSelection) -> Result<f64> {
        self.boards
            .get(&board.core_type)
            .and_then(|by_thickness| by_thickness.get(&board.thickness_mm))
            .and_then(|by_company| by_company.get(&board.company))
            .and_then(|by_color| by_color.get(&board.color_code))
            .copied()
            .ok_or_else(|| OptimizeError::UnknownCatalogKey {
                core_type: board.core_type.clone(),
                thickness_mm: board.thickness_mm,
                company: board.company.clone(),
                color_code: board.color_code.clone(),
            })
    }

    pub fn color_name(&self, company: &str, code: &str) -> Option<&str> {
        self.colors
            .get(company)?
            .iter()
            .find(|s| s.code == code)
            .map(|s| s.name.as_str())
    }

    /// Stock used when a request does not list its own sheets.
    pub fn default_stock(&self, quantity: u32) -> StockSheet {
        StockSheet::new(self.default_board.length, self.default_board.width, quantity)
    }
}

impl Default for Catalog {
    /// The board-cutting shop's standard price list (KES).
    fn default() -> Self {
        const COLORS: &[(&str, &str, &str, &str)] = &[
            ("Complywood", "CP-101", "White", "#f5f5f5"),
            ("Complywood", "CP-102", "Light Brown", "#d2b48c"),
            ("Complywood", "CP-103", "Walnut", "#5c3b2e"),
            ("Timsales", "TS-101", "White Matt", "#f4f4f4"),
            ("Timsales", "TS-102", "Natural", "#d4b27b"),
            ("Timsales", "TS-103", "Grey", "#a0a0a0"),
            ("Raiply", "RP-101", "Natural", "#c9a568"),
            ("Raiply", "RP-102", "Reddish Brown", "#8b4513"),
            ("Zhongzhe", "ZZ-101", "Brown", "#8b5a2b"),
            ("Zhongzhe", "ZZ-102", "Light Brown", "#d2b48c"),
            ("Waterproof", "WP-101", "Green Core", "#238636"),
            ("Waterproof", "WP-102", "Dark Brown", "#4b3621"),
            ("Standard Chipboard", "CB-101", "Light Brown", "#d2b48c"),
            ("Standard Chipboard", "CB-102", "Wood Veneer", "#c19a6b"),
            ("Melamine Chipboard", "MC-101", "White", "#ffffff"),
            ("Melamine Chipboard", "MC-102", "Beech", "#f0c987"),
            ("Melamine Chipboard", "MC-103", "Oak", "#c3a16b"),
            ("Melamine Chipboard", "MC-104", "Walnut", "#5c3b2e"),
        ];

        #[rustfmt::skip]
        const PRICES: &[(&str, u32, &str, f64)] = &[
            ("mdf", 6, "Complywood", 2160.0), ("mdf", 6, "Timsales", 2100.0), ("mdf", 6, "Raiply", 2280.0), ("mdf", 6, "Zhongzhe", 1980.0),
            ("mdf", 9, "Complywood", 2880.0), ("mdf", 9, "Timsales", 2820.0), ("mdf", 9, "Raiply", 3000.0), ("mdf", 9, "Zhongzhe", 2640.0),
            ("mdf", 12, "Complywood", 3840.0), ("mdf", 12, "Timsales", 3720.0), ("mdf", 12, "Raiply", 3960.0), ("mdf", 12, "Zhongzhe", 3480.0),
            ("mdf", 18, "Complywood", 5400.0), ("mdf", 18, "Timsales", 5280.0), ("mdf", 18, "Raiply", 5520.0), ("mdf", 18, "Zhongzhe", 4920.0),
            ("plywood", 3, "Complywood", 1800.0), ("plywood", 3, "Timsales", 1740.0), ("plywood", 3, "Raiply", 1920.0), ("plywood", 3, "Zhongzhe", 1560.0), ("plywood", 3, "Waterproof", 3840.0),
            ("plywood", 6, "Complywood", 2640.0), ("plywood", 6, "Timsales", 2520.0), ("plywood", 6, "Raiply", 2760.0), ("plywood", 6, "Zhongzhe", 2280.0), ("plywood", 6, "Waterproof", 5400.0),
            ("plywood", 9, "Complywood", 3360.0), ("plywood", 9, "Timsales", 3240.0), ("plywood", 9, "Raiply", 3480.0), ("plywood", 9, "Zhongzhe", 3000.0), ("plywood", 9, "Waterproof", 6600.0),
            ("plywood", 12, "Complywood", 4200.0), ("plywood", 12, "Timsales", 4080.0), ("plywood", 12, "Raiply", 4320.0), ("plywood", 12, "Zhongzhe", 3720.0), ("plywood", 12, "Waterproof", 8160.0),
            ("plywood", 18, "Complywood", 6240.0), ("plywood", 18, "Timsales", 6000.0), ("plywood", 18, "Raiply", 6360.0), ("plywood", 18, "Zhongzhe", 5520.0), ("plywood", 18, "Waterproof", 11040.0),
            ("chipboard", 6, "Zhongzhe", 1320.0), ("chipboard", 6, "Standard Chipboard", 1440.0),
            ("chipboard", 9, "Zhongzhe", 1800.0), ("chipboard", 9, "Standard Chipboard", 1920.0),
            ("chipboard", 12, "Zhongzhe", 2280.0), ("chipboard", 12, "Standard Chipboard", 2520.0), ("chipboard", 12, "Melamine Chipboard", 3600.0),
            ("chipboard", 18, "Zhongzhe", 3360.0), ("chipboard", 18, "Standard Chipboard", 3840.0), ("chipboard", 18, "Melamine Chipboard", 5040.0),
            ("waterproof", 6, "Waterproof", 3360.0), ("waterproof", 9, "Waterproof", 3840.0),
            ("waterproof", 12, "Waterproof", 5040.0), ("waterproof", 18, "Waterproof", 6960.0),
        ];

        let with_colors = COLORS
            .iter()
            .fold(Catalog::empty(), |catalog, &(company, code, name, hex)| {
                catalog.with_color(company, code, name, hex)
            });
        PRICES
            .iter()
            .fold(with_colors, |catalog, &(core, thickness, company, price)| {
                catalog.with_company_price(core, thickness, company, price)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_default_lookup() {
        let catalog = Catalog::default();
        let board = BoardSelection::new("plywood", 18, "Timsales", "TS-102");
        assert_eq!(catalog.unit_price(&board).unwrap(), 6000.0);
        assert_eq!(catalog.color_name("Timsales", "TS-102"), Some("Natural"));
    }

    #[test]
    fn test_unknown_thickness() {
        let catalog = Catalog::default();
        let board = BoardSelection::new("mdf", 3, "Timsales", "TS-101");
        let err = catalog.unit_price(&board).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownCatalogKey);
        assert!(err.to_string().contains("mdf 3mm Timsales"), "{err}");
    }

    #[test]
    fn test_unknown_color_for_company() {
        let catalog = Catalog::default();
        // valid company and thickness, but the color belongs to another brand
        let board = BoardSelection::new("plywood", 18, "Timsales", "CP-101");
        assert!(catalog.unit_price(&board).is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let catalog: Catalog = serde_json::from_str(
            r#"{
                "tax_rate_percent": 0,
                "boards": {"plywood": {"18": {"Timsales": {"TS-101": 4200}}}}
            }"#,
        )
        .unwrap();
        assert_eq!(catalog.tax_rate_percent, 0.0);
        assert_eq!(catalog.cutting_price_per_board, 350.0);
        let board = BoardSelection::new("plywood", 18, "Timsales", "TS-101");
        assert_eq!(catalog.unit_price(&board).unwrap(), 4200.0);
        // defaults for the board list are replaced, not merged
        let other = BoardSelection::new("mdf", 18, "Timsales", "TS-101");
        assert!(catalog.unit_price(&other).is_err());
    }

    #[test]
    fn test_default_stock_orientation() {
        let sheet = Catalog::default().default_stock(7);
        assert_eq!((sheet.width, sheet.length, sheet.quantity), (1220, 2440, 7));
    }
}
