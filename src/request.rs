//! Wire-level request types and their resolution into core inputs.

use serde::{Deserialize, Serialize};

use crate::error::{OptimizeError, Result};
use crate::types::{PanelRequest, StockSheet, deserialize_opt_u32_from_number, deserialize_u32_from_number};

pub const MAX_KERF_MM: u32 = 10;

/// Catalog key of the board material being cut.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardSelection {
    pub core_type: String,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub thickness_mm: u32,
    pub company: String,
    pub color_code: String,
    #[serde(default)]
    pub color_name: Option<String>,
}

impl BoardSelection {
    pub fn new(
        core_type: impl Into<String>,
        thickness_mm: u32,
        company: impl Into<String>,
        color_code: impl Into<String>,
    ) -> Self {
        Self {
            core_type: core_type.into(),
            thickness_mm,
            company: company.into(),
            color_code: color_code.into(),
            color_name: None,
        }
    }

    /// e.g. `PLYWOOD 18mm`
    pub fn board_type(&self) -> String {
        format!("{} {}mm", self.core_type.to_uppercase(), self.thickness_mm)
    }
}

/// Who supplies boards and edging, as sent by clients.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupplyMode {
    pub client_supply: bool,
    /// Omitted means the opposite of `client_supply`.
    pub factory_supply: Option<bool>,
    #[serde(deserialize_with = "deserialize_opt_u32_from_number")]
    pub client_board_qty: Option<u32>,
    pub client_edging_meters: Option<f64>,
}

impl SupplyMode {
    pub fn factory() -> Self {
        Self::default()
    }

    pub fn client(board_qty: u32) -> Self {
        Self {
            client_supply: true,
            factory_supply: Some(false),
            client_board_qty: Some(board_qty),
            client_edging_meters: None,
        }
    }

    pub fn resolve(&self) -> Result<Supply> {
        let factory = self.factory_supply.unwrap_or(!self.client_supply);
        match (self.client_supply, factory) {
            (true, true) => Err(OptimizeError::validation(
                "supply",
                "only one of client_supply or factory_supply can be true",
            )),
            (false, false) => Err(OptimizeError::validation(
                "supply",
                "either client_supply or factory_supply must be true",
            )),
            (false, true) => Ok(Supply::Factory),
            (true, false) => {
                let board_qty = match self.client_board_qty {
                    Some(qty) if qty > 0 => qty,
                    _ => {
                        return Err(OptimizeError::validation(
                            "supply.client_board_qty",
                            "a positive board quantity is required when client_supply is true",
                        ));
                    }
                };
                if let Some(meters) = self.client_edging_meters
                    && (!meters.is_finite() || meters < 0.0)
                {
                    return Err(OptimizeError::validation(
                        "supply.client_edging_meters",
                        format!("must be a non-negative number, got {meters}"),
                    ));
                }
                Ok(Supply::Client {
                    board_qty,
                    edging_meters: self.client_edging_meters,
                })
            }
        }
    }
}

/// Resolved, mutually exclusive supply mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Supply {
    Factory,
    Client {
        board_qty: u32,
        edging_meters: Option<f64>,
    },
}

impl Supply {
    pub fn is_client(&self) -> bool {
        matches!(self, Supply::Client { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Supply::Factory => "Factory",
            Supply::Client { .. } => "Client",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Saw blade width in mm; the catalog default applies when absent.
    #[serde(deserialize_with = "deserialize_opt_u32_from_number")]
    pub kerf: Option<u32>,
    pub edge_banding: bool,
    pub use_single_sheet: bool,
    pub consider_material: bool,
    pub consider_grain: bool,
    pub allow_rotation: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            kerf: None,
            edge_banding: true,
            use_single_sheet: false,
            consider_material: true,
            consider_grain: false,
            allow_rotation: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuttingRequest {
    pub panels: Vec<PanelRequest>,
    pub board: BoardSelection,
    #[serde(default)]
    pub supply: SupplyMode,
    #[serde(default)]
    pub stock_sheets: Option<Vec<StockSheet>>,
    #[serde(default)]
    pub options: Options,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CuttingRequest {
    pub fn new(panels: Vec<PanelRequest>, board: BoardSelection) -> Self {
        Self {
            panels,
            board,
            supply: SupplyMode::factory(),
            stock_sheets: None,
            options: Options::default(),
            project_name: None,
            customer_name: None,
            notes: None,
        }
    }

    /// Effective kerf, validated against [`MAX_KERF_MM`].
    pub fn kerf(&self, default_kerf: u32) -> Result<u32> {
        let kerf = self.options.kerf.unwrap_or(default_kerf);
        if kerf > MAX_KERF_MM {
            return Err(OptimizeError::validation(
                "options.kerf",
                format!("{kerf} mm exceeds the maximum of {MAX_KERF_MM} mm"),
            ));
        }
        Ok(kerf)
    }
}
