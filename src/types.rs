use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }

    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }

    pub fn rotated(&self) -> Self {
        Self {
            w: self.h,
            h: self.w,
        }
    }

    /// Returns the rect as placed: swapped when `rotated`.
    pub fn oriented(&self, rotated: bool) -> Self {
        if rotated { self.rotated() } else { *self }
    }

    pub fn fits_in(&self, other: &Rect) -> bool {
        self.w <= other.w && self.h <= other.h
    }

    pub fn is_square(&self) -> bool {
        self.w == self.h
    }

    pub fn long_side(&self) -> u32 {
        self.w.max(self.h)
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.w, self.h)
    }
}

/// Per-edge banding flags, in the panel's own frame: top/bottom run along
/// the width, left/right along the length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Edging {
    pub top: bool,
    pub right: bool,
    pub bottom: bool,
    pub left: bool,
}

impl Edging {
    pub fn all() -> Self {
        Self {
            top: true,
            right: true,
            bottom: true,
            left: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.top || self.right || self.bottom || self.left)
    }

    /// Banded length of one panel in millimeters. Only flagged sides count.
    pub fn edge_length_mm(&self, width: u32, length: u32) -> u64 {
        let sides = [
            (self.top, width),
            (self.bottom, width),
            (self.left, length),
            (self.right, length),
        ];
        sides
            .iter()
            .filter(|(flagged, _)| *flagged)
            .map(|&(_, len)| len as u64)
            .sum()
    }

    /// Short code such as `LRTB`, or `None` when nothing is banded.
    pub fn code(&self) -> String {
        let code: String = [
            (self.left, 'L'),
            (self.right, 'R'),
            (self.top, 'T'),
            (self.bottom, 'B'),
        ]
        .iter()
        .filter(|(flagged, _)| *flagged)
        .map(|&(_, c)| c)
        .collect();
        if code.is_empty() {
            "None".to_string()
        } else {
            code
        }
    }
}

/// Grain alignment requested for a panel. A set alignment pins the
/// orientation the panel is cut in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    None,
    /// Panel length runs along the board width (x axis).
    Horizontal,
    /// Panel length runs along the board length (y axis).
    Vertical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelRequest {
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub width: u32,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub length: u32,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub quantity: u32,
    #[serde(default)]
    pub edging: Edging,
    #[serde(default)]
    pub alignment: Alignment,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl PanelRequest {
    pub fn new(width: u32, length: u32, quantity: u32) -> Self {
        Self {
            width,
            length,
            quantity,
            edging: Edging::default(),
            alignment: Alignment::None,
            label: None,
            notes: None,
        }
    }

    pub fn with_edging(mut self, edging: Edging) -> Self {
        self.edging = edging;
        self
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// The caller's label, or `Panel N` (1-based) when none was given.
    pub fn display_label(&self, index: usize) -> String {
        match &self.label {
            Some(label) if !label.trim().is_empty() => label.clone(),
            _ => format!("Panel {}", index + 1),
        }
    }

    pub fn edge_length_mm(&self) -> u64 {
        self.edging.edge_length_mm(self.width, self.length)
    }
}

/// One physical instance of a requested panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Piece {
    /// Position in expansion order, (panel index, instance index).
    pub id: usize,
    pub panel_index: usize,
    pub instance: u32,
    pub label: String,
    pub width: u32,
    pub length: u32,
    pub edging: Edging,
    pub alignment: Alignment,
}

impl Piece {
    pub fn rect(&self) -> Rect {
        Rect::new(self.width, self.length)
    }

    pub fn area(&self) -> u64 {
        self.rect().area()
    }

    pub fn edge_length_mm(&self) -> u64 {
        self.edging.edge_length_mm(self.width, self.length)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSheet {
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub length: u32,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub width: u32,
    #[serde(alias = "qty", deserialize_with = "deserialize_u32_from_number")]
    pub quantity: u32,
}

impl StockSheet {
    pub fn new(length: u32, width: u32, quantity: u32) -> Self {
        Self {
            length,
            width,
            quantity,
        }
    }

    /// Board extent as laid out: width along x, length along y.
    pub fn board_rect(&self) -> Rect {
        Rect::new(self.width, self.length)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Placement {
    /// Id of the placed [`Piece`].
    pub piece: usize,
    pub panel_index: usize,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub rotated: bool,
}

impl Placement {
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn overlaps(&self, other: &Placement) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Clear distance between two placements along the axis that separates
    /// them, or `None` when they overlap.
    pub fn gap_to(&self, other: &Placement) -> Option<u32> {
        if self.overlaps(other) {
            return None;
        }
        let horizontal = if self.right() <= other.x {
            Some(other.x - self.right())
        } else if other.right() <= self.x {
            Some(self.x - other.right())
        } else {
            None
        };
        let vertical = if self.bottom() <= other.y {
            Some(other.y - self.bottom())
        } else if other.bottom() <= self.y {
            Some(self.y - other.bottom())
        } else {
            None
        };
        match (horizontal, vertical) {
            (Some(h), Some(v)) => Some(h.max(v)),
            (Some(h), None) => Some(h),
            (None, Some(v)) => Some(v),
            (None, None) => None,
        }
    }
}

/// A stock sheet instantiated in the plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Board {
    pub index: usize,
    /// Index of the [`StockSheet`] the board was drawn from.
    pub sheet: usize,
    pub width: u32,
    pub height: u32,
    /// Ordered by shelf, then by x within the shelf.
    pub placements: Vec<Placement>,
    pub used_area: u64,
    pub waste_area: u64,
}

impl Board {
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CutOrientation {
    #[serde(rename = "H")]
    Horizontal,
    #[serde(rename = "V")]
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Cut {
    pub id: u32,
    pub orientation: CutOrientation,
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
    pub length: u32,
}

fn whole_number<E: serde::de::Error>(value: f64) -> Result<u32, E> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
        return Err(E::custom(format!(
            "expected a non-negative whole number, got {value}"
        )));
    }
    Ok(value as u32)
}

/// Accepts JSON numbers written as `3` or `3.0`; rejects fractions.
pub fn deserialize_u32_from_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    whole_number(f64::deserialize(deserializer)?)
}

pub fn deserialize_opt_u32_from_number<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<f64>::deserialize(deserializer)?
        .map(whole_number::<D::Error>)
        .transpose()
}
