use crate::error::{OptimizeError, Result};
use crate::types::{PanelRequest, Piece};

pub const MAX_PANEL_DIMENSION_MM: u32 = 5000;
pub const MAX_PANEL_QUANTITY: u32 = 500;

/// Expands panel requests into unit pieces, ordered by (panel, instance).
///
/// `max_pieces` caps the total before anything is allocated.
pub fn expand(panels: &[PanelRequest], max_pieces: usize) -> Result<Vec<Piece>> {
    if panels.is_empty() {
        return Err(OptimizeError::validation(
            "panels",
            "at least one panel is required",
        ));
    }

    for (idx, panel) in panels.iter().enumerate() {
        validate_panel(idx, panel)?;
    }

    let total: u64 = panels.iter().map(|p| p.quantity as u64).sum();
    if total > max_pieces as u64 {
        return Err(OptimizeError::RequestTooLarge {
            reason: format!("{total} pieces requested, limit is {max_pieces}"),
        });
    }

    let mut pieces = Vec::with_capacity(total as usize);
    for (panel_index, panel) in panels.iter().enumerate() {
        let label = panel.display_label(panel_index);
        for instance in 0..panel.quantity {
            pieces.push(Piece {
                id: pieces.len(),
                panel_index,
                instance,
                label: label.clone(),
                width: panel.width,
                length: panel.length,
                edging: panel.edging,
                alignment: panel.alignment,
            });
        }
    }
    Ok(pieces)
}

fn validate_panel(idx: usize, panel: &PanelRequest) -> Result<()> {
    let field = |name: &str| format!("panels[{idx}].{name}");
    for (name, value) in [("width", panel.width), ("length", panel.length)] {
        if value == 0 {
            return Err(OptimizeError::validation(field(name), "must be positive"));
        }
        if value > MAX_PANEL_DIMENSION_MM {
            return Err(OptimizeError::validation(
                field(name),
                format!("{value} mm exceeds the maximum of {MAX_PANEL_DIMENSION_MM} mm"),
            ));
        }
    }
    if panel.quantity == 0 {
        return Err(OptimizeError::validation(
            field("quantity"),
            "must be at least 1",
        ));
    }
    if panel.quantity > MAX_PANEL_QUANTITY {
        return Err(OptimizeError::validation(
            field("quantity"),
            format!(
                "{} exceeds the maximum of {MAX_PANEL_QUANTITY} per panel",
                panel.quantity
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::Edging;

    #[test]
    fn test_expands_in_request_order() {
        let panels = vec![
            PanelRequest::new(400, 600, 2).with_label("Side"),
            PanelRequest::new(300, 300, 1).with_edging(Edging::all()),
        ];
        let pieces = expand(&panels, 100).unwrap();
        let keys: Vec<(usize, usize, u32)> = pieces
            .iter()
            .map(|p| (p.id, p.panel_index, p.instance))
            .collect();
        assert_eq!(keys, vec![(0, 0, 0), (1, 0, 1), (2, 1, 0)]);
        assert_eq!(pieces[0].label, "Side");
        assert_eq!(pieces[2].label, "Panel 2");
        assert_eq!(pieces[2].edging, Edging::all());
    }

    #[test]
    fn test_rejects_zero_dimension() {
        let err = expand(&[PanelRequest::new(0, 600, 1)], 100).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
        assert!(err.to_string().contains("panels[0].width"), "{err}");
    }

    #[test]
    fn test_rejects_zero_quantity() {
        let err = expand(&[PanelRequest::new(100, 600, 0)], 100).unwrap_err();
        assert!(err.to_string().contains("quantity"), "{err}");
    }

    #[test]
    fn test_rejects_excessive_quantity() {
        let err = expand(&[PanelRequest::new(100, 600, 501)], 10_000).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
    }

    #[test]
    fn test_rejects_oversized_dimension() {
        assert!(expand(&[PanelRequest::new(5001, 600, 1)], 100).is_err());
    }

    #[test]
    fn test_piece_cap() {
        let panels = vec![PanelRequest::new(100, 100, 300), PanelRequest::new(100, 100, 300)];
        let err = expand(&panels, 500).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RequestTooLarge);
    }

    #[test]
    fn test_empty_request() {
        assert!(expand(&[], 100).is_err());
    }
}
