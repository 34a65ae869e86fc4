//! ASCII preview of a packed board, scaled to fit a terminal.

use crate::types::{Board, Placement};

const MAX_COLS: f64 = 80.0;
const MAX_ROWS: f64 = 40.0;

struct Canvas {
    cells: Vec<Vec<char>>,
}

impl Canvas {
    fn new(cols: usize, rows: usize) -> Self {
        Self {
            cells: vec![vec![' '; cols + 1]; rows + 1],
        }
    }

    fn set(&mut self, x: usize, y: usize, edge: char) {
        let Some(cell) = self.cells.get_mut(y).and_then(|row| row.get_mut(x)) else {
            return;
        };
        *cell = match (*cell, edge) {
            ('+', _) => '+',
            ('-', '|') | ('|', '-') => '+',
            _ => edge,
        };
    }

    fn outline(&mut self, x: usize, y: usize, w: usize, h: usize) {
        for i in x..=x + w {
            self.set(i, y, '-');
            self.set(i, y + h, '-');
        }
        for j in y..=y + h {
            self.set(x, j, '|');
            self.set(x + w, j, '|');
        }
        for (cx, cy) in [(x, y), (x + w, y), (x, y + h), (x + w, y + h)] {
            self.set(cx, cy, '+');
        }
    }

    /// Centers `text` inside the box, clipped to its interior.
    fn label(&mut self, x: usize, y: usize, w: usize, h: usize, text: &str) {
        if w < 3 || h < 2 {
            return;
        }
        let cy = y + h / 2;
        let start = (x + w / 2).saturating_sub(text.chars().count() / 2);
        for (i, ch) in text.chars().enumerate() {
            let cx = start + i;
            if cx > x && cx < x + w
                && let Some(cell) = self.cells.get_mut(cy).and_then(|row| row.get_mut(cx))
            {
                *cell = ch;
            }
        }
    }

    fn finish(self) -> String {
        self.cells
            .iter()
            .map(|row| {
                let line: String = row.iter().collect();
                format!("{}\n", line.trim_end())
            })
            .collect()
    }
}

/// Draws the board outline and every placement, labelled with its size as
/// cut (`*` marks rotated pieces).
pub fn render_board(board: &Board) -> String {
    let scale = f64::min(MAX_COLS / board.width as f64, MAX_ROWS / board.height as f64);
    let px = |mm: u32| (mm as f64 * scale).round() as usize;

    let (cols, rows) = (px(board.width), px(board.height));
    if cols == 0 || rows == 0 {
        return String::new();
    }

    let mut canvas = Canvas::new(cols, rows);
    canvas.outline(0, 0, cols, rows);
    for p in &board.placements {
        let (x, y, w, h) = (px(p.x), px(p.y), px(p.width), px(p.height));
        if w == 0 || h == 0 {
            continue;
        }
        canvas.outline(x, y, w, h);
        canvas.label(x, y, w, h, &caption(p));
    }
    canvas.finish()
}

fn caption(p: &Placement) -> String {
    let mark = if p.rotated { "*" } else { "" };
    format!("{}x{}{mark}", p.width, p.height)
}
