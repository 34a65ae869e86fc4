use crate::types::{Board, Piece, Placement, Rect};

/// A horizontal strip of a board. Its height is fixed by the piece that
/// opened it; pieces fill it left to right from `cursor`.
#[derive(Debug, Clone)]
pub struct Shelf {
    pub y: u32,
    pub height: u32,
    pub cursor: u32,
    pub placements: Vec<Placement>,
}

#[derive(Debug, Clone)]
pub struct ShelfBoard {
    sheet: usize,
    size: Rect,
    kerf: u32,
    next_y: u32,
    pub shelves: Vec<Shelf>,
}

/// Where a piece can go on a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Shelf { index: usize, rotated: bool },
    NewShelf { rotated: bool },
}

impl ShelfBoard {
    pub fn new(sheet: usize, size: Rect, kerf: u32) -> Self {
        Self {
            sheet,
            size,
            kerf,
            next_y: 0,
            shelves: Vec::new(),
        }
    }

    pub fn used_area(&self) -> u64 {
        self.shelves
            .iter()
            .flat_map(|s| &s.placements)
            .map(|p| p.area())
            .sum()
    }

    /// First existing shelf that takes the piece (orientations tried in the
    /// given order per shelf), else a new shelf below the lowest one.
    pub fn find_slot(&self, piece: Rect, rotations: &[bool]) -> Option<Slot> {
        for (index, shelf) in self.shelves.iter().enumerate() {
            for &rotated in rotations {
                if self.fits_shelf(shelf, piece.oriented(rotated)) {
                    return Some(Slot::Shelf { index, rotated });
                }
            }
        }

        rotations
            .iter()
            .copied()
            .find(|&rotated| self.fits_new_shelf(piece.oriented(rotated)))
            .map(|rotated| Slot::NewShelf { rotated })
    }

    fn fits_shelf(&self, shelf: &Shelf, placed: Rect) -> bool {
        placed.h <= shelf.height && shelf.cursor as u64 + placed.w as u64 <= self.size.w as u64
    }

    fn fits_new_shelf(&self, placed: Rect) -> bool {
        placed.w <= self.size.w && self.next_y as u64 + placed.h as u64 <= self.size.h as u64
    }

    pub fn place(&mut self, slot: Slot, piece: &Piece) -> Placement {
        let (index, rotated) = match slot {
            Slot::Shelf { index, rotated } => (index, rotated),
            Slot::NewShelf { rotated } => {
                let height = piece.rect().oriented(rotated).h;
                self.shelves.push(Shelf {
                    y: self.next_y,
                    height,
                    cursor: 0,
                    placements: Vec::new(),
                });
                // Trailing kerf below the shelf.
                self.next_y = self.next_y.saturating_add(height).saturating_add(self.kerf);
                (self.shelves.len() - 1, rotated)
            }
        };

        let placed = piece.rect().oriented(rotated);
        let kerf = self.kerf;
        let shelf = &mut self.shelves[index];
        let placement = Placement {
            piece: piece.id,
            panel_index: piece.panel_index,
            x: shelf.cursor,
            y: shelf.y,
            width: placed.w,
            height: placed.h,
            rotated,
        };
        // Trailing kerf to the right of the piece.
        shelf.cursor = shelf.cursor.saturating_add(placed.w).saturating_add(kerf);
        shelf.placements.push(placement);
        placement
    }

    pub fn into_board(self, index: usize) -> Board {
        let used_area = self.used_area();
        let area = self.size.area();
        let placements: Vec<Placement> = self
            .shelves
            .into_iter()
            .flat_map(|s| s.placements)
            .collect();
        Board {
            index,
            sheet: self.sheet,
            width: self.size.w,
            height: self.size.h,
            placements,
            used_area,
            waste_area: area - used_area,
        }
    }
}
