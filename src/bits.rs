use crate::game::{MAX_SIZE, Position};

/// One bit per grid cell, one `u64` word per row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitboard {
    rows: [u64; MAX_SIZE],
}

impl Bitboard {
    pub fn new() -> Self {
        Self {
            rows: [0; MAX_SIZE],
        }
    }

    pub fn get(&self, pos: Position) -> bool {
        let (x, y) = pos;
        assert!((x as usize) < MAX_SIZE && (y as usize) < MAX_SIZE, "position out of bounds");
        (self.rows[y as usize] & (1u64 << x)) != 0
    }

    pub fn set(&mut self, pos: Position) {
        let (x, y) = pos;
        assert!((x as usize) < MAX_SIZE && (y as usize) < MAX_SIZE, "position out of bounds");
        self.rows[y as usize] |= 1u64 << x;
    }

    /// Set the bit, returning true if it was previously clear.
    pub fn insert(&mut self, pos: Position) -> bool {
        let fresh = !self.get(pos);
        self.set(pos);
        fresh
    }

    pub fn len(&self) -> usize {
        self.rows.iter().map(|row| row.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|&row| row == 0)
    }
}
