use std::fmt;
use std::hash::{Hash, Hasher};

/// Integer grid coordinate. No bounds are implied; callers validate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cell {
    pub row: i32,
    pub col: i32,
}

impl Cell {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    pub fn hash_code(&self) -> i32 {
        self.row.wrapping_mul(65536).wrapping_add(self.col)
    }

    /// Dense row-major index for a `side x side` grid, or `None` outside it.
    pub fn index_in(&self, side: u32) -> Option<usize> {
        let side = side as i32;
        if self.row < 0 || self.col < 0 || self.row >= side || self.col >= side {
            return None;
        }
        Some((self.row * side + self.col) as usize)
    }
}

impl Hash for Cell {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_i32(self.hash_code());
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.row, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn equality_and_hash_follow_row_and_col() {
        let a = Cell::new(3, 7);
        let b = Cell::new(3, 7);
        assert_eq!(a, b);
        assert_eq!(a.hash_code(), 3 * 65536 + 7);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
        assert!(!set.contains(&Cell::new(7, 3)));
    }

    #[test]
    fn displays_as_row_comma_col() {
        assert_eq!(Cell::new(2, 5).to_string(), "2,5");
    }

    #[test]
    fn index_in_rejects_out_of_range() {
        assert_eq!(Cell::new(1, 1).index_in(2), Some(3));
        assert_eq!(Cell::new(-1, 0).index_in(2), None);
        assert_eq!(Cell::new(0, 2).index_in(2), None);
    }
}
