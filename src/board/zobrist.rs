use super::{Board, Cell, Player, NUM_CELLS};
use std::sync::OnceLock;

// One key per occupant kind per cell: Green, Purple, Blue.
const KINDS: usize = 3;

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

static TABLE: OnceLock<[u64; KINDS * NUM_CELLS]> = OnceLock::new();
static SIDE_KEY: OnceLock<u64> = OnceLock::new();

fn init_table() -> &'static [u64; KINDS * NUM_CELLS] {
    TABLE.get_or_init(|| {
        let mut t = [0u64; KINDS * NUM_CELLS];
        let mut seed = 0xF00D_F00D_DEAD_BEEF;
        for v in &mut t {
            seed = splitmix64(seed);
            *v = seed;
        }
        t
    })
}

/// Key for an occupant sitting on `idx`. `cell` must not be `Empty`.
pub(super) fn piece_key(cell: Cell, idx: u8) -> u64 {
    debug_assert!(cell != Cell::Empty);
    let kind = cell as usize - 1;
    init_table()[kind * NUM_CELLS + idx as usize]
}

/// Key XORed into the hash while Purple is to move.
pub(super) fn side_key() -> u64 {
    *SIDE_KEY.get_or_init(|| splitmix64(0xABCDEF1234567890))
}

/// Hash of `board` computed from scratch. The board maintains the same
/// value incrementally; this is the reference for cross-checks.
pub fn compute(board: &Board) -> u64 {
    let mut key = 0u64;
    for idx in 0..NUM_CELLS as u8 {
        let cell = board.cell(idx);
        if cell != Cell::Empty {
            key ^= piece_key(cell, idx);
        }
    }
    if board.turn() == Player::Purple {
        key ^= side_key();
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_distinct_across_kinds_and_cells() {
        assert_ne!(piece_key(Cell::Green, 0), piece_key(Cell::Purple, 0));
        assert_ne!(piece_key(Cell::Purple, 0), piece_key(Cell::Blue, 0));
        assert_ne!(piece_key(Cell::Green, 0), piece_key(Cell::Green, 1));
        assert_ne!(side_key(), 0);
    }
}
