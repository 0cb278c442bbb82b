//! Board state for the toroidal territory game: piece placement, the
//! coverage counters both move generation and spawning key off, and
//! reversible move application for the search.

pub mod zobrist;

use serde::Serialize;
use std::fmt;

pub const ROWS: u8 = 12;
pub const COLS: u8 = 12;
pub const NUM_CELLS: usize = ROWS as usize * COLS as usize;

// Cell indices travel in u8 move fields.
const _: () = assert!(NUM_CELLS < 256);

/// Scale applied to the material differential so search scores have
/// headroom between piece values.
pub const PIECE_SCORE: i32 = 100;

/// Contents of one cell. `Blue` pieces belong to neither player; they
/// block movement and wait to be converted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Cell {
    Empty,
    Green,
    Purple,
    Blue,
}

impl Cell {
    pub fn owner(self) -> Option<Player> {
        match self {
            Cell::Green => Some(Player::Green),
            Cell::Purple => Some(Player::Purple),
            Cell::Empty | Cell::Blue => None,
        }
    }

    fn glyph(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::Green => 'G',
            Cell::Purple => 'P',
            Cell::Blue => 'B',
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Player {
    Green,
    Purple,
}

impl Player {
    pub fn opponent(self) -> Player {
        match self {
            Player::Green => Player::Purple,
            Player::Purple => Player::Green,
        }
    }

    pub fn cell(self) -> Cell {
        match self {
            Player::Green => Cell::Green,
            Player::Purple => Cell::Purple,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Index of the cell at (`row`, `col`).
pub fn cell_index(row: u8, col: u8) -> u8 {
    debug_assert!(row < ROWS && col < COLS);
    row * COLS + col
}

/// The four toroidal neighbors of `idx`, always in [north, south, east,
/// west] order. Capture flag bit `i` refers to position `i` here.
pub fn neighbors(idx: u8) -> [u8; 4] {
    let i = idx as usize;
    let cols = COLS as usize;
    let north = (i + NUM_CELLS - cols) % NUM_CELLS;
    let south = (i + cols) % NUM_CELLS;
    let east = if (i + 1) % cols == 0 { i + 1 - cols } else { i + 1 };
    let west = if i % cols == 0 { i + cols - 1 } else { i - 1 };
    [north as u8, south as u8, east as u8, west as u8]
}

fn cell_indices() -> std::ops::Range<u8> {
    0..NUM_CELLS as u8
}

/// A piece relocation. Bit `i` of `captures` marks that neighbor `i` of
/// `to` held a Blue piece when the move was generated; committing the
/// move converts exactly those pieces to the mover's color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Move {
    pub from: u8,
    pub to: u8,
    pub captures: u8,
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let coord = |idx: u8| ((idx % COLS + b'A') as char, idx / COLS + 1);
        let (fc, fr) = coord(self.from);
        let (tc, tr) = coord(self.to);
        write!(f, "{fc}{fr}-{tc}{tr}")
    }
}

/// Full game state. Everything the search reads per node is maintained
/// incrementally: per-player coverage of every cell, per-player piece
/// counts, the side to move, and the Zobrist hash.
#[derive(Clone, PartialEq, Eq)]
pub struct Board {
    cells: [Cell; NUM_CELLS],
    cover: [[u8; NUM_CELLS]; 2],
    counts: [u8; 2],
    turn: Player,
    hash: u64,
}

impl Board {
    /// Empty board, Green to move.
    pub fn new() -> Self {
        Board {
            cells: [Cell::Empty; NUM_CELLS],
            cover: [[0; NUM_CELLS]; 2],
            counts: [0; 2],
            turn: Player::Green,
            hash: 0,
        }
    }

    pub fn cell(&self, idx: u8) -> Cell {
        self.cells[idx as usize]
    }

    /// Number of `player` pieces adjacent to `idx`.
    pub fn coverage(&self, player: Player, idx: u8) -> u8 {
        self.cover[player.index()][idx as usize]
    }

    pub fn piece_count(&self, player: Player) -> u8 {
        self.counts[player.index()]
    }

    pub fn turn(&self) -> Player {
        self.turn
    }

    pub fn set_turn(&mut self, player: Player) {
        if player != self.turn {
            self.hash ^= zobrist::side_key();
            self.turn = player;
        }
    }

    /// Position hash including the side to move. Used for transposition
    /// lookups, where collisions are tolerated.
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Material differential from the mover's viewpoint, scaled by
    /// [`PIECE_SCORE`]. Constant-time; the counts are kept current by
    /// every placement and removal.
    pub fn heuristic(&self) -> i32 {
        let diff = i32::from(self.counts[Player::Green.index()])
            - i32::from(self.counts[Player::Purple.index()]);
        match self.turn {
            Player::Green => diff * PIECE_SCORE,
            Player::Purple => -diff * PIECE_SCORE,
        }
    }

    /// Put `cell` on an empty square, updating coverage, counts, and hash.
    pub fn place(&mut self, idx: u8, cell: Cell) {
        debug_assert!(self.cells[idx as usize] == Cell::Empty, "place on occupied cell");
        debug_assert!(cell != Cell::Empty, "place of Empty");
        self.cells[idx as usize] = cell;
        self.hash ^= zobrist::piece_key(cell, idx);
        if let Some(owner) = cell.owner() {
            for n in neighbors(idx) {
                self.cover[owner.index()][n as usize] += 1;
            }
            self.counts[owner.index()] += 1;
        }
    }

    /// Exact inverse of [`Board::place`].
    pub fn remove(&mut self, idx: u8) {
        let cell = self.cells[idx as usize];
        debug_assert!(cell != Cell::Empty, "remove from empty cell");
        self.cells[idx as usize] = Cell::Empty;
        self.hash ^= zobrist::piece_key(cell, idx);
        if let Some(owner) = cell.owner() {
            for n in neighbors(idx) {
                self.cover[owner.index()][n as usize] -= 1;
            }
            self.counts[owner.index()] -= 1;
        }
    }

    /// Apply `mv` for the side to move: relocate the piece, convert the
    /// Blue pieces named by `mv.captures`, and pass the turn.
    pub fn commit(&mut self, mv: Move) {
        let mover = self.turn;
        debug_assert!(self.cells[mv.from as usize] == mover.cell(), "commit from foreign cell");
        debug_assert!(self.cells[mv.to as usize] == Cell::Empty, "commit onto occupied cell");
        self.remove(mv.from);
        self.place(mv.to, mover.cell());
        for (bit, n) in neighbors(mv.to).into_iter().enumerate() {
            if mv.captures & (1 << bit) != 0 {
                debug_assert!(self.cells[n as usize] == Cell::Blue, "capture flag on non-Blue cell");
                self.remove(n);
                self.place(n, mover.cell());
            }
        }
        self.set_turn(mover.opponent());
    }

    /// Reverse the most recent [`Board::commit`] of exactly `mv`.
    pub fn uncommit(&mut self, mv: Move) {
        let mover = self.turn.opponent();
        debug_assert!(self.cells[mv.to as usize] == mover.cell(), "uncommit of uncommitted move");
        debug_assert!(self.cells[mv.from as usize] == Cell::Empty, "uncommit onto occupied source");
        for (bit, n) in neighbors(mv.to).into_iter().enumerate() {
            if mv.captures & (1 << bit) != 0 {
                debug_assert!(self.cells[n as usize] == mover.cell());
                self.remove(n);
                self.place(n, Cell::Blue);
            }
        }
        self.remove(mv.to);
        self.place(mv.from, mover.cell());
        self.set_turn(mover);
    }

    fn capture_flags(&self, to: u8) -> u8 {
        let mut flags = 0u8;
        for (bit, n) in neighbors(to).into_iter().enumerate() {
            if self.cells[n as usize] == Cell::Blue {
                flags |= 1 << bit;
            }
        }
        flags
    }

    /// All moves for the side to move: every empty cell the mover covers
    /// is a target for every mover piece, except that a piece may not move
    /// to a cell it is the sole cover of. Targets enumerate in ascending
    /// cell order and sources ascending within each target, which is what
    /// breaks ties after the solver's stable sort.
    pub fn legal_moves(&self) -> impl Iterator<Item = Move> + '_ {
        let mover = self.turn;
        let own = mover.cell();
        cell_indices()
            .filter(move |&to| self.cells[to as usize] == Cell::Empty && self.coverage(mover, to) > 0)
            .flat_map(move |to| {
                let lone_support = self.coverage(mover, to) == 1;
                let captures = self.capture_flags(to);
                cell_indices()
                    .filter(move |&from| self.cells[from as usize] == own)
                    .filter(move |&from| !(lone_support && neighbors(to).contains(&from)))
                    .map(move |from| Move { from, to, captures })
            })
    }

    /// Cells where a Blue piece may appear: empty and covered by neither
    /// player.
    pub fn possible_spawns(&self) -> impl Iterator<Item = u8> + '_ {
        cell_indices().filter(move |&idx| {
            self.cells[idx as usize] == Cell::Empty
                && self.cover[0][idx as usize] == 0
                && self.cover[1][idx as usize] == 0
        })
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = COLS as usize;
        writeln!(f, "{:^width$}|{:^width$}|{:^width$}", "Board", "Green", "Purple")?;
        for row in 0..ROWS {
            for col in 0..COLS {
                write!(f, "{}", self.cells[cell_index(row, col) as usize].glyph())?;
            }
            write!(f, "|")?;
            for col in 0..COLS {
                write!(f, "{}", self.cover[0][cell_index(row, col) as usize])?;
            }
            write!(f, "|")?;
            for col in 0..COLS {
                write!(f, "{}", self.cover[1][cell_index(row, col) as usize])?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\n{self}")
    }
}
