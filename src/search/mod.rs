pub mod solver;
pub mod tt;

pub use solver::{ScoredMove, Solver, SPAWN_SAMPLES};
pub use tt::{Bound, Entry, TransTable};

/// Window bound strictly above any reachable score.
pub const INF: i32 = 30_000;

/// Score of a decision node whose side to move has no legal move: a
/// defined loss for the mover. The game driver declares the opponent
/// winner in the same situation.
pub const NO_MOVE_SCORE: i32 = -20_000;
