use crate::board::{Board, Cell, Move, Player};
use crate::search::tt::{Bound, Entry, TransTable, DEFAULT_ENTRIES};
use crate::search::{INF, NO_MOVE_SCORE};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Reverse;

/// Cap on spawn sites examined per chance node. With more candidates
/// than this, a partial shuffle picks which ones get searched.
pub const SPAWN_SAMPLES: usize = 10;

/// A root move with its search score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ScoredMove {
    pub mv: Move,
    pub score: i32,
}

/// Alpha-beta searcher for one position. Between the decision layers sits
/// a chance layer that folds in the possible appearance of a Blue piece,
/// so scores are expectations, not pure minimax values.
pub struct Solver {
    board: Board,
    table: TransTable,
    rng: SmallRng,
    seed: u64,
    nodes: u64,
}

impl Solver {
    /// Solver with an entropy-drawn seed and the default table size.
    pub fn new(board: Board) -> Self {
        Self::seeded(board, rand::random())
    }

    /// Deterministic solver: the same `seed` on the same position always
    /// produces the same ranking.
    pub fn seeded(board: Board, seed: u64) -> Self {
        Self::with_table_entries(board, DEFAULT_ENTRIES, seed)
    }

    pub fn with_table_entries(board: Board, entries: usize, seed: u64) -> Self {
        Solver {
            board,
            table: TransTable::new(entries),
            rng: SmallRng::seed_from_u64(seed),
            seed,
            nodes: 0,
        }
    }

    /// The position being searched. After a solve this is back in the
    /// state handed in, with the turn set to the solved player.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Decision nodes visited by the last solve.
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    pub fn probe_table(&self, key: u64) -> Option<Entry> {
        self.table.probe(key)
    }

    pub fn table_occupied(&self) -> usize {
        self.table.occupied()
    }

    /// Every legal move for `player`, scored at `depth` and sorted by
    /// descending score. The sort is stable, so equal scores keep move
    /// generation order. Returns an empty ranking when `player` has no
    /// move; callers decide the game before asking for one.
    pub fn solve(&mut self, player: Player, depth: u32) -> Vec<ScoredMove> {
        self.board.set_turn(player);
        self.nodes = 0;
        let moves: Vec<Move> = self.board.legal_moves().collect();
        let mut ranked = Vec::with_capacity(moves.len());
        for mv in moves {
            let score = self.with_move(mv, |s| -s.chance(depth, -INF, INF));
            ranked.push(ScoredMove { mv, score });
        }
        ranked.sort_by_key(|r| Reverse(r.score));
        ranked
    }

    /// [`Solver::solve`] with the root moves evaluated in parallel. Each
    /// move gets its own board clone, its own table, and a seed derived
    /// from this solver's, so the ranking for a fixed seed does not
    /// depend on scheduling.
    pub fn solve_parallel(&mut self, player: Player, depth: u32) -> Vec<ScoredMove> {
        self.board.set_turn(player);
        let moves: Vec<Move> = self.board.legal_moves().collect();
        let entries = self.table.capacity();
        let base_seed = self.seed;
        let board = &self.board;
        let results: Vec<(ScoredMove, u64)> = moves
            .par_iter()
            .enumerate()
            .map(|(i, &mv)| {
                let worker_seed = base_seed.wrapping_add(1 + i as u64);
                let mut worker = Solver::with_table_entries(board.clone(), entries, worker_seed);
                let score = worker.with_move(mv, |s| -s.chance(depth, -INF, INF));
                (ScoredMove { mv, score }, worker.nodes)
            })
            .collect();
        self.nodes = results.iter().map(|(_, n)| n).sum();
        let mut ranked: Vec<ScoredMove> = results.into_iter().map(|(r, _)| r).collect();
        ranked.sort_by_key(|r| Reverse(r.score));
        ranked
    }

    /// Run `f` with `mv` committed, then uncommit it. Keeps every search
    /// path from leaving the board dirty.
    fn with_move<R>(&mut self, mv: Move, f: impl FnOnce(&mut Self) -> R) -> R {
        self.board.commit(mv);
        let result = f(self);
        self.board.uncommit(mv);
        result
    }

    /// Run `f` with a Blue piece on `idx`, then remove it again.
    fn with_spawn<R>(&mut self, idx: u8, f: impl FnOnce(&mut Self) -> R) -> R {
        self.board.place(idx, Cell::Blue);
        let result = f(self);
        self.board.remove(idx);
        result
    }

    /// Cut an oversized candidate list down to [`SPAWN_SAMPLES`] sites
    /// chosen uniformly at random. `partial_shuffle` gathers its sample
    /// at the tail of the slice; the unshuffled head is what gets
    /// dropped.
    fn sample_sites(&mut self, sites: &mut Vec<u8>) {
        if sites.len() <= SPAWN_SAMPLES {
            return;
        }
        let rest = sites.len() - SPAWN_SAMPLES;
        sites.partial_shuffle(&mut self.rng, SPAWN_SAMPLES);
        sites.drain(..rest);
    }

    /// Chance layer: the evaluation with no spawn carries five sixths of
    /// the weight, the last sixth is an average over at most
    /// [`SPAWN_SAMPLES`] candidate sites. Sampled results depend on the
    /// RNG, so nothing from this layer is ever cached.
    fn chance(&mut self, depth: u32, alpha: i32, beta: i32) -> i32 {
        let no_spawn = self.search(depth, alpha, beta);

        let mut sites: Vec<u8> = self.board.possible_spawns().collect();
        if sites.is_empty() {
            return no_spawn;
        }
        self.sample_sites(&mut sites);

        let count = sites.len() as i32;
        let mut total = 0i32;
        for idx in sites {
            total += self.with_spawn(idx, |s| s.search(depth, alpha, beta));
        }
        spawn_mix(no_spawn, total, count)
    }

    /// Decision layer: table probe, then the static heuristic at depth
    /// zero or the alpha-beta move loop above it.
    fn search(&mut self, depth: u32, mut alpha: i32, beta: i32) -> i32 {
        self.nodes += 1;
        let key = self.board.hash();
        if let Some(entry) = self.table.probe(key) {
            if entry.depth >= depth {
                match entry.bound {
                    Bound::Exact => return entry.score,
                    Bound::Lower if entry.score >= beta => return entry.score,
                    Bound::Upper if entry.score <= alpha => return entry.score,
                    _ => {}
                }
            }
        }

        if depth == 0 {
            let score = self.board.heuristic();
            self.table.store(key, 0, score, Bound::Exact);
            return score;
        }

        let moves: Vec<Move> = self.board.legal_moves().collect();
        if moves.is_empty() {
            // Stuck mover loses outright.
            self.table.store(key, depth, NO_MOVE_SCORE, Bound::Exact);
            return NO_MOVE_SCORE;
        }

        let orig_alpha = alpha;
        let mut best = i32::MIN;
        for mv in moves {
            let score = self.with_move(mv, |s| -s.chance(depth - 1, -beta, -alpha));
            best = best.max(score);
            if best >= beta {
                break;
            }
            alpha = alpha.max(best);
        }

        let bound = if best <= orig_alpha {
            Bound::Upper
        } else if best >= beta {
            Bound::Lower
        } else {
            Bound::Exact
        };
        self.table.store(key, depth, best, bound);
        best
    }
}

/// One-in-six spawn odds: five parts no-spawn continuation, one part the
/// sampled spawn continuations averaged over `samples`. Both divisions
/// truncate toward zero.
fn spawn_mix(no_spawn: i32, spawn_total: i32, samples: i32) -> i32 {
    (5 * no_spawn + spawn_total / samples) / 6
}

#[cfg(test)]
mod tests {
    use super::{spawn_mix, Solver, SPAWN_SAMPLES};
    use crate::board::Board;

    #[test]
    fn mix_weights_no_spawn_five_to_one() {
        assert_eq!(spawn_mix(600, 0, 1), 500);
        assert_eq!(spawn_mix(0, 600, 1), 100);
        assert_eq!(spawn_mix(0, 1800, 3), 100);
        assert_eq!(spawn_mix(300, 300, 1), 300);
    }

    #[test]
    fn mix_truncates_toward_zero_not_negative_infinity() {
        // -100 / 6 would floor to -17; truncation gives -16.
        assert_eq!(spawn_mix(0, -100, 1), -16);
        assert_eq!(spawn_mix(-1, -5, 1), -1);
        assert_eq!(spawn_mix(1, 5, 1), 1);
        assert_eq!(spawn_mix(-100, 0, 1), -83);
    }

    #[test]
    fn sample_average_truncates_toward_zero() {
        // -25 / 4 is -6 under truncation, -7 under flooring.
        assert_eq!(spawn_mix(0, -25, 4), -1);
        assert_eq!(spawn_mix(-6, -25, 4), -6);
        assert_eq!(spawn_mix(0, 25, 4), 1);
    }

    #[test]
    fn oversized_candidate_lists_get_a_random_subset() {
        let candidates: Vec<u8> = (0..100).collect();
        let mut prefix_hits = 0;
        for seed in 0..200 {
            let mut solver = Solver::seeded(Board::new(), seed);
            let mut sites = candidates.clone();
            solver.sample_sites(&mut sites);
            assert_eq!(sites.len(), SPAWN_SAMPLES);
            let mut sorted = sites.clone();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(sorted.len(), SPAWN_SAMPLES, "sampled sites must be distinct");
            assert!(
                sorted.iter().all(|&s| s < 100),
                "sampled sites must come from the candidates"
            );
            prefix_hits += sites.iter().filter(|&&s| s < SPAWN_SAMPLES as u8).count();
        }
        // A uniform 10-of-100 draw overlaps the ten lowest indices once
        // per trial on average; a front-biased sample overlaps nearly
        // all ten.
        assert!(
            prefix_hits < 600,
            "low-index sites over-sampled: {prefix_hits} prefix hits in 200 draws"
        );
    }

    #[test]
    fn sampling_depends_on_the_seed() {
        let candidates: Vec<u8> = (0..120).collect();
        let mut first = candidates.clone();
        let mut second = candidates.clone();
        Solver::seeded(Board::new(), 11).sample_sites(&mut first);
        Solver::seeded(Board::new(), 12).sample_sites(&mut second);
        first.sort_unstable();
        second.sort_unstable();
        assert_ne!(first, second, "two seeds should draw different sites");
    }

    #[test]
    fn small_candidate_lists_are_kept_whole() {
        let mut sites: Vec<u8> = (0..SPAWN_SAMPLES as u8).collect();
        Solver::seeded(Board::new(), 5).sample_sites(&mut sites);
        assert_eq!(sites, (0..SPAWN_SAMPLES as u8).collect::<Vec<u8>>());
    }
}
