use anyhow::Result;
use clap::Parser;
use log::{debug, info};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::time::Instant;
use torbot::board::{Board, Cell, Player, COLS, NUM_CELLS};
use torbot::search::solver::{ScoredMove, Solver};

/// Piece count that wins the game outright.
const WIN_COUNT: u8 = 48;

#[derive(Parser, Debug)]
#[command(author, version, about = "Engine-vs-engine driver for the torbot game", long_about = None)]
struct Args {
    /// Search depth for both sides
    #[arg(long, default_value_t = 1)]
    depth: u32,

    /// RNG seed; omitted means a fresh random game
    #[arg(long)]
    seed: Option<u64>,

    /// Give up after this many turns
    #[arg(long, default_value_t = 200)]
    max_turns: u32,

    /// Evaluate root moves in parallel
    #[arg(long)]
    parallel: bool,

    /// Emit one JSON line of ranked moves per turn
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct TurnRecord<'a> {
    turn: u32,
    player: Player,
    ranked: &'a [ScoredMove],
}

fn coord(idx: u8) -> String {
    format!("{}{}", (idx % COLS + b'A') as char, idx / COLS + 1)
}

/// Two pieces per player on random empty cells.
fn random_setup(rng: &mut SmallRng) -> Board {
    let mut board = Board::new();
    for cell in [Cell::Green, Cell::Green, Cell::Purple, Cell::Purple] {
        loop {
            let idx = rng.gen_range(0..NUM_CELLS as u8);
            if board.cell(idx) == Cell::Empty {
                board.place(idx, cell);
                break;
            }
        }
    }
    board
}

/// One die roll per turn; on a one, a Blue piece lands on a random
/// uncontested cell.
fn maybe_spawn_blue(board: &mut Board, rng: &mut SmallRng) {
    if rng.gen_range(1..=6) != 1 {
        return;
    }
    let sites: Vec<u8> = board.possible_spawns().collect();
    if let Some(&idx) = sites.choose(rng) {
        board.place(idx, Cell::Blue);
        info!("blue spawn at {}", coord(idx));
    }
}

fn winner_by_count(board: &Board) -> Option<Player> {
    [Player::Green, Player::Purple]
        .into_iter()
        .find(|&p| board.piece_count(p) >= WIN_COUNT)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let seed = args.seed.unwrap_or_else(rand::random);
    info!("game seed {seed}");
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut board = random_setup(&mut rng);
    println!("{board}");

    let start = Instant::now();
    let mut winner = None;
    let mut turns_played = 0;
    for turn in 1..=args.max_turns {
        if let Some(p) = winner_by_count(&board) {
            winner = Some(p);
            break;
        }
        let mover = board.turn();
        if board.legal_moves().next().is_none() {
            info!("{mover:?} has no move");
            winner = Some(mover.opponent());
            break;
        }

        let mut solver = Solver::seeded(board.clone(), seed.wrapping_add(u64::from(turn)));
        let ranked = if args.parallel {
            solver.solve_parallel(mover, args.depth)
        } else {
            solver.solve(mover, args.depth)
        };
        let best = ranked[0];
        if args.json {
            println!(
                "{}",
                serde_json::to_string(&TurnRecord { turn, player: mover, ranked: &ranked })?
            );
        }
        info!(
            "turn {turn}: {mover:?} plays {} (score {}, {} nodes)",
            best.mv,
            best.score,
            solver.nodes()
        );
        board.commit(best.mv);
        maybe_spawn_blue(&mut board, &mut rng);
        debug!("{board:?}");
        turns_played = turn;
    }

    println!("{board}");
    match winner {
        Some(p) => println!("{p:?} wins after {turns_played} turns"),
        None => println!("no winner within {} turns", args.max_turns),
    }
    info!("{:.2}s elapsed", start.elapsed().as_secs_f32());
    Ok(())
}
