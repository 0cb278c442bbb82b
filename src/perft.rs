// Move-tree walk using commit/uncommit (no cloning). Spawn events are
// not part of the tree; this counts decision nodes only.
pub fn perft(board: &mut crate::board::Board, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let mut nodes = 0u64;
    let moves: Vec<crate::board::Move> = board.legal_moves().collect();
    for mv in moves {
        board.commit(mv);
        nodes += perft(board, depth - 1);
        board.uncommit(mv);
    }
    nodes
}
