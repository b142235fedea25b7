//! Bot move selection: unbeatable minimax and uniformly random play.

use super::rules::{is_draw, legal_moves, winner};
use super::types::{Board, Player};
use rand::Rng;
use tracing::instrument;

/// Scores a position for the bot via full-depth minimax with alpha-beta
/// pruning.
///
/// Terminal scores are depth-scaled: a bot win is `10 - depth` (faster
/// wins score higher), a loss is `depth - 10` (slower losses score
/// higher), a draw is `0`. The pruning cuts branches where
/// `beta <= alpha` and never changes the move chosen at the top level.
fn minimax(
    board: &mut Board,
    depth: i32,
    maximizing: bool,
    bot: Player,
    mut alpha: i32,
    mut beta: i32,
) -> i32 {
    let opponent = bot.opponent();

    match winner(board) {
        Some(mark) if mark == bot => return 10 - depth,
        Some(_) => return depth - 10,
        None => {}
    }
    if is_draw(board) {
        return 0;
    }

    if maximizing {
        let mut best = i32::MIN;
        for pos in legal_moves(board) {
            board.set(pos, bot);
            let score = minimax(board, depth + 1, false, bot, alpha, beta);
            board.clear(pos);
            best = best.max(score);
            alpha = alpha.max(score);
            if beta <= alpha {
                break;
            }
        }
        best
    } else {
        let mut best = i32::MAX;
        for pos in legal_moves(board) {
            board.set(pos, opponent);
            let score = minimax(board, depth + 1, true, bot, alpha, beta);
            board.clear(pos);
            best = best.min(score);
            beta = beta.min(score);
            if beta <= alpha {
                break;
            }
        }
        best
    }
}

/// Returns the optimal position for `bot` on the given board.
///
/// Ties between equally scored moves break toward the lowest index, which
/// makes the choice deterministic. Only defined for boards with at least
/// one empty cell; callers validate that before asking for a move.
#[instrument(skip(board))]
pub fn best_move(board: &Board, bot: Player) -> usize {
    let moves = legal_moves(board);
    debug_assert!(!moves.is_empty(), "best_move requires a legal move");

    let mut scratch = board.clone();
    let mut best_score = i32::MIN;
    let mut best_pos = moves[0];

    for pos in moves {
        scratch.set(pos, bot);
        let score = minimax(&mut scratch, 0, false, bot, i32::MIN, i32::MAX);
        scratch.clear(pos);

        if score > best_score {
            best_score = score;
            best_pos = pos;
        }
    }

    best_pos
}

/// Returns a uniformly random legal position using the given generator.
pub fn random_move_with<R: Rng>(board: &Board, rng: &mut R) -> usize {
    let moves = legal_moves(board);
    debug_assert!(!moves.is_empty(), "random_move requires a legal move");
    moves[rng.gen_range(0..moves.len())]
}

/// Returns a uniformly random legal position.
#[instrument(skip(board))]
pub fn random_move(board: &Board) -> usize {
    random_move_with(board, &mut rand::thread_rng())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn board_from(marks: [i8; 9]) -> Board {
        let mut board = Board::new();
        for (pos, mark) in marks.into_iter().enumerate() {
            match mark {
                1 => board.set(pos, Player::X),
                -1 => board.set(pos, Player::O),
                _ => {}
            }
        }
        board
    }

    #[test]
    fn test_takes_immediate_win() {
        // O can complete the top row at 2.
        let board = board_from([-1, -1, 0, 1, 1, 0, 0, 0, 0]);
        assert_eq!(best_move(&board, Player::O), 2);
    }

    #[test]
    fn test_blocks_opponent_win() {
        // X threatens 0,1,2; O must block at 2.
        let board = board_from([1, 1, 0, 0, -1, 0, 0, 0, 0]);
        assert_eq!(best_move(&board, Player::O), 2);
    }

    #[test]
    fn test_prefers_win_over_block() {
        // Both sides have a two-in-a-row; taking the win beats blocking.
        let board = board_from([1, 1, 0, -1, -1, 0, 0, 0, 0]);
        assert_eq!(best_move(&board, Player::O), 5);
    }

    #[test]
    fn test_random_move_stays_legal() {
        let board = board_from([1, -1, 1, 0, -1, 0, 1, 0, 0]);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let pos = random_move_with(&board, &mut rng);
            assert!(board.is_empty(pos), "illegal random move at {pos}");
        }
    }
}
