use std::str::FromStr;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::tictactoe::{Board, CellIndex, GameOutcome, Mark, CELL_COUNT};

/// 机器人难度档位。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl FromStr for Difficulty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" | "normal" => Ok(Difficulty::Medium),
            "hard" | "expert" => Ok(Difficulty::Hard),
            _ => Err(()),
        }
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Medium
    }
}

/// 穷举极小极大搜索，返回最优落子；终局棋盘返回 None。
///
/// 搜索过程在传入的棋盘上落子再撤销，任何返回路径都会完整还原，
/// 调用结束后棋盘与传入时逐位相同。同分时取下标最小的格子，保证可复现。
pub fn best_move(board: &mut Board, bot: Mark, human: Mark) -> Option<CellIndex> {
    if board.outcome().is_terminal() {
        return None;
    }

    let mut best: Option<(i32, CellIndex)> = None;
    for cell in 0..CELL_COUNT {
        if board.is_vacant(cell) {
            board.place(cell, bot);
            let score = minimax(board, bot, human, false);
            board.clear(cell);

            if best.map_or(true, |(top, _)| score > top) {
                best = Some((score, cell));
            }
        }
    }

    best.map(|(_, cell)| cell)
}

// 胜 +1、负 -1、平 0，不按深度折减。
fn minimax(board: &mut Board, bot: Mark, human: Mark, maximizing: bool) -> i32 {
    match board.outcome() {
        GameOutcome::Win { mark } => {
            if mark == bot {
                1
            } else {
                -1
            }
        }
        GameOutcome::Tie => 0,
        GameOutcome::InProgress => {
            if maximizing {
                let mut value = i32::MIN;
                for cell in 0..CELL_COUNT {
                    if board.is_vacant(cell) {
                        board.place(cell, bot);
                        value = value.max(minimax(board, bot, human, false));
                        board.clear(cell);
                    }
                }
                value
            } else {
                let mut value = i32::MAX;
                for cell in 0..CELL_COUNT {
                    if board.is_vacant(cell) {
                        board.place(cell, human);
                        value = value.min(minimax(board, bot, human, true));
                        board.clear(cell);
                    }
                }
                value
            }
        }
    }
}

/// 按难度决定机器人落子来源。
pub struct BotPolicy {
    difficulty: Difficulty,
    rng: SmallRng,
}

impl BotPolicy {
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            rng: SmallRng::from_entropy(),
        }
    }

    pub fn with_seed(difficulty: Difficulty, seed: u64) -> Self {
        Self {
            difficulty,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
    }

    pub fn choose(&mut self, board: &mut Board, bot: Mark, human: Mark) -> Option<CellIndex> {
        if board.outcome().is_terminal() {
            return None;
        }
        match self.difficulty {
            Difficulty::Easy => self.random_move(board),
            Difficulty::Hard => best_move(board, bot, human),
            // 每一步单独掷硬币，同一局内强弱可以波动
            Difficulty::Medium => {
                if self.rng.gen::<f64>() < 0.5 {
                    best_move(board, bot, human)
                } else {
                    self.random_move(board)
                }
            }
        }
    }

    fn random_move(&mut self, board: &Board) -> Option<CellIndex> {
        board.vacant_cells().choose(&mut self.rng).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const X: Option<Mark> = Some(Mark::X);
    const O: Option<Mark> = Some(Mark::O);
    const E: Option<Mark> = None;

    #[test]
    fn takes_an_immediate_win() {
        let mut board = Board::from_cells([O, O, E, X, X, E, E, E, E]);
        assert_eq!(best_move(&mut board, Mark::O, Mark::X), Some(2));
    }

    #[test]
    fn blocks_an_opponent_threat() {
        let mut board = Board::from_cells([X, X, E, E, O, E, E, E, E]);
        assert_eq!(best_move(&mut board, Mark::O, Mark::X), Some(2));
    }

    #[test]
    fn empty_board_yields_a_move() {
        let mut board = Board::new();
        let choice = best_move(&mut board, Mark::O, Mark::X);
        assert!(choice.is_some(), "non-terminal board must yield a cell");
    }

    #[test]
    fn terminal_board_yields_none() {
        let mut won = Board::from_cells([X, X, X, O, O, E, E, E, E]);
        assert_eq!(best_move(&mut won, Mark::O, Mark::X), None);

        let mut tied = Board::from_cells([X, O, X, O, X, O, O, X, O]);
        assert_eq!(best_move(&mut tied, Mark::X, Mark::O), None);
    }

    #[test]
    fn search_leaves_the_board_untouched() {
        let mut board = Board::from_cells([X, E, E, E, O, E, E, E, E]);
        let before = board.clone();
        let _ = best_move(&mut board, Mark::O, Mark::X);
        assert_eq!(board, before, "search must restore every hypothetical move");
    }

    #[test]
    fn optimal_self_play_always_ties() {
        let mut board = Board::new();
        let mut mark = Mark::X;
        while board.outcome() == GameOutcome::InProgress {
            let cell = best_move(&mut board, mark, mark.opponent())
                .expect("in-progress board must yield a move");
            board.place(cell, mark);
            mark = mark.opponent();
        }
        assert_eq!(board.outcome(), GameOutcome::Tie);
    }

    #[test]
    fn optimal_reply_to_center_opening_reaches_tie_in_nine_moves() {
        let mut board = Board::new();
        board.place(4, Mark::X);
        let mut moves = 1;
        let mut mark = Mark::O;
        while board.outcome() == GameOutcome::InProgress {
            let cell = best_move(&mut board, mark, mark.opponent())
                .expect("in-progress board must yield a move");
            board.place(cell, mark);
            moves += 1;
            mark = mark.opponent();
        }
        assert_eq!(board.outcome(), GameOutcome::Tie);
        assert_eq!(moves, 9);
    }

    #[test]
    fn tie_break_is_deterministic() {
        let mut board = Board::from_cells([X, O, E, E, E, E, E, E, E]);
        let first = best_move(&mut board, Mark::X, Mark::O);
        let second = best_move(&mut board, Mark::X, Mark::O);
        assert_eq!(first, second, "equal scores must resolve to the same cell");
    }

    #[test]
    fn easy_policy_picks_a_vacant_cell() {
        let mut policy = BotPolicy::with_seed(Difficulty::Easy, 7);
        let mut board = Board::from_cells([X, O, X, E, E, E, E, E, E]);
        let cell = policy
            .choose(&mut board, Mark::O, Mark::X)
            .expect("vacant cells available");
        assert!(board.is_vacant(cell));
    }

    #[test]
    fn hard_policy_matches_full_search() {
        let mut board = Board::from_cells([X, X, E, E, O, E, E, E, E]);
        let mut policy = BotPolicy::with_seed(Difficulty::Hard, 99);
        assert_eq!(policy.choose(&mut board, Mark::O, Mark::X), Some(2));
    }

    #[test]
    fn medium_policy_mixes_sources_across_moves() {
        let mut saw_optimal = false;
        let mut saw_random = false;
        for seed in 0..32 {
            let mut board = Board::from_cells([X, X, E, E, O, E, E, E, E]);
            let mut policy = BotPolicy::with_seed(Difficulty::Medium, seed);
            match policy.choose(&mut board, Mark::O, Mark::X) {
                Some(2) => saw_optimal = true,
                Some(_) => saw_random = true,
                None => unreachable!("board is not terminal"),
            }
        }
        assert!(
            saw_optimal && saw_random,
            "medium must mix optimal and random picks per move"
        );
    }

    #[test]
    fn policy_on_terminal_board_yields_none() {
        let mut board = Board::from_cells([X, X, X, O, O, E, E, E, E]);
        let mut policy = BotPolicy::with_seed(Difficulty::Easy, 3);
        assert_eq!(policy.choose(&mut board, Mark::O, Mark::X), None);
    }

    #[test]
    fn difficulty_parses_known_aliases() {
        assert_eq!(Difficulty::from_str("Easy"), Ok(Difficulty::Easy));
        assert_eq!(Difficulty::from_str("NORMAL"), Ok(Difficulty::Medium));
        assert_eq!(Difficulty::from_str("hard"), Ok(Difficulty::Hard));
        assert_eq!(Difficulty::from_str("expert"), Ok(Difficulty::Hard));
        assert!(Difficulty::from_str("impossible").is_err());
    }
}
