//! 井字棋核心逻辑（棋盘模型、结果判定、回合状态机）。

pub mod rules;
pub mod state;

pub use rules::{MatchError, MatchEvent, MatchResolution, MatchState};
pub use state::{Board, CellIndex, GameOutcome, Mark, MatchPhase, CELL_COUNT, WIN_LINES};
