//! AI 算法模块（极小极大搜索、难度策略）。

pub mod minimax;

pub use minimax::{best_move, BotPolicy, Difficulty};
