use serde::{Deserialize, Serialize};

use crate::ai::{BotPolicy, Difficulty};

use super::state::{Board, CellIndex, GameOutcome, Mark, MatchPhase};

/// 被拒绝的落子请求：格子已占用、轮次不对或对局已结束。
/// 拒绝不改动任何状态。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum MatchError {
    IllegalMove {
        #[serde(skip_serializing_if = "Option::is_none")]
        cell: Option<CellIndex>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum MatchEvent {
    MoveApplied {
        cell: CellIndex,
        mark: Mark,
    },
    /// 终局通知，每局恰好发出一次。
    MatchEnded {
        outcome: GameOutcome,
        /// +1 人类胜、-1 机器人胜、0 平局，供成绩记录使用。
        outcome_code: i32,
        difficulty: Difficulty,
        #[serde(skip_serializing_if = "Option::is_none")]
        winning_line: Option<[CellIndex; 3]>,
    },
}

/// 一次成功操作后的棋盘快照与事件，交给渲染层。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResolution {
    pub board: Board,
    pub phase: MatchPhase,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<MatchEvent>,
}

/// 单场对局的全部状态。由外层持有并传递，没有任何模块级全局。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchState {
    pub board: Board,
    pub human_mark: Mark,
    pub bot_mark: Mark,
    pub difficulty: Difficulty,
    pub phase: MatchPhase,
    #[serde(default)]
    outcome_emitted: bool,
}

impl MatchState {
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            board: Board::new(),
            human_mark: Mark::X,
            bot_mark: Mark::O,
            difficulty,
            phase: MatchPhase::HumanTurn,
            outcome_emitted: false,
        }
    }

    /// 清空棋盘回到人类先手；终局发送标记一并复位。
    pub fn reset(&mut self) {
        self.board = Board::new();
        self.phase = MatchPhase::HumanTurn;
        self.outcome_emitted = false;
    }

    pub fn play_human(&mut self, cell: CellIndex) -> Result<MatchResolution, MatchError> {
        if self.phase != MatchPhase::HumanTurn || !self.board.is_vacant(cell) {
            return Err(MatchError::IllegalMove { cell: Some(cell) });
        }
        Ok(self.apply(cell, self.human_mark, MatchPhase::BotTurn))
    }

    pub fn play_bot(&mut self, policy: &mut BotPolicy) -> Result<MatchResolution, MatchError> {
        if self.phase != MatchPhase::BotTurn {
            return Err(MatchError::IllegalMove { cell: None });
        }
        // 状态机不变式：轮到机器人时棋盘必然未终局
        debug_assert_eq!(self.board.outcome(), GameOutcome::InProgress);
        let cell = policy
            .choose(&mut self.board, self.bot_mark, self.human_mark)
            .ok_or(MatchError::IllegalMove { cell: None })?;
        Ok(self.apply(cell, self.bot_mark, MatchPhase::HumanTurn))
    }

    fn apply(&mut self, cell: CellIndex, mark: Mark, next: MatchPhase) -> MatchResolution {
        self.board.place(cell, mark);
        let mut events = vec![MatchEvent::MoveApplied { cell, mark }];

        let outcome = self.board.outcome();
        if outcome.is_terminal() {
            self.phase = MatchPhase::Finished { outcome };
            if !self.outcome_emitted {
                self.outcome_emitted = true;
                events.push(MatchEvent::MatchEnded {
                    outcome,
                    outcome_code: self.outcome_code(outcome),
                    difficulty: self.difficulty,
                    winning_line: self.board.winning_line(),
                });
            }
        } else {
            self.phase = next;
        }

        self.resolution(events)
    }

    fn outcome_code(&self, outcome: GameOutcome) -> i32 {
        match outcome {
            GameOutcome::Win { mark } => {
                if mark == self.human_mark {
                    1
                } else {
                    -1
                }
            }
            _ => 0,
        }
    }

    pub fn resolution(&self, events: Vec<MatchEvent>) -> MatchResolution {
        MatchResolution {
            board: self.board.clone(),
            phase: self.phase.clone(),
            events,
        }
    }

    pub fn snapshot(&self) -> MatchResolution {
        self.resolution(Vec::new())
    }
}
