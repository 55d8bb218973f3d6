use serde::{Deserialize, Serialize};

/// 棋盘格子数量（3×3）。
pub const CELL_COUNT: usize = 9;

/// 棋盘格子下标，按行从左到右 0..9。
pub type CellIndex = usize;

/// 八条取胜连线：3 行、3 列、2 条对角线。
pub const WIN_LINES: [[CellIndex; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// 棋手记号。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub fn opponent(self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

/// 对局结果；始终由棋盘即时推导，不跨落子缓存。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameOutcome {
    InProgress,
    Win { mark: Mark },
    Tie,
}

impl GameOutcome {
    pub fn is_terminal(self) -> bool {
        !matches!(self, GameOutcome::InProgress)
    }
}

/// 3×3 棋盘，序列化为 9 元素数组（null / "X" / "O"）。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Board {
    cells: [Option<Mark>; CELL_COUNT],
}

impl Board {
    pub fn new() -> Self {
        Self {
            cells: [None; CELL_COUNT],
        }
    }

    pub fn from_cells(cells: [Option<Mark>; CELL_COUNT]) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[Option<Mark>; CELL_COUNT] {
        &self.cells
    }

    pub fn mark_at(&self, cell: CellIndex) -> Option<Mark> {
        self.cells.get(cell).copied().flatten()
    }

    pub fn is_vacant(&self, cell: CellIndex) -> bool {
        cell < CELL_COUNT && self.cells[cell].is_none()
    }

    pub fn place(&mut self, cell: CellIndex, mark: Mark) {
        self.cells[cell] = Some(mark);
    }

    pub fn clear(&mut self, cell: CellIndex) {
        self.cells[cell] = None;
    }

    pub fn vacant_cells(&self) -> Vec<CellIndex> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_none())
            .map(|(index, _)| index)
            .collect()
    }

    pub fn move_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|cell| cell.is_some())
    }

    /// 结果判定：先扫连线，满盘无连线为平局，否则仍在进行。
    pub fn outcome(&self) -> GameOutcome {
        for [a, b, c] in WIN_LINES {
            if let Some(mark) = self.cells[a] {
                if self.cells[b] == Some(mark) && self.cells[c] == Some(mark) {
                    return GameOutcome::Win { mark };
                }
            }
        }
        if self.is_full() {
            GameOutcome::Tie
        } else {
            GameOutcome::InProgress
        }
    }

    /// 取胜连线的格子下标，供渲染层高亮；无胜者时为 None。
    pub fn winning_line(&self) -> Option<[CellIndex; 3]> {
        WIN_LINES.into_iter().find(|&[a, b, c]| {
            self.cells[a].is_some() && self.cells[a] == self.cells[b] && self.cells[a] == self.cells[c]
        })
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

/// 对局进行阶段。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum MatchPhase {
    HumanTurn,
    BotTurn,
    Finished { outcome: GameOutcome },
}

impl Default for MatchPhase {
    fn default() -> Self {
        MatchPhase::HumanTurn
    }
}
