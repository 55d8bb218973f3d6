use serde::{Deserialize, Serialize};

/// 轴对齐包围盒；玩家、障碍物与道具共用。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// 严格相交判定；仅边缘相接不算碰撞。
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }
}

/// 场地与玩法参数。宽高由宿主按页面实际区域传入，其余默认值保持原始手感。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArcadeConfig {
    pub width: f64,
    pub height: f64,
    #[serde(default = "default_player_size")]
    pub player_size: f64,
    #[serde(default = "default_player_speed")]
    pub player_speed: f64,
    #[serde(default = "default_round_seconds")]
    pub round_seconds: f64,
    #[serde(default = "default_collectible_size")]
    pub collectible_size: f64,
    #[serde(default = "default_collectible_count")]
    pub collectible_count: u32,
    #[serde(default = "default_base_obstacle_count")]
    pub base_obstacle_count: u32,
    #[serde(default = "default_obstacles_per_level")]
    pub obstacles_per_level: u32,
}

fn default_player_size() -> f64 {
    30.0
}

fn default_player_speed() -> f64 {
    5.0
}

fn default_round_seconds() -> f64 {
    60.0
}

fn default_collectible_size() -> f64 {
    20.0
}

fn default_collectible_count() -> u32 {
    5
}

fn default_base_obstacle_count() -> u32 {
    3
}

fn default_obstacles_per_level() -> u32 {
    2
}

impl ArcadeConfig {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }
}

impl Default for ArcadeConfig {
    fn default() -> Self {
        Self {
            width: 640.0,
            height: 480.0,
            player_size: default_player_size(),
            player_speed: default_player_speed(),
            round_seconds: default_round_seconds(),
            collectible_size: default_collectible_size(),
            collectible_count: default_collectible_count(),
            base_obstacle_count: default_base_obstacle_count(),
            obstacles_per_level: default_obstacles_per_level(),
        }
    }
}

/// 在场地内弹跳的障碍物。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Obstacle {
    pub rect: Rect,
    pub speed: f64,
    pub dx: f64,
    pub dy: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Collectible {
    pub rect: Rect,
}

/// 方向键按压状态；宿主把键盘事件映射进来。
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InputState {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl InputState {
    /// 返回该按键是否被识别（方向键或 WASD）。
    pub fn set_key(&mut self, key: &str, pressed: bool) -> bool {
        match key {
            "ArrowLeft" | "a" => self.left = pressed,
            "ArrowRight" | "d" => self.right = pressed,
            "ArrowUp" | "w" => self.up = pressed,
            "ArrowDown" | "s" => self.down = pressed,
            _ => return false,
        }
        true
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum RunEndReason {
    ObstacleHit,
    TimeExpired,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ArcadeEvent {
    CollectibleCollected { score: i32 },
    LevelAdvanced { level: u32 },
    /// 每局恰好发出一次。
    RunEnded { score: i32, reason: RunEndReason },
}

/// 一局障碍躲避游戏的完整状态快照。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArcadeState {
    pub player: Rect,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub obstacles: Vec<Obstacle>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub collectibles: Vec<Collectible>,
    pub score: i32,
    pub level: u32,
    pub time_left: f64,
    pub over: bool,
}
