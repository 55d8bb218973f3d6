//! 障碍躲避小游戏的帧驱动模拟（移动、碰撞、关卡、倒计时）。

pub mod rules;
pub mod state;

pub use rules::{ArcadeEngine, ArcadeResolution};
pub use state::{
    ArcadeConfig, ArcadeEvent, ArcadeState, Collectible, InputState, Obstacle, Rect, RunEndReason,
};
