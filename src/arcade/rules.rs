use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::state::{
    ArcadeConfig, ArcadeEvent, ArcadeState, Collectible, InputState, Obstacle, Rect, RunEndReason,
};

const COLLECT_POINTS: i32 = 10;

/// 一帧推进后的状态快照与事件。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArcadeResolution {
    pub state: ArcadeState,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<ArcadeEvent>,
}

/// 帧驱动的模拟引擎。渲染循环与键盘监听留在宿主，
/// 宿主每帧调用 [`ArcadeEngine::tick`] 并拿事件去更新页面。
#[derive(Debug)]
pub struct ArcadeEngine {
    config: ArcadeConfig,
    state: ArcadeState,
    rng: SmallRng,
}

impl ArcadeEngine {
    pub fn new(config: ArcadeConfig) -> Self {
        Self::with_rng(config, SmallRng::from_entropy())
    }

    pub fn with_seed(config: ArcadeConfig, seed: u64) -> Self {
        Self::with_rng(config, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(config: ArcadeConfig, rng: SmallRng) -> Self {
        let mut engine = Self {
            state: ArcadeState {
                player: Rect::new(0.0, 0.0, config.player_size, config.player_size),
                obstacles: Vec::new(),
                collectibles: Vec::new(),
                score: 0,
                level: 1,
                time_left: config.round_seconds,
                over: false,
            },
            config,
            rng,
        };
        engine.restart();
        engine
    }

    pub fn config(&self) -> &ArcadeConfig {
        &self.config
    }

    pub fn state(&self) -> &ArcadeState {
        &self.state
    }

    /// 恢复外部保存的进度快照。
    pub fn set_state(&mut self, state: ArcadeState) {
        self.state = state;
    }

    /// 重开一局：积分、等级、倒计时复位，实体重新生成。
    pub fn restart(&mut self) {
        self.state = ArcadeState {
            player: Rect::new(
                self.config.width / 2.0 - self.config.player_size / 2.0,
                self.config.height - 50.0,
                self.config.player_size,
                self.config.player_size,
            ),
            obstacles: Vec::new(),
            collectibles: Vec::new(),
            score: 0,
            level: 1,
            time_left: self.config.round_seconds,
            over: false,
        };
        self.spawn_obstacles();
        self.spawn_collectibles();
    }

    /// 推进一帧：移动、倒计时、碰撞。结束后的调用不再产生任何事件。
    pub fn tick(&mut self, input: &InputState, dt_ms: f64) -> Vec<ArcadeEvent> {
        let mut events = Vec::new();
        if self.state.over || dt_ms <= 0.0 {
            return events;
        }

        // 以 16ms 一帧为基准归一化，移动速度与帧率解耦
        let dt = dt_ms / 16.0;
        self.move_player(input, dt);
        self.move_obstacles(dt);

        self.state.time_left -= dt_ms / 1000.0;
        if self.state.time_left <= 0.0 {
            self.state.time_left = 0.0;
            self.end_run(RunEndReason::TimeExpired, &mut events);
            return events;
        }

        self.collect(&mut events);
        if self.hit_obstacle() {
            self.end_run(RunEndReason::ObstacleHit, &mut events);
        }
        events
    }

    pub fn resolution(&self, events: Vec<ArcadeEvent>) -> ArcadeResolution {
        ArcadeResolution {
            state: self.state.clone(),
            events,
        }
    }

    fn move_player(&mut self, input: &InputState, dt: f64) {
        let step = self.config.player_speed * dt;
        let max_x = self.config.width - self.state.player.width;
        let max_y = self.config.height - self.state.player.height;

        if input.left {
            self.state.player.x = (self.state.player.x - step).max(0.0);
        }
        if input.right {
            self.state.player.x = (self.state.player.x + step).min(max_x);
        }
        if input.up {
            self.state.player.y = (self.state.player.y - step).max(0.0);
        }
        if input.down {
            self.state.player.y = (self.state.player.y + step).min(max_y);
        }
    }

    fn move_obstacles(&mut self, dt: f64) {
        for obstacle in &mut self.state.obstacles {
            obstacle.rect.x += obstacle.dx * obstacle.speed * dt;
            obstacle.rect.y += obstacle.dy * obstacle.speed * dt;

            if obstacle.rect.x <= 0.0 || obstacle.rect.x + obstacle.rect.width >= self.config.width
            {
                obstacle.dx = -obstacle.dx;
            }
            if obstacle.rect.y <= 0.0
                || obstacle.rect.y + obstacle.rect.height >= self.config.height
            {
                obstacle.dy = -obstacle.dy;
            }
        }
    }

    fn collect(&mut self, events: &mut Vec<ArcadeEvent>) {
        let player = self.state.player;
        let mut index = self.state.collectibles.len();
        while index > 0 {
            index -= 1;
            if player.overlaps(&self.state.collectibles[index].rect) {
                self.state.collectibles.remove(index);
                self.state.score += COLLECT_POINTS;
                events.push(ArcadeEvent::CollectibleCollected {
                    score: self.state.score,
                });

                if self.state.collectibles.is_empty() {
                    self.level_up(events);
                }
            }
        }
    }

    fn hit_obstacle(&self) -> bool {
        self.state
            .obstacles
            .iter()
            .any(|obstacle| self.state.player.overlaps(&obstacle.rect))
    }

    fn level_up(&mut self, events: &mut Vec<ArcadeEvent>) {
        self.state.level += 1;
        self.spawn_obstacles();
        self.spawn_collectibles();
        events.push(ArcadeEvent::LevelAdvanced {
            level: self.state.level,
        });
    }

    fn end_run(&mut self, reason: RunEndReason, events: &mut Vec<ArcadeEvent>) {
        self.state.over = true;
        events.push(ArcadeEvent::RunEnded {
            score: self.state.score,
            reason,
        });
    }

    fn spawn_obstacles(&mut self) {
        self.state.obstacles.clear();
        let count =
            self.config.base_obstacle_count + self.config.obstacles_per_level * self.state.level;
        for _ in 0..count {
            let width = 30.0 + self.rng.gen::<f64>() * 50.0;
            let height = 30.0 + self.rng.gen::<f64>() * 50.0;
            let x = self.rng.gen::<f64>() * (self.config.width - width);
            let y = self.rng.gen::<f64>() * (self.config.height - height);
            let speed = 1.0 + self.rng.gen::<f64>() * self.state.level as f64;
            let angle = self.rng.gen::<f64>() * std::f64::consts::TAU;

            self.state.obstacles.push(Obstacle {
                rect: Rect::new(x, y, width, height),
                speed,
                dx: angle.cos(),
                dy: angle.sin(),
            });
        }
    }

    fn spawn_collectibles(&mut self) {
        self.state.collectibles.clear();
        let size = self.config.collectible_size;
        for _ in 0..self.config.collectible_count {
            let x = self.rng.gen::<f64>() * (self.config.width - size);
            let y = self.rng.gen::<f64>() * (self.config.height - size);
            self.state.collectibles.push(Collectible {
                rect: Rect::new(x, y, size, size),
            });
        }
    }
}
