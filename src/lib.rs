pub mod ai;
pub mod arcade;
pub mod auth;
pub mod stats;
pub mod store;
pub mod tictactoe;
pub mod utils;

use std::str::FromStr;

use gloo_timers::future::TimeoutFuture;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::Promise;

pub use ai::{best_move, BotPolicy, Difficulty};
pub use arcade::{
    ArcadeConfig, ArcadeEngine, ArcadeEvent, ArcadeResolution, ArcadeState, Collectible,
    InputState, Obstacle, Rect, RunEndReason,
};
pub use auth::{login, register, AuthError, LoginRequest, RegisterRequest};
pub use stats::{
    game_high_scores, outcome_tally, summarize, user_summary, GameSummary, HighScoreRow,
    OutcomeTally, DEFAULT_LEADERBOARD_LIMIT,
};
pub use store::{
    AttemptRecord, KeyValueStore, MemoryStore, NewUser, ScoreBook, ScoreEntry, ScoreTable,
    SessionUser, StoreError, UserDirectory, UserRecord,
};
pub use tictactoe::{
    Board, CellIndex, GameOutcome, Mark, MatchError, MatchEvent, MatchPhase, MatchResolution,
    MatchState, CELL_COUNT, WIN_LINES,
};
pub use utils::{now_ms, LocalStore};

/// 成绩簿里井字棋沿用的游戏标识。
const TICTACTOE_GAME_ID: &str = "Tic-Tac-Toe";
/// 成绩簿里障碍躲避游戏沿用的游戏标识。
const ARCADE_GAME_ID: &str = "game1";

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    set_panic_hook();
}

fn to_js_error<E: Serialize>(error: &E) -> JsValue {
    to_value(error).unwrap_or_else(|serialize_err| JsValue::from_str(&serialize_err.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn open_directory() -> Result<UserDirectory<LocalStore>, JsValue> {
    UserDirectory::new(LocalStore::new().map_err(|error| to_js_error(&error))?)
        .map_err(|error| to_js_error(&error))
}

fn open_score_book() -> Result<ScoreBook<LocalStore>, JsValue> {
    ScoreBook::new(LocalStore::new().map_err(|error| to_js_error(&error))?)
        .map_err(|error| to_js_error(&error))
}

// 成绩写入对游戏流程是 fire-and-forget 的，失败只上报控制台
fn warn_record_failure(error: &StoreError) {
    web_sys::console::warn_1(&format!("score record failed: {error:?}").into());
}

/// 门户入口：账号、会话与统计。页面持有一个实例即可。
#[wasm_bindgen]
pub struct Portal {
    users: UserDirectory<LocalStore>,
    scores: ScoreBook<LocalStore>,
}

#[wasm_bindgen]
impl Portal {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<Portal, JsValue> {
        Ok(Portal {
            users: open_directory()?,
            scores: open_score_book()?,
        })
    }

    pub fn register_json(&mut self, request_json: &str) -> Result<String, JsValue> {
        let request: RegisterRequest =
            serde_json::from_str(request_json).map_err(serde_to_js_error)?;
        let record = auth::register(&mut self.users, request, now_ms())
            .map_err(|error| to_js_error(&error))?;
        serde_json::to_string(&record).map_err(serde_to_js_error)
    }

    pub fn login_json(&mut self, request_json: &str) -> Result<String, JsValue> {
        let request: LoginRequest = serde_json::from_str(request_json).map_err(serde_to_js_error)?;
        let session = auth::login(&mut self.users, &request, now_ms())
            .map_err(|error| to_js_error(&error))?;
        serde_json::to_string(&session).map_err(serde_to_js_error)
    }

    pub fn logout(&mut self) {
        self.users.logout();
    }

    pub fn is_logged_in(&self) -> bool {
        self.users.is_logged_in()
    }

    /// 当前会话用户；未登录时为 null。
    pub fn current_user(&self) -> Result<JsValue, JsValue> {
        let session = self
            .users
            .current_user()
            .map_err(|error| to_js_error(&error))?;
        to_value(&session).map_err(JsValue::from)
    }

    /// 给当前用户手动补记一条成绩（游戏引擎终局时会自动写入）。
    pub fn record_score(&mut self, game_id: &str, score: i32) -> Result<(), JsValue> {
        let Some(session) = self
            .users
            .current_user()
            .map_err(|error| to_js_error(&error))?
        else {
            return Err(JsValue::from_str("no user logged in"));
        };
        self.scores
            .record(session.user.id, game_id, score, None, now_ms())
            .map_err(|error| to_js_error(&error))
    }

    /// 当前用户按游戏聚合的摘要；未登录时为 null。
    pub fn user_stats(&self) -> Result<JsValue, JsValue> {
        let Some(session) = self
            .users
            .current_user()
            .map_err(|error| to_js_error(&error))?
        else {
            return Ok(JsValue::NULL);
        };
        let scores = self
            .scores
            .user_scores(session.user.id)
            .map_err(|error| to_js_error(&error))?;
        to_value(&stats::user_summary(&scores)).map_err(JsValue::from)
    }

    /// 指定游戏的全员排行榜，默认前 10。
    pub fn high_scores(&self, game_id: &str, limit: Option<u32>) -> Result<JsValue, JsValue> {
        let table = self
            .scores
            .all_scores()
            .map_err(|error| to_js_error(&error))?;
        let rows = stats::game_high_scores(
            &table,
            game_id,
            limit.map_or(stats::DEFAULT_LEADERBOARD_LIMIT, |value| value as usize),
        );
        to_value(&rows).map_err(JsValue::from)
    }

    /// 当前用户在指定游戏上的胜负平计数；未登录时为 null。
    pub fn outcome_tally(&self, game_id: &str) -> Result<JsValue, JsValue> {
        let Some(session) = self
            .users
            .current_user()
            .map_err(|error| to_js_error(&error))?
        else {
            return Ok(JsValue::NULL);
        };
        let scores = self
            .scores
            .user_scores(session.user.id)
            .map_err(|error| to_js_error(&error))?;
        let tally = scores
            .get(game_id)
            .map(|entries| stats::outcome_tally(entries))
            .unwrap_or_default();
        to_value(&tally).map_err(JsValue::from)
    }
}

/// 井字棋会话。人类执 X 先手，机器人执 O。
#[wasm_bindgen]
pub struct TicTacToe {
    session: MatchState,
    policy: BotPolicy,
    users: UserDirectory<LocalStore>,
    scores: ScoreBook<LocalStore>,
}

#[wasm_bindgen]
impl TicTacToe {
    #[wasm_bindgen(constructor)]
    pub fn new(difficulty: Option<String>) -> Result<TicTacToe, JsValue> {
        let difficulty = difficulty
            .as_deref()
            .and_then(|value| Difficulty::from_str(value).ok())
            .unwrap_or_default();
        Ok(TicTacToe {
            session: MatchState::new(difficulty),
            policy: BotPolicy::new(difficulty),
            users: open_directory()?,
            scores: open_score_book()?,
        })
    }

    pub fn set_difficulty(&mut self, difficulty: &str) -> Result<(), JsValue> {
        let parsed = Difficulty::from_str(difficulty)
            .map_err(|_| JsValue::from_str("unknown difficulty"))?;
        self.session.difficulty = parsed;
        self.policy.set_difficulty(parsed);
        Ok(())
    }

    /// 人类落子；返回 {board, phase, events} 的 JSON。
    pub fn play(&mut self, cell: u8) -> Result<String, JsValue> {
        let resolution = self
            .session
            .play_human(cell as usize)
            .map_err(|error| to_js_error(&error))?;
        self.record_outcome(&resolution.events);
        serde_json::to_string(&resolution).map_err(serde_to_js_error)
    }

    /// 机器人按当前难度落子。
    pub fn bot_move(&mut self) -> Result<String, JsValue> {
        let resolution = self
            .session
            .play_bot(&mut self.policy)
            .map_err(|error| to_js_error(&error))?;
        self.record_outcome(&resolution.events);
        serde_json::to_string(&resolution).map_err(serde_to_js_error)
    }

    /// 延迟后计算机器人的落子（不落盘），模拟“思考中”的停顿。
    pub fn think_bot(&self, delay_ms: Option<u32>) -> Promise {
        let mut board = self.session.board.clone();
        let bot = self.session.bot_mark;
        let human = self.session.human_mark;
        let difficulty = self.session.difficulty;
        let delay = delay_ms.unwrap_or(500);

        future_to_promise(async move {
            if delay > 0 {
                TimeoutFuture::new(delay).await;
            }
            let mut policy = BotPolicy::new(difficulty);
            let choice = policy.choose(&mut board, bot, human);
            to_value(&choice).map_err(JsValue::from)
        })
    }

    pub fn reset(&mut self) -> Result<String, JsValue> {
        self.session.reset();
        self.state_json()
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.session.snapshot()).map_err(serde_to_js_error)
    }

    pub fn set_state_json(&mut self, json: &str) -> Result<(), JsValue> {
        self.session = serde_json::from_str(json).map_err(serde_to_js_error)?;
        Ok(())
    }

    fn record_outcome(&mut self, events: &[MatchEvent]) {
        for event in events {
            if let MatchEvent::MatchEnded {
                outcome_code,
                difficulty,
                ..
            } = event
            {
                match self.users.current_user() {
                    Ok(Some(session)) => {
                        if let Err(error) = self.scores.record(
                            session.user.id,
                            TICTACTOE_GAME_ID,
                            *outcome_code,
                            Some(*difficulty),
                            now_ms(),
                        ) {
                            warn_record_failure(&error);
                        }
                    }
                    Ok(None) => {}
                    Err(error) => warn_record_failure(&error),
                }
            }
        }
    }
}

/// 障碍躲避游戏。宿主把键盘事件与帧回调接进来，渲染用返回的快照。
#[wasm_bindgen]
pub struct Arcade {
    engine: ArcadeEngine,
    input: InputState,
    users: UserDirectory<LocalStore>,
    scores: ScoreBook<LocalStore>,
}

#[wasm_bindgen]
impl Arcade {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<Arcade, JsValue> {
        let config = match config_json {
            Some(json) => serde_json::from_str(&json).map_err(serde_to_js_error)?,
            None => ArcadeConfig::default(),
        };
        Ok(Arcade {
            engine: ArcadeEngine::new(config),
            input: InputState::default(),
            users: open_directory()?,
            scores: open_score_book()?,
        })
    }

    /// 键盘事件映射（方向键 / WASD）；返回按键是否被识别。
    pub fn key_event(&mut self, key: &str, pressed: bool) -> bool {
        self.input.set_key(key, pressed)
    }

    /// 推进一帧；返回 {state, events} 的 JSON。
    pub fn tick(&mut self, dt_ms: f64) -> Result<String, JsValue> {
        let events = self.engine.tick(&self.input, dt_ms);
        self.record_outcome(&events);
        let resolution = self.engine.resolution(events);
        serde_json::to_string(&resolution).map_err(serde_to_js_error)
    }

    pub fn restart(&mut self) -> Result<String, JsValue> {
        self.engine.restart();
        self.input = InputState::default();
        self.state_json()
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.engine.state()).map_err(serde_to_js_error)
    }

    pub fn set_state_json(&mut self, json: &str) -> Result<(), JsValue> {
        let state: ArcadeState = serde_json::from_str(json).map_err(serde_to_js_error)?;
        self.engine.set_state(state);
        Ok(())
    }

    fn record_outcome(&mut self, events: &[ArcadeEvent]) {
        for event in events {
            if let ArcadeEvent::RunEnded { score, .. } = event {
                match self.users.current_user() {
                    Ok(Some(session)) => {
                        if let Err(error) = self.scores.record(
                            session.user.id,
                            ARCADE_GAME_ID,
                            *score,
                            None,
                            now_ms(),
                        ) {
                            warn_record_failure(&error);
                        }
                    }
                    Ok(None) => {}
                    Err(error) => warn_record_failure(&error),
                }
            }
        }
    }
}

/// 纯函数出口：对给定棋盘即时判定结果。
#[wasm_bindgen(js_name = "evaluateBoard")]
pub fn evaluate_board(board: JsValue) -> Result<JsValue, JsValue> {
    let board: Board = from_value(board).map_err(JsValue::from)?;
    to_value(&board.outcome()).map_err(JsValue::from)
}

/// 纯函数出口：对给定棋盘做一次完整搜索，返回最优格子或 null。
#[wasm_bindgen(js_name = "bestMove")]
pub fn best_move_for(
    board: JsValue,
    bot_mark: JsValue,
    human_mark: JsValue,
) -> Result<JsValue, JsValue> {
    let mut board: Board = from_value(board).map_err(JsValue::from)?;
    let bot: Mark = from_value(bot_mark).map_err(JsValue::from)?;
    let human: Mark = from_value(human_mark).map_err(JsValue::from)?;
    to_value(&best_move(&mut board, bot, human)).map_err(JsValue::from)
}

#[cfg(feature = "console_error_panic_hook")]
fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
fn set_panic_hook() {}
