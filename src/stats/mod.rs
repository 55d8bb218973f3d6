//! 成绩统计聚合：单人摘要、全员排行、井字棋胜负平。
//! 全部是对内存数据的同步计算，不做缓存。

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::store::{ScoreEntry, ScoreTable};

pub const DEFAULT_LEADERBOARD_LIMIT: usize = 10;

/// 单个游戏的汇总数据。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameSummary {
    pub games_played: usize,
    pub high_score: i32,
    pub average_score: f64,
    pub last_played_ms: f64,
}

/// 排行榜行。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HighScoreRow {
    pub user_id: String,
    pub score: i32,
    pub timestamp_ms: f64,
}

/// 井字棋胜负平计数（按胜负码符号归类）。
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutcomeTally {
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
}

pub fn summarize(entries: &[ScoreEntry]) -> Option<GameSummary> {
    if entries.is_empty() {
        return None;
    }
    let games_played = entries.len();
    let high_score = entries.iter().map(|entry| entry.score).max().unwrap_or(0);
    let total: i64 = entries.iter().map(|entry| i64::from(entry.score)).sum();
    let last_played_ms = entries
        .last()
        .map(|entry| entry.timestamp_ms)
        .unwrap_or_default();

    Some(GameSummary {
        games_played,
        high_score,
        average_score: total as f64 / games_played as f64,
        last_played_ms,
    })
}

/// 一名用户所有游戏的摘要；没有记录的游戏不出现。
pub fn user_summary(scores: &HashMap<String, Vec<ScoreEntry>>) -> HashMap<String, GameSummary> {
    scores
        .iter()
        .filter_map(|(game_id, entries)| {
            summarize(entries).map(|summary| (game_id.clone(), summary))
        })
        .collect()
}

/// 指定游戏的全员前 N 名，按分数降序。
pub fn game_high_scores(table: &ScoreTable, game_id: &str, limit: usize) -> Vec<HighScoreRow> {
    let mut rows: Vec<HighScoreRow> = table
        .iter()
        .flat_map(|(user_id, games)| {
            games.get(game_id).into_iter().flatten().map(|entry| {
                HighScoreRow {
                    user_id: user_id.clone(),
                    score: entry.score,
                    timestamp_ms: entry.timestamp_ms,
                }
            })
        })
        .collect();

    rows.sort_by(|a, b| b.score.cmp(&a.score));
    rows.truncate(limit);
    rows
}

pub fn outcome_tally(entries: &[ScoreEntry]) -> OutcomeTally {
    let mut tally = OutcomeTally::default();
    for entry in entries {
        match entry.score {
            score if score > 0 => tally.wins += 1,
            score if score < 0 => tally.losses += 1,
            _ => tally.ties += 1,
        }
    }
    tally
}
