use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ai::Difficulty;

use super::{read_json, write_json, KeyValueStore, StoreError};

pub(crate) const SCORES_KEY: &str = "gameScores";

/// 一次对局的成绩记录。井字棋记 ±1/0 的胜负码，街机游戏记积分。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreEntry {
    pub score: i32,
    pub timestamp_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
}

/// user id → game id → 成绩列表。
pub type ScoreTable = HashMap<String, HashMap<String, Vec<ScoreEntry>>>;

/// 成绩簿：游戏引擎终局时写入，统计页读取。
#[derive(Debug)]
pub struct ScoreBook<S> {
    store: S,
}

impl<S: KeyValueStore> ScoreBook<S> {
    pub fn new(store: S) -> Result<Self, StoreError> {
        let mut book = Self { store };
        if book.store.read(SCORES_KEY).is_none() {
            write_json(&mut book.store, SCORES_KEY, &ScoreTable::new())?;
        }
        Ok(book)
    }

    pub fn record(
        &mut self,
        user_id: u64,
        game_id: &str,
        score: i32,
        difficulty: Option<Difficulty>,
        now_ms: f64,
    ) -> Result<(), StoreError> {
        let mut table = self.all_scores()?;
        table
            .entry(user_id.to_string())
            .or_default()
            .entry(game_id.to_string())
            .or_default()
            .push(ScoreEntry {
                score,
                timestamp_ms: now_ms,
                difficulty,
            });
        write_json(&mut self.store, SCORES_KEY, &table)
    }

    pub fn all_scores(&self) -> Result<ScoreTable, StoreError> {
        Ok(read_json(&self.store, SCORES_KEY)?.unwrap_or_default())
    }

    pub fn user_scores(&self, user_id: u64) -> Result<HashMap<String, Vec<ScoreEntry>>, StoreError> {
        Ok(self
            .all_scores()?
            .remove(&user_id.to_string())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const NOW: f64 = 1_700_000_000_000.0;

    fn book() -> ScoreBook<MemoryStore> {
        ScoreBook::new(MemoryStore::new()).expect("init should succeed")
    }

    #[test]
    fn records_append_in_order() {
        let mut book = book();
        book.record(1, "game1", 120, None, NOW)
            .expect("record should succeed");
        book.record(1, "game1", 80, None, NOW + 1.0)
            .expect("record should succeed");

        let scores = book.user_scores(1).expect("read should succeed");
        let entries = scores.get("game1").expect("game entries should exist");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].score, 120);
        assert_eq!(entries[1].score, 80);
        assert_eq!(entries[1].timestamp_ms, NOW + 1.0);
    }

    #[test]
    fn users_and_games_are_kept_apart() {
        let mut book = book();
        book.record(1, "game1", 10, None, NOW)
            .expect("record should succeed");
        book.record(1, "Tic-Tac-Toe", 1, Some(Difficulty::Hard), NOW)
            .expect("record should succeed");
        book.record(2, "game1", 99, None, NOW)
            .expect("record should succeed");

        let first = book.user_scores(1).expect("read should succeed");
        assert_eq!(first.len(), 2);
        assert_eq!(first.get("game1").map(Vec::len), Some(1));

        let second = book.user_scores(2).expect("read should succeed");
        assert_eq!(second.get("game1").and_then(|entries| entries.first()).map(|entry| entry.score), Some(99));
        assert_eq!(book.user_scores(3).expect("read should succeed").len(), 0);
    }

    #[test]
    fn difficulty_tag_round_trips() {
        let mut book = book();
        book.record(7, "Tic-Tac-Toe", -1, Some(Difficulty::Medium), NOW)
            .expect("record should succeed");

        let scores = book.user_scores(7).expect("read should succeed");
        let entry = &scores.get("Tic-Tac-Toe").expect("entries should exist")[0];
        assert_eq!(entry.difficulty, Some(Difficulty::Medium));
        assert_eq!(entry.score, -1);
    }
}
