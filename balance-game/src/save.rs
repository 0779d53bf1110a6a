//! Cross-session save blob and the repository that reads and merges it.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::KeyValueStorage;
use crate::constants::{SAVE_KEY, SAVE_VERSION, SAVE_VERSION_KEY};
use crate::state::GameState;
use crate::storage::StorageError;

/// Persisted progress. Missing fields default individually so older blobs
/// still load.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersistedSave {
    pub high_score: u32,
    #[serde(rename = "maxStreak")]
    pub max_streak_ever: u32,
    #[serde(rename = "maxLevel")]
    pub max_level_ever_reached: usize,
    #[serde(rename = "totalCorrect")]
    pub total_correct_answers: u32,
    #[serde(rename = "totalGames")]
    pub total_games_played: u32,
    #[serde(rename = "unlockedAchievements")]
    pub unlocked_achievement_ids: Vec<String>,
    #[serde(rename = "negativeNegativeCorrect")]
    pub double_negative_correct_count: u32,
    pub last_played: Option<DateTime<Utc>>,
}

/// Reads and writes [`PersistedSave`] through a [`KeyValueStorage`].
///
/// The plain methods never fail: storage problems are logged and defaults
/// returned. The `try_` variants surface them.
#[derive(Debug, Clone)]
pub struct SaveRepository<S> {
    storage: S,
}

impl<S: KeyValueStorage> SaveRepository<S> {
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }

    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Load the save, resetting storage when the stored version differs.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backend fails or the blob is not
    /// valid JSON.
    pub fn try_load(&self) -> Result<PersistedSave, StorageError> {
        let version = self
            .storage
            .read(SAVE_VERSION_KEY)
            .map_err(|e| StorageError::backend(SAVE_VERSION_KEY, e))?;
        if version.as_deref() != Some(SAVE_VERSION) {
            if version.is_some() {
                log::info!("save version {version:?} does not match {SAVE_VERSION}; resetting");
            }
            self.try_clear()?;
            return Ok(PersistedSave::default());
        }
        let Some(raw) = self
            .storage
            .read(SAVE_KEY)
            .map_err(|e| StorageError::backend(SAVE_KEY, e))?
        else {
            return Ok(PersistedSave::default());
        };
        serde_json::from_str(&raw).map_err(|source| StorageError::Corrupt {
            key: SAVE_KEY.to_string(),
            source,
        })
    }

    #[must_use]
    pub fn load_save(&self) -> PersistedSave {
        self.try_load().unwrap_or_else(|err| {
            log::warn!("could not load save: {err}");
            PersistedSave::default()
        })
    }

    /// Merge the running session into the stored save.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the stored save cannot be read or the
    /// merged one cannot be written.
    pub fn try_save_progress(&self, state: &GameState) -> Result<PersistedSave, StorageError> {
        let stored = self.load_for_merge()?;
        let merged = PersistedSave {
            high_score: stored.high_score.max(state.score),
            max_streak_ever: stored.max_streak_ever.max(state.max_streak_ever),
            max_level_ever_reached: stored
                .max_level_ever_reached
                .max(state.max_level_ever_reached),
            total_correct_answers: state.total_correct_answers,
            total_games_played: stored.total_games_played,
            unlocked_achievement_ids: state.unlocked_achievement_ids.iter().cloned().collect(),
            double_negative_correct_count: state.double_negative_correct_count,
            last_played: Some(Utc::now()),
        };
        self.try_write(&merged)?;
        Ok(merged)
    }

    pub fn save_progress(&self, state: &GameState) {
        if let Err(err) = self.try_save_progress(state) {
            log::warn!("could not save progress: {err}");
        }
    }

    /// Close out a finished game: counts it and keeps the best values.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the stored save cannot be read or the
    /// merged one cannot be written.
    pub fn try_save_on_new_game(&self, state: &GameState) -> Result<PersistedSave, StorageError> {
        let stored = self.load_for_merge()?;
        let merged = PersistedSave {
            high_score: stored.high_score.max(state.score),
            max_streak_ever: stored.max_streak_ever.max(state.max_streak_ever),
            max_level_ever_reached: stored
                .max_level_ever_reached
                .max(state.max_level_ever_reached),
            total_games_played: stored.total_games_played.saturating_add(1),
            unlocked_achievement_ids: state.unlocked_achievement_ids.iter().cloned().collect(),
            double_negative_correct_count: stored
                .double_negative_correct_count
                .max(state.double_negative_correct_count),
            last_played: Some(Utc::now()),
            ..stored
        };
        self.try_write(&merged)?;
        Ok(merged)
    }

    pub fn save_on_new_game(&self, state: &GameState) {
        if let Err(err) = self.try_save_on_new_game(state) {
            log::warn!("could not record finished game: {err}");
        }
    }

    /// Store `score` if it beats the stored high score.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when storage cannot be read or written.
    pub fn try_update_high_score(&self, score: u32) -> Result<bool, StorageError> {
        let stored = self.load_for_merge()?;
        if score <= stored.high_score {
            return Ok(false);
        }
        self.try_write(&PersistedSave {
            high_score: score,
            ..stored
        })?;
        Ok(true)
    }

    /// `true` when `score` became the new high score.
    pub fn update_high_score(&self, score: u32) -> bool {
        self.try_update_high_score(score).unwrap_or_else(|err| {
            log::warn!("could not update high score: {err}");
            false
        })
    }

    #[must_use]
    pub fn high_score(&self) -> u32 {
        self.load_save().high_score
    }

    #[must_use]
    pub fn unlocked_achievement_ids(&self) -> Vec<String> {
        self.load_save().unlocked_achievement_ids
    }

    /// Remove the save and its version marker.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backend refuses the removal.
    pub fn try_clear(&self) -> Result<(), StorageError> {
        self.storage
            .remove(SAVE_KEY)
            .map_err(|e| StorageError::backend(SAVE_KEY, e))?;
        self.storage
            .remove(SAVE_VERSION_KEY)
            .map_err(|e| StorageError::backend(SAVE_VERSION_KEY, e))
    }

    pub fn clear(&self) {
        if let Err(err) = self.try_clear() {
            log::warn!("could not clear save: {err}");
        }
    }

    /// A corrupt blob is overwritten rather than blocking every later write.
    fn load_for_merge(&self) -> Result<PersistedSave, StorageError> {
        match self.try_load() {
            Err(StorageError::Corrupt { key, source }) => {
                log::warn!("discarding corrupt save under {key}: {source}");
                Ok(PersistedSave::default())
            }
            other => other,
        }
    }

    fn try_write(&self, save: &PersistedSave) -> Result<(), StorageError> {
        let raw = serde_json::to_string(save).map_err(|source| StorageError::Encode {
            key: SAVE_KEY.to_string(),
            source,
        })?;
        self.storage
            .write(SAVE_KEY, &raw)
            .map_err(|e| StorageError::backend(SAVE_KEY, e))?;
        self.storage
            .write(SAVE_VERSION_KEY, SAVE_VERSION)
            .map_err(|e| StorageError::backend(SAVE_VERSION_KEY, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use std::collections::BTreeSet;

    fn state_with(score: u32, max_streak: u32) -> GameState {
        GameState {
            score,
            max_streak_ever: max_streak,
            total_correct_answers: 4,
            unlocked_achievement_ids: BTreeSet::from(["first_correct".to_string()]),
            ..GameState::default()
        }
    }

    #[test]
    fn empty_storage_loads_defaults() {
        let repo = SaveRepository::new(MemoryStorage::new());
        assert_eq!(repo.load_save(), PersistedSave::default());
        assert_eq!(repo.high_score(), 0);
    }

    #[test]
    fn progress_keeps_best_values() {
        let repo = SaveRepository::new(MemoryStorage::new());
        repo.save_progress(&state_with(120, 6));
        let merged = repo.try_save_progress(&state_with(40, 2)).unwrap();
        assert_eq!(merged.high_score, 120);
        assert_eq!(merged.max_streak_ever, 6);
        assert_eq!(merged.total_correct_answers, 4);
        assert!(merged.last_played.is_some());
        assert_eq!(repo.unlocked_achievement_ids(), ["first_correct"]);
    }

    #[test]
    fn new_game_counts_games() {
        let repo = SaveRepository::new(MemoryStorage::new());
        repo.save_on_new_game(&state_with(10, 1));
        repo.save_on_new_game(&state_with(30, 1));
        let save = repo.load_save();
        assert_eq!(save.total_games_played, 2);
        assert_eq!(save.high_score, 30);
    }

    #[test]
    fn high_score_only_moves_up() {
        let repo = SaveRepository::new(MemoryStorage::new());
        assert!(repo.update_high_score(50));
        assert!(!repo.update_high_score(50));
        assert!(!repo.update_high_score(20));
        assert!(repo.update_high_score(51));
        assert_eq!(repo.high_score(), 51);
    }

    #[test]
    fn version_mismatch_resets() {
        let storage = MemoryStorage::new();
        let repo = SaveRepository::new(storage.clone());
        repo.save_progress(&state_with(99, 3));
        storage.write(SAVE_VERSION_KEY, "0.9.0").unwrap();
        assert_eq!(repo.load_save(), PersistedSave::default());
        assert_eq!(storage.read(SAVE_KEY).unwrap(), None);
    }

    #[test]
    fn partial_blob_fills_missing_fields() {
        let storage = MemoryStorage::new();
        storage.write(SAVE_VERSION_KEY, SAVE_VERSION).unwrap();
        storage
            .write(SAVE_KEY, r#"{"highScore":77,"maxStreak":9}"#)
            .unwrap();
        let save = SaveRepository::new(storage).load_save();
        assert_eq!(save.high_score, 77);
        assert_eq!(save.max_streak_ever, 9);
        assert!(save.unlocked_achievement_ids.is_empty());
        assert_eq!(save.last_played, None);
    }

    #[test]
    fn corrupt_blob_is_an_error_but_loads_defaults() {
        let storage = MemoryStorage::new();
        storage.write(SAVE_VERSION_KEY, SAVE_VERSION).unwrap();
        storage.write(SAVE_KEY, "{not json").unwrap();
        let repo = SaveRepository::new(storage);
        assert!(matches!(
            repo.try_load(),
            Err(StorageError::Corrupt { .. })
        ));
        assert_eq!(repo.load_save(), PersistedSave::default());

        assert!(repo.update_high_score(12));
        assert_eq!(repo.try_load().unwrap().high_score, 12);
    }
}
