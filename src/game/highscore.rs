//! High score persistence.
//!
//! The best score and the first-run flag are saved to a local JSON file
//! in the user's data directory.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use super::round::RoundEnded;
use crate::screens::Screen;

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<PlayerRecords>();

    // Load records on startup.
    app.add_systems(Startup, load_records);

    app.add_systems(
        Update,
        record_round_results.run_if(in_state(Screen::Gameplay)),
    );
}

/// Resource holding the persisted best score and first-run flag.
#[derive(Resource, Debug, Serialize, Deserialize)]
pub struct PlayerRecords {
    pub top_score: i64,
    pub first_run: bool,
}

impl Default for PlayerRecords {
    fn default() -> Self {
        Self {
            top_score: 0,
            first_run: true,
        }
    }
}

impl PlayerRecords {
    /// Fold a finished round into the records. Returns true if the score
    /// set a new record.
    pub fn record(&mut self, score: i64) -> bool {
        self.first_run = false;
        if score > self.top_score {
            self.top_score = score;
            return true;
        }
        false
    }

    /// Get the file path for storing records.
    fn file_path() -> Option<PathBuf> {
        dirs::data_local_dir().map(|dir| dir.join("popchain").join("records.json"))
    }

    /// Load records from disk.
    pub fn load() -> Self {
        let Some(path) = Self::file_path() else {
            warn!("Could not determine data directory for records");
            return Self::default();
        };

        if !path.exists() {
            info!("No records file found at {:?}, starting fresh", path);
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(records) => {
                    info!("Loaded records from {:?}", path);
                    records
                }
                Err(e) => {
                    warn!("Failed to parse records: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read records file: {}", e);
                Self::default()
            }
        }
    }

    /// Save records to disk.
    pub fn save(&self) {
        let Some(path) = Self::file_path() else {
            warn!("Could not determine data directory for saving records");
            return;
        };

        if let Some(parent) = path.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warn!("Failed to create records directory: {}", e);
            return;
        }

        match serde_json::to_string_pretty(self) {
            Ok(json) => match fs::write(&path, json) {
                Ok(()) => info!("Saved records to {:?}", path),
                Err(e) => warn!("Failed to write records: {}", e),
            },
            Err(e) => warn!("Failed to serialize records: {}", e),
        }
    }
}

/// Load records on startup.
fn load_records(mut records: ResMut<PlayerRecords>) {
    *records = PlayerRecords::load();
}

/// Persist results when the round ends.
fn record_round_results(
    mut ended: MessageReader<RoundEnded>,
    mut records: ResMut<PlayerRecords>,
) {
    for message in ended.read() {
        if records.record(message.score) {
            info!("New high score: {}", message.score);
        }
        records.save();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_keeps_best_score() {
        let mut records = PlayerRecords::default();
        assert!(records.first_run);

        assert!(records.record(120));
        assert_eq!(records.top_score, 120);
        assert!(!records.first_run);

        // A worse round doesn't lower the record.
        assert!(!records.record(40));
        assert_eq!(records.top_score, 120);

        // Negative finals never become the record.
        assert!(!records.record(-30));
        assert_eq!(records.top_score, 120);
    }

    #[test]
    fn test_records_round_trip_through_json() {
        let records = PlayerRecords {
            top_score: 777,
            first_run: false,
        };
        let json = serde_json::to_string(&records).unwrap();
        let back: PlayerRecords = serde_json::from_str(&json).unwrap();
        assert_eq!(back.top_score, 777);
        assert!(!back.first_run);
    }
}
