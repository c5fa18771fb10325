use std::{fmt::Display, fs::File, path::Path};

use serde::Serialize;

use crate::{error::Result, session::EpisodeRecord};

#[derive(Serialize)]
struct Row {
    episode: usize,
    total_reward: f64,
    steps: u32,
    done: bool,
    success: bool,
    terminal_state: String,
}

/// Per-episode training log in CSV format
///
/// Columns are `episode,total_reward,steps,done,success,terminal_state`, with episodes numbered
/// from one. Every row is flushed as soon as it is written.
pub struct TrainingLog {
    writer: csv::Writer<File>,
}

impl TrainingLog {
    /// Create the log at `path`, truncating any existing file
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(csv::Error::from)?;
        }
        Ok(Self {
            writer: csv::Writer::from_path(path)?,
        })
    }

    pub fn append<S: Display>(&mut self, record: &EpisodeRecord<S>) -> Result<()> {
        self.writer.serialize(Row {
            episode: record.index + 1,
            total_reward: record.total_reward,
            steps: record.steps,
            done: record.done,
            success: record.success,
            terminal_state: record.terminal_state.to_string(),
        })?;
        self.flush()
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("training.csv");

        let mut log = TrainingLog::create(&path).unwrap();
        log.append(&EpisodeRecord {
            index: 0,
            total_reward: 12.5,
            steps: 6,
            done: true,
            success: true,
            terminal_state: "progress_100|complete_true",
        })
        .unwrap();
        log.append(&EpisodeRecord {
            index: 1,
            total_reward: -1.0,
            steps: 15,
            done: false,
            success: false,
            terminal_state: "progress_30|complete_false",
        })
        .unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(
            lines,
            [
                "episode,total_reward,steps,done,success,terminal_state",
                "1,12.5,6,true,true,progress_100|complete_true",
                "2,-1.0,15,false,false,progress_30|complete_false",
            ]
        );
    }
}
