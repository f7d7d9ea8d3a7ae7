use crate::error::CliError;
use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use supply_core::ContractState;
use tracing::{debug, info};

pub const STATE_FILE: &str = "contract.cbor";

/// The contract state file in the data directory.
pub struct Storage {
    state_path: PathBuf,
}

impl Storage {
    /// Uses `data_dir` when given, otherwise the platform data directory.
    pub fn new(data_dir: Option<&Path>) -> Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir.to_path_buf(),
            None => {
                let proj_dirs = ProjectDirs::from("", "Freenet", "Supplyctl")
                    .ok_or_else(|| anyhow!("Failed to determine project directories"))?;
                proj_dirs.data_dir().to_path_buf()
            }
        };

        fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

        Ok(Self {
            state_path: data_dir.join(STATE_FILE),
        })
    }

    pub fn path(&self) -> &Path {
        &self.state_path
    }

    /// A missing state file is an uninitialized contract.
    pub fn load(&self) -> Result<ContractState> {
        if !self.state_path.exists() {
            debug!(path = %self.state_path.display(), "no state file, starting empty");
            return Ok(ContractState::new());
        }
        let file = File::open(&self.state_path)
            .with_context(|| format!("Failed to open {}", self.state_path.display()))?;
        let state: ContractState = ciborium::de::from_reader(BufReader::new(file)).map_err(|e| {
            CliError::Storage(format!(
                "{} is not a valid contract state: {}",
                self.state_path.display(),
                e
            ))
        })?;
        Ok(state)
    }

    /// Writes to a sibling temporary file, then renames it over the state
    /// file.
    pub fn save(&self, state: &ContractState) -> Result<()> {
        let tmp_path = self.state_path.with_extension("cbor.tmp");
        {
            let file = File::create(&tmp_path)
                .with_context(|| format!("Failed to create {}", tmp_path.display()))?;
            let mut writer = BufWriter::new(file);
            ciborium::ser::into_writer(state, &mut writer)
                .map_err(|e| CliError::Storage(format!("Failed to encode state: {}", e)))?;
            writer.flush()?;
        }
        fs::rename(&tmp_path, &self.state_path)
            .with_context(|| format!("Failed to replace {}", self.state_path.display()))?;
        info!(
            path = %self.state_path.display(),
            journal = state.journal().len(),
            "state saved"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use supply_core::{Field, Invocation};
    use tempfile::TempDir;

    fn create_test_storage() -> (Storage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = Storage::new(Some(temp_dir.path())).unwrap();
        (storage, temp_dir)
    }

    #[test]
    fn test_missing_file_loads_empty_state() {
        let (storage, _dir) = create_test_storage();
        let state = storage.load().unwrap();
        assert_eq!(state, ContractState::new());
        assert!(!storage.path().exists());
    }

    #[test]
    fn test_storage_roundtrip() {
        let (storage, dir) = create_test_storage();
        let mut state = ContractState::new();
        state
            .apply(&Invocation::initialize(["10", "100", "5", "50", "8", "80"]))
            .unwrap();
        state.apply(&Invocation::deliver_first_period("10")).unwrap();
        storage.save(&state).unwrap();

        let loaded = storage.load().unwrap();
        assert_eq!(loaded, state);
        assert_eq!(loaded.query(Field::SupplierBalance).unwrap(), "100");

        // only the state file remains after the rename
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from(STATE_FILE)]);
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let (storage, _dir) = create_test_storage();
        fs::write(storage.path(), b"not cbor at all").unwrap();
        let err = storage.load().unwrap_err();
        assert!(err.to_string().contains("not a valid contract state"), "{err}");
    }
}
