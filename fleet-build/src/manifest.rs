//! Artifact manifest — idempotency records for the shared output directory.
//!
//! Persists a [`ManifestFile`] JSON document at `<output_dir>/.fleet-manifest.json`,
//! keyed field-by-field on [`ArtifactKey`] so that versions sharing a string
//! prefix (`v1`, `v1.2`) never shadow each other. Writes use the `.tmp` +
//! rename pattern.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use fleet_core::ArtifactKey;

use crate::error::{io_err, BuildError};

pub const MANIFEST_FILE: &str = ".fleet-manifest.json";
/// Where an unreadable manifest is moved before starting over.
pub const CORRUPT_MANIFEST_FILE: &str = ".fleet-manifest.json.corrupt";

/// One built artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    #[serde(flatten)]
    pub key: ArtifactKey,
    /// File name inside the output directory.
    pub file: String,
    pub sha256: String,
    pub built_at: DateTime<Utc>,
}

/// On-disk manifest payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManifestFile {
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub artifacts: Vec<ArtifactRecord>,
}

/// In-memory manifest for one output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    dir: PathBuf,
    records: BTreeMap<ArtifactKey, ArtifactRecord>,
}

/// `<output_dir>/.fleet-manifest.json`
pub fn manifest_path(output_dir: &Path) -> PathBuf {
    output_dir.join(MANIFEST_FILE)
}

impl Manifest {
    /// Load the manifest for `output_dir`; empty if none exists yet.
    pub fn load(output_dir: &Path) -> Result<Self, BuildError> {
        let path = manifest_path(output_dir);
        let mut records = BTreeMap::new();
        if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
            let file: ManifestFile = serde_json::from_str(&contents)?;
            for record in file.artifacts {
                records.insert(record.key.clone(), record);
            }
        }
        Ok(Self {
            dir: output_dir.to_path_buf(),
            records,
        })
    }

    /// Like [`Manifest::load`], but a manifest that fails to decode is
    /// replaced by an empty one. With `move_aside` the bad file is renamed
    /// to [`CORRUPT_MANIFEST_FILE`] so the next save does not overwrite it.
    pub fn load_or_reset(output_dir: &Path, move_aside: bool) -> Result<Self, BuildError> {
        match Self::load(output_dir) {
            Err(BuildError::Manifest(e)) => {
                let path = manifest_path(output_dir);
                tracing::error!(
                    "{} is unreadable ({e}), starting from an empty manifest",
                    path.display()
                );
                if move_aside {
                    let aside = output_dir.join(CORRUPT_MANIFEST_FILE);
                    std::fs::rename(&path, &aside).map_err(|e| io_err(&path, e))?;
                    tracing::warn!("moved unreadable manifest to {}", aside.display());
                }
                Ok(Self {
                    dir: output_dir.to_path_buf(),
                    records: BTreeMap::new(),
                })
            }
            other => other,
        }
    }

    /// Save atomically: write `<path>.tmp`, then rename over `<path>`.
    pub fn save(&self) -> Result<(), BuildError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| io_err(&self.dir, e))?;
        let path = manifest_path(&self.dir);
        let payload = ManifestFile {
            updated_at: Utc::now(),
            artifacts: self.records.values().cloned().collect(),
        };
        let json = serde_json::to_string_pretty(&payload)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| io_err(&tmp, e))?;
        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(io_err(&path, e));
        }
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn records(&self) -> impl Iterator<Item = &ArtifactRecord> {
        self.records.values()
    }

    pub fn get(&self, key: &ArtifactKey) -> Option<&ArtifactRecord> {
        self.records.get(key)
    }

    /// Whether `key` is already satisfied in the output directory.
    ///
    /// A manifest record counts only while its file is still present.
    /// Without a record, a file carrying the artifact's name (bare or with a
    /// single extension, see [`ArtifactKey::matches_file_name`]) is accepted
    /// so that outputs of earlier, manifest-less runs are not rebuilt.
    pub fn artifact_exists(&self, key: &ArtifactKey) -> Result<bool, BuildError> {
        if let Some(record) = self.records.get(key) {
            if self.dir.join(&record.file).is_file() {
                return Ok(true);
            }
            tracing::warn!("manifest lists {} but the file is gone", record.file);
        }
        if !self.dir.exists() {
            return Ok(false);
        }
        let entries = std::fs::read_dir(&self.dir).map_err(|e| io_err(&self.dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| io_err(&self.dir, e))?;
            if key.matches_file_name(&entry.file_name().to_string_lossy()) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Record `file` (already inside the output directory) as `key`'s artifact.
    pub fn record(&mut self, key: ArtifactKey, file: &str) -> Result<ArtifactRecord, BuildError> {
        let sha256 = sha256_file(&self.dir.join(file))?;
        let record = ArtifactRecord {
            key: key.clone(),
            file: file.to_string(),
            sha256,
            built_at: Utc::now(),
        };
        self.records.insert(key, record.clone());
        Ok(record)
    }
}

/// Hex SHA-256 of a file's contents, read in chunks.
pub fn sha256_file(path: &Path) -> Result<String, BuildError> {
    let mut file = File::open(path).map_err(|e| io_err(path, e))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf).map_err(|e| io_err(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn key(version: &str) -> ArtifactKey {
        ArtifactKey::new("gaiad", "linux", "amd64", version)
    }

    #[test]
    fn empty_manifest_when_file_missing() {
        let tmp = TempDir::new().unwrap();
        let m = Manifest::load(tmp.path()).unwrap();
        assert_eq!(m.records().count(), 0);
        assert!(!m.artifact_exists(&key("v1")).unwrap());
    }

    #[test]
    fn recorded_artifact_survives_reload() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("gaiad-linux-amd64-v1.bin"), b"elf").unwrap();

        let mut m = Manifest::load(tmp.path()).unwrap();
        let record = m.record(key("v1"), "gaiad-linux-amd64-v1.bin").unwrap();
        assert_eq!(record.sha256.len(), 64);
        m.save().unwrap();

        let reloaded = Manifest::load(tmp.path()).unwrap();
        assert_eq!(reloaded.get(&key("v1")), Some(&record));
        assert!(reloaded.artifact_exists(&key("v1")).unwrap());
    }

    #[test]
    fn prefix_sharing_versions_are_distinct() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("gaiad-linux-amd64-v1.2"), b"elf").unwrap();
        let mut m = Manifest::load(tmp.path()).unwrap();
        m.record(key("v1.2"), "gaiad-linux-amd64-v1.2").unwrap();

        assert!(m.artifact_exists(&key("v1.2")).unwrap());
        assert!(!m.artifact_exists(&key("v1")).unwrap());
    }

    #[test]
    fn legacy_file_without_record_counts() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("gaiad-linux-amd64-v1"), b"elf").unwrap();
        let m = Manifest::load(tmp.path()).unwrap();
        assert!(m.artifact_exists(&key("v1")).unwrap());
    }

    #[test]
    fn record_with_deleted_file_does_not_count() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("gaiad-linux-amd64-v1.bin");
        std::fs::write(&path, b"elf").unwrap();
        let mut m = Manifest::load(tmp.path()).unwrap();
        m.record(key("v1"), "gaiad-linux-amd64-v1.bin").unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(!m.artifact_exists(&key("v1")).unwrap());
    }

    #[test]
    fn tmp_file_cleaned_up_after_save() {
        let tmp = TempDir::new().unwrap();
        Manifest::load(tmp.path()).unwrap().save().unwrap();
        assert!(manifest_path(tmp.path()).exists());
        assert!(!manifest_path(tmp.path()).with_extension("json.tmp").exists());
    }

    #[test]
    fn corrupt_manifest_is_an_error() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(manifest_path(tmp.path()), "{not json").unwrap();
        assert!(matches!(
            Manifest::load(tmp.path()),
            Err(BuildError::Manifest(_))
        ));
    }

    #[test]
    fn reset_moves_corrupt_manifest_aside() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(manifest_path(tmp.path()), "{trunc").unwrap();

        let m = Manifest::load_or_reset(tmp.path(), true).unwrap();
        assert_eq!(m.records().count(), 0);
        assert!(!manifest_path(tmp.path()).exists());
        assert_eq!(
            std::fs::read_to_string(tmp.path().join(CORRUPT_MANIFEST_FILE)).unwrap(),
            "{trunc"
        );
    }

    #[test]
    fn reset_without_move_leaves_file_in_place() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(manifest_path(tmp.path()), "{trunc").unwrap();

        let m = Manifest::load_or_reset(tmp.path(), false).unwrap();
        assert_eq!(m.records().count(), 0);
        assert!(manifest_path(tmp.path()).exists());
        assert!(!tmp.path().join(CORRUPT_MANIFEST_FILE).exists());
    }

    #[test]
    fn legacy_file_with_unknown_extension_counts() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("gaiad-linux-amd64-v1.bin"), b"elf").unwrap();
        let m = Manifest::load(tmp.path()).unwrap();
        assert!(m.artifact_exists(&key("v1")).unwrap());
        assert!(!m.artifact_exists(&key("v1.2")).unwrap());
    }

    #[test]
    fn sha256_of_known_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("f");
        std::fs::write(&path, b"abc").unwrap();
        assert_eq!(
            sha256_file(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
