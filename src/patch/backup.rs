//! Backup and undo for file-writing operations.
//!
//! Before `replace`, `apply-files` or `plan` write a file, its original
//! bytes can be copied into `.reshape-backup/<operation_id>/`, mirroring
//! the workspace layout, next to a `manifest.json` that records each
//! file's hash and size. `undo` restores from that manifest.

use super::{compute_hash, write_atomic};
use crate::error::{Result, ReshapeError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory, relative to the workspace root, that holds all backups.
pub const BACKUP_DIR: &str = ".reshape-backup";

/// Metadata about a backed-up file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupEntry {
    /// Original path of the file (relative to workspace root).
    pub original_path: PathBuf,
    /// SHA-256 hash of the original file content.
    pub hash: String,
    /// Byte count of the original file.
    pub size: u64,
}

/// Manifest describing a backup operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupManifest {
    /// Unique identifier for this operation.
    pub operation_id: String,
    /// Timestamp when the backup was created (RFC 3339).
    pub timestamp: String,
    /// Files that were backed up.
    pub files: Vec<BackupEntry>,
    /// Absolute path to the backup directory.
    #[serde(skip)]
    pub backup_dir: PathBuf,
}

impl BackupManifest {
    /// Create an empty manifest stamped with the current time.
    pub fn new(operation_id: String, backup_dir: PathBuf) -> Self {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        BackupManifest {
            operation_id,
            timestamp,
            files: Vec::new(),
            backup_dir,
        }
    }

    /// Whether `relative` is already recorded.
    pub fn contains(&self, relative: &Path) -> bool {
        self.files.iter().any(|entry| entry.original_path == relative)
    }

    /// Save the manifest into the backup directory.
    pub fn save(&self) -> Result<()> {
        let manifest_path = self.backup_dir.join("manifest.json");
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&manifest_path, json).map_err(|e| ReshapeError::Io {
            path: manifest_path,
            source: e,
        })?;
        Ok(())
    }

    /// Load a manifest; its directory becomes the backup directory.
    pub fn load(manifest_path: &Path) -> Result<Self> {
        let json = fs::read_to_string(manifest_path).map_err(|e| ReshapeError::Io {
            path: manifest_path.to_path_buf(),
            source: e,
        })?;

        let mut manifest: BackupManifest = serde_json::from_str(&json)?;
        manifest.backup_dir = manifest_path
            .parent()
            .ok_or_else(|| ReshapeError::Other("Manifest has no parent directory".to_string()))?
            .to_path_buf();

        Ok(manifest)
    }
}

/// Copies files aside before they are overwritten.
pub struct BackupWriter {
    manifest: BackupManifest,
    workspace_root: PathBuf,
}

impl BackupWriter {
    /// Create the backup directory for one operation.
    ///
    /// `operation_id` defaults to a fresh UUID v4.
    pub fn new(workspace_root: &Path, operation_id: Option<String>) -> Result<Self> {
        let op_id = operation_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let backup_dir = workspace_root.join(BACKUP_DIR).join(&op_id);

        fs::create_dir_all(&backup_dir).map_err(|e| ReshapeError::Io {
            path: backup_dir.clone(),
            source: e,
        })?;

        log::debug!("Backing up into {}", backup_dir.display());

        Ok(BackupWriter {
            manifest: BackupManifest::new(op_id, backup_dir),
            workspace_root: workspace_root.to_path_buf(),
        })
    }

    /// Operation identifier.
    pub fn operation_id(&self) -> &str {
        &self.manifest.operation_id
    }

    /// Where [`BackupWriter::finalize`] writes the manifest.
    pub fn manifest_path(&self) -> PathBuf {
        self.manifest.backup_dir.join("manifest.json")
    }

    /// Number of files backed up so far.
    pub fn len(&self) -> usize {
        self.manifest.files.len()
    }

    /// True before any file was backed up.
    pub fn is_empty(&self) -> bool {
        self.manifest.files.is_empty()
    }

    /// Copy `file_path` into the backup directory.
    ///
    /// A file already backed up in this operation keeps its first copy, so
    /// a plan touching one file twice restores the pre-plan content.
    pub fn backup_file(&mut self, file_path: &Path) -> Result<()> {
        let relative = file_path
            .strip_prefix(&self.workspace_root)
            .map_err(|_| {
                ReshapeError::Other(format!(
                    "File '{}' is not under workspace root '{}'",
                    file_path.display(),
                    self.workspace_root.display()
                ))
            })?
            .to_path_buf();

        if self.manifest.contains(&relative) {
            return Ok(());
        }

        let content = fs::read(file_path).map_err(|e| ReshapeError::Io {
            path: file_path.to_path_buf(),
            source: e,
        })?;

        let backup_path = self.manifest.backup_dir.join(&relative);
        if let Some(parent) = backup_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ReshapeError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        fs::write(&backup_path, &content).map_err(|e| ReshapeError::Io {
            path: backup_path.clone(),
            source: e,
        })?;

        self.manifest.files.push(BackupEntry {
            original_path: relative,
            hash: compute_hash(&content),
            size: content.len() as u64,
        });

        Ok(())
    }

    /// Write the manifest and return its path.
    pub fn finalize(self) -> Result<PathBuf> {
        self.manifest.save()?;
        log::info!(
            "Backup {} holds {} file(s)",
            self.manifest.operation_id,
            self.manifest.files.len()
        );
        Ok(self.manifest_path())
    }
}

/// Restore every file listed in a manifest. Returns the number restored.
///
/// All backup copies are verified against their recorded hashes before the
/// first file is written.
pub fn restore_from_manifest(manifest_path: &Path, workspace_root: &Path) -> Result<usize> {
    let manifest = BackupManifest::load(manifest_path)?;

    let mut verified = Vec::with_capacity(manifest.files.len());
    for entry in &manifest.files {
        let backup_path = manifest.backup_dir.join(&entry.original_path);
        let content = fs::read(&backup_path).map_err(|e| ReshapeError::Io {
            path: backup_path.clone(),
            source: e,
        })?;

        let actual_hash = compute_hash(&content);
        if actual_hash != entry.hash {
            return Err(ReshapeError::Other(format!(
                "Hash mismatch for {}: expected {}, got {}",
                entry.original_path.display(),
                entry.hash,
                actual_hash
            )));
        }
        verified.push((workspace_root.join(&entry.original_path), content));
    }

    for (original_path, content) in &verified {
        if let Some(parent) = original_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ReshapeError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        write_atomic(original_path, content)?;
    }

    log::info!(
        "Restored {} file(s) from backup {}",
        verified.len(),
        manifest.operation_id
    );
    Ok(verified.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_backup_writer_creates_manifest() {
        let workspace = TempDir::new().expect("Failed to create temp dir");
        let workspace_root = workspace.path();

        let test_file = workspace_root.join("app.ts");
        fs::write(&test_file, b"const a = 1;").expect("Failed to write test file");

        let mut writer = BackupWriter::new(workspace_root, Some("op-123".to_string()))
            .expect("Failed to create BackupWriter");
        writer.backup_file(&test_file).expect("Failed to backup file");
        let manifest_path = writer.finalize().expect("Failed to finalize backup");

        assert!(manifest_path.exists(), "Manifest file should exist");
        let backup_file = workspace_root.join(".reshape-backup/op-123/app.ts");
        let backup_content = fs::read_to_string(&backup_file).expect("Failed to read backup file");
        assert_eq!(backup_content, "const a = 1;");
    }

    #[test]
    fn test_second_backup_of_same_file_keeps_first_copy() {
        let workspace = TempDir::new().expect("Failed to create temp dir");
        let workspace_root = workspace.path();

        let test_file = workspace_root.join("app.ts");
        fs::write(&test_file, b"first").expect("Failed to write test file");

        let mut writer = BackupWriter::new(workspace_root, Some("twice".to_string()))
            .expect("Failed to create BackupWriter");
        writer.backup_file(&test_file).expect("Failed to backup file");
        fs::write(&test_file, b"second").expect("Failed to modify file");
        writer.backup_file(&test_file).expect("Failed to backup file");
        assert_eq!(writer.len(), 1);

        let manifest_path = writer.finalize().expect("Failed to finalize backup");
        fs::write(&test_file, b"third").expect("Failed to modify file");
        restore_from_manifest(&manifest_path, workspace_root).expect("Failed to restore");
        assert_eq!(fs::read_to_string(&test_file).expect("read"), "first");
    }

    #[test]
    fn test_restore_with_subdirectories() {
        let workspace = TempDir::new().expect("Failed to create temp dir");
        let workspace_root = workspace.path();

        let src_dir = workspace_root.join("src");
        fs::create_dir(&src_dir).expect("Failed to create src dir");
        let test_file = src_dir.join("index.js");
        fs::write(&test_file, b"run();").expect("Failed to write test file");

        let mut writer = BackupWriter::new(workspace_root, Some("subdir".to_string()))
            .expect("Failed to create BackupWriter");
        writer.backup_file(&test_file).expect("Failed to backup file");
        let manifest_path = writer.finalize().expect("Failed to finalize backup");

        fs::write(&test_file, b"modified").expect("Failed to modify");
        let restored =
            restore_from_manifest(&manifest_path, workspace_root).expect("Failed to restore");

        assert_eq!(restored, 1);
        assert_eq!(fs::read_to_string(&test_file).expect("read"), "run();");
    }

    #[test]
    fn test_restore_hash_mismatch_writes_nothing() {
        let workspace = TempDir::new().expect("Failed to create temp dir");
        let workspace_root = workspace.path();

        let good = workspace_root.join("a.css");
        let bad = workspace_root.join("b.css");
        fs::write(&good, b"a {}").expect("Failed to write test file");
        fs::write(&bad, b"b {}").expect("Failed to write test file");

        let mut writer = BackupWriter::new(workspace_root, Some("tamper".to_string()))
            .expect("Failed to create BackupWriter");
        writer.backup_file(&good).expect("Failed to backup file");
        writer.backup_file(&bad).expect("Failed to backup file");
        let manifest_path = writer.finalize().expect("Failed to finalize backup");

        fs::write(&good, b"changed").expect("Failed to modify");
        fs::write(workspace_root.join(".reshape-backup/tamper/b.css"), b"tampered")
            .expect("Failed to tamper with backup");

        match restore_from_manifest(&manifest_path, workspace_root) {
            Err(ReshapeError::Other(msg)) if msg.contains("Hash mismatch") => {}
            other => panic!("Expected hash mismatch error, got: {:?}", other),
        }
        assert_eq!(fs::read_to_string(&good).expect("read"), "changed");
    }

    #[test]
    fn test_file_outside_workspace_rejected() {
        let workspace = TempDir::new().expect("Failed to create temp dir");
        let outside = TempDir::new().expect("Failed to create temp dir");
        let file = outside.path().join("x.ts");
        fs::write(&file, b"x").expect("Failed to write test file");

        let mut writer =
            BackupWriter::new(workspace.path(), None).expect("Failed to create BackupWriter");
        assert!(!writer.operation_id().is_empty());
        assert!(writer.backup_file(&file).is_err());
        assert!(writer.is_empty());
    }
}
