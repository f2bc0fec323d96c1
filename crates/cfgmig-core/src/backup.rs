//! Backups of configuration files taken before migration
//!
//! Backup names encode the source file, the version it was at and when the
//! copy was made: `<base>_v<version>_backup_<timestamp>.<ext>`. Copies made
//! within the same timestamp get a `_<n>` discriminator before the
//! extension.

use std::fmt::Write as _;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::settings::BackupSettings;

/// Default timestamp layout in backup names
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Default backup directory name, created next to the source file
pub const DEFAULT_BACKUP_DIR: &str = "backups";

/// Backup store errors
#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    /// Source path has no file name
    #[error("cannot back up '{}': not a file path", .path.display())]
    InvalidSource { path: PathBuf },

    /// Source metadata could not be read
    #[error("cannot inspect '{}'", .path.display())]
    Inspect {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Backup directory could not be created
    #[error("cannot create backup directory '{}'", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Copy into the backup directory failed
    #[error("cannot copy '{}' to '{}'", .from.display(), .to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Copy of a backup over the original failed
    #[error("cannot restore '{}' to '{}'", .from.display(), .to.display())]
    Restore {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Timestamp format string is not valid strftime
    #[error("invalid backup timestamp format '{0}'")]
    InvalidTimestampFormat(String),
}

impl BackupError {
    /// Check if the error must abort the enclosing migration
    ///
    /// Only a source file that disappeared mid-copy is tolerated.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::Copy { source, .. } if source.kind() == io::ErrorKind::NotFound
        )
    }
}

/// Creates and restores file backups
#[derive(Debug, Clone)]
pub struct BackupManager {
    directory: Option<PathBuf>,
    timestamp_format: String,
    enabled: bool,
}

impl Default for BackupManager {
    fn default() -> Self {
        Self {
            directory: None,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
            enabled: true,
        }
    }
}

impl BackupManager {
    /// Backups go to a `backups/` directory next to each source file
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Backups go to a fixed directory
    #[inline]
    #[must_use]
    pub fn in_directory(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: Some(directory.into()),
            ..Self::default()
        }
    }

    /// Manager that never writes anything
    #[inline]
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn from_settings(settings: &BackupSettings) -> Self {
        Self {
            directory: settings.directory.clone(),
            timestamp_format: settings.timestamp_format.clone(),
            enabled: settings.enabled,
        }
    }

    /// With timestamp layout (strftime syntax)
    #[inline]
    #[must_use]
    pub fn with_timestamp_format(mut self, format: impl Into<String>) -> Self {
        self.timestamp_format = format.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Directory backups of `source` are written to
    #[must_use]
    pub fn backup_dir_for(&self, source: &Path) -> PathBuf {
        match &self.directory {
            Some(dir) => dir.clone(),
            None => source
                .parent()
                .unwrap_or_else(|| Path::new(""))
                .join(DEFAULT_BACKUP_DIR),
        }
    }

    /// Copy `source` into the backup directory
    ///
    /// Returns `None` without touching the filesystem when backups are
    /// disabled or `source` does not exist.
    ///
    /// # Errors
    /// Returns [`BackupError`] if the directory cannot be created or the copy fails
    pub fn backup(&self, source: &Path, label: &str) -> Result<Option<PathBuf>, BackupError> {
        self.backup_at(source, label, Local::now())
    }

    /// Same as [`BackupManager::backup`] with an explicit timestamp
    ///
    /// # Errors
    /// See [`BackupManager::backup`]
    pub fn backup_at(
        &self,
        source: &Path,
        label: &str,
        at: DateTime<Local>,
    ) -> Result<Option<PathBuf>, BackupError> {
        if !self.enabled {
            return Ok(None);
        }
        match source.try_exists() {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!("No file at {}, skipping backup", source.display());
                return Ok(None);
            }
            Err(err) => {
                return Err(BackupError::Inspect {
                    path: source.to_path_buf(),
                    source: err,
                })
            }
        }

        let file_name = source
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| BackupError::InvalidSource {
                path: source.to_path_buf(),
            })?;
        let (base, extension) = split_extension(file_name);

        let mut timestamp = String::new();
        write!(timestamp, "{}", at.format(&self.timestamp_format))
            .map_err(|_| BackupError::InvalidTimestampFormat(self.timestamp_format.clone()))?;

        let directory = self.backup_dir_for(source);
        std::fs::create_dir_all(&directory).map_err(|err| BackupError::CreateDir {
            path: directory.clone(),
            source: err,
        })?;

        let stem = format!("{base}_v{}_backup_{timestamp}", sanitize(label));
        let target = free_name(&directory, &stem, extension);

        std::fs::copy(source, &target).map_err(|err| BackupError::Copy {
            from: source.to_path_buf(),
            to: target.clone(),
            source: err,
        })?;

        tracing::info!("Backed up {} to {}", source.display(), target.display());
        Ok(Some(target))
    }

    /// Copy a backup back over `target`
    ///
    /// # Errors
    /// Returns [`BackupError::Restore`] if the copy fails
    pub fn restore(&self, backup: &Path, target: &Path) -> Result<(), BackupError> {
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|err| BackupError::CreateDir {
                path: parent.to_path_buf(),
                source: err,
            })?;
        }
        std::fs::copy(backup, target).map_err(|err| BackupError::Restore {
            from: backup.to_path_buf(),
            to: target.to_path_buf(),
            source: err,
        })?;
        tracing::info!("Restored {} from {}", target.display(), backup.display());
        Ok(())
    }
}

/// Split `name.ext` into (`name`, `.ext`); dotfiles keep their name
fn split_extension(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(0) | None => (file_name, ""),
        Some(dot) => file_name.split_at(dot),
    }
}

fn sanitize(label: &str) -> String {
    label
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '-' } else { c })
        .collect()
}

fn free_name(directory: &Path, stem: &str, extension: &str) -> PathBuf {
    let first = directory.join(format!("{stem}{extension}"));
    if !first.exists() {
        return first;
    }
    (1u32..)
        .map(|n| directory.join(format!("{stem}_{n}{extension}")))
        .find(|candidate| !candidate.exists())
        .unwrap_or(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).single().unwrap()
    }

    fn write_source(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn backup_name_encodes_version_and_time() {
        let dir = TempDir::new().unwrap();
        let source = write_source(&dir, "app.toml", "version = 1\n");

        let backup = BackupManager::new()
            .backup_at(&source, "1", fixed_time())
            .unwrap()
            .unwrap();

        assert_eq!(backup.parent().unwrap(), dir.path().join("backups"));
        assert_eq!(
            backup.file_name().unwrap().to_str().unwrap(),
            "app_v1_backup_2024-03-09_14-05-07.toml"
        );
        assert_eq!(std::fs::read_to_string(&backup).unwrap(), "version = 1\n");
    }

    #[test]
    fn collisions_get_discriminator() {
        let dir = TempDir::new().unwrap();
        let source = write_source(&dir, "app.json", "{}");
        let manager = BackupManager::in_directory(dir.path().join("bk"));

        let first = manager.backup_at(&source, "2", fixed_time()).unwrap().unwrap();
        let second = manager.backup_at(&source, "2", fixed_time()).unwrap().unwrap();
        let third = manager.backup_at(&source, "2", fixed_time()).unwrap().unwrap();

        assert_ne!(first, second);
        assert!(second.to_str().unwrap().ends_with("_1.json"));
        assert!(third.to_str().unwrap().ends_with("_2.json"));
    }

    #[test]
    fn missing_source_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let result = BackupManager::new()
            .backup(&dir.path().join("absent.yaml"), "1")
            .unwrap();
        assert!(result.is_none());
        assert!(!dir.path().join("backups").exists());
    }

    #[test]
    fn disabled_manager_never_writes() {
        let dir = TempDir::new().unwrap();
        let source = write_source(&dir, "app.toml", "x = 1");
        let manager = BackupManager::disabled();
        assert!(!manager.is_enabled());
        assert!(manager.backup(&source, "1").unwrap().is_none());
        assert!(!dir.path().join("backups").exists());
    }

    #[test]
    fn file_without_extension() {
        let dir = TempDir::new().unwrap();
        let source = write_source(&dir, "config", "data");
        let backup = BackupManager::new()
            .backup_at(&source, "1.2.0", fixed_time())
            .unwrap()
            .unwrap();
        assert_eq!(
            backup.file_name().unwrap().to_str().unwrap(),
            "config_v1.2.0_backup_2024-03-09_14-05-07"
        );
    }

    #[test]
    fn restore_overwrites_original() {
        let dir = TempDir::new().unwrap();
        let source = write_source(&dir, "app.toml", "original");
        let manager = BackupManager::new();
        let backup = manager.backup(&source, "1").unwrap().unwrap();

        std::fs::write(&source, "migrated").unwrap();
        manager.restore(&backup, &source).unwrap();
        assert_eq!(std::fs::read_to_string(&source).unwrap(), "original");
    }

    #[test]
    fn restore_missing_backup_fails() {
        let dir = TempDir::new().unwrap();
        let err = BackupManager::new()
            .restore(&dir.path().join("nope.toml"), &dir.path().join("app.toml"))
            .unwrap_err();
        assert!(matches!(err, BackupError::Restore { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn unwritable_directory_is_fatal() {
        let dir = TempDir::new().unwrap();
        let source = write_source(&dir, "app.toml", "x");
        // a regular file where the backup directory should be
        let blocker = write_source(&dir, "blocker", "");
        let err = BackupManager::in_directory(&blocker)
            .backup(&source, "1")
            .unwrap_err();
        assert!(matches!(err, BackupError::CreateDir { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn split_extension_cases() {
        assert_eq!(split_extension("app.toml"), ("app", ".toml"));
        assert_eq!(split_extension("archive.tar.gz"), ("archive.tar", ".gz"));
        assert_eq!(split_extension(".env"), (".env", ""));
        assert_eq!(split_extension("plain"), ("plain", ""));
    }
}
