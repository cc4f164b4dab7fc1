//! Local input constraints checked before any request is sent.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::gateway::FilePart;

pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Username must be at least {} characters", MIN_USERNAME_LEN)]
    UsernameTooShort,

    #[error("Password must be at least {} characters", MIN_PASSWORD_LEN)]
    PasswordTooShort,

    #[error("Expected exactly one file.")]
    FileCount { found: usize },

    #[error("File is empty.")]
    EmptyFile,

    #[error("Max file size is {}.", display_size(.limit))]
    FileTooLarge { size: u64, limit: u64 },

    #[error("Could not read '{path}': {message}")]
    Unreadable { path: PathBuf, message: String },
}

/// Username and password that passed the form constraints.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self, ValidationError> {
        let username = username.into();
        let password = password.into();
        if username.chars().count() < MIN_USERNAME_LEN {
            return Err(ValidationError::UsernameTooShort);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::PasswordTooShort);
        }
        Ok(Self { username, password })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "username": self.username,
            "password": self.password,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"••••••••")
            .finish()
    }
}

/// Read the single file to upload, enforcing count and size limits.
pub async fn load_upload(paths: &[PathBuf], max_bytes: u64) -> Result<FilePart, ValidationError> {
    let [path] = paths else {
        return Err(ValidationError::FileCount { found: paths.len() });
    };

    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| unreadable(path, e))?;
    if !metadata.is_file() {
        return Err(ValidationError::Unreadable {
            path: path.clone(),
            message: "not a regular file".to_string(),
        });
    }
    check_size(metadata.len(), max_bytes)?;

    let bytes = tokio::fs::read(path).await.map_err(|e| unreadable(path, e))?;
    check_size(bytes.len() as u64, max_bytes)?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    Ok(FilePart { file_name, bytes })
}

/// Whole MB/KB when the size divides evenly, bytes otherwise.
fn display_size(bytes: &u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;
    match *bytes {
        b if b >= MIB && b % MIB == 0 => format!("{}MB", b / MIB),
        b if b >= KIB && b % KIB == 0 => format!("{}KB", b / KIB),
        b => format!("{} bytes", b),
    }
}

fn check_size(size: u64, max_bytes: u64) -> Result<(), ValidationError> {
    if size == 0 {
        return Err(ValidationError::EmptyFile);
    }
    if size > max_bytes {
        return Err(ValidationError::FileTooLarge {
            size,
            limit: max_bytes,
        });
    }
    Ok(())
}

fn unreadable(path: &Path, err: std::io::Error) -> ValidationError {
    ValidationError::Unreadable {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn credentials_enforce_minimum_lengths() {
        assert_eq!(
            Credentials::new("al", "secret1").unwrap_err(),
            ValidationError::UsernameTooShort
        );
        assert_eq!(
            Credentials::new("alice", "12345").unwrap_err(),
            ValidationError::PasswordTooShort
        );
        let creds = Credentials::new("alice", "123456").unwrap();
        assert_eq!(creds.username(), "alice");
        assert_eq!(creds.to_json()["password"], "123456");
    }

    #[test]
    fn credentials_debug_masks_password() {
        let creds = Credentials::new("alice", "hunter22").unwrap();
        let debug = format!("{:?}", creds);
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter22"));
    }

    #[test]
    fn too_large_message_is_in_megabytes() {
        let err = ValidationError::FileTooLarge {
            size: 50 * 1024 * 1024,
            limit: 40 * 1024 * 1024,
        };
        assert_eq!(err.to_string(), "Max file size is 40MB.");
    }

    #[test]
    fn small_limits_are_not_rounded_to_zero() {
        let too_large = |limit| ValidationError::FileTooLarge { size: limit + 1, limit }.to_string();
        assert_eq!(too_large(1024), "Max file size is 1KB.");
        assert_eq!(too_large(1500), "Max file size is 1500 bytes.");
        assert_eq!(too_large(3 * 1024 * 1024 / 2), "Max file size is 1536KB.");
    }

    #[tokio::test]
    async fn upload_requires_exactly_one_file() {
        assert_eq!(
            load_upload(&[], 1024).await.unwrap_err(),
            ValidationError::FileCount { found: 0 }
        );
        let two = vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")];
        assert_eq!(
            load_upload(&two, 1024).await.unwrap_err(),
            ValidationError::FileCount { found: 2 }
        );
    }

    #[tokio::test]
    async fn upload_enforces_size_limits() {
        let dir = TempDir::new().unwrap();
        let empty = dir.path().join("empty.pdf");
        std::fs::write(&empty, b"").unwrap();
        assert_eq!(
            load_upload(&[empty], 1024).await.unwrap_err(),
            ValidationError::EmptyFile
        );

        let big = dir.path().join("big.pdf");
        std::fs::write(&big, vec![0u8; 2048]).unwrap();
        assert!(matches!(
            load_upload(&[big], 1024).await.unwrap_err(),
            ValidationError::FileTooLarge { size: 2048, limit: 1024 }
        ));
    }

    #[tokio::test]
    async fn upload_reads_file_and_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.pdf");
        std::fs::write(&path, b"%PDF-1.7").unwrap();
        let part = load_upload(&[path], 1024).await.unwrap();
        assert_eq!(part.file_name, "report.pdf");
        assert_eq!(part.bytes, b"%PDF-1.7");
    }

    #[tokio::test]
    async fn missing_file_is_unreadable() {
        let dir = TempDir::new().unwrap();
        let err = load_upload(&[dir.path().join("nope.pdf")], 1024)
            .await
            .unwrap_err();
        assert!(matches!(err, ValidationError::Unreadable { .. }));
    }
}
