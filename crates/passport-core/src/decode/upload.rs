//! Upload validation.
//!
//! Checks run in a fixed order: MIME type first, then size. A rejected
//! file never reaches the decoder and leaves pipeline state untouched.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upload limit used by the passport workflow (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// MIME types accepted by the upload step.
pub const DEFAULT_ACCEPTED_MIME_TYPES: [&str; 4] =
    ["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// A rejected upload, with a message fit for the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("Please upload a valid image file (JPG, PNG, or WEBP)")]
    UnsupportedType { mime: String },

    #[error("File size must be less than {}MB", .limit / (1024 * 1024))]
    TooLarge { size: u64, limit: u64 },
}

/// Accepted types and the size ceiling for uploads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadPolicy {
    pub accepted_mime_types: Vec<String>,
    pub max_bytes: u64,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            accepted_mime_types: DEFAULT_ACCEPTED_MIME_TYPES
                .iter()
                .map(|m| m.to_string())
                .collect(),
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl UploadPolicy {
    /// Validate a file's declared MIME type and byte size.
    pub fn validate(&self, mime: &str, size: u64) -> Result<(), UploadError> {
        if !self.accepted_mime_types.iter().any(|m| m == mime) {
            return Err(UploadError::UnsupportedType {
                mime: mime.to_string(),
            });
        }

        if size > self.max_bytes {
            return Err(UploadError::TooLarge {
                size,
                limit: self.max_bytes,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_supported_types() {
        let policy = UploadPolicy::default();
        for mime in DEFAULT_ACCEPTED_MIME_TYPES {
            assert!(policy.validate(mime, 1024).is_ok(), "{mime} should be accepted");
        }
    }

    #[test]
    fn test_rejects_unsupported_type() {
        let policy = UploadPolicy::default();
        let err = policy.validate("image/gif", 10).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Please upload a valid image file (JPG, PNG, or WEBP)"
        );
    }

    #[test]
    fn test_mime_match_is_exact() {
        let policy = UploadPolicy::default();
        assert!(policy.validate("image/PNG", 10).is_err());
        assert!(policy.validate("image/png; charset=binary", 10).is_err());
    }

    #[test]
    fn test_size_limit_is_inclusive() {
        let policy = UploadPolicy::default();
        assert!(policy.validate("image/png", DEFAULT_MAX_UPLOAD_BYTES).is_ok());

        let err = policy
            .validate("image/png", DEFAULT_MAX_UPLOAD_BYTES + 1)
            .unwrap_err();
        assert_eq!(err.to_string(), "File size must be less than 10MB");
    }

    #[test]
    fn test_type_checked_before_size() {
        let policy = UploadPolicy::default();
        let err = policy
            .validate("application/pdf", DEFAULT_MAX_UPLOAD_BYTES * 2)
            .unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedType { .. }));
    }
}
