//! Error types for obscure-core

use thiserror::Error;

/// Result type alias using obscure-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for Obscure
#[derive(Error, Debug)]
pub enum Error {
    /// I/O failure while building or extracting a tar archive
    #[error("archive error: {message}")]
    Archive { message: String },

    /// Key derivation or AEAD seal/open failure. A failed open means the
    /// password was wrong or the data was tampered with; AES-GCM cannot
    /// distinguish the two.
    #[error("encryption error: {message}")]
    Crypto { message: String },

    /// zstd compression or decompression failure
    #[error("compression error: {message}")]
    Compression { message: String },

    /// An object already exists at the target key. Backups are write-once.
    #[error("backup already exists: {key}")]
    Collision { key: String },

    /// Missing, incomplete, or rejected provider credentials
    #[error("credential error: {message}")]
    Credential { message: String, hint: Option<String> },

    /// Network-level failure talking to a storage provider
    #[error("{provider}: {message}")]
    Transport {
        provider: String,
        message: String,
        hint: Option<String>,
    },

    /// Requested object does not exist
    #[error("backup not found: {key}")]
    NotFound { key: String },

    /// Invalid configuration or schedule specification
    #[error("configuration error: {message}")]
    Config { message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an archive error
    pub fn archive(message: impl Into<String>) -> Self {
        Self::Archive {
            message: message.into(),
        }
    }

    /// Create a crypto error
    pub fn crypto(message: impl Into<String>) -> Self {
        Self::Crypto {
            message: message.into(),
        }
    }

    /// Create a compression error
    pub fn compression(message: impl Into<String>) -> Self {
        Self::Compression {
            message: message.into(),
        }
    }

    /// Create a collision error
    pub fn collision(key: impl Into<String>) -> Self {
        Self::Collision { key: key.into() }
    }

    /// Create a credential error without a remediation hint
    pub fn credential(message: impl Into<String>) -> Self {
        Self::Credential {
            message: message.into(),
            hint: None,
        }
    }

    /// Create a credential error carrying a remediation hint
    pub fn credential_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::Credential {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    /// Create a transport error
    pub fn transport(
        provider: impl Into<String>,
        message: impl Into<String>,
        hint: Option<String>,
    ) -> Self {
        Self::Transport {
            provider: provider.into(),
            message: message.into(),
            hint,
        }
    }

    /// Create a not-found error
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Remediation hint for the user, if one applies
    pub fn remediation(&self) -> Option<&str> {
        match self {
            Self::Credential { hint, .. } | Self::Transport { hint, .. } => hint.as_deref(),
            _ => None,
        }
    }

    /// Whether this is an access-denied-class credential failure.
    /// The Filebase fallback uploader keys off this.
    pub fn is_credential(&self) -> bool {
        matches!(self, Self::Credential { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remediation_only_on_credential_and_transport() {
        let err = Error::credential_with_hint("bad key", "re-run provider setup");
        assert_eq!(err.remediation(), Some("re-run provider setup"));

        let err = Error::transport("s3", "timeout", Some("check the endpoint".into()));
        assert_eq!(err.remediation(), Some("check the endpoint"));

        assert!(Error::collision("backups/a/b/c.tar").remediation().is_none());
        assert!(Error::crypto("open failed").remediation().is_none());
    }

    #[test]
    fn test_is_credential() {
        assert!(Error::credential("missing secret").is_credential());
        assert!(!Error::transport("gcs", "dns failure", None).is_credential());
    }
}
