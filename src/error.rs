use std::error::Error as StdError;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorCategory {
    /// Any failure that cannot be confidently attributed to any other error
    /// category in this enum.
    ///
    /// In particular this means that use of Internal is never a guarantee
    /// the error is not, for example due to a user error - merely that it
    /// cannot be confidently determined by the code.
    Internal,

    /// The user provided invalid input or performed an action that is
    /// unsupported or impossible to complete.
    User,
}

/// Fine-grained condition flags for consumers that want to branch on error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The cryptographic primitives rejected the request or are unavailable.
    CryptoUnavailable,
    /// Salt, IV or ciphertext do not have the shape the cipher requires,
    /// or required envelope parameters are missing.
    InvalidEnvelope,
    /// Padding or tag validation failed: wrong secret word, wrong access
    /// code, or corrupted data. Does not say which.
    DecryptionFailed,
    /// Base64 decoding of a transport field failed.
    EncodingError,
    /// The armored representation is malformed.
    ArmoringInvalid,
    /// Input claimed to be sealdrop armor but used a future/unsupported version.
    ArmoringFromFuture,
    /// A share link is missing the access code or secret word.
    InvalidShareLink,
    /// The secret word is empty or otherwise unusable.
    InvalidSecretWord,
    /// Secret word could not be obtained from the configured reader.
    SecretWordUnavailable,
    /// Payload exceeds the configured upload ceiling.
    PayloadTooLarge,
    /// Recovered content was tagged as text but is not valid UTF-8.
    InvalidText,
    /// The storage service could not be reached or answered with a failure.
    Transport,
    /// The configuration file could not be read or parsed.
    Config,
    /// Interaction with the filesystem, stdin/stdout, or other I/O failed.
    Io,
}

impl ErrorKind {
    /// Malformed transport encoding is surfaced the same way as a malformed
    /// envelope.
    pub fn is_malformed_envelope(self) -> bool {
        matches!(self, ErrorKind::InvalidEnvelope | ErrorKind::EncodingError)
    }
}

#[derive(Debug, Error)]
#[error("{msg}")]
pub struct SealdropError {
    /// Broad error category, always provided.
    pub category: ErrorCategory,
    /// Optional specific condition tag for consumers that need to
    /// branch their behavior. Any code consuming errors MUST handle
    /// the absence of a defined kind.
    pub kind: Option<ErrorKind>,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    msg: String,
}

impl SealdropError {
    /// Creates a new error with a required category and display message.
    pub fn new(category: ErrorCategory, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind: None,
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that also tags the failure with a kind.
    pub fn with_kind(category: ErrorCategory, kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that carries both a kind tag and the originating source error.
    pub fn with_kind_and_source(
        category: ErrorCategory,
        kind: ErrorKind,
        msg: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: Some(Box::new(source)),
            msg: msg.into(),
        }
    }

    /// The message carried by the error.
    pub fn message(&self) -> &str {
        &self.msg
    }

    /// Message suitable for an end user who should not see internals.
    ///
    /// Decryption failures collapse into a single message so the output
    /// never reveals which half of the credential was wrong.
    pub fn user_message(&self) -> &str {
        match self.kind {
            Some(ErrorKind::DecryptionFailed) => "wrong access code/secret word or corrupted data",
            Some(kind) if kind.is_malformed_envelope() => "the shared data is malformed",
            _ => &self.msg,
        }
    }

    /// Wraps the current error with a higher-level message while preserving the original as source.
    pub fn with_context(self, msg: impl Into<String>) -> Self {
        let category = self.category;
        let kind = self.kind;
        Self {
            category,
            kind,
            source: Some(Box::new(self)),
            msg: msg.into(),
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, SealdropError>;
