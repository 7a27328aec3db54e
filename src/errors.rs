// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Error Types
 * Error taxonomy for the passive check pipeline
 *
 * None of these are fatal to the host: analysis errors fail open,
 * probe errors fail closed, malformed URLs degrade to an empty domain.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::time::Duration;
use thiserror::Error;

/// Main scanner error type
#[derive(Error, Debug)]
pub enum ScannerError {
    /// Network-related errors
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// Dynamic content probe errors
    #[error("Probe error: {0}")]
    Probe(#[from] ProbeError),

    /// Pattern/decoding failures inside a check
    #[error("Analysis failed for {url}: {reason}")]
    Analysis { url: String, reason: String },

    /// Whitelist administration errors
    #[error("Whitelist error: {0}")]
    Whitelist(#[from] WhitelistError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Timeout errors
    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// General errors
    #[error("Scanner error: {0}")]
    General(String),
}

/// Network-specific errors
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Connection timeout after {timeout:?} to {url}")]
    ConnectionTimeout { url: String, timeout: Duration },

    #[error("Connection refused for {url}")]
    ConnectionRefused { url: String },

    #[error("Invalid URL: {url}")]
    InvalidUrl { url: String },

    #[error("Invalid request for {url}: {reason}")]
    InvalidRequest { url: String, reason: String },

    #[error("Response body too large ({size} bytes) from {url}, max: {max_size}")]
    BodyTooLarge {
        url: String,
        size: usize,
        max_size: usize,
    },

    #[error("Network error: {0}")]
    Other(String),
}

/// Reasons the dynamic content probe could not reach a verdict
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Re-request failed for {url}: {reason}")]
    RequestFailed { url: String, reason: String },

    #[error("Probe for {url} exceeded {timeout:?}")]
    TimedOut { url: String, timeout: Duration },

    #[error("Probe for {url} cancelled")]
    Cancelled { url: String },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum WhitelistError {
    #[error("domain must not be empty")]
    Empty,

    #[error("domain already whitelisted: {0}")]
    Duplicate(String),

    #[error("domain not whitelisted: {0}")]
    NotFound(String),
}

impl NetworkError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            NetworkError::ConnectionTimeout { .. } => true,
            NetworkError::ConnectionRefused { .. } => false,
            NetworkError::InvalidUrl { .. } => false,
            NetworkError::InvalidRequest { .. } => false,
            NetworkError::BodyTooLarge { .. } => false,
            NetworkError::Other(_) => true,
        }
    }
}

impl ScannerError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            ScannerError::Network(e) => e.is_retryable(),
            ScannerError::Timeout { .. } => true,
            _ => false,
        }
    }
}

/// Convert reqwest errors to our error types
impl From<reqwest::Error> for ScannerError {
    fn from(err: reqwest::Error) -> Self {
        let url = err.url().map(|u| u.to_string()).unwrap_or_default();
        if err.is_timeout() {
            ScannerError::Network(NetworkError::ConnectionTimeout {
                url,
                timeout: Duration::from_secs(30),
            })
        } else if err.is_connect() {
            ScannerError::Network(NetworkError::ConnectionRefused { url })
        } else if err.is_builder() {
            ScannerError::Network(NetworkError::InvalidRequest {
                url,
                reason: err.to_string(),
            })
        } else {
            ScannerError::Network(NetworkError::Other(err.to_string()))
        }
    }
}

/// Result type for scanner operations
pub type ScannerResult<T> = Result<T, ScannerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        let timeout = ScannerError::Network(NetworkError::ConnectionTimeout {
            url: "https://example.com".to_string(),
            timeout: Duration::from_secs(5),
        });
        assert!(timeout.is_retryable());

        let invalid = ScannerError::Network(NetworkError::InvalidUrl {
            url: "::".to_string(),
        });
        assert!(!invalid.is_retryable());

        let probe = ScannerError::Probe(ProbeError::Cancelled {
            url: "https://example.com/app.js".to_string(),
        });
        assert!(!probe.is_retryable());
    }

    #[test]
    fn test_error_messages() {
        let err = ScannerError::from(WhitelistError::Duplicate("example.com".to_string()));
        assert_eq!(
            err.to_string(),
            "Whitelist error: domain already whitelisted: example.com"
        );
    }
}
