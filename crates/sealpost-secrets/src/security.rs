//! Security utilities for the exchange
//!
//! Provides:
//! - Audit logging of exchange steps (never logs secret values)
//! - Error sanitization before messages leave the process

/// Audit log entry for one exchange step
#[derive(Debug, Clone)]
pub struct AuditLog {
    pub operation: String,
    pub target: String,
    pub backend: String,
    pub success: bool,
    pub error: Option<String>,
    pub timestamp: std::time::SystemTime,
}

impl AuditLog {
    pub fn new(
        operation: impl Into<String>,
        target: impl Into<String>,
        backend: impl Into<String>,
    ) -> Self {
        Self {
            operation: operation.into(),
            target: target.into(),
            backend: backend.into(),
            success: true,
            error: None,
            timestamp: std::time::SystemTime::now(),
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.success = false;
        self.error = Some(sanitize_error(&error.into()));
        self
    }

    /// Log the audit entry (never logs secret values)
    pub fn log(&self) {
        if self.success {
            tracing::info!(
                operation = %self.operation,
                target = %self.target,
                backend = %self.backend,
                timestamp = ?self.timestamp,
                "Exchange step successful"
            );
        } else {
            tracing::warn!(
                operation = %self.operation,
                target = %self.target,
                backend = %self.backend,
                error = ?self.error,
                timestamp = ?self.timestamp,
                "Exchange step failed"
            );
        }
    }
}

/// Presigned URL query strings
const PRESIGNED_QUERY: (&str, &str) = (r"(https?://[^\s?]+)\?[^\s]+", "$1?[REDACTED]");

/// Base64-looking strings (48+ chars of base64 characters)
const BASE64_BLOB: (&str, &str) = (r"[A-Za-z0-9+/]{48,}={0,2}", "[REDACTED_BASE64]");

fn redact(error: &str, patterns: &[(&str, &str)]) -> String {
    let mut sanitized = error.to_string();

    for (pattern, replacement) in patterns {
        if let Ok(re) = regex::Regex::new(pattern) {
            sanitized = re.replace_all(&sanitized, *replacement).to_string();
        }
    }

    sanitized
}

/// Sanitize error messages to remove potential secret values
///
/// Query strings of presigned links are redacted as well, since their
/// signatures grant read access until expiry.
pub fn sanitize_error(error: &str) -> String {
    redact(
        error,
        &[
            PRESIGNED_QUERY,
            // Environment variable assignments
            (r"=([^\s]+)", "=[REDACTED]"),
            // Tokens and keys
            (r"token[=:]\s*([^\s]+)", "token=[REDACTED]"),
            (r"password[=:]\s*([^\s]+)", "password=[REDACTED]"),
            (r"secret[=:]\s*([^\s]+)", "secret=[REDACTED]"),
            BASE64_BLOB,
        ],
    )
}

/// Redact an exchange failure for an invocation report
///
/// Exchange errors never carry secret values, so only the two things a
/// backend error can echo back are removed: presigned link signatures and
/// ciphertext-sized base64. Names and reasons are kept verbatim.
pub fn redact_exchange_message(message: &str) -> String {
    redact(message, &[PRESIGNED_QUERY, BASE64_BLOB])
}
