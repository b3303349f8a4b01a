use serde::Serialize;

/// A certificate file on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateInfo {
    pub name: String,
    /// RFC 3339 creation (or modification) time.
    pub created_at: String,
    pub size_bytes: u64,
}
