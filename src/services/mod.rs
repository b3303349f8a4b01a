//! Service layer for document verification.
//!
//! Domain logic shared by the CLI and the web server.

pub mod certificate;
pub mod extraction;
pub mod standards;
pub mod verification;

pub use certificate::{CertificateError, CertificateGenerator, DEFAULT_ISSUER};
pub use extraction::{DocumentProcessor, ProcessingError};
pub use standards::{StandardKind, StandardsError, StandardsExtractor};
pub use verification::{DocumentVerifier, VerificationError, VerificationSettings};
