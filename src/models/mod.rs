//! Data models for docverify.

mod certificate;
mod document;
mod standard;
mod verification;

pub use certificate::CertificateInfo;
pub use document::{DocumentType, ExtractedDocument, ExtractionMethod, ParameterData, TableData};
pub use standard::Standard;
pub use verification::{
    ExtractedValue, ModelInfo, ParameterResult, RequirementType, VerificationReport,
};
