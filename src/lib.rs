//! docverify - laboratory report verification and quality certification.
//!
//! Extracts quality parameters from lab report PDFs, checks them against a
//! standard and issues PDF certificates for compliant reports.

pub mod cli;
pub mod config;
pub mod hf;
pub mod logging;
pub mod models;
pub mod ocr;
pub mod server;
pub mod services;
pub mod storage;
pub mod utils;
