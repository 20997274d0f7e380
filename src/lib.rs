#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![doc = include_str!("../README.md")]

/// Generation options, alphabets and configuration parsing
pub mod options;

/// In-memory identifier to OTP record storage
pub mod store;

/// Random OTP generation and ownership of the record store
pub mod generator;

/// Read-only OTP validation
pub mod validator;

/// Facade wiring a generator and validators together
pub mod service;
