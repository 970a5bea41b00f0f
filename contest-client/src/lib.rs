//! # contest-client
//!
//! Client library for the climbcontest check-in kiosk.
//!
//! ## Features
//!
//! - **Transport Abstraction**: one JSON POST per call (reqwest over HTTPS, mock)
//! - **Registry Client**: validates scanned climbers and blocs
//! - **Submission Engine**: registers a pair with bounded retries
//! - **Kiosk Actor**: single owner of the pairing session, driven by contest-core
//!
//! ## Example
//!
//! ```ignore
//! use climbcontest_client::{HttpsTransport, Kiosk, KioskConfig, TransportConfig};
//! use climbcontest_types::Category;
//!
//! let transport = HttpsTransport::new(&TransportConfig::new("contest.example.org"))?;
//! let kiosk = Kiosk::spawn(KioskConfig::default(), transport);
//!
//! kiosk.scanned(Category::Climber, "12")?;
//! kiosk.scanned(Category::Bloc, "F3")?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod error;
pub mod kiosk;
pub mod registry;
pub mod scanner;
pub mod submission;
pub mod transport;

pub use api::ApiConfig;
pub use error::ClientError;
pub use kiosk::{Kiosk, KioskConfig, KioskHandle, ScanStatus};
pub use registry::RegistryClient;
pub use scanner::{CodeFormat, ScanOutcome, Scanner, ScriptedScanner};
pub use submission::SubmissionEngine;
pub use transport::{
    FailureKind, Gate, HttpsTransport, MockTransport, Transport, TransportConfig, TransportError,
};
