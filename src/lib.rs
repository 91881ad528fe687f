//! api-doc-sync - Keep API endpoint metadata in sync with Rust service sources.
//!
//! Given the root of an application and a list of target files, this library discovers the
//! API endpoints and struct types declared in the targets' packages, pulls structured
//! annotations out of their doc comments, and fills in one [`model::EndpointRecord`] per
//! target. Problems never abort a run; they are collected into [`model::SyncResult`].
//!
//! # Architecture
//!
//! Leaves first:
//!
//! 1. [`annotations`] - Extracts labeled `errors:` and `path params:` sections from docs
//! 2. [`error_codes`] - Maps symbolic error codes to HTTP statuses
//! 3. [`scanner`] - Lists the production source files of a package directory
//! 4. [`parser`] - Parses sources into ASTs, dropping test-only items
//! 5. [`loader`] - Loads packages with in-memory overlays and collects diagnostics
//! 6. [`discover`] - Finds endpoint and type declarations and their wire encoding
//! 7. [`correlate`] - Turns declarations into records for the targets claiming them
//! 8. [`sync`] - Drives a whole run
//! 9. [`serializer`] - Reads target lists and writes results as JSON or YAML
//!
//! # Example Usage
//!
//! ```no_run
//! use api_doc_sync::model::{ServiceInput, Target};
//! use api_doc_sync::serializer::serialize_yaml;
//! use api_doc_sync::sync::Synchronizer;
//!
//! let services = vec![ServiceInput {
//!     name: "users".to_string(),
//!     targets: vec![Target::new("users/api.rs")],
//! }];
//!
//! let result = Synchronizer::new("./my-app").run(services);
//! for service in &result.services {
//!     for target in &service.targets {
//!         println!("{} -> {}", target.path.display(), target.endpoint.name);
//!     }
//! }
//!
//! let yaml = serialize_yaml(&result).unwrap();
//! println!("{}", yaml);
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module.

pub mod annotations;
pub mod cli;
pub mod correlate;
pub mod discover;
pub mod error;
pub mod error_codes;
pub mod loader;
pub mod model;
pub mod parser;
pub mod scanner;
pub mod serializer;
pub mod sync;
