//! Junos Provider
//!
//! Declarative management of Junos configuration objects. Each resource type
//! renders `set`/`delete` statements from typed options, applies them under
//! the exclusive configuration lock, and reads the object back from
//! `show configuration <path> | display set relative` output.
//!
//! # Overview
//!
//! - **Resources**: one descriptor per configuration object ([`Resource`]):
//!   object path, line rendering, output parsing and a schema
//! - **Orchestrator**: the shared lock -> set -> commit -> verify lifecycle
//!   ([`crud::Orchestrator`])
//! - **Sessions**: the device transport plugs in through [`Session`],
//!   [`Client`] and [`ClientBuilder`]
//! - **Provider surface**: [`ProviderService`], implemented by
//!   [`JunosProvider`], dispatching on resource type names
//! - **Logging**: `tracing` to stderr or to a debug file
//!
//! # Quick Start
//!
//! ```
//! use junos_provider::resources::{AsPath, AsPathOptions};
//! use junos_provider::Resource;
//!
//! let options = AsPathOptions {
//!     name: "test".to_string(),
//!     path: "65000 65001".to_string(),
//!     dynamic_db: false,
//! };
//! assert_eq!(
//!     AsPath::render(&options),
//!     vec![r#"set policy-options as-path test "65000 65001""#]
//! );
//!
//! let show = "\n<configuration-output>\nset \"65000 65001\"\n</configuration-output>\n";
//! assert_eq!(AsPath::parse("test", show).unwrap(), options);
//! ```
//!
//! # Write lifecycle
//!
//! Every create, update and delete takes the configuration lock (retrying
//! until `lock_timeout`), stages the rendered lines, commits with the
//! message `<verb> resource <type>` and re-reads the device to confirm the
//! object is (or is no longer) there. Any failure once the lock is held
//! discards the candidate configuration before the error is returned.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod crud;
pub mod error;
pub mod jdecode;
pub mod logging;
pub mod parse;
pub mod provider;
pub mod render;
pub mod resource;
pub mod resources;
pub mod schema;
pub mod session;
pub mod testing;
pub mod types;
pub mod validation;

// Re-export main types at crate root
pub use config::ProviderConfig;
pub use crud::Orchestrator;
pub use error::{OperationError, ProviderError};
pub use logging::{init_logging, init_logging_with_default, try_init_logging, try_init_logging_to_file};
pub use provider::{JunosProvider, ProviderService};
pub use resource::Resource;
pub use schema::ProviderSchema;
pub use session::{Client, ClientBuilder, Session};
pub use types::{Applied, AttributeChange, ImportedResource, PlanResult, ProviderMetadata};
pub use validation::{is_valid, validate, validate_result};

// Re-export async_trait for transport implementations
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tracing;
