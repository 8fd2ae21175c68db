//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! builder methods or config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (normalize, semantic checks)
//!     → ClientConfig (validated, immutable)
//!     → owned by the Client, shared with the connector
//! ```
//!
//! # Design Decisions
//! - Config is immutable once a client is built
//! - Retry settings have defaults so minimal configs work

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::ClientConfig;
pub use schema::RetryConfig;
