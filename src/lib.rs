//! # judgeval-mcp
//!
//! An MCP (Model Context Protocol) server exposing the Judgment evaluation
//! platform to AI assistants over stdio.
//!
//! ## Features
//!
//! - Trace fetch/delete, evaluation runs and results
//! - Dataset pull/push/delete with append/overwrite merge handling
//! - Project create/delete
//! - Degrades gracefully when no API key is configured
//!
//! ## Usage
//!
//! ```bash
//! # Start the MCP server (for AI assistants)
//! JUDGMENT_API_KEY=... judgeval-mcp mcp
//!
//! # Check credentials and API reachability
//! judgeval-mcp validate
//!
//! # Inspect the exposed tool list
//! judgeval-mcp tools
//! ```

pub mod client;
pub mod config;
pub mod dataset;
pub mod error;
pub mod mcp;

pub use client::{JudgmentApi, JudgmentClient};
pub use config::Config;
pub use error::{JudgmentError, Result};
