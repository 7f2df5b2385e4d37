//! Filing DOM Processing Library
//!
//! Arena-backed document tree for HTML filings, with the mutation
//! primitives a text-rewriting pass needs.
//!
//! ## Philosophy
//!
//! - **Good taste**: Data structures first, algorithms follow naturally
//! - **No special cases**: Type system eliminates branches
//! - **Cache friendly**: Arena allocation, sequential access patterns
//!
//! ## Core Design
//!
//! ```text
//! HTML text → parser → DomArena (owned) → rewrite in place → serializer → HTML text
//!                          ↓
//!                    NodeId (u32)
//! ```

pub mod arena;
pub mod error;
pub mod parser;
pub mod serializer;
pub mod service;
pub mod types;
pub mod utils;

pub use arena::DomArena;
pub use error::{DomError, Result};
pub use parser::parse_html;
pub use serializer::{DomSerializer, SerializerConfig};
pub use service::{DomService, DomServiceConfig};
pub use types::*;
