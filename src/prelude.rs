//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::backend::NativeHandle;
pub use crate::coercion::{
    Coercer, CoercionRules, from_array, from_boolean, from_json, to_array, to_boolean, to_json,
};
pub use crate::config::{AdapterOptions, AdapterOptionsBuilder};
pub use crate::database::Database;
pub use crate::descriptor::{ConnectionDescriptor, LocalPath};
pub use crate::error::SqlAdapterError;
pub use crate::executor::Executor;
pub use crate::results::{CustomDbRow, QueryResult};
pub use crate::transaction::Transaction;
pub use crate::translation::{PlaceholderStyle, to_sqlite_dialect, translate, translate_placeholders};
pub use crate::types::{BackendKind, RowValues};
