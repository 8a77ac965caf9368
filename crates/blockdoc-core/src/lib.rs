//! Core primitives of the block-document model.
//!
//! A document is a tree of typed [`Node`]s addressed by [`Path`]s; rich text
//! lives in per-node deltas (see `blockdoc-delta`). All mutation flows
//! through [`Transaction`]s applied by a [`Document`], which enforces
//! all-or-nothing semantics and runs [`BlockRegistry`] validation on every
//! node a transaction touched.

pub mod blocks;
pub mod codec;
mod document;
mod error;
mod node;
mod path;
mod registry;
mod selection;
mod transaction;

pub use codec::{node_from_json, node_to_json, CodecError};
pub use document::{ApplyOutcome, Document, SelectionEvent};
pub use error::DocumentError;
pub use node::Node;
pub use path::Path;
pub use registry::{BlockRegistry, BlockSpec};
pub use selection::{Position, Selection};
pub use transaction::{Operation, Transaction, TransactionBuilder};
