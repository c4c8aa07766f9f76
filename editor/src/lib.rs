mod digests;
mod errors;
mod hashing_reader;
mod location;

pub mod config;
pub mod editor;
pub mod element;
pub mod fixtures;
pub mod incremental;
pub mod nodes;
pub mod path;
pub mod trace;
pub mod txn;

mod from_addr;

pub use config::{EditorConfig, ResurrectPolicy};
pub use digests::{B3Digest, B3_LEN};
pub use editor::{cancel_on, CancelHook, State};
pub use element::{ElementEditor, ElementReceiver};
pub use errors::{Error, ValidateNodeError};
pub use from_addr::from_addr;
pub use hashing_reader::{B3HashingReader, HashingReader};
pub use incremental::{Editor, TreeReceiver};
pub use location::{ElRev, ElementId, PathRev, RevNum, Revision, TxnPath};
pub use nodes::{FileBody, NodeBody, NodeContent, NodeKind, Properties, SymlinkTarget};
pub use path::{PathComponent, RelPath};
pub use trace::TracingReceiver;
pub use txn::{MemoryRepository, MemoryTxn};

#[cfg(test)]
mod tests;

#[cfg(test)]
use rstest_reuse;
