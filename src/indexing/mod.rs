//! C7: indexing pipeline and its ignore-pattern composition.

pub mod ignore;
pub mod indexer;

pub use ignore::{effective_extensions, IgnoreSet, BUILTIN_DEFAULTS, DEFAULT_EXTENSIONS};
pub use indexer::{collection_name, IndexPhase, IndexProgress, IndexReport, IndexStatus, Indexer};
