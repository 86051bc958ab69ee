//! C1: syntax-aware chunking.

mod chunker;
mod fallback;
mod grammar;

pub use chunker::Chunker;
pub use fallback::fallback_chunks;
pub use grammar::SyntaxGrammar;
