//! C3: query preprocessing and variant selection.

mod preprocessor;
mod selection;
mod tables;

pub use preprocessor::preprocess;
pub use selection::{select_multi, select_single};
