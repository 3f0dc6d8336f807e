//! Utility module

mod error;
mod source;
mod span;

pub use error::{Error, Result};
pub use source::{Location, SourceMap};
pub use span::Span;
