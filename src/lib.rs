#![deny(unsafe_code)]

mod app;
pub mod css;
mod error;

pub use app::{output_paths, Config, FileReport, OutputPaths, Runner, DEFAULT_HEADER_TEXT};
pub use css::parser::{parse, parse_bytes};
pub use css::rewriter::{rewrite, RewriteSummary};
pub use css::serializer::{serialize, SerializerOptions};
pub use error::{Error, Result, Span};
