//! Two-stage plan text parsing: [`markdown`] tokenizes a document into
//! heading sections, [`fields`] extracts typed values from section bodies.

pub mod fields;
pub mod markdown;

pub use markdown::{MarkdownDocument, Section};
