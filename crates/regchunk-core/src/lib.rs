//! # regchunk core
//!
//! Pure, I/O-free logic for regchunk: the structural parser that turns
//! regulatory text into typed, parent-linked [`models::Section`]s, and the
//! boundary-aware chunker that turns sections into size-bounded
//! [`models::Chunk`]s with borrowed lead/trail context.
//!
//! This crate contains no tokio, filesystem, or network dependencies. Every
//! operation is a pure function of its arguments, so callers may parse and
//! chunk independent documents on separate threads and reassemble the
//! results in document order.
//!
//! ```rust
//! use regchunk_core::chunk::BoundaryAwareChunker;
//! use regchunk_core::parser::StructuralParser;
//!
//! let text = "PART 160—GENERAL ADMINISTRATIVE REQUIREMENTS\n\
//!             § 160.101 Statutory basis.\n\
//!             The requirements of this subchapter implement the Act.";
//! let sections = StructuralParser::default().parse(text, None).unwrap();
//! let chunks = BoundaryAwareChunker::with_defaults().chunk_sections(&sections).unwrap();
//! assert_eq!(chunks.len(), 2);
//! assert_eq!(chunks[1].source_section.section_id, "160.101");
//! ```

pub mod chunk;
pub mod clean;
pub mod context;
pub mod cost;
pub mod dialect;
pub mod error;
pub mod models;
pub mod parser;
pub mod sentence;
pub mod store;
