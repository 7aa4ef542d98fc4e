//! # regchunk
//!
//! Structure-aware chunking of regulatory texts (GDPR, HIPAA, and similar)
//! for retrieval pipelines.
//!
//! The parsing and chunking logic lives in the I/O-free
//! [`regchunk_core`] crate. This crate adds the application layer: TOML
//! configuration, PDF/DOCX extraction, directory ingestion, JSON/JSONL
//! export, and the `regchunk` CLI.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────────┐   ┌───────────────────────┐   ┌────────────┐
//! │ txt/md/pdf/ │──▶│ StructuralParser │──▶│ BoundaryAwareChunker  │──▶│ ChunkSink  │
//! │ docx files  │   │ dialect sections │   │ sentences + context   │   │ JSON/JSONL │
//! └─────────────┘   └──────────────────┘   └───────────────────────┘   └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! regchunk detect gdpr.txt                 # which dialect?
//! regchunk sections hipaa.pdf              # section outline
//! regchunk chunk gdpr.txt --format jsonl   # chunks to stdout
//! regchunk ingest ./regulations --output chunks.jsonl
//! regchunk stats hipaa.txt
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`extract`] | PDF/DOCX text extraction |
//! | [`ingest`] | Per-document pipeline and directory ingestion |
//! | [`export`] | JSON/JSONL chunk sinks and the `chunk` command |
//! | [`inspect`] | `detect` and `sections` commands |
//! | [`stats`] | Chunk statistics |
//! | [`tokenizer`] | Cost estimator selection |

pub mod config;
pub mod export;
pub mod extract;
pub mod ingest;
pub mod inspect;
pub mod stats;
pub mod tokenizer;
