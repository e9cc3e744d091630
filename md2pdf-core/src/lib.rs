#![doc = "md2pdf-core: core logic library for md2pdf."]

//! This crate contains every transformation that turns an ordered set of
//! Markdown files into one cross-referenced document, the manifest model, and
//! the contracts (plus production implementations) for the external tools
//! that render it to PDF.
//!
//! # Usage
//! Drive a whole build with [`pipeline::build_pdf`], or only assemble the
//! Markdown with [`pipeline::assemble_manifest`]. Individual stages are public
//! for reuse and testing.

pub mod anchors;
pub mod config;
pub mod contract;
pub mod cover;
pub mod diagnostics;
pub mod error;
pub mod fixups;
pub mod hyphenate;
pub mod images;
pub mod inline;
pub mod links;
pub mod pipeline;
pub mod render;
pub mod scan;
pub mod slug;
pub mod tables;
