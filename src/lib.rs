//! # Mimicry-RS: Multi-Representation Source Similarity Engine
//!
//! Detects near-duplicate and disguised-copy relationships between Python
//! source files, and between individual functions across files, by scoring
//! every pair under four independent notions of similarity and combining
//! them into one ranking value:
//!
//! - **Type-1**: identical logic differing only in whitespace/comments
//! - **Type-2**: identical structure with renamed identifiers
//! - **Type-3**: structural match invariant to loop kind
//! - **Type-4**: pure syntax-tree shape similarity
//!
//! ## Design
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                        API Layer                           │
//! ├────────────────────────────────────────────────────────────┤
//! │  Core          │  Detectors      │  Language Adapters      │
//! │ • Alignment    │ • Normalizers   │ • Python (tree-sitter)  │
//! │ • Config       │ • Metrics       │   tokens / signatures / │
//! │ • Errors       │ • Combiner      │   function spans        │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! The pipeline is stateless and side-effect free per pair: each file's
//! derived forms are computed once per analysis run and read-only
//! afterwards, so the O(n²) pair products parallelize with no
//! synchronization beyond the final merge-and-sort. No input, however
//! malformed, fails a run — lexical failures degrade to a whitespace token
//! split and parse failures to empty signatures and function lists.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use indexmap::IndexMap;
//! use mimicry_rs::{MimicryEngine, AnalysisConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = MimicryEngine::new(AnalysisConfig::default())?;
//!
//!     let mut files = IndexMap::new();
//!     files.insert("a.py".to_string(), "def f(x):\n    return x\n".to_string());
//!     files.insert("b.py".to_string(), "def g(y):\n    return y\n".to_string());
//!
//!     let results = engine.analyze(&files);
//!     println!("{} file pairs compared", results.file_pairs.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

// Core algorithms and shared infrastructure
pub mod core {
    //! Core algorithms, configuration, and error handling.

    pub mod config;
    pub mod errors;
    pub mod sequences;
}

// Similarity detection algorithms
pub mod detectors {
    //! Normalization stages and similarity metrics.

    pub mod normalize;
    pub mod similarity;
}

// Language-specific AST adapters
pub mod lang {
    //! Language-specific parsing and token/signature extraction.

    pub mod python;
}

// Public API and engine interface
pub mod api {
    //! High-level API and engine interface.

    pub mod engine;
    pub mod results;
}

// Re-export primary types for convenience
pub use api::engine::{analyze, MimicryEngine};
pub use api::results::{AnalysisResults, FilePairResult, FunctionPairResult, SimilarityScores};
pub use core::config::{AnalysisConfig, SimilarityWeights};
pub use core::errors::{MimicryError, Result};
pub use lang::python::FunctionSpan;

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
