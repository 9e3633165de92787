//! Analysis result structures.
//!
//! Everything here is plain serializable data: the four component scores,
//! the combined score, and the identifiers (plus original source slices
//! for function pairs) that any rendering layer needs — table view, CSV
//! export, or side-by-side diff — without further computation.

use serde::{Deserialize, Serialize};

/// The four component scores and their weighted combination for one pair.
///
/// Every score lies in [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityScores {
    /// Type-1 score (identical modulo formatting)
    pub type1: f64,

    /// Type-2 score (identical modulo renaming)
    pub type2: f64,

    /// Type-3 score (identical modulo loop kind)
    pub type3: f64,

    /// Type-4 score (tree-shape only)
    pub type4: f64,

    /// Weighted combination of the four scores
    pub combined: f64,
}

/// Comparison result for one unordered file pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilePairResult {
    /// Name of the first file
    pub file_a: String,

    /// Name of the second file
    pub file_b: String,

    /// Component and combined scores
    #[serde(flatten)]
    pub scores: SimilarityScores,
}

/// Comparison result for one cross-file function pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionPairResult {
    /// File containing the first function
    pub file_a: String,

    /// Name of the first function
    pub function_a: String,

    /// File containing the second function
    pub file_b: String,

    /// Name of the second function
    pub function_b: String,

    /// Component and combined scores
    #[serde(flatten)]
    pub scores: SimilarityScores,

    /// Case-folded similarity between the two function names. Reported
    /// alongside the scores but never folded into `combined`: a disguised
    /// copy usually renames the function too.
    pub name_similarity: f64,

    /// Original source slice of the first function, for display layers
    pub source_a: String,

    /// Original source slice of the second function, for display layers
    pub source_b: String,
}

/// Complete output of one analysis run.
///
/// Both sequences are sorted non-increasing by combined score, ties broken
/// by original enumeration order, so output is reproducible across runs on
/// identical input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResults {
    /// All unique unordered file pair results
    pub file_pairs: Vec<FilePairResult>,

    /// All cross-file function pair results
    pub function_pairs: Vec<FunctionPairResult>,
}

impl AnalysisResults {
    /// Empty result set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Summarize the result set for logging and report headers.
    pub fn summary(&self) -> AnalysisSummary {
        AnalysisSummary {
            file_pairs: self.file_pairs.len(),
            function_pairs: self.function_pairs.len(),
            max_file_similarity: self
                .file_pairs
                .first()
                .map(|pair| pair.scores.combined)
                .unwrap_or(0.0),
            max_function_similarity: self
                .function_pairs
                .first()
                .map(|pair| pair.scores.combined)
                .unwrap_or(0.0),
        }
    }
}

/// Headline numbers for one analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    /// Number of file pairs compared
    pub file_pairs: usize,

    /// Number of cross-file function pairs compared
    pub function_pairs: usize,

    /// Highest combined file-pair score (0.0 when no pairs)
    pub max_file_similarity: f64,

    /// Highest combined function-pair score (0.0 when no pairs)
    pub max_function_similarity: f64,
}
