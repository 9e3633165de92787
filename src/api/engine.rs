//! Pairwise comparison engine.
//!
//! Orchestrates the full pipeline: derive each file's representations once,
//! score every unique unordered file pair, extract functions, score the
//! cross-file function product, and sort both result sets. Per-pair scoring
//! is pure and side-effect free, so both products are distributed across
//! rayon workers; the final ordering is a pure function of the collected
//! result set and is identical under any scheduling.
//!
//! No step raises on malformed input: the fail-open tokenizer, signature
//! extractor and function extractor propagate degraded-but-present values
//! instead.

use std::cmp::Ordering;

use indexmap::IndexMap;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::api::results::{AnalysisResults, FilePairResult, FunctionPairResult, SimilarityScores};
use crate::core::config::{AnalysisConfig, SimilarityWeights};
use crate::core::errors::Result;
use crate::core::sequences::sequence_ratio;
use crate::detectors::normalize::{NormalizedForms, SourceNormalizer};
use crate::detectors::similarity::{
    combined_similarity, function_name_similarity, signature_similarity, type1_similarity,
    type2_similarity,
};
use crate::lang::python::FunctionSpan;

/// Everything the four metrics need for one comparison subject, derived
/// once and read-only afterwards. Scoped to a single `analyze` call.
struct Representations {
    forms: NormalizedForms,
    structure_tokens: Vec<String>,
    signature: Vec<String>,
}

struct PreparedFunction {
    span: FunctionSpan,
    repr: Representations,
}

struct PreparedFile {
    name: String,
    repr: Representations,
    functions: Vec<PreparedFunction>,
}

/// Main similarity analysis engine.
pub struct MimicryEngine {
    config: AnalysisConfig,
}

impl MimicryEngine {
    /// Create an engine with the given configuration.
    ///
    /// Validates the configuration and probes parser construction up front
    /// so a broken grammar surfaces here rather than silently degrading
    /// every worker.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        SourceNormalizer::new()?;

        Ok(Self { config })
    }

    /// Create an engine from a bare weight vector with default settings
    /// otherwise.
    pub fn with_weights(weights: SimilarityWeights) -> Result<Self> {
        Self::new(AnalysisConfig {
            weights,
            ..AnalysisConfig::default()
        })
    }

    /// The engine's configuration.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Compare every unique unordered file pair and every cross-file
    /// function pair.
    ///
    /// `files` maps unique file name to full source text; its insertion
    /// order defines the enumeration order used for tie-breaking. Never
    /// fails: malformed sources produce degraded scores, not errors.
    pub fn analyze(&self, files: &IndexMap<String, String>) -> AnalysisResults {
        info!("Starting similarity analysis of {} files", files.len());

        let entries: Vec<(&str, &str)> = files
            .iter()
            .map(|(name, source)| (name.as_str(), source.as_str()))
            .collect();

        // Derivation is per-file independent; each worker owns its parser.
        let prepared: Vec<PreparedFile> = entries
            .par_iter()
            .map(|&(name, source)| prepare_file(name, source))
            .collect();

        let mut file_pairs = self.compare_files(&prepared);
        let mut function_pairs = self.compare_functions(&prepared);

        sort_by_combined_descending(&mut file_pairs, |pair| pair.scores.combined);
        sort_by_combined_descending(&mut function_pairs, |pair| pair.scores.combined);

        info!(
            "Analysis complete: {} file pairs, {} function pairs",
            file_pairs.len(),
            function_pairs.len()
        );

        AnalysisResults {
            file_pairs,
            function_pairs,
        }
    }

    fn compare_files(&self, prepared: &[PreparedFile]) -> Vec<FilePairResult> {
        let weights = &self.config.weights;
        let pairs = unique_pairs(prepared.len());

        pairs
            .par_iter()
            .map(|&(i, j)| {
                let a = &prepared[i];
                let b = &prepared[j];
                FilePairResult {
                    file_a: a.name.clone(),
                    file_b: b.name.clone(),
                    scores: score_pair(&a.repr, &b.repr, weights),
                }
            })
            .collect()
    }

    fn compare_functions(&self, prepared: &[PreparedFile]) -> Vec<FunctionPairResult> {
        let weights = &self.config.weights;
        // Full cross product per file pair; functions are never compared
        // against functions in their own file.
        let mut crosses = Vec::new();
        for (i, j) in unique_pairs(prepared.len()) {
            for fa in 0..prepared[i].functions.len() {
                for fb in 0..prepared[j].functions.len() {
                    crosses.push((i, fa, j, fb));
                }
            }
        }

        crosses
            .par_iter()
            .map(|&(i, fa, j, fb)| {
                let a = &prepared[i].functions[fa];
                let b = &prepared[j].functions[fb];
                FunctionPairResult {
                    file_a: a.span.file.clone(),
                    function_a: a.span.name.clone(),
                    file_b: b.span.file.clone(),
                    function_b: b.span.name.clone(),
                    scores: score_pair(&a.repr, &b.repr, weights),
                    name_similarity: function_name_similarity(&a.span.name, &b.span.name),
                    source_a: a.span.source.clone(),
                    source_b: b.span.source.clone(),
                }
            })
            .collect()
    }
}

/// Convenience entry point: analyze with explicit weights and defaults
/// otherwise.
pub fn analyze(
    files: &IndexMap<String, String>,
    weights: SimilarityWeights,
) -> Result<AnalysisResults> {
    Ok(MimicryEngine::with_weights(weights)?.analyze(files))
}

/// All unique unordered index pairs `(i, j)` with `i < j`, in enumeration
/// order.
fn unique_pairs(count: usize) -> Vec<(usize, usize)> {
    let mut pairs = Vec::with_capacity(count.saturating_sub(1) * count / 2);
    for i in 0..count {
        for j in (i + 1)..count {
            pairs.push((i, j));
        }
    }
    pairs
}

fn prepare_file(name: &str, source: &str) -> PreparedFile {
    match SourceNormalizer::new() {
        Ok(mut normalizer) => {
            let repr = derive_representations(&mut normalizer, source);
            let spans = normalizer.adapter_mut().extract_functions(source, name);
            debug!(
                "Prepared {name}: {} signature tags, {} functions",
                repr.signature.len(),
                spans.len()
            );

            let functions = spans
                .into_iter()
                .map(|span| {
                    // Normalization is re-scoped to the function's own
                    // source slice; identifier placeholders restart at ID0.
                    let repr = derive_representations(&mut normalizer, &span.source);
                    PreparedFunction { span, repr }
                })
                .collect();

            PreparedFile {
                name: name.to_string(),
                repr,
                functions,
            }
        }
        Err(error) => {
            warn!("Parser unavailable for {name}, using degraded text forms: {error}");
            let forms = NormalizedForms::derive_degraded(source);
            let structure_tokens = forms
                .structural
                .split_whitespace()
                .map(str::to_string)
                .collect();

            PreparedFile {
                name: name.to_string(),
                repr: Representations {
                    forms,
                    structure_tokens,
                    signature: Vec::new(),
                },
                functions: Vec::new(),
            }
        }
    }
}

fn derive_representations(normalizer: &mut SourceNormalizer, source: &str) -> Representations {
    let forms = NormalizedForms::derive(normalizer, source);
    let structure_tokens = normalizer.structure_tokens(&forms.structural);
    let signature = normalizer.adapter_mut().structural_signature(source);

    Representations {
        forms,
        structure_tokens,
        signature,
    }
}

fn score_pair(
    a: &Representations,
    b: &Representations,
    weights: &SimilarityWeights,
) -> SimilarityScores {
    let type1 = type1_similarity(&a.forms.lexical, &b.forms.lexical);
    let type2 = type2_similarity(&a.forms.identifier, &b.forms.identifier);
    let type3 = sequence_ratio(&a.structure_tokens, &b.structure_tokens);
    let type4 = signature_similarity(&a.signature, &b.signature);

    SimilarityScores {
        type1,
        type2,
        type3,
        type4,
        combined: combined_similarity(type1, type2, type3, type4, weights),
    }
}

/// Stable descending sort by combined score; stability preserves the
/// original pair enumeration order on ties.
fn sort_by_combined_descending<T>(items: &mut [T], combined: impl Fn(&T) -> f64) {
    items.sort_by(|x, y| {
        combined(y)
            .partial_cmp(&combined(x))
            .unwrap_or(Ordering::Equal)
    });
}
