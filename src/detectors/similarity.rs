//! The four clone-type similarity metrics and their weighted combination.
//!
//! Every metric scores two representations of the same kind against each
//! other with the longest-matching-blocks ratio from
//! [`crate::core::sequences`], normalized to [0.0, 1.0]:
//!
//! - Type-1: characters of the lexically normalized texts
//! - Type-2: characters of the identifier-normalized texts
//! - Type-3: token sequences of the structure-normalized texts
//! - Type-4: structural tag signatures derived from the raw sources

use crate::core::config::SimilarityWeights;
use crate::core::sequences::{sequence_ratio, text_ratio};
use crate::detectors::normalize::SourceNormalizer;
use crate::lang::python::PythonAdapter;

/// Type-1 similarity: identical logic differing only in whitespace and
/// comments. Compares lexically normalized text character by character.
pub fn type1_similarity(lexical_a: &str, lexical_b: &str) -> f64 {
    text_ratio(lexical_a, lexical_b)
}

/// Type-2 similarity: identical structure with renamed identifiers.
/// Compares identifier-normalized text character by character.
pub fn type2_similarity(identifier_a: &str, identifier_b: &str) -> f64 {
    text_ratio(identifier_a, identifier_b)
}

/// Type-3 similarity: loop-kind-invariant structural match.
///
/// Re-tokenizes the structure-normalized texts and compares the token
/// sequences, so spacing inside the rewritten text cannot affect the
/// score.
pub fn type3_similarity(
    normalizer: &mut SourceNormalizer,
    structural_a: &str,
    structural_b: &str,
) -> f64 {
    let tokens_a = normalizer.structure_tokens(structural_a);
    let tokens_b = normalizer.structure_tokens(structural_b);
    sequence_ratio(&tokens_a, &tokens_b)
}

/// Type-4 similarity: pure tree-shape similarity, independent of any
/// lexical normalization. Derives both structural signatures from the raw
/// sources internally.
pub fn type4_similarity(adapter: &mut PythonAdapter, raw_a: &str, raw_b: &str) -> f64 {
    let signature_a = adapter.structural_signature(raw_a);
    let signature_b = adapter.structural_signature(raw_b);
    signature_similarity(&signature_a, &signature_b)
}

/// Ratio over two already-derived structural tag signatures.
///
/// Two empty signatures (both inputs unparseable) score 1.0; an empty
/// signature against any non-empty one scores 0.0.
pub fn signature_similarity(signature_a: &[String], signature_b: &[String]) -> f64 {
    sequence_ratio(signature_a, signature_b)
}

/// Case-folded similarity between two function names.
pub fn function_name_similarity(name_a: &str, name_b: &str) -> f64 {
    text_ratio(&name_a.to_lowercase(), &name_b.to_lowercase())
}

/// Weighted combination of the four scores.
///
/// Returns the weighted mean renormalized by the weight sum, or exactly
/// 0.0 when the sum is non-positive. Weights need no normalization at the
/// call site.
pub fn combined_similarity(
    t1: f64,
    t2: f64,
    t3: f64,
    t4: f64,
    weights: &SimilarityWeights,
) -> f64 {
    let total = weights.total();
    if total <= 0.0 {
        return 0.0;
    }

    (weights.type1 * t1 + weights.type2 * t2 + weights.type3 * t3 + weights.type4 * t4) / total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::normalize::NormalizedForms;

    fn normalizer() -> SourceNormalizer {
        SourceNormalizer::new().unwrap()
    }

    #[test]
    fn test_each_metric_is_reflexive() {
        let mut norm = normalizer();
        let source = "def f(x):\n    for i in range(x):\n        yield i\n";
        let forms = NormalizedForms::derive(&mut norm, source);

        assert_eq!(type1_similarity(&forms.lexical, &forms.lexical), 1.0);
        assert_eq!(type2_similarity(&forms.identifier, &forms.identifier), 1.0);
        assert_eq!(
            type3_similarity(&mut norm, &forms.structural, &forms.structural),
            1.0
        );
        assert_eq!(
            type4_similarity(norm.adapter_mut(), source, source),
            1.0
        );
    }

    #[test]
    fn test_renaming_lowers_type1_but_not_type2() {
        let mut norm = normalizer();
        let original = "def f(a, b):\n    total = a + b\n    return total\n";
        let renamed = "def g(x, y):\n    result = x + y\n    return result\n";

        let forms_a = NormalizedForms::derive(&mut norm, original);
        let forms_b = NormalizedForms::derive(&mut norm, renamed);

        assert!(type1_similarity(&forms_a.lexical, &forms_b.lexical) < 1.0);
        assert_eq!(type2_similarity(&forms_a.identifier, &forms_b.identifier), 1.0);
    }

    #[test]
    fn test_loop_kind_change_keeps_type3_high() {
        let mut norm = normalizer();
        let with_for = "for i in items:\n    handle(i)\n";
        let with_while = "while i in items:\n    handle(i)\n";

        let forms_a = NormalizedForms::derive(&mut norm, with_for);
        let forms_b = NormalizedForms::derive(&mut norm, with_while);

        let t3 = type3_similarity(&mut norm, &forms_a.structural, &forms_b.structural);
        assert_eq!(t3, 1.0);
    }

    #[test]
    fn test_type4_empty_signature_special_cases() {
        let mut norm = normalizer();
        let adapter = norm.adapter_mut();

        let broken = "def broken(:\n";
        let valid = "x = 1\n";

        // Both unparseable: vacuously identical.
        assert_eq!(type4_similarity(adapter, broken, broken), 1.0);
        // Unparseable against parseable: no shape overlap at all.
        assert_eq!(type4_similarity(adapter, broken, valid), 0.0);
    }

    #[test]
    fn test_signature_similarity_tag_sequences() {
        let a = ["MODULE", "FUNC", "LOOP", "CALL"].map(String::from);
        let b = ["MODULE", "FUNC", "LOOP", "RETURN"].map(String::from);
        assert_eq!(signature_similarity(&a, &b), 0.75);
    }

    #[test]
    fn test_function_name_similarity_is_case_folded() {
        assert_eq!(function_name_similarity("ProcessData", "processdata"), 1.0);
        assert!(function_name_similarity("alpha", "omega") < 1.0);
    }

    #[test]
    fn test_combined_with_zero_weights_is_zero() {
        let weights = SimilarityWeights::new(0.0, 0.0, 0.0, 0.0);
        assert_eq!(combined_similarity(1.0, 1.0, 1.0, 1.0, &weights), 0.0);
    }

    #[test]
    fn test_combined_with_equal_weights_is_the_mean() {
        let weights = SimilarityWeights::default();
        let combined = combined_similarity(0.2, 0.4, 0.6, 0.8, &weights);
        assert!((combined - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_combined_renormalizes_unnormalized_weights() {
        let weights = SimilarityWeights::new(2.0, 2.0, 2.0, 2.0);
        let combined = combined_similarity(0.2, 0.4, 0.6, 0.8, &weights);
        assert!((combined - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_combined_stays_in_unit_interval() {
        let weights = SimilarityWeights::new(10.0, 0.0, 0.5, 3.0);
        let combined = combined_similarity(1.0, 0.0, 1.0, 1.0, &weights);
        assert!((0.0..=1.0).contains(&combined));
    }
}
