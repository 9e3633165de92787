//! End-to-end properties of the pairwise analysis pipeline.

use indexmap::IndexMap;

use mimicry_rs::core::sequences::text_ratio;
use mimicry_rs::detectors::normalize::{NormalizedForms, SourceNormalizer};
use mimicry_rs::detectors::similarity::{
    combined_similarity, type1_similarity, type2_similarity, type3_similarity, type4_similarity,
};
use mimicry_rs::lang::python::PythonAdapter;
use mimicry_rs::{analyze, AnalysisConfig, MimicryEngine, SimilarityWeights};

fn files(entries: &[(&str, &str)]) -> IndexMap<String, String> {
    entries
        .iter()
        .map(|&(name, source)| (name.to_string(), source.to_string()))
        .collect()
}

fn default_engine() -> MimicryEngine {
    MimicryEngine::new(AnalysisConfig::default()).unwrap()
}

#[test]
fn every_metric_scores_one_against_itself() {
    let mut normalizer = SourceNormalizer::new().unwrap();
    let sources = [
        "x = 1\n",
        "def f(a):\n    for i in range(a):\n        print(i)\n    return a\n",
        "class C:\n    def method(self):\n        while True:\n            break\n",
        "",
    ];

    for source in sources {
        let forms = NormalizedForms::derive(&mut normalizer, source);
        assert_eq!(type1_similarity(&forms.lexical, &forms.lexical), 1.0);
        assert_eq!(type2_similarity(&forms.identifier, &forms.identifier), 1.0);
        assert_eq!(
            type3_similarity(&mut normalizer, &forms.structural, &forms.structural),
            1.0
        );
        assert_eq!(type4_similarity(normalizer.adapter_mut(), source, source), 1.0);
    }
}

#[test]
fn all_scores_stay_in_unit_interval() {
    let corpus = files(&[
        ("a.py", "def add(a, b):\n    return a + b\n"),
        ("b.py", "def addition(left, right):\n    total = left + right\n    return total\n"),
        ("c.py", "import os\n\nclass Walker:\n    def walk(self):\n        for root in os.walk('.'):\n            yield root\n"),
        ("d.py", "broken(:\n"),
        ("e.py", ""),
    ]);

    let results = default_engine().analyze(&corpus);
    assert_eq!(results.file_pairs.len(), 10);

    for pair in &results.file_pairs {
        for score in [
            pair.scores.type1,
            pair.scores.type2,
            pair.scores.type3,
            pair.scores.type4,
            pair.scores.combined,
        ] {
            assert!(
                (0.0..=1.0).contains(&score),
                "score {score} out of range for {} vs {}",
                pair.file_a,
                pair.file_b
            );
        }
    }
    for pair in &results.function_pairs {
        assert!((0.0..=1.0).contains(&pair.scores.combined));
    }
}

#[test]
fn zero_weights_collapse_combined_to_zero() {
    for (t1, t2, t3, t4) in [(0.0, 0.0, 0.0, 0.0), (1.0, 1.0, 1.0, 1.0), (0.3, 0.9, 0.1, 0.7)] {
        let combined =
            combined_similarity(t1, t2, t3, t4, &SimilarityWeights::new(0.0, 0.0, 0.0, 0.0));
        assert_eq!(combined, 0.0);
    }
}

#[test]
fn equal_weights_give_the_arithmetic_mean() {
    let weights = SimilarityWeights::new(0.25, 0.25, 0.25, 0.25);
    let combined = combined_similarity(0.1, 0.3, 0.5, 0.9, &weights);
    assert!((combined - 0.45).abs() < 1e-12);
}

#[test]
fn consistent_renaming_separates_type1_from_type2() {
    let original = "\
def compute(values, factor):
    total = 0
    for value in values:
        total = total + value * factor
    return total
";
    let renamed = "\
def scale_sum(items, weight):
    acc = 0
    for item in items:
        acc = acc + item * weight
    return acc
";

    let results = analyze(
        &files(&[("original.py", original), ("renamed.py", renamed)]),
        SimilarityWeights::default(),
    )
    .unwrap();

    let pair = &results.file_pairs[0];
    assert!(pair.scores.type1 < 1.0, "type1 was {}", pair.scores.type1);
    assert_eq!(pair.scores.type2, 1.0);
}

#[test]
fn syntax_error_yields_empty_signature_semantics() {
    let mut adapter = PythonAdapter::new().unwrap();
    let broken = "def broken(:\n    return ???\n";

    let signature = adapter.structural_signature(broken);
    assert!(signature.is_empty());

    // Empty vs empty is vacuously identical; empty vs anything real is
    // completely dissimilar.
    assert_eq!(type4_similarity(&mut adapter, broken, broken), 1.0);
    assert_eq!(type4_similarity(&mut adapter, broken, "x = 1\n"), 0.0);
}

#[test]
fn nested_functions_produce_contained_spans() {
    let mut adapter = PythonAdapter::new().unwrap();
    let source = "\
def enclosing(data):
    def helper(item):
        return item * 2
    return [helper(d) for d in data]
";

    let spans = adapter.extract_functions(source, "nested.py");
    assert!(spans.len() >= 2);

    let enclosing = spans.iter().find(|s| s.name == "enclosing").unwrap();
    let helper = spans.iter().find(|s| s.name == "helper").unwrap();
    assert!(enclosing.start_line <= helper.start_line);
    assert!(helper.end_line <= enclosing.end_line);
}

#[test]
fn function_free_files_produce_only_file_pairs() {
    let corpus = files(&[
        ("one.py", "x = 1\n"),
        ("two.py", "y = 2\n"),
        ("three.py", "z = 3\n"),
        ("four.py", "w = 4\n"),
        ("five.py", "v = 5\n"),
    ]);

    let results = default_engine().analyze(&corpus);
    assert_eq!(results.file_pairs.len(), 5 * 4 / 2);
    assert!(results.function_pairs.is_empty());
}

#[test]
fn result_sets_are_sorted_non_increasing() {
    let corpus = files(&[
        ("a.py", "def f(x):\n    return x + 1\n"),
        ("b.py", "def f(x):\n    return x + 1\n"),
        ("c.py", "def g(y):\n    return y * 3\n"),
        ("d.py", "import sys\n\nprint(sys.argv)\n"),
    ]);

    let results = default_engine().analyze(&corpus);

    for window in results.file_pairs.windows(2) {
        assert!(window[0].scores.combined >= window[1].scores.combined);
    }
    for window in results.function_pairs.windows(2) {
        assert!(window[0].scores.combined >= window[1].scores.combined);
    }
}

#[test]
fn function_pairs_carry_original_source_slices() {
    let corpus = files(&[
        ("a.py", "def f():  # original comment\n    return 1\n"),
        ("b.py", "def g():\n    return 1\n"),
    ]);

    let results = default_engine().analyze(&corpus);
    assert_eq!(results.function_pairs.len(), 1);

    let pair = &results.function_pairs[0];
    assert_eq!(pair.function_a, "f");
    assert_eq!(pair.function_b, "g");
    assert_eq!(pair.name_similarity, 0.0);
    // Display layers need the exact original slice, comments included.
    assert!(pair.source_a.contains("# original comment"));
}

#[test]
fn weights_shift_the_ranking() {
    // Same shape, fully different identifiers and spacing: type4 is the
    // only metric scoring the disguise highly.
    let corpus = files(&[
        ("plain.py", "def f(a):\n    for i in a:\n        print(i)\n"),
        ("disguised.py", "def renamed_fn(seq):\n    for element in seq:\n        print(element)\n"),
    ]);

    let structural_only = analyze(&corpus, SimilarityWeights::new(0.0, 0.0, 0.0, 1.0)).unwrap();
    let textual_only = analyze(&corpus, SimilarityWeights::new(1.0, 0.0, 0.0, 0.0)).unwrap();

    let structural_score = structural_only.file_pairs[0].scores.combined;
    let textual_score = textual_only.file_pairs[0].scores.combined;
    assert!(structural_score > textual_score);
    assert_eq!(structural_score, 1.0);
}

#[test]
fn empty_inputs_are_maximally_similar() {
    let results = default_engine().analyze(&files(&[("a.py", ""), ("b.py", "")]));
    let pair = &results.file_pairs[0];
    assert_eq!(pair.scores.type1, 1.0);
    assert_eq!(pair.scores.type2, 1.0);
    assert_eq!(pair.scores.type3, 1.0);
    assert_eq!(pair.scores.type4, 1.0);
    assert_eq!(pair.scores.combined, 1.0);
}

#[test]
fn ratio_is_symmetric_across_representative_sources() {
    let samples = [
        ("def f(): return 1", "def g(): return 2"),
        ("for i in x:\n    pass", "while x:\n    pass"),
        ("", "anything"),
    ];
    for (a, b) in samples {
        assert_eq!(text_ratio(a, b), text_ratio(b, a));
    }
}
