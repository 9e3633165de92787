//! Progressive source normalization for clone-type comparison.
//!
//! Three pure transforms, each building on the previous one:
//!
//! 1. **Lexical** — comments and blank lines removed, token spelling and
//!    order preserved (Type-1 clones: identical modulo formatting).
//! 2. **Identifier** — every identifier replaced by a per-call placeholder
//!    (Type-2 clones: identical modulo renaming).
//! 3. **Structure** — loop-introducing keywords collapsed to one canonical
//!    marker (Type-3 clones: identical modulo loop kind).
//!
//! Each transform is idempotent on its own output and degrades to a
//! best-effort textual substitution when no syntax tree is available.

use aho_corasick::{AhoCorasick, MatchKind};
use indexmap::IndexMap;
use once_cell::sync::Lazy;

use crate::core::errors::Result;
use crate::lang::python::PythonAdapter;

/// Canonical replacement for loop-introducing keywords.
pub const LOOP_MARK: &str = "LOOP";

/// Python keywords, excluded from identifier replacement in the degraded
/// textual path (the tree path never sees them as identifiers).
const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

static LOOP_KEYWORDS: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .match_kind(MatchKind::LeftmostLongest)
        .build(["while", "for"])
        .expect("fixed keyword patterns always compile")
});

/// Mapping from original identifier spelling to generated placeholder.
///
/// Scoped to exactly one normalization call and never shared across files
/// or functions: placeholder order is first-occurrence order under a
/// left-to-right scan, starting at `ID0`, so the normalized form of an
/// input is deterministic and independent of any other input.
#[derive(Debug, Clone, Default)]
pub struct IdentifierMap {
    map: IndexMap<String, String>,
}

impl IdentifierMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the placeholder for `name`, allocating the next `IDn` on
    /// first occurrence.
    pub fn placeholder(&mut self, name: &str) -> String {
        if let Some(existing) = self.map.get(name) {
            return existing.clone();
        }
        let generated = format!("ID{}", self.map.len());
        self.map.insert(name.to_string(), generated.clone());
        generated
    }

    /// Look up an already-allocated placeholder.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.map.get(name).map(String::as_str)
    }

    /// Number of distinct identifiers seen.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True when no identifier has been seen.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterate `(original, placeholder)` pairs in first-occurrence order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// The three derived textual forms of one source input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedForms {
    /// Lexically normalized text (comments and blank lines removed)
    pub lexical: String,

    /// Identifier-normalized text (placeholders spliced over identifiers)
    pub identifier: String,

    /// Structure-normalized text (loop keywords collapsed)
    pub structural: String,
}

impl NormalizedForms {
    /// Derive all three forms for one source input, chaining the
    /// normalizers in order.
    pub fn derive(normalizer: &mut SourceNormalizer, source: &str) -> Self {
        let lexical = normalizer.lexical_normalize(source);
        let (identifier, _) = normalizer.identifier_normalize(&lexical);
        let structural = normalize_loops(&identifier);

        Self {
            lexical,
            identifier,
            structural,
        }
    }

    /// Derive the forms without a parser, using the textual fallbacks only.
    pub fn derive_degraded(source: &str) -> Self {
        let lexical = strip_comments_textual(source);
        let mut map = IdentifierMap::new();
        let identifier = substitute_identifiers_textual(&lexical, &mut map);
        let structural = normalize_loops(&identifier);

        Self {
            lexical,
            identifier,
            structural,
        }
    }
}

/// Stateful normalizer owning the Python parser it re-tokenizes with.
pub struct SourceNormalizer {
    adapter: PythonAdapter,
}

impl SourceNormalizer {
    /// Create a normalizer with a fresh parser.
    pub fn new() -> Result<Self> {
        Ok(Self {
            adapter: PythonAdapter::new()?,
        })
    }

    /// Remove comments and blank lines, preserving everything else.
    ///
    /// Comment and string byte ranges come from the syntax tree, so `#`
    /// inside string literals is untouched and blank lines inside
    /// triple-quoted literals stay part of the token. Falls back to a
    /// per-line textual strip when the parser yields no tree.
    pub fn lexical_normalize(&mut self, source: &str) -> String {
        let Some(ranges) = self.adapter.comment_ranges(source) else {
            return strip_comments_textual(source);
        };

        let without_comments = splice_out(source, &ranges);
        let strings = self
            .adapter
            .string_ranges(&without_comments)
            .unwrap_or_default();
        drop_blank_lines(&without_comments, &strings)
    }

    /// Replace every identifier with an [`IdentifierMap`] placeholder.
    ///
    /// Input is expected to be lexically normalized text. Replacement is
    /// spliced by byte range so layout is preserved; keywords, literals,
    /// operators and punctuation pass through unchanged. Falls back to a
    /// character-scan substitution when the parser yields no tree.
    pub fn identifier_normalize(&mut self, lexical_text: &str) -> (String, IdentifierMap) {
        let mut map = IdentifierMap::new();

        let Some(ranges) = self.adapter.identifier_ranges(lexical_text) else {
            let substituted = substitute_identifiers_textual(lexical_text, &mut map);
            return (substituted, map);
        };

        let mut out = String::with_capacity(lexical_text.len());
        let mut previous_end = 0;
        for &(start, end) in &ranges {
            out.push_str(&lexical_text[previous_end..start]);
            out.push_str(&map.placeholder(&lexical_text[start..end]));
            previous_end = end;
        }
        out.push_str(&lexical_text[previous_end..]);

        (out, map)
    }

    /// Derive the token sequence of the structure-normalized text.
    ///
    /// Type-3 comparison works on tokens rather than raw characters so
    /// spacing inside the rewritten text cannot affect the score.
    pub fn structure_tokens(&mut self, structural_text: &str) -> Vec<String> {
        self.adapter.tokenize(structural_text)
    }

    /// Access the underlying adapter for signature and span extraction.
    pub fn adapter_mut(&mut self) -> &mut PythonAdapter {
        &mut self.adapter
    }
}

/// Replace whole-word `for`/`while` (case-insensitive) with [`LOOP_MARK`].
pub fn normalize_loops(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut previous_end = 0;

    for found in LOOP_KEYWORDS.find_iter(text) {
        let start = found.start();
        let end = found.end();

        let bounded_left = start == 0 || !is_word_byte(bytes[start - 1]);
        let bounded_right = end == bytes.len() || !is_word_byte(bytes[end]);
        if !bounded_left || !bounded_right {
            continue;
        }

        out.push_str(&text[previous_end..start]);
        out.push_str(LOOP_MARK);
        previous_end = end;
    }

    out.push_str(&text[previous_end..]);
    out
}

fn is_word_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

/// Copy `text` minus the given (sorted, disjoint) byte ranges.
fn splice_out(text: &str, ranges: &[(usize, usize)]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_end = 0;
    for &(start, end) in ranges {
        out.push_str(&text[previous_end..start]);
        previous_end = end;
    }
    out.push_str(&text[previous_end..]);
    out
}

/// Drop lines that are blank after trailing-whitespace removal.
///
/// Lines intersecting a string literal are kept verbatim: a blank line
/// inside a triple-quoted literal is part of the token, not layout.
fn drop_blank_lines(text: &str, string_ranges: &[(usize, usize)]) -> String {
    let mut kept: Vec<&str> = Vec::new();
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let start = offset;
        offset += line.len();

        let body = line.strip_suffix('\n').unwrap_or(line);
        let end = start + body.len();

        if intersects_any(start, end, string_ranges) {
            kept.push(body);
        } else {
            let trimmed = body.trim_end();
            if !trimmed.is_empty() {
                kept.push(trimmed);
            }
        }
    }

    kept.join("\n")
}

/// True when the span `[start, end)` crosses any of the given byte ranges.
/// An empty span (a blank line) intersects when it sits strictly inside a
/// range.
fn intersects_any(start: usize, end: usize, ranges: &[(usize, usize)]) -> bool {
    if start == end {
        return ranges.iter().any(|&(s, e)| s < start && start < e);
    }
    ranges.iter().any(|&(s, e)| start < e && s < end)
}

/// Degraded comment strip: cut each line at its first `#`.
///
/// Loses `#`-inside-string fidelity, which is the documented cost of the
/// no-tree path.
fn strip_comments_textual(source: &str) -> String {
    let kept: Vec<&str> = source
        .lines()
        .map(|line| line.split('#').next().unwrap_or("").trim_end())
        .filter(|line| !line.is_empty())
        .collect();
    kept.join("\n")
}

/// Degraded identifier substitution: replace every identifier-grammar word
/// that is not a Python keyword.
fn substitute_identifiers_textual(text: &str, map: &mut IdentifierMap) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.char_indices().peekable();

    while let Some(&(start, ch)) = chars.peek() {
        if ch.is_ascii_alphabetic() || ch == '_' {
            let mut end = start;
            while let Some(&(idx, c)) = chars.peek() {
                if c.is_ascii_alphanumeric() || c == '_' {
                    end = idx + c.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }

            let word = &text[start..end];
            if PYTHON_KEYWORDS.contains(&word) {
                out.push_str(word);
            } else {
                out.push_str(&map.placeholder(word));
            }
        } else {
            out.push(ch);
            chars.next();
        }
    }

    out
}
