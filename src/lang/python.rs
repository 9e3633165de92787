//! Python language adapter with tree-sitter integration.
//!
//! Provides the three syntax-level views the similarity pipeline needs:
//! a lexical token stream, a structural tag signature, and per-function
//! source spans. All three are fail-open: malformed source degrades to a
//! whitespace token split, an empty signature, or an empty span list
//! rather than an error.

use serde::{Deserialize, Serialize};
use tree_sitter::{Node, Parser, Tree};

use crate::core::errors::{MimicryError, Result};

/// Canonical end-of-statement marker emitted by the tokenizer.
///
/// Runs of statement terminators (blank lines, line continuations) collapse
/// into a single marker so they do not perturb sequence comparison.
pub const STATEMENT_MARK: &str = "<NL>";

/// One extracted function or method definition.
///
/// Nested definitions are extracted as additional independent spans, so two
/// spans from the same file may have overlapping line ranges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSpan {
    /// Name of the file the function was extracted from
    pub file: String,

    /// Function name as written in the `def` statement
    pub name: String,

    /// 1-based first line of the definition
    pub start_line: usize,

    /// 1-based last line of the definition
    pub end_line: usize,

    /// Exact original source slice for the line range, preserving
    /// formatting and comments for downstream display
    pub source: String,
}

/// Python-specific parsing: tokens, structural signatures, function spans.
pub struct PythonAdapter {
    /// Tree-sitter parser for Python
    parser: Parser,
}

impl PythonAdapter {
    /// Create a new Python adapter
    pub fn new() -> Result<Self> {
        let language = tree_sitter_python::LANGUAGE.into();
        let mut parser = Parser::new();
        parser.set_language(&language).map_err(|e| {
            MimicryError::parse("python", format!("Failed to set Python language: {e:?}"))
        })?;

        Ok(Self { parser })
    }

    fn parse(&mut self, source: &str) -> Option<Tree> {
        self.parser.parse(source, None)
    }

    /// Tokenize source into an ordered sequence of lexical tokens.
    ///
    /// Comments and insignificant whitespace are excluded; each statement
    /// boundary contributes exactly one [`STATEMENT_MARK`]. When the parser
    /// produces no tree at all, falls back to a naive whitespace split so
    /// the call always returns some sequence.
    pub fn tokenize(&mut self, source: &str) -> Vec<String> {
        match self.parse(source) {
            Some(tree) => {
                let mut tokens = Vec::new();
                collect_tokens(tree.root_node(), source, &mut tokens);
                tokens
            }
            None => source.split_whitespace().map(str::to_string).collect(),
        }
    }

    /// Byte ranges of every comment in the source, in document order.
    ///
    /// Empty when the parser yields no tree; the caller is expected to fall
    /// back to a textual comment strip in that case.
    pub fn comment_ranges(&mut self, source: &str) -> Option<Vec<(usize, usize)>> {
        let tree = self.parse(source)?;
        let mut ranges = Vec::new();
        collect_kind_ranges(tree.root_node(), "comment", &mut ranges);
        Some(ranges)
    }

    /// Byte ranges of every string literal, in document order.
    ///
    /// Each range covers the whole literal including its quotes, so the
    /// caller can treat the token as atomic (interior newlines included).
    pub fn string_ranges(&mut self, source: &str) -> Option<Vec<(usize, usize)>> {
        let tree = self.parse(source)?;
        let mut ranges = Vec::new();
        collect_kind_ranges(tree.root_node(), "string", &mut ranges);
        Some(ranges)
    }

    /// Byte ranges of every identifier token, in left-to-right order.
    ///
    /// Keywords are anonymous tokens in the grammar and are not included,
    /// so `def`, `return` and friends survive identifier normalization.
    pub fn identifier_ranges(&mut self, source: &str) -> Option<Vec<(usize, usize)>> {
        let tree = self.parse(source)?;
        let mut ranges = Vec::new();
        collect_kind_ranges(tree.root_node(), "identifier", &mut ranges);
        Some(ranges)
    }

    /// Emit the structural tag signature for the source.
    ///
    /// A single canonical pre-order walk over the syntax tree, one tag per
    /// node from the closed classification in [`node_tag`]. Returns an
    /// empty sequence on parse failure so one malformed file cannot abort
    /// a batch comparison.
    pub fn structural_signature(&mut self, source: &str) -> Vec<String> {
        let Some(tree) = self.parse(source) else {
            return Vec::new();
        };
        if tree.root_node().has_error() {
            return Vec::new();
        }

        let mut tags = Vec::new();
        collect_signature(tree.root_node(), &mut tags);
        tags
    }

    /// Extract every function/method definition, including nested ones.
    ///
    /// Each span slices the exact original line range. Returns an empty
    /// list on parse failure.
    pub fn extract_functions(&mut self, source: &str, file_name: &str) -> Vec<FunctionSpan> {
        let Some(tree) = self.parse(source) else {
            return Vec::new();
        };
        if tree.root_node().has_error() {
            return Vec::new();
        }

        let lines: Vec<&str> = source.lines().collect();
        let mut spans = Vec::new();
        collect_functions(tree.root_node(), source, file_name, &lines, &mut spans);
        spans
    }
}

/// Classify a syntax-tree node kind into its structural tag.
///
/// Loop constructs, definitions, conditionals, calls, assignments,
/// comprehensions, operators, comparisons, return/yield, exception
/// handling, context managers, imports, attribute access, name references
/// and literal constants each map to a fixed tag; anything else maps to the
/// uppercased node kind.
fn node_tag(kind: &str) -> String {
    match kind {
        "for_statement" | "while_statement" => "LOOP".to_string(),
        "function_definition" => "FUNC".to_string(),
        "if_statement" | "elif_clause" | "conditional_expression" => "IF".to_string(),
        "call" => "CALL".to_string(),
        "assignment" | "augmented_assignment" => "ASSIGN".to_string(),
        "list_comprehension" | "set_comprehension" | "dictionary_comprehension"
        | "generator_expression" => "COMP".to_string(),
        "binary_operator" => "BINOP".to_string(),
        "unary_operator" | "not_operator" => "UNARYOP".to_string(),
        "boolean_operator" => "BOOLOP".to_string(),
        "comparison_operator" => "COMPARE".to_string(),
        "return_statement" | "yield" => "RETURN".to_string(),
        "with_statement" => "WITH".to_string(),
        "try_statement" => "TRY".to_string(),
        "raise_statement" => "RAISE".to_string(),
        "import_statement" | "import_from_statement" => "IMPORT".to_string(),
        "attribute" => "ATTR".to_string(),
        "identifier" => "NAME".to_string(),
        "string" | "integer" | "float" | "true" | "false" | "none" => "CONST".to_string(),
        other => other.to_ascii_uppercase(),
    }
}

fn collect_tokens(node: Node, source: &str, tokens: &mut Vec<String>) {
    if node.kind() == "comment" {
        return;
    }

    // Strings lex as one token even though the grammar splits them into
    // start/content/end pieces.
    if node.kind() == "string" || node.child_count() == 0 {
        let text = node.utf8_text(source.as_bytes()).unwrap_or("");
        if !text.trim().is_empty() {
            tokens.push(text.to_string());
        }
        return;
    }

    let statement_boundary = matches!(node.kind(), "module" | "block");
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_tokens(child, source, tokens);

        if statement_boundary
            && child.kind() != "comment"
            && tokens.last().map(String::as_str) != Some(STATEMENT_MARK)
            && !tokens.is_empty()
        {
            tokens.push(STATEMENT_MARK.to_string());
        }
    }
}

fn collect_kind_ranges(node: Node, kind: &str, ranges: &mut Vec<(usize, usize)>) {
    if node.kind() == kind {
        ranges.push((node.start_byte(), node.end_byte()));
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_kind_ranges(child, kind, ranges);
    }
}

fn collect_signature(node: Node, tags: &mut Vec<String>) {
    if node.kind() == "comment" {
        return;
    }

    if node.is_named() {
        tags.push(node_tag(node.kind()));
    }

    // Literals are atomic in the signature; their internal pieces carry no
    // structural information.
    if node.kind() == "string" {
        return;
    }

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        collect_signature(child, tags);
    }
}

fn collect_functions(
    node: Node,
    source: &str,
    file_name: &str,
    lines: &[&str],
    spans: &mut Vec<FunctionSpan>,
) {
    if node.kind() == "function_definition" {
        if let Some(name_node) = node.child_by_field_name("name") {
            let name = name_node.utf8_text(source.as_bytes()).unwrap_or("");
            let start_line = node.start_position().row + 1;
            let end_line = node.end_position().row + 1;

            spans.push(FunctionSpan {
                file: file_name.to_string(),
                name: name.to_string(),
                start_line,
                end_line,
                source: slice_lines(lines, start_line, end_line),
            });
        }
    }

    // Keep walking into the body: nested definitions are independent spans.
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_functions(child, source, file_name, lines, spans);
    }
}

/// Join the exact original lines for a 1-based inclusive range.
fn slice_lines(lines: &[&str], start_line: usize, end_line: usize) -> String {
    let start = start_line.max(1) - 1;
    let end = end_line.min(lines.len()).max(start);
    lines[start..end].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> PythonAdapter {
        PythonAdapter::new().unwrap()
    }

    #[test]
    fn test_tokenize_drops_comments_and_blank_lines() {
        let mut adapter = adapter();
        let source = "x = 1  # set x\n\n\ny = 2\n";
        let tokens = adapter.tokenize(source);

        assert_eq!(
            tokens,
            vec!["x", "=", "1", STATEMENT_MARK, "y", "=", "2", STATEMENT_MARK]
        );
    }

    #[test]
    fn test_tokenize_collapses_statement_markers() {
        let mut adapter = adapter();
        let compact = adapter.tokenize("if x:\n    y = 1\n");
        // Closing a block and closing the outer statement must not stack
        // two markers.
        let marker_runs = compact
            .windows(2)
            .filter(|pair| pair[0] == STATEMENT_MARK && pair[1] == STATEMENT_MARK)
            .count();
        assert_eq!(marker_runs, 0, "tokens: {compact:?}");
    }

    #[test]
    fn test_tokenize_is_insensitive_to_blank_lines() {
        let mut adapter = adapter();
        let a = adapter.tokenize("x = 1\ny = 2\n");
        let b = adapter.tokenize("x = 1\n\n\n\ny = 2\n");
        assert_eq!(a, b);
    }

    #[test]
    fn test_tokenize_keeps_strings_atomic() {
        let mut adapter = adapter();
        let tokens = adapter.tokenize("s = 'hello world'\n");
        assert!(tokens.contains(&"'hello world'".to_string()), "tokens: {tokens:?}");
    }

    #[test]
    fn test_tokenize_never_fails_on_malformed_source() {
        let mut adapter = adapter();
        let tokens = adapter.tokenize("def broken(:\n    ???");
        assert!(!tokens.is_empty());
    }

    #[test]
    fn test_signature_tags_core_constructs() {
        let mut adapter = adapter();
        let source = "def f(x):\n    for i in range(x):\n        print(i)\n    return x\n";
        let signature = adapter.structural_signature(source);

        assert_eq!(signature.first().map(String::as_str), Some("MODULE"));
        assert!(signature.contains(&"FUNC".to_string()));
        assert!(signature.contains(&"LOOP".to_string()));
        assert!(signature.contains(&"CALL".to_string()));
        assert!(signature.contains(&"RETURN".to_string()));
    }

    #[test]
    fn test_signature_is_deterministic() {
        let mut adapter = adapter();
        let source = "class C:\n    def m(self):\n        return self.x + 1\n";
        let first = adapter.structural_signature(source);
        let second = adapter.structural_signature(source);
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn test_signature_empty_on_syntax_error() {
        let mut adapter = adapter();
        let signature = adapter.structural_signature("def broken(:\n");
        assert!(signature.is_empty());
    }

    #[test]
    fn test_signature_ignores_comments() {
        let mut adapter = adapter();
        let with_comment = adapter.structural_signature("x = 1  # assign\n");
        let without = adapter.structural_signature("x = 1\n");
        assert_eq!(with_comment, without);
    }

    #[test]
    fn test_while_and_for_share_a_tag() {
        let mut adapter = adapter();
        let for_sig = adapter.structural_signature("for i in a:\n    pass\n");
        let while_sig = adapter.structural_signature("while i:\n    pass\n");
        assert!(for_sig.contains(&"LOOP".to_string()));
        assert!(while_sig.contains(&"LOOP".to_string()));
    }

    #[test]
    fn test_extract_functions_finds_nested_definitions() {
        let mut adapter = adapter();
        let source = "\
def outer():
    def inner():
        return 1
    return inner()
";
        let spans = adapter.extract_functions(source, "nested.py");
        assert_eq!(spans.len(), 2);

        let outer = spans.iter().find(|s| s.name == "outer").unwrap();
        let inner = spans.iter().find(|s| s.name == "inner").unwrap();
        assert!(outer.start_line <= inner.start_line);
        assert!(inner.end_line <= outer.end_line);
        assert!(inner.source.contains("return 1"));
    }

    #[test]
    fn test_extract_functions_preserves_original_slice() {
        let mut adapter = adapter();
        let source = "def f():  # keep this comment\n    return 42\n";
        let spans = adapter.extract_functions(source, "slice.py");

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].start_line, 1);
        assert_eq!(spans[0].end_line, 2);
        assert!(spans[0].source.contains("# keep this comment"));
    }

    #[test]
    fn test_extract_functions_empty_on_parse_failure() {
        let mut adapter = adapter();
        let spans = adapter.extract_functions("def broken(:\n", "bad.py");
        assert!(spans.is_empty());
    }

    #[test]
    fn test_extract_methods_inside_classes() {
        let mut adapter = adapter();
        let source = "\
class C:
    def a(self):
        return 1

    def b(self):
        return 2
";
        let spans = adapter.extract_functions(source, "methods.py");
        let names: Vec<&str> = spans.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_string_ranges_cover_whole_literals() {
        let mut adapter = adapter();
        let source = "s = \"\"\"a\n\nb\"\"\"\nt = 'c'\n";
        let ranges = adapter.string_ranges(source).unwrap();

        let spelled: Vec<&str> = ranges.iter().map(|&(s, e)| &source[s..e]).collect();
        assert_eq!(spelled, vec!["\"\"\"a\n\nb\"\"\"", "'c'"]);
    }

    #[test]
    fn test_identifier_ranges_skip_keywords() {
        let mut adapter = adapter();
        let source = "def f(x):\n    return x\n";
        let ranges = adapter.identifier_ranges(source).unwrap();

        let spelled: Vec<&str> = ranges.iter().map(|&(s, e)| &source[s..e]).collect();
        assert_eq!(spelled, vec!["f", "x", "x"]);
    }
}
