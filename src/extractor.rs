// Statement extractor - finds FOR / FIND / CAN-FIND statements in ABL sources
//
// Each statement family is located by its own pass over the whole text, so
// the output is grouped by family (all FOR, then all FIND, then all CAN-FIND)
// rather than sorted by position.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// FOR EACH / FIRST / LAST <table> ... up to end of line
static FOR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bFOR\s+(EACH|FIRST|LAST)\s+([A-Za-z0-9_\-]+)[^\r\n]*")
        .expect("FOR pattern is valid")
});

/// FIND [FIRST | LAST] <table> ... up to end of line
static FIND_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bFIND\s+(?:(FIRST|LAST)\s+)?([A-Za-z0-9_\-]+)[^\r\n]*")
        .expect("FIND pattern is valid")
});

/// CAN-FIND ( [FIRST] <table> WHERE   -- the predicate is located separately
static CAN_FIND_HEAD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bcan-find\s*\(\s*(?:first\s+)?([A-Za-z0-9_\-]+)\s+where\s+")
        .expect("CAN-FIND pattern is valid")
});

/// Appended to the raw text of statements found inside CAN-FIND
pub const CAN_FIND_MARKER: &str = " [CAN-FIND]";

/// Statement family and qualifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StatementKind {
    #[serde(rename = "FOR EACH")]
    ScanEach,
    #[serde(rename = "FOR FIRST")]
    ScanFirst,
    #[serde(rename = "FOR LAST")]
    ScanLast,
    #[serde(rename = "FIND")]
    Seek,
    #[serde(rename = "FIND FIRST")]
    SeekFirst,
    #[serde(rename = "FIND LAST")]
    SeekLast,
}

impl StatementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementKind::ScanEach => "FOR EACH",
            StatementKind::ScanFirst => "FOR FIRST",
            StatementKind::ScanLast => "FOR LAST",
            StatementKind::Seek => "FIND",
            StatementKind::SeekFirst => "FIND FIRST",
            StatementKind::SeekLast => "FIND LAST",
        }
    }

    fn scan(qualifier: &str) -> Self {
        match qualifier.to_ascii_uppercase().as_str() {
            "FIRST" => StatementKind::ScanFirst,
            "LAST" => StatementKind::ScanLast,
            _ => StatementKind::ScanEach,
        }
    }

    fn seek(qualifier: Option<&str>) -> Self {
        match qualifier.map(|q| q.to_ascii_uppercase()).as_deref() {
            Some("FIRST") => StatementKind::SeekFirst,
            Some("LAST") => StatementKind::SeekLast,
            _ => StatementKind::Seek,
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A data-access statement found in a source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statement {
    pub kind: StatementKind,
    /// Table name exactly as written in the source
    pub table: String,
    /// 1-based line of the statement keyword
    pub line: usize,
    /// Matched statement text, trimmed
    pub raw: String,
    /// `<table>.<field>` references of a CAN-FIND predicate, first occurrence order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub explicit_fields: Vec<String>,
}

/// Statements extracted from one source blob
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileAnalysis {
    pub file_name: String,
    pub statements: Vec<Statement>,
}

/// Extracts data-access statements from ABL source text.
///
/// This is pattern matching, not parsing: statements inside comments or
/// string literals are reported too, and FOR/FIND statements only see the
/// line they start on.
pub struct StatementExtractor;

impl StatementExtractor {
    /// Extract every statement in `source`, grouped FOR, FIND, CAN-FIND.
    pub fn extract(source: &str) -> Vec<Statement> {
        let lines = LineIndex::new(source);

        let mut statements = Self::extract_for(source, &lines);
        statements.extend(Self::extract_find(source, &lines));
        statements.extend(Self::extract_can_find(source, &lines));

        debug!(count = statements.len(), "extracted statements");
        statements
    }

    /// Extract a named blob into a [`FileAnalysis`]
    pub fn analyze(file_name: &str, source: &str) -> FileAnalysis {
        FileAnalysis {
            file_name: file_name.to_string(),
            statements: Self::extract(source),
        }
    }

    fn extract_for(source: &str, lines: &LineIndex) -> Vec<Statement> {
        FOR_PATTERN
            .captures_iter(source)
            .filter_map(|caps| {
                let full = caps.get(0)?;
                Some(Statement {
                    kind: StatementKind::scan(caps.get(1)?.as_str()),
                    table: caps.get(2)?.as_str().to_string(),
                    line: lines.line_of(full.start()),
                    raw: full.as_str().trim().to_string(),
                    explicit_fields: Vec::new(),
                })
            })
            .collect()
    }

    fn extract_find(source: &str, lines: &LineIndex) -> Vec<Statement> {
        FIND_PATTERN
            .captures_iter(source)
            .filter_map(|caps| {
                let full = caps.get(0)?;
                Some(Statement {
                    kind: StatementKind::seek(caps.get(1).map(|m| m.as_str())),
                    table: caps.get(2)?.as_str().to_string(),
                    line: lines.line_of(full.start()),
                    raw: full.as_str().trim().to_string(),
                    explicit_fields: Vec::new(),
                })
            })
            .collect()
    }

    fn extract_can_find(source: &str, lines: &LineIndex) -> Vec<Statement> {
        let mut statements = Vec::new();

        for caps in CAN_FIND_HEAD.captures_iter(source) {
            let (Some(head), Some(table)) = (caps.get(0), caps.get(1)) else {
                continue;
            };

            // The head pattern always contains the opening parenthesis
            let Some(open) = head.as_str().find('(') else {
                continue;
            };
            let Some(close) = find_closing_paren(source, head.start() + open) else {
                warn!(line = lines.line_of(head.start()), "unterminated CAN-FIND skipped");
                continue;
            };

            let table = table.as_str().to_string();
            let predicate = &source[head.end()..close];
            let full = &source[head.start()..=close];

            statements.push(Statement {
                kind: StatementKind::Seek,
                explicit_fields: qualified_fields(&table, predicate),
                line: lines.line_of(head.start()),
                raw: format!("{}{}", full.trim(), CAN_FIND_MARKER),
                table,
            });
        }

        statements
    }
}

/// Fields referenced as `<table>.<field>` inside `predicate`, deduplicated
fn qualified_fields(table: &str, predicate: &str) -> Vec<String> {
    let pattern = format!(r"(?i)\b{}\.([A-Za-z0-9_\-]+)", regex::escape(table));
    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(e) => {
            warn!(table, error = %e, "cannot build field pattern");
            return Vec::new();
        }
    };

    let mut fields: Vec<String> = Vec::new();
    for caps in re.captures_iter(predicate) {
        if let Some(field) = caps.get(1) {
            let field = field.as_str();
            if !fields.iter().any(|f| f == field) {
                fields.push(field.to_string());
            }
        }
    }
    fields
}

/// Byte offset of the `)` balancing the `(` at `open`.
///
/// Parentheses inside ABL string literals and `/* */` comments (which nest)
/// are not counted.
fn find_closing_paren(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut comment_depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = open;

    while i < bytes.len() {
        let byte = bytes[i];
        let next = bytes.get(i + 1).copied();

        if comment_depth > 0 {
            match (byte, next) {
                (b'/', Some(b'*')) => {
                    comment_depth += 1;
                    i += 1;
                }
                (b'*', Some(b'/')) => {
                    comment_depth -= 1;
                    i += 1;
                }
                _ => {}
            }
        } else if let Some(q) = quote {
            if byte == q {
                quote = None;
            }
        } else {
            match (byte, next) {
                (b'/', Some(b'*')) => {
                    comment_depth = 1;
                    i += 1;
                }
                (b'"', _) | (b'\'', _) => quote = Some(byte),
                (b'(', _) => depth += 1,
                (b')', _) => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            }
        }
        i += 1;
    }

    None
}

/// Maps byte offsets to 1-based line numbers.
///
/// `\r\n`, `\r` and `\n` each count as a single line break.
struct LineIndex {
    /// Offsets at which each line after the first begins
    line_starts: Vec<usize>,
}

impl LineIndex {
    fn new(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut line_starts = Vec::new();
        let mut i = 0;

        while i < bytes.len() {
            match bytes[i] {
                b'\r' if bytes.get(i + 1) == Some(&b'\n') => {
                    line_starts.push(i + 2);
                    i += 1;
                }
                b'\r' | b'\n' => line_starts.push(i + 1),
                _ => {}
            }
            i += 1;
        }

        Self { line_starts }
    }

    fn line_of(&self, offset: usize) -> usize {
        self.line_starts.partition_point(|&start| start <= offset) + 1
    }
}
