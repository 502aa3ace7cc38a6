//! # DDL Structure Extraction
//!
//! Builds a [`SchemaModel`] from MySQL `CREATE TABLE` text. This is not a SQL
//! parser: it recovers table names, column names/types, nullability, defaults,
//! and a single-column primary key, which is all provisioning and rollback need.
//!
//! Extraction is best-effort. Any block or definition that cannot be
//! understood is dropped and reported in [`ParseOutcome::skipped`]; the rest of
//! the source still produces a usable partial model.
//!
//! Segmentation is line-oriented: a block starts on a line beginning with
//! `CREATE TABLE` and ends on the first line ending with `;`.

use std::fmt;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, RowKitError};
use crate::schema::types::{Column, SchemaModel, Table};

static CREATE_TABLE_START_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^CREATE\s+TABLE\b").unwrap());

/// Table name from the statement header. Accepts `` `quoted` ``, `"quoted"`
/// and bare identifiers, with optional `IF NOT EXISTS` and schema qualifier.
static TABLE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)^\s*CREATE\s+TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?(?:(?:`[^`]+`|"[^"]+"|[\w$]+)\s*\.\s*)?(?:`([^`]+)`|"([^"]+)"|([\w$]+))"#,
    )
    .unwrap()
});

static PRIMARY_KEY_CONSTRAINT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)^(?:CONSTRAINT(?:\s+(?:`[^`]*`|"[^"]*"|[\w$]+))?\s+)?PRIMARY\s+KEY\b(?:\s+USING\s+\w+)?\s*\(([^)]*(?:\([^)]*\)[^)]*)*)\)"#,
    )
    .unwrap()
});

static COLUMN_DEF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)^(?:`([^`]+)`|"([^"]+)"|([\w$]+))\s+([a-z]\w*(?:\s*\([^)]*\))?(?:\s+(?:unsigned|signed|zerofill))*)"#,
    )
    .unwrap()
});

static NOT_NULL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bNOT\s+NULL\b").unwrap());
static DEFAULT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bDEFAULT\b").unwrap());
static AUTO_INCREMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bAUTO_INCREMENT\b").unwrap());
static INLINE_PRIMARY_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bPRIMARY\s+KEY\b").unwrap());

/// Leading keywords of table-level clauses that carry no column information.
const CLAUSE_KEYWORDS: &[&str] = &[
    "KEY",
    "INDEX",
    "UNIQUE",
    "CONSTRAINT",
    "FOREIGN",
    "CHECK",
    "FULLTEXT",
    "SPATIAL",
];

/// Maximum length of a fragment quoted back in a diagnostic.
const FRAGMENT_PREVIEW_LEN: usize = 80;

/// A partial schema plus everything that was dropped on the way.
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    pub schema: SchemaModel,
    pub skipped: Vec<SkippedDefinition>,
}

/// A block or definition line that was dropped during extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDefinition {
    pub table: Option<String>,
    pub fragment: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoTableName,
    NoBody,
    UnrecognizedDefinition,
    CompositePrimaryKey,
    UnknownPrimaryKeyColumn,
    DuplicateTable,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoTableName => write!(f, "no table name in statement header"),
            SkipReason::NoBody => write!(f, "no parenthesized definition list"),
            SkipReason::UnrecognizedDefinition => write!(f, "unrecognized definition"),
            SkipReason::CompositePrimaryKey => {
                write!(f, "composite primary key (rows cannot be tracked by one key)")
            }
            SkipReason::UnknownPrimaryKeyColumn => {
                write!(f, "primary key names an undeclared column")
            }
            SkipReason::DuplicateTable => write!(f, "table declared again; later block wins"),
        }
    }
}

impl fmt::Display for SkippedDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => write!(f, "{}: {} ({})", table, self.reason, self.fragment),
            None => write!(f, "{} ({})", self.reason, self.fragment),
        }
    }
}

/// Read and parse a DDL file.
pub fn parse_file(path: &Path) -> Result<ParseOutcome> {
    let source = read_source(path)?;
    Ok(parse(&source))
}

/// Read a DDL file and return its raw `CREATE TABLE` statements.
pub fn create_statements_from_file(path: &Path) -> Result<Vec<String>> {
    let source = read_source(path)?;
    Ok(extract_create_statements(&source))
}

fn read_source(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(RowKitError::MissingResource {
            kind: "Schema file",
            path: path.to_path_buf(),
        });
    }
    std::fs::read_to_string(path).map_err(|e| RowKitError::Io {
        message: format!("Failed to read schema file {}", path.display()),
        source: e,
    })
}

/// Extract the structural model from DDL text.
pub fn parse(source: &str) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();

    for block in extract_create_statements(source) {
        if let Some(table) = parse_table_block(&block, &mut outcome.skipped) {
            if outcome.schema.tables.contains_key(&table.name) {
                outcome.skipped.push(SkippedDefinition {
                    table: Some(table.name.clone()),
                    fragment: preview(&block),
                    reason: SkipReason::DuplicateTable,
                });
            }
            outcome.schema.tables.insert(table.name.clone(), table);
        }
    }

    outcome
}

/// Split DDL text into raw `CREATE TABLE` statements, verbatim.
///
/// A new `CREATE TABLE` line closes a block that never saw its terminator, and
/// an unterminated trailing block is still returned.
pub fn extract_create_statements(source: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut in_create = false;

    for line in source.lines() {
        let trimmed = line.trim();
        if CREATE_TABLE_START_RE.is_match(trimmed) {
            if !current.is_empty() {
                blocks.push(current.join("\n"));
                current.clear();
            }
            in_create = true;
        }
        if in_create {
            current.push(line);
            if trimmed.ends_with(';') {
                blocks.push(current.join("\n"));
                current.clear();
                in_create = false;
            }
        }
    }

    if !current.is_empty() {
        blocks.push(current.join("\n"));
    }

    blocks
}

/// Table name of a `CREATE TABLE` statement.
pub fn extract_table_name(statement: &str) -> Option<String> {
    let caps = TABLE_NAME_RE.captures(statement)?;
    (1..=3)
        .find_map(|i| caps.get(i))
        .map(|m| m.as_str().to_string())
}

fn parse_table_block(block: &str, skipped: &mut Vec<SkippedDefinition>) -> Option<Table> {
    let cleaned = strip_comments(block);

    let Some(name) = extract_table_name(&cleaned) else {
        skipped.push(SkippedDefinition {
            table: None,
            fragment: preview(block),
            reason: SkipReason::NoTableName,
        });
        return None;
    };

    let header_end = TABLE_NAME_RE.find(&cleaned).map(|m| m.end()).unwrap_or(0);
    let Some(body) = extract_body(&cleaned[header_end..]) else {
        skipped.push(SkippedDefinition {
            table: Some(name),
            fragment: preview(block),
            reason: SkipReason::NoBody,
        });
        return None;
    };

    let mut table = Table::new(name);
    let mut constraint_key: Option<String> = None;
    let mut inline_key: Option<String> = None;

    for definition in split_top_level(body) {
        let definition = definition.trim();
        if definition.is_empty() {
            continue;
        }

        if let Some(caps) = PRIMARY_KEY_CONSTRAINT_RE.captures(definition) {
            let key_columns: Vec<String> = caps[1]
                .split(',')
                .map(unquote_key_part)
                .filter(|c| !c.is_empty())
                .collect();
            if key_columns.len() == 1 {
                constraint_key = key_columns.into_iter().next();
            } else {
                skipped.push(SkippedDefinition {
                    table: Some(table.name.clone()),
                    fragment: preview(definition),
                    reason: SkipReason::CompositePrimaryKey,
                });
            }
            continue;
        }

        let first_word = definition
            .split(|c: char| c.is_whitespace() || c == '(')
            .next()
            .unwrap_or("")
            .to_uppercase();
        if CLAUSE_KEYWORDS.contains(&first_word.as_str()) {
            continue;
        }

        match parse_column(definition) {
            Some((column, inline_primary)) => {
                if inline_primary && inline_key.is_none() {
                    inline_key = Some(column.name.clone());
                }
                table.columns.push(column);
            }
            None => skipped.push(SkippedDefinition {
                table: Some(table.name.clone()),
                fragment: preview(definition),
                reason: SkipReason::UnrecognizedDefinition,
            }),
        }
    }

    if let Some(key) = constraint_key.or(inline_key) {
        if !table.set_primary_key(&key) {
            skipped.push(SkippedDefinition {
                table: Some(table.name.clone()),
                fragment: key,
                reason: SkipReason::UnknownPrimaryKeyColumn,
            });
        }
    }

    Some(table)
}

/// Parse `name type [attributes...]`. The bool is true for an inline
/// `PRIMARY KEY` marker.
fn parse_column(definition: &str) -> Option<(Column, bool)> {
    let caps = COLUMN_DEF_RE.captures(definition)?;
    let name = (1..=3).find_map(|i| caps.get(i))?.as_str().to_string();
    let raw_type = caps.get(4)?.as_str().trim().to_string();
    let type_end = caps.get(4)?.end();

    // Attribute keywords inside string literals (COMMENT 'default ...') must
    // not count.
    let attributes = strip_string_literals(&definition[type_end..]);

    let mut column = Column::new(name, raw_type);
    column.nullable = !NOT_NULL_RE.is_match(&attributes);
    column.has_default = DEFAULT_RE.is_match(&attributes);
    column.is_auto_increment = AUTO_INCREMENT_RE.is_match(&attributes);
    let inline_primary = INLINE_PRIMARY_KEY_RE.is_match(&attributes);

    Some((column, inline_primary))
}

/// Text between the first `(` and its matching `)`, honoring quotes.
fn extract_body(text: &str) -> Option<&str> {
    let start = text.find('(')?;
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, ch) in text[start..].char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' && q != '`' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' | '`' => quote = Some(ch),
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start + 1..start + i]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Split a definition list on commas that are not nested in parentheses or
/// quotes.
fn split_top_level(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut last = 0;

    for (i, ch) in body.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' && q != '`' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' | '`' => quote = Some(ch),
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&body[last..i]);
                last = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&body[last..]);

    parts
}

/// Remove `-- ...` / `# ...` line comments and `/* ... */` block comments that
/// sit outside quoted text.
fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let chars: Vec<char> = text.chars().collect();
    let mut quote: Option<char> = None;
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        if let Some(q) = quote {
            out.push(ch);
            if ch == '\\' && q != '`' && i + 1 < chars.len() {
                out.push(chars[i + 1]);
                i += 2;
                continue;
            }
            if ch == q {
                quote = None;
            }
            i += 1;
            continue;
        }

        let next = chars.get(i + 1).copied();
        let line_comment = (ch == '-'
            && next == Some('-')
            && chars.get(i + 2).is_none_or(|c| c.is_whitespace()))
            || ch == '#';
        if line_comment {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
            continue;
        }
        if ch == '/' && next == Some('*') {
            i += 2;
            while i + 1 < chars.len() && !(chars[i] == '*' && chars[i + 1] == '/') {
                i += 1;
            }
            i += 2;
            out.push(' ');
            continue;
        }

        if matches!(ch, '\'' | '"' | '`') {
            quote = Some(ch);
        }
        out.push(ch);
        i += 1;
    }

    out
}

fn strip_string_literals(text: &str) -> String {
    static STRING_LITERAL_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r#"'(?:[^'\\]|\\.|'')*'|"(?:[^"\\]|\\.|"")*""#).unwrap());
    STRING_LITERAL_RE.replace_all(text, "''").into_owned()
}

/// `` `id` ``, `id(10)`, `"id" DESC` → `id`.
fn unquote_key_part(part: &str) -> String {
    let part = part.trim();
    let part = part.split('(').next().unwrap_or(part);
    let part = part.split_whitespace().next().unwrap_or("");
    part.trim_matches(|c| c == '`' || c == '"').to_string()
}

fn preview(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= FRAGMENT_PREVIEW_LEN {
        flat
    } else {
        let cut: String = flat.chars().take(FRAGMENT_PREVIEW_LEN).collect();
        format!("{}...", cut)
    }
}
