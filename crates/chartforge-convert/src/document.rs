//! Structural outline of YAML manifests
//!
//! The chart rewrites are small, targeted edits: add a few keys under
//! `metadata`, drop `metadata.labels`, splice a block under `spec`. A full
//! YAML round-trip would lose comments, quoting and key order, so instead a
//! document is kept as its source lines and addressed by key path. Every edit
//! is resolved against the node at that path, never against the first textual
//! occurrence of a marker, so a stray `metadata:` deeper in the tree is never
//! touched.
//!
//! Only block-style mappings are addressable. Keys inside sequence items and
//! flow collections are left alone.

use regex::Regex;
use std::sync::LazyLock;

/// A mapping key line: indentation, key (optionally quoted), optional inline value
static KEY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^(?P<indent> *)(?P<key>"[^"]*"|'[^']*'|[^\s"'#{\-][^:#]*?)\s*:(?:[ \t]+(?P<value>.*?))?[ \t]*$"#,
    )
    .expect("key line pattern is valid")
});

/// A `key: value` line anywhere, including the first key of a sequence item
static SCALAR_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<prefix> *(?:- +)*)(?P<key>[A-Za-z0-9_.\-/]+):[ \t]+(?P<value>.*?)[ \t]*$")
        .expect("scalar line pattern is valid")
});

const DEFAULT_STEP: usize = 2;

/// Split multi-document YAML on `---` separator lines.
///
/// Separators are dropped. Content before the first separator is returned as
/// a (possibly empty) document of its own.
pub fn split_documents(content: &str) -> Vec<&str> {
    let mut documents = Vec::new();
    let mut start = 0;
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        if is_separator(line) {
            documents.push(&content[start..offset]);
            start = offset + line.len();
        }
        offset += line.len();
    }
    documents.push(&content[start..]);

    documents
}

/// [`split_documents`] over raw bytes, for input not yet known to be UTF-8
pub fn split_document_bytes(content: &[u8]) -> Vec<&[u8]> {
    let mut documents = Vec::new();
    let mut start = 0;
    let mut offset = 0;

    for line in content.split_inclusive(|&b| b == b'\n') {
        if line.trim_ascii_end() == b"---" {
            documents.push(&content[start..offset]);
            start = offset + line.len();
        }
        offset += line.len();
    }
    documents.push(&content[start..]);

    documents
}

fn is_separator(line: &str) -> bool {
    line.trim_end() == "---"
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

/// Blank and comment lines carry no structure
fn is_content(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && !trimmed.starts_with('#')
}

fn is_sequence_item(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed == "-" || trimmed.starts_with("- ")
}

fn unquote(s: &str) -> &str {
    let quoted = s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')));
    if quoted { &s[1..s.len() - 1] } else { s }
}

/// Parsed mapping key line
#[derive(Debug, Clone, PartialEq, Eq)]
struct KeyLine<'a> {
    indent: usize,
    key: &'a str,
    value: Option<&'a str>,
}

fn parse_key_line(line: &str) -> Option<KeyLine<'_>> {
    let caps = KEY_LINE.captures(line)?;
    let value = caps
        .name("value")
        .map(|m| m.as_str())
        .filter(|v| !v.is_empty() && !v.starts_with('#'));

    Some(KeyLine {
        indent: caps.name("indent")?.as_str().len(),
        key: unquote(caps.name("key")?.as_str().trim_end()),
        value,
    })
}

/// A mapping key located in a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Node {
    /// Line holding the key
    pub line: usize,
    /// Indentation of the key
    pub indent: usize,
    /// One past the last content line of the key's block
    pub end: usize,
}

/// One YAML document held as source lines
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    lines: Vec<String>,
}

impl Document {
    pub fn parse(content: &str) -> Self {
        Self {
            lines: content.lines().map(str::to_string).collect(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// True when the document has no content lines
    pub fn is_empty(&self) -> bool {
        !self.lines.iter().any(|l| is_content(l))
    }

    /// Locate the mapping key at `path`, starting from the document root
    pub fn find(&self, path: &[&str]) -> Option<Node> {
        let root_indent = self
            .lines
            .iter()
            .find(|l| is_content(l))
            .map(|l| indent_of(l))?;

        let (mut start, mut end, mut indent) = (0, self.lines.len(), root_indent);
        let mut found: Option<Node> = None;

        for segment in path {
            if let Some(parent) = found {
                indent = self.first_child_indent(&parent)?;
                start = parent.line + 1;
                end = parent.end;
            }
            found = Some(self.find_child(start, end, indent, segment)?);
        }

        found
    }

    pub fn contains(&self, path: &[&str]) -> bool {
        self.find(path).is_some()
    }

    /// Inline scalar value at `path`, unquoted
    pub fn scalar(&self, path: &[&str]) -> Option<&str> {
        let node = self.find(path)?;
        parse_key_line(&self.lines[node.line])?.value.map(unquote)
    }

    /// Indentation used by the children of `node`
    pub fn child_indent(&self, node: &Node) -> usize {
        self.first_child_indent(node)
            .unwrap_or(node.indent + DEFAULT_STEP)
    }

    fn find_child(&self, start: usize, end: usize, indent: usize, key: &str) -> Option<Node> {
        (start..end).find_map(|i| {
            let parsed = parse_key_line(&self.lines[i])?;
            (parsed.indent == indent && parsed.key == key).then(|| Node {
                line: i,
                indent,
                end: self.block_end(i, indent),
            })
        })
    }

    fn block_end(&self, line: usize, indent: usize) -> usize {
        let mut end = line + 1;
        for (i, l) in self.lines.iter().enumerate().skip(line + 1) {
            if !is_content(l) {
                continue;
            }
            let nested = indent_of(l) > indent || (indent_of(l) == indent && is_sequence_item(l));
            if !nested {
                break;
            }
            end = i + 1;
        }
        end
    }

    fn first_child_indent(&self, node: &Node) -> Option<usize> {
        self.lines[node.line + 1..node.end]
            .iter()
            .find(|l| is_content(l))
            .map(|l| indent_of(l))
            .filter(|&i| i > node.indent)
    }

    /// Insert `block` as the first children of the mapping at `path`.
    ///
    /// Block lines are written relative to the child indentation. An empty
    /// flow mapping (`key: {}`) is turned into a block mapping first. Returns
    /// false when the path does not exist or holds a non-mapping value.
    pub fn prepend_children<S: AsRef<str>>(&mut self, path: &[&str], block: &[S]) -> bool {
        let Some(node) = self.find(path) else {
            return false;
        };
        if !self.open_mapping(&node) {
            return false;
        }

        let pad = " ".repeat(self.child_indent(&node));
        let lines = block.iter().map(|l| {
            let l = l.as_ref();
            if l.is_empty() {
                String::new()
            } else {
                format!("{}{}", pad, l)
            }
        });
        let tail = self.lines.split_off(node.line + 1);
        self.lines.extend(lines);
        self.lines.extend(tail);
        true
    }

    /// Make sure `key` exists as a mapping under `parent`, creating it as the
    /// first child when absent. Returns false when `parent` is missing.
    pub fn ensure_mapping(&mut self, parent: &[&str], key: &str) -> bool {
        let mut path = parent.to_vec();
        path.push(key);
        if self.contains(&path) {
            return true;
        }
        self.prepend_children(parent, &[format!("{}:", key)])
    }

    /// Remove the key at `path` together with its block
    pub fn remove(&mut self, path: &[&str]) -> bool {
        match self.find(path) {
            Some(node) => {
                self.lines.drain(node.line..node.end);
                true
            }
            None => false,
        }
    }

    /// Rewrite the value of every `key: value` line in the document,
    /// including keys that open a sequence item. `rewrite` returns the new
    /// value, or `None` to keep the line as is.
    pub fn rewrite_scalars<F>(&mut self, key: &str, mut rewrite: F)
    where
        F: FnMut(&str) -> Option<String>,
    {
        for line in &mut self.lines {
            let rewritten = match SCALAR_LINE.captures(line.as_str()) {
                Some(caps) if &caps["key"] == key => rewrite(&caps["value"])
                    .map(|value| format!("{}{}: {}", &caps["prefix"], key, value)),
                _ => None,
            };
            if let Some(rewritten) = rewritten {
                *line = rewritten;
            }
        }
    }

    fn open_mapping(&mut self, node: &Node) -> bool {
        let Some(parsed) = parse_key_line(&self.lines[node.line]) else {
            return false;
        };
        match parsed.value {
            None => true,
            Some("{}") => {
                let opened = format!("{}{}:", " ".repeat(parsed.indent), parsed.key);
                self.lines[node.line] = opened;
                true
            }
            Some(_) => false,
        }
    }
}

enum Part {
    Separator(String),
    Document(Document),
}

/// A manifest file: documents interleaved with their `---` separators
pub struct ManifestFile {
    parts: Vec<Part>,
    trailing_newline: bool,
}

impl ManifestFile {
    pub fn parse(content: &str) -> Self {
        let mut parts = Vec::new();
        let mut current = Vec::new();

        for line in content.lines() {
            if is_separator(line) {
                parts.push(Part::Document(Document {
                    lines: std::mem::take(&mut current),
                }));
                parts.push(Part::Separator(line.to_string()));
            } else {
                current.push(line.to_string());
            }
        }
        parts.push(Part::Document(Document { lines: current }));

        Self {
            parts,
            trailing_newline: content.ends_with('\n'),
        }
    }

    /// Documents with content, in file order
    pub fn documents_mut(&mut self) -> impl Iterator<Item = &mut Document> {
        self.parts.iter_mut().filter_map(|part| match part {
            Part::Document(doc) if !doc.is_empty() => Some(doc),
            _ => None,
        })
    }

    pub fn render(&self) -> String {
        let mut lines: Vec<&str> = Vec::new();
        for part in &self.parts {
            match part {
                Part::Separator(line) => lines.push(line),
                Part::Document(doc) => lines.extend(doc.lines.iter().map(String::as_str)),
            }
        }

        let mut out = lines.join("\n");
        if self.trailing_newline {
            out.push('\n');
        }
        out
    }
}
