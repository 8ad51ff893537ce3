//! One-line-style APT sources list rendering and parsing.
//!
//! ```text
//! deb http://ppa.launchpad.net/avsm/ppa/ubuntu precise main
//! deb-src http://ppa.launchpad.net/avsm/ppa/ubuntu precise main
//! ```

use crate::types::SourceEntry;
use std::path::{Path, PathBuf};

/// Kind of a sources line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Binary packages (`deb`)
    Binary,
    /// Source packages (`deb-src`)
    Source,
}

impl SourceKind {
    /// Directive for this kind.
    pub fn directive(&self) -> &'static str {
        match self {
            SourceKind::Binary => "deb",
            SourceKind::Source => "deb-src",
        }
    }
}

/// A parsed sources line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    /// `deb` or `deb-src`
    pub kind: SourceKind,
    /// Archive root URI
    pub uri: String,
    /// Distribution (suite)
    pub distribution: String,
    /// Components
    pub components: Vec<String>,
}

/// File name used for a source id.
///
/// APT ignores files whose names contain anything but alphanumerics,
/// `_`, `-` and `.`, so other characters are replaced with `_`.
pub fn list_file_name(id: &str) -> String {
    let sanitized: String = id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{sanitized}.list")
}

/// Full path of the `.list` file for a source id.
pub fn list_path(sources_dir: &Path, id: &str) -> PathBuf {
    sources_dir.join(list_file_name(id))
}

/// Render the contents of the `.list` file for a source.
pub fn render(entry: &SourceEntry<'_>) -> String {
    let mut out = format!("# Managed by provision: {}\n", entry.id);
    out.push_str(&render_line(SourceKind::Binary, entry));
    out.push('\n');
    if entry.include_source {
        out.push_str(&render_line(SourceKind::Source, entry));
        out.push('\n');
    }
    out
}

fn render_line(kind: SourceKind, entry: &SourceEntry<'_>) -> String {
    let mut line = format!("{} {} {}", kind.directive(), entry.uri, entry.distribution);
    for component in entry.components {
        line.push(' ');
        line.push_str(component);
    }
    line
}

/// Parse a single sources line. Comments, blank lines and options blocks
/// (`[arch=amd64]`) are handled; anything unrecognized yields `None`.
pub fn parse_line(line: &str) -> Option<SourceLine> {
    let line = line.split('#').next().unwrap_or("").trim();
    if line.is_empty() {
        return None;
    }

    let mut tokens = line.split_whitespace().peekable();
    let kind = match tokens.next()? {
        "deb" => SourceKind::Binary,
        "deb-src" => SourceKind::Source,
        _ => return None,
    };

    if tokens.peek().is_some_and(|t| t.starts_with('[')) {
        for token in tokens.by_ref() {
            if token.ends_with(']') {
                break;
            }
        }
    }

    let uri = tokens.next()?.to_string();
    let distribution = tokens.next()?.to_string();
    let components = tokens.map(str::to_string).collect();

    Some(SourceLine {
        kind,
        uri,
        distribution,
        components,
    })
}

/// Parse every sources line in a file's contents.
pub fn parse(content: &str) -> Vec<SourceLine> {
    content.lines().filter_map(parse_line).collect()
}
