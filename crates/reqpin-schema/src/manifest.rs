use crate::types::{PackageName, Version};
use serde::Serialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest file: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: requirement '{content}' is not pinned, expected '<name>==<version>'")]
    InvalidPin { line: usize, content: String },
    #[error("line {line}: invalid package name '{name}'")]
    InvalidName { line: usize, name: String },
    #[error("line {line}: invalid version '{version}' for '{name}'")]
    InvalidVersion {
        line: usize,
        name: String,
        version: String,
    },
    #[error("line {line}: include directive has no path")]
    EmptyInclude { line: usize },
    #[error("line {line}: unsupported requirement line '{content}'")]
    Unsupported { line: usize, content: String },
}

impl ManifestError {
    /// The 1-based line number the error was raised on, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Io(_) => None,
            Self::InvalidPin { line, .. }
            | Self::InvalidName { line, .. }
            | Self::InvalidVersion { line, .. }
            | Self::EmptyInclude { line }
            | Self::Unsupported { line, .. } => Some(*line),
        }
    }
}

/// An exact `name==version` pin.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Pin {
    pub name: PackageName,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extras: Vec<String>,
    pub version: Version,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// A `-r <path>` include directive. The path is kept as written.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Include {
    pub path: String,
}

/// One logical line of a requirements manifest.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Line {
    Blank,
    Comment { text: String },
    Include(Include),
    Pin(Pin),
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SourceLine {
    /// 1-based number of the first physical line.
    pub number: usize,
    pub line: Line,
}

/// A single manifest file, parsed but not yet resolved against its includes.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ParsedManifest {
    pub lines: Vec<SourceLine>,
}

impl ParsedManifest {
    pub fn pins(&self) -> impl Iterator<Item = (usize, &Pin)> {
        self.lines.iter().filter_map(|l| match &l.line {
            Line::Pin(pin) => Some((l.number, pin)),
            _ => None,
        })
    }

    pub fn includes(&self) -> impl Iterator<Item = (usize, &Include)> {
        self.lines.iter().filter_map(|l| match &l.line {
            Line::Include(inc) => Some((l.number, inc)),
            _ => None,
        })
    }
}

pub fn parse_manifest_str(input: &str) -> Result<ParsedManifest, ManifestError> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let mut lines = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (idx, physical) in input.lines().enumerate() {
        let number = idx + 1;
        let trimmed = physical.trim_end();
        // A line carrying a comment never continues; its `\` belongs to the comment.
        let continued = if split_comment(trimmed).1.is_some() {
            None
        } else {
            trimmed.strip_suffix('\\')
        };
        if let Some(head) = continued {
            match pending.as_mut() {
                Some((_, buf)) => buf.push_str(head),
                None => pending = Some((number, head.to_owned())),
            }
            continue;
        }
        let (start, logical) = match pending.take() {
            Some((start, mut buf)) => {
                buf.push_str(trimmed);
                (start, buf)
            }
            None => (number, trimmed.to_owned()),
        };
        lines.push(SourceLine {
            number: start,
            line: parse_line(&logical, start)?,
        });
    }

    // A trailing backslash on the final line continues into nothing.
    if let Some((start, buf)) = pending {
        lines.push(SourceLine {
            number: start,
            line: parse_line(&buf, start)?,
        });
    }

    Ok(ParsedManifest { lines })
}

pub fn parse_manifest_file(path: impl AsRef<Path>) -> Result<ParsedManifest, ManifestError> {
    let content = fs::read_to_string(path)?;
    parse_manifest_str(&content)
}

/// Parse one logical line. `number` is only used for error reporting.
pub fn parse_line(raw: &str, number: usize) -> Result<Line, ManifestError> {
    let (code, comment) = split_comment(raw);
    let code = code.trim();

    if code.is_empty() {
        return Ok(match comment {
            Some(text) => Line::Comment {
                text: text.to_owned(),
            },
            None => Line::Blank,
        });
    }

    if let Some(path) = include_target(code) {
        if path.is_empty() {
            return Err(ManifestError::EmptyInclude { line: number });
        }
        return Ok(Line::Include(Include {
            path: path.to_owned(),
        }));
    }

    if code.starts_with('-') || code.contains(';') || code.contains("://") || code.contains('@')
    {
        return Err(ManifestError::Unsupported {
            line: number,
            content: code.to_owned(),
        });
    }

    parse_pin(code, number, comment).map(Line::Pin)
}

/// Split off a `#` comment. The `#` must start the line or follow whitespace.
fn split_comment(raw: &str) -> (&str, Option<&str>) {
    let mut prev_ws = true;
    for (i, c) in raw.char_indices() {
        if c == '#' && prev_ws {
            return (&raw[..i], Some(raw[i + 1..].trim()));
        }
        prev_ws = c.is_whitespace();
    }
    (raw, None)
}

fn include_target(code: &str) -> Option<&str> {
    if let Some(rest) = code.strip_prefix("--requirement") {
        if let Some(path) = rest.strip_prefix('=') {
            return Some(path.trim());
        }
        if rest.is_empty() || rest.starts_with(char::is_whitespace) {
            return Some(rest.trim());
        }
        return None;
    }
    code.strip_prefix("-r").map(str::trim)
}

fn parse_pin(code: &str, number: usize, comment: Option<&str>) -> Result<Pin, ManifestError> {
    let Some((lhs, rhs)) = code.split_once("==") else {
        return Err(if is_valid_name(code) {
            ManifestError::InvalidPin {
                line: number,
                content: code.to_owned(),
            }
        } else {
            ManifestError::Unsupported {
                line: number,
                content: code.to_owned(),
            }
        });
    };

    let (name, extras) = parse_requirement_name(lhs.trim(), number)?;

    let version = rhs.trim();
    if !is_valid_version(version) {
        return Err(ManifestError::InvalidVersion {
            line: number,
            name,
            version: version.to_owned(),
        });
    }

    Ok(Pin {
        name: PackageName::new(name),
        extras,
        version: Version::new(version),
        comment: comment.filter(|c| !c.is_empty()).map(str::to_owned),
    })
}

fn parse_requirement_name(lhs: &str, number: usize) -> Result<(String, Vec<String>), ManifestError> {
    let invalid = || ManifestError::InvalidName {
        line: number,
        name: lhs.to_owned(),
    };

    let (name, extras) = match lhs.split_once('[') {
        Some((name, rest)) => {
            let inner = rest.strip_suffix(']').ok_or_else(invalid)?;
            let mut extras = Vec::new();
            // `name[]` is the same as no extras.
            for extra in inner.split(',').map(str::trim).filter(|_| !inner.trim().is_empty()) {
                if !is_valid_name(extra) {
                    return Err(invalid());
                }
                extras.push(extra.to_owned());
            }
            extras.sort();
            extras.dedup();
            (name.trim(), extras)
        }
        None => (lhs, Vec::new()),
    };

    if !is_valid_name(name) {
        return Err(invalid());
    }
    Ok((name.to_owned(), extras))
}

fn is_valid_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    match (bytes.first(), bytes.last()) {
        (Some(first), Some(last)) => {
            first.is_ascii_alphanumeric()
                && last.is_ascii_alphanumeric()
                && bytes
                    .iter()
                    .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'))
        }
        _ => false,
    }
}

fn is_valid_version(version: &str) -> bool {
    !version.is_empty()
        && version
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '!' | '+' | '_' | '*' | '-'))
}
