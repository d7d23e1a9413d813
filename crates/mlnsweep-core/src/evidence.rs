//! Ground evidence literals.
//!
//! A literal is written exactly as it was given (`raw`); the parsed parts
//! are only used for inspection and pre-flight checks.

use crate::errors::{SweepError, SweepResult};
use crate::template::is_ident;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Evidence used when none is configured.
pub const BUILTIN_EVIDENCE: &[&str] = &[
    "friends(0,2).",
    "friends(1,4).",
    "!friends(2,4).",
    "!friends(4,3).",
    "friends(4,5).",
    "!friends(4,2).",
    "friends(0,1).",
    "friends(1,3).",
    "!friends(3,4).",
    "!friends(0,3).",
    "friends(2,5).",
    "friends(0,4).",
];

/// A ground literal such as `friends(0,2).` or `!friends(2,4).`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EvidenceLiteral {
    pub negated: bool,
    pub predicate: String,
    pub args: Vec<String>,
    raw: String,
}

impl EvidenceLiteral {
    pub fn parse(input: &str) -> Result<Self, String> {
        let raw = input.trim();
        let body = raw
            .strip_suffix('.')
            .ok_or_else(|| "missing terminating '.'".to_string())?;
        let (negated, atom) = match body.strip_prefix('!') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, body),
        };
        let (name, rest) = atom
            .split_once('(')
            .ok_or_else(|| "expected name(arg, ...)".to_string())?;
        let name = name.trim();
        if !is_ident(name) {
            return Err(format!("invalid predicate name {name:?}"));
        }
        let args_src = rest
            .trim_end()
            .strip_suffix(')')
            .ok_or_else(|| "missing ')'".to_string())?;
        let args: Vec<String> = args_src.split(',').map(|a| a.trim().to_string()).collect();
        let bad_arg = |a: &String| {
            a.is_empty() || a.contains(|c: char| c == '(' || c == ')' || c.is_whitespace())
        };
        if args.iter().any(bad_arg) {
            return Err("arguments must be non-empty constants".to_string());
        }
        Ok(Self {
            negated,
            predicate: name.to_string(),
            args,
            raw: raw.to_string(),
        })
    }

    /// The literal exactly as it is written into input files.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for EvidenceLiteral {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for EvidenceLiteral {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EvidenceLiteral> for String {
    fn from(value: EvidenceLiteral) -> Self {
        value.raw
    }
}

impl fmt::Display for EvidenceLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Ordered evidence. Iteration `i` (1-based) uses the first `i` literals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evidence {
    literals: Vec<EvidenceLiteral>,
}

impl Evidence {
    pub fn builtin() -> Self {
        let literals = BUILTIN_EVIDENCE
            .iter()
            .map(|s| EvidenceLiteral::parse(s).expect("builtin evidence is well-formed"))
            .collect();
        Self { literals }
    }

    pub fn from_literals(literals: Vec<EvidenceLiteral>) -> Self {
        Self { literals }
    }

    /// Parse a list of strings. Line numbers in errors are 1-based.
    pub fn parse_all<S: AsRef<str>>(items: &[S]) -> SweepResult<Self> {
        let mut literals = Vec::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            let item = item.as_ref();
            let lit =
                EvidenceLiteral::parse(item).map_err(|reason| SweepError::InvalidLiteral {
                    line: idx + 1,
                    literal: item.to_string(),
                    reason,
                })?;
            literals.push(lit);
        }
        Ok(Self { literals })
    }

    /// One literal per line; blank lines and `//` comments are skipped.
    pub fn from_text(text: &str) -> SweepResult<Self> {
        let mut literals = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with("//") {
                continue;
            }
            let lit =
                EvidenceLiteral::parse(trimmed).map_err(|reason| SweepError::InvalidLiteral {
                    line: idx + 1,
                    literal: trimmed.to_string(),
                    reason,
                })?;
            literals.push(lit);
        }
        Ok(Self { literals })
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read evidence file: {}", path.display()))?;
        Self::from_text(&text)
            .with_context(|| format!("failed to parse evidence file: {}", path.display()))
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    pub fn literals(&self) -> &[EvidenceLiteral] {
        &self.literals
    }

    /// First `count` literals, clamped to the list length.
    pub fn prefix(&self, count: usize) -> &[EvidenceLiteral] {
        &self.literals[..count.min(self.literals.len())]
    }
}
