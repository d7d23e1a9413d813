//! MLN program templates.
//!
//! A template declares the ground domain, the predicates and the weighted
//! formulas. Evidence is appended after it, never merged into it.

use crate::errors::{SweepError, SweepResult};
use std::fmt;
use std::path::Path;

pub const STRESS_DRINKERS: &str = r#"
person = {0, 1, 2, 3, 4, 5}
//, Wannes, Jesse, Luc, 1, 2, 3, 4, 5, 6}
friends(person,person)
smokes(person)
stress(person)
drinks(person)
1.22 stress(x) => smokes(x)
2.08 friends(x,y) ^ smokes(x) => smokes(y)
2 stress(x) => drinks(x)
1.5 friends(x,y) ^ drinks(x) => drinks(y)
"#;

pub const SMOKERS_DRINKERS: &str = r#"
person = {0, 1, 2, 3, 4, 5}
//, Wannes, Jesse, Luc, 1, 2, 3, 4, 5, 6}
friends(person,person)
smokes(person)
drinks(person)
1.22 smokes(x)
2.08 friends(x,y) ^ smokes(x) => smokes(y)
0.69 friends(x,y)
1.5 drinks(x) ^ friends(x,y) => drinks(y)
"#;

pub const FRIENDS_SMOKERS: &str = r#"
person = {0, 1, 2, 3, 4, 5}
//, Wannes, Jesse, Luc, 1, 2, 3, 4, 5, 6}
friends(person,person)
smokes(person)
1.22 smokes(x)
2.08 friends(x,y) ^ smokes(x) => smokes(y)
0.69 friends(x,y)
"#;

/// Built-in template variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TemplateVariant {
    /// Smokers and drinkers, both driven by `stress`.
    StressDrinkers,
    /// Smokers and drinkers with a prior on `friends`.
    #[default]
    SmokersDrinkers,
    /// Friends and smokers only (no `drinks` predicate).
    FriendsSmokers,
}

impl TemplateVariant {
    pub fn all() -> &'static [TemplateVariant] {
        &[
            TemplateVariant::StressDrinkers,
            TemplateVariant::SmokersDrinkers,
            TemplateVariant::FriendsSmokers,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            TemplateVariant::StressDrinkers => "stress-drinkers",
            TemplateVariant::SmokersDrinkers => "smokers-drinkers",
            TemplateVariant::FriendsSmokers => "friends-smokers",
        }
    }

    pub fn text(self) -> &'static str {
        match self {
            TemplateVariant::StressDrinkers => STRESS_DRINKERS,
            TemplateVariant::SmokersDrinkers => SMOKERS_DRINKERS,
            TemplateVariant::FriendsSmokers => FRIENDS_SMOKERS,
        }
    }

    pub fn from_name(name: &str) -> SweepResult<Self> {
        let wanted = name.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|v| v.name() == wanted)
            .ok_or_else(|| SweepError::UnknownTemplate {
                name: name.to_string(),
                available: Self::all()
                    .iter()
                    .map(|v| v.name())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

impl fmt::Display for TemplateVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A domain declaration: `person = {0, 1, 2}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    pub name: String,
    pub elements: Vec<String>,
}

/// A predicate declaration: `friends(person,person)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredicateDecl {
    pub name: String,
    pub arg_domains: Vec<String>,
}

impl PredicateDecl {
    pub fn arity(&self) -> usize {
        self.arg_domains.len()
    }
}

/// An immutable program template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    name: String,
    text: String,
}

impl Template {
    pub fn builtin(variant: TemplateVariant) -> Self {
        Self {
            name: variant.name().to_string(),
            text: variant.text().to_string(),
        }
    }

    pub fn from_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// Read a template verbatim from disk. The file stem becomes its name.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read template: {}", path.display()))?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "custom".to_string());
        Ok(Self { name, text })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Domain declarations, in source order.
    pub fn domains(&self) -> Vec<Domain> {
        self.code_lines().filter_map(parse_domain).collect()
    }

    /// Predicate declarations: `name(dom, ...)` lines whose arguments are all
    /// declared domains. Formulas such as `smokes(x)` do not qualify.
    pub fn declared_predicates(&self) -> Vec<PredicateDecl> {
        let domains = self.domains();
        self.code_lines()
            .filter_map(parse_atom)
            .filter(|(_, args)| {
                !args.is_empty() && args.iter().all(|a| domains.iter().any(|d| &d.name == a))
            })
            .map(|(name, arg_domains)| PredicateDecl { name, arg_domains })
            .collect()
    }

    fn code_lines(&self) -> impl Iterator<Item = &str> {
        self.text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with("//"))
    }
}

pub(crate) fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_domain(line: &str) -> Option<Domain> {
    let (name, rest) = line.split_once('=')?;
    let name = name.trim();
    if !is_ident(name) {
        return None;
    }
    let body = rest.trim().strip_prefix('{')?.strip_suffix('}')?;
    let elements = body
        .split(',')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .collect();
    Some(Domain {
        name: name.to_string(),
        elements,
    })
}

/// Splits `name(a, b)` into its parts. The whole line must be the atom.
pub(crate) fn parse_atom(line: &str) -> Option<(String, Vec<String>)> {
    let (name, rest) = line.split_once('(')?;
    let name = name.trim();
    if !is_ident(name) {
        return None;
    }
    let body = rest.trim_end().strip_suffix(')')?;
    if body.contains('(') || body.contains(')') {
        return None;
    }
    let args = body
        .split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect();
    Some((name.to_string(), args))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_texts_are_newline_delimited() {
        for v in TemplateVariant::all() {
            let text = v.text();
            assert!(text.starts_with('\n'), "{} must start with a newline", v);
            assert!(text.ends_with('\n'), "{} must end with a newline", v);
            assert!(text.contains("person = {0, 1, 2, 3, 4, 5}"));
        }
    }

    #[test]
    fn variant_names_roundtrip() {
        for v in TemplateVariant::all() {
            assert_eq!(TemplateVariant::from_name(v.name()).unwrap(), *v);
        }
        assert_eq!(
            TemplateVariant::from_name(" Friends-Smokers ").unwrap(),
            TemplateVariant::FriendsSmokers
        );
    }

    #[test]
    fn unknown_variant_lists_available() {
        let err = TemplateVariant::from_name("smokers").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("smokers-drinkers"), "{msg}");
        assert!(msg.contains("friends-smokers"), "{msg}");
    }

    #[test]
    fn domains_skip_comment_line() {
        let t = Template::builtin(TemplateVariant::SmokersDrinkers);
        let domains = t.domains();
        assert_eq!(domains.len(), 1);
        assert_eq!(domains[0].name, "person");
        assert_eq!(domains[0].elements, vec!["0", "1", "2", "3", "4", "5"]);
    }

    #[test]
    fn declared_predicates_exclude_formulas() {
        let t = Template::builtin(TemplateVariant::SmokersDrinkers);
        let names: Vec<_> = t
            .declared_predicates()
            .into_iter()
            .map(|p| (p.name.clone(), p.arity()))
            .collect();
        assert_eq!(
            names,
            vec![
                ("friends".to_string(), 2),
                ("smokes".to_string(), 1),
                ("drinks".to_string(), 1)
            ]
        );
    }

    #[test]
    fn friends_smokers_has_no_drinks() {
        let t = Template::builtin(TemplateVariant::FriendsSmokers);
        assert!(!t.declared_predicates().iter().any(|p| p.name == "drinks"));
        let t = Template::builtin(TemplateVariant::StressDrinkers);
        assert!(t.declared_predicates().iter().any(|p| p.name == "stress"));
    }

    #[test]
    fn from_file_keeps_text_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.mln");
        std::fs::write(&path, "d = {a, b}\np(d)\n").unwrap();
        let t = Template::from_file(&path).unwrap();
        assert_eq!(t.name(), "tiny");
        assert_eq!(t.text(), "d = {a, b}\np(d)\n");
        assert_eq!(t.declared_predicates()[0].arg_domains, vec!["d"]);
    }
}
