//! Pre-flight check of evidence against a template.
//!
//! Catches evidence the solver would reject before any solver time is spent:
//! undeclared predicates, wrong arity, constants outside the declared domain.

use crate::evidence::Evidence;
use crate::template::Template;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Problem {
    UndeclaredPredicate {
        position: usize,
        literal: String,
        predicate: String,
    },
    ArityMismatch {
        position: usize,
        literal: String,
        expected: usize,
        found: usize,
    },
    UnknownConstant {
        position: usize,
        literal: String,
        constant: String,
        domain: String,
    },
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Problem::UndeclaredPredicate {
                position,
                literal,
                predicate,
            } => write!(
                f,
                "#{position} {literal}: predicate '{predicate}' is not declared"
            ),
            Problem::ArityMismatch {
                position,
                literal,
                expected,
                found,
            } => write!(
                f,
                "#{position} {literal}: expected {expected} argument(s), found {found}"
            ),
            Problem::UnknownConstant {
                position,
                literal,
                constant,
                domain,
            } => write!(
                f,
                "#{position} {literal}: '{constant}' is not in domain '{domain}'"
            ),
        }
    }
}

/// Every problem found, in evidence order. Positions are 1-based.
pub fn check_evidence(template: &Template, evidence: &Evidence) -> Vec<Problem> {
    let decls = template.declared_predicates();
    let domains = template.domains();
    let mut problems = Vec::new();

    for (idx, lit) in evidence.literals().iter().enumerate() {
        let position = idx + 1;
        let Some(decl) = decls.iter().find(|d| d.name == lit.predicate) else {
            problems.push(Problem::UndeclaredPredicate {
                position,
                literal: lit.to_string(),
                predicate: lit.predicate.clone(),
            });
            continue;
        };
        if decl.arity() != lit.args.len() {
            problems.push(Problem::ArityMismatch {
                position,
                literal: lit.to_string(),
                expected: decl.arity(),
                found: lit.args.len(),
            });
            continue;
        }
        for (arg, dom_name) in lit.args.iter().zip(&decl.arg_domains) {
            let in_domain = domains
                .iter()
                .find(|d| &d.name == dom_name)
                .map(|d| d.elements.iter().any(|e| e == arg))
                .unwrap_or(false);
            if !in_domain {
                problems.push(Problem::UnknownConstant {
                    position,
                    literal: lit.to_string(),
                    constant: arg.clone(),
                    domain: dom_name.clone(),
                });
            }
        }
    }

    problems
}
