//! Street name canonicalization.
//!
//! A [`Canonicalizer`] turns a raw display name into a comparison key by
//! removing administrative type suffixes (`ქ.`, `ქუჩა`, `Ave.`, …), Roman
//! numeral branch qualifiers in front of numbered types, dash variants and
//! case differences. Token lists come from [`CanonicalRules`] so new
//! locales need config, not code.

use regex::{NoExpand, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::ReconError;

/// Upper bound on pipeline passes when looking for a stable key.
const MAX_PASSES: usize = 16;

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Abbreviation {
    /// Abbreviated form without its trailing dot (the dot is optional in input).
    pub short: String,
    pub full: String,
}

impl Abbreviation {
    fn new(short: &str, full: &str) -> Self {
        Self { short: short.into(), full: full.into() }
    }
}

/// Token configuration for the canonicalizer.
///
/// Suffix tokens accept an optional trailing dot unless the token itself
/// ends with `.`, in which case the dot is required except at the end of the
/// name, where trailing punctuation has already been removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanonicalRules {
    pub abbreviations: Vec<Abbreviation>,
    /// Type tokens that may be preceded by a Roman numeral qualifier.
    pub numbered_types: Vec<String>,
    /// Type tokens stripped when they trail the name.
    pub suffixes: Vec<String>,
}

impl Default for CanonicalRules {
    fn default() -> Self {
        let owned = |tokens: &[&str]| tokens.iter().map(|t| t.to_string()).collect::<Vec<_>>();
        Self {
            abbreviations: vec![
                Abbreviation::new("შეს", "შესახვევი"),
                Abbreviation::new("ln", "lane"),
            ],
            numbered_types: owned(&[
                "ქ", "ქუჩა", "ჩიხი", "შესახვევი", "შეს", "კვ", "კვარტალი",
                "street", "st", "lane", "ln", "block", "square", "sq",
            ]),
            suffixes: owned(&[
                "ქუჩა", "ქ", "გამზირი", "გამზ", "ჩიხი", "ჩ.", "შესახვევი", "კვარტალი", "კვ",
                "პლატო", "მიკრორაიონი", "მ/რ", "მოედანი",
                "street", "st", "avenue", "ave", "av", "lane", "ln", "block", "plateau",
                "microdistrict", "micro-district", "square", "sq",
            ]),
        }
    }
}

// ---------------------------------------------------------------------------
// Canonicalizer
// ---------------------------------------------------------------------------

/// Compiled form of [`CanonicalRules`]. Build once, reuse for every record.
#[derive(Debug, Clone)]
pub struct Canonicalizer {
    trailing_punct: Regex,
    abbreviations: Vec<(Regex, String)>,
    numeral: Option<Regex>,
    suffix: Option<Regex>,
    dashes: Regex,
    whitespace: Regex,
}

impl Canonicalizer {
    pub fn new(rules: &CanonicalRules) -> Result<Self, ReconError> {
        let mut abbreviations = Vec::with_capacity(rules.abbreviations.len());
        for abbr in &rules.abbreviations {
            let short = abbr.short.trim().trim_end_matches('.');
            if short.is_empty() || abbr.full.trim().is_empty() {
                return Err(ReconError::InvalidRule {
                    pattern: abbr.short.clone(),
                    message: "abbreviation and expansion must be non-empty".into(),
                });
            }
            let re = compile(&format!(r"\b{}(?:\.|\b)", regex::escape(short)))?;
            abbreviations.push((re, format!(" {} ", abbr.full.trim())));
        }

        let numeral = if rules.numbered_types.is_empty() {
            None
        } else {
            let types = alternation(&rules.numbered_types, |t| {
                regex::escape(t.trim_end_matches('.'))
            })?;
            Some(compile(&format!(r"\s+[ivx]+\s+(?P<ty>{types})\b"))?)
        };

        let suffix = if rules.suffixes.is_empty() {
            None
        } else {
            let tokens = alternation(&rules.suffixes, suffix_token)?;
            Some(compile(&format!(r"(?:^|\s+)(?:{tokens})(?:\s+(?:{tokens}))*$"))?)
        };

        Ok(Self {
            trailing_punct: compile(r"[,.\s]+$")?,
            abbreviations,
            numeral,
            suffix,
            dashes: compile("[-\u{2010}-\u{2015}\u{2212}]+")?,
            whitespace: compile(r"\s+")?,
        })
    }

    pub fn with_default_rules() -> Result<Self, ReconError> {
        Self::new(&CanonicalRules::default())
    }

    /// Canonical comparison key for `name`. Empty output means "unindexable".
    ///
    /// The pipeline is re-applied until the key is stable, so the result is
    /// always a fixed point: `canonicalize(canonicalize(x)) == canonicalize(x)`.
    pub fn canonicalize(&self, name: &str) -> String {
        let mut current = self.pass(name);
        for _ in 1..MAX_PASSES {
            let next = self.pass(&current);
            if next == current {
                return current;
            }
            current = next;
        }
        tracing::debug!(raw = name, key = %current, "canonical key did not settle within pass limit");
        current
    }

    fn pass(&self, input: &str) -> String {
        let mut s = self.trailing_punct.replace(input.trim(), "").into_owned();

        for (re, full) in &self.abbreviations {
            s = re.replace_all(&s, NoExpand(full)).into_owned();
        }
        s = s.trim().to_string();

        if let Some(re) = &self.numeral {
            s = re.replace_all(&s, " ${ty}").into_owned();
        }
        if let Some(re) = &self.suffix {
            s = re.replace(&s, "").into_owned();
        }

        s = self.dashes.replace_all(&s, " ").into_owned();
        s = self.whitespace.replace_all(&s, " ").into_owned();
        s.trim().to_lowercase()
    }
}

fn suffix_token(token: &str) -> String {
    if let Some(stem) = token.strip_suffix('.') {
        format!(r"{}(?:\.|$)", regex::escape(stem))
    } else {
        format!(r"{}\.?", regex::escape(token))
    }
}

fn alternation(tokens: &[String], render: impl Fn(&str) -> String) -> Result<String, ReconError> {
    let mut parts = Vec::with_capacity(tokens.len());
    for token in tokens {
        let token = token.trim();
        if token.is_empty() || token == "." {
            return Err(ReconError::InvalidRule {
                pattern: token.into(),
                message: "empty token".into(),
            });
        }
        parts.push(render(token));
    }
    Ok(parts.join("|"))
}

fn compile(pattern: &str) -> Result<Regex, ReconError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| ReconError::InvalidRule {
            pattern: pattern.into(),
            message: e.to_string(),
        })
}
