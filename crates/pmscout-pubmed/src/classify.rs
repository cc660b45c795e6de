//! Academic vs. non-academic affiliation classification
//!
//! Classification is a heuristic over affiliation text, behind the
//! [`AffiliationClassifier`] trait so it can be replaced or tested on its own.

use regex::{Regex, RegexBuilder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AffiliationKind {
    Academic,
    NonAcademic,
}

/// Decides whether one affiliation string belongs to an academic institution.
pub trait AffiliationClassifier: Send + Sync {
    fn classify(&self, affiliation: &str) -> AffiliationKind;
}

/// Case-insensitive patterns for universities, hospitals and public research bodies
const ACADEMIC_PATTERNS: &[&str] = &[
    r"universi",
    r"\buniv\b",
    r"\bcollege",
    r"\binstitut",
    r"\bschool\b",
    r"\bfaculty\b",
    r"\bacadem",
    r"polytechni",
    r"politecnico",
    r"h[oô]s?pita",
    r"\bklinik",
    r"\bclinic(?:s|a|um)?\b",
    r"medical (?:cent(?:er|re)|school)",
    r"cancer (?:cent(?:er|re)|institute)",
    r"health (?:science|system|care system)",
    r"research (?:council|foundation|cent(?:er|re))",
    r"national institutes? of health",
    r"\bnih\b",
    r"\bcnrs\b",
    r"\binserm\b",
    r"max[- ]planck",
    r"fraunhofer",
    r"helmholtz",
];

/// Case-insensitive company markers: legal-entity suffixes and industry words.
/// `\w*pharma\b` catches "Acme Pharma" and "Biopharma" but not "Pharmacology".
const COMPANY_PATTERNS: &[&str] = &[
    r"\binc\b",
    r"\bincorporated\b",
    r"\bltd\b",
    r"\blimited\b",
    r"\bllc\b",
    r"\bl\.l\.c\.",
    r"\bcorp\b",
    r"\bcorporation\b",
    r"\bgmbh\b",
    r"\bplc\b",
    r"\bco\.,? ltd",
    r"&\s*co\b",
    r"\w*pharma\b",
    r"\bpharmaceuticals\b",
    r"\w*biotech\b",
    r"\btherapeutics\b",
    r"\bbiopharmaceuticals?\b",
];

/// Case-sensitive corporate forms that collide with ordinary words in lower case
const COMPANY_FORMS: &[&str] = &[
    r"\bAG\b",
    r"(?:^|[\s,])S\.A\.",
    r"\bS\.p\.A\.",
    r"\bN\.V\.",
    r"\bB\.V\.",
    r"\bK\.K\.",
];

/// Keyword heuristic: a company marker wins; otherwise an academic pattern
/// makes the affiliation academic; anything else is non-academic.
#[derive(Debug, Clone)]
pub struct HeuristicClassifier {
    academic: Regex,
    company: Regex,
    company_forms: Regex,
}

impl HeuristicClassifier {
    /// Built-in patterns plus extra literal keywords (matched case-insensitively
    /// anywhere in the text).
    pub fn new(extra_academic: &[String], extra_company: &[String]) -> Result<Self, regex::Error> {
        Ok(Self {
            academic: alternation(ACADEMIC_PATTERNS, extra_academic, true)?,
            company: alternation(COMPANY_PATTERNS, extra_company, true)?,
            company_forms: alternation(COMPANY_FORMS, &[], false)?,
        })
    }

    /// Built-in patterns only
    pub fn builtin() -> Result<Self, regex::Error> {
        Self::new(&[], &[])
    }

    fn is_company(&self, text: &str) -> bool {
        self.company.is_match(text) || self.company_forms.is_match(text)
    }
}

impl AffiliationClassifier for HeuristicClassifier {
    fn classify(&self, affiliation: &str) -> AffiliationKind {
        if self.is_company(affiliation) {
            AffiliationKind::NonAcademic
        } else if self.academic.is_match(affiliation) {
            AffiliationKind::Academic
        } else {
            AffiliationKind::NonAcademic
        }
    }
}

fn alternation(builtin: &[&str], extra: &[String], case_insensitive: bool) -> Result<Regex, regex::Error> {
    let escaped: Vec<String> = extra
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .map(regex::escape)
        .collect();
    let pattern = builtin
        .iter()
        .copied()
        .chain(escaped.iter().map(String::as_str))
        .map(|p| format!("(?:{p})"))
        .collect::<Vec<_>>()
        .join("|");
    RegexBuilder::new(&pattern)
        .case_insensitive(case_insensitive)
        .build()
}
