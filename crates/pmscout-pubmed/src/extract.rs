//! PubmedArticle → ExtractedRecord
//!
//! Pulls the output fields out of a parsed article and classifies its
//! authors. Extraction never fails: missing optional fields become empty.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::classify::{AffiliationClassifier, AffiliationKind};
use crate::parser::{PartialDate, PubmedArticle};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}")
        .expect("invalid email regex")
});

/// "Electronic address:" and friends, which PubMed puts in front of emails
static EMAIL_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:electronic address|e-?mail(?:\s+address)?)\s*:?")
        .expect("invalid email label regex")
});

static EMPTY_PARENS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\s*[,;]?\s*\)").expect("invalid parens regex"));

/// One output row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedRecord {
    #[serde(rename = "PubmedID")]
    pub pmid: String,
    #[serde(rename = "Title")]
    pub title: String,
    /// `YYYY-MM-DD`, `YYYY-MM`, `YYYY`, or empty
    #[serde(rename = "Publication Date")]
    pub publication_date: String,
    #[serde(rename = "Non-academic Author(s)")]
    pub non_academic_authors: Vec<String>,
    #[serde(rename = "Company Affiliation(s)")]
    pub company_affiliations: Vec<String>,
    #[serde(rename = "Corresponding Author Email")]
    pub corresponding_email: Option<String>,
}

/// Extract the output fields from one article.
pub fn extract(article: &PubmedArticle, classifier: &dyn AffiliationClassifier) -> ExtractedRecord {
    let title = article
        .title
        .clone()
        .or_else(|| article.vernacular_title.clone())
        .unwrap_or_default();

    let publication_date = iso_date(&article.pub_date)
        .or_else(|| iso_date(&article.article_date))
        .unwrap_or_default();

    let mut non_academic_authors = Vec::new();
    let mut seen_authors = FxHashSet::default();
    let mut company_affiliations = Vec::new();
    let mut seen_companies = FxHashSet::default();

    for author in &article.authors {
        let companies: Vec<String> = author
            .affiliations
            .iter()
            .map(|aff| clean_affiliation(aff))
            .filter(|aff| !aff.is_empty())
            // Classified without the email so its domain cannot look like a company
            .filter(|aff| classifier.classify(aff) == AffiliationKind::NonAcademic)
            .collect();
        if companies.is_empty() {
            continue;
        }

        if let Some(name) = author.display_name() {
            if seen_authors.insert(name.clone()) {
                non_academic_authors.push(name);
            }
        }
        for company in companies {
            if seen_companies.insert(company.clone()) {
                company_affiliations.push(company);
            }
        }
    }

    ExtractedRecord {
        pmid: article.pmid.clone(),
        title,
        publication_date,
        non_academic_authors,
        company_affiliations,
        corresponding_email: corresponding_email(article),
    }
}

/// First email in author affiliation text, in author order.
///
/// PubMed has no explicit corresponding-author element; the author whose
/// affiliation carries an email address is the contact.
fn corresponding_email(article: &PubmedArticle) -> Option<String> {
    article
        .authors
        .iter()
        .flat_map(|a| a.affiliations.iter())
        .find_map(|aff| EMAIL_RE.find(aff))
        .map(|m| m.as_str().to_string())
}

/// Drop email addresses and their labels from affiliation text.
///
/// Text without an email is returned unchanged apart from whitespace.
pub fn clean_affiliation(text: &str) -> String {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if !EMAIL_RE.is_match(&normalized) {
        return normalized;
    }

    let stripped = EMAIL_RE.replace_all(&normalized, "");
    let stripped = EMAIL_LABEL_RE.replace_all(&stripped, "");
    let stripped = EMPTY_PARENS_RE.replace_all(&stripped, "");
    let collapsed = stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace(" ,", ",")
        .replace(" ;", ";");
    let trimmed = collapsed.trim_end_matches(|c: char| c.is_whitespace() || ",;:.".contains(c));

    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}.")
    }
}

/// Render as much of the date as is present and valid.
fn iso_date(date: &PartialDate) -> Option<String> {
    let year = date.year.filter(|y| (1000..=9999).contains(y))?;
    Some(match (date.month, date.day) {
        (Some(month), Some(day)) => match NaiveDate::from_ymd_opt(year, month, day) {
            Some(d) => d.format("%Y-%m-%d").to_string(),
            None => format!("{year:04}-{month:02}"),
        },
        (Some(month), None) => format!("{year:04}-{month:02}"),
        (None, _) => format!("{year:04}"),
    })
}
