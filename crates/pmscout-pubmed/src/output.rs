//! CSV file and console output

use std::io::Write;
use std::path::Path;

use pmscout_core::CsvSink;
use serde::Serialize;

use crate::error::HarvestError;
use crate::extract::ExtractedRecord;

/// Column order of the CSV file
pub const CSV_HEADER: [&str; 6] = [
    "PubmedID",
    "Title",
    "Publication Date",
    "Non-academic Author(s)",
    "Company Affiliation(s)",
    "Corresponding Author Email",
];

/// Separator for multi-valued fields within one CSV cell
pub const LIST_SEPARATOR: &str = "; ";

/// Flat CSV row; field order must match [`CSV_HEADER`]
#[derive(Serialize)]
struct CsvRow<'a> {
    pmid: &'a str,
    title: &'a str,
    publication_date: &'a str,
    non_academic_authors: String,
    company_affiliations: String,
    corresponding_email: &'a str,
}

impl<'a> From<&'a ExtractedRecord> for CsvRow<'a> {
    fn from(r: &'a ExtractedRecord) -> Self {
        Self {
            pmid: &r.pmid,
            title: &r.title,
            publication_date: &r.publication_date,
            non_academic_authors: r.non_academic_authors.join(LIST_SEPARATOR),
            company_affiliations: r.company_affiliations.join(LIST_SEPARATOR),
            corresponding_email: r.corresponding_email.as_deref().unwrap_or(""),
        }
    }
}

/// Write `records` to a CSV file at `path`. Returns the number of data rows.
///
/// The header is written even when `records` is empty. Nothing appears at
/// `path` unless every row was written.
pub fn write_csv(records: &[ExtractedRecord], path: &Path) -> Result<usize, HarvestError> {
    let output_err = |source| HarvestError::Output {
        path: path.to_path_buf(),
        source,
    };

    let mut sink = CsvSink::create(path, &CSV_HEADER).map_err(output_err)?;
    for record in records {
        sink.write_row(&CsvRow::from(record)).map_err(output_err)?;
    }
    let rows = sink.finalize().map_err(output_err)?;

    log::info!("wrote {rows} record(s) to {}", path.display());
    Ok(rows)
}

/// Print records as JSON lines, one object per record.
pub fn print_records<W: Write>(records: &[ExtractedRecord], mut out: W) -> std::io::Result<()> {
    for record in records {
        serde_json::to_writer(&mut out, record)?;
        out.write_all(b"\n")?;
    }
    out.flush()
}
