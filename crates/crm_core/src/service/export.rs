//! Contact CSV export.
//!
//! # Invariants
//! - Column order is fixed by [`CONTACT_CSV_HEADER`].
//! - `ID` is written bare; every other column is double-quoted with embedded
//!   quotes doubled.
//! - Rows end with `\n`; zero contacts yield the header row only.

use crate::model::company::Company;
use crate::model::contact::Contact;
use crate::model::record::RecordId;
use crate::service::ServiceResult;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

pub const CONTACT_CSV_HEADER: &str =
    "ID,First Name,Last Name,Email,Phone,Title,Company,Status,Created At,Updated At";

/// Result of writing an export file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub success: bool,
    pub filename: String,
    pub path: PathBuf,
    pub count: usize,
}

/// `contacts_export_<YYYY-MM-DD>.csv` for `date`.
pub fn export_filename(date: NaiveDate) -> String {
    format!("contacts_export_{}.csv", date.format("%Y-%m-%d"))
}

/// Renders contacts as CSV. `Company` is resolved by id against `companies`
/// and left empty when unknown.
pub fn render_contacts_csv(contacts: &[Contact], companies: &[Company]) -> String {
    let names: HashMap<RecordId, &str> = companies
        .iter()
        .map(|company| (company.id, company.name.as_str()))
        .collect();

    let mut csv = String::with_capacity(CONTACT_CSV_HEADER.len() + 1 + contacts.len() * 96);
    csv.push_str(CONTACT_CSV_HEADER);
    csv.push('\n');
    for contact in contacts {
        let company = contact
            .company_id
            .and_then(|id| names.get(&id).copied())
            .unwrap_or("");
        let quoted = [
            contact.first_name.as_str(),
            contact.last_name.as_str(),
            contact.email.as_str(),
            contact.phone.as_str(),
            contact.title.as_str(),
            company,
            "",
            contact.created_at.as_deref().unwrap_or(""),
            contact.updated_at.as_deref().unwrap_or(""),
        ];
        let _ = write!(csv, "{}", contact.id);
        for field in quoted {
            csv.push(',');
            push_quoted(&mut csv, field);
        }
        csv.push('\n');
    }
    csv
}

fn push_quoted(out: &mut String, value: &str) {
    out.push('"');
    out.push_str(&value.replace('"', "\"\""));
    out.push('"');
}

/// Writes the CSV for `contacts` into `out_dir`, named for `date`.
pub fn write_contacts_csv(
    contacts: &[Contact],
    companies: &[Company],
    out_dir: &Path,
    date: NaiveDate,
) -> ServiceResult<ExportSummary> {
    std::fs::create_dir_all(out_dir)?;
    let filename = export_filename(date);
    let path = out_dir.join(&filename);
    std::fs::write(&path, render_contacts_csv(contacts, companies))?;
    log::info!(
        "event=contacts_export module=export status=ok count={} path={}",
        contacts.len(),
        path.display()
    );
    Ok(ExportSummary {
        success: true,
        filename,
        path,
        count: contacts.len(),
    })
}
