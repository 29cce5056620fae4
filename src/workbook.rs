//! Reading the weekly customer-experience workbook.
//!
//! Every sheet named `YYYY.MM.DD` holds one week of customer rows. The
//! second row carries the column headers and data starts on the third.
//! Other sheets are skipped with a warning.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use calamine::{open_workbook_auto, Data, Range, Reader};

use crate::indicators::{
    calculate_health_score, classify_blockers, feedback_text, map_indicator_to_status,
};
use crate::models::{CustomerRecord, Dataset};
use crate::store;
use crate::week::{week_from_sheet_name, WEEK_FORMAT};

/// Zero-based row holding the column headers.
pub const HEADER_ROW: usize = 1;
/// Zero-based row of the first customer.
pub const FIRST_DATA_ROW: usize = 2;

const COMPANY_NAME: &str = "Company Name";

/// Header/value pairs of one spreadsheet row. Blank cells are absent.
pub type RowFields = HashMap<String, String>;

#[derive(Debug, Clone)]
pub struct WeekSheet {
    pub sheet_name: String,
    pub week: String,
    pub records: Vec<CustomerRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub weeks: Vec<WeekSheet>,
    pub skipped_sheets: Vec<String>,
}

impl Extraction {
    pub fn into_records(self) -> Vec<CustomerRecord> {
        self.weeks.into_iter().flat_map(|sheet| sheet.records).collect()
    }
}

/// Per-sheet counts of an extraction alongside the document it produced.
#[derive(Debug, Clone)]
pub struct ExtractSummary {
    pub dataset: Dataset,
    pub sheets: Vec<(String, String, usize)>,
    pub skipped_sheets: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SheetPreview {
    pub name: String,
    pub week: Option<String>,
    pub height: usize,
    pub width: usize,
    pub rows: Vec<Vec<String>>,
}

pub fn extract_workbook(path: &Path) -> anyhow::Result<Extraction> {
    if !path.exists() {
        anyhow::bail!("excel file not found at {}", path.display());
    }

    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("failed to open excel file {}", path.display()))?;
    let mut extraction = Extraction::default();

    for sheet_name in workbook.sheet_names() {
        let Some(week) = week_from_sheet_name(&sheet_name) else {
            log::warn!("Skipping sheet '{sheet_name}' (can't parse date)");
            extraction.skipped_sheets.push(sheet_name);
            continue;
        };

        log::info!("Processing: {sheet_name} -> {week}");
        let range = workbook
            .worksheet_range(&sheet_name)
            .with_context(|| format!("failed to read sheet {sheet_name}"))?;

        let records = map_sheet(&week, &sheet_rows(&range));
        log::info!("Processed {} customers", records.len());

        extraction.weeks.push(WeekSheet {
            sheet_name,
            week,
            records,
        });
    }

    Ok(extraction)
}

/// Converts the workbook at `input` into a fresh dataset written to
/// `output`, with the week index written next to it.
pub fn extract_to_files(input: &Path, output: &Path) -> anyhow::Result<ExtractSummary> {
    let extraction = extract_workbook(input)?;
    let sheets: Vec<(String, String, usize)> = extraction
        .weeks
        .iter()
        .map(|sheet| (sheet.sheet_name.clone(), sheet.week.clone(), sheet.records.len()))
        .collect();
    let skipped_sheets = extraction.skipped_sheets.clone();

    let dataset = Dataset::new(
        extraction.into_records(),
        Some(chrono::Utc::now().to_rfc3339()),
    );
    let index_path = output.with_file_name(store::WEEK_INDEX_FILE);
    store::save_dataset_with_index(output, &index_path, &dataset)?;

    Ok(ExtractSummary {
        dataset,
        sheets,
        skipped_sheets,
    })
}

pub fn inspect_workbook(path: &Path, max_rows: usize) -> anyhow::Result<Vec<SheetPreview>> {
    if !path.exists() {
        anyhow::bail!("excel file not found at {}", path.display());
    }

    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("failed to open excel file {}", path.display()))?;
    let mut previews = Vec::new();

    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .with_context(|| format!("failed to read sheet {name}"))?;
        let rows = sheet_rows(&range);
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);

        previews.push(SheetPreview {
            week: week_from_sheet_name(&name),
            height: rows.len(),
            width,
            rows: rows
                .iter()
                .take(max_rows)
                .map(|row| row.iter().map(cell_text).collect())
                .collect(),
            name,
        });
    }

    Ok(previews)
}

/// Rows of a sheet indexed from A1.
///
/// calamine ranges start at the first used cell, so leading empty rows and
/// columns are padded back in to keep the fixed header offset meaningful.
fn sheet_rows(range: &Range<Data>) -> Vec<Vec<Data>> {
    let Some((start_row, start_col)) = range.start() else {
        return Vec::new();
    };

    let mut rows: Vec<Vec<Data>> = vec![Vec::new(); start_row as usize];
    for row in range.rows() {
        let mut padded = vec![Data::Empty; start_col as usize];
        padded.extend_from_slice(row);
        rows.push(padded);
    }
    rows
}

/// Maps the rows of one weekly sheet to customer records.
pub fn map_sheet(week: &str, rows: &[Vec<Data>]) -> Vec<CustomerRecord> {
    let Some(header_row) = rows.get(HEADER_ROW) else {
        return Vec::new();
    };
    let headers: Vec<String> = header_row.iter().map(cell_text).collect();

    let mut records = Vec::new();
    for (index, row) in rows.iter().enumerate().skip(FIRST_DATA_ROW) {
        if row.iter().all(is_blank) {
            continue;
        }

        let fields = row_fields(&headers, row);
        match normalize_row(week, &fields) {
            Some(record) => records.push(record),
            None => log::debug!("row {} of week {week} has no company name", index + 1),
        }
    }
    records
}

fn row_fields(headers: &[String], row: &[Data]) -> RowFields {
    headers
        .iter()
        .zip(row)
        .filter(|(header, _)| !header.is_empty())
        .map(|(header, cell)| (header.clone(), cell_text(cell)))
        .filter(|(_, value)| !value.is_empty())
        .collect()
}

/// Projects a row into the fixed record shape. Rows without a company
/// name yield `None`.
pub fn normalize_row(week: &str, fields: &RowFields) -> Option<CustomerRecord> {
    let get = |header: &str| fields.get(header).map(String::as_str);
    let text = |header: &str| get(header).unwrap_or_default().to_string();

    let company_name = text(COMPANY_NAME);
    if company_name.is_empty() {
        return None;
    }

    let engagement = get("Engagement");
    let blockers = get("Blockers");
    let feedback = get("Feedback");
    let health = get("Health Score");

    Some(CustomerRecord {
        week: week.to_string(),
        company_name,
        license_type: text("License Type"),
        industry: text("Industry"),
        ese_lead: text("ESE Lead"),
        status: text("Status"),
        delay_reason: text("Delay Reason"),
        close_date: text("Close Date"),
        onboard_date: text("Onboard Date"),
        deployment_type: text("Deployment Type"),
        headless: text("Headless"),
        onboarded_urls: text("Onboarded URL's"),

        engagement: map_indicator_to_status(engagement),
        engagement_raw: text("Engagement"),
        blockers_status: text("Blockers"),
        blockers: classify_blockers(blockers).to_string(),
        feedback_status: text("Feedback"),
        feedback: feedback_text(feedback),
        health_score_raw: text("Health Score"),
        health_score: Some(calculate_health_score(engagement, blockers, feedback, health)),
        summary: text("Summary of Engagement"),

        oppty_realized: text("Oppty Realized"),

        preflight: text("Preflight"),
        // The header carries this spelling in the workbook.
        auto_optimize_enabled: text("Auto-Opimize Enabled?"),
        auto_optimize_button_pressed: text("Auto-Optimize Button pressed by Customer?"),
        service_principle_deployed: text("Service Principle Deployed"),
        brand_profile: text("Brand Profile"),
        aemy_deployed: text("AEMY Deployed"),
        code_repo: text("Code Repo (git,gitlab,bitbucket,etc..)"),
        auth_implementation: text("Auth Implementation (IMS/SAML/Basic)"),
        workflow_manager: text("Workflow Manager (Jira/Asana)"),
        customer_self_serve: text("Customer Self Serve"),

        last_updated: week.to_string(),
        extra: Default::default(),
    })
}

fn is_blank(cell: &Data) -> bool {
    cell_text(cell).is_empty()
}

/// Trimmed text of a cell; dates render as `YYYY-MM-DD`.
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Bool(true) => "True".to_string(),
        Data::Bool(false) => "False".to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) => datetime.format(WEEK_FORMAT).to_string(),
            None => dt.as_f64().to_string(),
        },
        Data::DateTimeIso(s) => match s.get(..10) {
            Some(day) if chrono::NaiveDate::parse_from_str(day, WEEK_FORMAT).is_ok() => {
                day.to_string()
            }
            _ => s.trim().to_string(),
        },
        Data::DurationIso(s) => s.trim().to_string(),
    }
}
