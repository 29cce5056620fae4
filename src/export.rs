use std::path::Path;

use anyhow::Context;
use serde_json::Value;

use crate::models::CustomerRecord;

/// Column order of the CSV export, using the JSON field names.
pub const COLUMNS: &[&str] = &[
    "week",
    "companyName",
    "licenseType",
    "industry",
    "eseLead",
    "status",
    "delayReason",
    "closeDate",
    "onboardDate",
    "deploymentType",
    "headless",
    "onboardedUrls",
    "engagement",
    "engagementRaw",
    "blockersStatus",
    "blockers",
    "feedbackStatus",
    "feedback",
    "healthScoreRaw",
    "healthScore",
    "summary",
    "opptyRealized",
    "preflight",
    "autoOptimizeEnabled",
    "autoOptimizeButtonPressed",
    "servicePrincipleDeployed",
    "brandProfile",
    "aemyDeployed",
    "codeRepo",
    "authImplementation",
    "workflowManager",
    "customerSelfServe",
    "lastUpdated",
];

pub fn export_csv(path: &Path, records: &[&CustomerRecord]) -> anyhow::Result<usize> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| a.company_name.cmp(&b.company_name));

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    writer.write_record(COLUMNS)?;

    for record in sorted.iter() {
        let value = serde_json::to_value(record)?;
        let row: Vec<String> = COLUMNS
            .iter()
            .map(|column| match value.get(column) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            })
            .collect();
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(sorted.len())
}
