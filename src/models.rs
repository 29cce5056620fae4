use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One customer row of one weekly sheet, after normalization.
///
/// Field names serialize in camelCase to match the dashboard's data file.
/// Keys this struct does not know about are kept in `extra` so a
/// rewrite of an existing document never drops them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRecord {
    #[serde(default)]
    pub week: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub license_type: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub ese_lead: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub delay_reason: String,
    #[serde(default)]
    pub close_date: String,
    #[serde(default)]
    pub onboard_date: String,
    #[serde(default)]
    pub deployment_type: String,
    #[serde(default)]
    pub headless: String,
    #[serde(default)]
    pub onboarded_urls: String,

    #[serde(default)]
    pub engagement: String,
    #[serde(default)]
    pub engagement_raw: String,
    #[serde(default)]
    pub blockers_status: String,
    #[serde(default)]
    pub blockers: String,
    #[serde(default)]
    pub feedback_status: String,
    #[serde(default)]
    pub feedback: String,
    #[serde(default)]
    pub health_score_raw: String,
    /// Absent on records written before scoring existed; left absent on
    /// rewrite rather than defaulting to a misleading zero.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_score: Option<u32>,
    #[serde(default)]
    pub summary: String,

    #[serde(default)]
    pub oppty_realized: String,

    #[serde(default)]
    pub preflight: String,
    #[serde(default)]
    pub auto_optimize_enabled: String,
    #[serde(default)]
    pub auto_optimize_button_pressed: String,
    #[serde(default)]
    pub service_principle_deployed: String,
    #[serde(default)]
    pub brand_profile: String,
    #[serde(default)]
    pub aemy_deployed: String,
    #[serde(default)]
    pub code_repo: String,
    #[serde(default)]
    pub auth_implementation: String,
    #[serde(default)]
    pub workflow_manager: String,
    #[serde(default)]
    pub customer_self_serve: String,

    #[serde(default)]
    pub last_updated: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The persisted `customers.json` document. Top-level keys other than the
/// three below are carried through `extra` untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub data: Vec<CustomerRecord>,
    #[serde(default)]
    pub total: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Dataset {
    pub fn new(data: Vec<CustomerRecord>, generated: Option<String>) -> Self {
        Self {
            total: data.len(),
            data,
            generated,
            extra: Map::new(),
        }
    }

    /// Distinct non-empty weeks, newest first.
    pub fn weeks(&self) -> Vec<String> {
        let mut weeks: Vec<String> = self
            .data
            .iter()
            .filter(|record| !record.week.is_empty())
            .map(|record| record.week.clone())
            .collect();
        weeks.sort_by(|a, b| b.cmp(a));
        weeks.dedup();
        weeks
    }

    pub fn latest_week(&self) -> Option<String> {
        self.weeks().into_iter().next()
    }

    pub fn records_for_week<'a>(&'a self, week: &'a str) -> impl Iterator<Item = &'a CustomerRecord> {
        self.data.iter().filter(move |record| record.week == week)
    }
}

/// The `weeks.json` index consumed by the dashboard's week picker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekIndex {
    pub weeks: Vec<String>,
    pub latest: Option<String>,
}

impl WeekIndex {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let weeks = dataset.weeks();
        let latest = weeks.first().cloned();
        Self { weeks, latest }
    }
}

#[derive(Debug, Clone)]
pub struct EngagementBreakdown {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone)]
pub struct RollSummary {
    pub latest_week: String,
    pub new_week: String,
    pub copied: usize,
    pub replaced: usize,
    pub total: usize,
}
