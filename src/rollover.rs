use std::path::Path;

use anyhow::{bail, Context};
use chrono::NaiveDate;

use crate::models::{CustomerRecord, Dataset, RollSummary};
use crate::store;
use crate::week::{format_week, is_sunday, next_sunday, parse_week};

#[derive(Debug)]
pub enum RollOutcome {
    Rolled(RollSummary),
    Cancelled,
}

/// Clones the latest week of `dataset` into `target` (or the next Sunday
/// after the latest week) with the summary cleared. The target week's
/// previous records, if any, are replaced.
///
/// `confirm` is asked before rolling onto a non-Sunday date and before
/// replacing a week that already exists. A refusal returns
/// [`RollOutcome::Cancelled`] and leaves `dataset` untouched.
pub fn roll_forward(
    dataset: &mut Dataset,
    target: Option<NaiveDate>,
    mut confirm: impl FnMut(&str) -> anyhow::Result<bool>,
) -> anyhow::Result<RollOutcome> {
    if dataset.data.is_empty() {
        bail!("no customer data found");
    }

    let Some(newest_week) = dataset.latest_week() else {
        bail!("no weeks found in data");
    };

    let new_week = match target {
        Some(date) => {
            if !is_sunday(date) {
                log::warn!("{date} is not a Sunday (it's a {})", date.format("%A"));
                if !confirm("Continue anyway?")? {
                    return Ok(RollOutcome::Cancelled);
                }
            }
            format_week(date)
        }
        None => {
            let newest = parse_week(&newest_week)
                .with_context(|| format!("latest week {newest_week} is not a valid date"))?;
            format_week(next_sunday(newest))
        }
    };

    // An explicit target may name the newest week itself; the copy then
    // comes from the week before it so re-running a roll replaces it.
    let Some(latest_week) = dataset.weeks().into_iter().find(|week| *week != new_week) else {
        bail!("no customers found to copy into week {new_week}");
    };
    if latest_week == newest_week {
        log::info!("Latest week: {latest_week}");
    } else {
        log::info!("Latest week: {newest_week} is being replaced, copying from {latest_week}");
    }
    log::info!("New week: {new_week}");

    let exists = dataset.data.iter().any(|record| record.week == new_week);
    if exists {
        log::warn!("Week {new_week} already exists in the data");
        if !confirm(&format!("Overwrite existing data for week {new_week}?"))? {
            return Ok(RollOutcome::Cancelled);
        }
    }

    let (replaced, mut retained): (Vec<CustomerRecord>, Vec<CustomerRecord>) = dataset
        .data
        .iter()
        .cloned()
        .partition(|record| record.week == new_week);

    let clones: Vec<CustomerRecord> = retained
        .iter()
        .filter(|record| record.week == latest_week)
        .map(|record| CustomerRecord {
            week: new_week.clone(),
            summary: String::new(),
            ..record.clone()
        })
        .collect();

    if clones.is_empty() {
        bail!("no customers found for week {latest_week}");
    }
    log::info!("Found {} customers to copy", clones.len());

    let copied = clones.len();
    retained.extend(clones);
    sort_records(&mut retained);

    dataset.total = retained.len();
    dataset.data = retained;

    Ok(RollOutcome::Rolled(RollSummary {
        latest_week,
        new_week,
        copied,
        replaced: replaced.len(),
        total: dataset.total,
    }))
}

/// Newest week first; within a week, company names in descending order.
pub fn sort_records(records: &mut [CustomerRecord]) {
    records.sort_by(|a, b| {
        (b.week.as_str(), b.company_name.as_str()).cmp(&(a.week.as_str(), a.company_name.as_str()))
    });
}

/// Loads the dataset, rolls it forward and persists it together with the
/// week index. Nothing is written unless the roll succeeds.
pub fn roll_week_file(
    dataset_path: &Path,
    week_index_path: &Path,
    target: Option<NaiveDate>,
    confirm: impl FnMut(&str) -> anyhow::Result<bool>,
) -> anyhow::Result<RollOutcome> {
    let mut dataset = store::load_dataset(dataset_path)?;
    let outcome = roll_forward(&mut dataset, target, confirm)?;

    if let RollOutcome::Rolled(_) = outcome {
        store::save_dataset_with_index(dataset_path, week_index_path, &dataset)?;
        log::info!("Saved data to {}", dataset_path.display());
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DATASET_FILE, WEEK_INDEX_FILE};

    fn record(week: &str, company: &str) -> CustomerRecord {
        CustomerRecord {
            week: week.to_string(),
            company_name: company.to_string(),
            engagement: "Active".to_string(),
            health_score: Some(75),
            summary: format!("{company} notes for {week}"),
            last_updated: week.to_string(),
            ..Default::default()
        }
    }

    fn two_weeks() -> Dataset {
        Dataset::new(
            vec![
                record("2026-01-11", "Acme"),
                record("2026-01-11", "Globex"),
                record("2026-01-11", "Initech"),
                record("2026-01-04", "Acme"),
                record("2026-01-04", "Globex"),
                record("2026-01-04", "Initech"),
            ],
            Some("2026-01-12T08:00:00Z".to_string()),
        )
    }

    fn date(value: &str) -> NaiveDate {
        parse_week(value).unwrap()
    }

    fn never_asked(prompt: &str) -> anyhow::Result<bool> {
        panic!("unexpected prompt: {prompt}")
    }

    fn unwrap_rolled(outcome: RollOutcome) -> RollSummary {
        match outcome {
            RollOutcome::Rolled(summary) => summary,
            RollOutcome::Cancelled => panic!("roll was cancelled"),
        }
    }

    #[test]
    fn rolls_latest_week_to_next_sunday() {
        let mut dataset = two_weeks();
        let summary = unwrap_rolled(roll_forward(&mut dataset, None, never_asked).unwrap());

        assert_eq!(summary.latest_week, "2026-01-11");
        assert_eq!(summary.new_week, "2026-01-18");
        assert_eq!(summary.copied, 3);
        assert_eq!(dataset.total, 9);
        assert_eq!(dataset.data.len(), 9);
        assert_eq!(dataset.generated.as_deref(), Some("2026-01-12T08:00:00Z"));

        let new_week: Vec<&CustomerRecord> = dataset.records_for_week("2026-01-18").collect();
        assert_eq!(new_week.len(), 3);
        for clone in new_week {
            assert_eq!(clone.summary, "");
            let source = dataset
                .records_for_week("2026-01-11")
                .find(|record| record.company_name == clone.company_name)
                .unwrap();
            assert_eq!(
                CustomerRecord {
                    week: source.week.clone(),
                    summary: source.summary.clone(),
                    ..clone.clone()
                },
                *source
            );
            assert_eq!(clone.last_updated, "2026-01-11");
        }
    }

    #[test]
    fn sorts_by_week_then_company_descending() {
        let mut dataset = two_weeks();
        roll_forward(&mut dataset, None, never_asked).unwrap();

        let keys: Vec<(&str, &str)> = dataset
            .data
            .iter()
            .map(|record| (record.week.as_str(), record.company_name.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("2026-01-18", "Initech"),
                ("2026-01-18", "Globex"),
                ("2026-01-18", "Acme"),
                ("2026-01-11", "Initech"),
                ("2026-01-11", "Globex"),
                ("2026-01-11", "Acme"),
                ("2026-01-04", "Initech"),
                ("2026-01-04", "Globex"),
                ("2026-01-04", "Acme"),
            ]
        );
    }

    #[test]
    fn overwriting_existing_week_is_idempotent() {
        let mut dataset = two_weeks();
        roll_forward(&mut dataset, Some(date("2026-01-18")), never_asked).unwrap();
        assert_eq!(dataset.total, 9);

        let mut prompts = Vec::new();
        let mut dataset_again = two_weeks();
        roll_forward(&mut dataset_again, None, never_asked).unwrap();
        let summary = unwrap_rolled(
            roll_forward(&mut dataset_again, Some(date("2026-01-18")), |prompt| {
                prompts.push(prompt.to_string());
                Ok(true)
            })
            .unwrap(),
        );

        assert_eq!(prompts, vec!["Overwrite existing data for week 2026-01-18?"]);
        assert_eq!(summary.replaced, 3);
        assert_eq!(summary.latest_week, "2026-01-11");
        assert_eq!(dataset_again.total, 9);
    }

    #[test]
    fn refusing_overwrite_cancels() {
        let mut dataset = two_weeks();
        let before = dataset.clone();

        let outcome = roll_forward(&mut dataset, Some(date("2026-01-04")), |_| Ok(false)).unwrap();

        assert!(matches!(outcome, RollOutcome::Cancelled));
        assert_eq!(dataset, before);
    }

    #[test]
    fn replacing_an_older_week_copies_latest() {
        let mut dataset = two_weeks();
        let summary =
            unwrap_rolled(roll_forward(&mut dataset, Some(date("2026-01-04")), |_| Ok(true)).unwrap());

        assert_eq!(summary.replaced, 3);
        assert_eq!(summary.copied, 3);
        assert_eq!(dataset.total, 6);
        assert!(dataset.records_for_week("2026-01-04").all(|record| record.summary.is_empty()));
    }

    #[test]
    fn non_sunday_target_needs_confirmation() {
        let mut dataset = two_weeks();
        let mut prompts = 0;
        let outcome = roll_forward(&mut dataset, Some(date("2026-01-19")), |_| {
            prompts += 1;
            Ok(false)
        })
        .unwrap();

        assert!(matches!(outcome, RollOutcome::Cancelled));
        assert_eq!(prompts, 1);
        assert_eq!(dataset.total, 6);

        let summary =
            unwrap_rolled(roll_forward(&mut dataset, Some(date("2026-01-19")), |_| Ok(true)).unwrap());
        assert_eq!(summary.new_week, "2026-01-19");
    }

    #[test]
    fn rerolling_the_newest_week_copies_the_week_before() {
        let mut dataset = two_weeks();
        let summary =
            unwrap_rolled(roll_forward(&mut dataset, Some(date("2026-01-11")), |_| Ok(true)).unwrap());

        assert_eq!(summary.latest_week, "2026-01-04");
        assert_eq!(summary.new_week, "2026-01-11");
        assert_eq!(summary.replaced, 3);
        assert_eq!(dataset.total, 6);
        assert!(dataset.records_for_week("2026-01-11").all(|record| record.summary.is_empty()));
    }

    #[test]
    fn single_week_cannot_replace_itself() {
        let mut dataset = Dataset::new(vec![record("2026-01-11", "Acme")], None);
        let before = dataset.clone();

        let err = roll_forward(&mut dataset, Some(date("2026-01-11")), never_asked).unwrap_err();

        assert!(err.to_string().contains("no customers found to copy into week 2026-01-11"));
        assert_eq!(dataset, before);
    }

    #[test]
    fn empty_dataset_fails() {
        let mut dataset = Dataset::default();
        let err = roll_forward(&mut dataset, None, never_asked).unwrap_err();
        assert!(err.to_string().contains("no customer data found"));
    }

    #[test]
    fn records_without_week_fail() {
        let mut dataset = Dataset::new(vec![record("", "Acme")], None);
        let err = roll_forward(&mut dataset, None, never_asked).unwrap_err();
        assert!(err.to_string().contains("no weeks found"));
    }

    #[test]
    fn file_roll_persists_dataset_and_index() {
        let dir = tempfile::tempdir().unwrap();
        let dataset_path = dir.path().join(DATASET_FILE);
        let index_path = dir.path().join(WEEK_INDEX_FILE);
        store::save_dataset(&dataset_path, &two_weeks()).unwrap();

        let outcome = roll_week_file(&dataset_path, &index_path, None, never_asked).unwrap();
        assert!(matches!(outcome, RollOutcome::Rolled(_)));

        let saved = store::load_dataset(&dataset_path).unwrap();
        assert_eq!(saved.total, 9);
        assert_eq!(saved.latest_week().as_deref(), Some("2026-01-18"));
        assert!(index_path.exists());
    }

    #[test]
    fn file_roll_keeps_the_rest_of_the_document() {
        let dir = tempfile::tempdir().unwrap();
        let dataset_path = dir.path().join(DATASET_FILE);
        let index_path = dir.path().join(WEEK_INDEX_FILE);
        std::fs::write(
            &dataset_path,
            r#"{
              "data": [
                {"week": "2026-01-11", "companyName": "Acme", "healthScore": 75, "summary": "call went well"},
                {"week": "2026-01-04", "companyName": "Legacy"}
              ],
              "total": 2,
              "generated": "2026-01-12T08:00:00Z",
              "source": "sharepoint"
            }"#,
        )
        .unwrap();

        roll_week_file(&dataset_path, &index_path, None, never_asked).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&dataset_path).unwrap()).unwrap();
        assert_eq!(value["source"], "sharepoint");
        assert_eq!(value["generated"], "2026-01-12T08:00:00Z");
        assert_eq!(value["total"], 3);

        let records = value["data"].as_array().unwrap();
        let legacy = records.iter().find(|record| record["companyName"] == "Legacy").unwrap();
        assert!(legacy.get("healthScore").is_none());
        let rolled = records.iter().find(|record| record["week"] == "2026-01-18").unwrap();
        assert_eq!(rolled["healthScore"], 75);
        assert_eq!(rolled["summary"], "");
    }

    #[test]
    fn cancelled_file_roll_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let dataset_path = dir.path().join(DATASET_FILE);
        let index_path = dir.path().join(WEEK_INDEX_FILE);
        store::save_dataset(&dataset_path, &two_weeks()).unwrap();
        let before = std::fs::read(&dataset_path).unwrap();

        let outcome =
            roll_week_file(&dataset_path, &index_path, Some(date("2026-01-04")), |_| Ok(false)).unwrap();

        assert!(matches!(outcome, RollOutcome::Cancelled));
        assert_eq!(std::fs::read(&dataset_path).unwrap(), before);
        assert!(!index_path.exists());
    }

    #[test]
    fn failed_file_roll_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let dataset_path = dir.path().join(DATASET_FILE);
        let index_path = dir.path().join(WEEK_INDEX_FILE);
        store::save_dataset(&dataset_path, &Dataset::default()).unwrap();
        let before = std::fs::read(&dataset_path).unwrap();

        assert!(roll_week_file(&dataset_path, &index_path, None, never_asked).is_err());
        assert_eq!(std::fs::read(&dataset_path).unwrap(), before);
    }
}
