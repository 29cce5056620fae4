use std::fmt::Write;

use crate::indicators::{BLOCKERS_PRESENT, NEUTRAL_SCORE};
use crate::models::{CustomerRecord, EngagementBreakdown};

pub fn summarize_by_engagement(records: &[&CustomerRecord]) -> Vec<EngagementBreakdown> {
    let mut map: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();

    for record in records {
        *map.entry(record.engagement.as_str()).or_insert(0) += 1;
    }

    let mut breakdown: Vec<EngagementBreakdown> = map
        .into_iter()
        .map(|(label, count)| EngagementBreakdown {
            label: label.to_string(),
            count,
        })
        .collect();

    breakdown.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    breakdown
}

/// Truncated mean over the records that carry a health score.
pub fn average_health(records: &[&CustomerRecord]) -> Option<u32> {
    let scores: Vec<u32> = records.iter().filter_map(|record| record.health_score).collect();
    if scores.is_empty() {
        return None;
    }
    Some(scores.iter().sum::<u32>() / scores.len() as u32)
}

pub fn build_report(week: &str, records: &[&CustomerRecord]) -> String {
    let breakdown = summarize_by_engagement(records);

    let mut output = String::new();

    let _ = writeln!(output, "# Customer Engagement Report");
    let _ = writeln!(output, "Week of {} ({} customers)", week, records.len());
    let _ = writeln!(output);

    if records.is_empty() {
        let _ = writeln!(output, "No customers recorded for this week.");
        return output;
    }

    match average_health(records) {
        Some(avg) => {
            let _ = writeln!(output, "Average health score: {avg}");
        }
        None => {
            let _ = writeln!(output, "No health scores recorded.");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Engagement Mix");
    for entry in breakdown.iter() {
        let _ = writeln!(output, "- {}: {} customers", entry.label, entry.count);
    }

    let mut at_risk: Vec<(u32, &CustomerRecord)> = records
        .iter()
        .filter_map(|record| record.health_score.map(|score| (score, *record)))
        .filter(|(score, _)| *score < NEUTRAL_SCORE)
        .collect();
    at_risk.sort_by(|(a_score, a), (b_score, b)| {
        a_score
            .cmp(b_score)
            .then_with(|| a.company_name.cmp(&b.company_name))
    });

    let _ = writeln!(output);
    let _ = writeln!(output, "## Lowest Health");
    if at_risk.is_empty() {
        let _ = writeln!(output, "No customers below {NEUTRAL_SCORE}.");
    } else {
        for (score, record) in at_risk {
            let _ = writeln!(
                output,
                "- {} ({}) health {} [{}]",
                record.company_name, record.ese_lead, score, record.engagement
            );
        }
    }

    let blocked: Vec<&str> = records
        .iter()
        .filter(|record| record.blockers == BLOCKERS_PRESENT)
        .map(|record| record.company_name.as_str())
        .collect();

    let _ = writeln!(output);
    let _ = writeln!(output, "## Blockers");
    if blocked.is_empty() {
        let _ = writeln!(output, "No blockers reported.");
    } else {
        for name in blocked {
            let _ = writeln!(output, "- {name}");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Engagement Notes");
    let mut wrote_note = false;
    for record in records.iter().filter(|record| !record.summary.is_empty()) {
        let _ = writeln!(output, "- {}: {}", record.company_name, record.summary);
        wrote_note = true;
    }
    if !wrote_note {
        let _ = writeln!(output, "No engagement summaries yet.");
    }

    output
}
