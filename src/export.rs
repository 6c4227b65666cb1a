use std::fmt::Write;

use crate::models::{Submission, Track};

/// Column set for a CSV export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportView {
    All,
    Scoring,
}

impl ExportView {
    pub fn parse(s: &str) -> Self {
        match s {
            "scoring" => ExportView::Scoring,
            _ => ExportView::All,
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            ExportView::All => "grantdesk_submissions.csv",
            ExportView::Scoring => "grantdesk_scoring_export.csv",
        }
    }
}

/// Flattened payload columns shown next to the identity columns.
pub const GRANT_COLUMNS: &[(&str, &str)] = &[
    ("Org Name", "org_name"),
    ("Project Title", "project_title"),
    ("School", "school"),
    ("Advisor Name", "advisor_name"),
    ("Budget Total", "budget_total"),
];

pub const POSTER_COLUMNS: &[(&str, &str)] = &[
    ("Category", "category"),
    ("Lead Author", "lead_author"),
    ("Title", "title"),
];

const SCORING_COLUMNS: &[(&str, &str)] = &[
    ("Org Name", "org_name"),
    ("School", "school"),
    ("Project Title", "project_title"),
    ("Budget Total", "budget_total"),
];

/// Header and rows for the admin table.
pub fn table(submissions: &[Submission], track: Option<Track>) -> (Vec<String>, Vec<Vec<String>>) {
    let flattened: Vec<(&str, &str)> = match track {
        Some(Track::Poster) => POSTER_COLUMNS.to_vec(),
        Some(_) => GRANT_COLUMNS.to_vec(),
        None => GRANT_COLUMNS.iter().chain(POSTER_COLUMNS).copied().collect(),
    };
    let show_poster_url = !matches!(track, Some(Track::Organization) | Some(Track::Student));

    let mut header: Vec<String> = ["ID", "Track", "Submitted", "Name", "Email", "Phone"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    header.extend(flattened.iter().map(|(label, _)| label.to_string()));
    if show_poster_url {
        header.push("Poster URL".to_string());
    }

    let rows = submissions
        .iter()
        .map(|sub| {
            let mut row = vec![
                sub.id.to_string(),
                sub.track.clone(),
                sub.created_at.format("%Y-%m-%d %H:%M").to_string(),
                sub.applicant_name.clone(),
                sub.email.clone(),
                sub.phone.clone(),
            ];
            row.extend(flattened.iter().map(|(_, key)| sub.payload_str(key)));
            if show_poster_url {
                row.push(sub.upload_url("poster"));
            }
            row
        })
        .collect();

    (header, rows)
}

pub fn to_csv(submissions: &[Submission], view: ExportView) -> String {
    match view {
        ExportView::All => export_all(submissions),
        ExportView::Scoring => export_scoring(submissions),
    }
}

fn export_all(submissions: &[Submission]) -> String {
    let mut csv = String::new();

    // Collect all unique keys from payloads and uploads
    let mut payload_keys: Vec<String> = Vec::new();
    let mut upload_keys: Vec<String> = Vec::new();
    for sub in submissions {
        collect_keys(&sub.payload_json, &mut payload_keys);
        collect_keys(&sub.uploads_json, &mut upload_keys);
    }

    let _ = write!(csv, "id,track,created_at,applicant_name,email,phone");
    for key in &payload_keys {
        let _ = write!(csv, ",{}", csv_escape(key));
    }
    for key in &upload_keys {
        let _ = write!(csv, ",{}", csv_escape(&format!("upload_{key}")));
    }
    let _ = writeln!(csv);

    for sub in submissions {
        write_identity(&mut csv, sub);
        for key in &payload_keys {
            let _ = write!(csv, ",{}", csv_escape(&cell(&sub.payload_json, key)));
        }
        for key in &upload_keys {
            let _ = write!(csv, ",{}", csv_escape(&sub.upload_url(key)));
        }
        let _ = writeln!(csv);
    }

    csv
}

fn export_scoring(submissions: &[Submission]) -> String {
    let mut csv = String::new();

    let _ = write!(csv, "id,track,created_at,applicant_name,email,phone");
    for (label, _) in SCORING_COLUMNS {
        let _ = write!(csv, ",{}", csv_escape(label));
    }
    let _ = writeln!(csv);

    for sub in submissions {
        write_identity(&mut csv, sub);
        for (_, key) in SCORING_COLUMNS {
            let _ = write!(csv, ",{}", csv_escape(&sub.payload_str(key)));
        }
        let _ = writeln!(csv);
    }

    csv
}

fn write_identity(csv: &mut String, sub: &Submission) {
    let _ = write!(
        csv,
        "{},{},{},{},{},{}",
        sub.id,
        csv_escape(&sub.track),
        sub.created_at.to_rfc3339(),
        csv_escape(&sub.applicant_name),
        csv_escape(&sub.email),
        csv_escape(&sub.phone),
    );
}

fn collect_keys(value: &serde_json::Value, keys: &mut Vec<String>) {
    if let Some(obj) = value.as_object() {
        for key in obj.keys() {
            if !keys.contains(key) {
                keys.push(key.clone());
            }
        }
    }
}

fn cell(value: &serde_json::Value, key: &str) -> String {
    match value.get(key) {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
