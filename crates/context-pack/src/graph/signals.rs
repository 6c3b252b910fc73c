//! Per-node base signals: intent, diff, recency, hub and role.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::models::{IntentProfile, INTENT_ROLES};
use crate::query::tokenizer::token_set;

const IGNORED_INTENT_TOKENS: [&str; 2] = ["int", "intent"];

const ROLE_MATCH: f64 = 0.6;
const ROLE_MISMATCH: f64 = 0.2;
const ROLE_UNKNOWN: f64 = 0.4;

const DIFF_EXACT: f64 = 1.0;
const DIFF_SAME_DIR: f64 = 0.7;
const DIFF_SAME_ROOT: f64 = 0.4;

const SECONDS_PER_DAY: f64 = 86_400.0;

pub fn intent_profile(intent: &str, halflife: i64) -> IntentProfile {
    let tokens = token_set([intent]);
    let role = INTENT_ROLES
        .iter()
        .find(|role| tokens.contains(**role))
        .map(|role| role.to_string());
    let keywords = tokens
        .into_iter()
        .filter(|token| !IGNORED_INTENT_TOKENS.contains(&token.as_str()))
        .collect();
    IntentProfile {
        keywords,
        role,
        halflife,
    }
}

/// Fraction of intent keywords present in the node's token set.
pub fn intent_signal(keywords: &[String], node_tokens: &BTreeSet<String>) -> f64 {
    if keywords.is_empty() {
        return 0.0;
    }
    let hits = keywords.iter().filter(|kw| node_tokens.contains(*kw)).count();
    hits as f64 / keywords.len() as f64
}

/// Path overlap with the changed files: exact file, anywhere under a changed
/// file's directory, then same first path segment.
pub fn diff_signal(path: &str, diff_paths: &[String]) -> f64 {
    let diff_paths: Vec<&str> = diff_paths
        .iter()
        .map(String::as_str)
        .filter(|p| !p.is_empty())
        .collect();
    if diff_paths.is_empty() {
        return 0.0;
    }
    if diff_paths.contains(&path) {
        return DIFF_EXACT;
    }
    let under_changed_dir = diff_paths
        .iter()
        .filter_map(|d| d.rsplit_once('/').map(|(dir, _)| dir))
        .any(|dir| {
            path == dir
                || path
                    .strip_prefix(dir)
                    .is_some_and(|rest| rest.starts_with('/'))
        });
    if under_changed_dir {
        return DIFF_SAME_DIR;
    }
    let root = first_segment(path);
    if diff_paths.iter().any(|d| first_segment(d) == root) {
        return DIFF_SAME_ROOT;
    }
    0.0
}

fn first_segment(path: &str) -> &str {
    path.split('/').next().unwrap_or(path)
}

/// Exponential decay of the node's age; unparseable or missing timestamps
/// count as age zero.
pub fn recency_signal(mtime: Option<&str>, halflife: i64, now: DateTime<Utc>) -> f64 {
    let Some(modified) = mtime.and_then(parse_timestamp) else {
        return 1.0;
    };
    let age_days = ((now - modified).num_milliseconds() as f64 / 1000.0 / SECONDS_PER_DAY).max(0.0);
    (-age_days / halflife.max(1) as f64).exp()
}

/// RFC 3339, naive ISO-8601 date-times (read as UTC), or bare dates.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// `log1p(out) / log1p(max_out)`, zero for an edgeless graph.
pub fn hub_signal(out_degree: usize, max_out_degree: usize) -> f64 {
    if max_out_degree == 0 {
        return 0.0;
    }
    (out_degree as f64).ln_1p() / (max_out_degree as f64).ln_1p()
}

pub fn role_signal(node_role: Option<&str>, intent_role: Option<&str>) -> f64 {
    match intent_role {
        None => ROLE_UNKNOWN,
        Some(wanted) if node_role == Some(wanted) => ROLE_MATCH,
        Some(_) => ROLE_MISMATCH,
    }
}
