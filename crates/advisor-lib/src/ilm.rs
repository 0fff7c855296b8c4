//! Index lifecycle management helpers
//!
//! Filtering and ordering of ILM managed indices for listing, and the
//! pre-condition checks run before moving an index to another phase.

use chrono::Duration;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Lifecycle phases in the order data flows through them
pub const PHASE_ORDER: [&str; 4] = ["hot", "warm", "cold", "frozen"];

/// One ILM managed index with its size
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexDetails {
    pub name: String,
    pub phase: String,
    pub action: String,
    pub step: String,
    pub policy: String,
    #[serde(serialize_with = "serialize_age")]
    pub age: Duration,
    pub size: u64,
}

fn serialize_age<S: serde::Serializer>(age: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_age(*age))
}

/// Criteria an index has to meet to be listed
#[derive(Debug, Clone)]
pub struct IndexFilter {
    pub phase: Option<String>,
    pub policy: Option<String>,
    pub min_size: u64,
    pub min_age: Duration,
}

impl Default for IndexFilter {
    fn default() -> Self {
        Self {
            phase: None,
            policy: None,
            min_size: 0,
            min_age: Duration::zero(),
        }
    }
}

impl IndexFilter {
    pub fn matches(&self, index: &IndexDetails) -> bool {
        if self.phase.as_ref().is_some_and(|phase| *phase != index.phase) {
            return false;
        }
        if self.policy.as_ref().is_some_and(|policy| *policy != index.policy) {
            return false;
        }
        index.size >= self.min_size && index.age >= self.min_age
    }
}

/// Column an index listing can be sorted by, largest first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Age,
    Size,
}

impl FromStr for SortColumn {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "age" => Ok(SortColumn::Age),
            "size" => Ok(SortColumn::Size),
            _ => Err(Error::InvalidSortColumn { value: s.to_string() }),
        }
    }
}

/// Sort key placing known phases first, unknown ones after and grouped
fn phase_rank(phase: &str) -> (usize, &str) {
    match PHASE_ORDER.iter().position(|p| *p == phase) {
        Some(rank) => (rank, ""),
        None => (PHASE_ORDER.len(), phase),
    }
}

/// Order indices by phase (if the listing spans phases), then by each
/// requested column, then by name.
pub fn sort_indices(indices: &mut [IndexDetails], group_by_phase: bool, columns: &[SortColumn]) {
    indices.sort_by(|a, b| {
        let mut ordering = if group_by_phase {
            phase_rank(&a.phase).cmp(&phase_rank(&b.phase))
        } else {
            Ordering::Equal
        };

        for column in columns {
            ordering = ordering.then_with(|| match column {
                SortColumn::Age => b.age.cmp(&a.age),
                SortColumn::Size => b.size.cmp(&a.size),
            });
        }

        ordering.then_with(|| a.name.cmp(&b.name))
    });
}

/// Parse an Elasticsearch time value such as `3.2d`, `12h` or `150ms`.
///
/// Day values are truncated to whole days.
pub fn parse_es_duration(value: &str) -> Result<Duration> {
    let malformed = || Error::MalformedDuration {
        value: value.to_string(),
    };

    let split = value
        .find(|c: char| c.is_ascii_alphabetic())
        .ok_or_else(malformed)?;
    let (number, unit) = value.split_at(split);
    let number: f64 = number.parse().map_err(|_| malformed())?;
    if number < 0.0 {
        return Err(malformed());
    }

    if unit == "d" {
        return Duration::try_days(number.trunc() as i64).ok_or_else(malformed);
    }

    let nanos_per_unit: f64 = match unit {
        "h" => 3_600e9,
        "m" => 60e9,
        "s" => 1e9,
        "ms" => 1e6,
        "micros" => 1e3,
        "nanos" => 1.0,
        _ => return Err(malformed()),
    };

    let nanos = number * nanos_per_unit;
    if nanos >= i64::MAX as f64 {
        return Err(malformed());
    }
    Ok(Duration::nanoseconds(nanos as i64))
}

/// Render an age with a focus on days and years.
///
/// Below one day the clock form `3h5m0s` is used. From one day on only
/// years (of 365 days) and days are shown, e.g. `1y12d`.
pub fn format_age(age: Duration) -> String {
    if age < Duration::days(1) {
        return format_clock(age);
    }

    let mut days = age.num_days();
    let mut out = String::new();
    if days >= 365 {
        out.push_str(&format!("{}y", days / 365));
        days %= 365;
    }
    out.push_str(&format!("{days}d"));
    out
}

fn format_clock(age: Duration) -> String {
    let millis = age.num_milliseconds();
    if millis == 0 {
        return "0s".to_string();
    }
    if millis < 1000 {
        return format!("{millis}ms");
    }

    let total_secs = millis / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = match millis % 1000 {
        0 => format!("{}s", total_secs % 60),
        fraction => {
            let fraction = format!("{fraction:03}");
            format!("{}.{}s", total_secs % 60, fraction.trim_end_matches('0'))
        }
    };

    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}")
    } else {
        seconds
    }
}

/// Phase an index can be moved to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetPhase {
    Hot,
    Warm,
    Cold,
    Frozen,
    Delete,
}

impl TargetPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetPhase::Hot => "hot",
            TargetPhase::Warm => "warm",
            TargetPhase::Cold => "cold",
            TargetPhase::Frozen => "frozen",
            TargetPhase::Delete => "delete",
        }
    }
}

impl fmt::Display for TargetPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetPhase {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "hot" => Ok(TargetPhase::Hot),
            "warm" => Ok(TargetPhase::Warm),
            "cold" => Ok(TargetPhase::Cold),
            "frozen" => Ok(TargetPhase::Frozen),
            "delete" => Ok(TargetPhase::Delete),
            _ => Err(Error::InvalidPhase { value: s.to_string() }),
        }
    }
}

/// ILM position of a managed index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManagedIndex {
    pub index: String,
    pub phase: String,
    pub action: String,
    pub step: String,
    pub policy: String,
}

impl ManagedIndex {
    fn is_complete(&self) -> bool {
        self.action == "complete" && self.step == "complete"
    }
}

/// Outcome of the pre-condition checks for moving one index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDecision {
    AlreadyInPhase,
    NotComplete,
    PhaseNotInPolicy,
    Move,
}

/// Decide whether `index` can be moved to `target`.
///
/// `policies` maps each ILM policy name to the phases it defines. An
/// index whose policy is unknown is an error.
pub fn plan_move(
    index: &ManagedIndex,
    target: TargetPhase,
    force: bool,
    policies: &BTreeMap<String, BTreeSet<String>>,
) -> Result<MoveDecision> {
    if index.phase == target.as_str() {
        return Ok(MoveDecision::AlreadyInPhase);
    }

    if !force && !index.is_complete() {
        return Ok(MoveDecision::NotComplete);
    }

    let phases = policies.get(&index.policy).ok_or_else(|| Error::PolicyNotFound {
        policy: index.policy.clone(),
    })?;

    if !phases.contains(target.as_str()) {
        return Ok(MoveDecision::PhaseNotInPolicy);
    }

    Ok(MoveDecision::Move)
}
