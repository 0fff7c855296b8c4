//! Index lifecycle management commands

use advisor_lib::ilm::{
    format_age, parse_es_duration, plan_move, sort_indices, IndexDetails, IndexFilter, ManagedIndex, MoveDecision,
    SortColumn, TargetPhase,
};
use advisor_lib::units::{bytes_size, from_human_size};
use advisor_lib::StructuredLogger;
use anyhow::{Context, Result};
use chrono::Duration;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tabled::Tabled;
use tracing::debug;

use crate::client::{ApiClient, IlmExplainIndex, MoveToStepRequest, StepKey};
use crate::config::Settings;
use crate::output::{color_phase, print_info, print_json, print_table, OutputFormat};

/// Row for index listing table
#[derive(Tabled, Serialize)]
struct IndexRow {
    #[tabled(rename = "Index")]
    index: String,
    #[tabled(rename = "Phase")]
    phase: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Step")]
    step: String,
    #[tabled(rename = "Policy")]
    policy: String,
    #[tabled(rename = "Age")]
    age: String,
    #[tabled(rename = "Size")]
    size: String,
}

impl From<&IndexDetails> for IndexRow {
    fn from(index: &IndexDetails) -> Self {
        Self {
            index: index.name.clone(),
            phase: color_phase(&index.phase),
            action: index.action.clone(),
            step: index.step.clone(),
            policy: index.policy.clone(),
            age: format_age(index.age),
            size: bytes_size(index.size as f64),
        }
    }
}

/// Options of `ilm list`
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub phase: Option<String>,
    pub ilm_policy: Option<String>,
    pub sort: Vec<String>,
    pub min_size: Option<String>,
    pub min_age_days: u32,
}

impl ListOptions {
    fn filter(&self) -> Result<IndexFilter> {
        let min_size = match self.min_size.as_deref() {
            Some(size) => from_human_size(size).context("Failed to parse minimum size")?,
            None => 0,
        };

        Ok(IndexFilter {
            phase: self.phase.clone(),
            policy: self.ilm_policy.clone(),
            min_size,
            min_age: Duration::days(i64::from(self.min_age_days)),
        })
    }

    fn sort_columns(&self) -> Result<Vec<SortColumn>> {
        Ok(self
            .sort
            .iter()
            .map(|column| column.parse::<SortColumn>())
            .collect::<advisor_lib::Result<Vec<_>>>()?)
    }
}

/// List ILM managed indices with their lifecycle position, age and size
pub async fn list(settings: &Settings, options: ListOptions, format: OutputFormat) -> Result<()> {
    let filter = options.filter()?;
    let columns = options.sort_columns()?;
    let client = settings.cluster_client()?;

    let indices = select_indices(&client, &filter, &columns).await?;

    match format {
        OutputFormat::Json => print_json(&indices),
        OutputFormat::Table => {
            let rows: Vec<IndexRow> = indices.iter().map(IndexRow::from).collect();
            print_table(&rows, format)
        }
    }
}

/// Fetch, filter and sort the managed indices of the cluster
pub async fn select_indices(
    client: &ApiClient,
    filter: &IndexFilter,
    columns: &[SortColumn],
) -> Result<Vec<IndexDetails>> {
    let mut sizes = HashMap::new();
    for index in client.cat_indices().await? {
        let size = match index.store_size.as_deref() {
            Some(size) => size
                .parse::<u64>()
                .with_context(|| format!("Malformed store size {size:?} of index {:?}", index.index))?,
            None => 0,
        };
        sizes.insert(index.index, size);
    }

    let explain = client.ilm_explain("_all").await?;

    let mut indices = Vec::with_capacity(explain.indices.len());
    for (name, managed) in explain.indices {
        if !managed.managed {
            continue;
        }

        let age = match managed.age.as_deref() {
            Some(age) => parse_es_duration(age)?,
            None => Duration::zero(),
        };
        let details = IndexDetails {
            size: sizes.get(&name).copied().unwrap_or_default(),
            name,
            phase: managed.phase.unwrap_or_default(),
            action: managed.action.unwrap_or_default(),
            step: managed.step.unwrap_or_default(),
            policy: managed.policy.unwrap_or_default(),
            age,
        };

        if filter.matches(&details) {
            indices.push(details);
        }
    }

    sort_indices(&mut indices, filter.phase.is_none(), columns);
    Ok(indices)
}

/// Options of `ilm move`
#[derive(Debug, Clone)]
pub struct MoveOptions {
    pub index_pattern: String,
    pub target_phase: String,
    pub force: bool,
    pub dry_run: bool,
}

fn managed_index(explain: &IlmExplainIndex) -> ManagedIndex {
    ManagedIndex {
        index: explain.index.clone(),
        phase: explain.phase.clone().unwrap_or_default(),
        action: explain.action.clone().unwrap_or_default(),
        step: explain.step.clone().unwrap_or_default(),
        policy: explain.policy.clone().unwrap_or_default(),
    }
}

/// Move the managed indices matching a pattern to another lifecycle phase
pub async fn move_indices(settings: &Settings, options: MoveOptions) -> Result<()> {
    let target: TargetPhase = options.target_phase.parse()?;
    let client = settings.cluster_client()?;
    let logger = StructuredLogger::new(settings.deployment_label());

    let moved = move_matching(&client, &options.index_pattern, target, options.force, options.dry_run, &logger).await?;
    if moved.is_empty() {
        print_info("No index moved");
    }
    Ok(())
}

/// Move (or with `dry_run` only report) every eligible index, returning their names
pub async fn move_matching(
    client: &ApiClient,
    index_pattern: &str,
    target: TargetPhase,
    force: bool,
    dry_run: bool,
    logger: &StructuredLogger,
) -> Result<Vec<String>> {
    let explain = client.ilm_explain(index_pattern).await?;
    let policies: BTreeMap<String, BTreeSet<String>> = client
        .ilm_policies()
        .await?
        .into_iter()
        .map(|(name, entry)| (name, entry.policy.phases.into_keys().collect()))
        .collect();

    let dry_run_prefix = if dry_run { "(DRY RUN) " } else { "" };
    let mut moved = Vec::new();

    for explained in explain.indices.values().filter(|index| index.managed) {
        let index = managed_index(explained);

        match plan_move(&index, target, force, &policies)? {
            MoveDecision::AlreadyInPhase => {
                println!("index {:?} is already in phase {:?}, skipping", index.index, index.phase);
                logger.log_index_skipped(&index.index, "already in target phase");
                continue;
            }
            MoveDecision::NotComplete => {
                println!(
                    "index {:?} is not in \"complete\" state (action: {:?}, step: {:?}) in its phase and --force is not given, skipping",
                    index.index, index.action, index.step
                );
                logger.log_index_skipped(&index.index, "phase not complete");
                continue;
            }
            MoveDecision::PhaseNotInPolicy => {
                println!(
                    "target phase {:?} is not defined in policy {:?} used by index {:?}",
                    target.as_str(),
                    index.policy,
                    index.index
                );
                logger.log_index_skipped(&index.index, "target phase not in policy");
                continue;
            }
            MoveDecision::Move => {}
        }

        println!(
            "{}move {:?} (phase: {:?}, action: {:?}, step: {:?}, policy: {:?}) to phase {:?}",
            dry_run_prefix,
            index.index,
            index.phase,
            index.action,
            index.step,
            index.policy,
            target.as_str()
        );

        if !dry_run {
            let request = MoveToStepRequest {
                current_step: StepKey {
                    phase: index.phase.clone(),
                    action: Some(index.action.clone()),
                    name: Some(index.step.clone()),
                },
                next_step: StepKey {
                    phase: target.to_string(),
                    action: None,
                    name: None,
                },
            };
            let response = client.ilm_move(&index.index, &request).await?;
            if !response.acknowledged {
                anyhow::bail!("move operation for {:?} has not been acknowledged", index.index);
            }
        }

        debug!(index = %index.index, target = %target, dry_run, "Index move issued");
        logger.log_index_moved(&index.index, &index.phase, target.as_str(), dry_run);
        moved.push(index.index);
    }

    Ok(moved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const EXPLAIN: &str = r#"{
        "indices": {
            "logs-000001": {
                "index": "logs-000001", "managed": true, "policy": "logs",
                "phase": "hot", "action": "complete", "step": "complete", "age": "12.5d"
            },
            "logs-000002": {
                "index": "logs-000002", "managed": true, "policy": "logs",
                "phase": "hot", "action": "rollover", "step": "check-rollover-ready", "age": "2d"
            },
            "metrics-000001": {
                "index": "metrics-000001", "managed": true, "policy": "metrics",
                "phase": "warm", "action": "complete", "step": "complete", "age": "40d"
            },
            "unmanaged": {"index": "unmanaged", "managed": false}
        }
    }"#;

    const POLICIES: &str = r#"{
        "logs": {"version": 1, "policy": {"phases": {"hot": {}, "warm": {}, "delete": {}}}},
        "metrics": {"version": 3, "policy": {"phases": {"hot": {}, "warm": {}}}}
    }"#;

    async fn cluster() -> mockito::ServerGuard {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/_cat/indices")
            .match_query(Matcher::Any)
            .with_body(
                r#"[
                    {"index": "logs-000001", "store.size": "5000"},
                    {"index": "logs-000002", "store.size": "100"},
                    {"index": "metrics-000001", "store.size": "9000"},
                    {"index": "closed", "store.size": null}
                ]"#,
            )
            .create_async()
            .await;
        server
            .mock("GET", Matcher::Regex(r"/_ilm/explain".into()))
            .match_query(Matcher::UrlEncoded("only_managed".into(), "true".into()))
            .with_body(EXPLAIN)
            .create_async()
            .await;
        server
            .mock("GET", "/_ilm/policy")
            .with_body(POLICIES)
            .create_async()
            .await;
        server
    }

    fn names(indices: &[IndexDetails]) -> Vec<&str> {
        indices.iter().map(|i| i.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_select_groups_by_phase_then_size() {
        let server = cluster().await;
        let client = ApiClient::new(&server.url()).unwrap();

        let indices = select_indices(&client, &IndexFilter::default(), &[SortColumn::Size])
            .await
            .unwrap();

        assert_eq!(names(&indices), vec!["logs-000001", "logs-000002", "metrics-000001"]);
        assert_eq!(indices[0].size, 5000);
        assert_eq!(indices[0].age, Duration::days(12));
    }

    #[tokio::test]
    async fn test_select_applies_filters() {
        let server = cluster().await;
        let client = ApiClient::new(&server.url()).unwrap();

        let options = ListOptions {
            min_size: Some("1k".to_string()),
            min_age_days: 10,
            ..Default::default()
        };
        let indices = select_indices(&client, &options.filter().unwrap(), &[]).await.unwrap();
        assert_eq!(names(&indices), vec!["logs-000001", "metrics-000001"]);

        let options = ListOptions {
            ilm_policy: Some("metrics".to_string()),
            ..Default::default()
        };
        let indices = select_indices(&client, &options.filter().unwrap(), &[]).await.unwrap();
        assert_eq!(names(&indices), vec!["metrics-000001"]);
    }

    #[test]
    fn test_invalid_options_rejected() {
        let options = ListOptions {
            sort: vec!["age".to_string(), "name".to_string()],
            ..Default::default()
        };
        assert!(options.sort_columns().is_err());

        let options = ListOptions {
            min_size: Some("lots".to_string()),
            ..Default::default()
        };
        assert!(options.filter().is_err());
    }

    #[tokio::test]
    async fn test_move_dry_run_issues_no_request() {
        let mut server = cluster().await;
        let post = server
            .mock("POST", Matcher::Regex(r"/_ilm/move".into()))
            .expect(0)
            .create_async()
            .await;
        let client = ApiClient::new(&server.url()).unwrap();

        let moved = move_matching(&client, "logs-*", TargetPhase::Warm, false, true, &StructuredLogger::new("test"))
            .await
            .unwrap();

        // logs-000002 is still rolling over, metrics-000001 is already warm
        assert_eq!(moved, vec!["logs-000001"]);
        post.assert_async().await;
    }

    #[tokio::test]
    async fn test_move_posts_step_keys() {
        let mut server = cluster().await;
        let post = server
            .mock("POST", "/logs-000001/_ilm/move")
            .match_body(Matcher::Json(serde_json::json!({
                "current_step": {"phase": "hot", "action": "complete", "name": "complete"},
                "next_step": {"phase": "delete"}
            })))
            .with_body(r#"{"acknowledged": true}"#)
            .create_async()
            .await;
        let client = ApiClient::new(&server.url()).unwrap();

        let moved = move_matching(&client, "*", TargetPhase::Delete, false, false, &StructuredLogger::new("test"))
            .await
            .unwrap();

        // metrics has no delete phase
        assert_eq!(moved, vec!["logs-000001"]);
        post.assert_async().await;
    }

    #[tokio::test]
    async fn test_move_not_acknowledged_is_an_error() {
        let mut server = cluster().await;
        server
            .mock("POST", Matcher::Regex(r"/_ilm/move".into()))
            .with_body(r#"{"acknowledged": false}"#)
            .create_async()
            .await;
        let client = ApiClient::new(&server.url()).unwrap();

        let err = move_matching(&client, "*", TargetPhase::Delete, true, false, &StructuredLogger::new("test"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("has not been acknowledged"), "{err}");
    }
}
