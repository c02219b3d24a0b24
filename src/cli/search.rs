//! taskdeck search command implementation

use serde::Serialize;

use super::Workspace;
use crate::error::{Error, Result};
use crate::model::RecordId;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::search::{search_tasks, SearchOptions};
use crate::tasks::TaskRecords;

#[derive(Serialize)]
struct SearchMatch {
    id: RecordId,
    name: String,
    score: Option<f64>,
}

#[derive(Serialize)]
struct SearchReport {
    query: String,
    total: usize,
    matches: Vec<SearchMatch>,
}

pub async fn run(
    workspace: &Workspace,
    query: &str,
    limit: Option<usize>,
    output: OutputOptions,
) -> Result<()> {
    if query.trim().is_empty() {
        return Err(Error::InvalidArgument("search query must not be empty".to_string()));
    }

    let tasks = TaskRecords::new(workspace.scope(), &workspace.identity)
        .list()
        .await?;
    let options = SearchOptions::new(&workspace.config.search);
    let results = search_tasks(&tasks, query, &options);

    let mut matches: Vec<SearchMatch> = results
        .hits()
        .iter()
        .filter_map(|hit| {
            tasks.iter().find(|task| task.id == hit.id).map(|task| SearchMatch {
                id: task.id,
                name: task.name.clone(),
                score: hit.score,
            })
        })
        .collect();
    let total = matches.len();
    if let Some(limit) = limit {
        matches.truncate(limit);
    }

    let mut human = HumanOutput::new(format!("{total} match(es) for \"{query}\""));
    for found in &matches {
        let score = found.score.map(|s| format!("{s:.3}")).unwrap_or_else(|| "-".to_string());
        human.push_detail(format!("{score}  {} #{}", found.name, found.id));
    }

    let report = SearchReport {
        query: query.to_string(),
        total,
        matches,
    };
    emit_success(output, "search", &report, Some(&human))
}
