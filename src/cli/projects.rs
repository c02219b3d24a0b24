//! taskdeck projects command implementation

use serde::Serialize;

use crate::error::Result;
use crate::module::ModuleContext;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::projects::ProjectRecords;
use crate::store::RecordStore;

#[derive(Serialize)]
struct ProjectSummary {
    id: i64,
    name: String,
    shorty: String,
    tasks: usize,
}

pub async fn run(store: &dyn RecordStore, module: &ModuleContext, output: OutputOptions) -> Result<()> {
    let projects = ProjectRecords::new(store, module.id).projects().await?;

    let mut summaries = Vec::with_capacity(projects.len());
    for project in projects {
        let tasks = store
            .data_values(module.id, project.id)
            .await?
            .iter()
            .filter(|record| record.value.kind() == "task")
            .count();
        summaries.push(ProjectSummary {
            id: project.id,
            name: project.name,
            shorty: project.shorty,
            tasks,
        });
    }

    let mut human = HumanOutput::new(format!("{} project(s)", summaries.len()));
    for summary in &summaries {
        human.push_detail(format!(
            "{} {} ({}, {} task(s))",
            summary.id, summary.name, summary.shorty, summary.tasks
        ));
    }
    if !module.is_resolved() {
        human.push_warning(format!("module '{}' is not in the snapshot", module.key));
    }

    emit_success(output, "projects", &summaries, Some(&human))
}
