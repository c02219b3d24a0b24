//! taskdeck validate command implementation
//!
//! Dangling sub-task ids are reported as warnings. Ambiguous parents and
//! cycles fail the command with an integrity error.

use super::Workspace;
use crate::error::{Error, Result};
use crate::graph::TaskGraph;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::tasks::TaskRecords;

pub async fn run(workspace: &Workspace, output: OutputOptions) -> Result<()> {
    let graph = TaskGraph::build(
        TaskRecords::new(workspace.scope(), &workspace.identity)
            .list()
            .await?,
    );
    let report = graph.validate();

    if let Some(conflict) = report.ambiguous_parents.first() {
        return Err(Error::AmbiguousParent {
            child: conflict.child,
            first: conflict.kept,
            second: conflict.ignored,
        });
    }
    if let Some(&id) = report.cyclic.first() {
        return Err(Error::CycleDetected(id));
    }

    let mut human = HumanOutput::new(format!(
        "Project {}: {} task(s) checked",
        workspace.project,
        graph.len()
    ));
    for dangling in &report.dangling {
        human.push_warning(format!(
            "task #{} lists missing sub-task #{}",
            dangling.parent, dangling.missing
        ));
    }
    if report.is_clean() {
        human.push_summary("status", "ok");
    }

    emit_success(output, "validate", &report, Some(&human))
}
