//! taskdeck moves command implementation

use std::path::PathBuf;

use serde::Serialize;

use crate::config::Config;
use crate::error::Result;
use crate::journal::{MoveIntent, MoveJournal};
use crate::model::iso8601;
use crate::output::{emit_success, HumanOutput, OutputOptions};

/// Options for the moves list command
pub struct ListOptions {
    pub config: Config,
    pub base_dir: PathBuf,
    pub all: bool,
    pub output: OutputOptions,
}

/// Options for the moves show command
pub struct ShowOptions {
    pub config: Config,
    pub base_dir: PathBuf,
    pub id: String,
    pub output: OutputOptions,
}

#[derive(Serialize)]
struct MoveList {
    journal: PathBuf,
    moves: Vec<MoveIntent>,
}

fn describe(intent: &MoveIntent) -> String {
    let mut line = format!(
        "{} task #{} {} -> {} [{}] {}/{} cloned, {} deleted",
        intent.move_id,
        intent.root,
        intent.source_project,
        intent.target_project,
        intent.phase.as_str(),
        intent.id_map.len(),
        intent.post_order.len(),
        intent.deleted.len()
    );
    if let Some(error) = &intent.last_error {
        line.push_str(&format!(" (last error: {error})"));
    }
    line
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let journal = MoveJournal::from_config(&options.base_dir, &options.config);
    let moves = if options.all {
        journal.all()?
    } else {
        journal.pending()?
    };

    let label = if options.all { "move(s)" } else { "pending move(s)" };
    let mut human = HumanOutput::new(format!("{} {label}", moves.len()));
    human.push_summary("journal", journal.dir().display().to_string());
    for intent in &moves {
        human.push_detail(describe(intent));
    }

    let report = MoveList {
        journal: journal.dir().to_path_buf(),
        moves,
    };
    emit_success(options.output, "moves list", &report, Some(&human))
}

pub fn run_show(options: ShowOptions) -> Result<()> {
    let journal = MoveJournal::from_config(&options.base_dir, &options.config);
    let intent = journal.load(&options.id)?;

    let mut human = HumanOutput::new(describe(&intent));
    human.push_summary("created", iso8601::format(&intent.created_at));
    human.push_summary("updated", iso8601::format(&intent.updated_at));
    human.push_summary("actor", intent.actor.to_string());
    if let Some(parent) = intent.parent {
        human.push_summary("former parent", format!("#{parent}"));
    }
    for (old, new) in &intent.id_map {
        human.push_detail(format!("#{old} -> #{new}"));
    }
    if intent.is_pending() {
        if intent.can_roll_back() {
            human.push_next_step("resume or roll back the move from the host");
        } else {
            human.push_next_step("resume the move from the host; originals are partly deleted");
        }
    }

    emit_success(options.output, "moves show", &intent, Some(&human))
}
