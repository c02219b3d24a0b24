//! Command-line interface for taskdeck
//!
//! The CLI inspects a JSON snapshot exported from the host. It loads the
//! snapshot into an in-memory store and runs the same engine the plugin
//! uses; nothing is written back to the snapshot.
//! Each subcommand is defined in its own submodule.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::actor::{self, StaticIdentity};
use crate::config::{Config, CONFIG_FILE};
use crate::error::{Error, Result};
use crate::filter::SortBy;
use crate::model::ProjectId;
use crate::module::ModuleContext;
use crate::output::OutputOptions;
use crate::projects::ProjectRecords;
use crate::store::{InMemoryStore, ProjectScope, Snapshot};

mod due;
mod moves;
mod projects;
mod recurring;
mod search;
mod tree;
mod validate;
mod visible;

/// taskdeck - task graph inspection
///
/// Reads a snapshot of the task module's records and shows hierarchy, due
/// dates, search results, visibility and pending moves.
#[derive(Parser, Debug)]
#[command(name = "taskdeck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Snapshot file exported from the host
    #[arg(long, global = true, env = "TASKDECK_DATA", default_value = "taskdeck.json")]
    pub data: PathBuf,

    /// Project (data category) id; may be omitted when there is only one
    #[arg(short, long, global = true)]
    pub project: Option<ProjectId>,

    /// Configuration file (defaults to ./taskdeck.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Person id recorded in activity entries
    #[arg(long, global = true)]
    pub actor: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the projects in the snapshot
    Projects,

    /// Show the task hierarchy of a project
    Tree {
        /// Hide fullfilled tasks
        #[arg(long)]
        open_only: bool,
    },

    /// Fuzzy-search task names, descriptions and urls
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show the tasks a project view would display
    Visible {
        /// Search query narrowing the view
        #[arg(short, long, default_value = "")]
        search: String,

        /// Show sub-tasks (lists must allow it too)
        #[arg(long)]
        sub_tasks: bool,

        /// Hide fullfilled tasks regardless of list settings
        #[arg(long)]
        hide_fullfilled: bool,

        /// Sort order: dueDate, sortKey, name, priority
        #[arg(long, default_value = "dueDate")]
        sort: SortBy,
    },

    /// Show the computed due date and details of a task
    Due {
        /// Task id
        id: i64,

        /// Reference time (RFC 3339 or YYYY-MM-DD), defaults to now
        #[arg(long)]
        now: Option<String>,
    },

    /// List recurring tasks due for a new instance
    Recurring {
        /// Reference time (RFC 3339 or YYYY-MM-DD), defaults to now
        #[arg(long)]
        now: Option<String>,
    },

    /// Check the snapshot for ambiguous parents, dangling ids and cycles
    Validate,

    /// Inspect the move journal
    #[command(subcommand)]
    Moves(MovesCommands),
}

/// Move journal subcommands
#[derive(Subcommand, Debug)]
pub enum MovesCommands {
    /// List pending moves
    List {
        /// Include completed and rolled-back moves
        #[arg(long)]
        all: bool,
    },

    /// Show one journal entry
    Show {
        /// Move id
        id: String,
    },
}

impl Commands {
    /// Name reported in the output envelope.
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Projects => "projects",
            Commands::Tree { .. } => "tree",
            Commands::Search { .. } => "search",
            Commands::Visible { .. } => "visible",
            Commands::Due { .. } => "due",
            Commands::Recurring { .. } => "recurring",
            Commands::Validate => "validate",
            Commands::Moves(MovesCommands::List { .. }) => "moves list",
            Commands::Moves(MovesCommands::Show { .. }) => "moves show",
        }
    }
}

/// Everything a command needs: config, the loaded store and the resolved
/// module and project.
pub(crate) struct Workspace {
    pub config: Config,
    pub store: InMemoryStore,
    pub module: ModuleContext,
    pub project: ProjectId,
    pub identity: StaticIdentity,
}

impl Workspace {
    pub fn scope(&self) -> ProjectScope<'_> {
        ProjectScope::new(&self.store, self.module.id, self.project)
    }
}

fn load_config(explicit: Option<&Path>) -> Result<(Config, PathBuf)> {
    match explicit {
        Some(path) => {
            let config = Config::load(path)?;
            let base = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            Ok((config, base))
        }
        None => {
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            let config = if cwd.join(CONFIG_FILE).exists() {
                Config::load_from_dir(&cwd)
            } else {
                Config::default()
            };
            Ok((config, cwd))
        }
    }
}

impl Cli {
    fn output(&self) -> OutputOptions {
        OutputOptions {
            json: self.json,
            quiet: self.quiet,
        }
    }

    /// Load the snapshot into a store and resolve the module.
    async fn load_store(&self) -> Result<(Config, InMemoryStore, ModuleContext)> {
        let (config, _) = load_config(self.config.as_deref())?;
        let snapshot = Snapshot::read(&self.data).map_err(|err| match err {
            Error::Io(io) if io.kind() == std::io::ErrorKind::NotFound => Error::InvalidArgument(
                format!("snapshot not found: {}", self.data.display()),
            ),
            other => other,
        })?;
        let key = snapshot
            .module_key
            .clone()
            .unwrap_or_else(|| config.module.key.clone());
        let store = InMemoryStore::new();
        store.load_snapshot(snapshot, &key).await;
        let module = ModuleContext::resolve(&store, &key).await?;
        Ok((config, store, module))
    }

    /// Load the snapshot and resolve module, project and actor.
    async fn workspace(&self) -> Result<Workspace> {
        let (config, store, module) = self.load_store().await?;
        let actor = actor::resolve_actor(self.actor.as_deref(), &config)?;

        let projects = ProjectRecords::new(&store, module.id).projects().await?;
        let project = match self.project {
            Some(id) => {
                if !projects.iter().any(|project| project.id == id) {
                    return Err(Error::ProjectNotFound(id));
                }
                id
            }
            None => match projects.as_slice() {
                [only] => only.id,
                [] => return Err(Error::InvalidArgument("snapshot has no projects".to_string())),
                _ => {
                    return Err(Error::InvalidArgument(
                        "snapshot has several projects; pass --project".to_string(),
                    ))
                }
            },
        };
        tracing::debug!(module = module.id, project, actor = actor.id, "loaded snapshot");

        Ok(Workspace {
            config,
            store,
            module,
            project,
            identity: StaticIdentity::new(actor.id),
        })
    }

    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.dispatch())
    }

    async fn dispatch(self) -> Result<()> {
        let output = self.output();
        match &self.command {
            Commands::Projects => {
                let (_, store, module) = self.load_store().await?;
                projects::run(&store, &module, output).await
            }
            Commands::Moves(cmd) => {
                let (config, base_dir) = load_config(self.config.as_deref())?;
                match cmd {
                    MovesCommands::List { all } => moves::run_list(moves::ListOptions {
                        config,
                        base_dir,
                        all: *all,
                        output,
                    }),
                    MovesCommands::Show { id } => moves::run_show(moves::ShowOptions {
                        config,
                        base_dir,
                        id: id.clone(),
                        output,
                    }),
                }
            }
            Commands::Tree { open_only } => {
                let workspace = self.workspace().await?;
                tree::run(&workspace, *open_only, output).await
            }
            Commands::Search { query, limit } => {
                let workspace = self.workspace().await?;
                search::run(&workspace, query, *limit, output).await
            }
            Commands::Visible {
                search,
                sub_tasks,
                hide_fullfilled,
                sort,
            } => {
                let workspace = self.workspace().await?;
                visible::run(
                    &workspace,
                    visible::VisibleOptions {
                        search: search.clone(),
                        sub_tasks: *sub_tasks,
                        hide_fullfilled: *hide_fullfilled,
                        sort: *sort,
                        output,
                    },
                )
                .await
            }
            Commands::Due { id, now } => {
                let now = parse_now(now.as_deref())?;
                let workspace = self.workspace().await?;
                due::run(&workspace, *id, now, output).await
            }
            Commands::Recurring { now } => {
                let now = parse_now(now.as_deref())?;
                let workspace = self.workspace().await?;
                recurring::run(&workspace, now, output).await
            }
            Commands::Validate => {
                let workspace = self.workspace().await?;
                validate::run(&workspace, output).await
            }
        }
    }
}

fn parse_now(raw: Option<&str>) -> Result<chrono::DateTime<chrono::Utc>> {
    match raw {
        None => Ok(chrono::Utc::now()),
        Some(raw) => crate::model::iso8601::parse(raw)
            .ok_or_else(|| Error::InvalidArgument(format!("invalid time: {raw}"))),
    }
}
