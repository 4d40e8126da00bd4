use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use shipwright_builder::{Coordinator, CoordinatorConfig, DockerBuilder, FsRegistry};
use shipwright_config::WorkflowDef;
use shipwright_planner::{Plan, Planner};
use shipwright_workflow::Workflow;

/// Shipwright - plan and build the container images a workflow needs
#[derive(Parser)]
#[command(name = "shipwright")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.shipwright)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Print the build plan for a workflow as JSON
  Plan {
    /// Path to the workflow file (JSON), or `-` for stdin
    workflow_file: PathBuf,
  },

  /// Print the topological order of a workflow's nodes
  Order {
    /// Path to the workflow file (JSON), or `-` for stdin
    workflow_file: PathBuf,
  },

  /// Plan a workflow, then build, push and register its images
  Build {
    /// Path to the workflow file (JSON), or `-` for stdin
    workflow_file: PathBuf,

    /// Build context handed to the container build tool
    #[arg(long, default_value = ".")]
    context: PathBuf,

    /// Maximum number of concurrent builds
    #[arg(long, default_value_t = 4)]
    concurrency: usize,

    /// Build without pushing
    #[arg(long)]
    no_push: bool,

    /// Only print the specs that would be built
    #[arg(long)]
    dry_run: bool,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_tracing();

  let data_dir = match cli.data_dir {
    Some(dir) => dir,
    None => dirs::home_dir()
      .context("could not determine home directory")?
      .join(".shipwright"),
  };

  match cli.command {
    Some(Commands::Plan { workflow_file }) => {
      let plan = plan_workflow(&workflow_file)?;
      println!("{}", serde_json::to_string_pretty(&plan)?);
    }
    Some(Commands::Order { workflow_file }) => {
      let workflow = load_workflow(&workflow_file)?;
      let order = workflow
        .graph()
        .topological_order()
        .context("failed to order workflow")?;
      for node_id in order {
        println!("{}", node_id);
      }
    }
    Some(Commands::Build {
      workflow_file,
      context,
      concurrency,
      no_push,
      dry_run,
    }) => {
      let plan = plan_workflow(&workflow_file)?;
      if dry_run {
        println!("{}", serde_json::to_string_pretty(&plan.specs)?);
        return Ok(());
      }

      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(build_plan(plan, context, concurrency, !no_push, data_dir))?;
    }
    None => {
      println!("shipwright - use --help to see available commands");
    }
  }

  Ok(())
}

async fn build_plan(
  plan: Plan,
  context: PathBuf,
  concurrency: usize,
  push: bool,
  data_dir: PathBuf,
) -> Result<()> {
  let registry_dir = data_dir.join("registry");
  let coordinator = Coordinator::new(
    DockerBuilder::new(context).with_push(push),
    FsRegistry::new(&registry_dir),
    CoordinatorConfig {
      max_concurrency: concurrency,
    },
  );

  let cancel = CancellationToken::new();
  let on_signal = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      tracing::warn!("interrupt received, skipping builds that have not started");
      on_signal.cancel();
    }
  });

  let report = coordinator.run(plan.specs, cancel).await;
  println!("{}", serde_json::to_string_pretty(&report)?);

  let failed = report.failures().count();
  if failed > 0 {
    bail!("{} of {} builds failed", failed, report.outcomes.len());
  }
  Ok(())
}

fn plan_workflow(workflow_file: &Path) -> Result<Plan> {
  let mut workflow = load_workflow(workflow_file)?;
  Planner::default()
    .plan(&mut workflow)
    .context("failed to plan workflow")
}

fn load_workflow(workflow_file: &Path) -> Result<Workflow> {
  let content = read_source(workflow_file)?;

  let def: WorkflowDef = serde_json::from_str(&content)
    .with_context(|| format!("failed to parse workflow file: {}", workflow_file.display()))?;

  let workflow = Workflow::from_def(def).context("invalid workflow definition")?;
  tracing::info!(
    workflow_id = %workflow.workflow_id,
    nodes = workflow.len(),
    edges = workflow.edges().len(),
    "workflow loaded"
  );
  Ok(workflow)
}

fn read_source(path: &Path) -> Result<String> {
  if path == Path::new("-") {
    let mut input = String::new();
    io::stdin()
      .read_to_string(&mut input)
      .context("failed to read workflow from stdin")?;
    return Ok(input);
  }

  std::fs::read_to_string(path)
    .with_context(|| format!("failed to read workflow file: {}", path.display()))
}

/// Log to stderr, filtered by `RUST_LOG` (default `info`).
fn init_tracing() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

  tracing_subscriber::registry()
    .with(filter)
    .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
    .init();
}
