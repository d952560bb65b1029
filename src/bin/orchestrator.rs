//! Agent Orchestrator CLI
//!
//! Command-line front end for the orchestration backend: manage agents and
//! workflows, check workflow graphs before running them, follow execution
//! logs live and edit the locally persisted settings.

use std::path::{Path, PathBuf};

use agent_orchestrator::client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_MS};
use agent_orchestrator::{
    probe_ollama, Agent, AgentDraft, AgentRef, Client, ClientBuilder, LlmConfig, LlmProvider,
    LogLevel, Settings, SettingsStore, ValidationReport, Workflow, WorkflowDraft,
};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "orchestrator")]
#[command(about = "Agent Orchestrator CLI - Manage agents, workflows and execution logs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Backend base URL
    #[arg(long, env = "AGENT_ORCHESTRATOR_API_URL", default_value = DEFAULT_BASE_URL)]
    api_url: String,

    /// Request timeout in milliseconds
    #[arg(long, env = "AGENT_ORCHESTRATOR_TIMEOUT_MS", default_value_t = DEFAULT_TIMEOUT_MS)]
    timeout_ms: u64,

    /// Settings file (defaults to the platform config directory)
    #[arg(long, env = "AGENT_ORCHESTRATOR_SETTINGS")]
    settings_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the backend is up
    Health,

    /// Agent definitions
    Agents {
        #[command(subcommand)]
        action: AgentCommands,
    },

    /// Workflow graphs
    Workflows {
        #[command(subcommand)]
        action: WorkflowCommands,
    },

    /// Teams of agents
    Teams {
        #[command(subcommand)]
        action: TeamCommands,
    },

    /// Execution logs
    Logs {
        #[command(subcommand)]
        action: LogCommands,
    },

    /// LLM provider utilities
    Llm {
        #[command(subcommand)]
        action: LlmCommands,
    },

    /// Locally persisted settings
    Settings {
        #[command(subcommand)]
        action: SettingsCommands,
    },
}

#[derive(Subcommand)]
enum AgentCommands {
    /// List all agents
    List,

    /// Show one agent as JSON
    Get { id: String },

    /// Create an agent
    Create {
        #[arg(long)]
        name: String,

        #[arg(long)]
        role: String,

        #[arg(long, default_value = "llama2")]
        model: String,

        /// ollama, openai, anthropic or custom
        #[arg(long, default_value = "ollama")]
        provider: LlmProvider,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long)]
        system_prompt: Option<String>,

        /// Clamped to 0.0..=2.0
        #[arg(long, default_value_t = 0.7)]
        temperature: f64,

        /// Clamped to 100..=100000
        #[arg(long, default_value_t = 2000)]
        max_tokens: u32,
    },

    /// Delete an agent (workflows referencing it are left alone)
    Delete {
        id: String,

        /// Confirm the deletion
        #[arg(long)]
        confirm: bool,
    },
}

#[derive(Subcommand)]
enum WorkflowCommands {
    /// List all workflows
    List,

    /// Show one workflow as JSON
    Get { id: String },

    /// Create a workflow, seeded with the start node or read from a JSON file
    Create {
        #[arg(long)]
        name: Option<String>,

        #[arg(long, default_value = "")]
        description: String,

        /// Workflow or draft JSON to upload
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Check a workflow graph (local JSON file or workflow id)
    Validate {
        target: String,

        /// Resolve agent references against the backend for a local file
        #[arg(long)]
        resolve_agents: bool,
    },

    /// Show the order in which agent nodes would run
    Plan { target: String },

    /// Start a workflow run on the backend
    Execute {
        id: String,

        /// Send even if local validation finds blocking issues
        #[arg(long)]
        skip_validation: bool,
    },

    /// Delete a workflow
    Delete {
        id: String,

        /// Confirm the deletion
        #[arg(long)]
        confirm: bool,
    },
}

#[derive(Subcommand)]
enum TeamCommands {
    /// List all teams
    List,

    /// Show one team as JSON
    Get { id: String },
}

#[derive(Subcommand)]
enum LogCommands {
    /// Print recorded logs
    List {
        #[arg(long)]
        workflow_id: Option<String>,
    },

    /// Follow a workflow's live log stream until interrupted
    Tail {
        workflow_id: String,

        /// Hide records below this level
        #[arg(long, default_value = "debug")]
        min_level: LogLevel,
    },

    /// Show runs the backend reports as in flight
    Active,
}

#[derive(Subcommand)]
enum LlmCommands {
    /// List models installed on the backend's Ollama daemon
    Models,

    /// Ask the backend to test a provider connection
    Test {
        #[arg(long, default_value = "ollama")]
        provider: LlmProvider,

        #[arg(long, default_value = "llama2")]
        model: String,

        /// Falls back to the key stored in settings
        #[arg(long)]
        api_key: Option<String>,

        /// Falls back to the Ollama URL stored in settings
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Contact an Ollama daemon directly
    Probe {
        /// Falls back to the Ollama URL stored in settings
        #[arg(long)]
        url: Option<String>,
    },
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Print the settings (keys redacted)
    Show,

    /// Change one setting
    Set { key: String, value: String },

    /// Print the settings file location
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let settings_store = match &cli.settings_file {
        Some(path) => SettingsStore::at(path),
        None => SettingsStore::default_location()?,
    };
    let settings = settings_store.load().unwrap_or_else(|e| {
        eprintln!("Warning: could not read settings, using defaults: {}", e);
        Settings::default()
    });

    init_logging(cli.verbose, settings.log_level);

    let client = ClientBuilder::new()
        .base_url(&cli.api_url)?
        .timeout(cli.timeout_ms)
        .build()?;

    match cli.command {
        Commands::Health => health(&client).await?,
        Commands::Agents { action } => handle_agent_commands(&client, action).await?,
        Commands::Workflows { action } => handle_workflow_commands(&client, action).await?,
        Commands::Teams { action } => handle_team_commands(&client, action).await?,
        Commands::Logs { action } => handle_log_commands(&client, action).await?,
        Commands::Llm { action } => handle_llm_commands(&client, &settings, action).await?,
        Commands::Settings { action } => {
            handle_settings_commands(&settings_store, settings, action)?
        }
    }

    Ok(())
}

fn init_logging(verbose: bool, level: LogLevel) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        let default = match level {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        };
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn health(client: &Client) -> Result<()> {
    let health = client
        .health()
        .await
        .with_context(|| format!("backend at {} is not reachable", client.base_url()))?;
    if !health.is_healthy() {
        bail!("backend reports status '{}'", health.status);
    }
    let server = client.info().await?;
    println!("✅ {} {} ({})", server.message, server.version, server.status);
    println!("   {}", client.base_url());
    Ok(())
}

async fn handle_agent_commands(client: &Client, action: AgentCommands) -> Result<()> {
    let agents = client.agents();
    match action {
        AgentCommands::List => {
            let list = agents.list().await?;
            println!("🤖 Agents ({})", list.len());
            for agent in &list {
                print_agent_line(agent);
            }
        }
        AgentCommands::Get { id } => {
            let agent = agents.get(&id).await?;
            println!("{}", serde_json::to_string_pretty(&agent)?);
        }
        AgentCommands::Create {
            name,
            role,
            model,
            provider,
            description,
            system_prompt,
            temperature,
            max_tokens,
        } => {
            let mut draft = AgentDraft::new(name, role, model)
                .description(description)
                .provider(provider)
                .temperature(temperature)
                .max_tokens(max_tokens);
            if let Some(prompt) = system_prompt {
                draft = draft.system_prompt(prompt);
            }
            let missing = draft.missing_fields();
            if !missing.is_empty() {
                bail!("missing required fields: {}", missing.join(", "));
            }
            let agent = agents.create(&draft).await?;
            println!("✅ Created agent {} ({})", agent.name, agent.id);
        }
        AgentCommands::Delete { id, confirm } => {
            if !confirm {
                error!("❌ Delete operation requires --confirm flag for safety");
                return Ok(());
            }
            agents.delete(&id).await?;
            println!("🗑️  Deleted agent {}", id);
        }
    }
    Ok(())
}

fn print_agent_line(agent: &Agent) {
    println!(
        "  {}  {:<24} {:<20} {}/{}  [{}]",
        agent.id, agent.name, agent.role, agent.llm_provider, agent.model_name, agent.status
    );
}

async fn handle_workflow_commands(client: &Client, action: WorkflowCommands) -> Result<()> {
    let workflows = client.workflows();
    match action {
        WorkflowCommands::List => {
            let list = workflows.list().await?;
            println!("🔀 Workflows ({})", list.len());
            for workflow in &list {
                println!(
                    "  {}  {:<24} {} nodes, {} edges  [{}]",
                    workflow.id,
                    workflow.name,
                    workflow.nodes.len(),
                    workflow.edges.len(),
                    workflow.status
                );
            }
        }
        WorkflowCommands::Get { id } => {
            let workflow = workflows.get(&id).await?;
            println!("{}", serde_json::to_string_pretty(&workflow)?);
        }
        WorkflowCommands::Create {
            name,
            description,
            file,
        } => {
            let draft = match (file, name) {
                (Some(path), name) => {
                    let mut draft = read_draft(&path)?;
                    if let Some(name) = name {
                        draft.name = name;
                    }
                    draft
                }
                (None, Some(name)) => WorkflowDraft::new(name, description),
                (None, None) => bail!("either --name or --file is required"),
            };
            let workflow = workflows.create(&draft).await?;
            println!("✅ Created workflow {} ({})", workflow.name, workflow.id);
        }
        WorkflowCommands::Validate {
            target,
            resolve_agents,
        } => {
            let (workflow, from_file) = load_workflow(client, &target).await?;
            let agents = if from_file && !resolve_agents {
                info!("validating offline; agent references are not resolved");
                None
            } else {
                Some(client.agents().list().await?)
            };
            let report = match &agents {
                Some(agents) => workflow.validate(agents),
                None => workflow.validate_structure(),
            };
            print_report(&workflow, &report);
            if !report.is_executable() {
                bail!(
                    "workflow has {} blocking issue(s)",
                    report.errors().count()
                );
            }
        }
        WorkflowCommands::Plan { target } => {
            let (workflow, _) = load_workflow(client, &target).await?;
            let agents = client.agents().list().await?;
            print_plan(&workflow, agents);
        }
        WorkflowCommands::Execute {
            id,
            skip_validation,
        } => {
            let workflow = workflows.get(&id).await?;
            let ack = if skip_validation {
                workflows.execute(&workflow.id).await?
            } else {
                workflows.execute_checked(&workflow).await?
            };
            println!("🚀 {}", ack.message);
            println!("   Follow progress with: orchestrator logs tail {}", id);
        }
        WorkflowCommands::Delete { id, confirm } => {
            if !confirm {
                error!("❌ Delete operation requires --confirm flag for safety");
                return Ok(());
            }
            workflows.delete(&id).await?;
            println!("🗑️  Deleted workflow {}", id);
        }
    }
    Ok(())
}

fn read_draft(path: &Path) -> Result<WorkflowDraft> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("{} is not a workflow", path.display()))
}

/// A target naming an existing file is read locally; anything else is a
/// workflow id fetched from the backend. Returns whether it came from a file.
async fn load_workflow(client: &Client, target: &str) -> Result<(Workflow, bool)> {
    let path = Path::new(target);
    if path.is_file() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let workflow = match serde_json::from_str::<Workflow>(&content) {
            Ok(workflow) => workflow,
            Err(_) => serde_json::from_str::<WorkflowDraft>(&content)
                .with_context(|| format!("{} is not a workflow", path.display()))?
                .into_workflow(),
        };
        return Ok((workflow, true));
    }
    Ok((client.workflows().get(target).await?, false))
}

fn print_report(workflow: &Workflow, report: &ValidationReport) {
    println!(
        "🔍 {} ({} nodes, {} edges)",
        workflow.name,
        workflow.nodes.len(),
        workflow.edges.len()
    );
    if report.is_clean() {
        println!("✅ No issues found");
        return;
    }
    for issue in report.errors() {
        println!("  ❌ {}", issue);
    }
    for issue in report.warnings() {
        println!("  ⚠️  {}", issue);
    }
}

fn print_plan(workflow: &Workflow, agents: Vec<Agent>) {
    let plan = workflow.execution_plan(&agents);
    if workflow.has_cycle() {
        warn!("workflow has a cycle; plan follows declaration order");
    }
    println!("📋 {} ({} steps)", workflow.name, plan.len());
    for (i, step) in plan.iter().enumerate() {
        let marker = match step.agent {
            AgentRef::Resolved(_) => "",
            AgentRef::Dangling(_) => "  ⚠️  agent missing",
        };
        println!(
            "  {}. {} -> {} ({}){}",
            i + 1,
            step.label,
            step.agent.display_name(),
            step.agent.agent_id(),
            marker
        );
    }
}

async fn handle_team_commands(client: &Client, action: TeamCommands) -> Result<()> {
    match action {
        TeamCommands::List => {
            let teams = client.teams().list().await?;
            println!("👥 Teams ({})", teams.len());
            for team in &teams {
                println!("  {}  {:<24} {} agents", team.id, team.name, team.agents.len());
            }
        }
        TeamCommands::Get { id } => {
            let team = client.teams().get(&id).await?;
            println!("{}", serde_json::to_string_pretty(&team)?);
        }
    }
    Ok(())
}

async fn handle_log_commands(client: &Client, action: LogCommands) -> Result<()> {
    match action {
        LogCommands::List { workflow_id } => {
            let logs = client.logs().list(workflow_id.as_deref()).await?;
            for log in &logs {
                println!("{}", log);
            }
            if logs.is_empty() {
                println!("No logs recorded");
            }
        }
        LogCommands::Tail {
            workflow_id,
            min_level,
        } => {
            let mut subscription = client.logs().subscribe(&workflow_id).await?;
            info!("📡 Following logs for {} (Ctrl-C to stop)", workflow_id);
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    item = subscription.next() => match item {
                        Some(Ok(log)) if log.is_at_least(min_level) => println!("{}", log),
                        Some(Ok(_)) => {}
                        Some(Err(e)) if e.kind() == agent_orchestrator::ErrorKind::MalformedPayload => {
                            warn!("skipping malformed event: {}", e);
                        }
                        Some(Err(e)) => return Err(e.into()),
                        None => {
                            info!("log stream ended");
                            break;
                        }
                    },
                }
            }
            subscription.close().await;
        }
        LogCommands::Active => {
            let executions = client.logs().active_executions().await?;
            println!("⏱️  Active executions ({})", executions.len());
            for execution in &executions {
                println!(
                    "  {}  workflow {}  since {}",
                    execution.execution_id,
                    execution.workflow_id,
                    execution.start_time.format("%Y-%m-%d %H:%M:%S")
                );
            }
        }
    }
    Ok(())
}

async fn handle_llm_commands(client: &Client, settings: &Settings, action: LlmCommands) -> Result<()> {
    match action {
        LlmCommands::Models => {
            let models = client.llm().list_ollama_models().await?;
            println!("🧠 Ollama models ({})", models.len());
            for model in &models {
                println!("  {:<32} {:>8.1} MB", model.name, model.size as f64 / 1_048_576.0);
            }
        }
        LlmCommands::Test {
            provider,
            model,
            api_key,
            base_url,
        } => {
            let stored_key = match provider {
                LlmProvider::OpenAI => Some(settings.openai_key.clone()),
                LlmProvider::Anthropic => Some(settings.anthropic_key.clone()),
                _ => None,
            }
            .filter(|key| !key.is_empty());
            let mut config = LlmConfig::new(provider, model);
            if let Some(key) = api_key.or(stored_key) {
                config = config.api_key(key);
            }
            if let Some(url) = base_url.or_else(|| {
                (provider == LlmProvider::Ollama).then(|| settings.ollama_url.clone())
            }) {
                config = config.base_url(url);
            }

            let result = client.llm().test_connection_detailed(&config).await?;
            let message = result.message.unwrap_or_default();
            if result.success {
                println!("✅ {} {}", provider, message);
            } else {
                bail!("{} connection failed: {}", provider, message);
            }
        }
        LlmCommands::Probe { url } => {
            let url = url.unwrap_or_else(|| settings.ollama_url.clone());
            match probe_ollama(&url).await {
                Ok(true) => println!("✅ Ollama reachable at {}", url),
                Ok(false) => bail!("Ollama at {} answered with an error", url),
                Err(e) => bail!("Ollama at {} is not reachable: {}", url, e),
            }
        }
    }
    Ok(())
}

fn handle_settings_commands(
    store: &SettingsStore,
    settings: Settings,
    action: SettingsCommands,
) -> Result<()> {
    match action {
        SettingsCommands::Show => {
            println!("{:#?}", settings);
        }
        SettingsCommands::Set { key, value } => {
            // Re-read strictly: a fallback to defaults must never be saved
            store.update(&key, &value)?;
            println!("✅ Saved {} to {}", key, store.path().display());
        }
        SettingsCommands::Path => {
            println!("{}", store.path().display());
        }
    }
    Ok(())
}
