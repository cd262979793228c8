use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use teambridge::orchestrator::ExportFormat;

mod commands;
mod configuration;
mod error;

use configuration::Settings;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML settings file, layered under TEAMBRIDGE_* environment variables
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Base URL of the team platform API
    #[arg(long, global = true, value_name = "URL")]
    host: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ExportFormatArg {
    Individual,
    Raw,
    Combined,
}

impl From<ExportFormatArg> for ExportFormat {
    fn from(arg: ExportFormatArg) -> Self {
        match arg {
            ExportFormatArg::Individual => ExportFormat::Individual,
            ExportFormatArg::Raw => ExportFormat::Raw,
            ExportFormatArg::Combined => ExportFormat::Combined,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// List the teams known to the platform
    Teams,

    /// Show a single team
    Team { id: String },

    /// List the agents known to the platform
    Agents,

    /// Show a single agent
    Agent { id: String },

    /// Import a team definition from a JSON file
    #[command(name = "import-team")]
    ImportTeam {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Create an agent with the configured model defaults
    #[command(name = "create-agent")]
    CreateAgent {
        name: String,

        #[arg(long, value_name = "PROMPT")]
        system_message: String,

        #[arg(long)]
        model: Option<String>,

        #[arg(long)]
        temperature: Option<f32>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Attach a skill to an agent
    #[command(name = "add-skill")]
    AddSkill { agent_id: String, skill_id: String },

    /// Open a session with a team or a single agent
    #[command(name = "create-session")]
    CreateSession {
        #[arg(long, conflicts_with = "agent", required_unless_present = "agent")]
        team: Option<String>,

        #[arg(long)]
        agent: Option<String>,

        #[arg(long)]
        task: String,

        /// JSON array of result items to send as the first message
        #[arg(long, value_name = "FILE")]
        results: Option<PathBuf>,
    },

    /// Send a message into a session
    Send {
        session: String,
        content: String,

        /// Address specific agents; repeat for several
        #[arg(long = "agent", value_name = "NAME")]
        agents: Vec<String>,
    },

    /// Show a session's responses grouped by agent
    Responses { session: String },

    /// Export a session's responses as result items
    Export {
        session: String,

        #[arg(long, value_enum, default_value = "combined")]
        format: ExportFormatArg,

        #[arg(long = "agent", value_name = "NAME")]
        agents: Vec<String>,

        /// Print result items as JSON instead of rendered markdown
        #[arg(long)]
        json: bool,
    },

    /// Split text into content blocks; reads stdin when no file is given
    Parse {
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        settings.bridge.host = host;
    }

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(settings.log_level())
        .init();

    commands::run(cli.command, settings).await
}
