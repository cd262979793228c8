use std::future::Future;
use std::io::Read;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use bat::WrappingMode;
use cliclack::spinner;
use console::style;
use serde::Serialize;
use serde_json::json;

use teambridge::bridge::client::RemoteBridgeClient;
use teambridge::converter::ExchangeOptions;
use teambridge::models::result_item::ResultItem;
use teambridge::models::team::TeamConfig;
use teambridge::orchestrator::{ExportOptions, SessionOrchestrator};
use teambridge::parser::{detect_content_type, parse_content_blocks, render_blocks};

use crate::configuration::Settings;
use crate::Command;

pub async fn run(command: Command, settings: Settings) -> Result<()> {
    let config = settings.bridge.into_config();
    let options = ExchangeOptions::default().with_source(config.source.clone());
    let client = RemoteBridgeClient::new(config)?;
    let orchestrator = SessionOrchestrator::with_options(client, options);
    let client = orchestrator.platform();

    match command {
        Command::Teams => {
            let teams = busy("Fetching teams", client.list_teams()).await?;
            print_json(&teams)
        }
        Command::Team { id } => {
            let team = busy("Fetching team", client.get_team(&id)).await?;
            print_json(&team)
        }
        Command::Agents => {
            let agents = busy("Fetching agents", client.list_agents()).await?;
            print_json(&agents)
        }
        Command::Agent { id } => {
            let agent = busy("Fetching agent", client.get_agent(&id)).await?;
            print_json(&agent)
        }
        Command::ImportTeam { file } => {
            let team: TeamConfig = read_json(&file)?;
            let imported = busy("Importing team", client.import_team(&team)).await?;
            print_json(&imported)
        }
        Command::CreateAgent {
            name,
            system_message,
            model,
            temperature,
            description,
        } => {
            let mut spec = client.config().agent_spec(name, system_message);
            if let Some(model) = model {
                spec.model = model;
            }
            if let Some(temperature) = temperature {
                spec.temperature = temperature;
            }
            spec.description = description;

            let agent = busy("Creating agent", client.create_agent(&spec)).await?;
            print_json(&agent)
        }
        Command::AddSkill { agent_id, skill_id } => {
            busy("Adding skill", client.add_skill(&agent_id, &skill_id)).await?;
            println!(
                "Added skill {} to agent {}",
                style(&skill_id).green(),
                style(&agent_id).cyan()
            );
            Ok(())
        }
        Command::CreateSession {
            team,
            agent,
            task,
            results,
        } => {
            let results: Option<Vec<ResultItem>> =
                results.as_deref().map(read_json).transpose()?;

            let session = match (team, agent) {
                (Some(team), _) => {
                    busy(
                        "Creating team session",
                        orchestrator.create_team_session(&team, &task, results.as_deref()),
                    )
                    .await?
                }
                (None, Some(agent)) => {
                    busy(
                        "Creating agent session",
                        orchestrator.create_agent_session(&agent, &task, results.as_deref()),
                    )
                    .await?
                }
                (None, None) => bail!("Either --team or --agent is required"),
            };

            match session {
                Some(id) => {
                    println!("{}", id);
                    Ok(())
                }
                None => bail!("No session was created"),
            }
        }
        Command::Send {
            session,
            content,
            agents,
        } => {
            let targets = (!agents.is_empty()).then_some(agents);
            let sent = busy(
                "Sending",
                orchestrator.send_to_team_session(&session, &content, targets.as_deref()),
            )
            .await;
            if !sent {
                bail!("Message was not delivered to session {}", session);
            }
            Ok(())
        }
        Command::Responses { session } => {
            let grouped =
                busy("Fetching responses", orchestrator.process_team_responses(&session)).await;
            if grouped.is_empty() {
                println!("{}", style("No agent responses yet").dim());
            }
            for group in grouped {
                println!("{}", style(&group.agent_name).bold().cyan());
                for response in &group.responses {
                    println!("{}", style(&response.timestamp).dim());
                    print_markdown(&render_blocks(&response.structured_content))?;
                }
            }
            Ok(())
        }
        Command::Export {
            session,
            format,
            agents,
            json,
        } => {
            let options = ExportOptions {
                format: format.into(),
                include_agents: (!agents.is_empty()).then_some(agents),
            };
            let items = busy(
                "Exporting",
                orchestrator.export_team_results(&session, &options),
            )
            .await;

            if json {
                return print_json(&items);
            }
            for item in &items {
                print_markdown(&format!("## {}\n\n{}", item.title, item.content))?;
            }
            Ok(())
        }
        Command::Parse { file } => {
            let text = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => {
                    let mut text = String::new();
                    std::io::stdin().read_to_string(&mut text)?;
                    text
                }
            };
            print_json(&json!({
                "contentType": detect_content_type(&text),
                "blocks": parse_content_blocks(&text),
            }))
        }
    }
}

async fn busy<F, T>(message: &str, work: F) -> T
where
    F: Future<Output = T>,
{
    let progress = spinner();
    progress.start(format!("{}...", message));
    let output = work.await;
    progress.stop("");
    output
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_markdown(content: &str) -> Result<()> {
    bat::PrettyPrinter::new()
        .input(bat::Input::from_bytes(content.as_bytes()))
        .language("Markdown")
        .wrapping_mode(WrappingMode::Character)
        .print()
        .map_err(|e| anyhow!("Failed to render output: {}", e))?;
    println!();
    Ok(())
}
