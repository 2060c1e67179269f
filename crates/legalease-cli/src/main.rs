use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use colored::Colorize;
use dialogue_core::paths::{config_json_path, load_config_json, save_config_json};
use dialogue_core::{CaseBackground, Config, NewCase, NewSimulation, NodeId};
use scenario_client::{ScenarioApi, ScenarioClient, ScenarioSession};

mod logging;
mod render;

use logging::init_logging;
use render::{render_conversation, render_tree, render_turn};

#[derive(Parser)]
#[command(name = "legalease")]
#[command(about = "Explore LegalEase negotiation simulations from the terminal")]
#[command(version)]
struct Cli {
    /// Backend origin, e.g. http://localhost:8000
    #[arg(long, env = "LEGALEASE_API_BASE")]
    api_base: Option<String>,

    /// Enable debug logging
    #[arg(long, short, default_value = "false")]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List cases
    Cases,
    /// Show a case with its background and simulations
    Case { case_id: i64 },
    /// Create a case
    NewCase {
        name: String,
        #[arg(long, default_value = "")]
        party_a: String,
        #[arg(long, default_value = "")]
        party_b: String,
        #[arg(long)]
        context: Option<String>,
    },
    /// Delete a case
    DeleteCase { case_id: i64 },
    /// Transcribe a WAV file and append it to a case's notes
    Dictate { case_id: i64, wav: PathBuf },
    /// Start a new simulation for a case
    Start {
        case_id: i64,
        #[arg(long)]
        headline: String,
        #[arg(long, default_value = "")]
        brief: String,
    },
    /// Print a simulation tree and whose turn it is
    Show { simulation_id: i64 },
    /// Generate the next statements under the selected leaf
    Generate {
        simulation_id: i64,
        /// Replace the existing options instead of adding more
        #[arg(long)]
        refresh: bool,
    },
    /// Make a message the end of the active path
    Select { simulation_id: i64, message_id: i64 },
    /// Add a typed Party A statement
    Say { simulation_id: i64, text: String },
    /// Bookmark the selected leaf
    Bookmark { simulation_id: i64, name: String },
    /// List bookmarks of a simulation
    Bookmarks { simulation_id: i64 },
    /// Delete a bookmark
    Unbookmark { simulation_id: i64, bookmark_id: i64 },
    /// Save the conversation narration
    Audio {
        simulation_id: i64,
        #[arg(long, short)]
        output: PathBuf,
        /// Stop at the selected leaf
        #[arg(long)]
        to_leaf: bool,
    },
    /// Transcribe a WAV file
    Transcribe { wav: PathBuf },
    /// Play a simulation interactively
    Play { simulation_id: i64 },
    /// Manage ~/.legalease/config.json
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write the effective configuration to ~/.legalease/config.json
    Init {
        #[arg(long)]
        force: bool,
    },
}

type Session = ScenarioSession<ScenarioClient>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let mut config = Config::new();
    if let Some(api_base) = cli.api_base {
        config.api_base = Some(api_base);
    }
    log::debug!("Using API root {}", config.api_root());

    if let Commands::Config { action } = &cli.command {
        return run_config(action, &config);
    }

    let client = Arc::new(ScenarioClient::new(&config)?);
    match cli.command {
        Commands::Cases => list_cases(&client).await,
        Commands::Case { case_id } => show_case(&client, case_id).await,
        Commands::NewCase {
            name,
            party_a,
            party_b,
            context,
        } => {
            let case = NewCase {
                party_a,
                party_b,
                context,
                ..NewCase::named(name)
            };
            let created = client.create_case(&case).await?;
            println!("{}", format!("Created case {}", created.id).green());
            Ok(())
        }
        Commands::DeleteCase { case_id } => {
            client.delete_case(case_id).await?;
            println!("{}", format!("Deleted case {case_id}").green());
            Ok(())
        }
        Commands::Dictate { case_id, wav } => dictate(&client, case_id, &wav).await,
        Commands::Start {
            case_id,
            headline,
            brief,
        } => {
            let mut session = Session::new(client, &config);
            session
                .start(&NewSimulation {
                    headline,
                    brief,
                    case_id,
                })
                .await?;
            print_page(&session);
            Ok(())
        }
        Commands::Show { simulation_id } => {
            let session = open(client, &config, simulation_id).await?;
            print_page(&session);
            Ok(())
        }
        Commands::Generate {
            simulation_id,
            refresh,
        } => {
            let mut session = open(client, &config, simulation_id).await?;
            session.generate(refresh).await?;
            print!("{}", render_turn(&session.state().turn));
            Ok(())
        }
        Commands::Select {
            simulation_id,
            message_id,
        } => {
            let mut session = open(client, &config, simulation_id).await?;
            session.choose(&NodeId::Persisted(message_id)).await?;
            print_page(&session);
            Ok(())
        }
        Commands::Say {
            simulation_id,
            text,
        } => {
            let mut session = open(client, &config, simulation_id).await?;
            let id = session.submit_statement(&text).await?;
            println!("{}", format!("Stored statement {id}").green());
            Ok(())
        }
        Commands::Bookmark {
            simulation_id,
            name,
        } => {
            let mut session = open(client, &config, simulation_id).await?;
            let bookmark = session.bookmark(&name).await?;
            println!(
                "{}",
                format!("Bookmarked message {} as {:?}", bookmark.message_id, bookmark.name)
                    .green()
            );
            Ok(())
        }
        Commands::Bookmarks { simulation_id } => {
            for bookmark in client.list_bookmarks(simulation_id).await? {
                println!(
                    "{:>4}  message {:<6} {}",
                    bookmark.id, bookmark.message_id, bookmark.name
                );
            }
            Ok(())
        }
        Commands::Unbookmark {
            simulation_id,
            bookmark_id,
        } => {
            let mut session = open(client, &config, simulation_id).await?;
            session.remove_bookmark(bookmark_id).await?;
            println!("{}", format!("Removed bookmark {bookmark_id}").green());
            Ok(())
        }
        Commands::Audio {
            simulation_id,
            output,
            to_leaf,
        } => {
            let session = open(client, &config, simulation_id).await?;
            let audio = session.conversation_audio(to_leaf).await?;
            std::fs::write(&output, &audio)
                .with_context(|| format!("writing {}", output.display()))?;
            println!(
                "{}",
                format!("Saved {} bytes to {}", audio.len(), output.display()).green()
            );
            Ok(())
        }
        Commands::Transcribe { wav } => {
            println!("{}", transcribe_file(&client, &wav).await?);
            Ok(())
        }
        Commands::Play { simulation_id } => {
            let mut session = open(client, &config, simulation_id).await?;
            play(&mut session).await
        }
        Commands::Config { .. } => Ok(()),
    }
}

async fn open(
    client: Arc<ScenarioClient>,
    config: &Config,
    simulation_id: i64,
) -> anyhow::Result<Session> {
    let mut session = Session::new(client, config);
    session.open(simulation_id).await?;
    Ok(session)
}

fn print_page(session: &Session) {
    if let Some(simulation) = session.simulation() {
        println!("{}", simulation.headline.cyan().bold());
        if !simulation.brief.is_empty() {
            println!("{}", simulation.brief.dimmed());
        }
    }
    if let Some(tree) = &session.state().tree {
        println!();
        print!("{}", render_tree(tree, &session.bookmarked_ids()));
    }
    println!();
    print!("{}", render_conversation(&session.state().conversation()));
    println!("{}", "─".repeat(50).dimmed());
    print!("{}", render_turn(&session.state().turn));
}

async fn list_cases(client: &ScenarioClient) -> anyhow::Result<()> {
    let cases = client.list_cases().await?;
    if cases.is_empty() {
        println!("{}", "No cases yet".dimmed());
    }
    for case in cases {
        println!(
            "{:>4}  {}  {}",
            case.id,
            case.name.bold(),
            format!(
                "{} simulations, modified {}",
                case.scenario_count,
                case.last_modified.as_deref().unwrap_or("never")
            )
            .dimmed()
        );
    }
    Ok(())
}

async fn show_case(client: &ScenarioClient, case_id: i64) -> anyhow::Result<()> {
    let case = client.get_case(case_id).await?;
    println!("{}", case.name.cyan().bold());
    if !case.summary.is_empty() {
        println!("{}", case.summary);
    }
    println!();
    println!("{} {}", "Party A:".bold(), case.background.party_a);
    println!("{} {}", "Party B:".bold(), case.background.party_b);
    if !case.background.key_issues.is_empty() {
        println!("{}", "Key issues:".bold());
        println!("{}", case.background.key_issues_text());
    }
    if !case.background.general_notes.is_empty() {
        println!("{}", "Notes:".bold());
        println!("{}", case.background.general_notes);
    }
    println!();
    for simulation in &case.simulations {
        println!(
            "{:>4}  {}  {}",
            simulation.id,
            simulation.headline,
            format!("{} nodes", simulation.node_count).dimmed()
        );
    }
    Ok(())
}

async fn dictate(client: &ScenarioClient, case_id: i64, wav: &Path) -> anyhow::Result<()> {
    let case = client.get_case(case_id).await?;
    let transcript = transcribe_file(client, wav).await?;
    let mut background: CaseBackground = case.background;
    background.append_note(&transcript);
    let updated = client.update_case(case_id, &background).await?;
    println!("{} {}", "Added:".green(), transcript);
    if !updated.summary.is_empty() {
        println!("{} {}", "Summary:".bold(), updated.summary);
    }
    Ok(())
}

async fn transcribe_file(client: &ScenarioClient, wav: &Path) -> anyhow::Result<String> {
    let data = std::fs::read(wav).with_context(|| format!("reading {}", wav.display()))?;
    if data.len() < 44 || &data[..4] != b"RIFF" || &data[8..12] != b"WAVE" {
        bail!("{} is not a WAV file", wav.display());
    }
    Ok(client.transcribe_audio(bytes::Bytes::from(data)).await?)
}

/// Interactive loop: numbers pick an option, other text is said by Party A.
async fn play(session: &mut Session) -> anyhow::Result<()> {
    print_page(session);
    println!(
        "{}",
        "Commands: <n> pick option, g generate, r regenerate, b <name> bookmark, t tree, q quit"
            .dimmed()
    );

    loop {
        print!("{} ", ">".cyan().bold());
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        let outcome = match input {
            "" => continue,
            "q" | "quit" | "exit" => break,
            "t" => {
                if let Some(tree) = &session.state().tree {
                    print!("{}", render_tree(tree, &session.bookmarked_ids()));
                }
                continue;
            }
            "g" => session.generate(false).await,
            "r" => session.generate(true).await,
            _ if input.starts_with("b ") => session.bookmark(&input[2..]).await.map(|_| ()),
            _ => match input.parse::<usize>() {
                Ok(choice) => match pick_option(session, choice) {
                    Some(id) => session.choose(&id).await,
                    None => {
                        println!("{}", format!("No option {choice}").red());
                        continue;
                    }
                },
                Err(_) => session.submit_statement(input).await.map(|_| ()),
            },
        };

        if let Err(err) = outcome {
            println!("{}", format!("Error: {err}").red());
        }
        println!();
        print!("{}", render_conversation(&session.state().conversation()));
        print!("{}", render_turn(&session.state().turn));
    }

    session.close();
    Ok(())
}

fn pick_option(session: &Session, choice: usize) -> Option<NodeId> {
    let options = session.state().turn.options();
    choice
        .checked_sub(1)
        .and_then(|idx| options.get(idx))
        .map(|option| option.id.clone())
}

fn run_config(action: &ConfigAction, config: &Config) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            println!("{}", serde_json::to_string_pretty(config)?);
            println!("{}", format!("API root: {}", config.api_root()).dimmed());
        }
        ConfigAction::Init { force } => {
            let path = config_json_path();
            write_config(&path, config, *force)?;
            println!("{}", format!("Wrote {}", path.display()).green());
        }
    }
    Ok(())
}

fn write_config(path: &Path, config: &Config, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        let existing: Config = load_config_json(path).map_err(anyhow::Error::msg)?;
        log::debug!("Existing config points at {}", existing.api_root());
        bail!("{} already exists (use --force)", path.display());
    }
    save_config_json(path, config).map_err(anyhow::Error::msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_writes_then_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = Config {
            api_base: Some("http://backend:9000".to_string()),
            ..Config::default()
        };

        write_config(&path, &config, false).unwrap();
        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded.api_root(), "http://backend:9000/api/v1");

        assert!(write_config(&path, &Config::default(), false).is_err());
        write_config(&path, &Config::default(), true).unwrap();
        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded.api_base, None);
    }

    #[test]
    fn cli_parses_generate_refresh() {
        let cli = Cli::try_parse_from(["legalease", "generate", "9", "--refresh"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Generate {
                simulation_id: 9,
                refresh: true
            }
        ));
    }
}
