use std::io::Write;

use agentdeck::api::AgentApiClient;
use agentdeck::{
    logging, AgentCreate, AgentExecuteInput, AgentsApi, Conversation, Page, ReplyWriter,
    Settings,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "agentdeck", version, about = "Talk to an agent-execution backend")]
struct Cli {
    /// Backend base URL (overrides AGENTDECK_API_URL).
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Log filter directive (overrides AGENTDECK_LOG).
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List agents.
    List {
        #[arg(long, default_value_t = 0)]
        skip: u32,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Show one agent.
    Show { id: String },
    /// Create an agent.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        prompt: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        model: Option<String>,
    },
    /// Delete an agent.
    Delete { id: String },
    /// Run an agent and print the full result.
    Run { id: String, input: String },
    /// Run an agent and print its reply as it streams in.
    Chat { id: String, input: String },
    /// List past runs of an agent.
    History {
        id: String,
        #[arg(long, default_value_t = 0)]
        skip: u32,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::from_env();
    if let Some(api_url) = cli.api_url {
        settings.api_url = api_url;
    }
    if let Some(log) = cli.log {
        settings.log_filter = log;
    }
    logging::init(&settings.log_filter);

    let client = AgentApiClient::new(settings.api_config()).context("invalid client settings")?;
    let api = AgentsApi::new(client);

    match cli.command {
        Command::List { skip, limit } => {
            for agent in api.list(Page::new(skip, limit)).await? {
                println!("{}\t{}", agent.id, agent.name);
            }
        }
        Command::Show { id } => {
            let agent = api.get(&id).await?;
            println!("{}", serde_json::to_string_pretty(&agent)?);
        }
        Command::Create {
            name,
            prompt,
            description,
            model,
        } => {
            let mut data = AgentCreate::new(name, prompt);
            data.description = description;
            data.model = model;
            let agent = api.create(&data).await?;
            println!("{}", agent.id);
        }
        Command::Delete { id } => {
            api.delete(&id).await?;
        }
        Command::Run { id, input } => {
            let output = api.execute(&id, &AgentExecuteInput::new(input)).await?;
            println!("{}", output.result);
            eprintln!(
                "tokens: {}, time: {} ms",
                output.tokens_used, output.execution_time_ms
            );
        }
        Command::Chat { id, input } => {
            let mut conversation = Conversation::new(id);
            let mut writer = ReplyWriter::new(std::io::stdout().lock());
            let result = conversation
                .send(&api, &input, |token| writer.write_token(token))
                .await;
            result.context("agent run failed")?;
            let mut stdout = writer.finish().context("failed to write reply to stdout")?;
            writeln!(stdout).context("failed to write reply to stdout")?;
        }
        Command::History { id, skip, limit } => {
            for execution in api.executions(&id, Page::new(skip, limit)).await? {
                println!(
                    "{}\t{}\t{} tokens\t{}",
                    execution.created_at,
                    execution.id,
                    execution.tokens_used,
                    execution.user_input
                );
            }
        }
    }

    Ok(())
}
