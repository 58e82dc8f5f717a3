//! qrzlog command-line interface.
//!
//! Without a subcommand this runs the interactive lookup-and-log loop.
//! The one-shot subcommands cover the same operations for scripting.

mod credentials;
mod interactive;
mod render;

use std::io;
use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use qrzlog::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::interactive::Console;

#[derive(Parser)]
#[command(name = "qrzlog", version)]
#[command(about = "Look up callsigns and log contacts with QRZ.com", long_about = None)]
struct Cli {
    /// QRZ.com username
    #[arg(long, env = "QRZ_USERNAME", global = true)]
    username: Option<String>,

    /// QRZ.com password
    #[arg(long, env = "QRZ_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    /// QRZ.com logbook API key
    #[arg(long, env = "QRZ_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Always prompt for credentials, ignoring flags and environment
    #[arg(short, long, global = true)]
    prompt: bool,

    /// JSON file with endpoint and timeout overrides
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Show public details for a callsign
    Lookup { callsign: String },
    /// List prior contacts with a callsign
    History { callsign: String },
    /// Log one contact
    Log(LogArgs),
    /// Write the whole logbook as JSON
    Export {
        /// Output file (stdout if omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Look up, review and log contacts interactively (default)
    Interactive,
}

#[derive(Args)]
struct LogArgs {
    /// The other station's callsign
    callsign: String,

    /// Band, e.g. 20m
    #[arg(long)]
    band: String,

    /// Mode, e.g. FT8
    #[arg(long)]
    mode: String,

    /// Signal report sent
    #[arg(long, default_value = "59")]
    rst_sent: String,

    /// Signal report received
    #[arg(long, default_value = "59")]
    rst_rcvd: String,

    /// UTC date, YYYYMMDD (default: today)
    #[arg(long)]
    date: Option<String>,

    /// UTC start time, HHMM (default: now)
    #[arg(long)]
    time_on: Option<String>,

    /// UTC end time, HHMM (default: start time)
    #[arg(long)]
    time_off: Option<String>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<ClientConfig> {
    let Some(path) = path else {
        return Ok(ClientConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let supplied = credentials::Supplied {
        username: cli.username.clone(),
        password: cli.password.clone(),
        api_key: cli.api_key.clone(),
    };
    let creds = credentials::resolve(supplied, cli.prompt, credentials::prompt_terminal)
        .context("credentials are required (flags, QRZ_* variables or a terminal prompt)")?;
    let config = load_config(cli.config.as_ref())?;
    let client = QrzClient::builder().config(config).build(creds)?;
    client
        .connect()
        .await
        .context("couldn't establish a session with QRZ.com")?;

    match cli.command.unwrap_or(Command::Interactive) {
        Command::Lookup { callsign } => lookup(&client, &callsign.to_uppercase()).await,
        Command::History { callsign } => history(&client, &callsign.to_uppercase()).await,
        Command::Log(args) => log_contact(&client, args).await,
        Command::Export { output } => export(&client, output).await,
        Command::Interactive => {
            let stdin = io::stdin();
            let mut console = Console::new(stdin.lock(), io::stdout());
            let summary = interactive::run(&client, &mut console, Utc::now).await?;
            console.say(format_args!("\n{summary}"))?;
            console.say("Session terminated.")?;
            Ok(())
        }
    }
}

async fn lookup(client: &QrzClient<ReqwestTransport>, callsign: &str) -> anyhow::Result<()> {
    match client.directory().lookup(callsign).await {
        Ok(record) => println!("{record}"),
        Err(QrzlogError::NotFound { reason, .. }) => println!("{reason}"),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

async fn history(client: &QrzClient<ReqwestTransport>, callsign: &str) -> anyhow::Result<()> {
    let qsos = client.logbook().query_by_callsign(callsign).await?;
    println!("{}", render::history(callsign, &qsos));
    Ok(())
}

async fn log_contact(client: &QrzClient<ReqwestTransport>, args: LogArgs) -> anyhow::Result<()> {
    let now = Utc::now();
    let time_on = args.time_on.unwrap_or_else(|| render::qso_time(now));
    let draft = ContactDraft {
        call: args.callsign.to_uppercase(),
        band: args.band.to_uppercase(),
        mode: args.mode.to_uppercase(),
        qso_date: args.date.unwrap_or_else(|| render::qso_date(now)),
        time_off: args.time_off.unwrap_or_else(|| time_on.clone()),
        time_on,
        rst_sent: args.rst_sent,
        rst_rcvd: args.rst_rcvd,
    };

    let status = client
        .logbook()
        .add_contact(&draft)
        .await
        .with_context(|| format!("couldn't log contact with {}", draft.call))?;
    match status.log_id() {
        Some(id) => println!("Contact with {} logged successfully (log id {id}).", draft.call),
        None => println!("Contact with {} logged successfully.", draft.call),
    }
    Ok(())
}

async fn export(client: &QrzClient<ReqwestTransport>, output: Option<PathBuf>) -> anyhow::Result<()> {
    let log = client.logbook().fetch_all().await?;
    if log.stalled {
        eprintln!("warning: paging stopped early, the export may be incomplete");
    }
    let json = serde_json::to_string_pretty(&log.qsos)?;
    match output {
        Some(path) => std::fs::write(&path, json)
            .with_context(|| format!("writing {}", path.display()))?,
        None => println!("{json}"),
    }
    eprintln!(
        "exported {} contact(s) from {} page(s), {} duplicate(s) dropped",
        log.qsos.len(),
        log.pages,
        log.duplicates_dropped
    );
    Ok(())
}
