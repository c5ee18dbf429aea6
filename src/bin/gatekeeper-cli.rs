use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "gatekeeper-cli")]
#[command(about = "Operator client for the gatekeeper query chain", long_about = None)]
struct Cli {
    /// Gateway base URL
    #[arg(short, long, default_value = "http://localhost:5000")]
    url: String,

    /// Shared secret presented in X-Gatekeeper-Password
    #[arg(short, long, env = "GATEKEEPER_GATEWAY_PASSWORD", default_value = "")]
    password: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one SQL statement through the gateway
    Query {
        /// Route to the primary as a write
        #[arg(long)]
        write: bool,
        /// Per-request read mode (random, lowest_latency, direct)
        #[arg(long)]
        mode: Option<String>,
        sql: String,
    },
    /// Read or change the routing mode
    Mode {
        #[command(subcommand)]
        action: ModeAction,
    },
    /// Check that the relay is up
    Health {
        #[arg(long, default_value = "http://localhost:5001")]
        relay_url: String,
    },
}

#[derive(Subcommand)]
enum ModeAction {
    Get,
    Set { mode: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert("x-gatekeeper-password", HeaderValue::from_str(&cli.password)?);

    match cli.command {
        Commands::Query { write, mode, sql } => {
            let mut body = json!({
                "query": sql,
                "query_type": if write { "WRITE" } else { "READ" },
            });
            if let Some(mode) = mode {
                body["mode"] = Value::String(mode);
            }
            let res = client
                .post(format!("{}/query", cli.url))
                .headers(headers)
                .json(&body)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Mode { action: ModeAction::Get } => {
            let res = client
                .get(format!("{}/mode", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Mode { action: ModeAction::Set { mode } } => {
            let res = client
                .post(format!("{}/mode", cli.url))
                .headers(headers)
                .json(&json!({ "mode": mode }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Health { relay_url } => {
            let res = client.get(format!("{}/", relay_url)).send().await?;
            let status = res.status();
            let text = res.text().await?;
            if status.is_success() {
                println!("{}", text);
            } else {
                eprintln!("Error: relay returned status {}", status);
                eprintln!("Response: {}", text);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
