use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use eyre::{Result, WrapErr};

use gpscan::config::Config;
use gpscan::layout::Component;
use gpscan::{build_client, extract, render_backend, scan};

#[derive(Parser)]
#[command(
    name = "gpscan",
    about = "Marketplace gamepass price scanner — resolves listing IDs, fetches pricing, and renders capacity-packed cards."
)]
struct Cli {
    /// Path to the TOML config file (default: gpscan.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a single gamepass link or numeric ID
    Scan {
        /// Gamepass link or numeric ID
        link_or_id: String,

        /// Bypass the cache and refresh
        #[arg(long, default_value_t = false)]
        force: bool,

        /// Output format: text or json
        #[arg(long, default_value = "text")]
        format: String,

        /// Post the rendered cards to the configured webhook
        #[arg(long, default_value_t = false)]
        deliver: bool,
    },

    /// Scan multiple gamepass links/IDs
    Multi {
        /// Links/IDs separated by spaces, commas, or newlines
        links: String,

        /// Bypass the cache and refresh
        #[arg(long, default_value_t = false)]
        force: bool,

        /// Output format: text or json
        #[arg(long, default_value = "text")]
        format: String,

        /// Post the rendered cards to the configured webhook
        #[arg(long, default_value_t = false)]
        deliver: bool,
    },

    /// Start the liveness/metrics HTTP server
    Serve {
        /// Address to bind to
        #[arg(long)]
        bind: Option<String>,
    },

    /// Render the in-chat command overview card
    HelpCard {
        /// Output format: text or json
        #[arg(long, default_value = "text")]
        format: String,
    },
}

fn cmd_scan(
    config: Config,
    link_or_id: String,
    force: bool,
    format: String,
    deliver: bool,
) -> Result<()> {
    let id = extract::extract_id(&link_or_id)
        .ok_or_else(|| eyre::eyre!("no valid game-pass link or numeric ID in {link_or_id:?}"))?;

    let rt = tokio::runtime::Runtime::new()?;
    let client = build_client(&config)?;
    let outcome = rt.block_on(scan::scan_one(&client, &id, force));
    let cards = vec![outcome.card];

    emit_cards(&config, &cards, &format)?;
    if deliver {
        rt.block_on(deliver_cards(&config, cards))?;
    }
    Ok(())
}

fn cmd_multi(
    config: Config,
    links: String,
    force: bool,
    format: String,
    deliver: bool,
) -> Result<()> {
    let ids = extract::extract_many(&links);
    if ids.is_empty() {
        eyre::bail!("no valid game-pass links or numeric IDs in input");
    }

    let rt = tokio::runtime::Runtime::new()?;
    let client = build_client(&config)?;
    let cards = rt.block_on(scan::scan_many(&client, &ids, force));

    emit_cards(&config, &cards, &format)?;
    if deliver {
        rt.block_on(deliver_cards(&config, cards))?;
    }
    Ok(())
}

fn cmd_serve(config: Config, bind: Option<String>) -> Result<()> {
    let bind_str = bind.unwrap_or_else(|| config.bind.clone());
    let bind_addr = bind_str
        .parse()
        .wrap_err_with(|| format!("invalid bind address: {bind_str}"))?;

    let client = build_client(&config)?;
    let cache = client.cache_handle();

    tracing::info!("starting gpscan health server");
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(gpscan::health::run_health_server(bind_addr, cache))?;
    Ok(())
}

fn cmd_help(config: Config, format: String) -> Result<()> {
    emit_cards(&config, &[gpscan::layout::help_card()], &format)
}

fn emit_cards(config: &Config, cards: &[Component], format: &str) -> Result<()> {
    match format {
        "json" => {
            let backend = render_backend(config.render);
            let payload = backend.render_chunk(cards, false);
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        _ => {
            for card in cards {
                for line in card.text_lines() {
                    println!("{line}");
                }
                println!("{}", "-".repeat(30));
            }
        }
    }
    Ok(())
}

async fn deliver_cards(config: &Config, cards: Vec<Component>) -> Result<()> {
    let webhook = config
        .webhook_url
        .as_deref()
        .ok_or_else(|| eyre::eyre!("no webhook_url configured (set GPSCAN_WEBHOOK_URL)"))?;
    let deliverer = gpscan::deliver::Deliverer::new(render_backend(config.render))?;
    deliverer
        .send_components(webhook, cards, false)
        .await
}

fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gpscan=info".parse().expect("valid filter")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref());

    let result = match cli.command {
        Commands::Scan {
            link_or_id,
            force,
            format,
            deliver,
        } => cmd_scan(config, link_or_id, force, format, deliver),
        Commands::Multi {
            links,
            force,
            format,
            deliver,
        } => cmd_multi(config, links, force, format, deliver),
        Commands::Serve { bind } => cmd_serve(config, bind),
        Commands::HelpCard { format } => cmd_help(config, format),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:?}");
        std::process::exit(1);
    }
}
