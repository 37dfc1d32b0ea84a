use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use log::{error, info, warn};
use solana_auto_claimer::claim::{ClaimMode, Claimer};
use solana_auto_claimer::config::{parse_duration, Config};
use solana_auto_claimer::errors::ClaimerError;
use solana_auto_claimer::rpc::SolanaRpcGateway;
use solana_auto_claimer::schedule::JitterScheduler;
use solana_auto_claimer::template::learn_reference_template;
use solana_auto_claimer::{logging, wallet};
use tokio::sync::watch;

// Simple CLI without clap
#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    // Check for --version command
    if args.len() > 1 && (args[1] == "--version" || args[1] == "-v") {
        println!("Solana Auto-Claimer v{}", solana_auto_claimer::VERSION);
        return Ok(());
    }
    if args.len() > 1 && (args[1] == "--help" || args[1] == "-h") {
        print_usage(&args[0]);
        return Ok(());
    }

    // Parse optional arguments
    let mut config_path = PathBuf::from("configs/claimer.toml");
    let mut once = false;
    let mut simulate = false;
    let mut rpc_url = None;
    let mut interval_override = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = PathBuf::from(&args[i + 1]);
                    i += 2;
                } else {
                    bail!("missing value for --config");
                }
            }
            "--once" => {
                once = true;
                i += 1;
            }
            "--simulate" | "-s" => {
                simulate = true;
                i += 1;
            }
            "--rpc-url" => {
                if i + 1 < args.len() {
                    rpc_url = Some(args[i + 1].clone());
                    i += 2;
                } else {
                    bail!("missing value for --rpc-url");
                }
            }
            "--interval" => {
                if i + 1 < args.len() {
                    interval_override = Some(parse_duration(&args[i + 1])?);
                    i += 2;
                } else {
                    bail!("missing value for --interval");
                }
            }
            other => {
                print_usage(&args[0]);
                bail!("unknown argument: {}", other);
            }
        }
    }

    let mut config = Config::load(&config_path)?;
    logging::init(&config.logging)?;
    if let Some(url) = rpc_url {
        config.rpc.url = url;
    }
    if let Some(interval) = interval_override {
        config.claim.interval = humantime::format_duration(interval).to_string();
    }
    if config.claim.reference_signature.is_empty() {
        bail!("claim.reference_signature is required");
    }

    let keypair = wallet::load(&config.wallet)?;
    let gateway = Arc::new(SolanaRpcGateway::new(&config.rpc, config.max_retries)?);

    // Learn the replay template once, before any scheduling starts.
    let program_id = config.claim.program_pubkey()?;
    let token_program_override = config.claim.token_program_pubkey()?;
    let template = learn_reference_template(
        gateway.as_ref(),
        &config.claim.reference_signature,
        &program_id,
        token_program_override,
    )
    .await?;
    info!(
        "learned claim template: program {}, {} accounts, {} payload bytes, token program {}",
        template.program_id,
        template.accounts.len(),
        template.data.len(),
        template
            .token_program
            .map(|p| p.to_string())
            .unwrap_or_else(|| "unknown".to_string()),
    );

    let mode = if simulate {
        ClaimMode::SimulateOnly
    } else {
        ClaimMode::SendAndConfirm
    };
    let claimer = Claimer::new(gateway, template, keypair, config.fees.clone());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    if once {
        match claimer.attempt(mode, shutdown_rx).await {
            Ok(outcome) => {
                println!("{}", outcome);
                return Ok(());
            }
            Err(e) => {
                log_attempt_failure(&e);
                return Err(e.into());
            }
        }
    }

    let interval = config.claim.interval_duration()?;
    let scheduler = JitterScheduler::new(interval, config.claim.jitter)?;
    info!(
        "starting auto-claimer: interval {}, jitter {}",
        config.claim.interval, config.claim.jitter
    );
    let mut handle = scheduler.start();
    let mut shutdown = shutdown_rx.clone();

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                info!("shutting down");
                break;
            }
            tick = handle.tick() => {
                if tick.is_none() {
                    break;
                }
                match claimer.attempt(mode, shutdown_rx.clone()).await {
                    Ok(outcome) => println!("{}", outcome),
                    Err(e) => log_attempt_failure(&e),
                }
            }
        }
    }

    handle.shutdown().await;
    Ok(())
}

fn log_attempt_failure(e: &ClaimerError) {
    error!("claim attempt failed: {}", e);
    if let ClaimerError::SimulationFailed { logs, .. } = e {
        for line in logs {
            warn!("program log: {}", line);
        }
    }
}

fn print_usage(program: &str) {
    println!("Solana Auto-Claimer v{}", solana_auto_claimer::VERSION);
    println!("\nUsage:");
    println!(
        "  {} [--config PATH] [--once] [--simulate] [--rpc-url URL] [--interval DUR]",
        program
    );
    println!("  {} --version", program);
    println!("\nOptions:");
    println!("  --config, -c PATH    Path to config file (default: configs/claimer.toml)");
    println!("  --once               Run a single claim attempt and exit");
    println!("  --simulate, -s       Simulate only, never send");
    println!("  --rpc-url URL        Override the configured RPC URL");
    println!("  --interval DUR       Override the claim interval (e.g. 15m)");
    println!("  --version, -v        Show version information");
}
