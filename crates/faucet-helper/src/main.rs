//! Operator tool for the faucet chain clients.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use faucet_chains::config::{PolicySource, SecretSource};
use faucet_chains::starknet::{StarknetClient, StarknetConfig, TokenSymbol};
use faucet_chains::{cancellation, units, Cancellation, Chain, U256};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "faucet-helper")]
#[command(version, about = "Inspect and drive the faucet's Starknet account (Ctrl-C cancels)")]
struct Cli {
    /// Path to the chain policy file (JSON or TOML)
    #[arg(short, long, env = "FAUCET_POLICY")]
    policy: PathBuf,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported tokens and their distribution policy
    Tokens,
    /// Show the balance of an address
    Balance {
        address: String,
        #[arg(long, default_value = "STRK")]
        token: String,
    },
    /// Send a drip to an address
    Drip {
        address: String,
        #[arg(long, default_value = "STRK")]
        token: String,
        /// Amount in whole tokens; defaults to the configured drip amount
        #[arg(long)]
        amount: Option<f64>,
        /// Wait for the transaction to confirm
        #[arg(long)]
        wait: bool,
    },
    /// Wait for a transaction to confirm
    Wait { tx_hash: String },
}

#[derive(Serialize)]
struct TokenInfo {
    token: String,
    contract_address: Option<String>,
    drip_amount: String,
    max_per_hour: f64,
    max_per_day: f64,
}

#[derive(Serialize)]
struct BalanceOutput {
    address: String,
    token: String,
    balance: String,
    base_units: String,
}

#[derive(Serialize)]
struct DripOutput {
    address: String,
    token: String,
    amount: String,
    transaction_hash: String,
    explorer_url: String,
    confirmed: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let cli = Cli::parse();

    let config = StarknetConfig::load(&PolicySource::Path(cli.policy.clone()), &SecretSource::Env)
        .with_context(|| format!("Failed to load configuration from {}", cli.policy.display()))?;

    info!("Loaded policy for {} with {} tokens", config.network, config.tokens.len());

    let command = match cli.command {
        Commands::Tokens => return list_tokens(&config, cli.json),
        command => command,
    };

    let client = StarknetClient::connect(config)
        .await
        .context("Failed to connect to Starknet node")?;

    let cancel = cancel_on_ctrl_c();

    match command {
        Commands::Balance { address, token } => {
            show_balance(&client, &address, &token, cli.json, cancel).await
        }
        Commands::Drip {
            address,
            token,
            amount,
            wait,
        } => {
            let request = DripRequest {
                address,
                token,
                amount,
                wait,
            };
            drip(&client, request, cli.json, cancel).await
        }
        Commands::Wait { tx_hash } => wait_for(&client, &tx_hash, cancel).await,
        Commands::Tokens => Ok(()),
    }
}

fn list_tokens(config: &StarknetConfig, json: bool) -> Result<()> {
    let tokens: Vec<TokenInfo> = TokenSymbol::ALL
        .iter()
        .map(|symbol| symbol.as_str())
        .map(|token| TokenInfo {
            token: token.to_string(),
            contract_address: config.token_address(token).map(str::to_string),
            drip_amount: config.drip_amount(token).to_string(),
            max_per_hour: config.max_per_hour(token),
            max_per_day: config.max_per_day(token),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&tokens)?);
        return Ok(());
    }

    println!("Network: {}", config.network);
    for info in &tokens {
        match &info.contract_address {
            Some(address) => println!(
                "  {:<5} drip {:<8} hourly {:<8} daily {:<8} {}",
                info.token, info.drip_amount, info.max_per_hour, info.max_per_day, address
            ),
            None => println!("  {:<5} not configured", info.token),
        }
    }
    println!("Minimum balance protection: {}%", config.min_balance_protect_pct);
    Ok(())
}

async fn show_balance(
    client: &StarknetClient,
    address: &str,
    token: &str,
    json: bool,
    cancel: Cancellation,
) -> Result<()> {
    client.validate_address(address)?;
    let address = client.normalize_address(address);
    let balance = client.balance(&address, token, cancel).await?;
    let decimals = client.config().decimals(token);

    let output = BalanceOutput {
        address,
        token: token.to_ascii_uppercase(),
        balance: units::format_units(balance, decimals),
        base_units: balance.to_string(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{} {} ({})", output.balance, output.token, output.address);
    }
    Ok(())
}

struct DripRequest {
    address: String,
    token: String,
    amount: Option<f64>,
    wait: bool,
}

async fn drip(
    client: &StarknetClient,
    request: DripRequest,
    json: bool,
    cancel: Cancellation,
) -> Result<()> {
    let DripRequest {
        address,
        token,
        amount,
        wait,
    } = request;
    let token = token.as_str();

    client.validate_address(&address)?;
    client.validate_token(token)?;

    let decimals = client.config().decimals(token);
    let amount = drip_amount(client, token, amount, decimals)?;

    client.check_reserve(token, cancel.clone()).await?;

    let recipient = client.normalize_address(&address);
    let tx_hash = client
        .transfer(&recipient, token, amount, cancel.clone())
        .await?;
    let explorer_url = client.explorer_url(&tx_hash);

    if !json {
        println!("Transaction sent: {}", tx_hash);
        println!("Explorer: {}", explorer_url);
    }

    let confirmed = if wait {
        wait_for(client, &tx_hash, cancel).await?;
        true
    } else {
        false
    };

    if json {
        let output = DripOutput {
            address: recipient,
            token: token.to_ascii_uppercase(),
            amount: units::format_units(amount, decimals),
            transaction_hash: tx_hash,
            explorer_url,
            confirmed,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    }
    Ok(())
}

fn drip_amount(
    client: &StarknetClient,
    token: &str,
    amount: Option<f64>,
    decimals: u8,
) -> Result<U256> {
    let amount = match amount {
        Some(amount) => units::to_base_units_with(amount, decimals)?,
        None => client.drip_amount(token)?,
    };

    if amount.is_zero() {
        anyhow::bail!("Refusing to send a zero {} drip", token.to_ascii_uppercase());
    }
    Ok(amount)
}

/// Cancellation that fires on Ctrl-C.
fn cancel_on_ctrl_c() -> Cancellation {
    let (handle, cancel) = cancellation();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            handle.cancel();
        }
    });
    cancel
}

async fn wait_for(client: &StarknetClient, tx_hash: &str, cancel: Cancellation) -> Result<()> {
    info!("Waiting for {} to confirm", tx_hash);
    client.wait_for_confirmation(tx_hash, cancel).await?;
    println!("Transaction {} confirmed", tx_hash);
    Ok(())
}
