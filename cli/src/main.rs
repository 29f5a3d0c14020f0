//! MPX wallet CLI — drives a wallet session against a ledger node.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;

use mptw_client::{IssuanceParams, Session, SessionConfig, TokenPaymentParams};
use mptw_crypto::{derive_address, generate_mnemonic, keypair_from_mnemonic, validate_address};
use mptw_types::{Address, Amount, Timestamp};

#[derive(Parser)]
#[command(name = "mptw", about = "MPX ledger wallet")]
struct Cli {
    /// WebSocket endpoint of the ledger node.
    #[arg(long, env = "MPTW_NODE_URL")]
    node_url: Option<String>,

    /// Path to a TOML configuration file. CLI flags override its values.
    #[arg(long, env = "MPTW_CONFIG")]
    config: Option<PathBuf>,

    /// Account secret: a 64-char hex seed or a BIP39 mnemonic.
    #[arg(long, env = "MPTW_SECRET", hide_env_values = true)]
    secret: Option<String>,

    /// Write the session's history to mpt-transactions-<secs>.json on exit.
    #[arg(long)]
    export: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Create a new account offline and print its address and mnemonic.
    Generate,

    /// Query the native balance of an address.
    Balance {
        /// Address to query.
        account: String,
    },

    /// Transfer native funds from the configured funding account.
    Fund {
        /// Destination address.
        destination: String,

        /// Amount in MPX.
        #[arg(long, default_value = "1000")]
        amount: String,
    },

    /// Create a token issuance from the account given by --secret.
    Issue {
        /// Decimal places the token supports.
        #[arg(long, default_value_t = 0)]
        asset_scale: u8,

        /// Transfer fee in basis points.
        #[arg(long, default_value_t = 0)]
        transfer_fee: u16,

        /// Cap on the total issued amount.
        #[arg(long)]
        maximum_amount: Option<String>,

        /// Free-form metadata attached to the issuance.
        #[arg(long)]
        metadata: Option<String>,

        /// Capability flags (comma-separated: "Can Lock,Can Trade").
        #[arg(long, value_delimiter = ',')]
        flags: Vec<String>,
    },

    /// Send issued tokens from the account given by --secret.
    Pay {
        /// Destination address.
        destination: String,

        /// Token value as a decimal string.
        amount: String,

        /// Identifier of the issuance being transferred.
        #[arg(long)]
        issuance_id: String,

        /// Optional memo attached to the payment.
        #[arg(long)]
        memo: Option<String>,
    },

    /// Ask a standalone node to close ledgers.
    Advance {
        /// Number of ledgers to close.
        #[arg(long, default_value_t = 1)]
        count: u32,

        /// Keep closing a ledger every this many milliseconds.
        #[arg(long)]
        interval_ms: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    // Generation is offline; everything else needs a session.
    if let Command::Generate = cli.command {
        return generate();
    }

    let config = build_config(&cli)?;
    let mut session = Session::new(config);
    session.connect().await.context("failed to connect to node")?;

    let result = run(&cli, &mut session).await;

    if cli.export {
        let path = PathBuf::from(format!(
            "mpt-transactions-{}.json",
            Timestamp::now().as_secs()
        ));
        session
            .export_history(&path)
            .context("failed to export history")?;
        println!("history written to {}", path.display());
    }
    session.disconnect().await;
    result
}

async fn run(cli: &Cli, session: &mut Session) -> anyhow::Result<()> {
    match &cli.command {
        Command::Generate => unreachable!("handled before connecting"),

        Command::Balance { account } => {
            let address = parse_address(account)?;
            let balance = session.balance_of(&address).await;
            println!("{balance}");
        }

        Command::Fund {
            destination,
            amount,
        } => {
            let destination = parse_address(destination)?;
            let amount = Amount::parse_display(amount).context("invalid amount")?;
            let outcome = session.fund_account(&destination, amount).await?;
            print_outcome("funding", &outcome);
        }

        Command::Issue {
            asset_scale,
            transfer_fee,
            maximum_amount,
            metadata,
            flags,
        } => {
            load_signer(cli, session).await?;
            let params = IssuanceParams {
                asset_scale: *asset_scale,
                transfer_fee: *transfer_fee,
                maximum_amount: maximum_amount.clone(),
                metadata: metadata.clone(),
                flags: flags.clone(),
            };
            let outcome = session.create_issuance(&params).await?;
            print_outcome("issuance", &outcome);
        }

        Command::Pay {
            destination,
            amount,
            issuance_id,
            memo,
        } => {
            load_signer(cli, session).await?;
            let params = TokenPaymentParams {
                destination: parse_address(destination)?,
                amount: amount.clone(),
                issuance_id: issuance_id.clone(),
                memo: memo.clone(),
            };
            let outcome = session.send_token_payment(&params).await?;
            print_outcome("payment", &outcome);
        }

        Command::Advance { count, interval_ms } => match interval_ms {
            Some(ms) => loop {
                session.advance_ledger().await?;
                let index = session.validated_ledger_index().await?;
                tracing::info!(index, "ledger closed");
                tokio::time::sleep(std::time::Duration::from_millis(*ms)).await;
            },
            None => {
                for _ in 0..*count {
                    session.advance_ledger().await?;
                }
                let index = session.validated_ledger_index().await?;
                println!("validated ledger index: {index}");
            }
        },
    }
    Ok(())
}

fn generate() -> anyhow::Result<()> {
    let mnemonic = generate_mnemonic().context("mnemonic generation failed")?;
    let keypair = keypair_from_mnemonic(&mnemonic).context("key derivation failed")?;
    let address = derive_address(&keypair.public);

    println!("address:  {address}");
    println!("mnemonic: {mnemonic}");
    println!();
    println!("The account exists only locally until it receives funds.");
    Ok(())
}

fn build_config(cli: &Cli) -> anyhow::Result<SessionConfig> {
    let mut config = match &cli.config {
        Some(path) => SessionConfig::from_toml_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => SessionConfig::default(),
    };
    if let Some(url) = &cli.node_url {
        config.endpoint = url.clone();
    }
    Ok(config)
}

async fn load_signer(cli: &Cli, session: &mut Session) -> anyhow::Result<()> {
    let Some(secret) = &cli.secret else {
        bail!("this command needs an account: pass --secret or set MPTW_SECRET");
    };
    let address = session.load_account(secret).await?;
    tracing::info!(%address, "account loaded");
    Ok(())
}

fn parse_address(raw: &str) -> anyhow::Result<Address> {
    if !validate_address(raw) {
        bail!("invalid address: {raw}");
    }
    Ok(Address::new(raw))
}

fn print_outcome(what: &str, outcome: &mptw_client::SubmitOutcome) {
    if outcome.success {
        println!("{what} succeeded: {}", outcome.hash);
    } else {
        println!("{what} rejected by the ledger: {}", outcome.result_code);
    }
}

/// Initialize the tracing subscriber. Respects `RUST_LOG` for filtering.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
}
