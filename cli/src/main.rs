use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use log::{info, warn};
use snax_sdk::{
    load_config, parse_address, CoinGeckoOracle, ConnectionResolver, CounterAction, CounterClient,
    KeypairWallet, LockupClient, LockupError, PriceOracle, RpcConnection, SessionViews,
    TransferOrchestrator,
};
use solana_sdk::native_token::lamports_to_sol;
use solana_sdk::signature::read_keypair_file;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "snax")]
#[command(author, version, about = "SNAX wallet for Solana devnet", long_about = None)]
struct Cli {
    /// Config file; SNAX_* environment variables override it
    #[arg(long, short)]
    config: Option<String>,

    /// Keypair file acting as the connected wallet
    #[arg(long, short, default_value = "id.json")]
    keypair: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show SOL and token balances with the SOL price
    Balance,
    /// Request test SOL from the devnet faucet
    Airdrop,
    /// Show the current SOL price
    Price,
    /// Send tokens to another wallet
    Transfer {
        /// Amount in whole tokens, e.g. 1.5
        #[arg(long)]
        amount: String,
        #[arg(long)]
        recipient: String,
    },
    /// Show the lockup schedule of the wallet
    Lockups,
    /// Read or update a counter account
    Counter {
        /// Counter account address
        #[arg(long)]
        address: String,
        #[command(subcommand)]
        action: CounterCommand,
    },
}

#[derive(Subcommand)]
enum CounterCommand {
    Show,
    Init,
    Increment,
    Decrement,
    Reset,
}

fn print_views(views: &SessionViews, symbol: &str) {
    let sol = lamports_to_sol(views.native_lamports);
    println!("SOL:   {}", sol);
    if views.price.is_known() {
        let (usd, krw) = views.price.value_of(sol);
        println!("       ≈ ${:.2} / ₩{:.0}", usd, krw);
    }
    println!("{}:  {}", symbol, views.token.display_string());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let settings = load_config(cli.config.as_deref()).context("failed to load configuration")?;
    let config = settings.transfer_config()?;

    let keypair = read_keypair_file(&cli.keypair)
        .map_err(|e| anyhow!("failed to read keypair {}: {}", cli.keypair, e))?;

    let connection = Arc::new(RpcConnection::new(settings.rpc_url.clone()));
    let wallet = Arc::new(KeypairWallet::new(keypair));
    let oracle = Arc::new(CoinGeckoOracle::new(settings.price_url.clone()));
    info!("using {} ({} {})", connection.url(), config.symbol, config.mint);

    let resolver = ConnectionResolver::new(
        Arc::clone(&connection),
        Arc::clone(&wallet),
        Arc::clone(&oracle),
        &config,
    );
    let orchestrator =
        TransferOrchestrator::new(Arc::clone(&connection), Arc::clone(&wallet), config.clone());

    match cli.command {
        Commands::Balance => {
            let connected = resolver.connect().await?;
            println!("Wallet: {}", connected.session.address);
            print_views(&connected.views, &config.symbol);
        },
        Commands::Airdrop => {
            let signature = orchestrator
                .refresher()
                .request_test_funds(&wallet.pubkey())
                .await
                .map_err(|e| anyhow!("{} ({})", e, e.kind().guidance()))?;
            println!("Airdrop requested: {}", signature);
        },
        Commands::Price => {
            let price = oracle
                .fetch_price()
                .await
                .map_err(|e| anyhow!("price unavailable: {}", e))?;
            println!("1 SOL = ${} / ₩{}", price.usd, price.krw);
        },
        Commands::Transfer { amount, recipient } => {
            let connected = resolver.connect().await?;
            let mut balances = orchestrator.balance_updates();

            let Some(outcome) = orchestrator
                .transfer(&connected.session, &amount, &recipient)
                .await
            else {
                return Err(anyhow!("a transfer is already in progress"));
            };

            if let Some(err) = outcome.error {
                if let Some(signature) = outcome.signature {
                    println!("Signature: {}", signature);
                }
                return Err(anyhow!("{} ({})", err, err.kind().guidance()));
            }
            if let Some(signature) = outcome.signature {
                println!("Transfer confirmed: {}", signature);
            }

            let wait = config.refresh_delay + Duration::from_secs(10);
            match tokio::time::timeout(wait, balances.changed()).await {
                Ok(Ok(())) => {
                    if let Some(snapshot) = balances.borrow().clone() {
                        println!("{}:  {}", config.symbol, snapshot.token.display_string());
                    }
                },
                _ => warn!("balance refresh did not arrive"),
            }
        },
        Commands::Lockups => {
            resolver.connect().await?;
            let client = LockupClient::new(settings.lockup_api_url.clone());
            match client.fetch_cached(resolver.address_cache()).await {
                Ok(entries) => {
                    for entry in entries {
                        let state = if entry.unlocked { "unlocked" } else { "locked" };
                        println!("{}  {:>12}  {}", entry.unlock_month, entry.amount, state);
                    }
                },
                Err(LockupError::NotFound(owner)) => {
                    println!("No lockup information for {}", owner);
                },
                Err(err) => return Err(err.into()),
            }
        },
        Commands::Counter { address, action } => {
            let counter = parse_address(&address)?;
            let client = CounterClient::new(Arc::clone(&connection), Arc::clone(&wallet), &config);
            let action = match action {
                CounterCommand::Show => None,
                CounterCommand::Init => Some(CounterAction::Initialize),
                CounterCommand::Increment => Some(CounterAction::Increment),
                CounterCommand::Decrement => Some(CounterAction::Decrement),
                CounterCommand::Reset => Some(CounterAction::Reset),
            };
            if let Some(action) = action {
                let connected = resolver.connect().await?;
                let signature = client
                    .execute(&connected.session, &counter, action)
                    .await
                    .map_err(|e| anyhow!("{} ({})", e, e.kind().guidance()))?;
                println!("Counter {} confirmed: {}", action.name(), signature);
            }
            let state = client.get_counter(&counter).await?;
            println!("Count: {} (authority {})", state.count, state.authority);
        },
    }

    Ok(())
}
