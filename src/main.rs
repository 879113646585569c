//! Multi-wallet contract caller.
//!
//! ```text
//!  config.toml ──▶ ClientConfig ──▶ ContractExecutor ──▶ RpcClient ──▶ ledger RPC
//!  address.txt ─┐                        │
//!  pvt.txt     ─┴─▶ Vec<Wallet> ─────────┤ per wallet: nonce → sign → submit → poll
//!  exec_interface.json ──▶ ContractMethod┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use contract_caller::blockchain::{
    load_wallets, ConfirmMode, ContractExecutor, ContractInterface, MethodKind, WaitOutcome,
    WalletOutcome, WalletReport,
};
use contract_caller::config::{load_config, ClientConfig};
use contract_caller::lifecycle::{signals, Shutdown};
use contract_caller::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "contract-caller")]
#[command(about = "Sign and submit contract calls from a list of wallets", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the RPC endpoint.
    #[arg(long)]
    rpc: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the methods in the contract interface
    Methods,
    /// Show balance and nonce of every wallet
    Balance,
    /// Run a view method for every wallet
    View {
        method: String,
        params: Vec<String>,
    },
    /// Sign and submit a call method for every wallet
    Call {
        method: String,
        params: Vec<String>,
        /// Wait for each transaction to confirm
        #[arg(short, long)]
        wait: bool,
    },
    /// Look up the status of a transaction
    Status { tx_hash: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ClientConfig::default(),
    };
    if let Some(rpc) = cli.rpc {
        config.rpc.endpoint = rpc;
        contract_caller::config::validation::validate_config(&config)
            .map_err(contract_caller::config::ConfigError::Validation)?;
    }

    logging::init_logging(&config.observability);
    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?);
    }

    tracing::info!(
        endpoint = %config.rpc.endpoint,
        timeout_secs = config.rpc.timeout_secs,
        max_attempts = config.retries.max_attempts,
        "Configuration loaded"
    );

    let executor = ContractExecutor::new(&config)?;
    let shutdown = Arc::new(Shutdown::new());
    signals::spawn_signal_handler(shutdown.clone());

    match cli.command {
        Commands::Methods => {
            let interface = ContractInterface::load(config.contract.interface_file.as_ref())?;
            println!("Contract: {}", interface.contract);
            for (i, method) in interface.methods.iter().enumerate() {
                let params: Vec<String> = method.params.iter().map(|p| p.prompt()).collect();
                println!("{}. {} [{}] {} {}", i + 1, method.label, method.kind, method.name, params.join(""));
            }
        }
        Commands::Balance => {
            let wallets = load_wallets(
                config.wallets.address_file.as_ref(),
                config.wallets.key_file.as_ref(),
            )?;
            for wallet in &wallets {
                match executor.client().balance(wallet.address()).await {
                    Ok(balance) => println!(
                        "{}  balance {:.6}  nonce {}",
                        wallet.short_address(),
                        balance.amount(),
                        balance.nonce
                    ),
                    Err(e) => println!("{}  error: {}", wallet.short_address(), e),
                }
            }
        }
        Commands::View { method, params } => {
            run_method(&config, &executor, &shutdown, &method, params, MethodKind::View, false).await?;
        }
        Commands::Call { method, params, wait } => {
            run_method(&config, &executor, &shutdown, &method, params, MethodKind::Call, wait).await?;
        }
        Commands::Status { tx_hash } => {
            let status = executor.client().tx_status(&tx_hash).await?;
            println!("{}: {:?}", tx_hash, status);
        }
    }

    Ok(())
}

async fn run_method(
    config: &ClientConfig,
    executor: &ContractExecutor,
    shutdown: &Shutdown,
    method_name: &str,
    params: Vec<String>,
    expected: MethodKind,
    wait: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let interface = ContractInterface::load(config.contract.interface_file.as_ref())?;
    let method = interface.method(method_name)?;
    if method.kind != expected {
        return Err(format!("Method '{}' is a {} method, not {}", method.name, method.kind, expected).into());
    }
    method.check_arity(&params)?;

    let wallets = load_wallets(
        config.wallets.address_file.as_ref(),
        config.wallets.key_file.as_ref(),
    )?;
    println!("Executing: {} ({}) on {} wallet(s)", method.label, method.name, wallets.len());

    let confirm = if wait { ConfirmMode::Wait } else { ConfirmMode::Skip };
    let reports = executor
        .run_on_wallets(&wallets, &interface.contract, method, &params, confirm, shutdown)
        .await;

    let failures = reports
        .iter()
        .filter(|r| matches!(r.outcome, WalletOutcome::Failed(_)))
        .count();
    for (i, report) in reports.iter().enumerate() {
        print_report(i + 1, reports.len(), report);
    }

    if failures > 0 {
        return Err(format!("{} of {} wallet(s) failed", failures, reports.len()).into());
    }
    Ok(())
}

fn print_report(index: usize, total: usize, report: &WalletReport) {
    let line = match &report.outcome {
        WalletOutcome::Viewed(Some(result)) => format!("Result: {}", result),
        WalletOutcome::Viewed(None) => "Result: none".to_string(),
        WalletOutcome::Submitted { tx_hash, confirmation } => match confirmation {
            None => format!("Transaction Hash: {}", tx_hash),
            Some(WaitOutcome::Confirmed) => format!("Transaction Hash: {} (confirmed)", tx_hash),
            Some(WaitOutcome::TimedOut(deadline)) => format!(
                "Transaction Hash: {} (not confirmed within {}s)",
                tx_hash,
                deadline.as_secs()
            ),
            Some(WaitOutcome::Cancelled) => format!("Transaction Hash: {} (wait cancelled)", tx_hash),
        },
        WalletOutcome::Failed(e) => format!("Error: {}", e),
        WalletOutcome::Skipped(reason) => format!("Skipped: {}", reason),
    };
    println!("[{}/{}] {}  {}", index, total, report.address, line);
}
