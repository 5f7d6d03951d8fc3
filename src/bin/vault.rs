use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use vault_client::actions::{Action, Orchestrator, VaultConfig};
use vault_client::amount::{AmountForm, Percentage, TokenAmount};
use vault_client::chain::{Chain, TransactionOutcome};
use vault_client::config::Config;
use vault_client::formatters::{
    AccountStatus, OutputFormat, format_deposit_receipt, format_outcome, format_status,
};
use vault_client::notify::{Explorer, TracingNotifier};
use vault_client::readers::BalanceReader;
use vault_client::rpc::RpcClient;
use vault_client::wallet::{WalletProvider, WalletSession};

#[derive(Parser)]
#[command(name = "vault")]
#[command(about = "Deposit into and withdraw from an ERC-4626 vault", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "table")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct AmountArgs {
    /// Amount in whole tokens, e.g. 12.5
    #[arg(required_unless_present = "percent")]
    amount: Option<String>,

    /// Percentage of the current balance instead of a fixed amount
    #[arg(long, conflicts_with = "amount")]
    percent: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    Status,
    Approve {
        amount: String,
    },
    ApproveMax,
    ResetAllowance,
    Deposit {
        #[command(flatten)]
        amount: AmountArgs,

        /// Deposit directly without checking and topping up the allowance
        #[arg(long, default_value = "false")]
        no_approval_check: bool,
    },
    Withdraw {
        #[command(flatten)]
        amount: AmountArgs,
    },
    Mint {
        amount: String,
    },
    Watch {
        /// Stop after this many balance updates
        #[arg(long)]
        ticks: Option<usize>,
    },
}

struct App {
    config: Config,
    format: OutputFormat,
    wallet: Arc<WalletSession>,
    orchestrator: Orchestrator,
    token_balance: BalanceReader,
    share_balance: BalanceReader,
}

impl App {
    fn new(config: Config, format: OutputFormat) -> Result<Self> {
        let signer = config
            .private_key
            .as_deref()
            .map(|key| key.trim().parse::<PrivateKeySigner>())
            .transpose()
            .context("Invalid PRIVATE_KEY format")?;

        let wallet = Arc::new(WalletSession::disconnected());
        if let Some(signer) = &signer {
            wallet.connect(signer.address());
        }

        let client = RpcClient::new(
            &config.json_rpc_url,
            signer,
            config.confirmation_timeout,
        )?;
        info!("RPC client connected to {}", client.url());
        let chain: Arc<dyn Chain> = Arc::new(client);

        let orchestrator = Orchestrator::new(
            chain.clone(),
            wallet.clone(),
            Arc::new(TracingNotifier),
            VaultConfig {
                token: config.token_address,
                vault: config.vault_address,
                explorer: Explorer::new(&config.explorer_url),
            },
        );
        let token_balance = BalanceReader::new(
            chain.clone(),
            wallet.clone(),
            Some(config.token_address),
            config.balance_poll_interval,
        );
        let share_balance = BalanceReader::new(
            chain,
            wallet.clone(),
            config.vault_address,
            config.balance_poll_interval,
        );

        Ok(App {
            config,
            format,
            wallet,
            orchestrator,
            token_balance,
            share_balance,
        })
    }

    async fn status(&self) -> Result<AccountStatus> {
        let token_balance = self.token_balance.refresh().await?;
        let share_balance = self.share_balance.refresh().await?;
        let allowance = if self.wallet.is_connected() {
            self.orchestrator.refresh_allowance().await?
        } else {
            TokenAmount::ZERO
        };
        Ok(self.snapshot(token_balance, share_balance, allowance))
    }

    fn snapshot(
        &self,
        token_balance: Option<TokenAmount>,
        share_balance: Option<TokenAmount>,
        allowance: TokenAmount,
    ) -> AccountStatus {
        AccountStatus {
            account: self.wallet.account(),
            token: self.config.token_address,
            vault: self.config.vault_address,
            token_balance,
            share_balance,
            allowance,
            token_decimals: self.config.token_decimals,
            share_decimals: self.config.share_decimals,
        }
    }

    /// Resolve a fixed amount or a percentage of `reader`'s balance.
    async fn resolve_amount(&self, args: AmountArgs, reader: &BalanceReader) -> Result<TokenAmount> {
        let decimals = self.config.token_decimals;
        match (args.amount, args.percent) {
            (_, Some(percent)) => {
                let balance = reader.refresh().await?.unwrap_or_default();
                let mut form = AmountForm::new(balance, decimals);
                form.select_percentage(Percentage::from_decimal(&percent)?);
                info!(
                    "{} of {} is {}",
                    form.percentage(),
                    balance.format_display(decimals),
                    form.amount().format(decimals)
                );
                if form.submittable().is_none() {
                    warn!("Nothing to submit: balance is {}", balance);
                }
                Ok(form.amount())
            }
            (Some(amount), None) => {
                let mut form = AmountForm::new(TokenAmount::ZERO, decimals);
                form.enter_amount(&amount)?;
                Ok(form.amount())
            }
            (None, None) => anyhow::bail!("Either an amount or --percent must be given"),
        }
    }

    fn parse_amount(&self, input: &str) -> Result<TokenAmount> {
        Ok(TokenAmount::from_decimal(input, self.config.token_decimals)?)
    }

    fn print_outcome(&self, action: Action, outcome: &TransactionOutcome) {
        println!(
            "{}",
            format_outcome(action, outcome, &self.config.explorer_url, self.format)
        );
    }

    async fn watch(&self, ticks: Option<usize>) -> Result<()> {
        let mut tokens = self.token_balance.subscribe();
        let mut shares = self.share_balance.subscribe();
        self.token_balance.start();
        self.share_balance.start();
        info!(
            "Polling balances every {:?}",
            self.config.balance_poll_interval
        );

        let mut seen = 0usize;
        loop {
            tokio::select! {
                changed = tokens.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                changed = shares.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = tokio::signal::ctrl_c() => break,
            }

            let status = self.snapshot(
                self.token_balance.balance(),
                self.share_balance.balance(),
                self.orchestrator.allowance(),
            );
            println!("{}", format_status(&status, self.format));

            seen += 1;
            if ticks.is_some_and(|limit| seen >= limit) {
                break;
            }
        }

        self.token_balance.stop();
        self.share_balance.stop();
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let format = OutputFormat::from(cli.format.as_str());

    let config = Config::from_env()?;
    info!("Configuration loaded");
    info!("Token address: {:?}", config.token_address);
    match config.vault_address {
        Some(vault) => info!("Vault address: {:?}", vault),
        None => info!("Vault address not configured"),
    }

    let app = App::new(config, format)?;

    match cli.command {
        Commands::Status => {
            let status = app.status().await?;
            println!("{}", format_status(&status, format));
        }
        Commands::Approve { amount } => {
            let amount = app.parse_amount(&amount)?;
            let outcome = app.orchestrator.approve(amount).await?;
            app.print_outcome(Action::Approve, &outcome);
        }
        Commands::ApproveMax => {
            let outcome = app.orchestrator.approve_max().await?;
            app.print_outcome(Action::ApproveMax, &outcome);
        }
        Commands::ResetAllowance => {
            let outcome = app.orchestrator.reset_allowance().await?;
            app.print_outcome(Action::ResetAllowance, &outcome);
        }
        Commands::Deposit {
            amount,
            no_approval_check,
        } => {
            let amount = app.resolve_amount(amount, &app.token_balance).await?;
            if no_approval_check {
                if app.wallet.is_connected() {
                    app.orchestrator.refresh_allowance().await?;
                }
                if app.orchestrator.needs_approval(amount) {
                    warn!(
                        "Allowance {} is below {}, the deposit will likely revert",
                        app.orchestrator.allowance(),
                        amount
                    );
                }
                let outcome = app.orchestrator.deposit(amount).await?;
                app.print_outcome(Action::Deposit, &outcome);
            } else {
                let receipt = app.orchestrator.deposit_with_approval_check(amount).await?;
                println!(
                    "{}",
                    format_deposit_receipt(&receipt, &app.config.explorer_url, format)
                );
            }
        }
        Commands::Withdraw { amount } => {
            let amount = app.resolve_amount(amount, &app.share_balance).await?;
            let outcome = app.orchestrator.withdraw(amount).await?;
            app.print_outcome(Action::Withdraw, &outcome);
        }
        Commands::Mint { amount } => {
            let amount = app.parse_amount(&amount)?;
            let outcome = app.orchestrator.mint(amount).await?;
            app.print_outcome(Action::Mint, &outcome);
        }
        Commands::Watch { ticks } => {
            app.watch(ticks).await?;
        }
    }

    Ok(())
}
