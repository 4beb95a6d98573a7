//! finledger main entry point

mod render;

use anyhow::{anyhow, bail, Context};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use finledger_client::HttpRemote;
use finledger_config::Config;
use finledger_core::{
    ControllerOptions, Decimal, ErrorSeverity, LedgerController, MutationKind, MutationReport,
    Notice, Notifier, Period, TransactionDraft, TransactionKind,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::runtime::Runtime;

#[derive(Parser, Debug)]
#[command(name = "finledger")]
#[command(version = "0.1.0")]
#[command(about = "Monthly view of a remote income and expense ledger", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Month to view (1-12)
    #[arg(long, global = true)]
    month: Option<u32>,

    /// Year to view
    #[arg(long, global = true)]
    year: Option<i32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show one page of the month
    List {
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Record a new transaction
    Add {
        #[command(flatten)]
        fields: DraftArgs,
    },
    /// Change an existing transaction
    Edit {
        id: i64,
        #[command(flatten)]
        fields: DraftArgs,
    },
    /// Delete a transaction
    Delete {
        id: i64,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Show income, expenses, salary and balance of the month
    Totals,
    /// Show the month's salary, or replace it with --set
    Salary {
        #[arg(long)]
        set: Option<Decimal>,
    },
    /// Create an account on the remote store
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Write a default configuration file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(clap::Args, Debug)]
struct DraftArgs {
    /// expense or income
    #[arg(long, default_value = "expense")]
    kind: TransactionKind,
    #[arg(long)]
    amount: Decimal,
    #[arg(long)]
    description: String,
    /// YYYY-MM-DD, the server uses the current time when omitted
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,
}

impl DraftArgs {
    fn into_draft(self) -> TransactionDraft {
        let draft = TransactionDraft::new(self.kind, self.amount, self.description);
        match self.date {
            Some(date) => draft.on(date),
            None => draft,
        }
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD: {}", e))
}

/// Warnings and errors go to stderr with their hints, the rest to the log
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: &Notice) {
        match notice.severity {
            ErrorSeverity::Info => log::info!(target: "finledger::notice", "{}", notice),
            severity => eprintln!("{}: {}", severity, notice),
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    if let Command::InitConfig { force } = args.command {
        init_config(&args.config, force)?;
        return Ok(ExitCode::SUCCESS);
    }

    let config = Config::load_or_default(&args.config).map_err(|e| {
        anyhow!("{}: {}", args.config.display(), e.to_details())
    })?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();
    log::debug!("Config loaded: remote={}", config.remote.base_url);

    let rt = Runtime::new()?;
    rt.block_on(run(args, config))
}

fn init_config(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!("{} already exists, pass --force to overwrite it", path.display());
    }
    std::fs::write(path, Config::generate_default())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn resolve_period(args: &Args, config: &Config) -> anyhow::Result<Period> {
    let current = Period::current();
    let month = args.month.or(config.ledger.default_month).unwrap_or(current.month);
    let year = args.year.or(config.ledger.default_year).unwrap_or(current.year);
    Ok(Period::new(month, year)?)
}

fn exit_code(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Controller errors have already been shown by the notifier; they only set the exit code.
async fn run(args: Args, config: Config) -> anyhow::Result<ExitCode> {
    let remote = Arc::new(HttpRemote::new(&config.remote)?);

    if let Command::Register { email, password } = &args.command {
        let account = remote.register(email, password).await?;
        println!("Registered {} (id {})", account.email, account.id);
        return Ok(ExitCode::SUCCESS);
    }

    if remote.token().is_none() {
        if let Some(auth) = &config.remote.auth {
            remote.login(&auth.username, &auth.password).await?;
        }
    }

    let period = resolve_period(&args, &config)?;
    let controller = LedgerController::new(remote, period, ControllerOptions::from(&config))?
        .with_notifier(Arc::new(ConsoleNotifier));

    let ok = match args.command {
        Command::List { page } => {
            let loaded = controller.load().await.is_ok();
            let salary = controller.load_salary().await.is_ok();
            controller.go_to_page(page);
            print!("{}", render::page(&controller.page(), &config.currency));
            loaded && salary
        }
        Command::Totals => {
            let loaded = controller.load().await.is_ok();
            let salary = controller.load_salary().await.is_ok();
            println!("{}", controller.period());
            println!("{}", render::totals(&controller.totals(), &config.currency));
            loaded && salary
        }
        Command::Salary { set } => {
            let result = match set {
                Some(amount) => controller.set_salary(amount).await.map(Some),
                None => controller.load_salary().await,
            };
            match result {
                Ok(Some(salary)) => {
                    let amount = render::money(salary.amount, &config.currency);
                    println!("Salary for {}: {}", period, amount);
                    true
                }
                Ok(None) => {
                    println!("No salary recorded for {}", period);
                    true
                }
                Err(_) => false,
            }
        }
        Command::Add { fields } => match controller.create(fields.into_draft()).await {
            Ok(report) => show_report(&controller, &report, &config),
            Err(_) => false,
        },
        Command::Edit { id, fields } => match controller.update(id, fields.into_draft()).await {
            Ok(report) => show_report(&controller, &report, &config),
            Err(_) => false,
        },
        Command::Delete { id, yes } => {
            if !yes {
                bail!("Refusing to delete transaction {} without --yes", id);
            }
            match controller.delete(id).await {
                Ok(report) => show_report(&controller, &report, &config),
                Err(_) => false,
            }
        }
        Command::Register { .. } => true,
        Command::InitConfig { force } => {
            init_config(&args.config, force)?;
            true
        }
    };

    Ok(exit_code(ok))
}

/// Print the outcome of an accepted mutation. False when the follow-up reload failed.
fn show_report(controller: &LedgerController, report: &MutationReport, config: &Config) -> bool {
    let verb = match report.operation {
        MutationKind::Create => "Created",
        MutationKind::Update => "Updated",
        MutationKind::Delete => "Deleted",
    };
    match &report.record {
        Some(record) => println!("{} transaction {} ({})", verb, record.id, record.day()),
        None => println!("{} transaction", verb),
    }
    if let Some(period) = report.drifted_to {
        println!("Now showing {}", period);
    }
    match &report.reload {
        Ok(_) => {
            print!("{}", render::page(&controller.page(), &config.currency));
            true
        }
        Err(_) => {
            eprintln!("The change was saved but the list could not be refreshed.");
            false
        }
    }
}
