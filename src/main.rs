use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Level, subscriber};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use awsprof::{
    active::ActiveProfile,
    aws_cli::{AwsCli, DEFAULT_PROGRAM},
    commands::{self, Context},
    paths::Paths,
    prompt::InquirePrompter,
    state::State,
    ui::{ColorMode, Ui},
};

#[derive(Parser)]
#[command(name = "awsprof")]
#[command(about = "AWS Profile Manager - accounts, roles and MFA sessions on top of the AWS CLI")]
#[command(version)]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// When to use colors: always, auto, never
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: ColorMode,

    /// AWS CLI executable to drive
    #[arg(long, global = true, env = "AWSPROF_AWS_CLI", default_value = DEFAULT_PROGRAM)]
    aws_cli: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add an account (<name>:iam) from a key CSV or typed keys
    CreateAccount {
        name: String,

        /// Access key CSV downloaded from the IAM console
        #[arg(long, short)]
        file: Option<PathBuf>,
    },

    /// Replace the keys of an existing account
    EditAccount {
        name: String,

        /// Access key CSV downloaded from the IAM console
        #[arg(long, short)]
        file: Option<PathBuf>,
    },

    /// Add a role profile (<account>:<role>)
    CreateRole {
        account: String,
        role: String,
        role_arn: String,

        /// Assume the role with the account's IAM keys instead of its MFA session
        #[arg(long)]
        iam: bool,
    },

    /// Make a profile active (interactive when omitted)
    Use { profile: Option<String> },

    /// Refresh the MFA session behind a profile and make it active
    Refresh {
        profile: Option<String>,

        /// MFA code (prompted when omitted)
        #[arg(long)]
        code: Option<String>,

        /// MFA device ARN, used only the first time
        #[arg(long)]
        arn: Option<String>,
    },

    /// List configured profiles
    List,

    /// Show the active profile
    Current,

    /// Print the shell command applying the active profile
    Env,

    /// Generate shell completions
    Completions { shell: Shell },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let ui = Ui::new(cli.color, cli.no_color);

    if let Err(e) = init_logging(cli.verbose) {
        ui.err(format!("Failed to initialize logging: {e}"));
        return ExitCode::FAILURE;
    }

    match run(cli, ui.clone()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ui.err(format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, ui: Ui) -> Result<()> {
    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "awsprof", &mut std::io::stdout());
        return Ok(());
    }

    let paths = Paths::new()?;
    let active = ActiveProfile::from_env();
    if active.get().is_none()
        && let Some(saved) = State::load(&paths.state_file).active_profile
    {
        active.set(saved);
    }

    let ctx = Context {
        store: AwsCli::new(cli.aws_cli, active.clone()),
        prompter: InquirePrompter,
        active,
        paths,
        ui,
    };

    match cli.command {
        Commands::CreateAccount { name, file } => {
            commands::create_account(&ctx, &name, file.as_deref())
        }
        Commands::EditAccount { name, file } => commands::edit_account(&ctx, &name, file.as_deref()),
        Commands::CreateRole {
            account,
            role,
            role_arn,
            iam,
        } => commands::create_role(&ctx, &account, &role, &role_arn, iam),
        Commands::Use { profile } => commands::use_profile(&ctx, profile.as_deref()),
        Commands::Refresh { profile, code, arn } => {
            commands::refresh(&ctx, profile.as_deref(), code.as_deref(), arn.as_deref())
        }
        Commands::List => commands::list(&ctx),
        Commands::Current => commands::current(&ctx),
        Commands::Env => commands::env(&ctx),
        Commands::Completions { .. } => Ok(()),
    }
}

fn init_logging(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    // RUST_LOG overrides the verbosity flag
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose >= 2)
        .compact()
        .finish();

    subscriber::set_global_default(subscriber)?;
    Ok(())
}
