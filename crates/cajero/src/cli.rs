//! Clap derive structures for the `cajero` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.
//! Only depends on clap so `build.rs` can include it for man pages.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// cajero -- demo bank client
#[derive(Debug, Parser)]
#[command(
    name = "cajero",
    version,
    about = "Open accounts, issue withdrawal codes and draw cash from the demo ATM",
    long_about = "Command-line client for the cajero demo bank.\n\n\
        Bancolombia and Nequi withdrawals are authorised with a one-time code\n\
        valid for 30 minutes; debit cards withdraw with their PIN.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration profile to use
    #[arg(long, short = 'p', env = "CAJERO_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Account service URL (overrides profile)
    #[arg(long, short = 'u', env = "CAJERO_URL", global = true)]
    pub url: Option<String>,

    /// Bank product (overrides profile)
    #[arg(long, short = 'P', env = "CAJERO_PROVIDER", global = true)]
    pub provider: Option<ProviderArg>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "CAJERO_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "CAJERO_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "CAJERO_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Shared Enums ─────────────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProviderArg {
    Bancolombia,
    Nequi,
    /// Debit card
    #[value(alias = "card")]
    Tarjeta,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Open, inspect and look up accounts
    #[command(alias = "acct")]
    Account(AccountArgs),

    /// Log in and remember the session token
    Login(LoginArgs),

    /// Forget the stored session token
    Logout,

    /// Recent movements of the logged-in account
    #[command(alias = "tx")]
    Transactions,

    /// Withdrawal security codes
    Code(CodeArgs),

    /// Redeem a code (or card PIN) for cash
    Withdraw(WithdrawArgs),

    /// Guided ATM flow: code, countdown, cash
    Atm(AtmArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── PIN input ───────────────────────────────────────────────────────

/// Where the 4-digit PIN comes from. Prompted when absent.
#[derive(Debug, Args)]
pub struct PinArg {
    /// 4-digit PIN (prompted when omitted)
    #[arg(long, env = "CAJERO_PIN", hide_env_values = true)]
    pub pin: Option<String>,
}

// ── Account ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AccountArgs {
    #[command(subcommand)]
    pub command: AccountCommand,
}

#[derive(Debug, Subcommand)]
pub enum AccountCommand {
    /// Open a new account
    Create(CreateAccountArgs),

    /// Show the logged-in account
    Show {
        /// Print full account and card numbers
        #[arg(long)]
        reveal: bool,
    },

    /// Look up any account by number
    Lookup {
        /// Account or card number
        number: String,

        /// Print full account and card numbers
        #[arg(long)]
        reveal: bool,
    },
}

#[derive(Debug, Args)]
pub struct CreateAccountArgs {
    /// Full name
    #[arg(long)]
    pub name: String,

    /// National ID number (cédula)
    #[arg(long)]
    pub document: String,

    /// Date of birth (YYYY-MM-DD)
    #[arg(long)]
    pub birth_date: String,

    /// 10-digit phone (required for Bancolombia and Nequi)
    #[arg(long)]
    pub phone: Option<String>,

    /// Opening balance in pesos
    #[arg(long, default_value = "0")]
    pub balance: String,

    #[command(flatten)]
    pub pin: PinArg,
}

// ── Login ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Phone number (Bancolombia, Nequi)
    #[arg(long, conflicts_with = "card")]
    pub phone: Option<String>,

    /// Card number (debit card)
    #[arg(long)]
    pub card: Option<String>,

    /// Don't store the token in the system keyring
    #[arg(long)]
    pub no_store: bool,

    #[command(flatten)]
    pub pin: PinArg,
}

// ── Codes ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CodeArgs {
    #[command(subcommand)]
    pub command: CodeCommand,
}

#[derive(Debug, Subcommand)]
pub enum CodeCommand {
    /// Ask the bank for a one-time withdrawal code
    #[command(alias = "gen")]
    Generate(GenerateCodeArgs),
}

#[derive(Debug, Args)]
pub struct GenerateCodeArgs {
    /// Account number (defaults to the profile's account)
    #[arg(long, short = 'a')]
    pub account: Option<String>,

    /// Amount you intend to withdraw (informational)
    #[arg(long)]
    pub amount: Option<String>,

    /// Keep running and show the validity countdown
    #[arg(long, short = 'w', conflicts_with = "copy_only")]
    pub watch: bool,

    /// Print only the raw code (for piping into a clipboard tool)
    #[arg(long)]
    pub copy_only: bool,

    #[command(flatten)]
    pub pin: PinArg,
}

// ── Withdraw ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WithdrawArgs {
    /// Account number (defaults to the profile's account)
    #[arg(long, short = 'a')]
    pub account: Option<String>,

    /// Amount in pesos, a multiple of 10.000
    #[arg(long, short = 'm')]
    pub amount: String,

    /// Withdrawal code (Bancolombia, Nequi)
    #[arg(long, short = 'c')]
    pub code: Option<String>,

    #[command(flatten)]
    pub pin: PinArg,
}

// ── ATM ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AtmArgs {
    /// Account or card number (prompted when omitted)
    #[arg(long, short = 'a')]
    pub account: Option<String>,

    /// Amount in pesos (prompted when omitted)
    #[arg(long, short = 'm')]
    pub amount: Option<String>,

    #[command(flatten)]
    pub pin: PinArg,
}

// ── Config ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive configuration wizard
    Init,

    /// Show the current configuration
    Show,

    /// List configured profiles
    Profiles,

    /// Make a profile the default
    Use {
        /// Profile name
        name: String,
    },

    /// Set a profile key
    Set {
        /// Key: url, provider, account, insecure, timeout, ca_cert, code_validity_secs
        key: String,
        /// New value
        value: String,
    },
}

// ── Completions ─────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: clap_complete::Shell,
}
