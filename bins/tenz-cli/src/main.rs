//! tenz-cli — operate a TENZ token ledger kept in a local state file.
//!
//! Each invocation loads the token, runs one operation through a fresh
//! [`Host`] at the current time (or `--at`), prints the resulting events and
//! saves the new state. A failed operation leaves the file untouched.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tenz_core::{Address, Amount, Host, Token, TokenEvent, TokenParams};
use tracing::{debug, info};

/// TENZ token command-line interface.
#[derive(Parser)]
#[command(name = "tenz-cli")]
#[command(version, about = "Transfer-gated token ledger with a time-based emission schedule")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Path to the token state file (default: <data dir>/tenz/token.json).
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    /// Caller identity: a 0x-prefixed hex address or a plain label.
    #[arg(long = "as", global = true, default_value = "owner")]
    caller: String,

    /// Unix time to run the operation at (default: now).
    #[arg(long, global = true)]
    at: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Log output format ("text" or "json")
    #[arg(long, global = true, default_value = "text")]
    log_format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy a new token; the caller becomes owner and initial holder.
    Deploy(DeployArgs),
    /// Show token metadata, supply and gate state.
    Info,
    /// Show the balance of an address.
    Balance { holder: String },
    /// Transfer tokens from the caller.
    Transfer { to: String, amount: String },
    /// Burn tokens held by the caller.
    Burn { amount: String },
    /// Open transfers to everyone (owner only, irreversible).
    EnableTransfers,
    /// Grant a pre-launch transfer right (owner only).
    Grant { addr: String },
    /// Cancel a pre-launch transfer right (owner only).
    Cancel { addr: String },
    /// Start the emission schedule (owner only, after enable-transfers).
    StartMinting,
    /// Mint up to `amount` to `to` (owner only); capped by the schedule.
    Mint { to: String, amount: String },
    /// Set the caller's allowance for a spender.
    Approve { spender: String, amount: String },
    /// Raise the caller's allowance for a spender.
    IncreaseApproval { spender: String, amount: String },
    /// Lower the caller's allowance for a spender (stops at zero).
    DecreaseApproval { spender: String, amount: String },
    /// Spend an allowance: move tokens from `owner` to `to`.
    TransferFrom { owner: String, to: String, amount: String },
    /// Show how much `spender` may move on behalf of `owner`.
    Allowance { owner: String, spender: String },
    /// Add an owner (owner only).
    AddOwner { addr: String },
    /// Remove an owner other than the caller (owner only).
    RemoveOwner { addr: String },
    /// Print the supply ceiling for a range of periods.
    Schedule(ScheduleArgs),
}

#[derive(Args)]
struct DeployArgs {
    /// Token parameter file (TOML, JSON or YAML); TENZ_* variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overwrite an existing state file.
    #[arg(long)]
    force: bool,
}

#[derive(Args)]
struct ScheduleArgs {
    /// First period to show.
    #[arg(long, default_value_t = 0)]
    from: u64,

    /// Number of periods to show.
    #[arg(long, default_value_t = 10)]
    count: u64,
}

/// What is persisted between invocations.
#[derive(Debug, Serialize, Deserialize)]
struct StateFile {
    token: Token,
    /// Latest time any operation ran at; the clock never goes below it.
    last_now: u64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.global.log_level, &cli.global.log_format);

    let path = resolve_state_path(cli.global.state.clone())?;
    let caller = parse_address(&cli.global.caller)?;
    debug!(state = %path.display(), %caller, "tenz-cli starting");

    match cli.command {
        Commands::Deploy(args) => {
            let now = match cli.global.at {
                Some(at) => at,
                None => wall_clock()?,
            };
            deploy(&path, caller, now, args)
        }
        command => run(&path, caller, cli.global.at, command),
    }
}

/// Deploy a token and write a fresh state file.
fn deploy(path: &Path, deployer: Address, now: u64, args: DeployArgs) -> Result<()> {
    if path.exists() && !args.force {
        bail!("State file already exists: {} (use --force to replace it)", path.display());
    }

    let params = TokenParams::load(args.config.as_deref()).context("Failed to load token parameters")?;
    let mut host = Host::new(now);
    let address = host.deploy(deployer, &params).context("Deployment failed")?;
    let token = host.release(&address)?;

    println!("Deployed {} ({}) at {}", token.name(), token.symbol(), address);
    println!(
        "Initial supply: {} {} credited to {}",
        token.total_supply().format_units(token.decimals()),
        token.symbol(),
        deployer
    );

    save_state(
        path,
        &StateFile {
            token,
            last_now: now,
        },
    )?;
    info!(%address, state = %path.display(), "token deployed");
    Ok(())
}

/// Load the token, run one command against it, save if it changed anything.
fn run(path: &Path, caller: Address, at: Option<u64>, command: Commands) -> Result<()> {
    let state = load_state(path)?;
    let now = match at {
        Some(at) => at,
        None => wall_clock()?.max(state.last_now),
    };

    let mut host = Host::new(state.last_now);
    host.set_time(now).context("Invalid --at")?;
    let token = host.adopt(state.token);
    let view = host.token(&token)?;
    let decimals = view.decimals();
    let symbol = view.symbol().to_string();
    let amount = |s: &str| parse_amount(s, decimals);

    match command {
        Commands::Deploy(_) => bail!("deploy does not operate on an existing token"),
        Commands::Info => {
            print_info(host.token(&token)?, now);
            return Ok(());
        }
        Commands::Balance { holder } => {
            let holder = parse_address(&holder)?;
            let balance = host.token(&token)?.balance_of(&holder);
            println!("{} {}", balance.format_units(decimals), symbol);
            return Ok(());
        }
        Commands::Allowance { owner, spender } => {
            let (owner, spender) = (parse_address(&owner)?, parse_address(&spender)?);
            let allowed = host.token(&token)?.allowance(&owner, &spender);
            println!("{} {}", allowed.format_units(decimals), symbol);
            return Ok(());
        }
        Commands::Schedule(args) => {
            print_schedule(host.token(&token)?, args.from, args.count)?;
            return Ok(());
        }
        Commands::Transfer { to, amount: a } => {
            let (to, a) = (parse_address(&to)?, amount(&a)?);
            host.call(token, caller, |t, ctx| t.transfer(ctx, to, a))?;
        }
        Commands::Burn { amount: a } => {
            let a = amount(&a)?;
            host.call(token, caller, |t, ctx| t.burn(ctx, a))?;
        }
        Commands::EnableTransfers => {
            host.call(token, caller, |t, ctx| t.enable_transfers(ctx))?;
        }
        Commands::Grant { addr } => {
            let addr = parse_address(&addr)?;
            host.call(token, caller, |t, ctx| t.grant_transfer_right(ctx, addr))?;
        }
        Commands::Cancel { addr } => {
            let addr = parse_address(&addr)?;
            host.call(token, caller, |t, ctx| t.cancel_transfer_right(ctx, addr))?;
        }
        Commands::StartMinting => {
            host.call(token, caller, |t, ctx| t.start_minting_period(ctx))?;
        }
        Commands::Mint { to, amount: a } => {
            let (to, a) = (parse_address(&to)?, amount(&a)?);
            let minted = host.call(token, caller, |t, ctx| t.mint(ctx, to, a))?;
            if minted.is_zero() {
                println!("Nothing mintable at {now}");
            }
        }
        Commands::Approve { spender, amount: a } => {
            let (spender, a) = (parse_address(&spender)?, amount(&a)?);
            host.call(token, caller, |t, ctx| t.approve(ctx, spender, a))?;
        }
        Commands::IncreaseApproval { spender, amount: a } => {
            let (spender, a) = (parse_address(&spender)?, amount(&a)?);
            host.call(token, caller, |t, ctx| t.increase_approval(ctx, spender, a))?;
        }
        Commands::DecreaseApproval { spender, amount: a } => {
            let (spender, a) = (parse_address(&spender)?, amount(&a)?);
            host.call(token, caller, |t, ctx| t.decrease_approval(ctx, spender, a))?;
        }
        Commands::TransferFrom { owner, to, amount: a } => {
            let (owner, to, a) = (parse_address(&owner)?, parse_address(&to)?, amount(&a)?);
            host.call(token, caller, |t, ctx| t.transfer_from(ctx, owner, to, a))?;
        }
        Commands::AddOwner { addr } => {
            let addr = parse_address(&addr)?;
            host.call(token, caller, |t, ctx| t.add_owner(ctx, addr))?;
        }
        Commands::RemoveOwner { addr } => {
            let addr = parse_address(&addr)?;
            host.call(token, caller, |t, ctx| t.remove_owner(ctx, addr))?;
        }
    }

    let mut updated = host.release(&token)?;
    for event in updated.take_events() {
        println!("{}", describe(&event, decimals, &symbol));
    }
    save_state(
        path,
        &StateFile {
            token: updated,
            last_now: host.now(),
        },
    )
}

fn print_info(token: &Token, now: u64) {
    let decimals = token.decimals();
    let symbol = token.symbol();
    println!("Token:          {} ({})", token.name(), symbol);
    println!("Address:        {}", token.address());
    println!("Decimals:       {decimals}");
    println!("Total supply:   {} {symbol}", token.total_supply().format_units(decimals));
    println!("Max supply:     {} {symbol}", token.max_supply().format_units(decimals));
    println!("Holders:        {}", token.ledger().holder_count());
    println!("Transferable:   {}", token.transferable());
    if !token.transferable() {
        for grantee in token.gate().grants() {
            println!("  grant:        {grantee}");
        }
    }
    for owner in token.owners() {
        println!("Owner:          {owner}");
    }
    match token.first_period_start() {
        Some(start) => {
            println!("Minting since:  {}", format_time(start));
            println!("Period:         {}", token.current_period(now));
            match token.mintable_now(now) {
                Ok(available) => {
                    println!("Mintable now:   {} {symbol}", available.format_units(decimals))
                }
                Err(e) => println!("Mintable now:   unavailable ({e})"),
            }
        }
        None => println!("Minting:        not started"),
    }
}

fn print_schedule(token: &Token, from: u64, count: u64) -> Result<()> {
    let curve = token.schedule().curve();
    let decimals = token.decimals();
    let start = token.first_period_start();

    println!("{:>10}  {:>36}  {:>28}  starts", "period", "max supply", "released");
    for period in from..from.saturating_add(count) {
        let ceiling = curve.max_allowed_supply(period)?;
        let released = curve.period_allotment(period)?;
        let begins = start
            .and_then(|s| period.checked_mul(curve.period_unit).and_then(|o| s.checked_add(o)))
            .map(format_time)
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{period:>10}  {:>36}  {:>28}  {begins}",
            ceiling.format_units(decimals),
            released.format_units(decimals)
        );
    }
    Ok(())
}

fn describe(event: &TokenEvent, decimals: u8, symbol: &str) -> String {
    let fmt = |a: &Amount| format!("{} {symbol}", a.format_units(decimals));
    match event {
        TokenEvent::Transfer { from, to, amount } => format!("Transfer {} from {from} to {to}", fmt(amount)),
        TokenEvent::Approval { owner, spender, amount } => {
            format!("Approval {owner} -> {spender}: {}", fmt(amount))
        }
        TokenEvent::Burn { holder, amount } => format!("Burn {} by {holder}", fmt(amount)),
        TokenEvent::Mint { to, amount } => format!("Mint {} to {to}", fmt(amount)),
        TokenEvent::TransfersEnabled => "Transfers enabled".to_string(),
        TokenEvent::TransferRightGranted { addr } => format!("Transfer right granted to {addr}"),
        TokenEvent::TransferRightCancelled { addr } => format!("Transfer right cancelled for {addr}"),
        TokenEvent::MintingStarted { at } => format!("Minting started at {}", format_time(*at)),
        TokenEvent::OwnerAdded { addr } => format!("Owner added: {addr}"),
        TokenEvent::OwnerRemoved { addr } => format!("Owner removed: {addr}"),
    }
}

/// `0x…` hex is taken literally; anything else is a label.
fn parse_address(s: &str) -> Result<Address> {
    let s = s.trim();
    if s.is_empty() {
        bail!("Empty address");
    }
    if s.starts_with("0x") || s.starts_with("0X") {
        return s.parse::<Address>().with_context(|| format!("Invalid address: {s}"));
    }
    Ok(Address::from_label(s))
}

fn parse_amount(s: &str, decimals: u8) -> Result<Amount> {
    Amount::parse_units(s, decimals).with_context(|| format!("Invalid amount: {s}"))
}

fn format_time(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|s| chrono::DateTime::from_timestamp(s, 0))
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| format!("@{secs}"))
}

fn wall_clock() -> Result<u64> {
    u64::try_from(chrono::Utc::now().timestamp()).context("System clock is before 1970")
}

/// Resolve the state file path, using the default if not provided.
fn resolve_state_path(path: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(p) = path {
        return Ok(p);
    }
    let data = dirs::data_dir().context("Could not determine data directory")?;
    Ok(data.join("tenz").join("token.json"))
}

fn load_state(path: &Path) -> Result<StateFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read state file {} (run `deploy` first)", path.display()))?;
    let state: StateFile =
        serde_json::from_str(&raw).with_context(|| format!("Corrupt state file: {}", path.display()))?;

    let token = &state.token;
    let held = token
        .ledger()
        .sum_of_balances()
        .with_context(|| format!("Corrupt state file: {}", path.display()))?;
    if held != token.total_supply() {
        bail!(
            "Corrupt state file: {} (balances sum to {} but total supply is {})",
            path.display(),
            held,
            token.total_supply()
        );
    }
    Ok(state)
}

/// Write via a sibling temp file so a crash never leaves a truncated state.
fn save_state(path: &Path, state: &StateFile) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(state).context("Failed to serialize state")?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).with_context(|| format!("Failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path).with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_str));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_and_hex_addresses_parse() {
        assert_eq!(parse_address("alice").unwrap(), Address::from_label("alice"));
        let alice = Address::from_label("alice");
        assert_eq!(parse_address(&alice.to_string()).unwrap(), alice);
        assert!(parse_address("0xzz").is_err());
        assert!(parse_address("  ").is_err());
    }

    #[test]
    fn amounts_parse_as_whole_tokens() {
        assert_eq!(parse_amount("1.5", 18).unwrap(), Amount::new(1_500_000_000_000_000_000));
        assert!(parse_amount("1.5.0", 18).is_err());
    }

    #[test]
    fn events_render_with_symbol() {
        let to = Address::from_label("bob");
        let line = describe(
            &TokenEvent::Mint {
                to,
                amount: Amount::new(2_500_000_000_000_000_000),
            },
            18,
            "TENZ",
        );
        assert_eq!(line, format!("Mint 2.5 TENZ to {to}"));
    }

    #[test]
    fn state_file_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("token.json");
        let owner = Address::from_label("owner");
        let token = Token::deploy(&TokenParams::default(), owner, Address::contract(&owner, 0)).unwrap();

        save_state(
            &path,
            &StateFile {
                token: token.clone(),
                last_now: 1_700_000_000,
            },
        )
        .unwrap();
        let loaded = load_state(&path).unwrap();
        assert_eq!(loaded.token, token);
        assert_eq!(loaded.last_now, 1_700_000_000);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn state_with_unbacked_supply_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        let owner = Address::from_label("owner");
        let token = Token::deploy(&TokenParams::default(), owner, Address::contract(&owner, 0)).unwrap();

        let mut json = serde_json::to_value(StateFile {
            token,
            last_now: 1_700_000_000,
        })
        .unwrap();
        json["token"]["ledger"]["total_supply"] = serde_json::Value::from("1");
        std::fs::write(&path, json.to_string()).unwrap();

        let err = load_state(&path).unwrap_err();
        assert!(err.to_string().contains("balances sum to"), "{err}");
    }

    #[test]
    fn timestamps_format_in_utc() {
        assert_eq!(format_time(0), "1970-01-01 00:00:00 UTC");
        assert_eq!(format_time(u64::MAX), format!("@{}", u64::MAX));
    }
}
