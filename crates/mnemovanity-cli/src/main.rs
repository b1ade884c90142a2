//! MnemoVanity CLI
//!
//! Searches random BIP39 wallets for addresses matching vanity criteria.

mod output;

use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use mnemovanity_core::{
    AddressScope, Bip39Pipeline, Criteria, GenerationManager, MatchResult, Network, RepeatLocation, SearchConfig,
    ThroughputMeter, WordCount,
};

use crate::output::{ResultLog, DEFAULT_PER_FILE};

#[derive(Parser)]
#[command(name = "mnemovanity")]
#[command(author = "MnemoVanity Team")]
#[command(version = "0.1.0")]
#[command(about = "Vanity address finder for BIP39 wallets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search random mnemonics for matching addresses
    Search(SearchArgs),

    /// Derive the addresses of a known mnemonic
    Derive {
        /// Mnemonic phrase (quote it)
        phrase: String,

        /// Network (ETH, BTC_LEGACY, BTC_SEGWIT)
        #[arg(short, long, default_value = "ETH")]
        network: Network,

        /// Number of leading address indices
        #[arg(long, default_value = "5")]
        first: u32,
    },

    /// List supported networks
    Networks,

    /// Measure addresses checked per second
    Benchmark {
        #[arg(short, long, default_value = "ETH")]
        network: Network,

        /// Duration in seconds
        #[arg(short, long, default_value = "10")]
        duration: u64,

        /// Worker threads (0 = auto)
        #[arg(long, default_value = "0")]
        workers: usize,
    },
}

#[derive(Args)]
struct SearchArgs {
    /// Network (ETH, BTC_LEGACY, BTC_SEGWIT)
    #[arg(short, long, default_value = "ETH")]
    network: Network,

    /// Mnemonic length: 12 or 24
    #[arg(short, long, default_value = "12")]
    words: usize,

    /// Test indices 0..N of each wallet
    #[arg(long, default_value = "1", conflicts_with_all = ["index", "indices"])]
    first: u32,

    /// Test only this address index
    #[arg(long, conflicts_with = "indices")]
    index: Option<u32>,

    /// Comma-separated address indices
    #[arg(long)]
    indices: Option<String>,

    /// Comma-separated prefixes
    #[arg(short, long)]
    starts_with: Option<String>,

    /// Comma-separated suffixes
    #[arg(short, long)]
    ends_with: Option<String>,

    /// Comma-separated substrings
    #[arg(short, long)]
    contains: Option<String>,

    /// Minimum run of one repeated character
    #[arg(short, long)]
    repeating: Option<usize>,

    /// Require the repeated run at the end of the address
    #[arg(long, requires = "repeating")]
    repeat_at_end: bool,

    /// Built-in criteria set (combined with any explicit patterns)
    #[arg(short, long)]
    preset: Option<Preset>,

    /// Case-insensitive matching
    #[arg(short = 'i', long)]
    case_insensitive: bool,

    /// Load the whole search configuration from a JSON file
    #[arg(long, conflicts_with_all = ["starts_with", "ends_with", "contains", "repeating", "preset"])]
    config: Option<PathBuf>,

    /// Worker threads (0 = all cores but one)
    #[arg(long, default_value = "0")]
    workers: usize,

    /// Candidates per throughput report
    #[arg(long)]
    batch_size: Option<usize>,

    /// Stop after this many matches (0 = unlimited)
    #[arg(long, default_value = "0")]
    max_results: u64,

    /// Stop after this many seconds (0 = unlimited)
    #[arg(long, default_value = "0")]
    max_time: u64,

    /// Poll interval in milliseconds
    #[arg(long, default_value = "500")]
    poll_ms: u64,

    /// Append matches to rotating text files in this directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Matches per output file
    #[arg(long, default_value_t = DEFAULT_PER_FILE)]
    per_file: usize,

    /// Print matches as JSON lines
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    /// Well-known prefixes: 1Ace, 1King, bc1qcool, 0xdead, ...
    QuickFind,
    /// Contains 777, 888, 999 or 000
    Lucky,
    /// Seven or more repeated characters anywhere
    #[value(name = "repeat7")]
    Repeat7,
    /// Seven or more repeated characters at the end
    #[value(name = "repeat7-end")]
    Repeat7End,
}

impl Preset {
    fn apply(self, criteria: Criteria) -> Criteria {
        match self {
            Preset::QuickFind => {
                criteria.starts_with(["1Ace", "1King", "1Queen", "bc1qcool", "0x000", "0xdead", "0xbad"])
            }
            Preset::Lucky => criteria.contains(["777", "888", "999", "000"]),
            Preset::Repeat7 => criteria.repeating(7, RepeatLocation::Any),
            Preset::Repeat7End => criteria.repeating(7, RepeatLocation::End),
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Search(args) => cmd_search(args)?,
        Commands::Derive { phrase, network, first } => cmd_derive(&phrase, network, first)?,
        Commands::Networks => cmd_networks(),
        Commands::Benchmark {
            network,
            duration,
            workers,
        } => cmd_benchmark(network, duration, workers)?,
    }

    Ok(())
}

/// All cores but one, at least one
fn default_workers() -> usize {
    num_cpus::get().saturating_sub(1).max(1)
}

/// Split a comma-separated list, dropping blanks
fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_indices(list: &str) -> Result<Vec<u32>> {
    split_list(list)
        .iter()
        .map(|s| s.parse::<u32>().with_context(|| format!("Invalid address index: {}", s)))
        .collect()
}

fn build_config(args: &SearchArgs) -> Result<SearchConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?;
            serde_json::from_str::<SearchConfig>(&text).with_context(|| format!("Parsing {}", path.display()))?
        }
        None => {
            let mut criteria = Criteria::new();
            if let Some(list) = &args.starts_with {
                criteria = criteria.starts_with(split_list(list));
            }
            if let Some(list) = &args.ends_with {
                criteria = criteria.ends_with(split_list(list));
            }
            if let Some(list) = &args.contains {
                criteria = criteria.contains(split_list(list));
            }
            if let Some(min_run) = args.repeating {
                let location = if args.repeat_at_end { RepeatLocation::End } else { RepeatLocation::Any };
                criteria = criteria.repeating(min_run, location);
            }
            if let Some(preset) = args.preset {
                criteria = preset.apply(criteria);
            }

            let word_count = WordCount::try_from(args.words)?;
            let scope = match (&args.indices, args.index) {
                (Some(list), _) => AddressScope::Custom(parse_indices(list)?),
                (None, Some(index)) => AddressScope::Single(index),
                (None, None) => AddressScope::First(args.first),
            };

            SearchConfig::new(args.network, criteria)
                .word_count(word_count)
                .scope(scope)
                .worker_count(default_workers())
        }
    };

    if args.case_insensitive {
        config.criteria.case_insensitive = true;
    }
    if args.workers > 0 {
        config.worker_count = args.workers;
    }
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }

    config.validate()?;
    warn_impossible_patterns(&config);
    Ok(config)
}

/// Patterns using characters the network's encoding never produces can't match
fn warn_impossible_patterns(config: &SearchConfig) {
    let network = config.network;
    let prefix = network.address_prefix();
    let valid = network.valid_address_chars();
    let criteria = &config.criteria;

    let check = |pattern: &str, body: &str| {
        let bad = body.chars().find(|c| {
            if criteria.case_insensitive {
                !valid.contains(c.to_ascii_lowercase()) && !valid.contains(c.to_ascii_uppercase())
            } else {
                !valid.contains(*c)
            }
        });
        if let Some(c) = bad {
            warn!(%network, pattern, character = %c, "Pattern can never match this network");
        }
    };

    for pattern in &criteria.starts_with {
        let matches_prefix = pattern.starts_with(prefix) || prefix.starts_with(pattern.as_str());
        if !matches_prefix {
            warn!(%network, pattern = %pattern, expected = prefix, "Prefix pattern does not start with the address prefix");
        }
        check(pattern, pattern.get(prefix.len()..).unwrap_or(""));
    }
    for pattern in criteria.ends_with.iter().chain(&criteria.contains) {
        check(pattern, pattern);
    }
}

fn cmd_search(args: SearchArgs) -> Result<()> {
    let config = build_config(&args)?;

    let mut log = match &args.output {
        Some(dir) => Some(ResultLog::create(dir, args.per_file)?),
        None => None,
    };

    if !args.json {
        eprintln!("MnemoVanity v0.1.0");
        eprintln!("Network:  {}", config.network);
        eprintln!("Mnemonic: {}", config.word_count);
        eprintln!("Indices:  {:?}", config.address_indices);
        eprintln!("Criteria: {}", serde_json::to_string(&config.criteria)?);
        eprintln!("Workers:  {}", config.worker_count);
        eprintln!();
    }

    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = interrupted.clone();
        ctrlc::set_handler(move || interrupted.store(true, Ordering::Release))
            .context("Setting Ctrl-C handler")?;
    }

    let mut manager = GenerationManager::new();
    manager.start(config)?;

    let mut meter = ThroughputMeter::new();
    let poll = Duration::from_millis(args.poll_ms.max(10));
    let started = Instant::now();
    let max_time = (args.max_time > 0).then(|| Duration::from_secs(args.max_time));

    let reason = loop {
        std::thread::sleep(poll);

        for result in meter.poll(&manager) {
            print_result(&result, args.json)?;
            if let Some(log) = log.as_mut() {
                log.append(&result)?;
            }
        }

        if !args.json {
            eprint!("\r {} ", meter.status_line());
            std::io::stderr().flush()?;
        }

        if interrupted.load(Ordering::Acquire) {
            break "interrupted";
        }
        if args.max_results > 0 && meter.found() >= args.max_results {
            break "result limit reached";
        }
        if max_time.is_some_and(|limit| started.elapsed() >= limit) {
            break "time limit reached";
        }
    };

    manager.stop();

    if !args.json {
        eprintln!();
        eprintln!();
        eprintln!("Stopped: {}", reason);
        eprintln!("Total Checked: {}", meter.total_checked());
        eprintln!("Total Found:   {}", meter.found());
        eprintln!("Speed:         {:.0} addresses/s", meter.rate());
        if let Some(path) = log.as_ref().and_then(|log| log.current_file()) {
            eprintln!("Last file:     {}", path.display());
        }
    }
    info!(reason, checked = meter.total_checked(), found = meter.found(), "Session finished");

    Ok(())
}

fn print_result(result: &MatchResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(result)?);
        return Ok(());
    }

    println!();
    println!("💎 FOUND MATCH!");
    println!("{:-<60}", "");
    println!("Address:  {}", result.address);
    println!("Mnemonic: {}", result.mnemonic);
    println!("Index:    {}", result.index);
    println!("Pattern:  {} (Score: {}/10)", result.label, result.score);
    println!("Found at: {}", result.found_at.format("%Y-%m-%d %H:%M:%S"));
    println!("{:-<60}", "");
    Ok(())
}

fn cmd_derive(phrase: &str, network: Network, first: u32) -> Result<()> {
    let indices = AddressScope::First(first).indices();
    let pipeline = Bip39Pipeline::new(network, WordCount::default(), &indices)?;
    let candidate = pipeline.derive_words(phrase)?;

    let scheme = network.scheme();
    println!("{} (m/{}'/{}'/0'/0/i)", network, scheme.purpose, scheme.coin_type);
    for derived in &candidate.addresses {
        println!("{:>4}  {}", derived.index, derived.address);
    }
    Ok(())
}

fn cmd_networks() {
    println!("Supported Networks:");
    println!("{:-<60}", "");
    println!("{:<12} {:<18} {}", "Network", "Path", "Prefix");
    println!("{:-<60}", "");

    for network in Network::ALL {
        let scheme = network.scheme();
        println!(
            "{:<12} {:<18} {}",
            network.to_string(),
            format!("m/{}'/{}'/0'/0/i", scheme.purpose, scheme.coin_type),
            network.address_prefix()
        );
    }
}

fn cmd_benchmark(network: Network, duration_secs: u64, workers: usize) -> Result<()> {
    let workers = if workers == 0 { default_workers() } else { workers };

    eprintln!("Benchmarking {} for {} seconds...", network, duration_secs);
    eprintln!("Workers: {}", workers);
    eprintln!();

    // A criterion nothing can satisfy keeps every worker busy for the whole window
    let criteria = Criteria::new().starts_with(["zzzzzzzzzzzzzzzzzzz"]);
    let config = SearchConfig::new(network, criteria).worker_count(workers);

    let mut manager = GenerationManager::new();
    let mut meter = ThroughputMeter::new();
    manager.start(config)?;

    let deadline = Instant::now() + Duration::from_secs(duration_secs);
    while Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(500));
        meter.poll(&manager);
        eprint!("\r {} ", meter.status_line());
        std::io::stderr().flush()?;
    }
    manager.stop();

    eprintln!("\n\nBenchmark complete!");
    eprintln!("Checked: {}", meter.total_checked());
    eprintln!("Speed:   {:.0} addresses/s", meter.rate());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> SearchArgs {
        let mut argv = vec!["mnemovanity", "search"];
        argv.extend_from_slice(args);
        match Cli::parse_from(argv).command {
            Commands::Search(args) => args,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list(" 0xdead, ,0xbeef,"), vec!["0xdead", "0xbeef"]);
        assert!(split_list("").is_empty());
    }

    #[test]
    fn test_config_from_flags() {
        let args = parse(&["-n", "BTC_SEGWIT", "-w", "24", "--first", "5", "-c", "qqq, zzz", "--workers", "3"]);
        let config = build_config(&args).unwrap();

        assert_eq!(config.network, Network::BtcSegwit);
        assert_eq!(config.word_count, WordCount::TwentyFour);
        assert_eq!(config.address_indices, vec![0, 1, 2, 3, 4]);
        assert_eq!(config.criteria.contains, vec!["qqq", "zzz"]);
        assert_eq!(config.worker_count, 3);
    }

    #[test]
    fn test_presets_and_scope() {
        let args = parse(&["-p", "repeat7-end", "--index", "17"]);
        let config = build_config(&args).unwrap();
        assert_eq!(config.criteria, Criteria::new().repeating(7, RepeatLocation::End));
        assert_eq!(config.address_indices, vec![17]);

        let args = parse(&["-p", "lucky", "--indices", "3,1"]);
        let config = build_config(&args).unwrap();
        assert_eq!(config.criteria.contains, vec!["777", "888", "999", "000"]);
        assert_eq!(config.address_indices, vec![3, 1]);
    }

    #[test]
    fn test_invalid_flags_rejected() {
        assert!(build_config(&parse(&[])).is_err());
        assert!(build_config(&parse(&["-w", "15", "-c", "dead"])).is_err());
        assert!(build_config(&parse(&["--indices", "1,x", "-c", "dead"])).is_err());
        assert!(build_config(&parse(&["-r", "1"])).is_err());
    }

    #[test]
    fn test_default_workers() {
        assert!(default_workers() >= 1);
    }
}
