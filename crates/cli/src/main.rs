//! Silabario CLI — tiered Spanish word exercises from a text generator.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use silabario_core::config::default_store_path;
use silabario_core::generate::{get_generator, select_with_rules, ForbiddenSet};
use silabario_core::generate::parse::parse_candidates;
use silabario_core::language::{analyze, Policy};
use silabario_core::{
    run_generation, GenerationConfig, GenerationError, GenerationRequest, JsonFileStore, Tier,
};

// ─── Top-level CLI ───────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "silabario",
    about = "Generate tiered Spanish word exercises without repeats",
    version,
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Show verbose output
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Generate and store words for a section tier
    Generate(GenerateArgs),
    /// Show syllables, difficulty and tier fit for words
    Analyze(AnalyzeArgs),
    /// Pick words for a tier from generator-style text
    Select(SelectArgs),
    /// List stored exercises
    List(ListArgs),
}

fn parse_tier(s: &str) -> Result<Tier, String> {
    let n: u8 = s.parse().map_err(|_| format!("invalid tier: {}", s))?;
    Tier::try_from(n)
}

// ─── Shared arguments ────────────────────────────────────────────

#[derive(Parser, Debug)]
struct StoreArgs {
    /// Exercise store file (default: $SILABARIO_STORE or ~/.local/share/silabario/exercises.json)
    #[arg(long)]
    store: Option<PathBuf>,

    /// Tenant id
    #[arg(long)]
    tenant: u32,

    /// Section id
    #[arg(long)]
    section: u32,
}

impl StoreArgs {
    fn path(&self) -> PathBuf {
        self.store.clone().unwrap_or_else(default_store_path)
    }
}

// ─── Generate ────────────────────────────────────────────────────

#[derive(Parser, Debug)]
struct GenerateArgs {
    #[command(flatten)]
    store: StoreArgs,

    /// Topic the words should relate to
    #[arg(long)]
    topic: String,

    /// Number of words wanted
    #[arg(long, default_value_t = 5)]
    count: usize,

    /// Difficulty tier (1-3)
    #[arg(long, value_parser = parse_tier)]
    tier: Tier,

    /// User recorded as creator
    #[arg(long, default_value_t = 0)]
    actor: u32,

    /// Exercise kind
    #[arg(long)]
    kind: Option<String>,

    /// Generator backend
    #[arg(long, default_value = "openai", value_parser = ["openai", "replay"])]
    generator: String,

    /// Saved generator response used by the replay backend
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Model name (overrides SILABARIO_OPENAI_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// JSON file with generation settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum items per section tier
    #[arg(long)]
    hard_cap: Option<usize>,

    /// Generator rounds per request
    #[arg(long)]
    rounds: Option<usize>,

    /// Print the result as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Parser, Debug)]
struct AnalyzeArgs {
    /// Words to analyze
    #[arg(required = true)]
    words: Vec<String>,
}

#[derive(Parser, Debug)]
struct SelectArgs {
    /// Difficulty tier (1-3)
    #[arg(long, value_parser = parse_tier)]
    tier: Tier,

    /// Number of words wanted
    #[arg(long, default_value_t = 5)]
    count: usize,

    /// Words already used (repeatable)
    #[arg(long = "used")]
    used: Vec<String>,

    /// Generator output file (default: stdin)
    input: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct ListArgs {
    #[command(flatten)]
    store: StoreArgs,

    /// Only this tier
    #[arg(long, value_parser = parse_tier)]
    tier: Option<Tier>,
}

// ─── Main ────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let result = match cli.command {
        Command::Generate(args) => run_generate(args),
        Command::Analyze(args) => run_analyze(args),
        Command::Select(args) => run_select(args),
        Command::List(args) => run_list(args),
    };

    if let Err(e) = result {
        log::error!("{:#}", e);
        let code = match e.downcast_ref::<GenerationError>() {
            Some(GenerationError::QuotaExceeded { .. }) => 2,
            Some(GenerationError::Exhausted { .. }) => 3,
            _ => 1,
        };
        std::process::exit(code);
    }
}

// ─── Runners ─────────────────────────────────────────────────────

fn load_config(args: &GenerateArgs) -> Result<GenerationConfig> {
    let mut config = match &args.config {
        Some(path) => GenerationConfig::from_json_file(path)?,
        None => GenerationConfig::default(),
    };
    if let Some(cap) = args.hard_cap {
        config.hard_cap = cap;
    }
    if let Some(rounds) = args.rounds {
        config.max_rounds = rounds;
    }
    config.validate()?;
    Ok(config)
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    let config = load_config(&args)?;

    let replay_text = match &args.replay {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read replay file: {}", path.display()))?,
        ),
        None => None,
    };
    let generator = get_generator(&args.generator, replay_text.as_deref(), args.model.as_deref())?;

    let store_path = args.store.path();
    let mut store = JsonFileStore::open(&store_path, config.hard_cap)?;
    log::info!("Using store {}", store.path().display());

    let request = GenerationRequest {
        topic: args.topic.clone(),
        requested_count: args.count,
        tier: args.tier,
        tenant_id: args.store.tenant,
        section_id: args.store.section,
        actor_id: args.actor,
        kind: args.kind.clone(),
    };

    let result = run_generation(&request, generator.as_ref(), &mut store, &config)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("{}", result.message());
    for word in &result.accepted_words {
        println!("  {}", word);
    }
    if result.shortfall {
        println!(
            "Only {} of {} requested word(s) could be generated.",
            result.accepted_words.len(),
            result.to_generate
        );
    }
    Ok(())
}

fn yes_no(b: bool) -> &'static str {
    if b { "yes" } else { "no" }
}

fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    let rules = GenerationConfig::default().rules;
    println!(
        "{:<20} {:>4} {:>4} {:>6}  {:<9} {:<9} {:<9}",
        "word", "len", "syl", "score", "tier 1", "tier 2", "tier 3"
    );
    for word in &args.words {
        let f = analyze(word);
        let cells: Vec<String> = Tier::ALL
            .iter()
            .map(|&t| {
                format!(
                    "{}/{}",
                    yes_no(rules.fits_features(&f, t, Policy::Strict)),
                    yes_no(rules.fits_features(&f, t, Policy::Relaxed))
                )
            })
            .collect();
        println!(
            "{:<20} {:>4} {:>4} {:>6}  {:<9} {:<9} {:<9}",
            word.trim(),
            f.length,
            f.syllables,
            f.score,
            cells[0],
            cells[1],
            cells[2]
        );
    }
    println!("(strict/relaxed)");
    Ok(())
}

fn run_select(args: SelectArgs) -> Result<()> {
    let text = match &args.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };

    let candidates = parse_candidates(&text);
    log::info!("Parsed {} candidate(s)", candidates.len());

    let used = ForbiddenSet::from_raw(&args.used);
    let rules = GenerationConfig::default().rules;
    let picked = select_with_rules(candidates.as_slice(), args.tier, args.count, &used, &rules);
    if picked.is_empty() {
        bail!("No candidate fits tier {}", args.tier);
    }
    for word in picked {
        println!("{}", word);
    }
    Ok(())
}

fn run_list(args: ListArgs) -> Result<()> {
    let path = args.store.path();
    let store = JsonFileStore::open(&path, GenerationConfig::default().hard_cap)?;
    let records = store
        .inner()
        .list(args.store.tenant, args.store.section, args.tier);
    if records.is_empty() {
        println!("No exercises in section {}", args.store.section);
        return Ok(());
    }
    for r in records {
        println!(
            "{}  tier {}  {:<8} {}{}",
            r.id,
            r.tier,
            r.kind,
            r.content,
            if r.enabled { "" } else { "  (disabled)" }
        );
    }
    Ok(())
}
