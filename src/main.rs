//! Pocket Sim - Main Binary
//!
//! Plays single matches, runs tournaments and checks a card catalog for text
//! the effect compiler does not understand.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use pocket_sim::{
    game::{Game, GameLoop, OutputFormat, RulesConfig, VerbosityLevel},
    loader::{AsyncCardCatalog, CardCatalog, DeckLoader, DeckSpec},
    tournament::{run_tourney, AgentKind},
};
use std::path::{Path, PathBuf};

/// Verbosity level for game output (custom parser supporting both names and numbers)
#[derive(Debug, Clone, Copy)]
struct VerbosityArg(VerbosityLevel);

impl std::str::FromStr for VerbosityArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silent" | "0" => Ok(VerbosityArg(VerbosityLevel::Silent)),
            "minimal" | "1" => Ok(VerbosityArg(VerbosityLevel::Minimal)),
            "normal" | "2" => Ok(VerbosityArg(VerbosityLevel::Normal)),
            "verbose" | "3" => Ok(VerbosityArg(VerbosityLevel::Verbose)),
            _ => Err(format!(
                "invalid verbosity level '{s}' (expected: silent/0, minimal/1, normal/2, verbose/3)"
            )),
        }
    }
}

impl From<VerbosityArg> for VerbosityLevel {
    fn from(arg: VerbosityArg) -> Self {
        arg.0
    }
}

#[derive(Parser)]
#[command(name = "pocket")]
#[command(about = "Pocket Sim - pocket card battle engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single match between two decks
    Play {
        /// Catalog file or directory of catalog files (.json)
        catalog: PathBuf,

        /// Deck file (.deck) for player 1
        deck1: PathBuf,

        /// Deck file (.deck) for player 2
        deck2: PathBuf,

        /// Player 1 agent type
        #[arg(long, value_enum, default_value = "random")]
        p1: AgentKind,

        /// Player 2 agent type
        #[arg(long, value_enum, default_value = "random")]
        p2: AgentKind,

        /// Player 1 name
        #[arg(long, default_value = "Player 1")]
        p1_name: String,

        /// Player 2 name
        #[arg(long, default_value = "Player 2")]
        p2_name: String,

        /// Set random seed for deterministic games
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Verbosity level for game output (0=silent, 1=minimal, 2=normal, 3=verbose)
        #[arg(long, default_value = "normal", short = 'v')]
        verbosity: VerbosityArg,

        /// Echo log entries as JSON lines
        #[arg(long)]
        json: bool,

        /// Rules configuration file (.json)
        #[arg(long, value_name = "RULES_FILE")]
        rules: Option<PathBuf>,
    },

    /// Play many games in parallel and report statistics
    Tourney {
        /// Catalog file or directory of catalog files (.json)
        catalog: PathBuf,

        /// Deck files (.deck) to pair up
        #[arg(required = true)]
        decks: Vec<PathBuf>,

        /// Number of games to play
        #[arg(long, short = 'g', default_value_t = 1000)]
        games: usize,

        /// Tournament seed
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Player 1 agent type
        #[arg(long, value_enum, default_value = "random")]
        p1: AgentKind,

        /// Player 2 agent type
        #[arg(long, value_enum, default_value = "random")]
        p2: AgentKind,

        /// Rules configuration file (.json)
        #[arg(long, value_name = "RULES_FILE")]
        rules: Option<PathBuf>,
    },

    /// Compile every card of a catalog and list text that was not understood
    Check {
        /// Catalog file or directory of catalog files (.json)
        catalog: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            catalog,
            deck1,
            deck2,
            p1,
            p2,
            p1_name,
            p2_name,
            seed,
            verbosity,
            json,
            rules,
        } => {
            let rules = load_rules(rules.as_deref())?;
            let catalog = load_catalog(&catalog).await?;
            let deck1 = load_deck(&deck1, &catalog, &rules)?;
            let deck2 = load_deck(&deck2, &catalog, &rules)?;
            run_play(
                [deck1.into_seat(p1_name), deck2.into_seat(p2_name)],
                [p1, p2],
                rules,
                seed,
                verbosity.into(),
                json,
            )?
        }
        Commands::Tourney {
            catalog,
            decks,
            games,
            seed,
            p1,
            p2,
            rules,
        } => {
            let rules = load_rules(rules.as_deref())?;
            let catalog = load_catalog(&catalog).await?;
            println!("=== Pocket Sim - Tournament Mode ===\n");
            let mut specs = Vec::with_capacity(decks.len());
            for path in &decks {
                let spec = load_deck(path, &catalog, &rules)?;
                println!("  {}: {} cards", spec.name, spec.cards.len());
                specs.push(spec);
            }
            println!("\nRunning {games} games with {} decks (seed {seed})", specs.len());
            println!("Agents: P1={p1:?}, P2={p2:?}\n");
            let report = run_tourney(&specs, games, [p1, p2], &rules, seed)?;
            println!("{report}");
        }
        Commands::Check { catalog } => run_check(&catalog).await?,
    }

    Ok(())
}

fn load_rules(path: Option<&Path>) -> anyhow::Result<RulesConfig> {
    match path {
        Some(path) => RulesConfig::load(path).with_context(|| format!("loading rules from {}", path.display())),
        None => Ok(RulesConfig::default()),
    }
}

/// A single catalog file, or every `*.json` below a directory
async fn load_catalog(path: &Path) -> anyhow::Result<CardCatalog> {
    let catalog = if path.is_dir() {
        let db = AsyncCardCatalog::new(path);
        let (count, duration) = db
            .eager_load()
            .await
            .with_context(|| format!("loading catalog from {}", path.display()))?;
        eprintln!("Loaded {count} cards in {:.2}ms", duration.as_secs_f64() * 1000.0);
        db.snapshot().await
    } else {
        CardCatalog::load_file(path).with_context(|| format!("loading catalog from {}", path.display()))?
    };
    let failures = catalog.report().failures.len();
    if failures > 0 {
        eprintln!("Warning: {failures} card texts were only partly understood (run `pocket check` for details)");
    }
    Ok(catalog)
}

fn load_deck(path: &Path, catalog: &CardCatalog, rules: &RulesConfig) -> anyhow::Result<DeckSpec> {
    let deck = DeckLoader::load_from_file(path).with_context(|| format!("reading deck {}", path.display()))?;
    deck.resolve(catalog, rules)
        .with_context(|| format!("resolving deck {}", path.display()))
}

fn run_play(
    seats: [pocket_sim::game::Seat; 2],
    agents: [AgentKind; 2],
    rules: RulesConfig,
    seed: u64,
    verbosity: VerbosityLevel,
    json: bool,
) -> anyhow::Result<()> {
    let mut game = Game::new(seats, rules, seed);
    let first = agents[0].build(seed.wrapping_add(1));
    let second = agents[1].build(seed.wrapping_add(2));
    let format = if json { OutputFormat::Json } else { OutputFormat::Text };

    if verbosity >= VerbosityLevel::Minimal && !json {
        println!("=== Starting Game (seed {seed}) ===\n");
    }
    let result = GameLoop::new(&mut game, [&*first, &*second])
        .with_verbosity(verbosity)
        .with_output_format(format)
        .run_game()?;

    if verbosity >= VerbosityLevel::Minimal && !json {
        println!("\n=== Game Over ===");
        match result.winner {
            Some(winner) => println!("Winner: {}", game.player(winner).name),
            None => println!("Game ended in a draw"),
        }
        println!("Turns played: {}", result.turns_played);
        println!("Reason: {}", result.end_reason);
        for player in &game.players {
            println!("  {}: {} prize points", player.name, player.prize_points);
        }
    }
    Ok(())
}

async fn run_check(path: &Path) -> anyhow::Result<()> {
    let catalog = load_catalog(path).await?;
    let report = catalog.report();
    println!("Compiled {} card texts from {} cards", report.compiled, catalog.len());
    if report.is_clean() {
        println!("Every text compiled cleanly");
        return Ok(());
    }
    println!("{} texts were only partly understood:", report.failures.len());
    for failure in &report.failures {
        println!("  {failure}");
    }
    bail!("{} texts failed to compile", report.failures.len())
}
