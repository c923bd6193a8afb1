use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Instant;

use gridtable::output::{self, GridOptions, Theme, ThemeColors};
use gridtable::source::{self, ErgastSource, ResponseCache, ResultsSource, SeasonFile};
use gridtable::standings::{
    build_table, constructor_standings, driver_standings, AggregateOptions, ParticipantKind,
    PointsSource, Standings, StandingsError,
};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_DATA: i32 = 2;
const EXIT_CONFIG: i32 = 4;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage the on-disk HTTP response cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug)]
enum CacheAction {
    /// Delete all cached responses
    Clear,
    /// Print the cache directory
    Path,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Default)]
enum Format {
    /// Race-by-race grid
    #[default]
    Grid,
    /// Ranked list with points, wins and podiums
    List,
    /// Tab-separated grid for scripting
    Tsv,
}

#[derive(Parser, Debug)]
#[command(name = "gridtable")]
#[command(about = "Formula 1 championship standings in a race-by-race grid", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/gridtable/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Season to show; prompts when omitted
    #[arg(short, long)]
    year: Option<i32>,

    /// Constructors' championship instead of drivers'
    #[arg(long)]
    constructors: bool,

    /// Count sprint wins and podiums
    #[arg(long)]
    sprint_trophies: bool,

    /// Sum the points reported by the source instead of recomputing them
    #[arg(long)]
    reported_points: bool,

    /// Print the per-round points breakdown
    #[arg(long)]
    debug: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Grid)]
    format: Format,

    /// Also write the grid as TSV to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Read results from a YAML/JSON season file instead of the API
    #[arg(long)]
    from_file: Option<PathBuf>,

    /// Bypass the response cache
    #[arg(long)]
    no_cache: bool,

    /// Disable colours even on a terminal
    #[arg(long)]
    no_color: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

async fn run<S: ResultsSource>(
    source: &S,
    year: i32,
    kind: ParticipantKind,
    options: &AggregateOptions,
) -> Result<Standings, StandingsError> {
    match kind {
        ParticipantKind::Driver => driver_standings(source, year, options).await,
        ParticipantKind::Constructor => constructor_standings(source, year, options).await,
    }
}

fn handle_cache(action: &CacheAction) -> i32 {
    let path = source::get_cache_path();
    match action {
        CacheAction::Clear => match source::clear_cache(&path) {
            Ok(()) => {
                println!("Cleared cache at {}", path.display());
                EXIT_SUCCESS
            }
            Err(e) => {
                eprintln!("Failed to clear cache: {:#}", e);
                EXIT_DATA
            }
        },
        CacheAction::Path => {
            println!("{}", path.display());
            EXIT_SUCCESS
        }
    }
}

fn render(standings: &Standings, cli: &Cli) -> String {
    let table = build_table(&standings.rows, &standings.events);

    let mut sections = Vec::new();
    match cli.format {
        Format::Grid => {
            let use_colors = !cli.no_color && output::should_use_colors();
            let colors = if use_colors {
                ThemeColors::for_theme(Theme::detect())
            } else {
                ThemeColors::dark()
            };
            let compact = output::get_terminal_width()
                .is_some_and(|width| output::grid_width(&table, true) > width);
            let title = format!("F1 {} {} Standings", standings.year, standings.kind);
            let options = GridOptions {
                use_colors,
                compact,
                colors,
            };
            sections.push(output::format_grid(&table, &title, &options));
            sections.push(output::format_summary(&table, standings.year, standings.kind));
        }
        Format::List => {
            sections.push(output::format_standings_list(standings));
            sections.push(output::format_summary(&table, standings.year, standings.kind));
        }
        Format::Tsv => sections.push(output::format_tsv(&table)),
    }

    if let Some(skipped) = output::format_skipped(standings) {
        sections.push(skipped);
    }
    if cli.debug {
        sections.push(output::format_breakdown(standings));
    }

    sections.join("\n\n")
}

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for rustls 0.23+)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        tracing::debug!("rustls crypto provider already installed");
    }

    let cli = Cli::parse();
    gridtable::logger::init_cli_logger(cli.verbose);

    if let Some(Commands::Cache { action }) = &cli.command {
        std::process::exit(handle_cache(action));
    }

    let start_time = Instant::now();

    let config = match gridtable::config::load_config(cli.config.clone()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    if let Err(errors) = gridtable::config::validate_config(&config) {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let year = match cli.year {
        Some(year) => year,
        None => gridtable::prompt::prompt_for_year(config.default_year),
    };

    let kind = if cli.constructors {
        ParticipantKind::Constructor
    } else {
        ParticipantKind::Driver
    };

    let mut options = config.aggregate_options();
    options.debug = cli.debug;
    if cli.sprint_trophies {
        options.include_sprint_wins_podiums = true;
    }
    if cli.reported_points {
        options.points_source = PointsSource::Reported;
    }

    let result = match &cli.from_file {
        Some(path) => {
            let season = match SeasonFile::load(path) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Failed to load season file: {:#}", e);
                    std::process::exit(EXIT_DATA);
                }
            };
            run(&season, year, kind, &options).await
        }
        None => {
            // validate_config already rejected an unparseable TTL
            let ttl = config.cache_ttl().unwrap_or_default();
            let cache = if cli.no_cache {
                ResponseCache::disabled()
            } else {
                ResponseCache::new(source::get_cache_path(), ttl)
            };
            if cache.is_enabled() {
                tracing::debug!(path = %cache.path().display(), "using response cache");
            }
            let client = match source::create_client(config.request_timeout()) {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("Failed to create HTTP client: {:#}", e);
                    std::process::exit(EXIT_DATA);
                }
            };
            let ergast = ErgastSource::new(client, &config.api_base_url, cache);
            run(&ergast, year, kind, &options).await
        }
    };

    let standings = match result {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            let code = match e {
                StandingsError::InvalidYear { .. } => EXIT_CONFIG,
                _ => EXIT_DATA,
            };
            std::process::exit(code);
        }
    };

    println!("{}", render(&standings, &cli));

    if let Some(path) = &cli.output {
        let table = build_table(&standings.rows, &standings.events);
        if let Err(e) = output::write_export(path, &output::format_tsv(&table)) {
            eprintln!("Export failed: {:#}", e);
            std::process::exit(EXIT_DATA);
        }
        eprintln!("Wrote {}", path.display());
    }

    tracing::debug!(
        rows = standings.rows.len(),
        elapsed = ?start_time.elapsed(),
        "done"
    );

    std::process::exit(EXIT_SUCCESS);
}
