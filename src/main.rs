use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rubricon::batch;
use rubricon::config;
use rubricon::output::{self, ReportOptions, SummaryRow};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ROOT: i32 = 2;
const EXIT_CONFIG: i32 = 4;

const DEFAULT_ROOT: &str = "..";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Report blocks followed by the summary
    Text,
    /// Summary only, tab-separated
    Tsv,
    /// Summary and full results as JSON
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List built-in rubrics with their categories and weights
    Rubrics,
    /// Validate a rubric YAML file
    Check {
        /// Path to the rubric file
        path: PathBuf,
    },
}

#[derive(Parser, Debug)]
#[command(name = "rubricon")]
#[command(about = "Grade programming assignments against a weighted rubric", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// A single submission, or a directory holding one directory per student (defaults to ..)
    root: Option<PathBuf>,

    /// Built-in rubric name or path to a rubric YAML file
    #[arg(short, long, env = "RUBRICON_RUBRIC", default_value = config::DEFAULT_RUBRIC)]
    rubric: String,

    /// Skip submission directories matching this glob (repeatable)
    #[arg(short = 'x', long = "exclude", value_name = "GLOB")]
    exclude: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = rubricon::logging::init_tracing(cli.verbose) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let code = match cli.command {
        Some(Commands::Rubrics) => list_rubrics(),
        Some(Commands::Check { ref path }) => check_rubric(path),
        None => grade(&cli),
    };

    std::process::exit(code);
}

fn grade(cli: &Cli) -> i32 {
    let start_time = Instant::now();

    let rubric = match config::load_rubric(&cli.rubric) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Rubric error: {:#}", e);
            return EXIT_CONFIG;
        }
    };

    if cli.verbose {
        eprintln!(
            "Using rubric '{}' ({} categories)",
            rubric.title.as_deref().unwrap_or(&rubric.name),
            rubric.categories.len()
        );
    }

    let globs: Vec<&str> = config::DEFAULT_EXCLUDES
        .iter()
        .copied()
        .chain(cli.exclude.iter().map(String::as_str))
        .collect();
    let exclude = match batch::compile_excludes(&globs) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Invalid exclude pattern: {}", e);
            return EXIT_CONFIG;
        }
    };

    let root = cli
        .root
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ROOT));
    let run = match batch::run(&root, &rubric, &exclude) {
        Ok(run) => run,
        Err(e) => {
            eprintln!("Error: {}", e);
            return EXIT_ROOT;
        }
    };

    let rows: Vec<SummaryRow> = run
        .outcomes
        .iter()
        .map(|outcome| SummaryRow {
            submission: outcome.submission.id.clone(),
            total: outcome.result.as_ref().ok().map(|r| r.rounded_total()),
            error: outcome
                .result
                .as_ref()
                .err()
                .map(|e| e.summary().to_string()),
        })
        .collect();

    let use_colors = !cli.no_color && output::should_use_colors();

    match cli.format {
        Format::Text => {
            let options = ReportOptions {
                use_colors,
                encouragement: rubric.encouragement.as_ref(),
            };
            for outcome in &run.outcomes {
                match outcome.result {
                    Ok(ref result) => {
                        println!("{}", output::render(&outcome.submission.id, result, options));
                        println!();
                    }
                    Err(ref e) => eprintln!("Could not grade {}: {}", outcome.submission.id, e),
                }
            }
            println!("{}", output::format_summary(&rows, use_colors));
        }
        Format::Tsv => {
            if !rows.is_empty() {
                println!("{}", output::format_tsv(&rows));
            }
        }
        Format::Json => {
            let results: Vec<_> = run.graded().cloned().collect();
            match output::format_json(&rows, &results) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("Failed to serialize results: {}", e);
                    return EXIT_CONFIG;
                }
            }
        }
    }

    if cli.verbose {
        // Whole milliseconds keep the readout short
        let elapsed = Duration::from_millis(start_time.elapsed().as_millis() as u64);
        eprintln!(
            "Graded {} submissions in {}",
            rows.len(),
            humantime::format_duration(elapsed)
        );
    }

    EXIT_SUCCESS
}

fn list_rubrics() -> i32 {
    for name in config::builtin_names() {
        let rubric = match config::builtin_rubric(name) {
            Some(Ok(r)) => r,
            Some(Err(e)) => {
                eprintln!("Built-in rubric '{}' is broken: {:#}", name, e);
                return EXIT_CONFIG;
            }
            None => continue,
        };

        match rubric.title {
            Some(ref title) => println!("{} - {}", name, title),
            None => println!("{}", name),
        }
        for category in &rubric.categories {
            println!(
                "  {:<14} {:>3}",
                category.name,
                output::format_points(category.weight)
            );
        }
        if let Some(ref bonus) = rubric.bonus {
            println!(
                "  bonus +{} when {} of {} conditions hold",
                output::format_points(bonus.points),
                bonus.required,
                bonus.conditions.len()
            );
        }
    }

    if let Some(dir) = config::get_rubric_dir() {
        println!();
        println!("User rubrics are loaded from {}", dir.display());
    }

    EXIT_SUCCESS
}

fn check_rubric(path: &Path) -> i32 {
    match config::load_rubric_file(path) {
        Ok(rubric) => {
            println!(
                "{}: OK ({} artifacts, {} categories)",
                rubric.name,
                rubric.artifacts.len(),
                rubric.categories.len()
            );
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("{:#}", e);
            EXIT_CONFIG
        }
    }
}
