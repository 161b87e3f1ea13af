mod report;

use clap::{Parser, Subcommand, ValueEnum};
use gomory_solver::{
    CutRowSelection, CuttingPlaneDriver, DriverConfig, ProblemSpec, Reoptimize, TraceStatus,
};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gomory")]
#[command(about = "Solve small integer linear programs with Gomory cutting planes", long_about = None)]
struct Cli {
    /// Log filter, e.g. `debug` or `gomory_solver=trace` (overrides GOMORY_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a model file and output the AST
    Parse {
        /// The file to parse
        file: PathBuf,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
    },
    /// Solve a model with the cutting-plane method
    Solve {
        /// Model file (`.json` for a serialized problem, text model otherwise)
        file: PathBuf,
        /// Maximum number of cuts before giving up
        #[arg(short = 'n', long, default_value_t = 10)]
        max_cuts: usize,
        /// How to re-solve after each cut
        #[arg(long, value_enum, default_value_t = Strategy::Rebuild)]
        strategy: Strategy,
        /// Which fractional row to cut
        #[arg(long, value_enum, default_value_t = Selection::First)]
        selection: Selection,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
        /// Also write a full report to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check a model file for errors
    Check {
        /// The file to check
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Pretty,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum Strategy {
    Rebuild,
    Dual,
}

#[derive(Clone, Copy, ValueEnum)]
enum Selection {
    First,
    Most,
}

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(l) => EnvFilter::try_new(l).unwrap_or_else(|e| {
            eprintln!("Invalid log filter '{}': {}", l, e);
            EnvFilter::new("warn")
        }),
        None => EnvFilter::try_from_env("GOMORY_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("{}", message);
    std::process::exit(1);
}

fn read_source(file: &Path) -> Result<String, String> {
    std::fs::read_to_string(file).map_err(|e| format!("Error reading file: {}", e))
}

/// `.json` files hold a serialized problem, anything else is a text model
fn load_problem(file: &Path) -> Result<ProblemSpec, String> {
    let source = read_source(file)?;
    let problem = if file.extension().is_some_and(|ext| ext == "json") {
        let problem: ProblemSpec =
            serde_json::from_str(&source).map_err(|e| format!("JSON error: {}", e))?;
        problem.validate().map_err(|e| format!("Invalid model: {}", e))?;
        problem
    } else {
        gomory_lang::Compiler::compile_source(&source)
            .map_err(|e| format!("Compile error: {}", e))?
    };

    debug!(
        component = "cli",
        operation = "load_problem",
        status = "success",
        file = %file.display(),
        variables = problem.num_variables(),
        constraints = problem.num_constraints(),
        "Loaded model"
    );
    Ok(problem)
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    match cli.command {
        Commands::Parse { file, format } => {
            let source = read_source(&file).unwrap_or_else(|e| fail(e));
            let model = gomory_lang::Parser::parse(&source)
                .unwrap_or_else(|e| fail(format!("Parse error: {}", e)));
            match format {
                Format::Json => match serde_json::to_string_pretty(&model) {
                    Ok(json) => println!("{}", json),
                    Err(e) => fail(format!("JSON error: {}", e)),
                },
                Format::Pretty => println!("{:#?}", model),
            }
        }
        Commands::Solve {
            file,
            max_cuts,
            strategy,
            selection,
            format,
            output,
        } => {
            let problem = load_problem(&file).unwrap_or_else(|e| fail(e));

            let config = DriverConfig {
                max_cuts,
                reoptimize: match strategy {
                    Strategy::Rebuild => Reoptimize::Rebuild,
                    Strategy::Dual => Reoptimize::DualSimplex,
                },
                row_selection: match selection {
                    Selection::First => CutRowSelection::FirstFractional,
                    Selection::Most => CutRowSelection::MostFractional,
                },
            };
            let run = CuttingPlaneDriver::new(config)
                .run(problem.clone())
                .unwrap_or_else(|e| fail(format!("Solver error: {}", e)));
            let trace = &run.trace;

            match format {
                Format::Json => match serde_json::to_string_pretty(trace) {
                    Ok(json) => println!("{}", json),
                    Err(e) => fail(format!("JSON error: {}", e)),
                },
                Format::Pretty => {
                    print!("{}", report::render_model(&problem));
                    println!();
                    print!("{}", report::render_trace(trace, &problem.variables, max_cuts));
                }
            }

            if let Some(path) = output {
                let text = report::render_report(&problem, trace, max_cuts);
                if let Err(e) = std::fs::write(&path, text) {
                    fail(format!("Error writing {}: {}", path.display(), e));
                }
                eprintln!("Report written to {}", path.display());
            }

            if trace.status != TraceStatus::Converged {
                warn!(
                    component = "cli",
                    operation = "solve",
                    status = ?trace.status,
                    cuts = trace.cuts_generated,
                    "Run ended without an integral optimum"
                );
                std::process::exit(1);
            }
        }
        Commands::Check { file } => {
            let problem = load_problem(&file).unwrap_or_else(|e| fail(e));
            println!("✓ {} is valid", file.display());
            println!(
                "  {} variables, {} constraints",
                problem.num_variables(),
                problem.num_constraints()
            );
            if !problem.has_integral_data(1e-9) {
                println!("  warning: non-integral coefficients, cuts may remove integer points");
            }
        }
    }
}
