//! Command-line driver for the tableau solver

use clap::Parser;
use lassoatlas::{parse_formula, ResultJson, Solver, SolverConfig, Verdict};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "lassoatlas",
    version,
    about = "Decide LTL satisfiability and produce lasso models"
)]
struct Args {
    /// Formula in the textual surface syntax, e.g. "G(p -> X p) & p"
    formula: Option<String>,

    /// Read the formula from a file instead
    #[arg(long, conflicts_with = "formula")]
    file: Option<PathBuf>,

    /// Bound on the time index of any frame
    #[arg(long, default_value_t = 100)]
    maximum_depth: u64,

    /// Probability (0-100) of running the loop lookback after each frame
    #[arg(long, default_value_t = 100)]
    backtrack_probability: u32,

    /// Reserved partial-lookback knob; accepted and ignored
    #[arg(long, default_value_t = 0)]
    minimum_backtrack: u32,

    /// Reserved partial-lookback knob; accepted and ignored
    #[arg(long, default_value_t = 100)]
    maximum_backtrack: u32,

    /// Delegate local disjunction resolution to the SAT backend
    #[arg(long)]
    sat: bool,

    /// Seed for the lookback coin, for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Enumerate up to N models by resuming the search
    #[arg(long, default_value_t = 1)]
    models: usize,

    /// Emit one JSON object per result instead of text
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let text = match (&args.formula, &args.file) {
        (Some(text), None) => text.clone(),
        (None, Some(path)) => match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                eprintln!("error: cannot read {}: {}", path.display(), err);
                return ExitCode::from(2);
            }
        },
        _ => {
            eprintln!("error: provide a formula or --file");
            return ExitCode::from(2);
        }
    };

    let formula = match parse_formula(text.trim()) {
        Ok(formula) => formula,
        Err(err) => {
            eprintln!("error: {}", err);
            return ExitCode::from(2);
        }
    };

    let config = SolverConfig {
        maximum_depth: args.maximum_depth,
        backtrack_probability: args.backtrack_probability,
        minimum_backtrack: args.minimum_backtrack,
        maximum_backtrack: args.maximum_backtrack,
        use_sat: args.sat,
        seed: args.seed,
    };

    let mut solver = Solver::new(&formula, config);
    let start = Instant::now();
    let verdict = solver.solve();

    if verdict != Verdict::Satisfiable {
        let elapsed = start.elapsed().as_secs_f64();
        if args.json {
            let result = ResultJson::new(verdict, None, elapsed);
            println!("{}", serde_json::to_string(&result).expect("result serializes"));
        } else {
            println!("{}", verdict);
        }
        return ExitCode::from(1);
    }

    let mut printed = 0;
    while printed < args.models {
        let model = match solver.model() {
            Some(model) => model,
            None => break,
        };
        let elapsed = start.elapsed().as_secs_f64();
        if args.json {
            let result = ResultJson::new(verdict, Some(&model), elapsed);
            println!("{}", serde_json::to_string(&result).expect("result serializes"));
        } else {
            if printed == 0 {
                println!("{}", verdict);
            } else {
                println!("--");
            }
            println!("{}", model);
        }
        printed += 1;
        if printed < args.models && solver.solve() != Verdict::Satisfiable {
            break;
        }
    }

    ExitCode::SUCCESS
}
