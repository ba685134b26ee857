//! Command-line front end for the constraint analyzer: three subcommands
//! over the same `parse -> validate -> sort -> flatten -> verify/solve`
//! pipeline the library exposes. This binary is the out-of-scope
//! presentation layer; all the actual analysis lives in `flagform`.
use std::collections::HashMap;
use std::io::Write;
use std::process::ExitCode;

use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::{Parser, Subcommand};
use flagform::prelude::*;
use flagform::sort::sort_exprs;
use termcolor::{ColorChoice, ColorSpec, StandardStream, WriteColor};

#[derive(Parser)]
#[command(name = "flagform", version, about = "Analyze conditional USE-constraint expressions")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the reference solver over every combination of the referenced
    /// flags, printing a satisfying assignment per row.
    Solve {
        /// The constraint expression, e.g. "a? ( b ) || ( x y )".
        constraint: String,

        /// A flag fixed to a value before solving starts, e.g. "a" or "!a".
        /// Repeat the flag for each fixed flag.
        #[arg(short = 'i', long = "immutable")]
        immutable: Vec<String>,
    },

    /// Flatten the constraint into its path list and run the four static
    /// analyses, reporting "ok" or the first failure.
    Verify {
        /// The constraint expression, e.g. "a? ( b ) || ( x y )".
        constraint: String,

        /// A flag fixed to a value, e.g. "a" or "!a". Repeat as needed.
        #[arg(short = 'i', long = "immutable")]
        immutable: Vec<String>,
    },

    /// Batch-classify every "pkg constraint" line in a file, printing a
    /// per-bucket count and, with --verbose, the offending lines.
    Classify {
        /// Path to the file of "pkg SPACE constraint" lines.
        file: String,

        #[arg(short, long)]
        verbose: bool,
    },

    /// Render the back-alteration precedence graph as Graphviz DOT.
    Graph {
        /// The constraint expression, e.g. "a? ( b ) || ( x y )".
        constraint: String,
    },
}

/// A literal on the command line, e.g. "a" or "!a" -- the same syntax the
/// constraint grammar itself uses for a negated flag.
fn parse_immutable(raw: &str) -> Result<(String, bool), String> {
    let (name, polarity) = match raw.strip_prefix('!') {
        Some(rest) => (rest, false),
        None => (raw, true),
    };
    if !Flag::is_valid_name(name) {
        return Err(format!("invalid immutable flag name '{name}'"));
    }
    Ok((name.to_string(), polarity))
}

fn immutable_map(raw: &[String]) -> Result<HashMap<String, bool>, String> {
    let mut map = HashMap::new();
    for r in raw {
        let (name, polarity) = parse_immutable(r)?;
        map.insert(name, polarity);
    }
    Ok(map)
}

fn report_parse_error(constraint: &str, err: &ParseErrorKind) {
    let len = constraint.len().max(1);
    Report::build(ReportKind::Error, 0..len)
        .with_message(err.to_string())
        .with_label(
            Label::new(0..len)
                .with_message("while parsing this constraint")
                .with_color(Color::Red),
        )
        .finish()
        .print(Source::from(constraint))
        .expect("ariadne report to stdout");
}

/// Parse, validate, and sort a constraint, returning the flattened path
/// list and owning arena, or printing a diagnostic and returning `None`.
fn build_paths(constraint: &str, immutable: &HashMap<String, bool>) -> Option<(FlagArena, Vec<Path>)> {
    let mut parsed = match parse(constraint) {
        Ok(p) => p,
        Err(e) => {
            report_parse_error(constraint, &e);
            return None;
        }
    };
    if let Err(e) = flagform::validate::validate(&parsed.exprs) {
        eprintln!("validation error: {e}");
        return None;
    }
    sort_exprs(&parsed.arena, &mut parsed.exprs, immutable);
    let paths = flatten(&mut parsed.arena, &parsed.exprs);
    Some((parsed.arena, paths))
}

fn run_solve(constraint: &str, immutable: &[String]) -> ExitCode {
    let immutable = match immutable_map(immutable) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let Some((arena, paths)) = build_paths(constraint, &immutable) else {
        return ExitCode::FAILURE;
    };

    let names = flagform::solve::referenced_flags(&arena, &paths);
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let mut ok_color = ColorSpec::new();
    ok_color.set_fg(Some(termcolor::Color::Green)).set_intense(true);
    let mut err_color = ColorSpec::new();
    err_color.set_fg(Some(termcolor::Color::Red)).set_intense(true);

    // Every row's verdict is printed, never folded into the exit code: a
    // row that can't be solved is an analysis result, not a CLI failure.
    for assignment in all_assignments(&names) {
        let mut initial = assignment.clone();
        initial.extend(immutable.clone());
        let row: Vec<String> = names
            .iter()
            .map(|n| format!("{}={}", n, initial.get(n).copied().unwrap_or(false)))
            .collect();
        match solve(&arena, &paths, &initial) {
            SolveOutcome::Solved(result) => {
                stdout.set_color(&ok_color).ok();
                write!(stdout, "solved").ok();
                stdout.reset().ok();
                let solved: Vec<String> = names
                    .iter()
                    .map(|n| format!("{}={}", n, result.get(n).copied().unwrap_or(false)))
                    .collect();
                writeln!(stdout, "  [{}]  ->  [{}]", row.join(", "), solved.join(", ")).ok();
            }
            SolveOutcome::Conflict { flag } => {
                stdout.set_color(&err_color).ok();
                write!(stdout, "conflict").ok();
                stdout.reset().ok();
                writeln!(stdout, "  [{}]  ->  disagreement on '{flag}'", row.join(", ")).ok();
            }
            SolveOutcome::DidNotConverge => {
                stdout.set_color(&err_color).ok();
                write!(stdout, "no convergence").ok();
                stdout.reset().ok();
                writeln!(stdout, "  [{}]", row.join(", ")).ok();
            }
        }
    }
    stdout.flush().ok();
    ExitCode::SUCCESS
}

/// Every boolean assignment over `names`, in ascending binary-counter order.
fn all_assignments(names: &[String]) -> Vec<HashMap<String, bool>> {
    let n = names.len();
    let total = 1usize << n.min(20); // guard against a pathological flag count
    (0..total)
        .map(|mask| {
            names
                .iter()
                .enumerate()
                .map(|(i, name)| (name.clone(), mask & (1 << i) != 0))
                .collect()
        })
        .collect()
}

fn run_verify(constraint: &str, immutable: &[String]) -> ExitCode {
    let immutable = match immutable_map(immutable) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let Some((arena, paths)) = build_paths(constraint, &immutable) else {
        return ExitCode::FAILURE;
    };

    for p in &paths {
        println!("{}", p.display(&arena));
    }

    // An analysis failure is a verdict, printed on stdout; only a failure
    // to parse or read the constraint itself exits non-zero (see run above).
    match verify_all(&arena, &paths, &immutable) {
        Ok(()) => println!("ok"),
        Err(e) => println!("{e}"),
    }
    ExitCode::SUCCESS
}

#[derive(Default)]
struct Tally {
    good: Vec<String>,
    need_topo_sort: Vec<String>,
    cyclic: Vec<String>,
    parse_error: Vec<String>,
}

fn run_classify(file: &str, verbose: bool) -> ExitCode {
    let contents = match std::fs::read_to_string(file) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("failed to read '{file}': {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut tally = Tally::default();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((pkg, constraint)) = line.split_once(' ') else {
            log::warn!("skipping malformed line (no pkg/constraint split): {line}");
            tally.parse_error.push(line.to_string());
            continue;
        };
        let verdict = classify(constraint.trim());
        let label = format!("{pkg} {constraint}");
        match verdict {
            Verdict::Good => tally.good.push(label),
            Verdict::NeedTopoSort => tally.need_topo_sort.push(label),
            Verdict::Cyclic => tally.cyclic.push(label),
            Verdict::ParseError => tally.parse_error.push(label),
        }
    }

    println!("good:           {}", tally.good.len());
    println!("need_topo_sort: {}", tally.need_topo_sort.len());
    println!("cyclic:         {}", tally.cyclic.len());
    println!("parse_error:    {}", tally.parse_error.len());

    if verbose {
        print_bucket("need_topo_sort", &tally.need_topo_sort);
        print_bucket("cyclic", &tally.cyclic);
        print_bucket("parse_error", &tally.parse_error);
    }

    ExitCode::SUCCESS
}

fn run_graph(constraint: &str) -> ExitCode {
    let Some((arena, paths)) = build_paths(constraint, &HashMap::new()) else {
        return ExitCode::FAILURE;
    };
    println!("{}", flagform::graph::to_dot(&arena, &paths));
    ExitCode::SUCCESS
}

fn print_bucket(name: &str, lines: &[String]) {
    if lines.is_empty() {
        return;
    }
    println!("\n{name}:");
    for line in lines {
        println!("  {line}");
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Solve { constraint, immutable } => run_solve(&constraint, &immutable),
        Command::Verify { constraint, immutable } => run_verify(&constraint, &immutable),
        Command::Classify { file, verbose } => run_classify(&file, verbose),
        Command::Graph { constraint } => run_graph(&constraint),
    }
}
