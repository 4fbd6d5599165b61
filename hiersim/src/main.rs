use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::time::Instant;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use hierlib::config::HierarchyConfig;
use hierlib::io::get_reader;
use hierlib::simulator::Simulator;
use hierlib::trace::AddressRadix;

#[cfg(debug_assertions)]
const DEBUG_DEFAULT: bool = true;

#[cfg(not(debug_assertions))]
const DEBUG_DEFAULT: bool = false;

/// Exponents given on the command line override the config file, which overrides the defaults
#[derive(Parser, Debug)]
#[command(about = String::from("Two level cache hierarchy simulator with an optional victim cache"))]
struct Args {
    /// Trace file of `r`/`w` and address lines. Reads standard input when omitted
    trace: Option<String>,

    /// JSON hierarchy configuration
    #[arg(long)]
    config: Option<String>,

    /// L1 size is 2^C1 bytes
    #[arg(short = 'c')]
    c1: Option<u32>,
    /// L1 blocks are 2^B1 bytes
    #[arg(short = 'b')]
    b1: Option<u32>,
    /// L1 sets hold 2^S1 blocks
    #[arg(short = 's')]
    s1: Option<u32>,
    /// Victim cache blocks, 0 to 4
    #[arg(short = 'v')]
    v: Option<u32>,
    /// L2 size is 2^C2 bytes
    #[arg(short = 'C')]
    c2: Option<u32>,
    /// L2 blocks are 2^B2 bytes
    #[arg(short = 'B')]
    b2: Option<u32>,
    /// L2 sets hold 2^S2 blocks
    #[arg(short = 'S')]
    s2: Option<u32>,

    /// Addresses in the trace are decimal rather than hex
    #[arg(long)]
    decimal: bool,

    /// Print the outcome code of every access
    #[arg(long)]
    outcomes: bool,

    #[arg(short, long)]
    performance: bool,

    #[arg(short, long, default_value_t = DEBUG_DEFAULT)]
    debug: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn load_config(args: &Args) -> Result<HierarchyConfig, String> {
    let mut config = match &args.config {
        Some(path) => {
            let file = File::open(path).map_err(|e| format!("Couldn't open the config file at path {path}: {e}"))?;
            HierarchyConfig::from_reader(BufReader::new(file)).map_err(|e| format!("Couldn't load the config file: {e}"))?
        }
        None => HierarchyConfig::default(),
    };
    let overrides = [
        (args.c1, &mut config.c1),
        (args.b1, &mut config.b1),
        (args.s1, &mut config.s1),
        (args.v, &mut config.v),
        (args.c2, &mut config.c2),
        (args.b2, &mut config.b2),
        (args.s2, &mut config.s2),
    ];
    for (value, field) in overrides {
        if let Some(value) = value {
            *field = value;
        }
    }
    Ok(config)
}

fn open_trace(path: Option<&str>) -> Result<Box<dyn BufRead>, String> {
    match path {
        Some(path) => {
            let file = File::open(path).map_err(|e| format!("Couldn't open the trace file at path {path}: {e}"))?;
            get_reader(file).map_err(|e| format!("Couldn't read the trace file: {e}"))
        }
        None => Ok(Box::new(io::stdin().lock())),
    }
}

fn main() -> Result<(), String> {
    let start = Instant::now();
    let args = Args::parse();
    init_logging(args.verbose);
    let config = load_config(&args)?;
    let mut simulator = Simulator::new(&config).map_err(|e| format!("Invalid configuration: {e}"))?;
    info!(trace = args.trace.as_deref().unwrap_or("<stdin>"), "simulating");
    let trace_reader = open_trace(args.trace.as_deref())?;
    let radix = if args.decimal { AddressRadix::Decimal } else { AddressRadix::Hex };

    if args.outcomes {
        let has_victim = config.has_victim_cache();
        let mut out = io::BufWriter::new(io::stdout().lock());
        let mut write_error = None;
        simulator
            .simulate_with(trace_reader, radix, |_, outcome| {
                if write_error.is_none() {
                    write_error = writeln!(out, "{}", outcome.code(has_victim)).err();
                }
            })
            .map_err(|e| format!("Couldn't simulate the trace: {e}"))?;
        if let Some(e) = write_error {
            return Err(format!("Couldn't write the access outcomes: {e}"));
        }
        out.flush().map_err(|e| format!("Couldn't write the access outcomes: {e}"))?;
    } else {
        simulator.simulate(trace_reader, radix).map_err(|e| format!("Couldn't simulate the trace: {e}"))?;
    }

    let report = simulator.report();
    println!("{}", serde_json::to_string_pretty(&report).map_err(|e| format!("Couldn't serialise the output {e}"))?);
    if args.performance {
        let end = Instant::now();
        let simulation_time = simulator.execution_time();
        let total_time = end - start;
        println!("Simulation time: {}s", simulation_time.as_nanos() as f64 / 1e9);
        println!("Total execution time (includes initial parsing, configuration, and output): {}s", total_time.as_nanos() as f64 / 1e9)
    }
    if args.debug {
        #[cfg(debug_assertions)]
        eprintln!("Running the debug binary, debug mode is enabled by default. If benchmarking, do not use this binary, re-compile with the --release argument when using cargo run");
        eprintln!("Parsed input configuration: {config:?}");
        let invalid_lines = simulator.invalid_line_counts();
        let formatted = invalid_lines
            .iter()
            .map(|(name, count)| format!("{name}: {count}"))
            .collect::<Vec<_>>()
            .join(", ");
        eprintln!("Never-filled cache lines by structure: ({formatted})");
        eprintln!("Total never-filled cache lines: {}", invalid_lines.iter().map(|(_, count)| count).sum::<usize>())
    }
    Ok(())
}
