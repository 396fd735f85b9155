use std::process;
use std::time::Duration;

use clap::Parser;
use isoperiod::{Ending, Period, Ticker, TickerConfig};
use jiff::Zoned;
use tracing::{debug, warn};

#[derive(Parser)]
#[command(name = "isoperiod", about = "ISO 8601 repeating intervals", version)]
struct Cli {
    /// Interval expression (e.g., "R5/PT30S")
    expression: Option<String>,

    /// Number of occurrences to show
    #[arg(short, long, default_value = "1")]
    n: u32,

    /// Reference time for occurrences (ISO 8601 datetime with zone). Defaults to now.
    #[arg(long)]
    from: Option<String>,

    /// Output occurrences as JSON
    #[arg(long)]
    json: bool,

    /// Validate expression without computing
    #[arg(long)]
    check: bool,

    /// Show parsed period as JSON
    #[arg(long)]
    parse: bool,

    /// Print the canonical form of the expression
    #[arg(long)]
    format: bool,

    /// Run the ticker and print each tick until the budget runs out or Ctrl-C
    #[arg(long, conflicts_with_all = ["from", "n"])]
    watch: bool,

    /// Milliseconds between ticks in --watch mode
    #[arg(long, env = "ISOPERIOD_INTERVAL_MS", default_value = "1000")]
    interval_ms: u64,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let expression = match cli.expression {
        Some(ref expr) => expr.as_str(),
        None => {
            eprintln!("error: no expression provided");
            process::exit(2);
        }
    };

    let period = match Period::parse(expression) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{}", e.display_rich());
            process::exit(1);
        }
    };
    debug!(%period, "parsed expression");

    if cli.check {
        println!("\u{2713} valid");
        process::exit(0);
    }

    if cli.parse {
        match serde_json::to_string_pretty(&period) {
            Ok(json) => {
                println!("{json}");
                process::exit(0);
            }
            Err(e) => {
                eprintln!("error: failed to serialize: {e}");
                process::exit(1);
            }
        }
    }

    if cli.format {
        println!("{period}");
        process::exit(0);
    }

    if cli.watch {
        let interval = Duration::from_millis(cli.interval_ms);
        process::exit(watch(period, interval).await);
    }

    // Default: compute next N occurrences
    let mut n = cli.n;
    if n > 1000 {
        eprintln!("warning: capped at 1000 occurrences");
        n = 1000;
    }

    let from: Zoned = match cli.from {
        Some(ref from_str) => match from_str.parse() {
            Ok(z) => z,
            Err(e) => {
                eprintln!("error: invalid --from datetime: {e}");
                process::exit(1);
            }
        },
        None => Zoned::now(),
    };

    let results = match period.next_n_from(&from, n as usize) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("{}", e.display_rich());
            process::exit(1);
        }
    };

    if results.is_empty() {
        eprintln!("no upcoming occurrences");
        process::exit(0);
    }

    if cli.json {
        let iso_strings: Vec<String> = results.iter().map(|z| z.to_string()).collect();
        match serde_json::to_string(&iso_strings) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("error: failed to serialize: {e}");
                process::exit(1);
            }
        }
    } else {
        for z in &results {
            println!("{z}");
        }
    }
}

/// Print ticks until the budget runs out or Ctrl-C. Returns the exit code.
async fn watch(period: Period, interval: Duration) -> i32 {
    let config = TickerConfig::default().interval(interval);
    let mut ticker = Ticker::with_config(period, config);
    let mut ticks = match ticker.start() {
        Ok(t) => t,
        Err(e) => {
            eprintln!("{}", e.display_rich());
            return 1;
        }
    };

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;
    loop {
        tokio::select! {
            tick = ticks.recv() => match tick {
                Some(at) => println!("{at}"),
                None => break,
            },
            _ = &mut ctrl_c, if !interrupted => {
                interrupted = true;
                ticker.stop();
            }
        }
    }

    match ticker.shutdown().await {
        Ok(Some(Ending::Exhausted)) | Ok(None) => 0,
        Ok(Some(Ending::Cancelled)) => {
            eprintln!("stopped");
            0
        }
        Err(e) => {
            warn!(error = %e, "ticker did not shut down cleanly");
            eprintln!("{}", e.display_rich());
            1
        }
    }
}
