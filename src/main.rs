//! Thin CLI layer: parse args, load config, and run one demo against tandem-core.
//! Crash-proof: panic caught and reported; all errors return Result.

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::{Path, PathBuf};
use std::time::Duration;

mod console;
mod demos;
mod pokedex;

use console::{error, use_color, ConsoleSink};
use demos::Demo;
use tandem_core::Config;

fn cli() -> Command {
    Command::new("tandem")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Bhuvan Prakash <bhuvanstark6@gmail.com>")
        .about("Sequential vs parallel execution harness: invoke-all, parallel for with break, continuations, work queue")
        .after_help(
            "Examples:\n  tandem cook\n  tandem process --count 100\n  tandem break --at 80\n  tandem --workers 4 names --degree 4",
        )
        .subcommand_required(true)
        .arg(
            Arg::new("workers")
                .short('w')
                .long("workers")
                .global(true)
                .value_parser(value_parser!(usize))
                .help("Worker pool size (default: config, TANDEM_WORKERS, or CPU count)"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Config file (default: ./.tandemrc, then ~/.tandemrc)"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Only print summaries"),
        )
        .subcommand(
            Command::new("cook")
                .about("Cook pasta and sauce sequentially, then in parallel")
                .arg(
                    Arg::new("unit-ms")
                        .long("unit-ms")
                        .value_parser(value_parser!(u64))
                        .default_value("1000")
                        .help("Sauce takes one unit, pasta two"),
                ),
        )
        .subcommand(
            Command::new("process")
                .about("Process a range sequentially, then with a parallel for")
                .arg(count_arg("100"))
                .arg(delay_arg("100")),
        )
        .subcommand(
            Command::new("break")
                .about("Parallel for that breaks at a given index")
                .arg(
                    Arg::new("at")
                        .long("at")
                        .value_parser(value_parser!(i64))
                        .allow_negative_numbers(true)
                        .default_value("-1")
                        .help("Index that requests the break (-1 = never)"),
                )
                .arg(count_arg("100"))
                .arg(delay_arg("100")),
        )
        .subcommand(
            Command::new("race")
                .about("Start runners together and wait for all of them")
                .arg(
                    Arg::new("runners")
                        .long("runners")
                        .value_parser(value_parser!(usize))
                        .default_value("10"),
                )
                .arg(delay_arg("1000")),
        )
        .subcommand(
            Command::new("continue")
                .about("Run a producer with success and failure continuations")
                .arg(
                    Arg::new("succeed")
                        .long("succeed")
                        .action(ArgAction::SetTrue)
                        .help("Make the producer succeed instead of failing"),
                ),
        )
        .subcommand(
            Command::new("queue")
                .about("Queue work items on the pool, printing thread diagnostics")
                .arg(count_arg("10"))
                .arg(delay_arg("1000")),
        )
        .subcommand(
            Command::new("names")
                .about("Print record names with a forced degree of parallelism")
                .arg(
                    Arg::new("data")
                        .long("data")
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON record file (default: config dataFile or data/pokedex.json)"),
                )
                .arg(
                    Arg::new("degree")
                        .long("degree")
                        .value_parser(value_parser!(usize))
                        .default_value("4"),
                )
                .arg(
                    Arg::new("sequential")
                        .long("sequential")
                        .action(ArgAction::SetTrue)
                        .help("Map sequentially instead"),
                )
                .arg(
                    Arg::new("lang")
                        .long("lang")
                        .value_parser(["english", "japanese", "chinese", "french"])
                        .default_value("english"),
                ),
        )
}

fn count_arg(default: &'static str) -> Arg {
    Arg::new("count")
        .long("count")
        .value_parser(value_parser!(i64))
        .default_value(default)
        .help("Number of items")
}

fn delay_arg(default: &'static str) -> Arg {
    Arg::new("delay-ms")
        .long("delay-ms")
        .value_parser(value_parser!(u64))
        .default_value(default)
        .help("Simulated work per item, in milliseconds")
}

fn millis(matches: &ArgMatches, id: &str) -> Duration {
    Duration::from_millis(matches.get_one::<u64>(id).copied().unwrap_or(0))
}

fn load_settings(matches: &ArgMatches) -> Result<Config, String> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => tandem_core::load_config_file(path)
            .map_err(|e| format!("Failed to load config {}: {}", path.display(), e))?,
        None => tandem_core::load_config(Path::new(".")),
    };
    config.apply_env().map_err(|e| e.to_string())?;
    if let Some(n) = matches.get_one::<usize>("workers") {
        config
            .set_workers("--workers", *n)
            .map_err(|e| e.to_string())?;
    }
    Ok(config)
}

fn run() -> Result<(), String> {
    let matches = cli().get_matches();
    let quiet = matches.get_flag("quiet");
    tandem_core::init_logging(quiet);

    let config = load_settings(&matches)?;
    let pool = config
        .pool_config()
        .build()
        .map_err(|e| format!("Failed to start worker pool: {}", e))?;
    log::info!("worker pool ready with {} workers", pool.worker_count());

    let demo = Demo::new(pool, ConsoleSink::new(quiet), config.slow_operation_ms);

    match matches.subcommand() {
        Some(("cook", sub)) => demo.cook(millis(sub, "unit-ms")),
        Some(("process", sub)) => {
            let count = sub.get_one::<i64>("count").copied().unwrap_or(100);
            demo.process(count, millis(sub, "delay-ms"))
        }
        Some(("break", sub)) => {
            let at = sub.get_one::<i64>("at").copied().unwrap_or(-1);
            let count = sub.get_one::<i64>("count").copied().unwrap_or(100);
            demo.break_loop(at, count, millis(sub, "delay-ms"))
        }
        Some(("race", sub)) => {
            let runners = sub.get_one::<usize>("runners").copied().unwrap_or(10);
            demo.race(runners, millis(sub, "delay-ms"))
        }
        Some(("continue", sub)) => demo.continuation(sub.get_flag("succeed")),
        Some(("queue", sub)) => {
            let count = sub.get_one::<i64>("count").copied().unwrap_or(10).max(0);
            demo.queue(count as usize, millis(sub, "delay-ms"))
        }
        Some(("names", sub)) => {
            let data = sub
                .get_one::<PathBuf>("data")
                .cloned()
                .or_else(|| config.data_file.clone())
                .unwrap_or_else(|| PathBuf::from(pokedex::DEFAULT_DATA_FILE));
            let degree = sub.get_one::<usize>("degree").copied().unwrap_or(4);
            let lang = sub
                .get_one::<String>("lang")
                .map(|s| s.as_str())
                .unwrap_or("english");
            demo.names(&data, degree, sub.get_flag("sequential"), lang)
        }
        _ => Err("Unknown command. Run `tandem --help`.".to_string()),
    }
}

fn main() {
    if !use_color() {
        colored::control::set_override(false);
    }

    let code = match std::panic::catch_unwind(run) {
        Ok(Ok(())) => 0,
        Ok(Err(e)) => {
            error(&e);
            1
        }
        Err(_) => {
            error("An unexpected error occurred. Please report this issue.");
            1
        }
    };
    std::process::exit(code);
}
