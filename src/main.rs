use std::path::PathBuf;

use bcastcheck::Verdict;
use clap::{Parser as ClapParser, Subcommand};
use miette::miette;
use tracing::info;

/// Offline verifiers for broadcast testbed runs
///
/// Reads the `<id>.output` logs every process wrote during a run and checks them against the
/// guarantees of a broadcast abstraction. Exits with 0 only if the logs are well formed and no
/// violation was found.
#[derive(ClapParser)]
#[command(version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
    /// Print debugging output (can be repeated for more detail)
    #[arg(short = 'd', long = "debug", action = clap::ArgAction::Count, global = true)]
    debug_level: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Check FIFO order of broadcasts and deliveries
    Fifo {
        /// Total number of processes
        #[arg(long = "proc_num", value_parser = clap::value_parser!(u64).range(1..))]
        proc_num: u64,
        /// Output directory
        #[arg(long = "out_dir", value_parser = existing_dir)]
        out_dir: PathBuf,
    },
    /// Check FIFO order, then causal order under a dependency configuration
    Causal {
        /// Path of the dependency configuration file
        #[arg(long = "config_file", value_parser = existing_file)]
        config_file: PathBuf,
        /// Output directory
        #[arg(long = "out_dir", value_parser = existing_dir)]
        out_dir: PathBuf,
    },
    /// Check no-duplication and no-creation of perfect links towards one receiver
    PerfectLinks {
        /// Path to the file listing the processes of the run
        #[arg(long = "hosts", value_parser = existing_file)]
        hosts: PathBuf,
        /// Path to the `<messages> <receiver>` config file
        #[arg(long = "config", value_parser = existing_file)]
        config: PathBuf,
        /// Directory containing output files
        #[arg(long = "out_dir", value_parser = existing_dir)]
        out_dir: PathBuf,
    },
}

fn existing_dir(s: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);
    if path.is_dir() {
        Ok(path)
    } else {
        Err(format!("{s} is not a directory"))
    }
}

fn existing_file(s: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);
    if path.is_file() {
        Ok(path)
    } else {
        Err(format!("{s} is not a file"))
    }
}

fn main() -> miette::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .with_level(true)
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_max_level(match args.debug_level {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        })
        .init();

    match args.command {
        Command::Fifo { proc_num, out_dir } => {
            let process_count =
                usize::try_from(proc_num).map_err(|_| miette!("--proc_num {proc_num} is too large"))?;
            let report = bcastcheck::check_fifo(&out_dir, process_count)?;
            print!("{report}");
            if !report.is_correct() {
                return Err(miette!("FIFO order violated"));
            }
            Ok(())
        }
        Command::Causal {
            config_file,
            out_dir,
        } => {
            let run = bcastcheck::check_causal(&out_dir, &config_file)?;
            print!("{run}");
            match run.verdict() {
                Verdict::Correct => Ok(()),
                Verdict::Incorrect => Err(miette!("causal broadcast properties violated")),
            }
        }
        Command::PerfectLinks {
            hosts,
            config,
            out_dir,
        } => {
            println!("Validating....");
            let report = bcastcheck::check_perfect_links(&hosts, &config, &out_dir)?;
            info!(?report, "Validated");
            println!("Congratulations! Your out files passed the test.");
            Ok(())
        }
    }
}
