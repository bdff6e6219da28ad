use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::runner::{Outcome, RunOptions, SuiteReport, run_suite};
use crate::suites::SuiteKind;
use crate::{Fixture, ImagesError, SmokeConfig};

#[derive(Parser, Debug)]
#[command(name = "image-api-smoke")]
#[command(about = "Smoke and functional checks against an images v2 endpoint")]
pub struct Cli {
    /// JSON config file (defaults to IMAGES_* environment variables)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Enable verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run suites against the configured endpoint
    Run {
        /// Suites to run (all when omitted)
        #[arg(long = "suite", value_enum)]
        suites: Vec<SuiteKind>,
        /// Only run cases carrying one of these tags
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        json: bool,
    },
    /// List suites and their cases
    List {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct CaseListing<'a> {
    suite: &'a str,
    case: &'a str,
    tags: &'a [&'a str],
}

pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn from_images(err: ImagesError) -> Self {
        let code = match &err {
            ImagesError::Config(_) | ImagesError::Io(_) => 2,
            _ => 10,
        };
        Self {
            code,
            message: err.to_string(),
        }
    }
}

pub async fn run_from_env() -> Result<(), CliError> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(cli).await
}

pub fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

pub async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::List { json } => {
            list(json);
            Ok(())
        }
        Commands::Run { suites, tags, json } => {
            let config = load_config(cli.config.as_deref()).map_err(CliError::from_images)?;
            let kinds = if suites.is_empty() {
                SuiteKind::ALL.to_vec()
            } else {
                suites
            };
            for kind in &kinds {
                kind.check_config(&config).map_err(CliError::from_images)?;
            }
            let fixture = Fixture::connect(config).map_err(CliError::from_images)?;
            let opts = RunOptions { tags };

            let mut reports = Vec::with_capacity(kinds.len());
            for kind in kinds {
                let mut suite = kind.build(fixture.clone());
                reports.push(run_suite(suite.as_mut(), &opts).await);
            }
            print_reports(&reports, json);

            let failed: usize = reports.iter().map(SuiteReport::failed).sum();
            if failed > 0 {
                return Err(CliError {
                    code: 1,
                    message: format!("{failed} case(s) failed"),
                });
            }
            Ok(())
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<SmokeConfig, ImagesError> {
    match path {
        Some(path) => SmokeConfig::from_file(path),
        None => {
            let _ = dotenvy::dotenv();
            SmokeConfig::from_env()
        }
    }
}

fn list(json: bool) {
    let listings: Vec<CaseListing<'_>> = SuiteKind::ALL
        .iter()
        .flat_map(|kind| {
            kind.cases().iter().map(move |case| CaseListing {
                suite: kind.name(),
                case: case.name,
                tags: case.tags,
            })
        })
        .collect();
    if json {
        println!("{}", to_json(&listings));
    } else {
        for l in listings {
            println!("{} {} [{}]", l.suite, l.case, l.tags.join(","));
        }
    }
}

fn print_reports(reports: &[SuiteReport], json: bool) {
    if json {
        println!("{}", to_json(&reports));
        return;
    }
    for report in reports {
        for case in &report.cases {
            match &case.outcome {
                Outcome::Passed => println!("PASS {} {}", report.suite, case.case),
                Outcome::Skipped { reason } => {
                    println!("SKIP {} {} ({reason})", report.suite, case.case)
                }
                Outcome::Failed { message } => {
                    println!("FAIL {} {}", report.suite, case.case);
                    for line in message.lines() {
                        println!("    {line}");
                    }
                }
            }
        }
        println!(
            "{}: {} passed, {} failed, {} skipped",
            report.suite,
            report.passed(),
            report.failed(),
            report.skipped()
        );
        if report.cleanup_failures > 0 {
            eprintln!(
                "{}: {} resource(s) could not be cleaned up",
                report.suite, report.cleanup_failures
            );
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
}
