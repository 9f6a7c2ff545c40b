use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;

use xrisk_cli::explore::run_explore;
use xrisk_cli::pipeline::{run_pipeline, write_outputs, PipelineConfig};

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("XRISK_LOG", "error,xrisk=info"))
        .init();

    let matches = Command::new("xrisk")
        .version(clap::crate_version!())
        .about("Fit, evaluate and explain mortality risk classifiers on tabular cohorts")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("explore")
                .about("Load a delimited table and print a per-column summary")
                .arg(
                    Arg::new("data")
                        .help("Path to the delimited data file")
                        .required(true)
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("delimiter")
                        .long("delimiter")
                        .help("Field delimiter (default ';')")
                        .default_value(";"),
                )
                .arg(
                    Arg::new("outcome")
                        .long("outcome")
                        .help("Outcome column to stratify the summary by")
                        .value_hint(ValueHint::Other),
                ),
        )
        .subcommand(
            Command::new("run")
                .about("Run the full pipeline: fit, evaluate and explain every configured model")
                .arg(
                    Arg::new("config")
                        .help("Path to the pipeline JSON configuration file")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("train_data")
                        .short('d')
                        .long("train_data")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help(
                            "Path to training data. Overrides the training data file \
                             specified in the configuration file.",
                        )
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("validation_data")
                        .short('v')
                        .long("validation_data")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help(
                            "Path to validation data. Overrides the validation data file \
                             specified in the configuration file.",
                        )
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("cutoff")
                        .short('c')
                        .long("cutoff")
                        .value_parser(clap::value_parser!(f64))
                        .help("Score cutoff for the classification metrics. Overrides the configuration file."),
                )
                .arg(
                    Arg::new("output_dir")
                        .short('o')
                        .long("output_dir")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help("Directory the JSON results and the report are written to.")
                        .value_hint(ValueHint::DirPath),
                )
                .arg(
                    Arg::new("no_report")
                        .long("no-report")
                        .help("Disable HTML report generation.")
                        .action(ArgAction::SetTrue),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("explore", sub_m)) => handle_explore(sub_m),
        Some(("run", sub_m)) => handle_run(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn handle_explore(matches: &ArgMatches) -> Result<()> {
    let data = matches
        .get_one::<String>("data")
        .ok_or_else(|| anyhow::anyhow!("missing data file"))?;
    let delimiter = matches
        .get_one::<String>("delimiter")
        .map(String::as_str)
        .unwrap_or(";");
    let outcome = matches.get_one::<String>("outcome").map(String::as_str);

    match run_explore(data, delimiter, outcome) {
        Ok(summary) => {
            println!("{}", summary);
            Ok(())
        }
        Err(e) => {
            log::error!("Exploration failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_run(matches: &ArgMatches) -> Result<()> {
    let config_path = matches
        .get_one::<PathBuf>("config")
        .ok_or_else(|| anyhow::anyhow!("missing config file"))?;
    log::info!("[xrisk] Running pipeline from config: {:?}", config_path);

    let config = match PipelineConfig::from_arguments(config_path, matches) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {:#}", e);
            std::process::exit(1)
        }
    };

    match run_pipeline(&config).and_then(|outcome| write_outputs(&config, &outcome)) {
        Ok(written) => {
            for path in written {
                println!("{}", path.display());
            }
            Ok(())
        }
        Err(e) => {
            log::error!("Pipeline failed: {:#}", e);
            std::process::exit(1)
        }
    }
}
