//! Upload CLI
//!
//! A command-line front end for the upload pipeline. Settings come from the
//! `UPLOAD_*` environment variables.

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use futures::StreamExt;
use marketplace_upload::{
    init_logging, HttpTransport, ImageUploadOptions, LogLevel, ProgressRecord, UploadCategory,
    UploadConfig, UploadPipeline, UploadResult, UploadUnit, ValidationRules,
};
use std::path::PathBuf;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn command() -> Command {
    Command::new("upload-cli")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Upload files to the marketplace storage API")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Verbose output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("upload")
                .about("Upload a single file")
                .arg(
                    Arg::new("file")
                        .help("File to upload")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("category")
                        .long("category")
                        .help("Upload category (image, document, any)")
                        .default_value("any")
                        .value_parser(value_parser!(UploadCategory)),
                )
                .arg(
                    Arg::new("compress")
                        .long("compress")
                        .help("Shrink images before upload")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("max-width")
                        .long("max-width")
                        .default_value("1920")
                        .value_parser(value_parser!(u32)),
                )
                .arg(
                    Arg::new("max-height")
                        .long("max-height")
                        .default_value("1080")
                        .value_parser(value_parser!(u32)),
                )
                .arg(
                    Arg::new("quality")
                        .long("quality")
                        .help("Encoder quality between 0 and 1 (default: configured quality)")
                        .value_parser(value_parser!(f32)),
                ),
        )
        .subcommand(
            Command::new("upload-many")
                .about("Upload several files in one request")
                .arg(
                    Arg::new("files")
                        .help("Files to upload")
                        .required(true)
                        .num_args(1..)
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("upload-large")
                .about("Upload a file in sequential chunks")
                .arg(
                    Arg::new("file")
                        .help("File to upload")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("chunk-size")
                        .long("chunk-size")
                        .help("Chunk size in bytes (defaults to UPLOAD_CHUNK_SIZE)")
                        .value_parser(value_parser!(usize)),
                ),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete an uploaded file")
                .arg(Arg::new("url").help("File URL to delete").required(true)),
        )
}

fn print_record(record: &ProgressRecord) {
    match record.error_message() {
        Some(error) => println!("  {} {}: {}", record.file_name, record.status(), error),
        None => println!(
            "  {} {} {}%",
            record.file_name,
            record.status(),
            record.progress
        ),
    }
}

fn print_result(result: &UploadResult) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}

fn required<'a, T: Clone + Send + Sync + 'static>(
    matches: &'a ArgMatches,
    name: &str,
) -> CliResult<&'a T> {
    matches
        .get_one::<T>(name)
        .ok_or_else(|| format!("missing argument <{}>", name).into())
}

async fn run(
    pipeline: &UploadPipeline<HttpTransport>,
    matches: &ArgMatches,
) -> CliResult<()> {
    match matches.subcommand() {
        Some(("upload", sub)) => {
            let unit = UploadUnit::from_path(required::<PathBuf>(sub, "file")?).await?;
            let category = *required::<UploadCategory>(sub, "category")?;
            let result = match category {
                UploadCategory::Image => {
                    let mut options = ImageUploadOptions::from_config(pipeline.config())
                        .compress(sub.get_flag("compress"))
                        .max_dimensions(
                            *required::<u32>(sub, "max-width")?,
                            *required::<u32>(sub, "max-height")?,
                        );
                    if let Some(quality) = sub.get_one::<f32>("quality") {
                        options = options.quality(*quality);
                    }
                    pipeline.upload_image(&unit, options).await?
                }
                UploadCategory::Document => pipeline.upload_document(&unit).await?,
                UploadCategory::Any => pipeline.upload_unit(&unit, &ValidationRules::new()).await?,
            };
            print_result(&result)?;
        }
        Some(("upload-many", sub)) => {
            let mut units = Vec::new();
            for path in sub.get_many::<PathBuf>("files").into_iter().flatten() {
                units.push(UploadUnit::from_path(path).await?);
            }
            let results = pipeline
                .upload_multiple_units(&units, &ValidationRules::new())
                .await?;
            println!("Uploaded {} files:", results.len());
            for result in &results {
                print_result(result)?;
            }
        }
        Some(("upload-large", sub)) => {
            let unit = UploadUnit::from_path(required::<PathBuf>(sub, "file")?).await?;
            let chunk_size = sub
                .get_one::<usize>("chunk-size")
                .copied()
                .unwrap_or(pipeline.config().chunk_size);
            let result = pipeline.upload_large_unit(&unit, chunk_size).await?;
            print_result(&result)?;
        }
        Some(("delete", sub)) => {
            let url = required::<String>(sub, "url")?;
            pipeline.delete_file(url).await?;
            println!("Deleted {}", url);
        }
        _ => {
            eprintln!("No subcommand provided. Use --help for usage information.");
            std::process::exit(1);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let matches = command().get_matches();

    let mut config = UploadConfig::from_env()?;
    if matches.get_flag("verbose") {
        config = config.log_level(LogLevel::Debug);
    }
    config.validate()?;
    init_logging(config.log_level.unwrap_or(LogLevel::Warn));

    let transport = HttpTransport::from_config(&config)?;
    let pipeline = UploadPipeline::with_config(config, transport);

    let mut records = pipeline.subscribe().into_stream().boxed();
    let printer = tokio::spawn(async move {
        while let Some(record) = records.next().await {
            print_record(&record);
        }
    });

    let outcome = run(&pipeline, &matches).await;

    drop(pipeline);
    let _ = printer.await;

    outcome
}
