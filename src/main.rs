use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use irma_datastore::config::{
    default_config_path, find_config_file, load_config, save_config, Config,
};
use irma_datastore::models::{QueryMode, QuerySpec};
use irma_datastore::ui::{self, Status};
use irma_datastore::Datastore;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// IRMA DataStore - search NPS DataStore references and download their files
#[derive(Parser, Debug)]
#[command(name = "irma-datastore")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search the NPS IRMA DataStore and download reference packages", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Request timeout in seconds (overrides the config file)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// API base URL (overrides the config file)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Disable the in-memory response cache
    #[arg(long, global = true, default_value_t = false)]
    no_cache: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

impl OutputFormat {
    fn resolve(self) -> Self {
        match self {
            OutputFormat::Auto if ui::is_terminal() => OutputFormat::Table,
            OutputFormat::Auto => OutputFormat::Json,
            other => other,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// QuickSearch for a keyword and print the results
    #[command(alias = "s")]
    Search {
        /// Search term
        term: String,

        /// Extra query parameter as key=value (repeatable)
        #[arg(long = "param", short, value_parser = parse_param)]
        params: Vec<(String, String)>,
    },

    /// QuickSearch for a keyword and write the results to CSV
    #[command(alias = "e")]
    Export {
        /// Search term
        term: String,

        /// Output path without the .csv extension (default: <search_results_dir>/<term>)
        #[arg(long)]
        dest: Option<PathBuf>,
    },

    /// List the digital files of a reference
    #[command(alias = "f")]
    Files {
        /// DataStore reference id
        reference_id: u64,
    },

    /// Download the file package of a reference
    #[command(alias = "p")]
    Package {
        /// DataStore reference id
        reference_id: u64,

        /// Destination directory (default: <packages_dir>/<reference_id>)
        #[arg(long)]
        dest: Option<PathBuf>,
    },

    /// Print the URL a query would request
    Url {
        /// Query mode: QuickSearch?, /DigitalFiles, search or reference
        mode: String,

        /// Search term or reference id
        value: String,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Write a configuration file with default settings
    Init {
        /// Where to write it (default: ~/.config/irma-datastore/config.toml)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{}'", raw)),
    }
}

fn init_tracing(cli: &Cli, config: &Config) {
    let level = if cli.quiet {
        "error".to_string()
    } else {
        match cli.verbose {
            0 => config.logging.level.clone(),
            1 => "debug".to_string(),
            _ => "trace".to_string(),
        }
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("irma_datastore={}", level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn resolve_config(cli: &Cli) -> Result<Config> {
    let path = cli.config.clone().or_else(find_config_file);
    let mut config = load_config(path.as_deref()).with_context(|| match &path {
        Some(p) => format!("loading configuration from {}", p.display()),
        None => "loading configuration".to_string(),
    })?;

    if let Some(timeout) = cli.timeout {
        config.api.timeout_secs = timeout;
    }
    if let Some(base_url) = &cli.base_url {
        config.api.base_url = base_url.clone();
    }
    if cli.no_cache {
        config.cache.enabled = false;
    }

    config.api.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    init_tracing(&cli, &config);

    tracing::debug!(base_url = %config.api.base_url, "configuration loaded");

    let format = cli.output.resolve();

    match &cli.command {
        Commands::Search { term, params } => {
            let query = params
                .iter()
                .fold(QuerySpec::search(term), |query, (key, value)| {
                    query.with_param(key.clone(), value.clone())
                });

            let datastore = Datastore::new(&config)?;
            let results = datastore.search(&query).await?;

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
                OutputFormat::Plain => print!("{}", ui::search_plain(&results)),
                _ => {
                    if !cli.quiet {
                        ui::print_section(&format!("{} results for '{}'", results.len(), term));
                    }
                    if !results.is_empty() {
                        println!("{}", ui::search_table(&results));
                    }
                }
            }

            if results.may_be_truncated() && !cli.quiet {
                ui::print_status(
                    Status::Warning,
                    "The API returned a full page; more matching references may exist",
                );
            }
        }

        Commands::Export { term, dest } => {
            let datastore = Datastore::new(&config)?;
            let summary = datastore
                .export_search_results(&QuerySpec::search(term), dest.as_deref())
                .await?;

            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else if !cli.quiet {
                ui::print_status(
                    Status::Success,
                    &format!(
                        "Wrote {} rows x {} columns to {}",
                        summary.rows,
                        summary.columns.len(),
                        summary.path.display()
                    ),
                );
            }
        }

        Commands::Files { reference_id } => {
            let datastore = Datastore::new(&config)?;
            let files = datastore.digital_files(reference_id).await?;

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&files)?),
                OutputFormat::Plain => {
                    for file in &files {
                        println!("{}\t{}", file.file_name, file.download_link);
                    }
                }
                _ => println!("{}", ui::files_table(&files)),
            }
        }

        Commands::Package { reference_id, dest } => {
            let datastore = Datastore::new(&config)?;
            if !cli.quiet {
                ui::print_status(
                    Status::Download,
                    &format!("Downloading package for reference {}", reference_id),
                );
            }

            let download = datastore
                .download_package(reference_id, dest.as_deref())
                .await?;

            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&download)?);
            } else if !cli.quiet {
                for file in &download.files {
                    ui::print_status(
                        Status::Success,
                        &format!("{} ({} bytes)", file.path.display(), file.bytes),
                    );
                }
                ui::print_status(
                    Status::Info,
                    &format!(
                        "{} bytes written to {}",
                        download.total_bytes(),
                        download.directory.display()
                    ),
                );
            }
        }

        Commands::Url { mode, value } => {
            let mode: QueryMode = mode.parse()?;
            let url = QuerySpec::new(value, mode).url(&config.api.base_url)?;
            println!("{}", url);
        }

        Commands::Config { command } => match command {
            ConfigCommands::Init { path, force } => {
                let path = path
                    .clone()
                    .or_else(default_config_path)
                    .context("no configuration directory available; pass --path")?;

                if path.exists() && !force {
                    anyhow::bail!(
                        "{} already exists (use --force to overwrite)",
                        path.display()
                    );
                }

                save_config(&path, &Config::default())?;
                if !cli.quiet {
                    ui::print_status(
                        Status::Success,
                        &format!("Wrote default configuration to {}", path.display()),
                    );
                }
            }
            ConfigCommands::Show => {
                println!("{}", toml::to_string_pretty(&config)?);
            }
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_search_command() {
        let cli = Cli::try_parse_from(["irma-datastore", "search", "Isle Royale"]).unwrap();
        match cli.command {
            Commands::Search { term, params } => {
                assert_eq!(term, "Isle Royale");
                assert!(params.is_empty());
            }
            _ => panic!("Expected Search command"),
        }
    }

    #[test]
    fn test_cli_search_with_params() {
        let cli = Cli::try_parse_from([
            "irma-datastore",
            "search",
            "bison",
            "--param",
            "top=5",
            "-p",
            "skip=0",
        ])
        .unwrap();
        match cli.command {
            Commands::Search { params, .. } => {
                assert_eq!(
                    params,
                    vec![
                        ("top".to_string(), "5".to_string()),
                        ("skip".to_string(), "0".to_string())
                    ]
                );
            }
            _ => panic!("Expected Search command"),
        }
    }

    #[test]
    fn test_cli_rejects_bad_param() {
        let result = Cli::try_parse_from(["irma-datastore", "search", "x", "--param", "novalue"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_package_command() {
        let cli = Cli::try_parse_from([
            "irma-datastore",
            "package",
            "2293662",
            "--dest",
            "/tmp/pkg",
        ])
        .unwrap();
        match cli.command {
            Commands::Package { reference_id, dest } => {
                assert_eq!(reference_id, 2293662);
                assert_eq!(dest, Some(PathBuf::from("/tmp/pkg")));
            }
            _ => panic!("Expected Package command"),
        }
    }

    #[test]
    fn test_cli_package_requires_numeric_id() {
        let result = Cli::try_parse_from(["irma-datastore", "package", "abc"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::try_parse_from([
            "irma-datastore",
            "-vv",
            "--no-cache",
            "--timeout",
            "5",
            "files",
            "1",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.no_cache);
        assert_eq!(cli.timeout, Some(5));
        assert_eq!(cli.output, OutputFormat::Auto);
    }

    #[test]
    fn test_parse_param() {
        assert_eq!(
            parse_param("a=b=c").unwrap(),
            ("a".to_string(), "b=c".to_string())
        );
        assert!(parse_param("=x").is_err());
    }

    #[test]
    fn test_resolve_config_applies_overrides() {
        let cli = Cli::try_parse_from([
            "irma-datastore",
            "--no-cache",
            "--timeout",
            "7",
            "--base-url",
            "http://127.0.0.1:1/rest/",
            "url",
            "search",
            "x",
        ])
        .unwrap();
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.api.timeout_secs, 7);
        assert_eq!(config.api.base_url, "http://127.0.0.1:1/rest/");
        assert!(!config.cache.enabled);
    }
}
