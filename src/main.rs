use anyhow::Result;
use bib_enrich::config::{find_config_file, get_config, load_config, Config};
use bib_enrich::mcp::server::McpServer;
use bib_enrich::reconcile::{LookupKeys, Reconciler};
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// bib-enrich - Fill in BibTeX metadata from arXiv, DBLP and CrossRef
#[derive(Parser, Debug)]
#[command(name = "bib-enrich")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Fill in BibTeX metadata from arXiv, DBLP and CrossRef", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Request timeout in seconds (overrides the config file)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Look up one paper and print an enriched BibTeX entry
    #[command(alias = "e")]
    Entry {
        /// Citation key for the generated entry
        cite_key: String,

        /// Paper title to search for
        #[arg(long, short)]
        title: Option<String>,

        /// arXiv identifier (e.g., 2401.12345)
        #[arg(long)]
        arxiv_id: Option<String>,

        /// DOI of the paper
        #[arg(long)]
        doi: Option<String>,
    },

    /// Enrich every entry of a .bib file in place
    #[command(alias = "f")]
    File {
        /// Path to the .bib file
        path: PathBuf,
    },

    /// Run the MCP server (for Claude Desktop and other MCP clients)
    Serve {
        /// Run in streamable HTTP mode instead of stdio
        #[arg(long)]
        http: bool,

        /// Port for HTTP mode
        #[arg(long, short, default_value_t = 3000)]
        port: u16,

        /// Host to bind to for HTTP mode
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// List the metadata providers compiled into this binary
    Sources {
        /// Show capabilities for each provider
        #[arg(long, short)]
        detailed: bool,
    },

    /// Inspect or create configuration files
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,

    /// Write the default configuration to a file
    Init {
        /// Where to write the file
        #[arg(default_value = "bib-enrich.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,
    },
}

/// Resolve the configuration: explicit path, then discovered file, then
/// defaults plus environment
fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(config_path) = &cli.config {
        load_config(config_path)?
    } else if let Some(config_path) = find_config_file() {
        load_config(&config_path)?
    } else {
        get_config()?
    };

    if let Some(timeout) = cli.timeout {
        config.http.timeout_secs = timeout;
    }

    Ok(config)
}

/// Install the tracing subscriber; logs go to stderr so stdout stays clean
/// for results and the MCP stdio transport
fn init_tracing(cli: &Cli, config: &Config) {
    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => config.logging.level.as_str(),
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("bib_enrich={}", level)),
    );

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format.as_deref() == Some("json") {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = resolve_config(&cli)?;
    init_tracing(&cli, &config);

    if let Some(path) = cli.config.as_ref().cloned().or_else(find_config_file) {
        tracing::debug!("Using config file: {}", path.display());
    }

    match cli.command {
        Some(Commands::Entry {
            cite_key,
            title,
            arxiv_id,
            doi,
        }) => {
            let keys = LookupKeys::new(title.as_deref(), arxiv_id.as_deref(), doi.as_deref());

            let reconciler = Reconciler::from_config(&config);
            let text = reconciler.enrich_entry(&cite_key, keys).await?;
            println!("{}", text);
        }

        Some(Commands::File { path }) => {
            let reconciler = Reconciler::from_config(&config);
            let summary = reconciler.enrich_collection(&path).await?;
            println!("{}", summary);
        }

        Some(Commands::Serve { http, port, host }) => {
            let reconciler = Arc::new(Reconciler::from_config(&config));
            let server = McpServer::new(reconciler)?;

            if http {
                let addr = format!("{}:{}", host, port);
                let (bound_addr, handle) = server.run_http(&addr).await?;
                tracing::info!("MCP server listening on {}", bound_addr);

                handle
                    .await
                    .map_err(|e| anyhow::anyhow!("Server task failed: {}", e))?;
            } else {
                server.run().await?;
            }
        }

        Some(Commands::Sources { detailed }) => {
            let reconciler = Reconciler::from_config(&config);
            for src in reconciler.registry().all() {
                if detailed {
                    println!("{} ({})", src.name(), src.id());
                    println!("  Capabilities: {:?}", src.capabilities());
                    println!("  Confidence: {}", src.provider().confidence());
                } else {
                    println!("{} - {}", src.id(), src.name());
                }
            }
        }

        Some(Commands::Config { command }) => match command {
            ConfigCommands::Show => {
                print!("{}", toml::to_string_pretty(&config)?);
            }
            ConfigCommands::Init { path, force } => {
                if path.exists() && !force {
                    anyhow::bail!(
                        "{} already exists (use --force to overwrite)",
                        path.display()
                    );
                }
                Config::default().save(&path)?;
                println!("Wrote default configuration to {}", path.display());
            }
        },

        Some(Commands::Completions { shell }) => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "bib-enrich", &mut std::io::stdout());
        }

        None => {
            println!("No command provided. Use --help for usage information.");
            println!("Common commands:");
            println!("  entry <KEY> --title <TITLE>   - Print an enriched entry");
            println!("  file <PATH>                   - Enrich a .bib file in place");
            println!("  serve                         - Run the MCP server");
        }
    }

    Ok(())
}
