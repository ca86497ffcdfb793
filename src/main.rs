use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info};

use phonechat::conversation::{ChatEngine, Session};
use phonechat::llm_interaction::OllamaGateway;
use phonechat::sentiment::SentimentClassifier;
use phonechat::{build_provider, catalog, chat, constants, lookup, web_server, Strategy};

// Define the command-line interface structure using clap
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Seed for reproducible records and follow-up choices.
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug)]
struct ProviderArgs {
    /// How phone records are resolved.
    #[arg(long, value_enum, default_value_t = Strategy::Table)]
    strategy: Strategy,
    /// CSV catalog used by the catalog strategy.
    #[arg(long, env = "PHONECHAT_CATALOG", default_value = constants::DEFAULT_CATALOG_PATH)]
    catalog: PathBuf,
}

// Define the available subcommands
#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Start the chat web server.
    Serve {
        #[arg(long, default_value_t = constants::DEFAULT_PORT, help = "Port for the web server.")]
        port: u16,
        #[command(flatten)]
        provider: ProviderArgs,
    },
    /// Chat about phones in the terminal.
    Chat {
        #[command(flatten)]
        provider: ProviderArgs,
    },
    /// Show the details of one phone model.
    Lookup {
        /// Mobile model, e.g. "iPhone 15".
        model: String,
        /// Optional comment about the phone to run sentiment analysis on.
        #[arg(long)]
        review: Option<String>,
        #[command(flatten)]
        provider: ProviderArgs,
    },
    /// Write a fictitious phone catalog as CSV.
    GenerateCatalog {
        #[arg(long, default_value = constants::DEFAULT_CATALOG_PATH)]
        output: PathBuf,
    },
}

fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn build_engine(provider: &ProviderArgs) -> Result<Arc<ChatEngine>> {
    let gateway = OllamaGateway::default();
    info!(url = %constants::OLLAMA_URL.as_str(), model = gateway.model(), "Using Ollama chat model");
    Ok(Arc::new(ChatEngine::new(
        build_provider(provider.strategy, &provider.catalog)?,
        Arc::new(gateway),
        Arc::new(SentimentClassifier::default()),
    )))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (OLLAMA_URL, PHONECHAT_MODEL, ...)
    dotenvy::dotenv().ok();

    // Reads log level from RUST_LOG (e.g., RUST_LOG=info,phonechat=debug)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("phonechat starting with command: {:?}", cli.command);

    match cli.command {
        Commands::Serve { port, provider } => {
            let engine = build_engine(&provider)?;
            let state = web_server::AppState::new(
                engine,
                constants::TEMPLATES_DIR.as_str(),
                constants::STATIC_DIR.as_str(),
                cli.seed,
            );

            let mut web_server_handle = tokio::spawn(async move {
                if let Err(e) = web_server::start_web_server(port, state).await {
                    error!("Web server failed: {:?}", e);
                }
            });

            let ctrl_c = tokio::signal::ctrl_c();
            tokio::pin!(ctrl_c);

            tokio::select! {
                _ = &mut ctrl_c => {
                    info!("Ctrl-C received, shutting down...");
                }
                res = &mut web_server_handle => {
                    match res {
                        Ok(_) => info!("Web server task completed unexpectedly."),
                        Err(e) if e.is_panic() => error!("Web server task panicked: {:?}", e),
                        Err(e) => error!("Web server task failed: {:?}", e),
                    }
                }
            }

            if !web_server_handle.is_finished() {
                info!("Aborting web server task...");
                web_server_handle.abort();
            }
            info!("Shutdown complete.");
        }
        Commands::Chat { provider } => {
            let engine = build_engine(&provider)?;
            let mut session = Session::with_rng(rng_for(cli.seed));
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let mut stdout = std::io::stdout();
            chat::run_chat(&engine, &mut session, stdin, &mut stdout)
                .await
                .context("Chat session failed")?;
        }
        Commands::Lookup {
            model,
            review,
            provider,
        } => {
            let provider = build_provider(provider.strategy, &provider.catalog)?;
            let classifier = SentimentClassifier::default();
            let mut rng = rng_for(cli.seed);
            let result = lookup::lookup(provider.as_ref(), &classifier, &model, review.as_deref(), &mut rng)?;

            println!("Here are the details:");
            print!("{}", result.record.full_details());
            if let Some(sentiment) = result.review_sentiment {
                println!("Sentiment Analysis of your comment: {}", sentiment);
            }
        }
        Commands::GenerateCatalog { output } => {
            let mut rng = rng_for(cli.seed);
            let catalog = catalog::generate(&mut rng);
            std::fs::write(&output, catalog.to_csv())
                .with_context(|| format!("Failed to write catalog to {}", output.display()))?;
            println!("CSV file '{}' generated with {} phones.", output.display(), catalog.len());
        }
    }

    Ok(())
}
