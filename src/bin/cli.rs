//! price-compare command line
//!
//! Runs the scripted comparison without an agent in the loop.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use price_compare::browser::{BrowserSession, LaunchOptions, Timings};
use price_compare::product::ProductDetails;
use price_compare::workflow::ComparisonWorkflow;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "price-compare")]
#[command(version)]
#[command(about = "Compare a product's price on FairPrice and Lazada", long_about = None)]
struct Cli {
    /// Launch browser in headed mode (default: headless)
    #[arg(long, short = 'H', global = true)]
    headed: bool,

    /// Path to custom browser executable
    #[arg(long, value_name = "PATH", global = true)]
    executable_path: Option<PathBuf>,

    /// JSON file overriding operation timings
    #[arg(long, value_name = "FILE", global = true)]
    timings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search both stores and print the combined comparison
    Compare {
        /// Product to search for
        product: String,

        /// Also print every step taken on each store
        #[arg(long)]
        steps: bool,
    },
    /// Print the product details of a single product page
    Extract {
        /// Product page URL
        url: String,
    },
}

fn load_timings(path: Option<&PathBuf>) -> Result<Timings> {
    let Some(path) = path else {
        return Ok(Timings::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid timings in {}", path.display()))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();
    let timings = load_timings(cli.timings.as_ref())?;

    let mut options = LaunchOptions::new()
        .headless(!cli.headed)
        .timings(timings.clone());
    if let Some(path) = cli.executable_path {
        options = options.chrome_path(path);
    }

    let session = BrowserSession::launch(options).context("Failed to launch browser")?;

    match cli.command {
        Command::Compare { product, steps } => {
            let report = ComparisonWorkflow::new(&session, session.tool_registry())
                .with_timings(timings)
                .run(&product);

            if steps {
                for run in &report.runs {
                    println!("{}", serde_json::to_string_pretty(run)?);
                }
            }
            println!("{}", serde_json::to_string_pretty(&report.combined)?);
            println!("{}", report.verdict);
        }
        Command::Extract { url } => {
            let mut details = ProductDetails::default();
            for (tool, params) in [
                ("navigate", serde_json::json!({ "url": url })),
                ("handle_recaptcha", serde_json::json!({})),
                ("close_popups", serde_json::json!({})),
                ("get_product_details", serde_json::json!({})),
            ] {
                let result = session
                    .execute_tool(tool, params)
                    .with_context(|| format!("{} failed", tool))?;
                if tool == "get_product_details" {
                    if let Some(data) = result.data {
                        details = serde_json::from_value(data)
                            .context("Unexpected product details payload")?;
                    }
                } else if !result.success {
                    log::warn!("{}: {}", tool, result.status().unwrap_or("failed"));
                }
            }
            println!("{}", details.to_json());
        }
    }

    session.close().context("Failed to close browser")?;
    Ok(())
}
