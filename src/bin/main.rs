use clap::Parser;
use eoka_navigator::{
    extract_url, EokaLauncher, GeminiOracle, Navigator, NavigatorConfig, Outcome, Params,
};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "eoka-navigator")]
#[command(about = "Drive a browser toward a goal, one LLM-chosen click at a time")]
#[command(version)]
struct Cli {
    /// Instruction containing the start URL, e.g. "Download the 2025 holiday list from https://example.com/"
    instruction: String,

    /// Config file (YAML). Built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run in headless mode (overrides config)
    #[arg(long)]
    headless: bool,

    /// Maximum number of decisions (overrides config)
    #[arg(long, value_name = "N")]
    max_iterations: Option<u32>,

    /// Model identifier (overrides config)
    #[arg(long)]
    model: Option<String>,

    /// Set a config parameter (can be used multiple times)
    #[arg(short = 'P', long = "param", value_name = "KEY=VALUE")]
    params: Vec<String>,

    /// Verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Validate config and instruction without launching a browser
    #[arg(long)]
    check: bool,

    /// Quiet mode (only errors)
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> eoka_navigator::Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    let params = Params::from_args(&cli.params)?;
    let mut config = match cli.config {
        Some(ref path) => NavigatorConfig::load_with_params(path, &params)?,
        None => NavigatorConfig {
            oracle: eoka_navigator::OracleConfig {
                api_key: std::env::var("GEMINI_API_KEY").ok(),
                ..Default::default()
            },
            ..Default::default()
        },
    };

    if cli.headless {
        config.browser.headless = true;
    }
    if let Some(n) = cli.max_iterations {
        config.limits.max_iterations = n;
    }
    if let Some(model) = cli.model {
        config.oracle.model = model;
    }
    config.validate()?;

    if cli.check {
        let url = extract_url(&cli.instruction).ok_or_else(|| {
            eoka_navigator::Error::Input("no http:// or https:// URL in instruction".into())
        })?;
        println!("Config valid");
        println!("  Start URL: {}", url);
        println!("  Model: {}", config.oracle.model);
        println!("  Max iterations: {}", config.limits.max_iterations);
        println!("  Headless: {}", config.browser.headless);
        return Ok(());
    }

    let oracle = GeminiOracle::new(&config.oracle)?;
    let launcher = EokaLauncher::new(config.browser.clone());
    let navigator = Navigator::new(config, oracle);

    let report = navigator.navigate(&launcher, &cli.instruction).await?;

    println!();
    match report.outcome {
        Outcome::Completed(ref rec) => {
            println!("✓ Completed");
            println!();
            println!("Navigation Instructions:");
            println!(
                "{}",
                serde_json::to_string_pretty(rec).unwrap_or_else(|_| format!("{:?}", rec))
            );
        }
        Outcome::DecisionError(ref e) => {
            println!("✗ Failed ({})", report.outcome.state());
            println!("  Error: {}", e);
        }
        ref other => println!("✗ Failed ({})", other.state()),
    }
    println!("  Start URL: {}", report.url);
    println!("  Decisions: {}", report.decisions);
    println!("  Clicks: {}", report.clicks);

    if !report.outcome.is_success() {
        std::process::exit(1);
    }

    Ok(())
}
