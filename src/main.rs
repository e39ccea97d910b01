use anyhow::Result;
use clap::Parser;
use shopfetch::commands;
use shopfetch::config::Config;
use std::time::Duration;

/// shopfetch - storefront API client
///
/// Fetches best sellers and users from a storefront backend, with a request
/// timeout and automatic retries on timeouts and network failures.
///
/// Examples:
///   shopfetch best-sellers                     # List best selling products
///   shopfetch --api-url https://shop.test users 42
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Storefront API base URL (defaults to http://localhost:8080)
    #[arg(
        long = "api-url",
        env = "SHOPFETCH_API_URL",
        value_name = "URL",
        global = true
    )]
    pub api_url: Option<String>,

    /// Bearer token for authenticated endpoints
    #[arg(
        long,
        env = "SHOPFETCH_TOKEN",
        value_name = "TOKEN",
        hide_env_values = true,
        global = true
    )]
    pub token: Option<String>,

    /// Per-attempt request timeout in milliseconds
    #[arg(long = "timeout-ms", value_name = "MS", global = true)]
    pub timeout_ms: Option<u64>,

    /// Retries after the first attempt on timeouts and network failures
    #[arg(long, value_name = "N", global = true)]
    pub retries: Option<u32>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// List best selling products
    BestSellers(BestSellersArgs),

    /// Show all users, or a single user by id
    Users(UsersArgs),
}

#[derive(clap::Args, Debug)]
pub struct BestSellersArgs {
    /// Print the raw JSON response instead of one product per line
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args, Debug)]
pub struct UsersArgs {
    /// User id
    #[arg(value_name = "ID")]
    pub id: Option<String>,
}

impl Cli {
    fn config(&self) -> Config {
        let mut config = Config::new(self.api_url.clone(), self.token.clone());
        if let Some(ms) = self.timeout_ms {
            config.timeout = Duration::from_millis(ms);
        }
        if let Some(retries) = self.retries {
            config.retries = retries;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let config = cli.config();
    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Commands::BestSellers(args) => {
            commands::best_sellers(&config, args.json, &mut stdout).await?
        }
        Commands::Users(args) => commands::users(&config, args.id.as_deref(), &mut stdout).await?,
    }
    Ok(())
}
