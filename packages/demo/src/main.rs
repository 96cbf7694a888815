use clap::{Parser, ValueEnum};
use futures::StreamExt;

use dualfetch_client::{FetchRequest, Fetcher};

/// Fetch a tweet list through the blocking or the streaming client.
#[derive(Parser, Debug)]
#[command(name = "dualfetch")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// URL of the tweet list endpoint
    url: String,

    /// Which fetch discipline to use
    #[arg(long, value_enum, default_value_t = Mode::Blocking)]
    mode: Mode,

    /// Extra request header as name=value (repeatable)
    #[arg(long = "header", value_name = "NAME=VALUE")]
    headers: Vec<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Mode {
    Blocking,
    Stream,
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let fetcher = Fetcher::with_defaults()?;

    let mut request = FetchRequest::get(&args.url)?;
    for pair in &args.headers {
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| format!("malformed header {pair:?}, expected NAME=VALUE"))?;
        request = request.with_header(name, value);
    }

    match args.mode {
        Mode::Blocking => {
            tracing::info!("starting blocking fetch, this thread now waits");
            let tweets = fetcher.fetch_blocking(&request)?;
            tracing::info!("blocking fetch returned");
            for tweet in &tweets {
                println!("{tweet}");
            }
        }
        Mode::Stream => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(async move {
                let mut stream = fetcher.fetch_stream(request);
                tracing::info!("handle returned, tweets still in flight");
                while let Some(item) = stream.next().await {
                    let tweet = item?;
                    tracing::info!(%tweet, "tweet arrived");
                    println!("{tweet}");
                }
                Ok::<_, Box<dyn std::error::Error>>(())
            })?;
        }
    }

    Ok(())
}
