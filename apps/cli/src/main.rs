use std::{
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use console::style;
use indicatif::MultiProgress;
use tracing_subscriber::EnvFilter;

use sermondl_core::{
    DispatchMode, DownloadOptions, RenderOptions, RenderedDiscoverer, SearchClient, SeriesRun,
    SermonDownloader, SiteConfig, StaticDiscoverer, TaskOutcome, WebDriverRenderer, build_client,
    config::{DEFAULT_OUTPUT_DIR, webdriver_url_from_env},
};

use crate::{
    format::{format_duration, format_search_results, format_summary},
    progress::{BarProgress, CliObserver, create_spinner},
};

mod format;
mod progress;

#[derive(Parser)]
#[command(name = "sermondl")]
#[command(about = "Download every sermon of a SermonAudio series, or search the sermon index")]
struct Cli {
    /// More log output on stderr (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Discover a series and download the audio of each sermon in it
    Series {
        /// Series page URL, scheme optional (e.g. beta.sermonaudio.com/series/155070/)
        url: String,

        /// Directory the MP3 files are written to
        #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
        output: PathBuf,

        /// Render the page in a headless browser and scroll until every sermon is loaded
        #[arg(long)]
        render: bool,

        /// WebDriver endpoint used with --render. Defaults to $SERMONDL_WEBDRIVER_URL or localhost:9515
        #[arg(long)]
        webdriver: Option<String>,

        /// Number of sermons processed at the same time
        #[arg(short = 'j', long, default_value_t = 5)]
        concurrency: usize,

        /// Process one sermon at a time with a pause between them
        #[arg(long, conflicts_with = "concurrency")]
        sequential: bool,

        /// Pause between sermons in seconds when --sequential
        #[arg(long, default_value_t = 2)]
        delay: u64,

        /// Skip the HEAD request that checks content type and size
        #[arg(long)]
        no_head: bool,
    },

    /// Download a single sermon page
    Sermon {
        /// Sermon page URL, scheme optional
        url: String,

        #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
        output: PathBuf,

        #[arg(long)]
        no_head: bool,
    },

    /// Keyword search on the legacy search page
    Search {
        query: String,

        /// Result page to fetch
        #[arg(short, long)]
        page: Option<u32>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn download_options(no_head: bool) -> DownloadOptions {
    DownloadOptions {
        check_with_head: !no_head,
        ..DownloadOptions::default()
    }
}

fn print_banner(subtitle: &str) {
    println!(
        "\n{}  {}\n",
        style("sermondl").cyan().bold(),
        style(subtitle).dim()
    );
}

#[allow(clippy::too_many_arguments)]
async fn series(
    url: String,
    output: PathBuf,
    render: bool,
    webdriver: Option<String>,
    concurrency: usize,
    sequential: bool,
    delay: u64,
    no_head: bool,
) -> Result<()> {
    let site = Arc::new(SiteConfig::default());
    let options = download_options(no_head);
    let client = build_client(&options)?;

    print_banner("Series Downloader");
    let total_start = Instant::now();

    let dispatch = if sequential {
        DispatchMode::Sequential {
            delay: Duration::from_secs(delay),
        }
    } else {
        DispatchMode::Pooled { concurrency }
    };

    let multi = MultiProgress::new();
    let observer = Arc::new(CliObserver::new(multi.clone()));
    let downloader =
        SermonDownloader::new(options)?.with_progress(Arc::new(BarProgress::new(multi)));
    let run = SeriesRun::new(client.clone(), Arc::clone(&site), downloader, &output)
        .with_dispatch(dispatch)
        .with_observer(observer.clone());

    let result = if render {
        let endpoint = webdriver.unwrap_or_else(webdriver_url_from_env);
        let renderer = WebDriverRenderer::new(client, &endpoint);
        let mut discoverer = RenderedDiscoverer::new(renderer, site, RenderOptions::default());
        run.run(&mut discoverer, &url).await
    } else {
        let mut discoverer = StaticDiscoverer::new(client, site);
        run.run(&mut discoverer, &url).await
    };

    let summary = match result {
        Ok(summary) => summary,
        Err(e) => {
            observer.clear_spinner();
            eprintln!("{} {}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    };
    if summary.discovered == 0 {
        eprintln!(
            "{} No sermons found. Cannot proceed with download.",
            style("Error:").red().bold()
        );
        std::process::exit(1);
    }

    println!("{}", style("─".repeat(60)).dim());
    print!("{}", format_summary(&summary));
    println!(
        "{} {}",
        style("Saved to:").dim(),
        style(run.output_dir().display()).cyan()
    );
    println!(
        "{} {}\n",
        style("Total time:").dim(),
        style(format_duration(total_start.elapsed())).cyan().bold()
    );

    if summary.failed > 0 {
        std::process::exit(2);
    }
    Ok(())
}

async fn sermon(url: String, output: PathBuf, no_head: bool) -> Result<()> {
    let site = Arc::new(SiteConfig::default());
    let options = download_options(no_head);
    let client = build_client(&options)?;

    print_banner("Sermon Downloader");
    tokio::fs::create_dir_all(&output).await?;

    let multi = MultiProgress::new();
    let downloader =
        SermonDownloader::new(options)?.with_progress(Arc::new(BarProgress::new(multi.clone())));
    let run = SeriesRun::new(client, site, downloader, &output)
        .with_observer(Arc::new(CliObserver::new(multi)));

    let outcome = run.process(1, 1, url).await;

    if let TaskOutcome::Failed { .. } = outcome {
        std::process::exit(2);
    }
    Ok(())
}

async fn search(query: String, page: Option<u32>, json: bool) -> Result<()> {
    let site = Arc::new(SiteConfig::default());
    let client = build_client(&DownloadOptions::default())?;
    let search = SearchClient::new(client, site);

    let results = if json {
        search.search(&query, page).await
    } else {
        let spinner = create_spinner(&format!("Searching for \"{}\"...", query));
        let results = search.search(&query, page).await;
        spinner.finish_and_clear();
        results
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else if results.is_empty() {
        println!("{} No results", style("—").dim());
    } else {
        println!("{}", format_search_results(&results));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Series {
            url,
            output,
            render,
            webdriver,
            concurrency,
            sequential,
            delay,
            no_head,
        } => {
            series(
                url,
                output,
                render,
                webdriver,
                concurrency,
                sequential,
                delay,
                no_head,
            )
            .await
        }
        Command::Sermon {
            url,
            output,
            no_head,
        } => sermon(url, output, no_head).await,
        Command::Search { query, page, json } => search(query, page, json).await,
    }
}
