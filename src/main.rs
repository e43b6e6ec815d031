//! anarcast - pulls ADTS/AAC mountpoints from an Icecast-style origin and
//! serves them as HLS.

use anarcast::server::{router, AppState};
use anarcast::stream::Directory;
use anyhow::{Context, Result};
use clap::Parser;
use url::Url;

/// Repackage live Icecast AAC streams as HLS.
#[derive(Parser, Debug)]
#[command(name = "anarcast")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Redirect target for unmatched paths (default: plain 404).
    #[arg(short = 'r', value_name = "URL")]
    redirect: Option<String>,

    /// Minimum active streams for /healthy to return 200.
    #[arg(short = 'm', value_name = "N", default_value_t = 0)]
    min_streams: usize,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short = 'l', long, default_value = "info")]
    log_level: log::LevelFilter,

    /// Listen address, e.g. `:8888` or `127.0.0.1:8888`.
    addr: String,

    /// Origin base URL with no trailing slash, e.g. `http://radio.example`.
    base: String,

    /// Mountpoint names to pull from the origin.
    #[arg(required = true)]
    mounts: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();

    Url::parse(&args.base).context("origin base URL is not valid")?;
    let base = args.base.trim_end_matches('/').to_string();

    // A bare `:port` listens on every interface.
    let addr = if args.addr.starts_with(':') {
        format!("0.0.0.0{}", args.addr)
    } else {
        args.addr.clone()
    };

    log::info!(
        "anarcast v{}: pulling {:?} from {}",
        env!("CARGO_PKG_VERSION"),
        args.mounts,
        base
    );

    let directory = Directory::new(args.mounts, base, reqwest::Client::new());
    directory.spawn_supervisor();

    let app = router(AppState {
        directory,
        redirect: args.redirect,
        min_streams: args.min_streams,
    });

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to listen on {}", addr))?;
    log::info!("listening on {}", addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
