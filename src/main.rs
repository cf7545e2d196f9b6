use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, EnvFilter};

use tile_painter::canvas::DEFAULT_DIMENSION;
use tile_painter::overpass::{OverpassSource, DEFAULT_OVERPASS_URL};
use tile_painter::postgis::PostgisSource;
use tile_painter::{
    server, Compositor, FeatureSource, FontAsset, Style, Tile, TileRenderer, TileRequest,
};

#[derive(Parser, Debug)]
#[command(name = "tile_painter", version, about = "Renders styled OpenStreetMap slippy tiles")]
struct Cli {
    #[command(flatten)]
    options: Options,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct Options {
    /// Font file loaded at startup
    #[arg(long, global = true, env = "TILE_PAINTER_FONT", default_value = "DejaVuSerif.ttf")]
    font: PathBuf,

    /// Family name the font is registered under
    #[arg(long, global = true, default_value = "dejavu-serif")]
    font_family: String,

    /// Style YAML; the built-in style when omitted
    #[arg(long, global = true, env = "TILE_PAINTER_STYLE")]
    style: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value_t = SourceKind::Overpass)]
    source: SourceKind,

    #[arg(long, global = true, env = "OVERPASS_URL", default_value = DEFAULT_OVERPASS_URL)]
    overpass_url: String,

    /// Required with `--source postgis`
    #[arg(long, global = true, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[arg(long, global = true, default_value_t = 30)]
    fetch_timeout_secs: u64,

    /// Canvas side in canvas units
    #[arg(long, global = true, default_value_t = DEFAULT_DIMENSION)]
    dimension: f64,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SourceKind {
    Overpass,
    Postgis,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve tiles over HTTP
    Serve {
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        #[arg(long, env = "PORT", default_value_t = 8080)]
        port: u16,
    },
    /// Render a single tile to a file
    Render {
        #[arg(long)]
        zoom: u8,

        #[arg(long)]
        column: u32,

        #[arg(long)]
        row: u32,

        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=9))]
        scale: u8,

        #[arg(long, default_value = "png")]
        format: String,

        #[arg(long, short)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    tracing::info!(
        source = ?cli.options.source,
        dimension = cli.options.dimension,
        "Starting tile_painter"
    );

    let renderer = build_renderer(&cli.options).await?;

    match cli.command {
        Command::Serve { host, port } => {
            let addr: SocketAddr = format!("{}:{}", host, port)
                .parse()
                .with_context(|| format!("invalid listen address {}:{}", host, port))?;
            let listener = tokio::net::TcpListener::bind(addr).await?;
            tracing::info!(addr = %addr, "Serving tiles");

            axum::serve(listener, server::router(Arc::new(renderer)))
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
        Command::Render {
            zoom,
            column,
            row,
            scale,
            format,
            output,
        } => {
            let request = TileRequest::new(
                Tile::new(zoom, column, row)?,
                f64::from(scale),
                format.parse()?,
            );
            let rendered = renderer.render(&request).await?;
            std::fs::write(&output, &rendered.bytes)
                .with_context(|| format!("unable to write {}", output.display()))?;
            tracing::info!(path = %output.display(), "Wrote tile");
        }
    }

    Ok(())
}

/// Loads the font and style and connects the feature source. Any failure
/// here stops the process before it serves anything.
async fn build_renderer(options: &Options) -> anyhow::Result<TileRenderer> {
    let font = FontAsset::load(&options.font, &options.font_family)?;

    let style = match &options.style {
        Some(path) => {
            let data = std::fs::read_to_string(path)
                .with_context(|| format!("unable to read style {}", path.display()))?;
            Style::from_yaml(&data)?
        }
        None => Style::builtin(),
    };
    tracing::info!(style = %style.name, "Loaded style");

    let source: Arc<dyn FeatureSource> = match options.source {
        SourceKind::Overpass => Arc::new(OverpassSource::new(options.overpass_url.as_str())?),
        SourceKind::Postgis => {
            let url = options
                .database_url
                .as_deref()
                .context("--database-url is required for the postgis source")?;
            Arc::new(PostgisSource::connect(url).await?)
        }
    };

    let compositor = Compositor::new(Arc::new(style), Arc::new(font), options.dimension);
    Ok(TileRenderer::new(source, compositor)
        .with_fetch_timeout(Duration::from_secs(options.fetch_timeout_secs)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Unable to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
