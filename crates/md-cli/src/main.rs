//! md - render Merch Draft designs and product mockups to PNG.
//!
//! Reads a design document (and, for mockups, a product catalog) from
//! JSON, loads every referenced image from disk, and writes the result.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use md_assets::{FileFetcher, ImageLoader, LoaderConfig};
use md_core::{DesignDocument, EditorConfig, ProductCatalog};
use md_editor::{EditorSession, MockupCompositor};
use md_render::{CanvasTheme, FontBook, Renderer, encode_png};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Merch Draft - design and mockup renderer
#[derive(Parser)]
#[command(name = "md")]
#[command(about = "Render design documents and product mockups to PNG")]
struct Cli {
    /// JSON file with editor, loader and theme settings
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// TrueType/OpenType font used for all text
    #[arg(short, long, global = true)]
    font: Option<PathBuf>,

    /// Directory relative image paths resolve against (default: the design's directory)
    #[arg(long, global = true)]
    assets: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a design document onto its canvas
    Render {
        /// Design document JSON
        #[arg(short, long)]
        design: PathBuf,

        /// Output PNG path
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Composite a design onto a product photo
    Mockup {
        /// Design document JSON
        #[arg(short, long)]
        design: PathBuf,

        /// Product catalog JSON
        #[arg(long)]
        catalog: PathBuf,

        /// Product type key in the catalog
        #[arg(short, long)]
        product: String,

        /// Color key under the product
        #[arg(long)]
        color: String,

        /// Camera angle (default: the variant's first image)
        #[arg(short, long)]
        angle: Option<String>,

        /// Mockup canvas width in pixels
        #[arg(long, default_value_t = 1000)]
        width: u32,

        /// Mockup canvas height in pixels
        #[arg(long, default_value_t = 1000)]
        height: u32,

        /// Output PNG path
        #[arg(short, long)]
        out: PathBuf,
    },
}

/// Settings file layout; every section is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Config {
    editor: EditorConfig,
    loader: LoaderConfig,
    theme: CanvasTheme,
}

impl Config {
    fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("Invalid config {}", path.display()))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match &cli.command {
        Commands::Render { design, out } => {
            let renderer = build_renderer(&cli, &config, design)?;
            render_design(renderer, config.editor, design, out).await
        }
        Commands::Mockup {
            design,
            catalog,
            product,
            color,
            angle,
            width,
            height,
            out,
        } => {
            let renderer = build_renderer(&cli, &config, design)?;
            let job = MockupJob {
                design,
                catalog,
                product,
                color,
                angle: angle.as_deref(),
                size: (*width, *height),
                out,
            };
            render_mockup(renderer, &config.editor, job).await
        }
    }
}

fn build_renderer(cli: &Cli, config: &Config, design: &Path) -> Result<Renderer> {
    let root = match &cli.assets {
        Some(dir) => dir.clone(),
        None => design.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    let fetcher = Arc::new(FileFetcher::with_root(root));
    let loader = ImageLoader::with_config(fetcher, config.loader.clone());
    let fonts = match &cli.font {
        Some(path) => FontBook::from_path(path).context("Failed to load font")?,
        None => {
            log::info!("no --font given; text renders as placeholder bars");
            FontBook::new()
        }
    };
    Ok(Renderer::new(loader)
        .with_fonts(fonts)
        .with_theme(config.theme.clone()))
}

fn load_session(path: &Path, config: EditorConfig) -> Result<EditorSession> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read design {}", path.display()))?;
    let doc = DesignDocument::from_json(&json)
        .with_context(|| format!("Invalid design document {}", path.display()))?;
    Ok(EditorSession::from_document(doc, config))
}

fn write_png(out: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(out, bytes).with_context(|| format!("Failed to write {}", out.display()))?;
    log::info!("wrote {} ({} bytes)", out.display(), bytes.len());
    Ok(())
}

async fn render_design(
    renderer: Renderer,
    config: EditorConfig,
    design: &Path,
    out: &Path,
) -> Result<()> {
    let session = load_session(design, config)?;
    let scene = session.scene();
    let loaded = renderer.prepare(scene).await;
    log::info!(
        "rendering {} elements ({loaded}/{} images loaded)",
        scene.len(),
        scene.image_sources().len()
    );

    let pixmap = renderer.render_scene(scene, &[]).context("Failed to render design")?;
    let png = encode_png(&pixmap).context("Failed to encode PNG")?;
    write_png(out, &png)
}

struct MockupJob<'a> {
    design: &'a Path,
    catalog: &'a Path,
    product: &'a str,
    color: &'a str,
    angle: Option<&'a str>,
    size: (u32, u32),
    out: &'a Path,
}

async fn render_mockup(
    renderer: Renderer,
    config: &EditorConfig,
    job: MockupJob<'_>,
) -> Result<()> {
    let session = load_session(job.design, config.clone())?;
    let json = std::fs::read_to_string(job.catalog)
        .with_context(|| format!("Failed to read catalog {}", job.catalog.display()))?;
    let catalog = ProductCatalog::from_json(&json)
        .with_context(|| format!("Invalid catalog {}", job.catalog.display()))?;

    let (width, height) = job.size;
    let mut compositor =
        MockupCompositor::new(renderer, catalog, job.product, job.color, config, width, height)?;
    if let Some(angle) = job.angle
        && !compositor.set_angle(angle)
    {
        bail!("{}/{} has no `{angle}` view", job.product, job.color);
    }
    compositor.attach_design(session.scene().clone());

    let preload = compositor.preload_variants();
    log::debug!("preloading {} variant images", preload.len());

    let (png, metadata) = compositor.export().await.context("Failed to render mockup")?;
    write_png(job.out, &png)?;
    println!("{}", serde_json::to_string_pretty(&metadata)?);
    Ok(())
}
