mod script;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use kurbo::Size;
use pagemark_core::annotation::{AnnotationListEntry, PendingAnnotation};
use pagemark_core::backend::{Backend, HttpBackend, MemoryBackend};
use pagemark_core::config::{LogLevel, ViewerConfig};
use pagemark_core::document::{DocumentId, DocumentInfo, PageContext};
use pagemark_core::error::ViewerError;
use pagemark_core::overlay::Overlay;
use pagemark_core::presenter::{Confirmation, Presenter};
use pagemark_core::session::ViewerSession;
use pagemark_render::{OverlayPainter, PageRaster, PixmapSurface};
use serde::Serialize;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};

pub use script::{Script, Step};

#[derive(Debug, Parser)]
#[command(name = "pagemark")]
#[command(about = "PageMark annotation driver")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Replay a pointer/command script and print session snapshots.
    Replay(ReplayArgs),
    /// Print CLI version.
    Version,
}

#[derive(Debug, Args)]
struct ReplayArgs {
    #[arg(value_name = "SCRIPT")]
    script: PathBuf,
    /// Backend server URL; bare `--backend` uses the configured URL.
    /// Uses an in-memory backend when omitted.
    #[arg(long, value_name = "URL")]
    backend: Option<Option<String>>,
    #[arg(long, default_value_t = 1)]
    document: DocumentId,
    /// Viewer config file (defaults to the user config directory).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Refuse every confirmation prompt.
    #[arg(long)]
    no_confirm: bool,
    /// Write the final canvas as PNG.
    #[arg(long, value_name = "PNG")]
    snapshot: Option<PathBuf>,
}

/// Session state as printed by a `print` step.
#[derive(Debug, Serialize)]
struct Snapshot<'a> {
    page: u32,
    total_pages: u32,
    zoom: String,
    calibration: Option<String>,
    canvas: Size,
    pending: Option<String>,
    readout: Option<String>,
    annotations: Vec<AnnotationListEntry>,
    overlay: &'a Overlay,
}

impl<'a> Snapshot<'a> {
    fn of(session: &'a ViewerSession) -> Self {
        Self {
            page: session.viewport().current_page(),
            total_pages: session.viewport().total_pages(),
            zoom: session.zoom_label(),
            calibration: session.calibration_summary(),
            canvas: session.canvas_size(),
            pending: session.pending().map(PendingAnnotation::summary),
            readout: session.readout().map(|r| r.text()),
            annotations: session.annotation_list(),
            overlay: session.overlay(),
        }
    }
}

/// Answers prompts from the script instead of a user.
struct ScriptPresenter {
    accept: bool,
    description: String,
    errors: usize,
}

impl Presenter for ScriptPresenter {
    fn request_description(&mut self, _pending: &PendingAnnotation) -> Option<String> {
        Some(std::mem::take(&mut self.description))
    }

    fn confirm(&mut self, confirmation: &Confirmation) -> bool {
        log::info!(
            "{} {}",
            confirmation.prompt(),
            if self.accept { "yes" } else { "no" }
        );
        self.accept
    }

    fn report_error(&mut self, error: &ViewerError) {
        self.errors += 1;
        eprintln!("error: {error}");
    }
}

/// Backend used when no server is given: one three-page Letter document.
fn demo_backend() -> MemoryBackend {
    MemoryBackend::with_document(DocumentInfo {
        id: 1,
        filename: "sample.pdf".to_string(),
        page_count: 3,
        page_width: 612.0,
        page_height: 792.0,
    })
}

fn init_logging(level: LogLevel) {
    let _ = env_logger::Builder::new()
        .filter_level(level.to_level_filter())
        .parse_default_env()
        .try_init();
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    match cli.command {
        Commands::Replay(args) => run_replay(args),
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn run_replay(args: ReplayArgs) -> Result<()> {
    let config = ViewerConfig::load_or_default(args.config.as_deref()).context("failed to load config")?;
    init_logging(config.log_level);
    let script = Script::read(&args.script)?;

    let backend: Box<dyn Backend> = match &args.backend {
        Some(url) => {
            let url = url.as_deref().unwrap_or(&config.backend_url);
            log::info!("Using backend {}", url);
            Box::new(HttpBackend::new(url)?)
        }
        None => Box::new(demo_backend()),
    };
    let backend = backend.as_ref();

    let document = pollster::block_on(backend.document(args.document))
        .with_context(|| format!("failed to open document {}", args.document))?;
    log::info!("Opened {} ({} pages)", document.filename, document.page_count);

    let mut session = ViewerSession::with_config(&document, &config);
    let mut presenter = ScriptPresenter {
        accept: !args.no_confirm,
        description: String::new(),
        errors: 0,
    };
    if let Err(err) = pollster::block_on(session.open(backend)) {
        presenter.report_error(&err);
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for step in script.steps {
        log::debug!("{:?}", step);
        pollster::block_on(apply_step(&mut session, backend, &mut presenter, step, &mut out))?;
    }

    if let Some(path) = &args.snapshot {
        write_snapshot(&session, backend, path)?;
    }
    if presenter.errors > 0 {
        log::warn!("Replay finished with {} reported errors", presenter.errors);
    }
    Ok(())
}

async fn apply_step(
    session: &mut ViewerSession,
    backend: &dyn Backend,
    presenter: &mut ScriptPresenter,
    step: Step,
    out: &mut impl Write,
) -> Result<()> {
    let loaded = match step {
        Step::Page { page } => Some(session.go_to_page(backend, page).await),
        Step::PageInput { ref input } => Some(session.go_to_page_input(backend, input).await),
        Step::Next => Some(session.next_page(backend).await),
        Step::Prev => Some(session.prev_page(backend).await),
        Step::Zoom { level } => {
            session.set_zoom(level);
            None
        }
        Step::ZoomIn => {
            session.zoom_in();
            None
        }
        Step::ZoomOut => {
            session.zoom_out();
            None
        }
        Step::Down { x, y } => {
            session.pointer_down(kurbo::Point::new(x, y));
            None
        }
        Step::Move { x, y } => {
            session.pointer_move(kurbo::Point::new(x, y));
            None
        }
        Step::Up { x, y } => {
            session.pointer_up(kurbo::Point::new(x, y));
            None
        }
        Step::Confirm { description } => {
            if session.pending().is_none() {
                presenter.report_error(&ViewerError::NoPending);
            } else {
                presenter.description = description;
                session.resolve_pending(backend, presenter).await;
            }
            None
        }
        Step::Cancel => {
            session.cancel_pending();
            None
        }
        Step::Delete { index } => {
            let id = index
                .checked_sub(1)
                .and_then(|i| session.annotations().get(i))
                .map(|a| a.id);
            match id {
                Some(id) => {
                    session.delete_with_confirmation(backend, presenter, id).await;
                }
                None => log::warn!("No annotation at position {}", index),
            }
            None
        }
        Step::Clear => {
            session.clear_with_confirmation(backend, presenter).await;
            None
        }
        Step::Print => {
            serde_json::to_writer(&mut *out, &Snapshot::of(session))?;
            writeln!(out)?;
            None
        }
    };

    if let Some(Err(err)) = loaded {
        presenter.report_error(&err);
    }
    Ok(())
}

/// The current page's raster from the backend, or a blank page when the
/// backend serves none.
fn page_raster(backend: &dyn Backend, page: &PageContext) -> Result<PageRaster> {
    let bytes = pollster::block_on(backend.page_image(&page.image_url))
        .with_context(|| format!("failed to fetch page raster {}", page.image_url))?;
    match bytes {
        Some(bytes) => PageRaster::decode(&bytes)
            .with_context(|| format!("failed to decode page raster {}", page.image_url)),
        None => {
            log::debug!("Backend serves no rasters, painting a blank page");
            Ok(PageRaster::blank(page.image_width, page.image_height))
        }
    }
}

/// Paint the current page and overlay to a PNG file.
fn write_snapshot(session: &ViewerSession, backend: &dyn Backend, path: &Path) -> Result<()> {
    let page = session.page().context("no page loaded, nothing to snapshot")?;
    let raster = page_raster(backend, page)?;
    let mut surface = PixmapSurface::new();
    OverlayPainter::default().paint(&mut surface, Some(&raster), session.overlay());
    surface.save_png(path)?;
    Ok(())
}
