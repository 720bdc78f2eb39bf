//! PhotoTranslate - photograph text, recognize it, translate it
//!
//! Recognizes text in a photo, translates it into a chosen language,
//! draws the recognized regions onto the photo and keeps a per-user
//! history of translations.

mod app;
mod auth;
mod capture;
mod config;
mod pipeline;
mod shared;
mod storage;
mod translation;
mod vision;

#[cfg(test)]
mod test_support;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::app::PhotoTranslateApp;
use crate::auth::Session;
use crate::capture::PathPicker;
use crate::config::AppConfig;
use crate::shared::{HistoryItemView, ScreenState, ViewTransform};
use crate::translation::LanguageCode;

/// PhotoTranslate - recognize and translate text in photos
#[derive(Parser, Debug)]
#[command(name = "photo-translate")]
#[command(about = "Recognize text in a photo, translate it and keep a history")]
struct Args {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account and sign in
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign in to an existing account
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign out
    Logout,
    /// List the supported target languages
    Languages,
    /// Recognize and translate the text in an image
    Translate {
        image: PathBuf,
        /// Target language code (zh, hi, ja, ko, en)
        #[arg(short, long)]
        target: Option<String>,
        /// Where to write the annotated image
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show recent translations
    History,
    /// Render a zoomed, rotated or panned view of an image
    View {
        image: PathBuf,
        #[arg(long, default_value = "1.0")]
        zoom: f32,
        /// Clockwise rotation in degrees
        #[arg(long, default_value = "0.0")]
        rotate: f32,
        #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
        pan_x: f32,
        #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
        pan_y: f32,
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_or_create_config(args.config.as_deref())?;

    match args.command {
        Command::Languages => {
            for code in LanguageCode::all() {
                println!("{:<4} {}", code.as_str(), code.display_name());
            }
            Ok(())
        }
        Command::View { image, zoom, rotate, pan_x, pan_y, output } => {
            render_view(&image, zoom, rotate, (pan_x, pan_y), &output)
        }
        command => run_with_app(config, command).await,
    }
}

/// Load configuration from `--config` or the config directory, writing the
/// defaults there on first use
fn load_or_create_config(explicit: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = explicit {
        let config = config::load_config(path).with_context(|| format!("Failed to load config {:?}", path))?;
        info!("Loaded configuration from {:?}", path);
        return Ok(config);
    }

    let config_path = match storage::get_config_dir() {
        Ok(dir) => dir.join("config.toml"),
        Err(e) => {
            warn!("No config directory, using defaults: {}", e);
            return Ok(AppConfig::default());
        }
    };

    if config_path.exists() {
        match config::load_config(&config_path) {
            Ok(config) => {
                info!("Loaded configuration from {:?}", config_path);
                return Ok(config);
            }
            Err(e) => warn!("Ignoring unreadable config {:?}: {:#}", config_path, e),
        }
        return Ok(AppConfig::default());
    }

    let config = AppConfig::default();
    match config::save_config(&config, &config_path) {
        Ok(()) => info!("Created default configuration at {:?}", config_path),
        Err(e) => warn!("Failed to save default config: {:#}", e),
    }
    Ok(config)
}

async fn run_with_app(config: AppConfig, command: Command) -> Result<()> {
    let app = PhotoTranslateApp::new(config).await?;

    match command {
        Command::Register { email, password } => {
            let session = app.register(&email, &password)?;
            println!("Registered and signed in as {}", session.email);
        }
        Command::Login { email, password } => {
            let session = app.sign_in(&email, &password)?;
            println!("Signed in as {}", session.email);
        }
        Command::Logout => {
            app.sign_out()?;
            println!("Signed out");
        }
        Command::Translate { image, target, output } => {
            let session = require_session(&app)?;
            let target = match target.or_else(|| app.config().general.default_target.clone()) {
                Some(code) => code.parse::<LanguageCode>()?,
                None => bail!("No target language given; pass --target or set general.default_target"),
            };
            translate(&app, &session, image, target, output).await?;
        }
        Command::History => {
            let session = require_session(&app)?;
            let entries = app.history(&session).await?;
            if entries.is_empty() {
                println!("No translations yet");
            }
            for entry in &entries {
                let item = HistoryItemView::from_entry(entry);
                println!("{}  {}\n    {}", item.timestamp, item.preview, item.image_url);
            }
        }
        Command::Languages | Command::View { .. } => {}
    }
    Ok(())
}

fn require_session(app: &PhotoTranslateApp) -> Result<Session> {
    match app.current_session()? {
        Some(session) => Ok(session),
        None => bail!("Not signed in; run `photo-translate login` first"),
    }
}

async fn translate(
    app: &PhotoTranslateApp,
    session: &Session,
    image: PathBuf,
    target: LanguageCode,
    output: Option<PathBuf>,
) -> Result<()> {
    app.select_language(session, &target).await;

    let output = output.unwrap_or_else(|| default_output_path(&image));
    let handle = app.start_translation(session, &PathPicker::new(Some(image)), target);

    let mut screen = ScreenState::new();
    screen.begin_run(handle.run_id);
    let report = handle.task.await.context("Translation task panicked")?;
    for event in app.events.try_iter() {
        screen.apply(&event);
    }

    if report.is_cancelled() {
        println!("No image selected");
        return Ok(());
    }
    debug!(
        "Run {} went {:?}, screen at {:?} (loading: {})",
        report.run_id, report.transitions, screen.pipeline_state, screen.is_loading
    );
    debug!("Recognition {:?}, translation {:?}", report.recognition, report.translation);

    println!("Recognized: {}", screen.recognized_text);
    println!("Translated: {}", screen.translated_text);

    if let Some(url) = &report.image_url {
        println!("Stored copy: {}", url);
    }
    if let Some(annotated) = &screen.annotated {
        annotated
            .image
            .save(&output)
            .with_context(|| format!("Failed to save annotated image {:?}", output))?;
        println!("Annotated image: {}", output.display());
    }
    if let Some(annotated) = &report.annotated {
        debug!("Drew {} regions and {} labels", annotated.rectangles, annotated.labels);
    }
    if let Some(id) = &screen.history_id {
        println!("Saved to history as {}", id);
    }
    if let Some(message) = &screen.last_error {
        warn!("{}", message);
    }

    // "No text" outcomes, including recognizer errors, are not failures here
    report.into_result()?;
    Ok(())
}

/// `photo.jpg` -> `photo.annotated.png` next to the input
fn default_output_path(image: &Path) -> PathBuf {
    let stem = image.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_else(|| "image".to_string());
    image.with_file_name(format!("{}.annotated.png", stem))
}

fn render_view(image: &Path, zoom: f32, rotate: f32, pan: (f32, f32), output: &Path) -> Result<()> {
    let upright = vision::load_upright(image)?.to_rgba8();
    let mut view = ViewTransform::default();
    view.apply_gesture(zoom, pan, rotate);
    view.render(&upright)
        .save(output)
        .with_context(|| format!("Failed to save view {:?}", output))?;
    println!("View written to {}", output.display());
    Ok(())
}
