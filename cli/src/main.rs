mod script;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use serde_json::{Value, json};
use slideview::config::{ConfigError, ViewerConfig};
use slideview::display_list::DisplayList;
use slideview::engine::{Action, EngineCore, LoadOutcome};
use slideview::loader::{HttpSlideRegistry, ImageLoader, LoadError, LoadTicket, SlideId, SlideRegistry};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Load(#[from] LoadError),
    #[error("cannot read {}: {source}", .path.display())]
    Read { path: PathBuf, source: std::io::Error },
    #[error(transparent)]
    Script(#[from] script::ScriptError),
    #[error("script step {step}: {source}")]
    Step { step: usize, source: ConfigError },
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "slideview-cli", about = "Headless slide viewer: inspect slides and replay annotation gestures")]
struct Cli {
    /// Overrides the registry URL from the environment config.
    #[arg(long, env = "SLIDE_REGISTRY_URL")]
    registry_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch a slide's metadata and raster and print a summary.
    Inspect { slide_id: String },
    /// Drive the engine with a gesture script and print the annotations it emits.
    Replay(ReplayArgs),
}

#[derive(Args, Debug)]
struct ReplayArgs {
    slide_id: String,

    #[arg(long, help = "JSON-lines gesture script")]
    script: PathBuf,

    #[arg(long, default_value_t = 1024.0)]
    canvas_width: f64,

    #[arg(long, default_value_t = 768.0)]
    canvas_height: f64,

    #[arg(long, default_value_t = false, help = "Do not fetch the slide raster")]
    skip_image: bool,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let config = load_config(cli.registry_url)?;

    match cli.command {
        Command::Inspect { slide_id } => run_inspect(&config, SlideId::new(slide_id)).await,
        Command::Replay(args) => run_replay(&config, args).await,
    }
}

fn load_config(registry_url: Option<String>) -> Result<ViewerConfig, CliError> {
    let mut config = ViewerConfig::from_env()?;
    if let Some(url) = registry_url.filter(|u| !u.trim().is_empty()) {
        config.registry_base_url = url.trim().trim_end_matches('/').to_owned();
    }
    Ok(config)
}

async fn run_inspect(config: &ViewerConfig, slide: SlideId) -> Result<(), CliError> {
    let registry = HttpSlideRegistry::new(config)?;
    let meta = registry.slide(&slide).await?;
    let dimensions = meta.dimensions_label();

    let loader = ImageLoader::new(registry);
    let completion = loader.load(LoadTicket { slide, generation: 0 }).await;
    let image = match completion.result {
        Ok(surface) => json!({ "width": surface.width, "height": surface.height }),
        Err(e) => json!({ "error": e.to_string() }),
    };

    print_json(&json!({ "slide": meta, "dimensions": dimensions, "image": image }))
}

async fn run_replay(config: &ViewerConfig, args: ReplayArgs) -> Result<(), CliError> {
    let steps = script::parse(&read_file(&args.script)?)?;

    let mut core = EngineCore::with_config(config);
    core.set_canvas_size(args.canvas_width, args.canvas_height, 1.0);
    let (ticket, _) = core.set_active_slide(SlideId::new(args.slide_id));

    if args.skip_image {
        tracing::info!(slide = %ticket.slide, "skipping slide raster");
    } else {
        let loader = ImageLoader::new(HttpSlideRegistry::new(config)?);
        let completion = loader.load(ticket).await;
        if let LoadOutcome::Failed(e) = core.apply_image_load(completion) {
            eprintln!("continuing without base image: {e}");
        }
    }

    for (idx, step) in steps.iter().enumerate() {
        let actions = script::apply(&mut core, step).map_err(|source| CliError::Step { step: idx + 1, source })?;
        for action in actions {
            if let Action::AnnotationCreated(annotation) = action {
                println!("{}", serde_json::to_string(&annotation)?);
            }
        }
    }

    let mut frame = DisplayList::new();
    let Ok(()) = core.render_to(&mut frame);
    let render: Value = json!({ "render": frame.commands });
    println!("{}", serde_json::to_string(&render)?);
    Ok(())
}

fn read_file(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read { path: path.to_owned(), source })
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
