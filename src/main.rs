use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use thumbnail_forge::host::SleepScheduler;
use thumbnail_forge::{App, BackendSetting, ThumbnailSettings};

#[derive(Parser)]
#[command(
    name = "thumbnail-forge",
    about = "Render transparent PNG thumbnails for prefabs and glTF models"
)]
struct Args {
    /// Prefab `.json` files or `.gltf`/`.glb` models, rendered in order
    #[arg(required = true)]
    prefabs: Vec<PathBuf>,

    /// Project assets root; thumbnails go to <root>/Resources/Thumbnails
    #[arg(long, env = "THUMBNAIL_ASSETS_ROOT")]
    assets_root: Option<PathBuf>,

    /// Settings file
    #[arg(long, default_value = "settings.json")]
    settings: PathBuf,

    /// Renderer backend: auto, gpu or software
    #[arg(long)]
    backend: Option<BackendSetting>,

    /// Thumbnail edge length in pixels
    #[arg(long)]
    resolution: Option<u32>,
}

impl Args {
    fn settings(&self) -> ThumbnailSettings {
        let mut settings = ThumbnailSettings::load_from_path(&self.settings);
        if let Some(root) = &self.assets_root {
            settings.assets_root = root.clone();
        }
        if let Some(backend) = self.backend {
            settings.backend = backend;
        }
        if let Some(resolution) = self.resolution {
            settings.resolution = resolution;
        }
        settings.validate()
    }
}

fn main() -> Result<()> {
    thumbnail_forge::init_logging();
    let args = Args::parse();

    let mut app = App::new(args.settings()).context("failed to initialise the renderer")?;

    let mut handles = Vec::with_capacity(args.prefabs.len());
    for path in &args.prefabs {
        let handle = app
            .import(path)
            .with_context(|| format!("failed to load {}", path.display()))?;
        handles.push(handle);
    }
    app.select(handles);

    let report = app.generate_thumbnails(&mut SleepScheduler);
    for path in report.paths() {
        println!("{}", path.display());
    }
    Ok(())
}
