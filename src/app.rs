// app.rs
//
// Headless editor host: owns the scene, the renderer and the prefab library,
// and exposes the thumbnail command over the current selection.

use std::path::Path;

use crate::asset::{AssetCache, Handle};
use crate::host::{AssetDatabase, Scheduler};
use crate::renderer::{RenderError, Renderer};
use crate::scene::{Prefab, PrefabError, PrefabLoader, Scene};
use crate::settings::ThumbnailSettings;
use crate::thumbnail::{run_batch, BatchReport, JobConfig};

pub struct App {
    scene: Scene,
    renderer: Renderer,
    prefabs: AssetCache<Prefab>,
    asset_database: AssetDatabase,
    settings: ThumbnailSettings,
    selection: Vec<Handle<Prefab>>,
}

impl App {
    /// Picks the renderer named by `settings.backend`.
    pub fn new(settings: ThumbnailSettings) -> Result<Self, RenderError> {
        let renderer = Renderer::from_setting(settings.backend)?;
        Ok(Self::with_renderer(settings, renderer))
    }

    pub fn with_renderer(settings: ThumbnailSettings, renderer: Renderer) -> Self {
        Self {
            scene: Scene::new(),
            renderer,
            prefabs: AssetCache::new(),
            asset_database: AssetDatabase::new(settings.assets_root.clone()),
            settings,
            selection: Vec::new(),
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn settings(&self) -> &ThumbnailSettings {
        &self.settings
    }

    pub fn asset_database(&self) -> &AssetDatabase {
        &self.asset_database
    }

    pub fn add_prefab(&mut self, prefab: Prefab) -> Handle<Prefab> {
        self.prefabs.insert(prefab)
    }

    /// Loads a `.json` prefab or imports a glTF model into the library.
    pub fn import(&mut self, path: &Path) -> Result<Handle<Prefab>, PrefabError> {
        let prefab = PrefabLoader::load(path, &mut self.scene)?;
        log::info!("Imported '{}' from {:?}", prefab.name, path);
        Ok(self.add_prefab(prefab))
    }

    pub fn prefab(&self, handle: Handle<Prefab>) -> Option<&Prefab> {
        self.prefabs.get(handle)
    }

    pub fn select(&mut self, handles: impl IntoIterator<Item = Handle<Prefab>>) {
        self.selection = handles.into_iter().collect();
    }

    pub fn select_all(&mut self) {
        self.selection = self.prefabs.handles().collect();
    }

    pub fn selection(&self) -> &[Handle<Prefab>] {
        &self.selection
    }

    /// Renders one thumbnail per selected prefab, in selection order.
    pub fn generate_thumbnails(&mut self, scheduler: &mut dyn Scheduler) -> BatchReport {
        let prefabs = &self.prefabs;
        let objects = self.selection.iter().filter_map(|&handle| {
            let prefab = prefabs.get(handle);
            if prefab.is_none() {
                log::warn!("Selected prefab {:?} is not loaded; skipping", handle);
            }
            prefab
        });
        run_batch(
            &mut self.scene,
            &mut self.renderer,
            objects,
            JobConfig::from_settings(&self.settings),
            scheduler,
            &mut self.asset_database,
        )
    }
}
