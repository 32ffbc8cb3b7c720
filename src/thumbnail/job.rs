// thumbnail/job.rs
//
// Batch orchestration as an explicit state machine. The host drives it with
// `step()` and pauses for the returned delay between objects.

use super::bounds::compute_bounds;
use super::capture::{CaptureDevice, CaptureSettings};
use super::encode::encode_and_write;
use super::error::ThumbnailError;
use super::view::plan_view;
use crate::host::{AssetIndex, Pace, Scheduler};
use crate::renderer::Renderer;
use crate::scene::{Prefab, Scene, SceneError};
use crate::settings::ThumbnailSettings;
use glam::Vec3;
use hecs::Entity;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Output directory, relative to the assets root.
pub const THUMBNAIL_DIR: &str = "Resources/Thumbnails";

pub fn output_dir(assets_root: &Path) -> PathBuf {
    assets_root.join(THUMBNAIL_DIR)
}

/// `<name>_thumbnail.png`, with path separators flattened to `_`.
pub fn thumbnail_file_name(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    format!("{stem}_thumbnail.png")
}

pub fn thumbnail_path(assets_root: &Path, name: &str) -> PathBuf {
    output_dir(assets_root).join(thumbnail_file_name(name))
}

#[derive(Clone, Debug)]
pub struct JobConfig {
    pub assets_root: PathBuf,
    pub capture: CaptureSettings,
    pub yield_delay: Duration,
}

impl JobConfig {
    pub fn from_settings(settings: &ThumbnailSettings) -> Self {
        Self {
            assets_root: settings.assets_root.clone(),
            capture: CaptureSettings {
                resolution: settings.resolution,
                depth_bits: settings.depth_bits,
            },
            yield_delay: settings.yield_delay(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchStatus {
    /// Nothing was selected; no resources were touched.
    Empty,
    Completed,
    Aborted(String),
    Cancelled,
}

#[derive(Debug)]
pub enum ObjectOutcome {
    Written {
        name: String,
        path: PathBuf,
        bytes: u64,
        degenerate: bool,
        ortho_half_height: f32,
    },
    Failed {
        name: String,
        error: ThumbnailError,
    },
}

impl ObjectOutcome {
    pub fn name(&self) -> &str {
        match self {
            ObjectOutcome::Written { name, .. } | ObjectOutcome::Failed { name, .. } => name,
        }
    }

    pub fn is_written(&self) -> bool {
        matches!(self, ObjectOutcome::Written { .. })
    }
}

#[derive(Debug)]
pub struct BatchReport {
    pub status: BatchStatus,
    pub outcomes: Vec<ObjectOutcome>,
}

impl BatchReport {
    pub fn written(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_written()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.written()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.outcomes.iter().filter_map(|o| match o {
            ObjectOutcome::Written { path, .. } => Some(path.as_path()),
            ObjectOutcome::Failed { .. } => None,
        })
    }
}

#[derive(Debug)]
pub enum Step {
    /// One object was processed; pause for the delay, then step again.
    Yield(Duration),
    Done(BatchReport),
}

/// A live prefab instance that is destroyed when the guard goes away.
pub struct ScopedInstance<'s> {
    scene: &'s mut Scene,
    root: Entity,
}

impl<'s> ScopedInstance<'s> {
    pub fn spawn(scene: &'s mut Scene, prefab: &Prefab, position: Vec3) -> Result<Self, SceneError> {
        let root = scene.instantiate(prefab, position)?;
        Ok(Self { scene, root })
    }

    pub fn root(&self) -> Entity {
        self.root
    }

    pub fn scene(&self) -> &Scene {
        &*self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut *self.scene
    }
}

impl Drop for ScopedInstance<'_> {
    fn drop(&mut self) {
        self.scene.destroy(self.root);
    }
}

/// One batch run over an ordered selection of prefabs.
///
/// The capture device lives exactly as long as the job is running: it is
/// released when the last object is done, on `cancel`, or when the job is
/// dropped part way through.
pub struct ThumbnailJob<'a> {
    scene: &'a mut Scene,
    renderer: &'a mut Renderer,
    objects: Vec<&'a Prefab>,
    config: JobConfig,
    device: Option<CaptureDevice>,
    next: usize,
    outcomes: Vec<ObjectOutcome>,
    /// Set when the job must stop before the next object.
    halted: Option<BatchStatus>,
    finished: bool,
}

impl<'a> ThumbnailJob<'a> {
    /// Validates the selection, prepares the output directory and acquires
    /// the capture device.
    pub fn start(
        scene: &'a mut Scene,
        renderer: &'a mut Renderer,
        objects: impl IntoIterator<Item = &'a Prefab>,
        config: JobConfig,
    ) -> Self {
        let mut job = Self {
            scene,
            renderer,
            objects: objects.into_iter().collect(),
            config,
            device: None,
            next: 0,
            outcomes: Vec::new(),
            halted: None,
            finished: false,
        };

        if job.objects.is_empty() {
            log::warn!("{}", ThumbnailError::EmptyInput);
            job.halted = Some(BatchStatus::Empty);
            return job;
        }

        let dir = output_dir(&job.config.assets_root);
        match std::fs::create_dir_all(&dir) {
            Ok(()) => log::debug!("Thumbnail directory ready at {:?}", dir),
            Err(err) => log::warn!(
                "Could not create thumbnail directory {:?} ({}); writes will be retried per object",
                dir,
                err
            ),
        }

        match CaptureDevice::acquire(job.scene, job.renderer, &job.config.capture) {
            Ok(device) => {
                log::info!(
                    "Generating {} thumbnails with the {} renderer",
                    job.objects.len(),
                    job.renderer.backend_name()
                );
                job.device = Some(device);
            }
            Err(err) => {
                log::error!("Aborting thumbnail batch: {}", err);
                job.halted = Some(BatchStatus::Aborted(err.to_string()));
            }
        }
        job
    }

    pub fn remaining(&self) -> usize {
        self.objects.len().saturating_sub(self.next)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Processes the next object, or finishes the batch.
    pub fn step(&mut self) -> Step {
        if self.halted.is_none() && self.next < self.objects.len() {
            if let Some(device) = &self.device {
                let prefab = self.objects[self.next];
                self.next += 1;
                let outcome = capture_one(self.scene, self.renderer, device, prefab, &self.config);
                report(&outcome);
                self.outcomes.push(outcome);
                return Step::Yield(self.config.yield_delay);
            }
        }
        let status = self.halted.take().unwrap_or(BatchStatus::Completed);
        Step::Done(self.finish(status))
    }

    /// Stops before the next object and releases the capture device.
    pub fn cancel(&mut self) -> BatchReport {
        log::warn!(
            "Thumbnail batch cancelled with {} objects remaining",
            self.remaining()
        );
        self.finish(BatchStatus::Cancelled)
    }

    fn finish(&mut self, status: BatchStatus) -> BatchReport {
        self.release_device();
        self.finished = true;
        self.halted = Some(status.clone());
        BatchReport {
            status,
            outcomes: std::mem::take(&mut self.outcomes),
        }
    }

    fn release_device(&mut self) {
        if let Some(device) = self.device.take() {
            device.release(self.scene, self.renderer);
        }
    }
}

impl Drop for ThumbnailJob<'_> {
    fn drop(&mut self) {
        if self.device.is_some() {
            log::warn!("Thumbnail job dropped mid-batch; releasing capture device");
            self.release_device();
        }
    }
}

fn capture_one(
    scene: &mut Scene,
    renderer: &mut Renderer,
    device: &CaptureDevice,
    prefab: &Prefab,
    config: &JobConfig,
) -> ObjectOutcome {
    let name = prefab.name.clone();
    match try_capture(scene, renderer, device, prefab, config) {
        Ok(outcome) => outcome,
        Err(error) => ObjectOutcome::Failed { name, error },
    }
}

fn try_capture(
    scene: &mut Scene,
    renderer: &mut Renderer,
    device: &CaptureDevice,
    prefab: &Prefab,
    config: &JobConfig,
) -> Result<ObjectOutcome, ThumbnailError> {
    let name = &prefab.name;
    let mut instance =
        ScopedInstance::spawn(scene, prefab, Vec3::ZERO).map_err(|source| {
            ThumbnailError::Instantiate {
                name: name.clone(),
                source,
            }
        })?;

    let measured = compute_bounds(instance.scene(), instance.root());
    if measured.degenerate {
        log::warn!("{}", ThumbnailError::DegenerateBounds { name: name.clone() });
    }

    let plan = plan_view(&measured.bounds);
    let capture_err = |source| ThumbnailError::Capture {
        name: name.clone(),
        source,
    };
    device
        .configure(instance.scene_mut(), &plan)
        .map_err(capture_err)?;
    let image = device
        .render_frame(instance.scene(), renderer)
        .map_err(capture_err)?;

    let path = thumbnail_path(&config.assets_root, name);
    let bytes = encode_and_write(&image, &path)?;

    Ok(ObjectOutcome::Written {
        name: name.clone(),
        path,
        bytes,
        degenerate: measured.degenerate,
        ortho_half_height: plan.ortho_half_height,
    })
}

fn report(outcome: &ObjectOutcome) {
    match outcome {
        ObjectOutcome::Written { path, bytes, .. } => {
            log::info!("Thumbnail saved to: {} ({} bytes)", path.display(), bytes)
        }
        ObjectOutcome::Failed { name, error } => {
            log::warn!("Skipping '{}': {}", name, error)
        }
    }
}

/// Runs a whole batch, pausing on `scheduler` after every object. Never
/// fails: problems are reported in the returned `BatchReport`.
pub fn run_batch<'a>(
    scene: &'a mut Scene,
    renderer: &'a mut Renderer,
    objects: impl IntoIterator<Item = &'a Prefab>,
    config: JobConfig,
    scheduler: &mut dyn Scheduler,
    index: &mut dyn AssetIndex,
) -> BatchReport {
    let mut job = ThumbnailJob::start(scene, renderer, objects, config);
    let report = loop {
        match job.step() {
            Step::Yield(delay) => {
                if scheduler.pause(delay) == Pace::Cancel {
                    break job.cancel();
                }
            }
            Step::Done(report) => break report,
        }
    };
    drop(job);

    if report.status != BatchStatus::Empty {
        index.refresh();
    }
    match &report.status {
        BatchStatus::Empty => {}
        BatchStatus::Completed => log::info!(
            "Thumbnail generation complete: {} written, {} failed",
            report.written(),
            report.failed()
        ),
        BatchStatus::Aborted(reason) => log::error!("Thumbnail generation aborted: {}", reason),
        BatchStatus::Cancelled => log::warn!(
            "Thumbnail generation cancelled: {} written, {} failed",
            report.written(),
            report.failed()
        ),
    }
    report
}
