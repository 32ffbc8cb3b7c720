// host.rs
//
// The pieces of the host application the thumbnail batch talks to: a
// cooperative scheduler and the asset index.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// What the host wants after a pause.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pace {
    Resume,
    Cancel,
}

/// Cooperative suspension point handed to long-running editor tasks.
pub trait Scheduler {
    fn pause(&mut self, delay: Duration) -> Pace;
}

/// Blocks the calling thread for the full delay.
#[derive(Debug, Default)]
pub struct SleepScheduler;

impl Scheduler for SleepScheduler {
    fn pause(&mut self, delay: Duration) -> Pace {
        std::thread::sleep(delay);
        Pace::Resume
    }
}

/// Keeps the host's frame loop ticking while a task is paused. The frame
/// callback runs at least once per pause and may cancel the task.
pub struct FramePumpScheduler<F> {
    frame_interval: Duration,
    frames: u64,
    on_frame: F,
}

impl<F> FramePumpScheduler<F>
where
    F: FnMut(u64) -> Pace,
{
    pub fn new(frame_interval: Duration, on_frame: F) -> Self {
        Self {
            frame_interval,
            frames: 0,
            on_frame,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl<F> Scheduler for FramePumpScheduler<F>
where
    F: FnMut(u64) -> Pace,
{
    fn pause(&mut self, delay: Duration) -> Pace {
        let start = Instant::now();
        loop {
            let pace = (self.on_frame)(self.frames);
            self.frames += 1;
            if pace == Pace::Cancel {
                log::debug!("Frame callback cancelled the task after {} frames", self.frames);
                return Pace::Cancel;
            }
            let elapsed = start.elapsed();
            if elapsed >= delay {
                return Pace::Resume;
            }
            std::thread::sleep(self.frame_interval.min(delay - elapsed));
        }
    }
}

/// Never sleeps. Records requested delays; optionally cancels after a
/// fixed number of pauses.
#[derive(Debug, Default)]
pub struct ImmediateScheduler {
    pub delays: Vec<Duration>,
    cancel_after: Option<usize>,
}

impl ImmediateScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancelling_after(pauses: usize) -> Self {
        Self {
            delays: Vec::new(),
            cancel_after: Some(pauses),
        }
    }

    pub fn pauses(&self) -> usize {
        self.delays.len()
    }
}

impl Scheduler for ImmediateScheduler {
    fn pause(&mut self, delay: Duration) -> Pace {
        self.delays.push(delay);
        match self.cancel_after {
            Some(n) if self.delays.len() >= n => Pace::Cancel,
            _ => Pace::Resume,
        }
    }
}

/// Tells the host that files changed on disk.
pub trait AssetIndex {
    fn refresh(&mut self);
}

/// File listing of the project's assets root, rebuilt on refresh.
#[derive(Debug)]
pub struct AssetDatabase {
    root: PathBuf,
    known: BTreeSet<PathBuf>,
    refreshes: usize,
}

impl AssetDatabase {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            known: BTreeSet::new(),
            refreshes: 0,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Paths relative to the root, as of the last refresh.
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.known.iter().map(PathBuf::as_path)
    }

    pub fn contains(&self, relative: impl AsRef<Path>) -> bool {
        self.known.contains(relative.as_ref())
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes
    }

    fn scan(&self) -> BTreeSet<PathBuf> {
        let mut found = BTreeSet::new();
        let mut stack = vec![self.root.clone()];
        while let Some(dir) = stack.pop() {
            let entries = match std::fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(err) => {
                    if dir != self.root || err.kind() != std::io::ErrorKind::NotFound {
                        log::warn!("Failed to scan {:?}: {}", dir, err);
                    }
                    continue;
                }
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    stack.push(path);
                } else if let Ok(relative) = path.strip_prefix(&self.root) {
                    found.insert(relative.to_path_buf());
                }
            }
        }
        found
    }
}

impl AssetIndex for AssetDatabase {
    fn refresh(&mut self) {
        let found = self.scan();
        let added = found.difference(&self.known).count();
        let removed = self.known.difference(&found).count();
        self.known = found;
        self.refreshes += 1;
        log::info!(
            "Asset database refreshed: {} files ({} new, {} removed)",
            self.known.len(),
            added,
            removed
        );
    }
}
