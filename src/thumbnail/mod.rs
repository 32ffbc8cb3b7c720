//! Batch thumbnail generation: measure each object, frame it with a fixed
//! orthographic view, render offscreen and write a transparent PNG.

pub mod bounds;
pub mod capture;
pub mod encode;
pub mod error;
pub mod job;
pub mod view;

pub use bounds::{compute_bounds, BoundsVolume, Measured};
pub use capture::{CaptureDevice, CaptureSettings};
pub use encode::{encode_and_write, encode_png};
pub use error::ThumbnailError;
pub use job::{
    output_dir, run_batch, thumbnail_file_name, thumbnail_path, BatchReport, BatchStatus,
    JobConfig, ObjectOutcome, ScopedInstance, Step, ThumbnailJob, THUMBNAIL_DIR,
};
pub use view::{plan_view, ViewPlan, PADDING, VIEW_DIRECTION};
