use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which renderer backs thumbnail capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendSetting {
    #[default]
    Auto,
    Gpu,
    Software,
}

impl std::str::FromStr for BackendSetting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "gpu" => Ok(Self::Gpu),
            "software" | "cpu" => Ok(Self::Software),
            other => Err(format!("unknown backend '{other}' (expected auto, gpu or software)")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailSettings {
    /// Edge length of the square thumbnail, in pixels.
    #[serde(default = "ThumbnailSettings::default_resolution")]
    pub resolution: u32,
    #[serde(default = "ThumbnailSettings::default_depth_bits")]
    pub depth_bits: u32,
    /// Pause handed to the host scheduler after each object.
    #[serde(default = "ThumbnailSettings::default_yield_seconds")]
    pub yield_seconds: f32,
    #[serde(default = "ThumbnailSettings::default_assets_root")]
    pub assets_root: PathBuf,
    #[serde(default)]
    pub backend: BackendSetting,
}

impl Default for ThumbnailSettings {
    fn default() -> Self {
        Self {
            resolution: Self::default_resolution(),
            depth_bits: Self::default_depth_bits(),
            yield_seconds: Self::default_yield_seconds(),
            assets_root: Self::default_assets_root(),
            backend: BackendSetting::default(),
        }
    }
}

impl ThumbnailSettings {
    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Self {
        use std::fs;

        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<ThumbnailSettings>(&contents) {
                Ok(settings) => {
                    info!("Loaded thumbnail settings from {:?}", path);
                    settings.validate()
                }
                Err(err) => {
                    warn!(
                        "Failed to parse {:?} ({}). Falling back to default thumbnail settings.",
                        path, err
                    );
                    ThumbnailSettings::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "Thumbnail settings file {:?} not found. Using default settings.",
                    path
                );
                ThumbnailSettings::default()
            }
            Err(err) => {
                warn!(
                    "Failed to read {:?} ({}). Falling back to default thumbnail settings.",
                    path, err
                );
                ThumbnailSettings::default()
            }
        }
    }

    pub fn validate(mut self) -> Self {
        if self.resolution == 0 || self.resolution > crate::renderer::target::MAX_TARGET_SIZE {
            warn!(
                "Resolution {} is out of range. Using {} instead.",
                self.resolution,
                Self::default_resolution()
            );
            self.resolution = Self::default_resolution();
        }

        if !matches!(self.depth_bits, 16 | 24 | 32) {
            warn!("Depth bits must be 16, 24 or 32. Using default value.");
            self.depth_bits = Self::default_depth_bits();
        }

        if !self.yield_seconds.is_finite()
            || !(0.0..=Self::MAX_YIELD_SECONDS).contains(&self.yield_seconds)
        {
            warn!(
                "Yield delay must be between 0 and {} seconds. Using default value.",
                Self::MAX_YIELD_SECONDS
            );
            self.yield_seconds = Self::default_yield_seconds();
        }

        if self.assets_root.as_os_str().is_empty() {
            warn!("Assets root must not be empty. Using default value.");
            self.assets_root = Self::default_assets_root();
        }

        self
    }

    /// Falls back to the default delay for values a `Duration` cannot hold.
    pub fn yield_delay(&self) -> std::time::Duration {
        std::time::Duration::try_from_secs_f32(self.yield_seconds).unwrap_or_else(|_| {
            std::time::Duration::from_secs_f32(Self::default_yield_seconds())
        })
    }

    const MAX_YIELD_SECONDS: f32 = 60.0;

    const fn default_resolution() -> u32 {
        256
    }

    const fn default_depth_bits() -> u32 {
        24
    }

    const fn default_yield_seconds() -> f32 {
        0.1
    }

    fn default_assets_root() -> PathBuf {
        PathBuf::from("Assets")
    }
}
