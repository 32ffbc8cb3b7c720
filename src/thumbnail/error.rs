use crate::renderer::RenderError;
use crate::scene::SceneError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ThumbnailError {
    #[error("no objects selected; nothing to render")]
    EmptyInput,

    #[error("'{name}' has no renderable geometry; framing a zero-size volume")]
    DegenerateBounds { name: String },

    #[error("failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not acquire capture resources: {0}")]
    ResourceAcquisition(String),

    #[error("failed to instantiate '{name}': {source}")]
    Instantiate {
        name: String,
        #[source]
        source: SceneError,
    },

    #[error("failed to capture '{name}': {source}")]
    Capture {
        name: String,
        #[source]
        source: RenderError,
    },
}

impl ThumbnailError {
    /// Fatal errors abort the whole batch; everything else skips one object.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ThumbnailError::ResourceAcquisition(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_acquisition_is_fatal() {
        assert!(ThumbnailError::ResourceAcquisition("gone".into()).is_fatal());
        assert!(!ThumbnailError::EmptyInput.is_fatal());
        assert!(!ThumbnailError::Io {
            path: PathBuf::from("x.png"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        }
        .is_fatal());
    }
}
