pub mod app;
pub mod asset;
pub mod host;
pub(crate) mod io;
pub mod renderer;
pub mod scene;
pub mod settings;
pub mod thumbnail;

pub use app::App;
pub use settings::{BackendSetting, ThumbnailSettings};

/// Default `Info` filter; `RUST_LOG` overrides it.
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init();
}
