use crate::types::Result;
use chrono::Local;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Log destinations for one run: console plus a timestamped file.
///
/// The subscriber is installed for the current thread only and removed when
/// the context is dropped, so the run must stay on one thread.
pub struct LogContext {
    path: PathBuf,
    _guard: DefaultGuard,
}

impl LogContext {
    pub fn init(log_dir: &Path) -> Result<Self> {
        fs::create_dir_all(log_dir)?;
        let path = log_dir.join(format!(
            "poetry_processor_{}.log",
            Local::now().format("%Y%m%d_%H%M%S")
        ));
        let file = File::create(&path)?;

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false))
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)));

        let guard = tracing::subscriber::set_default(subscriber);
        Ok(Self {
            path,
            _guard: guard,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_land_in_the_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = {
            let ctx = LogContext::init(&dir.path().join("logs")).unwrap();
            tracing::warn!("moon check");
            ctx.path().to_path_buf()
        };
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("poetry_processor_") && name.ends_with(".log"));
        assert!(fs::read_to_string(&path).unwrap().contains("moon check"));
    }
}
