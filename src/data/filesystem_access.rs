//! Well-known directories used by the detector, e.g. the cache directory that
//! selection crops are written to.

use std::path::{Path, PathBuf};

const APP_DIR: &str = "frame_detect";

#[derive(Debug)]
pub enum FsAccess {
    Cache,
    Current,
}

impl FsAccess {
    /// The `frame_detect` directory below the platform base for this kind.
    fn get_path(&self) -> anyhow::Result<PathBuf> {
        let base_path = match self {
            FsAccess::Cache => dirs::cache_dir(),
            FsAccess::Current => std::env::current_dir().ok(),
        };

        let mut path = base_path.ok_or_else(|| {
            anyhow::anyhow!("No {:?} directory available on this platform.", self)
        })?;
        path.push(APP_DIR);
        Ok(path)
    }

    /// Constructs a path below the `frame_detect` directory, creating it automatically.
    ///
    /// Example: `~/.cache/frame_detect/captures`.
    pub fn path_with_subs(&self, subs: &[&str]) -> anyhow::Result<PathBuf> {
        let mut d = self.get_path()?;
        for sub in subs {
            d.push(sub);
        }
        create_directory(&d)?;
        Ok(d)
    }
}

fn create_directory(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
