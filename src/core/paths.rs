use crate::error::{Error, Result};
use std::env;
use std::path::PathBuf;

/// Base sweep config directory (~/.config/sweep/ on all platforms)
pub fn sweep() -> Result<PathBuf> {
    #[cfg(windows)]
    {
        let appdata = env::var("APPDATA").map_err(|_| {
            Error::internal_unexpected("APPDATA environment variable not set on Windows")
        })?;
        Ok(PathBuf::from(appdata).join("sweep"))
    }

    #[cfg(not(windows))]
    {
        let home = env::var("HOME").map_err(|_| {
            Error::internal_unexpected("HOME environment variable not set on Unix-like system")
        })?;
        Ok(PathBuf::from(home).join(".config").join("sweep"))
    }
}

/// Global sweep.json config file path
pub fn sweep_json() -> Result<PathBuf> {
    Ok(sweep()?.join("sweep.json"))
}

/// Cache directory
pub fn cache() -> Result<PathBuf> {
    Ok(sweep()?.join("cache"))
}

/// Default listing cache file
pub fn listing_cache() -> Result<PathBuf> {
    Ok(cache()?.join("listing.txt"))
}
