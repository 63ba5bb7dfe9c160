use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::CASCADE_DIR_ENV;

#[derive(Error, Debug)]
pub enum CascadeResolveError {
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write cascade to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// Directories where distributions commonly install OpenCV's cascade files.
const SYSTEM_CASCADE_DIRS: &[&str] = &[
    "/usr/share/opencv4/haarcascades",
    "/usr/local/share/opencv4/haarcascades",
    "/opt/homebrew/share/opencv4/haarcascades",
    "/usr/share/opencv/haarcascades",
    "/usr/local/share/opencv/haarcascades",
];

/// Resolve a cascade XML file by name, checking local copies before downloading.
///
/// Resolution order:
/// 1. `extra_dir` (e.g. from `--cascade-dir`)
/// 2. `$FACETHUMB_CASCADE_DIR`
/// 3. System OpenCV data directories
/// 4. User cache directory (platform-specific)
/// 5. Download from URL to cache
pub fn resolve(
    name: &str,
    url: &str,
    extra_dir: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, CascadeResolveError> {
    let cache_dir = cascade_cache_dir()?;
    resolve_in(name, url, &search_dirs(extra_dir), &cache_dir, progress)
}

/// Finds an existing local copy without touching the network.
pub fn find_local(name: &str, extra_dir: Option<&Path>) -> Option<PathBuf> {
    let mut dirs = search_dirs(extra_dir);
    if let Ok(cache) = cascade_cache_dir() {
        dirs.push(cache);
    }
    find_in(name, &dirs)
}

fn search_dirs(extra_dir: Option<&Path>) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(dir) = extra_dir {
        dirs.push(dir.to_path_buf());
    }
    if let Some(dir) = std::env::var_os(CASCADE_DIR_ENV) {
        dirs.push(PathBuf::from(dir));
    }
    dirs.extend(SYSTEM_CASCADE_DIRS.iter().map(PathBuf::from));
    dirs
}

fn find_in(name: &str, dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter().map(|d| d.join(name)).find(|p| p.is_file())
}

fn resolve_in(
    name: &str,
    url: &str,
    search_dirs: &[PathBuf],
    cache_dir: &Path,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, CascadeResolveError> {
    if let Some(found) = find_in(name, search_dirs) {
        return Ok(found);
    }

    let cached_path = cache_dir.join(name);
    if cached_path.is_file() {
        return Ok(cached_path);
    }

    log::info!("Downloading {name} from {url}");
    fs::create_dir_all(cache_dir).map_err(CascadeResolveError::CacheDir)?;
    download(url, &cached_path, progress)?;
    Ok(cached_path)
}

/// Platform-specific cascade cache directory.
///
/// - macOS: `~/Library/Application Support/facethumb/cascades/`
/// - Linux: `$XDG_CACHE_HOME/facethumb/cascades/` or `~/.cache/facethumb/cascades/`
/// - Windows: `%LOCALAPPDATA%/facethumb/cascades/`
pub fn cascade_cache_dir() -> Result<PathBuf, CascadeResolveError> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir()
            .map(|d| d.join("facethumb").join("cascades"))
            .ok_or(CascadeResolveError::NoCacheDir)
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .map(|d| d.join("facethumb").join("cascades"))
            .ok_or(CascadeResolveError::NoCacheDir)
    }
}

fn download(
    url: &str,
    dest: &Path,
    progress: Option<ProgressFn>,
) -> Result<(), CascadeResolveError> {
    let temp_path = dest.with_extension("part");

    let result = download_inner(url, dest, &temp_path, progress);

    // Clean up .part file on any error
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }

    result
}

fn download_inner(
    url: &str,
    dest: &Path,
    temp_path: &Path,
    progress: Option<ProgressFn>,
) -> Result<(), CascadeResolveError> {
    let response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| CascadeResolveError::Download {
            url: url.to_string(),
            source: e,
        })?;

    let total = response.content_length().unwrap_or(0);
    let mut downloaded: u64 = 0;

    let write_err = |source: std::io::Error| CascadeResolveError::Write {
        path: temp_path.to_path_buf(),
        source,
    };

    let mut file = fs::File::create(temp_path).map_err(write_err)?;

    let mut reader = response;
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf).map_err(write_err)?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n]).map_err(write_err)?;
        downloaded += n as u64;
        if let Some(ref cb) = progress {
            cb(downloaded, total);
        }
    }

    file.flush().map_err(write_err)?;
    drop(file);

    fs::rename(temp_path, dest).map_err(|e| CascadeResolveError::Write {
        path: dest.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const NAME: &str = "haarcascade_test.xml";
    const BAD_URL: &str = "http://invalid.nonexistent.example.com/cascade.xml";

    #[test]
    fn test_resolve_prefers_search_dir() {
        let tmp = TempDir::new().unwrap();
        let search = tmp.path().join("search");
        let cache = tmp.path().join("cache");
        fs::create_dir_all(&search).unwrap();
        fs::create_dir_all(&cache).unwrap();
        fs::write(search.join(NAME), b"<opencv_storage/>").unwrap();
        fs::write(cache.join(NAME), b"<opencv_storage/>").unwrap();

        let path = resolve_in(NAME, BAD_URL, &[search.clone()], &cache, None).unwrap();
        assert_eq!(path, search.join(NAME));
    }

    #[test]
    fn test_resolve_search_dirs_in_order() {
        let tmp = TempDir::new().unwrap();
        let first = tmp.path().join("first");
        let second = tmp.path().join("second");
        fs::create_dir_all(&first).unwrap();
        fs::create_dir_all(&second).unwrap();
        fs::write(second.join(NAME), b"second").unwrap();

        let dirs = vec![first.clone(), second.clone()];
        let path = resolve_in(NAME, BAD_URL, &dirs, tmp.path(), None).unwrap();
        assert_eq!(path, second.join(NAME));

        fs::write(first.join(NAME), b"first").unwrap();
        let path = resolve_in(NAME, BAD_URL, &dirs, tmp.path(), None).unwrap();
        assert_eq!(path, first.join(NAME));
    }

    #[test]
    fn test_resolve_falls_back_to_cache() {
        let tmp = TempDir::new().unwrap();
        let cache = tmp.path().join("cache");
        fs::create_dir_all(&cache).unwrap();
        fs::write(cache.join(NAME), b"cached").unwrap();

        let missing = tmp.path().join("missing");
        let path = resolve_in(NAME, BAD_URL, &[missing], &cache, None).unwrap();
        assert_eq!(path, cache.join(NAME));
    }

    #[test]
    fn test_resolve_ignores_directories_with_the_name() {
        let tmp = TempDir::new().unwrap();
        let search = tmp.path().join("search");
        fs::create_dir_all(search.join(NAME)).unwrap();
        let cache = tmp.path().join("cache");

        let result = resolve_in(NAME, BAD_URL, &[search], &cache, None);
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_download_failure_leaves_no_files() {
        let tmp = TempDir::new().unwrap();
        let cache = tmp.path().join("cache");

        let result = resolve_in(NAME, BAD_URL, &[], &cache, None);
        assert!(matches!(result, Err(CascadeResolveError::Download { .. })));
        assert!(!cache.join(NAME).exists());
        assert!(!cache.join(NAME).with_extension("part").exists());
    }

    #[test]
    fn test_search_dirs_order() {
        let extra = PathBuf::from("/tmp/extra-cascades");
        let dirs = search_dirs(Some(&extra));
        assert_eq!(dirs[0], extra);
        assert!(dirs.contains(&PathBuf::from("/usr/share/opencv4/haarcascades")));
    }

    #[test]
    fn test_cascade_cache_dir_returns_path() {
        let path = cascade_cache_dir().unwrap();
        assert!(path.to_string_lossy().contains("facethumb"));
        assert!(path.to_string_lossy().contains("cascades"));
    }
}
