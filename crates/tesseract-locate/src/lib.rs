//! # tesseract-locate
//!
//! Find the [Tesseract](https://github.com/tesseract-ocr/tesseract) OCR
//! binary on the host, so that callers never have to hard-code where a
//! package manager happened to install it.
//!
//! ## How it works
//!
//! On first call to [`locate_tesseract`]:
//!
//! 1. Uses `TESSERACT_PATH` if it points to an existing file.
//! 2. Scans every directory on `PATH` for `tesseract` (`tesseract.exe` on Windows).
//! 3. Falls back to well-known install locations (Debian/Fedora, Homebrew,
//!    the UB-Mannheim Windows installer).
//! 4. Finally checks the user executable directory (`~/.local/bin`).
//!
//! The result is memoised for the lifetime of the process.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tesseract_locate::{list_languages, locate_tesseract, tesseract_version};
//!
//! let bin = locate_tesseract().expect("tesseract not installed");
//! println!("{}", tesseract_version(&bin).unwrap());
//! println!("{:?}", list_languages(&bin).unwrap());
//! ```
//!
//! ## Environment variable overrides
//!
//! - `TESSERACT_PATH` — absolute path to a tesseract executable; skips the search.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

use thiserror::Error;

// ── Public constants ─────────────────────────────────────────────────────────

/// Environment variable that short-circuits the search.
pub const TESSERACT_PATH_ENV: &str = "TESSERACT_PATH";

/// File name of the executable on the current platform.
#[cfg(windows)]
pub const BINARY_NAME: &str = "tesseract.exe";
#[cfg(not(windows))]
pub const BINARY_NAME: &str = "tesseract";

/// Install directories tried after `PATH`.
const WELL_KNOWN_DIRS: &[&str] = &[
    "/usr/bin",
    "/usr/local/bin",
    "/opt/homebrew/bin",
    "/opt/local/bin",
    r"C:\Program Files\Tesseract-OCR",
    r"C:\Program Files (x86)\Tesseract-OCR",
];

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by tesseract-locate operations.
#[derive(Error, Debug)]
pub enum LocateError {
    /// No executable was found in any candidate directory.
    #[error(
        "tesseract executable not found (searched {} locations).\n\
Install it (apt install tesseract-ocr / brew install tesseract) or set TESSERACT_PATH.",
        .searched.len()
    )]
    NotFound { searched: Vec<PathBuf> },

    /// The binary exists but a probe command (`--version`, `--list-langs`) failed.
    #[error("Failed to probe tesseract at '{path}': {reason}")]
    Probe { path: PathBuf, reason: String },
}

// ── Thread-safe singleton path cache ─────────────────────────────────────────

static RESOLVED_PATH: OnceLock<PathBuf> = OnceLock::new();

// ── Public API ───────────────────────────────────────────────────────────────

/// Returns the path to the tesseract executable.
///
/// Safe to call from multiple threads; the filesystem search happens at most
/// once per process when it succeeds. Failures are not cached, so installing
/// tesseract while a long-running process is alive is picked up on the next call.
pub fn locate_tesseract() -> Result<PathBuf, LocateError> {
    if let Some(path) = RESOLVED_PATH.get() {
        return Ok(path.clone());
    }

    if let Ok(env_path) = std::env::var(TESSERACT_PATH_ENV) {
        let p = PathBuf::from(env_path);
        if p.is_file() {
            let _ = RESOLVED_PATH.set(p.clone());
            return Ok(p);
        }
    }

    let path = find_tesseract_in(&candidate_dirs())?;
    let _ = RESOLVED_PATH.set(path.clone());
    Ok(path)
}

/// Searches `search` in order for an executable named [`BINARY_NAME`].
///
/// Does not consult the environment or the process-wide cache.
pub fn find_tesseract_in(search: &[PathBuf]) -> Result<PathBuf, LocateError> {
    let mut searched = Vec::with_capacity(search.len());
    for dir in search {
        let candidate = dir.join(BINARY_NAME);
        if is_executable(&candidate) {
            return Ok(candidate);
        }
        searched.push(candidate);
    }
    Err(LocateError::NotFound { searched })
}

/// Directories searched by [`locate_tesseract`], in priority order.
pub fn candidate_dirs() -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = std::env::var_os("PATH")
        .map(|p| std::env::split_paths(&p).collect())
        .unwrap_or_default();
    out.extend(WELL_KNOWN_DIRS.iter().map(PathBuf::from));
    if let Some(exe_dir) = dirs::executable_dir() {
        out.push(exe_dir);
    }
    out.dedup();
    out
}

/// Runs `tesseract --version` and returns the first line, e.g. `tesseract 5.3.4`.
pub fn tesseract_version(path: &Path) -> Result<String, LocateError> {
    let stdout = probe(path, "--version")?;
    stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
        .ok_or_else(|| LocateError::Probe {
            path: path.to_path_buf(),
            reason: "empty --version output".into(),
        })
}

/// Runs `tesseract --list-langs` and returns the installed language codes.
pub fn list_languages(path: &Path) -> Result<Vec<String>, LocateError> {
    let stdout = probe(path, "--list-langs")?;
    Ok(parse_language_list(&stdout))
}

// ── Internal helpers ─────────────────────────────────────────────────────────

fn probe(path: &Path, flag: &str) -> Result<String, LocateError> {
    let output = Command::new(path)
        .arg(flag)
        .output()
        .map_err(|e| LocateError::Probe {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(LocateError::Probe {
            path: path.to_path_buf(),
            reason: format!(
                "{flag} exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }

    // Old tesseract releases print --version to stderr.
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    if text.trim().is_empty() {
        text = String::from_utf8_lossy(&output.stderr).into_owned();
    }
    Ok(text)
}

/// The first line of `--list-langs` is a header
/// (`List of available languages in "/usr/share/tessdata/" (3):`).
fn parse_language_list(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .skip(1)
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
