//! Chooses which repository files are worth sending to the model.

use crate::error::{Result, ReviewError};
use crate::models::{CandidateFile, RepoEntry};
use crate::utils::{detect_language, is_primary_language};
use std::cmp::Ordering;

/// Hard upper bound on files per review
pub const MAX_FILES: usize = 30;

const SKIP_DIRS: &[&str] = &[
    "node_modules",
    "target",
    "build",
    "dist",
    "vendor",
    "venv",
    "__pycache__",
    "bower_components",
    "site-packages",
    "coverage",
    "Pods",
    "DerivedData",
    // fixtures
    "fixtures",
    "__fixtures__",
    "testdata",
    "test_data",
    "__snapshots__",
];

const SKIP_EXTENSIONS: &[&str] = &[
    // images
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "svg", "webp", "tiff", "psd",
    // archives
    "zip", "tar", "gz", "tgz", "bz2", "xz", "7z", "rar", "jar", "war", "whl", "egg",
    // fonts
    "ttf", "otf", "woff", "woff2", "eot",
    // media
    "mp3", "mp4", "wav", "ogg", "avi", "mov", "webm", "flac",
    // compiled objects
    "o", "a", "so", "dylib", "dll", "exe", "class", "pyc", "pyo", "wasm", "bin", "obj",
    // documents and data blobs
    "pdf", "doc", "docx", "xls", "xlsx", "db", "sqlite",
    // lock files and source maps
    "lock", "map",
];

const SKIP_FILE_NAMES: &[&str] = &[
    "package-lock.json",
    "pnpm-lock.yaml",
    "yarn.lock",
    "npm-shrinkwrap.json",
    "composer.lock",
    "go.sum",
];

const SKIP_SUFFIXES: &[&str] = &[".min.js", ".min.css", ".bundle.js", ".map"];

const ENTRY_POINT_STEMS: &[&str] = &["main", "lib", "index", "app", "server", "mod"];

/// Whether a path is excluded before ranking
pub fn is_excluded(path: &str) -> bool {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let Some((file_name, dirs)) = segments.split_last() else {
        return true;
    };

    if segments.iter().any(|s| s.starts_with('.')) {
        return true;
    }
    if dirs.iter().any(|d| SKIP_DIRS.contains(d)) {
        return true;
    }

    let lower = file_name.to_lowercase();
    if SKIP_FILE_NAMES.contains(&lower.as_str()) || SKIP_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
        return true;
    }
    match lower.rsplit_once('.') {
        Some((_, ext)) => SKIP_EXTENSIONS.contains(&ext),
        None => false,
    }
}

fn is_entry_point(path: &str) -> bool {
    let file_name = path.rsplit('/').next().unwrap_or(path).to_lowercase();
    if file_name == "__init__.py" {
        return true;
    }
    let stem = file_name.split('.').next().unwrap_or_default();
    ENTRY_POINT_STEMS.contains(&stem)
}

fn depth(path: &str) -> usize {
    path.matches('/').count()
}

/// Total order over candidates; smaller sorts first
fn rank(a: &CandidateFile, b: &CandidateFile, large_file_threshold: u64) -> Ordering {
    let tier = |f: &CandidateFile| !is_primary_language(&f.language);
    let large = |f: &CandidateFile| f.size > large_file_threshold;
    let not_entry = |f: &CandidateFile| !is_entry_point(&f.path);

    tier(a)
        .cmp(&tier(b))
        .then_with(|| large(a).cmp(&large(b)))
        .then_with(|| depth(&a.path).cmp(&depth(&b.path)))
        .then_with(|| not_entry(a).cmp(&not_entry(b)))
        .then_with(|| a.size.cmp(&b.size))
        .then_with(|| a.path.cmp(&b.path))
}

/// Selects at most `max_count` files (never more than [`MAX_FILES`]) in priority order
///
/// Files over `max_bytes_per_file` are skipped outright. Content is left unloaded.
pub fn select(
    entries: &[RepoEntry],
    max_count: usize,
    max_bytes_per_file: u64,
    large_file_threshold: u64,
) -> Result<Vec<CandidateFile>> {
    let mut candidates: Vec<CandidateFile> = entries
        .iter()
        .filter(|entry| entry.size <= max_bytes_per_file)
        .filter(|entry| !is_excluded(&entry.path))
        .filter_map(|entry| {
            detect_language(&entry.path).map(|language| CandidateFile {
                path: entry.path.clone(),
                size: entry.size,
                language: language.to_string(),
                content: None,
            })
        })
        .collect();

    if candidates.is_empty() {
        return Err(ReviewError::NoAnalyzableFiles);
    }

    candidates.sort_by(|a, b| rank(a, b, large_file_threshold));
    candidates.truncate(max_count.min(MAX_FILES));
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    const THRESHOLD: u64 = 32 * 1024;
    const MAX_BYTES: u64 = 100 * 1024;

    fn paths(files: &[CandidateFile]) -> Vec<&str> {
        files.iter().map(|f| f.path.as_str()).collect()
    }

    #[test_case("node_modules/react/index.js")]
    #[test_case("web/dist/app.js")]
    #[test_case(".github/workflows/ci.yml")]
    #[test_case("src/.env.py")]
    #[test_case("tests/fixtures/sample.py")]
    #[test_case("assets/logo.png")]
    #[test_case("Cargo.lock")]
    #[test_case("package-lock.json")]
    #[test_case("static/vendor.min.js")]
    #[test_case("static/app.js.map")]
    fn test_excluded(path: &str) {
        assert!(is_excluded(path));
    }

    #[test_case("src/main.rs")]
    #[test_case("app/models/user.py")]
    #[test_case("Dockerfile")]
    #[test_case("docs/guide.md")]
    #[test_case("internal/env/config.go")]
    #[test_case("cmd/out/main.go")]
    fn test_not_excluded(path: &str) {
        assert!(!is_excluded(path));
    }

    #[test]
    fn test_ranking_order() {
        let entries = vec![
            RepoEntry::new("README.md", 500),
            RepoEntry::new("src/utils/helpers.py", 900),
            RepoEntry::new("src/app.py", 2_000),
            RepoEntry::new("src/zeta.py", 100),
            RepoEntry::new("setup.py", 40 * 1024),
            RepoEntry::new("cli.py", 800),
        ];

        let selected = select(&entries, 30, MAX_BYTES, THRESHOLD).unwrap();

        assert_eq!(
            paths(&selected),
            vec![
                "cli.py",
                "src/app.py",
                "src/zeta.py",
                "src/utils/helpers.py",
                "setup.py",
                "README.md",
            ]
        );
        assert!(selected.iter().all(|f| f.content.is_none()));
        assert_eq!(selected[0].language, "python");
    }

    #[test]
    fn test_oversized_files_are_skipped() {
        let entries = vec![
            RepoEntry::new("big.rs", MAX_BYTES + 1),
            RepoEntry::new("small.rs", 10),
        ];
        let selected = select(&entries, 30, MAX_BYTES, THRESHOLD).unwrap();
        assert_eq!(paths(&selected), vec!["small.rs"]);
    }

    #[test]
    fn test_caps_at_max_files() {
        let entries: Vec<RepoEntry> = (0..45)
            .map(|i| RepoEntry::new(format!("src/file_{:02}.rs", i), 100))
            .collect();

        let selected = select(&entries, 100, MAX_BYTES, THRESHOLD).unwrap();
        assert_eq!(selected.len(), MAX_FILES);
        assert_eq!(selected[0].path, "src/file_00.rs");
        assert_eq!(selected[29].path, "src/file_29.rs");

        let selected = select(&entries, 10, MAX_BYTES, THRESHOLD).unwrap();
        assert_eq!(selected.len(), 10);
    }

    #[test]
    fn test_small_repositories_are_taken_whole() {
        let entries: Vec<RepoEntry> = (0..12)
            .map(|i| RepoEntry::new(format!("pkg/mod_{}.go", i), 100))
            .collect();
        assert_eq!(select(&entries, 30, MAX_BYTES, THRESHOLD).unwrap().len(), 12);
    }

    #[test]
    fn test_nothing_analyzable() {
        let entries = vec![
            RepoEntry::new("logo.png", 100),
            RepoEntry::new("node_modules/x/index.js", 100),
            RepoEntry::new("LICENSE", 100),
        ];
        assert!(matches!(
            select(&entries, 30, MAX_BYTES, THRESHOLD),
            Err(ReviewError::NoAnalyzableFiles)
        ));
        assert!(matches!(
            select(&[], 30, MAX_BYTES, THRESHOLD),
            Err(ReviewError::NoAnalyzableFiles)
        ));
    }
}
