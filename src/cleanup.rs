//! Removal of previously downloaded corpus files
//!
//! Only files whose names match [`OLD_DUMP_PATTERN`] are ever considered, and
//! nothing is deleted without a [`Confirm`] implementation agreeing first.

use crate::error::{Error, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info};

/// Glob matching every corpus file this tool produces
pub const OLD_DUMP_PATTERN: &str = "*wiki-*-cirrussearch-content.json.gz";

static OLD_DUMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(&glob_to_regex(OLD_DUMP_PATTERN)).expect("static glob pattern")
});

/// Translate a filename glob (`*`, `?`) into an anchored regex
pub fn glob_to_regex(glob: &str) -> String {
    let mut re = String::with_capacity(glob.len() * 2 + 2);
    re.push('^');
    for c in glob.chars() {
        match c {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            other => re.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    re.push('$');
    re
}

/// Returns true if `name` is a corpus file name
pub fn is_old_dump(name: &str) -> bool {
    OLD_DUMP_RE.is_match(name)
}

/// Asks whether the listed files may be deleted
pub trait Confirm: Send + Sync {
    /// Returns true to proceed with the deletion
    fn confirm(&self, prompt: &str) -> std::io::Result<bool>;
}

/// Confirmation that always agrees (`--yes`)
#[derive(Clone, Copy, Debug, Default)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&self, _prompt: &str) -> std::io::Result<bool> {
        Ok(true)
    }
}

/// Interactive confirmation on the terminal
///
/// Accepts `y` or `yes` in any case; anything else declines.
#[derive(Clone, Copy, Debug, Default)]
pub struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&self, prompt: &str) -> std::io::Result<bool> {
        let term = console::Term::stderr();
        term.write_str(&format!("\n{prompt} (yes/no): "))?;
        let answer = term.read_line()?;
        Ok(is_affirmative(&answer))
    }
}

/// Returns true for `y`/`yes` answers, ignoring case and surrounding blanks
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// What a cleanup run did
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// No matching file existed
    NothingToClean,
    /// The user declined; nothing was deleted
    Cancelled,
    /// These files were deleted
    Removed(Vec<PathBuf>),
}

/// Regular files in `dir` whose names match [`OLD_DUMP_PATTERN`], sorted
pub async fn find_old_dumps(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(is_old_dump);
        if matches {
            found.push(path);
        }
    }

    found.sort();
    debug!(?dir, count = found.len(), "found old dump files");
    Ok(found)
}

/// Delete old corpus files in `dir` after confirmation
///
/// # Errors
/// - [`Error::Io`] if the directory cannot be read or the prompt fails
/// - [`Error::Cleanup`] for the first file that cannot be deleted
pub async fn clean_old_dumps(dir: &Path, confirm: &dyn Confirm) -> Result<CleanupOutcome> {
    let dumps = find_old_dumps(dir).await?;
    if dumps.is_empty() {
        info!("no old dump files found to clean");
        return Ok(CleanupOutcome::NothingToClean);
    }

    info!(count = dumps.len(), "found old dump file(s) to clean");
    for path in &dumps {
        let size = tokio::fs::metadata(path).await.map(|m| m.len()).unwrap_or(0);
        info!(
            "  - {} ({:.1} MB)",
            path.file_name().unwrap_or_default().to_string_lossy(),
            size as f64 / (1024.0 * 1024.0)
        );
    }

    if !confirm.confirm("Delete these files?")? {
        info!("cleanup cancelled");
        return Ok(CleanupOutcome::Cancelled);
    }

    for path in &dumps {
        tokio::fs::remove_file(path)
            .await
            .map_err(|source| Error::Cleanup {
                path: path.clone(),
                source,
            })?;
        info!(?path, "deleted old dump");
    }

    info!("cleanup completed");
    Ok(CleanupOutcome::Removed(dumps))
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    struct Decline;

    impl Confirm for Decline {
        fn confirm(&self, _prompt: &str) -> std::io::Result<bool> {
            Ok(false)
        }
    }

    /// Records whether it was asked at all
    struct Counting(AtomicUsize);

    impl Confirm for Counting {
        fn confirm(&self, _prompt: &str) -> std::io::Result<bool> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        }
    }

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"x").unwrap();
        path
    }

    #[test]
    fn glob_translation_escapes_literals() {
        let re = Regex::new(&glob_to_regex("*wiki-*.json.gz")).unwrap();

        assert!(re.is_match("enwiki-1.json.gz"));
        assert!(!re.is_match("enwiki-1xjsonxgz"));
        assert_eq!(glob_to_regex("a?c"), "^a.c$");
    }

    #[test]
    fn matches_only_corpus_names() {
        assert!(is_old_dump("enwiki-20240101-cirrussearch-content.json.gz"));
        assert!(is_old_dump("simplewiki-20231201-cirrussearch-content.json.gz"));
        assert!(is_old_dump("wiki--cirrussearch-content.json.gz"));

        assert!(!is_old_dump("enwiki-20240101-cirrussearch-content.json"));
        assert!(!is_old_dump("enwiki-20240101-cirrussearch-general.json.gz"));
        assert!(!is_old_dump("enwiki-20240101-cirrussearch-content.json.gz.bak"));
        assert!(!is_old_dump("enwiki-20240101-cirrussearch-contentXjsonXgz"));
        assert!(!is_old_dump("notes.txt"));
    }

    #[test]
    fn affirmative_answers() {
        assert!(is_affirmative("yes\n"));
        assert!(is_affirmative("  Y "));
        assert!(!is_affirmative("no"));
        assert!(!is_affirmative(""));
        assert!(!is_affirmative("yep"));
    }

    #[tokio::test]
    async fn removes_only_matching_files() {
        let dir = tempdir().unwrap();
        let old = touch(dir.path(), "enwiki-20240101-cirrussearch-content.json.gz");
        let keep = touch(dir.path(), "enwiki-20240101-pages-articles.xml.bz2");
        std::fs::create_dir(dir.path().join("dewiki-20240101-cirrussearch-content.json.gz"))
            .unwrap();

        let outcome = clean_old_dumps(dir.path(), &AssumeYes).await.unwrap();

        assert_eq!(outcome, CleanupOutcome::Removed(vec![old.clone()]));
        assert!(!old.exists());
        assert!(keep.exists());
    }

    #[tokio::test]
    async fn declined_confirmation_keeps_files() {
        let dir = tempdir().unwrap();
        let old = touch(dir.path(), "frwiki-20240101-cirrussearch-content.json.gz");

        let outcome = clean_old_dumps(dir.path(), &Decline).await.unwrap();

        assert_eq!(outcome, CleanupOutcome::Cancelled);
        assert!(old.exists());
    }

    #[tokio::test]
    async fn nothing_to_clean_does_not_prompt() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "readme.md");
        let confirm = Counting(AtomicUsize::new(0));

        let outcome = clean_old_dumps(dir.path(), &confirm).await.unwrap();

        assert_eq!(outcome, CleanupOutcome::NothingToClean);
        assert_eq!(confirm.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_directory_is_io_error() {
        let dir = tempdir().unwrap();

        let result = clean_old_dumps(&dir.path().join("absent"), &AssumeYes).await;

        assert!(matches!(result, Err(Error::Io(_))));
    }
}
