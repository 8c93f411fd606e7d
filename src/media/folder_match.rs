//! Matching survey records to photo folders.
//!
//! Folder names follow the field team's convention, roughly
//! `<site id>-<region>_<governorate>`, typed by hand. Names and record text
//! are reduced to token sets and compared; a folder is a candidate only when
//! it contains every region and governorate token.

use regex::Regex;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

/// Literal fixes for misspellings seen in folder names and sheet text.
/// Applied in order, after lowercasing.
const CORRECTIONS: [(&str, &str); 3] = [
    ("eastren", "eastern"),
    ("strubarry", "strawberry"),
    ("aljandal", "al jandal"),
];

static LEADING_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+\s*[-_]\s*").expect("valid prefix regex"));
static ARTICLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bal\b").expect("valid article regex"));
static NON_ALNUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("valid separator regex"));
static NUMERIC_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([0-9]+)\s*[-_]").expect("valid numeric prefix regex"));

/// Token set of a folder name or record field.
pub fn tokenize(raw: &str) -> BTreeSet<String> {
    let mut s = raw.to_lowercase();
    for (wrong, right) in CORRECTIONS {
        s = s.replace(wrong, right);
    }
    let s = LEADING_NUMBER_RE.replace(&s, "");
    let s = ARTICLE_RE.replace_all(&s, " ");
    let s = NON_ALNUM_RE.replace_all(&s, " ");
    s.split_whitespace().map(str::to_string).collect()
}

/// Leading site id of a folder name such as `12-eastern_jandal`.
pub fn numeric_prefix(name: &str) -> Option<i64> {
    NUMERIC_PREFIX_RE
        .captures(name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<i64>().ok())
}

/// A direct subdirectory of the images base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFolder {
    pub name: String,
    pub path: PathBuf,
    pub tokens: BTreeSet<String>,
    pub numeric_prefix: Option<i64>,
}

impl CandidateFolder {
    pub fn new(name: impl Into<String>, path: PathBuf) -> Self {
        let name = name.into();
        Self {
            tokens: tokenize(&name),
            numeric_prefix: numeric_prefix(&name),
            name,
            path,
        }
    }
}

/// Snapshot of the images base directory, scanned once per run.
#[derive(Debug, Clone, Default)]
pub struct FolderIndex {
    folders: Vec<CandidateFolder>,
}

impl FolderIndex {
    pub fn scan(base: &Path) -> io::Result<Self> {
        let mut folders = Vec::new();
        for entry in fs::read_dir(base)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            folders.push(CandidateFolder::new(name, path));
        }
        debug!(base = %base.display(), folders = folders.len(), "scanned image folders");
        Ok(Self { folders })
    }

    pub fn from_folders(folders: Vec<CandidateFolder>) -> Self {
        Self { folders }
    }

    pub fn len(&self) -> usize {
        self.folders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }

    /// Best folder for a record, or `None`.
    ///
    /// Folders whose numeric prefix equals `site_id` win outright; within the
    /// chosen group the highest token overlap wins, then the smaller name.
    pub fn best_match(
        &self,
        region: &str,
        governorate: &str,
        site_id: i64,
    ) -> Option<&CandidateFolder> {
        let wanted: BTreeSet<String> = tokenize(region)
            .into_iter()
            .chain(tokenize(governorate))
            .collect();

        let scored: Vec<(&CandidateFolder, usize)> = self
            .folders
            .iter()
            .filter(|f| wanted.is_subset(&f.tokens))
            .map(|f| (f, wanted.intersection(&f.tokens).count()))
            .collect();

        let exact: Vec<_> = scored
            .iter()
            .copied()
            .filter(|(f, _)| f.numeric_prefix == Some(site_id))
            .collect();
        if !exact.is_empty() {
            return pick_best(exact);
        }
        pick_best(scored)
    }
}

/// Highest score first, then the lexicographically smaller name.
fn pick_best<'f>(
    group: impl IntoIterator<Item = (&'f CandidateFolder, usize)>,
) -> Option<&'f CandidateFolder> {
    group
        .into_iter()
        .min_by(|(a, sa), (b, sb)| sb.cmp(sa).then_with(|| a.name.cmp(&b.name)))
        .map(|(f, _)| f)
}
