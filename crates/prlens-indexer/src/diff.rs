//! Splitting a unified diff into per-file sections.
//!
//! Understands `git diff` output (`diff --git` headers, new/deleted file
//! modes, renames) and plain `---`/`+++` unified diffs.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Added,
    Deleted,
    Renamed,
    Modified,
}

impl FileStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FileStatus::Added => "added",
            FileStatus::Deleted => "deleted",
            FileStatus::Renamed => "renamed",
            FileStatus::Modified => "modified",
        }
    }
}

/// One file's slice of a diff. `patch` holds the section's raw lines, header included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub filename: String,
    pub old_path: Option<String>,
    pub status: FileStatus,
    pub patch: String,
}

#[derive(Default)]
struct Section {
    old_path: Option<String>,
    new_path: Option<String>,
    status: Option<FileStatus>,
    seen_hunk: bool,
    lines: Vec<String>,
}

impl Section {
    fn from_git_header(rest: &str) -> Self {
        let mut section = Section::default();
        if let Some((old, new)) = rest.split_once(" b/") {
            section.old_path = Some(old.strip_prefix("a/").unwrap_or(old).to_string());
            section.new_path = Some(new.to_string());
        }
        section
    }

    fn finish(self) -> Option<FileDiff> {
        let status = self.status.unwrap_or(FileStatus::Modified);
        let filename = match status {
            FileStatus::Deleted => self.old_path.clone().or(self.new_path),
            _ => self.new_path.or_else(|| self.old_path.clone()),
        }?;
        let old_path = match status {
            FileStatus::Renamed => self.old_path,
            _ => None,
        };
        Some(FileDiff { filename, old_path, status, patch: self.lines.join("\n") })
    }
}

pub fn parse_unified_diff(text: &str) -> Vec<FileDiff> {
    let lines: Vec<&str> = text.lines().collect();
    let mut files = Vec::new();
    let mut current: Option<Section> = None;
    // once a git header shows up, only git headers open sections
    let mut git_format = false;

    for (i, line) in lines.iter().enumerate() {
        if let Some(rest) = line.strip_prefix("diff --git ") {
            git_format = true;
            files.extend(current.take().and_then(Section::finish));
            current = Some(Section::from_git_header(rest));
        } else if !git_format
            && line.starts_with("--- ")
            && lines.get(i + 1).is_some_and(|next| next.starts_with("+++ "))
            && current.as_ref().map_or(true, |s| s.seen_hunk)
        {
            // plain unified diff: each ---/+++ pair after a hunk opens a new file
            files.extend(current.take().and_then(Section::finish));
            current = Some(Section::default());
        }

        let Some(section) = current.as_mut() else { continue };
        section.lines.push((*line).to_string());

        if line.starts_with("@@") {
            section.seen_hunk = true;
        } else if section.seen_hunk {
            continue;
        } else if line.starts_with("new file mode") {
            section.status = Some(FileStatus::Added);
        } else if line.starts_with("deleted file mode") {
            section.status = Some(FileStatus::Deleted);
        } else if let Some(from) = line.strip_prefix("rename from ") {
            section.old_path = Some(from.to_string());
            section.status = Some(FileStatus::Renamed);
        } else if let Some(to) = line.strip_prefix("rename to ") {
            section.new_path = Some(to.to_string());
            section.status = Some(FileStatus::Renamed);
        } else if let Some(old) = line.strip_prefix("--- ") {
            match diff_path(old) {
                Some(p) => section.old_path = Some(p),
                None => section.status = Some(FileStatus::Added),
            }
        } else if let Some(new) = line.strip_prefix("+++ ") {
            match diff_path(new) {
                Some(p) => section.new_path = Some(p),
                None => section.status = Some(FileStatus::Deleted),
            }
        }
    }
    files.extend(current.and_then(Section::finish));
    files
}

/// Path from a `---`/`+++` line; `None` for `/dev/null`.
fn diff_path(raw: &str) -> Option<String> {
    // drop a trailing timestamp (`file\t2024-01-01 ...`)
    let raw = raw.split('\t').next().unwrap_or(raw).trim();
    if raw == "/dev/null" {
        return None;
    }
    let path = raw
        .strip_prefix("a/")
        .or_else(|| raw.strip_prefix("b/"))
        .unwrap_or(raw);
    Some(path.to_string())
}
