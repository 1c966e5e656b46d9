// GitLab API Documentation: https://docs.gitlab.com/ee/api/repositories.html
use compact_str::CompactString;
use serde::Deserialize;

use crate::id::ProjectId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    /// A gitlink; the tree only records the pinned commit
    Submodule,
}

/// One immediate child of a directory at a given revision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileListingEntry {
    pub kind: EntryKind,
    /// Repository-relative path
    pub path: CompactString,
    /// Last path segment
    pub name: CompactString,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Renamed,
    Deleted,
}

/// A file touched by a comparison or a merge request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedFile {
    pub kind: ChangeKind,
    /// The new path, or the removed path for deletions
    pub path: CompactString,
    /// Only set for renames
    pub previous_path: Option<CompactString>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectDto {
    pub id: ProjectId,
    pub path_with_namespace: CompactString,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeEntryType {
    Blob,
    Tree,
    Commit,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TreeEntryDto {
    pub name: CompactString,
    #[serde(rename = "type")]
    pub kind: TreeEntryType,
    pub path: CompactString,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileEncoding {
    Base64,
    Text,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileContentDto {
    pub file_path: CompactString,
    pub encoding: FileEncoding,
    pub content: String,
    #[serde(rename = "ref")]
    pub git_ref: Option<CompactString>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiffDto {
    #[serde(default)]
    pub old_path: CompactString,
    #[serde(default)]
    pub new_path: CompactString,
    #[serde(default)]
    pub new_file: bool,
    #[serde(default)]
    pub renamed_file: bool,
    #[serde(default)]
    pub deleted_file: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompareDto {
    #[serde(default)]
    pub diffs: Vec<DiffDto>,
    /// Set when GitLab gave up computing the full comparison
    #[serde(default)]
    pub compare_timeout: bool,
    #[serde(default)]
    pub compare_same_ref: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MergeRequestChangesDto {
    #[serde(default)]
    pub changes: Vec<DiffDto>,
    /// Set when GitLab truncated the change list
    #[serde(default)]
    pub overflow: bool,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Dir => "dir",
            EntryKind::Submodule => "submodule",
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ChangeKind {
    /// Single-letter status as printed by `git diff --name-status`
    pub fn code(&self) -> char {
        match self {
            ChangeKind::Added => 'A',
            ChangeKind::Modified => 'M',
            ChangeKind::Renamed => 'R',
            ChangeKind::Deleted => 'D',
        }
    }
}

impl FileListingEntry {
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }
}

impl From<TreeEntryType> for EntryKind {
    fn from(t: TreeEntryType) -> Self {
        match t {
            TreeEntryType::Blob => EntryKind::File,
            TreeEntryType::Tree => EntryKind::Dir,
            TreeEntryType::Commit => EntryKind::Submodule,
        }
    }
}

impl From<TreeEntryDto> for FileListingEntry {
    fn from(e: TreeEntryDto) -> Self {
        Self {
            kind: e.kind.into(),
            path: e.path,
            name: e.name,
        }
    }
}

impl From<DiffDto> for ChangedFile {
    fn from(d: DiffDto) -> Self {
        let moved = !d.old_path.is_empty() && !d.new_path.is_empty() && d.old_path != d.new_path;

        let kind = if d.new_file {
            ChangeKind::Added
        } else if d.deleted_file {
            ChangeKind::Deleted
        } else if d.renamed_file || moved {
            ChangeKind::Renamed
        } else {
            ChangeKind::Modified
        };

        let (path, previous_path) = match kind {
            ChangeKind::Deleted if !d.old_path.is_empty() => (d.old_path, None),
            ChangeKind::Renamed => (d.new_path, Some(d.old_path)),
            _ if d.new_path.is_empty() => (d.old_path, None),
            _ => (d.new_path, None),
        };

        Self { kind, path, previous_path }
    }
}
