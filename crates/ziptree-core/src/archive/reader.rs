//! ZIP session exposing the archive as a navigable tree

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use chrono::NaiveDate;
use tracing::debug;
use zip::ZipArchive;

use super::{ArchiveEntry, EntryKind};
use crate::{Error, Result};

/// Open session over a ZIP archive.
///
/// ZIP stores a flat list of names; the session indexes it into a tree at
/// open time, synthesizing parent directories that file paths imply but the
/// archive never lists. The underlying file handle is released when the
/// session is dropped, on every exit path.
pub struct ArchiveSession {
    archive: ZipArchive<File>,
    source: PathBuf,
    nodes: Vec<Node>,
    lookup: HashMap<PathBuf, usize>,
}

struct Node {
    entry: ArchiveEntry,
    children: Vec<usize>,
}

/// Metadata harvested from one raw archive entry before tree insertion
struct RawEntry {
    segments: Vec<String>,
    is_dir: bool,
    size: u64,
    index: usize,
    mtime: Option<i64>,
    mode: Option<u32>,
}

impl ArchiveSession {
    /// Open `source` and index its tree
    pub fn open<P: AsRef<Path>>(source: P) -> Result<Self> {
        let source = source.as_ref();

        let file = File::open(source).map_err(|error| Error::Open {
            path: source.to_path_buf(),
            reason: error.to_string(),
        })?;
        let mut archive = ZipArchive::new(file).map_err(|error| Error::Open {
            path: source.to_path_buf(),
            reason: error.to_string(),
        })?;

        let root = Node {
            entry: ArchiveEntry {
                path: PathBuf::new(),
                name: String::new(),
                kind: EntryKind::Directory,
                mtime: None,
                mode: None,
            },
            children: Vec::new(),
        };
        let mut nodes = vec![root];
        let mut lookup = HashMap::new();
        lookup.insert(PathBuf::new(), 0);

        for index in 0..archive.len() {
            let raw = {
                let entry = archive.by_index(index).map_err(|error| Error::Open {
                    path: source.to_path_buf(),
                    reason: format!("entry #{}: {}", index, error),
                })?;

                let segments = entry_segments(entry.name()).map_err(|reason| Error::Open {
                    path: source.to_path_buf(),
                    reason,
                })?;

                RawEntry {
                    segments,
                    is_dir: entry.is_dir(),
                    size: entry.size(),
                    index,
                    mtime: entry.last_modified().and_then(dos_datetime_to_unix),
                    mode: entry.unix_mode(),
                }
            };

            insert(&mut nodes, &mut lookup, raw)?;
        }

        debug!(source = ?source, entries = nodes.len() - 1, "Indexed archive tree");

        Ok(Self {
            archive,
            source: source.to_path_buf(),
            nodes,
            lookup,
        })
    }

    /// Path of the archive backing this session
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Root entries in archive-defined order.
    ///
    /// A ZIP exposes exactly one virtual root; an empty archive still yields
    /// it, with an empty listing, so extracting it is a no-op.
    pub fn root_entries(&self) -> Vec<ArchiveEntry> {
        vec![self.nodes[0].entry.clone()]
    }

    /// Children of a directory entry, in the order the archive yields them
    /// (central-directory insertion order, not sorted)
    pub fn list_children(&self, entry: &ArchiveEntry) -> Result<Vec<ArchiveEntry>> {
        if !entry.is_dir() {
            return Err(Error::Read {
                path: entry.path.clone(),
                reason: "not a directory".to_string(),
            });
        }
        let node = self.resolve(&entry.path)?;
        Ok(self.nodes[node]
            .children
            .iter()
            .map(|&child| self.nodes[child].entry.clone())
            .collect())
    }

    /// Decompressing content stream for a file entry
    pub fn open_content(&mut self, entry: &ArchiveEntry) -> Result<impl Read + '_> {
        let EntryKind::File { index, .. } = entry.kind else {
            return Err(Error::Read {
                path: entry.path.clone(),
                reason: "not a file".to_string(),
            });
        };
        self.archive.by_index(index).map_err(|error| Error::Read {
            path: entry.path.clone(),
            reason: error.to_string(),
        })
    }

    fn resolve(&self, path: &Path) -> Result<usize> {
        self.lookup.get(path).copied().ok_or_else(|| Error::Read {
            path: path.to_path_buf(),
            reason: "entry does not resolve in this archive".to_string(),
        })
    }
}

/// Insert one raw entry into the tree, synthesizing implied parents
fn insert(
    nodes: &mut Vec<Node>,
    lookup: &mut HashMap<PathBuf, usize>,
    raw: RawEntry,
) -> Result<()> {
    let mut current = 0usize;
    let mut path = PathBuf::new();

    for (position, segment) in raw.segments.iter().enumerate() {
        let is_last = position + 1 == raw.segments.len();
        path.push(segment);

        // Every non-final segment must be a directory
        let needs_dir = !is_last || raw.is_dir;

        if let Some(&existing) = lookup.get(&path) {
            let node = &mut nodes[existing];
            match (&node.entry.kind, needs_dir) {
                (EntryKind::File { .. }, true) | (EntryKind::Directory, false) => {
                    return Err(Error::DirectoryCreate {
                        path: path.clone(),
                        reason: "archive lists both a file and a directory at this path"
                            .to_string(),
                    });
                }
                (EntryKind::Directory, true) => {
                    if is_last {
                        // explicit entry for a previously implied directory
                        node.entry.mtime = raw.mtime;
                        node.entry.mode = raw.mode;
                    }
                }
                (EntryKind::File { .. }, false) => {
                    // duplicate file path: the later entry wins
                    node.entry.kind = EntryKind::File {
                        size: raw.size,
                        index: raw.index,
                    };
                    node.entry.mtime = raw.mtime;
                    node.entry.mode = raw.mode;
                }
            }
            current = existing;
        } else {
            let entry = if needs_dir {
                ArchiveEntry {
                    path: path.clone(),
                    name: segment.clone(),
                    kind: EntryKind::Directory,
                    mtime: if is_last { raw.mtime } else { None },
                    mode: if is_last { raw.mode } else { None },
                }
            } else {
                ArchiveEntry {
                    path: path.clone(),
                    name: segment.clone(),
                    kind: EntryKind::File {
                        size: raw.size,
                        index: raw.index,
                    },
                    mtime: raw.mtime,
                    mode: raw.mode,
                }
            };
            nodes.push(Node {
                entry,
                children: Vec::new(),
            });
            let id = nodes.len() - 1;
            nodes[current].children.push(id);
            lookup.insert(path.clone(), id);
            current = id;
        }
    }

    Ok(())
}

/// Split a raw entry name into safe relative segments.
///
/// Rejects names that would land outside the extraction root: absolute
/// paths, parent-directory components, and Windows drive prefixes.
fn entry_segments(name: &str) -> std::result::Result<Vec<String>, String> {
    let mut segments = Vec::new();

    for component in Path::new(name).components() {
        match component {
            Component::Normal(segment) => segments.push(segment.to_string_lossy().into_owned()),
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(format!(
                    "entry path {:?} contains a parent directory component",
                    name
                ));
            }
            Component::RootDir => {
                return Err(format!("entry path {:?} is absolute", name));
            }
            Component::Prefix(_) => {
                return Err(format!("entry path {:?} contains a Windows prefix", name));
            }
        }
    }

    if segments.is_empty() {
        return Err(format!("entry path {:?} is empty", name));
    }

    Ok(segments)
}

/// Convert the archive's DOS-style timestamp to a Unix timestamp
fn dos_datetime_to_unix(datetime: zip::DateTime) -> Option<i64> {
    let date = NaiveDate::from_ymd_opt(
        i32::from(datetime.year()),
        u32::from(datetime.month()),
        u32::from(datetime.day()),
    )?;
    let timestamp = date.and_hms_opt(
        u32::from(datetime.hour()),
        u32::from(datetime.minute()),
        u32::from(datetime.second()),
    )?;
    Some(timestamp.and_utc().timestamp())
}
