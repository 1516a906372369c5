// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File(Vec<u8>),
    Dir(Vec<String>), // List of child names
}

#[derive(Debug, Clone)]
struct MockNode {
    entry: MockEntry,
    modified: SystemTime,
}

/// In-memory filesystem with a logical clock.
///
/// Every mutation (`add_file`, `add_dir`, `touch`) stamps the entry with the
/// next clock tick, so later mutations are always strictly newer. Paths are
/// normalised by dropping `.` components, so `./venv` and `venv` are the same
/// entry.
#[derive(Debug, Clone)]
pub struct MockFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, MockNode>>>,
    clock: Arc<Mutex<u64>>,
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(path: &Path) -> PathBuf {
    let out: PathBuf = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    if out.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        out
    }
}

fn parent_of(path: &Path) -> Option<PathBuf> {
    if path == Path::new(".") {
        return None;
    }
    match path.parent() {
        Some(p) if p.as_os_str().is_empty() => Some(PathBuf::from(".")),
        Some(p) => Some(p.to_path_buf()),
        None => None,
    }
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut files = HashMap::new();
        // Ensure root exists
        files.insert(
            PathBuf::from("."),
            MockNode {
                entry: MockEntry::Dir(Vec::new()),
                modified: SystemTime::UNIX_EPOCH,
            },
        );

        Self {
            files: Arc::new(Mutex::new(files)),
            clock: Arc::new(Mutex::new(0)),
        }
    }

    fn tick(&self) -> SystemTime {
        let mut clock = self.clock.lock().unwrap();
        *clock += 1;
        SystemTime::UNIX_EPOCH + Duration::from_secs(*clock)
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = normalize(path.as_ref());
        let now = self.tick();
        let mut files = self.files.lock().unwrap();
        files.insert(
            path.clone(),
            MockNode {
                entry: MockEntry::File(content.into()),
                modified: now,
            },
        );
        Self::link_into_parent(&mut files, &path, now);
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = normalize(path.as_ref());
        let now = self.tick();
        let mut files = self.files.lock().unwrap();
        match files.get_mut(&path) {
            Some(node) => node.modified = now,
            None => {
                files.insert(
                    path.clone(),
                    MockNode {
                        entry: MockEntry::Dir(Vec::new()),
                        modified: now,
                    },
                );
            }
        }
        Self::link_into_parent(&mut files, &path, now);
    }

    /// Bump the modification time of `path`, creating an empty file if it
    /// does not exist yet (like `touch`).
    pub fn touch(&self, path: impl AsRef<Path>) {
        let path = normalize(path.as_ref());
        let exists = self.files.lock().unwrap().contains_key(&path);
        if exists {
            let now = self.tick();
            if let Some(node) = self.files.lock().unwrap().get_mut(&path) {
                node.modified = now;
            }
        } else {
            self.add_file(&path, Vec::new());
        }
    }

    /// Remove a file or a whole directory tree (like `rm -rf`).
    pub fn remove(&self, path: impl AsRef<Path>) {
        let path = normalize(path.as_ref());
        let mut files = self.files.lock().unwrap();
        files.retain(|p, _| !p.starts_with(&path));
        if let Some(parent) = parent_of(&path) {
            if let Some(MockNode {
                entry: MockEntry::Dir(children),
                ..
            }) = files.get_mut(&parent)
            {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    children.retain(|c| c != name);
                }
            }
        }
    }

    // Ensure parent directories exist and list `path` as a child.
    fn link_into_parent(files: &mut HashMap<PathBuf, MockNode>, path: &Path, now: SystemTime) {
        let Some(parent) = parent_of(path) else {
            return;
        };

        if !files.contains_key(&parent) {
            files.insert(
                parent.clone(),
                MockNode {
                    entry: MockEntry::Dir(Vec::new()),
                    modified: now,
                },
            );
            Self::link_into_parent(files, &parent, now);
        }

        if let Some(MockNode {
            entry: MockEntry::Dir(children),
            ..
        }) = files.get_mut(&parent)
        {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if !children.contains(&name.to_string()) {
                    children.push(name.to_string());
                }
            }
        }
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let files = self.files.lock().unwrap();
        match files.get(&normalize(path)).map(|n| &n.entry) {
            Some(MockEntry::File(content)) => {
                String::from_utf8(content.clone()).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
            }
            Some(MockEntry::Dir(_)) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        let files = self.files.lock().unwrap();
        files.contains_key(&normalize(path))
    }

    fn is_file(&self, path: &Path) -> bool {
        let files = self.files.lock().unwrap();
        matches!(
            files.get(&normalize(path)).map(|n| &n.entry),
            Some(MockEntry::File(_))
        )
    }

    fn is_dir(&self, path: &Path) -> bool {
        let files = self.files.lock().unwrap();
        matches!(
            files.get(&normalize(path)).map(|n| &n.entry),
            Some(MockEntry::Dir(_))
        )
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let files = self.files.lock().unwrap();
        match files.get(&normalize(path)).map(|n| &n.entry) {
            Some(MockEntry::Dir(children)) => {
                Ok(children.iter().map(|name| path.join(name)).collect())
            }
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }

    fn modified(&self, path: &Path) -> Option<SystemTime> {
        let files = self.files.lock().unwrap();
        files.get(&normalize(path)).map(|n| n.modified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_mutations_are_newer() {
        let fs = MockFileSystem::new();
        fs.add_file("requirements.txt", "black\n");
        fs.add_dir("venv");

        let req = fs.modified(Path::new("requirements.txt")).unwrap();
        let venv = fs.modified(Path::new("./venv")).unwrap();
        assert!(venv > req);

        fs.touch("requirements.txt");
        assert!(fs.modified(Path::new("requirements.txt")).unwrap() > venv);
    }

    #[test]
    fn remove_drops_whole_tree() {
        let fs = MockFileSystem::new();
        fs.add_file("venv/bin/python", "");
        fs.add_file("output/report.html", "");

        fs.remove("venv");

        assert!(!fs.exists(Path::new("venv")));
        assert!(!fs.exists(Path::new("venv/bin/python")));
        assert!(fs.exists(Path::new("output/report.html")));
        let root: Vec<PathBuf> = fs.read_dir(Path::new(".")).unwrap();
        assert_eq!(root, vec![PathBuf::from("./output")]);
    }
}
