use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::errors::HarnessError;

/// Finds the fixture files a batch runs over.
#[derive(Debug)]
pub struct FixtureDiscoverer;

impl FixtureDiscoverer {
    /// Lists the regular files directly inside `root` whose name ends in
    /// `.extension` (given without the dot). Subdirectories are not entered,
    /// and entries that cannot be inspected, such as dangling symlinks, are
    /// skipped with a warning.
    ///
    /// The returned list is sorted to ensure deterministic execution order.
    pub fn discover_fixture_files<P: AsRef<Path>>(
        root: P,
        extension: &str,
    ) -> Result<Vec<PathBuf>, HarnessError> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(HarnessError::MissingFixtureDir {
                path: root.to_path_buf(),
            });
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(source) if source.depth() == 0 => {
                    return Err(HarnessError::Discovery {
                        path: root.to_path_buf(),
                        source,
                    })
                }
                Err(err) => {
                    warn!(dir = %root.display(), error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if !Self::has_extension(path, extension) {
                continue;
            }
            files.push(path.to_path_buf());
        }
        files.sort();
        debug!(dir = %root.display(), count = files.len(), "discovered fixtures");
        Ok(files)
    }

    /// Suffix match on the file name, so a file named just `.prp` counts.
    fn has_extension(path: &Path, extension: &str) -> bool {
        let suffix = format!(".{extension}");
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(&suffix))
    }
}
