//! Config file discovery
//!
//! `.gh-deploy-board.toml` is looked up in the working directory first and
//! then in the home directory. The first readable file wins; there is no
//! merging between the two.

use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = ".gh-deploy-board.toml";

/// Load config file content from CWD first, then home directory
///
/// Returns the file content if found, None otherwise.
pub fn load_config_file() -> Option<String> {
    let home = dirs::home_dir();
    read_first(&search_paths(Path::new("."), home.as_deref()))
}

/// Candidate config file locations, in lookup order
fn search_paths(cwd: &Path, home: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = vec![cwd.join(CONFIG_FILE)];
    if let Some(home) = home {
        paths.push(home.join(CONFIG_FILE));
    }
    paths
}

fn read_first(paths: &[PathBuf]) -> Option<String> {
    paths.iter().find_map(|path| match fs::read_to_string(path) {
        Ok(content) => {
            log::debug!("Loaded config from {}", path.display());
            Some(content)
        }
        Err(_) => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_paths_prefer_working_directory() {
        let paths = search_paths(Path::new("/work"), Some(Path::new("/home/octocat")));
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/work/.gh-deploy-board.toml"),
                PathBuf::from("/home/octocat/.gh-deploy-board.toml"),
            ]
        );

        assert_eq!(search_paths(Path::new("/work"), None).len(), 1);
    }

    #[test]
    fn test_read_first_skips_missing_files() {
        let cwd = tempfile::tempdir().unwrap();
        let home = tempfile::tempdir().unwrap();
        fs::write(home.path().join(CONFIG_FILE), "session = \"home\"\n").unwrap();

        let paths = search_paths(cwd.path(), Some(home.path()));
        assert_eq!(read_first(&paths).as_deref(), Some("session = \"home\"\n"));

        fs::write(cwd.path().join(CONFIG_FILE), "session = \"cwd\"\n").unwrap();
        assert_eq!(read_first(&paths).as_deref(), Some("session = \"cwd\"\n"));
    }

    #[test]
    fn test_no_config_file_found() {
        let empty = tempfile::tempdir().unwrap();
        assert!(read_first(&search_paths(empty.path(), None)).is_none());
    }
}
