use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};

use anyhow::{ensure, Result};
use rand::seq::SliceRandom;
use walkdir::WalkDir;

/// The fixed directory of selectable GIFs. Listings are re-scanned on every
/// call so the menu, slideshow and text commands always see the directory as
/// it is right now.
pub struct FileCatalog {
    dir: PathBuf,
}

impl FileCatalog {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn resolve(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Resolve `name` inside the catalog directory, failing with an error
    /// that names the file when it does not exist.
    pub fn resolve_existing(&self, name: &str) -> Result<PathBuf> {
        let path = self.resolve(name);
        ensure!(
            path.is_file(),
            "'{}' not found in {}",
            name,
            self.dir.display()
        );
        Ok(path)
    }

    /// All `.gif` file names in the directory, name-sorted. Non-GIF entries
    /// and subdirectories are skipped.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| entry.file_name().to_str().map(str::to_owned))
            .filter(|name| is_gif_name(name))
            .collect();
        names.sort();
        names
    }

    /// The file after `current` in listing order, wrapping at the end. A
    /// `current` that is no longer listed (or none at all) yields the first
    /// entry; an empty directory yields `None`.
    pub fn next_after(&self, current: Option<&Path>) -> Option<PathBuf> {
        let names = self.list();
        if names.is_empty() {
            return None;
        }
        let current_name = current.and_then(Path::file_name).and_then(OsStr::to_str);
        let idx = match current_name.and_then(|n| names.iter().position(|m| m == n)) {
            Some(i) => (i + 1) % names.len(),
            None => 0,
        };
        Some(self.resolve(&names[idx]))
    }

    pub fn random(&self) -> Option<PathBuf> {
        let names = self.list();
        names
            .choose(&mut rand::thread_rng())
            .map(|name| self.resolve(name))
    }
}

fn is_gif_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(OsStr::to_str)
        .map(|ext| ext.eq_ignore_ascii_case("gif"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn catalog_with(files: &[&str]) -> (TempDir, FileCatalog) {
        let tmp = TempDir::new().unwrap();
        for f in files {
            fs::write(tmp.path().join(f), b"GIF89a").unwrap();
        }
        let catalog = FileCatalog::new(tmp.path().to_path_buf());
        (tmp, catalog)
    }

    #[test]
    fn lists_exactly_the_gif_entries() {
        let (_tmp, cat) = catalog_with(&["b.gif", "a.gif", "notes.txt", "c.png", "LOUD.GIF"]);
        let names = cat.list();
        assert_eq!(names, vec!["LOUD.GIF", "a.gif", "b.gif"]);
    }

    #[test]
    fn listing_skips_subdirectories() {
        let (tmp, cat) = catalog_with(&["a.gif"]);
        fs::create_dir(tmp.path().join("nested.gif")).unwrap();
        fs::write(tmp.path().join("nested.gif").join("b.gif"), b"GIF89a").unwrap();
        assert_eq!(cat.list(), vec!["a.gif"]);
    }

    #[test]
    fn next_advances_and_wraps() {
        let (_tmp, cat) = catalog_with(&["a.gif", "b.gif"]);
        let from_a = cat.next_after(Some(&cat.resolve("a.gif"))).unwrap();
        assert_eq!(from_a.file_name().unwrap(), "b.gif");
        let from_b = cat.next_after(Some(&from_a)).unwrap();
        assert_eq!(from_b.file_name().unwrap(), "a.gif");
    }

    #[test]
    fn next_without_current_starts_at_first() {
        let (_tmp, cat) = catalog_with(&["b.gif", "a.gif"]);
        let first = cat.next_after(None).unwrap();
        assert_eq!(first.file_name().unwrap(), "a.gif");
        // a vanished current behaves the same way
        let gone = cat.resolve("gone.gif");
        assert_eq!(cat.next_after(Some(&gone)).unwrap().file_name().unwrap(), "a.gif");
    }

    #[test]
    fn next_in_empty_directory_is_none() {
        let (_tmp, cat) = catalog_with(&[]);
        assert_eq!(cat.next_after(None), None);
        assert_eq!(cat.random(), None);
    }

    #[test]
    fn random_picks_a_listed_gif() {
        let (_tmp, cat) = catalog_with(&["a.gif", "b.gif", "c.gif"]);
        for _ in 0..16 {
            let pick = cat.random().unwrap();
            let name = pick.file_name().unwrap().to_str().unwrap();
            assert!(["a.gif", "b.gif", "c.gif"].contains(&name));
        }
    }

    #[test]
    fn resolve_existing_error_names_the_file() {
        let (_tmp, cat) = catalog_with(&["a.gif"]);
        assert!(cat.resolve_existing("a.gif").is_ok());
        let err = cat.resolve_existing("missing.gif").unwrap_err();
        assert!(err.to_string().contains("missing.gif"));
    }
}
