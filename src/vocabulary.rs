//! Genre and tag name pools offered when editing products.

use crate::activity_log::ActivityLog;
use crate::codec::StringListFile;
use std::path::PathBuf;

pub struct Vocabulary {
    genres: StringListFile,
    tags: StringListFile,
}

impl Vocabulary {
    pub fn open(genres: impl Into<PathBuf>, tags: impl Into<PathBuf>, log: ActivityLog) -> Self {
        Self {
            genres: StringListFile::new(genres, log.clone()),
            tags: StringListFile::new(tags, log),
        }
    }

    pub fn genres(&self) -> Vec<String> {
        self.genres.load()
    }

    pub fn tags(&self) -> Vec<String> {
        self.tags.load()
    }

    pub fn add_genre(&self, name: &str) -> bool {
        add_unique(&self.genres, name)
    }

    pub fn add_tag(&self, name: &str) -> bool {
        add_unique(&self.tags, name)
    }

    pub fn remove_genre(&self, name: &str) -> bool {
        remove_present(&self.genres, name)
    }

    pub fn remove_tag(&self, name: &str) -> bool {
        remove_present(&self.tags, name)
    }
}

fn add_unique(file: &StringListFile, name: &str) -> bool {
    let name = name.trim();
    if name.is_empty() || file.load().iter().any(|n| n == name) {
        return false;
    }
    file.append(name)
}

fn remove_present(file: &StringListFile, name: &str) -> bool {
    let mut names = file.load();
    let before = names.len();
    names.retain(|n| n != name);
    names.len() != before && file.save(&names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open(dir: &TempDir) -> Vocabulary {
        Vocabulary::open(
            dir.path().join("genres.dat"),
            dir.path().join("tags.dat"),
            ActivityLog::silent(),
        )
    }

    #[test]
    fn test_add_and_remove_genres() {
        let dir = TempDir::new().unwrap();
        let vocab = open(&dir);

        assert!(vocab.add_genre("RPG"));
        assert!(vocab.add_genre(" Strategy "));
        assert!(!vocab.add_genre("RPG"));
        assert!(!vocab.add_genre("  "));
        assert_eq!(vocab.genres(), vec!["RPG", "Strategy"]);

        assert!(vocab.remove_genre("RPG"));
        assert!(!vocab.remove_genre("RPG"));
        assert_eq!(vocab.genres(), vec!["Strategy"]);
    }

    #[test]
    fn test_tags_are_separate_pool() {
        let dir = TempDir::new().unwrap();
        let vocab = open(&dir);

        assert!(vocab.add_tag("Indie"));
        assert!(vocab.genres().is_empty());
        assert_eq!(open(&dir).tags(), vec!["Indie"]);
        assert!(vocab.remove_tag("Indie"));
        assert!(vocab.tags().is_empty());
    }
}
