//! Genre and tag pools. Listing is open; changes need an administrator.

use crate::commands::{require_admin, Login};
use crate::format::Formatter;
use crate::shop::Shop;
use anyhow::Result;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pool {
    Genres,
    Tags,
}

impl FromStr for Pool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "genre" | "genres" => Ok(Pool::Genres),
            "tag" | "tags" => Ok(Pool::Tags),
            _ => Err(format!("Unknown list: {}. Use: genre, tag", s)),
        }
    }
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pool::Genres => write!(f, "genre"),
            Pool::Tags => write!(f, "tag"),
        }
    }
}

pub struct VocabCommand<'a> {
    shop: &'a Shop,
    formatter: Formatter,
}

impl<'a> VocabCommand<'a> {
    pub fn new(shop: &'a Shop, formatter: Formatter) -> Self {
        Self { shop, formatter }
    }

    pub fn list(&self, pool: Pool) -> Result<String> {
        let vocabulary = self.shop.vocabulary();
        Ok(match pool {
            Pool::Genres => self.formatter.format_names("Genres", &vocabulary.genres()),
            Pool::Tags => self.formatter.format_names("Tags", &vocabulary.tags()),
        })
    }

    pub fn add(&self, login: &Login, pool: Pool, name: &str) -> Result<String> {
        require_admin(self.shop, login)?;
        let vocabulary = self.shop.vocabulary();
        let added = match pool {
            Pool::Genres => vocabulary.add_genre(name),
            Pool::Tags => vocabulary.add_tag(name),
        };
        if !added {
            anyhow::bail!("Could not add {} '{}': empty or already present", pool, name.trim());
        }
        Ok(format!("Added {} '{}'.", pool, name.trim()))
    }

    pub fn remove(&self, login: &Login, pool: Pool, name: &str) -> Result<String> {
        require_admin(self.shop, login)?;
        let vocabulary = self.shop.vocabulary();
        let removed = match pool {
            Pool::Genres => vocabulary.remove_genre(name),
            Pool::Tags => vocabulary.remove_tag(name),
        };
        if !removed {
            anyhow::bail!("No {} named '{}'", pool, name);
        }
        Ok(format!("Removed {} '{}'.", pool, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{admin, customer, TestShop};
    use crate::config::OutputFormat;

    #[test]
    fn test_pool_parsing() {
        assert_eq!("Genre".parse::<Pool>().unwrap(), Pool::Genres);
        assert_eq!("tags".parse::<Pool>().unwrap(), Pool::Tags);
        assert!("mood".parse::<Pool>().is_err());
    }

    #[test]
    fn test_add_list_remove() {
        let t = TestShop::new();
        let cmd = VocabCommand::new(&t.shop, Formatter::new(OutputFormat::Table));

        assert!(cmd.add(&customer(), Pool::Genres, "RPG").is_err());
        assert_eq!(cmd.add(&admin(), Pool::Genres, " RPG ").unwrap(), "Added genre 'RPG'.");
        assert!(cmd.add(&admin(), Pool::Genres, "RPG").is_err());
        cmd.add(&admin(), Pool::Tags, "Co-op").unwrap();

        assert_eq!(cmd.list(Pool::Genres).unwrap(), "Genres:\n  RPG");
        assert_eq!(cmd.list(Pool::Tags).unwrap(), "Tags:\n  Co-op");

        assert_eq!(cmd.remove(&admin(), Pool::Tags, "Co-op").unwrap(), "Removed tag 'Co-op'.");
        assert!(cmd.remove(&admin(), Pool::Tags, "Co-op").is_err());
        assert_eq!(cmd.list(Pool::Tags).unwrap(), "No tags.");
    }
}
