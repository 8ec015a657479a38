//! Contact lookup against a local CRM directory.
//
// The directory holds JSON files, each either a single contact object or an
// array of them. Files are matched by their `email` field.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Lookup by lowercase email address.
pub trait ContactStore {
    fn lookup(&self, email: &str) -> Option<Contact>;
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContactFile {
    One(Contact),
    Many(Vec<serde_json::Value>),
}

pub struct CrmDirectory {
    root: PathBuf,
}

impl CrmDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        if !root.is_dir() {
            warn!("CRM directory {} not found; contacts will not be enriched", root.display());
        }
        Self { root }
    }

    fn json_files(&self) -> impl Iterator<Item = PathBuf> {
        WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    debug!("Skipping unreadable CRM entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")))
    }
}

fn read_contacts(path: &Path) -> Vec<Contact> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            debug!("Skipping CRM file {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    match serde_json::from_str::<ContactFile>(&content) {
        Ok(ContactFile::One(contact)) => vec![contact],
        // Entries that are not contact objects are ignored individually
        Ok(ContactFile::Many(values)) => {
            values.into_iter().filter_map(|v| serde_json::from_value(v).ok()).collect()
        }
        Err(e) => {
            debug!("Skipping CRM file {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

impl ContactStore for CrmDirectory {
    fn lookup(&self, email: &str) -> Option<Contact> {
        if !self.root.is_dir() {
            return None;
        }
        let found = self
            .json_files()
            .flat_map(|path| read_contacts(&path))
            .find(|contact| !contact.email.is_empty() && contact.email.eq_ignore_ascii_case(email));
        debug!("CRM lookup for {}: {}", email, if found.is_some() { "hit" } else { "miss" });
        found
    }
}
