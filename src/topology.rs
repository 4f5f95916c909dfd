// src/topology.rs - Saved topology layouts
use crate::error::{Result, TopoError};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

const CREATED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Listing entry for a saved topology
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyFile {
    pub name: String,
    #[serde(rename = "createdTime")]
    pub created_time: String,
}

/// Directory of topology JSON documents written by the editor
#[derive(Debug, Clone)]
pub struct TopologyStore {
    dir: PathBuf,
}

impl TopologyStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the directory if it does not exist yet
    pub async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Every `*.json` file, newest first
    pub async fn list(&self) -> Result<Vec<TopologyFile>> {
        let mut files = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.ends_with(".json") {
                continue;
            }
            let metadata = entry.metadata().await?;
            let created = metadata.created().or_else(|_| metadata.modified())?;
            let created: DateTime<Local> = created.into();
            files.push(TopologyFile {
                name,
                created_time: created.format(CREATED_FORMAT).to_string(),
            });
        }
        files.sort_by(|a, b| b.created_time.cmp(&a.created_time));
        Ok(files)
    }

    /// Write a topology document and return the path it was saved to.
    ///
    /// The file is named after the document's `fileName` field (`.json` is
    /// appended when missing) or, without one, after the current time.
    pub async fn save(&self, document: &serde_json::Value) -> Result<PathBuf> {
        let file_name = match document.get("fileName").and_then(|v| v.as_str()) {
            Some(name) if !name.is_empty() => {
                if name.ends_with(".json") {
                    name.to_string()
                } else {
                    format!("{}.json", name)
                }
            }
            _ => format!("topology_{}.json", Local::now().format("%Y%m%d_%H%M%S")),
        };
        check_file_name(&file_name)?;

        let path = self.dir.join(&file_name);
        let body = serde_json::to_vec_pretty(document)?;
        tokio::fs::write(&path, body).await?;
        info!("Saved topology {}", path.display());
        Ok(path)
    }

    pub async fn delete(&self, file_name: &str) -> Result<()> {
        check_file_name(file_name)?;
        let path = self.dir.join(file_name);
        if !tokio::fs::try_exists(&path).await? {
            return Err(TopoError::NotFound(file_name.to_string()));
        }
        tokio::fs::remove_file(&path).await?;
        info!("Deleted topology {}", path.display());
        Ok(())
    }
}

/// Only plain file names inside the store directory are accepted
fn check_file_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(TopoError::InvalidRequest("empty file name".into()));
    }
    if name.contains(|c: char| c == '/' || c == '\\') || name.contains("..") {
        return Err(TopoError::InvalidRequest(format!(
            "file name '{}' must not contain a path",
            name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_list_delete() {
        let dir = TempDir::new().unwrap();
        let store = TopologyStore::new(dir.path().join("saved"));
        store.ensure_dir().await.unwrap();

        let path = store
            .save(&json!({"fileName": "hall-a", "nodes": []}))
            .await
            .unwrap();
        assert!(path.ends_with("hall-a.json"));

        let saved: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(saved["nodes"], json!([]));

        std::fs::write(store.dir().join("notes.txt"), "x").unwrap();
        let files = store.list().await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "hall-a.json");
        assert_eq!(files[0].created_time.len(), 19);

        store.delete("hall-a.json").await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
        assert!(matches!(
            store.delete("hall-a.json").await,
            Err(TopoError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_generated_name() {
        let dir = TempDir::new().unwrap();
        let store = TopologyStore::new(dir.path());
        let path = store.save(&json!({"nodes": []})).await.unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("topology_") && name.ends_with(".json"));
    }

    #[tokio::test]
    async fn test_rejects_paths() {
        let dir = TempDir::new().unwrap();
        let store = TopologyStore::new(dir.path());
        assert!(matches!(
            store.delete("../device_info.csv").await,
            Err(TopoError::InvalidRequest(_))
        ));
        assert!(matches!(
            store.save(&json!({"fileName": "a/b"})).await,
            Err(TopoError::InvalidRequest(_))
        ));
        assert!(matches!(store.delete("").await, Err(TopoError::InvalidRequest(_))));
    }
}
