use crate::error::{Error, Result};
use crate::git::RefKind;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

/// A deploy target as configured in `servers/<id>.json`.
///
/// Connection keys such as `port` belong to the external deploy command and are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    #[serde(skip_deserializing, default)]
    pub id: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub user: String,
    /// Environment deployed to when `--environment` is not given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    /// Default selection kind when neither `--branch`, `--tag` nor `--deploy-ask` is given.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ref_type: Option<RefKind>,
}

impl Server {
    /// Hostname for messages; falls back to the server id when no host is set.
    pub fn display_host(&self) -> &str {
        if self.host.is_empty() {
            &self.id
        } else {
            &self.host
        }
    }

    /// The remote user, which doubles as the "stage" in notification text.
    pub fn stage(&self) -> &str {
        if self.user.is_empty() {
            &self.id
        } else {
            &self.user
        }
    }
}

pub fn load(root: &Path, id: &str) -> Result<Server> {
    let path = paths::server(root, id);
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Error::server_not_found(id));
        }
        Err(e) => {
            return Err(Error::internal_io(
                e.to_string(),
                Some(format!("read {}", path.display())),
            ))
        }
    };

    let mut server: Server = serde_json::from_str(&content)
        .map_err(|e| Error::config_invalid_json(path.display().to_string(), e))?;
    server.id = id.to_string();
    Ok(server)
}

/// All configured server ids, sorted.
pub fn list_ids(root: &Path) -> Result<Vec<String>> {
    let dir = paths::servers(root);
    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(Error::internal_io(
                e.to_string(),
                Some(format!("read {}", dir.display())),
            ))
        }
    };

    let mut ids: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("json"))
        .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(String::from))
        .collect();
    ids.sort();
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_server(root: &Path, id: &str, json: &str) {
        fs::create_dir_all(paths::servers(root)).unwrap();
        fs::write(paths::server(root, id), json).unwrap();
    }

    #[test]
    fn load_reads_type_and_environment() {
        let dir = tempfile::tempdir().unwrap();
        write_server(
            dir.path(),
            "prod",
            r#"{"host":"web1.example.com","user":"deploy","port":2222,"environment":"prod","type":"branch"}"#,
        );

        let server = load(dir.path(), "prod").unwrap();
        assert_eq!(server.id, "prod");
        assert_eq!(server.host, "web1.example.com");
        assert_eq!(server.environment.as_deref(), Some("prod"));
        assert_eq!(server.ref_type, Some(RefKind::Branch));
    }

    #[test]
    fn load_missing_server_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(dir.path(), "nope").unwrap_err();
        assert_eq!(err.code, crate::ErrorCode::ServerNotFound);
    }

    #[test]
    fn load_rejects_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        write_server(dir.path(), "bad", "{not json");
        let err = load(dir.path(), "bad").unwrap_err();
        assert_eq!(err.code, crate::ErrorCode::ConfigInvalidJson);
    }

    #[test]
    fn list_ids_only_returns_json_files() {
        let dir = tempfile::tempdir().unwrap();
        write_server(dir.path(), "b", "{}");
        write_server(dir.path(), "a", "{}");
        fs::write(paths::servers(dir.path()).join("notes.txt"), "x").unwrap();

        assert_eq!(list_ids(dir.path()).unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn display_host_falls_back_to_id() {
        let server = Server {
            id: "staging".to_string(),
            ..Server::default()
        };
        assert_eq!(server.display_host(), "staging");
        assert_eq!(server.stage(), "staging");
    }
}
