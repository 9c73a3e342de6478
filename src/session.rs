//! Editor state that used to live in page globals: the active environment,
//! the selected file and the open buffers.

use crate::api_client::ApiResponse;
use crate::backend::EditorBackend;
use crate::error::ApiError;
use crate::file_system::LocalFile;
use crate::models::{
    file_name, is_same_or_under, join_node_path, parent_path, rebase_path, sort_nodes, TreeNode,
};
use chrono::{DateTime, Local};
use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use std::collections::HashMap;

/// In-memory text of one opened file.
#[derive(Debug, Clone)]
pub struct Buffer {
    pub environment: String,
    pub path: String,
    pub language: &'static str,
    text: String,
    dirty: bool,
    loaded_at: DateTime<Local>,
    saved_at: Option<DateTime<Local>>,
}

impl Buffer {
    fn new(environment: &str, path: &str, text: String) -> Self {
        Self {
            environment: environment.to_string(),
            path: path.to_string(),
            language: language_for_path(path),
            text,
            dirty: false,
            loaded_at: Local::now(),
            saved_at: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn loaded_at(&self) -> DateTime<Local> {
        self.loaded_at
    }

    pub fn saved_at(&self) -> Option<DateTime<Local>> {
        self.saved_at
    }
}

#[derive(Debug)]
pub struct UploadOutcome {
    pub file_name: String,
    pub target_path: String,
    pub result: Result<ApiResponse, ApiError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewHandle {
    pub preview_id: String,
    pub url: String,
}

pub fn buffer_key(environment: &str, path: &str) -> String {
    format!("{}_{}", environment, path)
}

pub fn language_for_path(path: &str) -> &'static str {
    let ext = file_name(path).rsplit_once('.').map(|(_, ext)| ext);
    match ext {
        Some("js") | Some("mjs") | Some("cjs") => "javascript",
        Some("ts") => "typescript",
        Some("html") | Some("htm") => "html",
        Some("css") => "css",
        Some("json") => "json",
        Some("md") => "markdown",
        _ => "plaintext",
    }
}

/// One user's editing session. Every mutation goes through `&mut self`,
/// so a response can't land after the state it was meant for has moved on.
pub struct EditorSession<B> {
    backend: B,
    environment: String,
    selected: Option<String>,
    buffers: HashMap<String, Buffer>,
}

impl<B: EditorBackend> EditorSession<B> {
    pub fn new(backend: B, environment: impl Into<String>) -> Self {
        Self {
            backend,
            environment: environment.into(),
            selected: None,
            buffers: HashMap::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Buffers of other environments stay open under their own keys.
    pub fn set_environment(&mut self, environment: impl Into<String>) {
        self.environment = environment.into();
        self.selected = None;
        info!("Switched to environment '{}'", self.environment);
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_buffer(&self) -> Option<&Buffer> {
        let path = self.selected.as_deref()?;
        self.buffers.get(&buffer_key(&self.environment, path))
    }

    pub fn buffers(&self) -> impl Iterator<Item = &Buffer> {
        self.buffers.values()
    }

    pub fn dirty_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self
            .buffers
            .values()
            .filter(|b| b.dirty && b.environment == self.environment)
            .map(|b| b.path.as_str())
            .collect();
        paths.sort_by(|a, b| natord::compare(a, b));
        paths
    }

    pub async fn load_children(&self, node_id: &str) -> Result<Vec<TreeNode>, ApiError> {
        debug!("Loading children of '{}' in '{}'", node_id, self.environment);
        let mut nodes = self.backend.get_node_tree(node_id, &self.environment).await?;
        sort_nodes(&mut nodes);
        Ok(nodes)
    }

    /// Folders don't open a buffer.
    pub async fn select(&mut self, node: &TreeNode) -> Result<Option<&Buffer>, ApiError> {
        if node.is_folder() {
            return Ok(None);
        }
        self.open(&node.path).await.map(Some)
    }

    pub async fn open(&mut self, path: &str) -> Result<&Buffer, ApiError> {
        let key = buffer_key(&self.environment, path);
        if self.buffers.contains_key(&key) {
            debug!("Reusing open buffer for {}", key);
        } else {
            let text = self.backend.get_node_text(path).await?;
            info!("Opened {} ({} bytes)", path, text.len());
            self.buffers.insert(key.clone(), Buffer::new(&self.environment, path, text));
        }
        self.selected = Some(path.to_string());
        Ok(&self.buffers[&key])
    }

    /// Returns false when nothing is open.
    pub fn edit_selected(&mut self, text: impl Into<String>) -> bool {
        let Some(path) = self.selected.as_deref() else {
            return false;
        };
        match self.buffers.get_mut(&buffer_key(&self.environment, path)) {
            Some(buffer) => {
                buffer.text = text.into();
                buffer.dirty = true;
                true
            }
            None => false,
        }
    }

    /// Returns false when nothing is open.
    pub async fn save_selected(&mut self) -> Result<bool, ApiError> {
        let Some(path) = self.selected.clone() else {
            return Ok(false);
        };
        let key = buffer_key(&self.environment, &path);
        let Some(buffer) = self.buffers.get(&key) else {
            return Ok(false);
        };
        self.backend.save_node_text(&path, &buffer.text).await?;
        if let Some(buffer) = self.buffers.get_mut(&key) {
            buffer.dirty = false;
            buffer.saved_at = Some(Local::now());
        }
        info!("Saved {}", path);
        Ok(true)
    }

    pub async fn create(&mut self, parent: Option<&str>, name: &str, is_folder: bool) -> Result<String, ApiError> {
        let path = join_node_path(parent, name);
        self.backend.create_node(&path, is_folder).await?;
        info!("Created {} {}", if is_folder { "folder" } else { "file" }, path);
        Ok(path)
    }

    pub async fn rename(&mut self, old_path: &str, new_name: &str) -> Result<String, ApiError> {
        let new_path = join_node_path(parent_path(old_path), new_name);
        self.check_target_clean(old_path, &new_path)?;
        self.backend.rename_node(old_path, &new_path).await?;
        self.rebase_open_paths(old_path, &new_path);
        info!("Renamed {} -> {}", old_path, new_path);
        Ok(new_path)
    }

    pub async fn move_to(&mut self, old_path: &str, new_parent: Option<&str>) -> Result<String, ApiError> {
        let joined = join_node_path(new_parent, file_name(old_path));
        let new_path = joined.trim_start_matches('/').to_string();
        self.check_target_clean(old_path, &new_path)?;
        self.backend.move_node(old_path, &new_path).await?;
        self.rebase_open_paths(old_path, &new_path);
        info!("Moved {} -> {}", old_path, new_path);
        Ok(new_path)
    }

    pub async fn delete(&mut self, path: &str) -> Result<(), ApiError> {
        self.backend.delete_node(path).await?;
        let environment = self.environment.clone();
        self.buffers
            .retain(|_, b| b.environment != environment || !is_same_or_under(&b.path, path));
        if self
            .selected
            .as_deref()
            .map_or(false, |s| is_same_or_under(s, path))
        {
            self.selected = None;
        }
        info!("Deleted {}", path);
        Ok(())
    }

    /// Uploads one file at a time, in order. Per-file failures don't stop the batch.
    pub async fn upload(&self, target_dir: &str, files: &[LocalFile]) -> Vec<UploadOutcome> {
        let parent = if target_dir.is_empty() { None } else { Some(target_dir) };
        stream::iter(files)
            .then(|file| async move {
                let target_path = join_node_path(parent, &file.name);
                let upload_name = file_name(&file.name).to_string();
                let result = match tokio::fs::read(&file.path).await {
                    Ok(bytes) => self.backend.upload_node(&upload_name, bytes, &target_path).await,
                    Err(e) => Err(ApiError::io(format!("Failed to read {}", file.path.display()), e)),
                };
                if let Err(e) = &result {
                    warn!("Upload of {} failed: {}", file.name, e);
                }
                UploadOutcome {
                    file_name: file.name.clone(),
                    target_path,
                    result,
                }
            })
            .collect()
            .await
    }

    pub async fn src_path(&self) -> Result<String, ApiError> {
        self.backend.get_src_path(&self.environment).await
    }

    /// Renders the selected buffer. The source root is resolved first so the
    /// preview request always carries it.
    pub async fn preview(&self) -> Result<Option<PreviewHandle>, ApiError> {
        let Some(buffer) = self.selected_buffer() else {
            return Ok(None);
        };
        let src_path = self.backend.get_src_path(&self.environment).await?;
        let preview_id = self.backend.get_preview(&buffer.text, &src_path).await?;
        let url = self.backend.preview_url(&preview_id);
        Ok(Some(PreviewHandle { preview_id, url }))
    }

    /// Refuses a rename/move that would land on unsaved edits.
    fn check_target_clean(&self, old_path: &str, new_path: &str) -> Result<(), ApiError> {
        let blocked = self.buffers.values().find(|b| {
            b.environment == self.environment
                && b.dirty
                && is_same_or_under(&b.path, new_path)
                && !is_same_or_under(&b.path, old_path)
        });
        match blocked {
            Some(buffer) => Err(ApiError::UnsavedChanges {
                path: buffer.path.clone(),
            }),
            None => Ok(()),
        }
    }

    fn rebase_open_paths(&mut self, old_path: &str, new_path: &str) {
        let environment = self.environment.clone();
        // whatever was open at the target is gone on the backend now
        self.buffers.retain(|_, b| {
            b.environment != environment
                || is_same_or_under(&b.path, old_path)
                || !is_same_or_under(&b.path, new_path)
        });
        let buffers = std::mem::take(&mut self.buffers);
        for (key, mut buffer) in buffers {
            let rebased = if buffer.environment == environment {
                rebase_path(&buffer.path, old_path, new_path)
            } else {
                None
            };
            match rebased {
                Some(path) => {
                    buffer.language = language_for_path(&path);
                    buffer.path = path;
                    self.buffers.insert(buffer_key(&environment, &buffer.path), buffer);
                }
                None => {
                    self.buffers.insert(key, buffer);
                }
            }
        }
        if let Some(selected) = self.selected.as_deref() {
            if let Some(path) = rebase_path(selected, old_path, new_path) {
                self.selected = Some(path);
            }
        }
    }
}
