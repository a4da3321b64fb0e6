// SPDX-FileCopyrightText: 2026 Geoask Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model download manager for first-run local model setup.
//!
//! Resolves a model id either to a local directory or to a model hub
//! repository, downloading the ONNX graph and tokenizer into the data
//! directory on first run.

use std::path::{Path, PathBuf};

use geoask_core::GeoaskError;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Base URL of the model hub.
const HUB_URL: &str = "https://huggingface.co";

/// Tokenizer file name, shared by every supported model.
pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// Where the model files come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// A directory that already holds the files.
    Directory(PathBuf),
    /// A hub repository id (`org/name`).
    Hub(String),
}

impl ModelSource {
    /// Treats `model_id` as a directory when one exists at that path.
    pub fn resolve(model_id: &str) -> Self {
        let path = Path::new(model_id);
        if path.is_dir() {
            Self::Directory(path.to_path_buf())
        } else {
            Self::Hub(model_id.to_string())
        }
    }
}

/// Manages model download and path resolution.
pub struct ModelManager {
    data_dir: PathBuf,
    source: ModelSource,
    /// Path of the graph inside the repository, e.g. `onnx/model.onnx`.
    model_file: String,
    access_token: Option<String>,
    hub_url: String,
}

impl ModelManager {
    pub fn new(
        data_dir: PathBuf,
        model_id: &str,
        model_file: impl Into<String>,
        access_token: Option<String>,
    ) -> Self {
        Self {
            data_dir,
            source: ModelSource::resolve(model_id),
            model_file: model_file.into(),
            access_token,
            hub_url: HUB_URL.to_string(),
        }
    }

    /// Overrides the hub base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_hub_url(mut self, url: String) -> Self {
        self.hub_url = url;
        self
    }

    pub fn source(&self) -> &ModelSource {
        &self.source
    }

    /// Returns the directory holding the model files.
    pub fn model_dir(&self) -> PathBuf {
        match &self.source {
            ModelSource::Directory(dir) => dir.clone(),
            ModelSource::Hub(repo) => self.data_dir.join("models").join(repo.replace('/', "--")),
        }
    }

    fn model_file_name(&self) -> &str {
        self.model_file
            .rsplit('/')
            .next()
            .unwrap_or(self.model_file.as_str())
    }

    /// Returns the path to the ONNX graph.
    ///
    /// Downloaded graphs are stored flat in [`Self::model_dir`]; local
    /// directories keep their own layout.
    pub fn model_path(&self) -> PathBuf {
        match &self.source {
            ModelSource::Directory(dir) => dir.join(&self.model_file),
            ModelSource::Hub(_) => self.model_dir().join(self.model_file_name()),
        }
    }

    /// Returns the path to the tokenizer.json file.
    pub fn tokenizer_path(&self) -> PathBuf {
        self.model_dir().join(TOKENIZER_FILE)
    }

    /// Returns true if both model and tokenizer files exist.
    pub fn is_model_available(&self) -> bool {
        self.model_path().exists() && self.tokenizer_path().exists()
    }

    /// Ensures the model files are present and returns the graph path.
    ///
    /// Downloads from the hub on first run; subsequent calls are no-ops.
    /// Graphs larger than 2 GB ship their weights in a `<graph>_data` file,
    /// which is fetched when the repository has one.
    pub async fn ensure_model(&self) -> Result<PathBuf, GeoaskError> {
        if self.is_model_available() {
            return Ok(self.model_path());
        }

        let repo = match &self.source {
            ModelSource::Directory(dir) => {
                return Err(GeoaskError::Config(format!(
                    "model directory {} must contain {} and {TOKENIZER_FILE}",
                    dir.display(),
                    self.model_file
                )));
            }
            ModelSource::Hub(repo) => repo.clone(),
        };

        info!(repo = repo.as_str(), "local model not found, downloading from hub");

        let model_dir = self.model_dir();
        tokio::fs::create_dir_all(&model_dir).await.map_err(|e| {
            GeoaskError::Internal(format!("failed to create model directory: {e}"))
        })?;

        let client = reqwest::Client::new();
        let data_file = format!("{}_data", self.model_file);
        let files = [
            (self.model_file.as_str(), self.model_path(), true),
            (
                data_file.as_str(),
                model_dir.join(format!("{}_data", self.model_file_name())),
                false,
            ),
            (TOKENIZER_FILE, self.tokenizer_path(), true),
        ];

        for (remote_path, dest, required) in &files {
            if dest.exists() {
                continue;
            }
            let url = format!("{}/{repo}/resolve/main/{remote_path}", self.hub_url);
            info!("downloading {remote_path}...");
            match download_file(&client, &url, dest, self.access_token.as_deref()).await {
                Ok(Some(size)) => info!("downloaded {remote_path} ({size} bytes)"),
                Ok(None) if !required => debug!("{remote_path} not present in repository"),
                Ok(None) => {
                    return Err(GeoaskError::Internal(format!(
                        "{remote_path} not found in {repo}"
                    )));
                }
                Err(e) => return Err(e),
            }
        }

        info!("local model ready at: {}", model_dir.display());
        Ok(self.model_path())
    }
}

/// Downloads `url` to `dest` through a `<dest>.part` file that is renamed
/// only once the body is complete, so an interrupted download is never
/// mistaken for a usable model. Returns `Ok(None)` on 404.
async fn download_file(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    access_token: Option<&str>,
) -> Result<Option<u64>, GeoaskError> {
    let part = part_path(dest);
    match fetch_to(client, url, &part, access_token).await {
        Ok(Some(size)) => {
            tokio::fs::rename(&part, dest).await.map_err(|e| {
                GeoaskError::Internal(format!("failed to move {}: {e}", part.display()))
            })?;
            Ok(Some(size))
        }
        other => {
            let _ = tokio::fs::remove_file(&part).await;
            other
        }
    }
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

/// Streams `url` into `dest`, truncating any earlier content.
async fn fetch_to(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    access_token: Option<&str>,
) -> Result<Option<u64>, GeoaskError> {
    let mut request = client.get(url);
    if let Some(token) = access_token {
        request = request.bearer_auth(token);
    }
    let mut response = request
        .send()
        .await
        .map_err(|e| GeoaskError::Internal(format!("failed to download {url}: {e}")))?;

    if response.status() == reqwest::StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !response.status().is_success() {
        return Err(GeoaskError::Internal(format!(
            "download failed with status {}: {url}",
            response.status()
        )));
    }

    let mut file = tokio::fs::File::create(dest).await.map_err(|e| {
        GeoaskError::Internal(format!("failed to create {}: {e}", dest.display()))
    })?;
    let mut size = 0u64;
    while let Some(chunk) = response.chunk().await.map_err(|e| {
        GeoaskError::Internal(format!("failed to read response body from {url}: {e}"))
    })? {
        file.write_all(&chunk).await.map_err(|e| {
            GeoaskError::Internal(format!("failed to write {}: {e}", dest.display()))
        })?;
        size += chunk.len() as u64;
    }
    file.flush()
        .await
        .map_err(|e| GeoaskError::Internal(format!("failed to flush {}: {e}", dest.display())))?;

    Ok(Some(size))
}
