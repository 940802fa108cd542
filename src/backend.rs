//! 解析バックエンドとの通信
//!
//! - `GET /` 疎通確認
//! - `POST /upload` 画像送信・解析
//! - `GET /uploads/{filename}` 解析済み画像の取得

use crate::error::{Result, SurveyAiError};
use reqwest::multipart::{Form, Part};
use std::path::{Path, PathBuf};
use std::time::Duration;
use survey_ai_common::view::{served_image_url, PLACEHOLDER_IMAGE_URL};
use survey_ai_common::{AnalysisResult, ServerStatus, UploadField, UploadForm, UploadResponse};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    health_timeout: Duration,
}

/// 解析済み画像の取得結果
#[derive(Debug, Clone, PartialEq)]
pub enum ServedImage {
    Saved(PathBuf),
    /// 取得できなかったので代替画像URLを使う
    Placeholder(String),
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>, health_timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            health_timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 疎通確認（2xxなら到達可能）
    pub async fn check_status(&self) -> ServerStatus {
        let url = format!("{}/", self.base_url);
        match self.http.get(&url).timeout(self.health_timeout).send().await {
            Ok(response) if response.status().is_success() => ServerStatus::accessible(),
            Ok(response) => {
                warn!(status = response.status().as_u16(), "backend health check failed");
                ServerStatus::http_failure(response.status().as_u16())
            }
            Err(e) if e.is_timeout() => {
                warn!(%url, "backend health check timed out");
                ServerStatus::timed_out()
            }
            Err(e) => {
                warn!(error = %e, "error checking backend server");
                ServerStatus::unreachable(e)
            }
        }
    }

    /// 画像を送信して解析結果を受け取る
    pub async fn upload(&self, form: &UploadForm) -> Result<Vec<AnalysisResult>> {
        let url = format!("{}/upload", self.base_url);
        info!(%url, images = form.image_ids.len(), "submitting images for analysis");

        let response = self
            .http
            .post(&url)
            .multipart(to_multipart(form)?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SurveyAiError::HttpStatus(response.status().as_u16()));
        }

        let body: UploadResponse = response.json().await?;
        debug!(results = body.results.len(), "analysis finished");
        Ok(body.results)
    }

    pub fn image_url(&self, filename: &str) -> String {
        served_image_url(&self.base_url, filename)
    }

    /// 解析済み画像を取得
    pub async fn fetch_image(&self, filename: &str) -> Result<Vec<u8>> {
        let response = self.http.get(self.image_url(filename)).send().await?;
        if !response.status().is_success() {
            return Err(SurveyAiError::HttpStatus(response.status().as_u16()));
        }
        Ok(response.bytes().await?.to_vec())
    }

    /// 解析済み画像をディレクトリへ保存
    ///
    /// 取得・保存に失敗した場合は代替画像URLを返す。
    /// ファイル名がパスを含む場合は保存しない
    pub async fn download_image(&self, filename: &str, dir: &Path) -> ServedImage {
        if !is_plain_file_name(filename) {
            warn!(filename, "served filename is not a plain file name; not saved");
            return ServedImage::Placeholder(PLACEHOLDER_IMAGE_URL.to_string());
        }

        let saved = async {
            let bytes = self.fetch_image(filename).await?;
            tokio::fs::create_dir_all(dir).await?;
            let path = dir.join(filename);
            tokio::fs::write(&path, bytes).await?;
            Ok::<_, SurveyAiError>(path)
        };

        match saved.await {
            Ok(path) => ServedImage::Saved(path),
            Err(e) => {
                warn!(filename, error = %e, "served image not available");
                ServedImage::Placeholder(PLACEHOLDER_IMAGE_URL.to_string())
            }
        }
    }
}

/// 保存先ディレクトリの外を指さない単一のファイル名か
fn is_plain_file_name(filename: &str) -> bool {
    Path::new(filename)
        .file_name()
        .is_some_and(|name| name == std::ffi::OsStr::new(filename))
}

/// 送信フォームをmultipartに変換
fn to_multipart(form: &UploadForm) -> Result<Form> {
    let mut multipart = Form::new();
    for field in &form.fields {
        multipart = match field {
            UploadField::Text { name, value } => multipart.text(name.clone(), value.clone()),
            UploadField::File { name, file_name, mime_type, bytes } => {
                let part = Part::bytes(bytes.clone())
                    .file_name(file_name.clone())
                    .mime_str(mime_type)?;
                multipart.part(name.clone(), part)
            }
        };
    }
    Ok(multipart)
}
