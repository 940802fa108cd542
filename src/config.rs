use crate::error::{Result, SurveyAiError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use survey_ai_common::Coordinates;

pub const BACKEND_URL_ENV: &str = "SURVEY_AI_BACKEND_URL";
pub const LLM_URL_ENV: &str = "SURVEY_AI_LLM_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 解析バックエンドのベースURL
    pub backend_url: String,
    /// LLMエンドポイント
    pub llm_api_url: String,
    pub llm_model: String,
    /// 疎通確認のタイムアウト
    pub health_timeout_seconds: u64,
    /// 位置取得のタイムアウト
    pub location_timeout_seconds: u64,
    /// 端末位置を固定値で与える場合
    pub device_location: Option<Coordinates>,
    /// 位置取得コマンド（例: `termux-location`）
    pub location_command: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: "http://192.168.1.53:8000".into(),
            llm_api_url: "https://api.techoptima.ai/api/generate".into(),
            llm_model: "optgpt:7b".into(),
            health_timeout_seconds: 5,
            location_timeout_seconds: 10,
            device_location: None,
            location_command: None,
        }
    }
}

impl Config {
    /// 設定ファイルを読み込み、環境変数で上書き
    pub fn load() -> Result<Self> {
        let config = Self::load_from(&Self::config_path()?)?;
        Ok(config.with_env_overrides())
    }

    /// 指定パスから読み込み（無ければデフォルト）
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| SurveyAiError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("survey-ai").join("config.json"))
    }

    /// 環境変数を優先
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
            if !url.trim().is_empty() {
                self.backend_url = url.trim().to_string();
            }
        }
        if let Ok(url) = std::env::var(LLM_URL_ENV) {
            if !url.trim().is_empty() {
                self.llm_api_url = url.trim().to_string();
            }
        }
        self
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_seconds)
    }

    pub fn location_timeout(&self) -> Duration {
        Duration::from_secs(self.location_timeout_seconds)
    }
}
