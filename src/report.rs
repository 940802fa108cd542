//! 解析レポートの保存・読み込み
//!
//! 解析結果・説明文・総括をJSONに保存し、後から `describe` / `summarize` で
//! 追記できるようにする

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use survey_ai_common::{AnalysisResult, Session};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SurveyReport {
    /// 作成日時 (RFC3339)
    pub generated_at: String,
    pub backend_url: String,
    #[serde(default)]
    pub chainage: String,
    pub results: Vec<AnalysisResult>,
    #[serde(default)]
    pub descriptions: BTreeMap<String, String>,
    #[serde(default)]
    pub summary: String,
}

impl SurveyReport {
    pub fn from_session(session: &Session, backend_url: &str) -> Self {
        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            backend_url: backend_url.to_string(),
            chainage: session.chainage().to_string(),
            results: session.results().to_vec(),
            descriptions: session.descriptions().clone(),
            summary: session.summary().to_string(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn into_session(self) -> Session {
        let mut session = Session::from_results(self.results, self.descriptions, self.summary);
        session.set_chainage(self.chainage);
        session
    }

    /// セッションの最新状態を反映（作成日時は更新する）
    pub fn update_from(&mut self, session: &Session) {
        let backend_url = std::mem::take(&mut self.backend_url);
        *self = Self::from_session(session, &backend_url);
    }
}
