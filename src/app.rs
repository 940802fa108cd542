//! 画面コントローラ
//!
//! [`Session`] の状態遷移に通信（位置取得・疎通確認・解析・LLM）を結び付ける。
//! エラーはすべてセッションのエラー表示に落とし込み、呼び出し側へは返さない

use crate::animation::LoadingAnimation;
use crate::backend::BackendClient;
use crate::error::SurveyAiError;
use crate::llm::LlmClient;
use crate::location::{locate, LocationProvider};
use survey_ai_common::{
    build_description_prompt, ImageSource, PositionOptions, SelectedImage, Session,
};
use tracing::{error, info, warn};

pub struct App<L> {
    session: Session,
    backend: BackendClient,
    llm: LlmClient,
    location: L,
    location_options: PositionOptions,
}

impl<L: LocationProvider> App<L> {
    pub fn new(
        backend: BackendClient,
        llm: LlmClient,
        location: L,
        location_options: PositionOptions,
    ) -> Self {
        Self {
            session: Session::new(),
            backend,
            llm,
            location,
            location_options,
        }
    }

    /// 既存のセッション（保存済みレポートなど）から開始
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn backend(&self) -> &BackendClient {
        &self.backend
    }

    /// 起動時: 位置取得と疎通確認を並行して行う
    pub async fn start(&mut self) {
        let (position, status) = tokio::join!(
            locate(&self.location, &self.location_options),
            self.backend.check_status()
        );
        match position {
            Ok(coords) => self.session.location_resolved(coords),
            Err(e) => {
                warn!(error = %e, "error getting location");
                self.session.location_failed(&e);
            }
        }
        self.session.server_status_checked(status);
    }

    pub async fn get_location(&mut self) {
        match locate(&self.location, &self.location_options).await {
            Ok(coords) => {
                info!(lat = coords.lat, lon = coords.lon, "location updated");
                self.session.location_resolved(coords);
            }
            Err(e) => {
                warn!(error = %e, "error getting location");
                self.session.location_failed(&e);
            }
        }
    }

    pub async fn check_server_status(&mut self) {
        let status = self.backend.check_status().await;
        self.session.server_status_checked(status);
    }

    /// 画像を追加（上限を超えた分は捨てる）。受け付けた枚数を返す
    pub fn add_images(&mut self, images: Vec<SelectedImage>, source: ImageSource) -> usize {
        let offered = images.len();
        let accepted = self.session.add_images(images, source);
        if accepted < offered {
            warn!(offered, accepted, "image limit reached; extra images dropped");
        }
        accepted
    }

    pub fn remove_image(&mut self, index: usize) {
        if let Err(e) = self.session.remove_image(index) {
            warn!(error = %e, "remove image ignored");
        }
    }

    pub fn set_chainage(&mut self, chainage: impl Into<String>) {
        self.session.set_chainage(chainage);
    }

    pub fn toggle_result(&mut self, index: usize) {
        self.session.toggle_result(index);
    }

    /// 解析を実行
    ///
    /// 通信中はアニメーションの更新ごとに `on_tick` を呼ぶ
    pub async fn run_analysis<F>(&mut self, mut on_tick: F)
    where
        F: FnMut(&Session),
    {
        let form = match self.session.begin_analysis() {
            Ok(form) => form,
            Err(e) => {
                warn!(error = %e, "analysis not started");
                return;
            }
        };

        let mut animation = LoadingAnimation::start();
        let outcome = {
            let request = self.backend.upload(&form);
            tokio::pin!(request);
            loop {
                tokio::select! {
                    outcome = &mut request => break outcome,
                    Some(tick) = animation.next() => {
                        self.session.loading_tick(tick);
                        on_tick(&self.session);
                    }
                }
            }
        };
        animation.stop();

        match outcome {
            Ok(results) => {
                info!(results = results.len(), "analysis results received");
                self.session.analysis_succeeded(results);
            }
            Err(e) => {
                error!(error = %e, "error during analysis");
                self.session.analysis_failed(format!(
                    "Failed to run analysis: {}. Make sure your backend is running at {}.",
                    e,
                    self.backend.base_url()
                ));
            }
        }
    }

    /// 1件の説明文を生成
    pub async fn generate_image_description(&mut self, index: usize) {
        let result = match self.session.begin_description(index) {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "description not started");
                return;
            }
        };

        let prompt = build_description_prompt(&result);
        match self.llm.generate(&prompt).await {
            Ok(text) => self.session.description_generated(&result.filename, text),
            Err(e) => {
                error!(error = %e, "error generating image description");
                self.session
                    .description_failed(narrative_error("generate description", &e));
            }
        }
    }

    /// 全結果の総括を生成（結果が無ければ通信しない）
    pub async fn generate_overall_summary(&mut self) {
        let prompt = match self.session.begin_summary() {
            Ok(Some(prompt)) => prompt,
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, "summary not started");
                return;
            }
        };

        match self.llm.generate(&prompt).await {
            Ok(text) => self.session.summary_generated(text),
            Err(e) => {
                error!(error = %e, "error generating overall summary");
                self.session.summary_failed(narrative_error("generate summary", &e));
            }
        }
    }

    /// 「Upload Again」: 全状態を初期化し、疎通を再確認
    pub async fn upload_again(&mut self) {
        self.session.upload_again();
        self.check_server_status().await;
    }
}

/// LLM失敗時の表示文言
fn narrative_error(action: &str, err: &SurveyAiError) -> String {
    match err {
        SurveyAiError::UnexpectedLlmResponse => {
            format!("Failed to {}: Unexpected LLM response structure.", action)
        }
        other => format!("Failed to {}: {}. Check LLM API connection.", action, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_narrative_error_messages() {
        assert_eq!(
            narrative_error("generate description", &SurveyAiError::UnexpectedLlmResponse),
            "Failed to generate description: Unexpected LLM response structure."
        );
        assert_eq!(
            narrative_error("generate summary", &SurveyAiError::LlmHttpStatus(500)),
            "Failed to generate summary: LLM API HTTP error! status: 500. Check LLM API connection."
        );
    }
}
