//! クライアントセッションの状態
//!
//! 画面の状態をひとつの構造体にまとめ、イベント（ユーザー操作・通信完了・
//! タイマー）ごとに更新メソッドを1つ用意する。通信は行わず、
//! 呼び出し側（CLIのコントローラ）が結果をここへ渡す。
//!
//! 保たれる性質:
//! - 選択画像は最大 [`MAX_IMAGES`] 枚
//! - 説明文のキーは常に現在の解析結果のファイル名に含まれる
//! - 説明文の生成は同時に1件まで

use crate::error::SessionError;
use crate::loading::{LoadingState, LoadingTick};
use crate::location::PositionError;
use crate::prompts::build_summary_prompt;
use crate::types::{AnalysisResult, Coordinates, ImageSource, SelectedImage, MAX_IMAGES};
use crate::upload::{build_upload_form, UploadForm};
use std::collections::BTreeMap;

/// 総括対象が無いときに表示する文言
pub const NO_RESULTS_TO_SUMMARIZE: &str = "No analysis results available to summarize.";

/// バックエンドの疎通状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerStatus {
    pub accessible: bool,
    pub message: String,
}

impl ServerStatus {
    pub fn accessible() -> Self {
        Self { accessible: true, message: "Accessible".into() }
    }

    pub fn http_failure(status: u16) -> Self {
        Self {
            accessible: false,
            message: format!("Not accessible (HTTP {})", status),
        }
    }

    pub fn timed_out() -> Self {
        Self { accessible: false, message: "Check timed out".into() }
    }

    pub fn unreachable(reason: impl std::fmt::Display) -> Self {
        Self {
            accessible: false,
            message: format!("Not accessible ({})", reason),
        }
    }
}

impl Default for ServerStatus {
    /// 初回チェック前
    fn default() -> Self {
        Self {
            accessible: false,
            message: "Checking backend server...".into(),
        }
    }
}

/// セッション状態
#[derive(Debug, Clone)]
pub struct Session {
    next_image_id: u64,
    selected: Vec<SelectedImage>,
    image_source: Option<ImageSource>,
    chainage: String,

    location: Option<Coordinates>,
    location_denied: bool,
    server: ServerStatus,

    loading: bool,
    loading_state: LoadingState,
    /// 送信中フォームの画像ID（送信順）
    pending_ids: Vec<u64>,

    results: Vec<AnalysisResult>,
    /// results[i] を生んだ選択画像のID
    result_origins: Vec<Option<u64>>,
    descriptions: BTreeMap<String, String>,
    summary: String,
    describing: Option<usize>,
    summarizing: bool,

    error: Option<String>,
    expanded: Option<usize>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            next_image_id: 1,
            selected: Vec::new(),
            image_source: None,
            chainage: String::new(),
            location: None,
            location_denied: true,
            server: ServerStatus::default(),
            loading: false,
            loading_state: LoadingState::default(),
            pending_ids: Vec::new(),
            results: Vec::new(),
            result_origins: Vec::new(),
            descriptions: BTreeMap::new(),
            summary: String::new(),
            describing: None,
            summarizing: false,
            error: None,
            expanded: None,
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// 保存済みの結果からセッションを復元（選択画像は無い）
    pub fn from_results(
        results: Vec<AnalysisResult>,
        descriptions: BTreeMap<String, String>,
        summary: String,
    ) -> Self {
        let descriptions = descriptions
            .into_iter()
            .filter(|(name, _)| results.iter().any(|r| &r.filename == name))
            .collect();
        Self {
            result_origins: vec![None; results.len()],
            results,
            descriptions,
            summary,
            ..Self::default()
        }
    }

    // ---- 参照 ----

    pub fn selected(&self) -> &[SelectedImage] {
        &self.selected
    }

    pub fn image_source(&self) -> Option<ImageSource> {
        self.image_source
    }

    pub fn chainage(&self) -> &str {
        &self.chainage
    }

    pub fn location(&self) -> Option<Coordinates> {
        self.location
    }

    pub fn location_denied(&self) -> bool {
        self.location_denied
    }

    pub fn server(&self) -> &ServerStatus {
        &self.server
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn loading_state(&self) -> &LoadingState {
        &self.loading_state
    }

    pub fn results(&self) -> &[AnalysisResult] {
        &self.results
    }

    pub fn descriptions(&self) -> &BTreeMap<String, String> {
        &self.descriptions
    }

    pub fn description(&self, filename: &str) -> Option<&str> {
        self.descriptions.get(filename).map(String::as_str)
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn describing(&self) -> Option<usize> {
        self.describing
    }

    pub fn is_summarizing(&self) -> bool {
        self.summarizing
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn expanded(&self) -> Option<usize> {
        self.expanded
    }

    /// 「Run Analysis」ボタンが押せるか
    pub fn can_run_analysis(&self) -> bool {
        !self.loading && !self.selected.is_empty() && self.server.accessible
    }

    // ---- 位置情報 ----

    pub fn location_resolved(&mut self, coords: Coordinates) {
        self.location = Some(coords);
        self.location_denied = false;
        self.error = None;
    }

    /// 位置取得失敗。未対応端末の場合は拒否フラグを変えない
    pub fn location_failed(&mut self, err: &PositionError) {
        if *err != PositionError::Unsupported {
            self.location_denied = true;
        }
        self.error = Some(err.message());
    }

    // ---- サーバ疎通 ----

    pub fn server_status_checked(&mut self, status: ServerStatus) {
        self.server = status;
    }

    // ---- 画像選択 ----

    /// 画像を追加し、受け付けた枚数を返す
    ///
    /// 上限を超えた分は捨てる（保留しない）
    pub fn add_images(&mut self, images: Vec<SelectedImage>, source: ImageSource) -> usize {
        self.image_source = Some(source);

        let room = MAX_IMAGES.saturating_sub(self.selected.len());
        let mut accepted = 0;
        for mut image in images.into_iter().take(room) {
            image.id = self.next_image_id;
            self.next_image_id += 1;
            self.selected.push(image);
            accepted += 1;
        }
        accepted
    }

    /// 選択画像を削除
    ///
    /// その画像から得られた解析結果の説明文も消し、総括は常にクリアする
    pub fn remove_image(&mut self, index: usize) -> Result<SelectedImage, SessionError> {
        if index >= self.selected.len() {
            return Err(SessionError::NoSuchImage(index));
        }
        let removed = self.selected.remove(index);

        if let Some(pos) = self
            .result_origins
            .iter()
            .position(|origin| *origin == Some(removed.id))
        {
            self.result_origins[pos] = None;
            if let Some(result) = self.results.get(pos) {
                self.descriptions.remove(&result.filename);
            }
        }

        self.summary.clear();
        Ok(removed)
    }

    pub fn set_chainage(&mut self, chainage: impl Into<String>) {
        self.chainage = chainage.into();
    }

    // ---- 解析 ----

    /// 解析開始
    ///
    /// 前提条件を満たさなければエラーを設定して返し、何も送信させない。
    /// 満たせば以前の結果をすべて破棄し、送信フォームを返す
    pub fn begin_analysis(&mut self) -> Result<UploadForm, SessionError> {
        if self.loading {
            return Err(SessionError::AnalysisInProgress);
        }
        if self.selected.is_empty() {
            return self.reject(SessionError::NoImagesSelected);
        }
        if !self.server.accessible {
            return self.reject(SessionError::ServerNotAccessible);
        }

        self.loading = true;
        self.loading_state.reset();
        self.error = None;
        self.clear_results();

        let form = build_upload_form(
            &self.selected,
            &self.chainage,
            self.image_source,
            self.location,
        );
        self.pending_ids = form.image_ids.clone();
        Ok(form)
    }

    /// 解析中アニメーションの更新（解析中以外は無視）
    pub fn loading_tick(&mut self, tick: LoadingTick) {
        if self.loading {
            self.loading_state.apply(tick);
        }
    }

    /// 解析成功: 結果を丸ごと置き換える
    pub fn analysis_succeeded(&mut self, results: Vec<AnalysisResult>) {
        let pending = std::mem::take(&mut self.pending_ids);
        self.result_origins = (0..results.len()).map(|i| pending.get(i).copied()).collect();
        self.results = results;
        self.finish_loading();
    }

    pub fn analysis_failed(&mut self, message: impl Into<String>) {
        self.pending_ids.clear();
        self.error = Some(message.into());
        self.finish_loading();
    }

    /// 結果カードの展開/折りたたみ（同時に1件のみ）
    pub fn toggle_result(&mut self, index: usize) {
        if index >= self.results.len() {
            return;
        }
        self.expanded = if self.expanded == Some(index) { None } else { Some(index) };
    }

    // ---- 説明文 ----

    /// 説明文生成の開始。対象の解析結果を返す
    pub fn begin_description(&mut self, index: usize) -> Result<AnalysisResult, SessionError> {
        if let Some(current) = self.describing {
            return self.reject(SessionError::DescriptionInFlight(current));
        }
        let result = match self.results.get(index) {
            Some(result) => result.clone(),
            None => return self.reject(SessionError::NoSuchResult(index)),
        };

        self.describing = Some(index);
        self.error = None;
        Ok(result)
    }

    /// 説明文を保存（同名の既存値は上書き）
    ///
    /// 生成中にリセットされ結果から消えたファイル名は捨てる
    pub fn description_generated(&mut self, filename: &str, text: impl Into<String>) {
        if self.results.iter().any(|r| r.filename == filename) {
            self.descriptions.insert(filename.to_string(), text.into());
        }
        self.describing = None;
    }

    pub fn description_failed(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.describing = None;
    }

    // ---- 総括 ----

    /// 総括生成の開始
    ///
    /// 結果が無ければ固定文言を設定して `Ok(None)` を返す（通信不要）。
    /// あれば総括用プロンプトを返す
    pub fn begin_summary(&mut self) -> Result<Option<String>, SessionError> {
        if self.summarizing {
            return self.reject(SessionError::SummaryInFlight);
        }
        self.error = None;

        if self.results.is_empty() {
            self.summary = NO_RESULTS_TO_SUMMARIZE.to_string();
            return Ok(None);
        }

        self.summarizing = true;
        Ok(Some(build_summary_prompt(&self.results)))
    }

    pub fn summary_generated(&mut self, text: impl Into<String>) {
        if !self.results.is_empty() {
            self.summary = text.into();
        }
        self.summarizing = false;
    }

    pub fn summary_failed(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.summarizing = false;
    }

    // ---- リセット ----

    /// 「Upload Again」: 選択・結果・入力・エラーをすべて初期化
    ///
    /// サーバ疎通の再確認は呼び出し側が行う
    pub fn upload_again(&mut self) {
        self.selected.clear();
        self.chainage.clear();
        self.error = None;
        self.clear_results();
    }

    fn clear_results(&mut self) {
        self.results.clear();
        self.result_origins.clear();
        self.descriptions.clear();
        self.summary.clear();
        self.expanded = None;
    }

    fn finish_loading(&mut self) {
        self.loading = false;
        self.loading_state.reset();
    }

    fn reject<T>(&mut self, err: SessionError) -> Result<T, SessionError> {
        self.error = Some(err.to_string());
        Err(err)
    }
}
