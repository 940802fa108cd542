use thiserror::Error;

#[derive(Error, Debug)]
pub enum SurveyAiError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("画像が見つかりません: {0}")]
    NoImagesFound(String),

    /// バックエンドが2xx以外を返した
    #[error("HTTP error! status: {0}")]
    HttpStatus(u16),

    /// LLMエンドポイントが2xx以外を返した
    #[error("LLM API HTTP error! status: {0}")]
    LlmHttpStatus(u16),

    #[error("Unexpected LLM response structure.")]
    UnexpectedLlmResponse,

    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] survey_ai_common::Error),

    #[error("CLI実行エラー: {0}")]
    CliExecution(String),
}

pub type Result<T> = std::result::Result<T, SurveyAiError>;
