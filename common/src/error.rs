//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Unsupported image file: {0}")]
    InvalidImage(String),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

/// セッション操作の前提条件違反
///
/// Displayはそのまま画面のエラーバナーに表示される
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Please select at least one image for analysis.")]
    NoImagesSelected,

    #[error("Cannot run analysis: Backend server is not accessible.")]
    ServerNotAccessible,

    #[error("Analysis is already running.")]
    AnalysisInProgress,

    #[error("No analysis result at index {0}.")]
    NoSuchResult(usize),

    #[error("No selected image at index {0}.")]
    NoSuchImage(usize),

    #[error("A description is already being generated for image {}.", .0 + 1)]
    DescriptionInFlight(usize),

    #[error("A summary is already being generated.")]
    SummaryInFlight,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_io() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error = Error::Io(io_error);
        let display = format!("{}", error);
        assert!(display.contains("IO error"));
        assert!(display.contains("file not found"));
    }

    #[test]
    fn test_error_display_json() {
        let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let error = Error::Json(json_error);
        assert!(format!("{}", error).contains("JSON error"));
    }

    #[test]
    fn test_error_from_io() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let error: Error = io_error.into();
        assert!(matches!(error, Error::Io(_)));
    }

    #[test]
    fn test_session_error_messages() {
        assert_eq!(
            SessionError::NoImagesSelected.to_string(),
            "Please select at least one image for analysis."
        );
        assert_eq!(
            SessionError::ServerNotAccessible.to_string(),
            "Cannot run analysis: Backend server is not accessible."
        );
        assert_eq!(
            SessionError::DescriptionInFlight(0).to_string(),
            "A description is already being generated for image 1."
        );
    }
}
