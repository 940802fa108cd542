//! 位置情報取得の失敗種別とメッセージ

use std::time::Duration;
use thiserror::Error;

/// 位置取得オプション
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    pub timeout: Duration,
    /// キャッシュ済み位置を許容する古さ（0ならその場で測位）
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::ZERO,
        }
    }
}

/// 位置取得エラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PositionError {
    #[error("Location access denied by user. Please enable location permissions in your browser/device settings.")]
    PermissionDenied,
    #[error("Location information is unavailable.")]
    PositionUnavailable,
    #[error("The request to get user location timed out.")]
    Timeout,
    /// その他（メッセージがあれば表示に含める）
    #[error("{}", other_message(.0.as_deref()))]
    Other(Option<String>),
    /// 端末に位置取得手段がない
    #[error("Geolocation is not supported on this device.")]
    Unsupported,
}

fn other_message(message: Option<&str>) -> String {
    match message {
        Some(message) if !message.is_empty() => format!("Location error: {}", message),
        _ => "Location access denied by user.".to_string(),
    }
}

impl PositionError {
    /// 画面表示用メッセージ
    pub fn message(&self) -> String {
        self.to_string()
    }
}
