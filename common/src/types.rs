//! 解析結果・入力画像の型定義
//!
//! CLIとバックエンド間で共有される型:
//! - AnalysisResult: `/upload` が返す1画像ぶんの解析結果
//! - UploadResponse: `/upload` のレスポンス全体
//! - SelectedImage: 送信前に選択された画像
//! - Coordinates / ImageSource: 位置情報と撮影元

use crate::error::{Error, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};

/// ラベル → 信頼度 (0..1)。バックエンドの返した順序を保つ
pub type Confidences = serde_json::Map<String, serde_json::Value>;

/// 同時に選択できる画像の上限（バックエンドは image1..image3 のみ受け付ける）
pub const MAX_IMAGES: usize = 3;

/// 対応する画像拡張子
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp", "gif"];

/// バックエンドの解析結果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// サーバ側で付与された保存ファイル名（`{8桁hex}_{元ファイル名}`）
    pub filename: String,

    /// 送信したチェイネージ（KM）のエコー
    #[serde(default)]
    pub chainage_km: Option<String>,

    #[serde(default)]
    pub lat: Option<f64>,

    #[serde(default)]
    pub lon: Option<f64>,

    #[serde(default)]
    pub gps_valid: bool,

    /// ルートまでの距離（m）。位置が不明なら null
    #[serde(default)]
    pub distance_to_route: Option<f64>,

    /// 閾値を超えた検出ラベル
    #[serde(default)]
    pub labels: Vec<String>,

    #[serde(default)]
    pub confidences: Confidences,

    /// 画像単位の処理失敗時にバックエンドが付けるメッセージ
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResult {
    /// 空文字のチェイネージは未入力として扱う
    pub fn chainage(&self) -> Option<&str> {
        self.chainage_km.as_deref().filter(|c| !c.is_empty())
    }
}

/// `/upload` のレスポンス
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadResponse {
    pub results: Vec<AnalysisResult>,
}

/// 緯度経度
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// 画像の取得元
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSource {
    /// その場で撮影（端末の位置情報を添付できる）
    Camera,
    /// 既存ファイル・ドラッグ&ドロップ（位置情報は添付しない）
    Gallery,
}

impl ImageSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSource::Camera => "camera",
            ImageSource::Gallery => "gallery",
        }
    }
}

impl std::str::FromStr for ImageSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "camera" | "photo" => Ok(ImageSource::Camera),
            "gallery" | "upload" => Ok(ImageSource::Gallery),
            _ => Err(format!("Unknown image source: {}. Use camera or gallery", s)),
        }
    }
}

impl std::fmt::Display for ImageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 選択済み画像
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedImage {
    /// セッション内で一意なID（Sessionが採番）
    pub id: u64,
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    /// プレビュー用Data URL
    pub preview: String,
}

impl SelectedImage {
    /// バイト列から選択画像を作成（idはSessionへの追加時に振り直される）
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let file_name = file_name.into();
        let mime_type = mime_type_for(&file_name)
            .ok_or_else(|| Error::InvalidImage(file_name.clone()))?
            .to_string();
        let preview = data_url(&mime_type, &bytes);

        Ok(Self {
            id: 0,
            file_name,
            mime_type,
            bytes,
            preview,
        })
    }
}

/// 拡張子からMIMEタイプを推定
pub fn mime_type_for(file_name: &str) -> Option<&'static str> {
    let ext = file_name.rsplit_once('.')?.1.to_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

/// Data URL (`data:image/jpeg;base64,...`) を生成
pub fn data_url(mime_type: &str, bytes: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{};base64,{}", mime_type, encoded)
}
