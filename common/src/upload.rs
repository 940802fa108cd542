//! `/upload` 送信内容の組み立て
//!
//! multipartの各フィールドを実際の送信から切り離して作る。
//! N = 1..件数 について `image{N}` / `chainage_km_{N}` / `lat{N}` / `lon{N}` を含む

use crate::types::{Coordinates, ImageSource, SelectedImage};

/// multipartの1フィールド
#[derive(Debug, Clone, PartialEq)]
pub enum UploadField {
    Text { name: String, value: String },
    File {
        name: String,
        file_name: String,
        mime_type: String,
        bytes: Vec<u8>,
    },
}

impl UploadField {
    pub fn name(&self) -> &str {
        match self {
            UploadField::Text { name, .. } | UploadField::File { name, .. } => name,
        }
    }

    fn text(name: String, value: impl Into<String>) -> Self {
        UploadField::Text { name, value: value.into() }
    }
}

/// 送信フォーム
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadForm {
    pub fields: Vec<UploadField>,
    /// 各 `image{N}` の元になった選択画像ID（送信順）
    pub image_ids: Vec<u64>,
}

impl UploadForm {
    /// テキストフィールドの値を取得
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.iter().find_map(|f| match f {
            UploadField::Text { name: n, value } if n == name => Some(value.as_str()),
            _ => None,
        })
    }
}

/// 送信フォームを組み立て
///
/// 位置情報は撮影元がカメラかつ座標取得済みの場合のみ添付する。
/// ギャラリー画像は座標が分かっていても空文字を送る
pub fn build_upload_form(
    images: &[SelectedImage],
    chainage: &str,
    source: Option<ImageSource>,
    location: Option<Coordinates>,
) -> UploadForm {
    let attached = match (source, location) {
        (Some(ImageSource::Camera), Some(coords)) => Some(coords),
        _ => None,
    };

    let mut fields = Vec::with_capacity(images.len() * 4);
    for (index, image) in images.iter().enumerate() {
        let n = index + 1;
        fields.push(UploadField::File {
            name: format!("image{}", n),
            file_name: image.file_name.clone(),
            mime_type: image.mime_type.clone(),
            bytes: image.bytes.clone(),
        });
        fields.push(UploadField::text(format!("chainage_km_{}", n), chainage));

        let (lat, lon) = attached
            .map(|c| (c.lat.to_string(), c.lon.to_string()))
            .unwrap_or_default();
        fields.push(UploadField::text(format!("lat{}", n), lat));
        fields.push(UploadField::text(format!("lon{}", n), lon));
    }

    UploadForm {
        fields,
        image_ids: images.iter().map(|i| i.id).collect(),
    }
}
