use crate::error::{Result, SurveyAiError};
use std::path::{Path, PathBuf};
use survey_ai_common::types::IMAGE_EXTENSIONS;
use survey_ai_common::SelectedImage;
use walkdir::WalkDir;

fn is_image_path(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// フォルダ直下の画像をファイル名順に列挙
pub fn scan_folder(folder: &Path) -> Result<Vec<PathBuf>> {
    if !folder.exists() {
        return Err(SurveyAiError::FileNotFound(folder.display().to_string()));
    }

    let mut images: Vec<PathBuf> = WalkDir::new(folder)
        .max_depth(1)  // 直下のみ（再帰しない）
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && is_image_path(p))
        .collect();

    images.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    Ok(images)
}

/// 引数のパス群を画像ファイルに展開（フォルダは直下を走査）
pub fn collect_images(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for path in paths {
        if path.is_dir() {
            images.extend(scan_folder(path)?);
        } else if path.is_file() {
            images.push(path.clone());
        } else {
            return Err(SurveyAiError::FileNotFound(path.display().to_string()));
        }
    }
    Ok(images)
}

/// 画像ファイルを読み込んで選択画像にする
pub fn load_image(path: &Path) -> Result<SelectedImage> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let bytes = std::fs::read(path)?;
    Ok(SelectedImage::from_bytes(file_name, bytes)?)
}
