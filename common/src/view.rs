//! セッションのテキスト表示
//!
//! 画面の各ブロック（位置情報・サーバ状態・解析中表示・結果カード・総括）を
//! 行単位の文字列に変換する

use crate::prompts::{format_coordinate, yes_no};
use crate::session::Session;
use crate::types::AnalysisResult;

/// 配信画像の読み込みに失敗したときの代替画像
pub const PLACEHOLDER_IMAGE_URL: &str =
    "https://placehold.co/150x100/cccccc/333333?text=Image+Not+Found";

/// 配信画像のURL
pub fn served_image_url(backend_url: &str, filename: &str) -> String {
    format!("{}/uploads/{}", backend_url.trim_end_matches('/'), filename)
}

/// 「Device Location」欄
pub fn location_line(session: &Session) -> String {
    match (session.location_denied(), session.location()) {
        (false, Some(coords)) => format!(
            "Lat: {}, Lon: {}",
            format_coordinate(Some(coords.lat)),
            format_coordinate(Some(coords.lon))
        ),
        _ => session
            .error()
            .unwrap_or("Location access denied by user")
            .to_string(),
    }
}

/// サーバ状態バナー
pub fn server_banner(session: &Session) -> String {
    format!("Backend server: {}", session.server().message)
}

/// エラーバナー（エラーが無ければNone）
pub fn error_banner(session: &Session) -> Option<String> {
    session.error().map(|e| format!("Error! {}", e))
}

/// 解析ボタンのラベル
pub fn run_button_label(session: &Session) -> String {
    format!("Run Analysis ({})", session.selected().len())
}

/// 解析中オーバーレイ
pub fn loading_overlay(session: &Session) -> Option<String> {
    if !session.is_loading() {
        return None;
    }
    let state = session.loading_state();
    Some(format!("{} {}%", state.message(), state.progress))
}

/// 信頼度を百分率表示 (0.91 → "91.00%")
pub fn format_confidence(score: f64) -> String {
    format!("{:.2}%", score * 100.0)
}

/// 結果カード
///
/// 信頼度は展開時のみ表示する
pub fn result_card(
    result: &AnalysisResult,
    expanded: bool,
    description: Option<&str>,
    backend_url: &str,
) -> Vec<String> {
    let mut lines = Vec::new();

    if !result.filename.is_empty() {
        lines.push(format!("[{}]", served_image_url(backend_url, &result.filename)));
    }
    lines.push(format!("Image: {}", result.filename));
    lines.push(format!("Chainage: {}", result.chainage().unwrap_or("N/A")));
    lines.push(format!(
        "GPS: Lat: {}, Lon: {}",
        format_coordinate(result.lat),
        format_coordinate(result.lon)
    ));
    lines.push(format!("GPS Valid: {}", yes_no(result.gps_valid)));
    if let Some(distance) = result.distance_to_route {
        lines.push(format!("Distance to Route: {} meters", distance));
    }
    if let Some(error) = &result.error {
        lines.push(format!("Processing error: {}", error));
    }

    lines.push("Detected Labels:".to_string());
    if result.labels.is_empty() {
        lines.push("  No objects detected above threshold.".to_string());
    } else {
        lines.extend(result.labels.iter().map(|l| format!("  - {}", l)));
    }

    if expanded {
        lines.push("Confidence Scores:".to_string());
        lines.extend(
            result
                .confidences
                .iter()
                .filter_map(|(label, score)| {
                    score.as_f64().map(|s| format!("  {}: {}", label, format_confidence(s)))
                }),
        );
    }

    if let Some(text) = description {
        lines.push("Description:".to_string());
        lines.push(format!("  {}", text));
    }

    lines
}

/// 全結果カードと総括
pub fn results_view(session: &Session, backend_url: &str) -> Vec<String> {
    let mut lines = Vec::new();
    if session.results().is_empty() {
        return lines;
    }

    lines.push("Analysis Results".to_string());
    for (index, result) in session.results().iter().enumerate() {
        lines.push(format!("--- #{} ---", index + 1));
        lines.extend(result_card(
            result,
            session.expanded() == Some(index),
            session.description(&result.filename),
            backend_url,
        ));
    }

    if !session.summary().is_empty() {
        lines.push("Overall Summary:".to_string());
        lines.push(session.summary().to_string());
    }

    lines
}
