//! プロンプト生成モジュール
//!
//! LLMエンドポイントに送るテキストを組み立てる:
//! - build_description_prompt: 1画像の説明文用
//! - build_summary_prompt: 全結果の総括用

use crate::types::AnalysisResult;

/// 座標を小数4桁で整形（不明なら "N/A"）
pub fn format_coordinate(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.4}", v))
        .unwrap_or_else(|| "N/A".to_string())
}

/// `GPS Valid` 表示
pub fn yes_no(value: bool) -> &'static str {
    if value { "Yes" } else { "No" }
}

/// 説明文プロンプト生成
///
/// # Arguments
/// * `result` - 対象の解析結果
///
/// # Returns
/// 検出物・信頼度・位置・チェイネージ・ルート距離を埋め込んだプロンプト
pub fn build_description_prompt(result: &AnalysisResult) -> String {
    let detected = if result.labels.is_empty() {
        "None detected".to_string()
    } else {
        result.labels.join(", ")
    };
    let confidences =
        serde_json::to_string(&result.confidences).unwrap_or_else(|_| "{}".to_string());
    let distance = result
        .distance_to_route
        .map(|d| format!("{} meters", d))
        .unwrap_or_else(|| "N/A".to_string());

    format!(
        r#"Analyze the following survey image data and provide a concise, professional description of the scene in a single paragraph. Focus on detected objects and their relevance to a road construction survey.
Detected objects: {detected}
Confidences: {confidences}
Location: Latitude {lat}, Longitude {lon}
Chainage: {chainage} KM
GPS Valid: {gps_valid}
Distance to Route: {distance}

Example of desired output: 'The image taken at KM 10.5 shows a road under construction with a total station and tripod, indicating active surveying work. GPS coordinates are within 50 meters of the planned route.'"#,
        lat = format_coordinate(result.lat),
        lon = format_coordinate(result.lon),
        chainage = result.chainage().unwrap_or("N/A"),
        gps_valid = yes_no(result.gps_valid),
    )
}

/// 総括プロンプト生成
///
/// 結果ごとにファイル名・検出物・GPS・チェイネージを列挙する。
/// ルート距離は値がある結果のみ出力
pub fn build_summary_prompt(results: &[AnalysisResult]) -> String {
    let mut prompt = String::from(
        "Summarize the findings from the following survey image analyses. Provide an overview of the detected objects, GPS validity, and any notable observations across all images. Keep the summary concise and professional, ideally in 2-3 paragraphs.\n\n",
    );

    for (index, result) in results.iter().enumerate() {
        let detected = if result.labels.is_empty() {
            "None".to_string()
        } else {
            result.labels.join(", ")
        };

        prompt.push_str(&format!("Image {} ({}):\n", index + 1, result.filename));
        prompt.push_str(&format!("  - Detected: {}\n", detected));
        prompt.push_str(&format!(
            "  - GPS: Lat {}, Lon {} (Valid: {})\n",
            format_coordinate(result.lat),
            format_coordinate(result.lon),
            yes_no(result.gps_valid)
        ));
        prompt.push_str(&format!(
            "  - Chainage: {} KM\n",
            result.chainage().unwrap_or("N/A")
        ));
        if let Some(distance) = result.distance_to_route {
            prompt.push_str(&format!("  - Distance to Route: {} meters\n", distance));
        }
        prompt.push('\n');
    }

    prompt
}
