//! LLMレスポンスパーサー
//!
//! 生成テキストのフィールド名はサーバにより異なるため、
//! `text` → `generated_text` → `response` の順で最初の空でない値を採用する

use serde_json::Value;

/// 生成テキストとして受け付けるフィールド（優先順）
pub const TEXT_FIELDS: &[&str] = &["text", "generated_text", "response"];

/// JSONオブジェクトから生成テキストを取り出す
///
/// # Examples
/// ```
/// use survey_ai_common::extract_generated_text;
/// use serde_json::json;
///
/// let body = json!({"response": "A cone was observed near KM 10.5."});
/// assert_eq!(
///     extract_generated_text(&body).as_deref(),
///     Some("A cone was observed near KM 10.5.")
/// );
/// assert_eq!(extract_generated_text(&json!({})), None);
/// ```
pub fn extract_generated_text(body: &Value) -> Option<String> {
    first_text(body).map(str::to_string)
}

fn first_text(body: &Value) -> Option<&str> {
    TEXT_FIELDS
        .iter()
        .filter_map(|field| body.get(*field).and_then(Value::as_str))
        .find(|text| !text.is_empty())
}

/// レスポンス本文から生成テキストを取り出す
///
/// 単一JSONとして読めない場合は、1行1JSONのストリーム形式
/// （各チャンクの `response` を連結）として解釈する
pub fn parse_generated_body(body: &str) -> Option<String> {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        return extract_generated_text(&value);
    }

    let mut text = String::new();
    let mut chunks = 0;
    for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let value: Value = serde_json::from_str(line).ok()?;
        if let Some(part) = first_text(&value) {
            text.push_str(part);
        }
        chunks += 1;
    }

    if chunks == 0 || text.is_empty() {
        None
    } else {
        Some(text)
    }
}
