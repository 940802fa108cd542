//! 端末への表示

use indicatif::{ProgressBar, ProgressStyle};
use survey_ai_common::view::{
    error_banner, location_line, results_view, run_button_label, server_banner,
};
use survey_ai_common::Session;

/// 位置情報・サーバ状態・エラー
pub fn print_status(session: &Session) {
    println!("📍 Device Location: {}", location_line(session));
    let mark = if session.server().accessible { "✔" } else { "✖" };
    println!("{} {}", mark, server_banner(session));
}

pub fn print_error(session: &Session) {
    if let Some(banner) = error_banner(session) {
        println!("⚠ {}", banner);
    }
}

/// 入力画面（結果が無い間）
pub fn print_selection(session: &Session) {
    let chainage = if session.chainage().is_empty() { "-" } else { session.chainage() };
    println!("Manual Chainage (KM): {}", chainage);
    for (index, image) in session.selected().iter().enumerate() {
        println!("  [{}] {} ({} bytes)", index + 1, image.file_name, image.bytes.len());
    }
    let hint = if session.can_run_analysis() { "" } else { " (disabled)" };
    println!("{}{}", run_button_label(session), hint);
}

pub fn print_results(session: &Session, backend_url: &str) {
    for line in results_view(session, backend_url) {
        println!("{}", line);
    }
}

/// 画面全体
pub fn print_session(session: &Session, backend_url: &str) {
    println!();
    print_status(session);
    if session.results().is_empty() {
        print_selection(session);
    } else {
        print_results(session, backend_url);
    }
    print_error(session);
}

/// 解析中オーバーレイのプログレスバー
pub fn loading_bar() -> ProgressBar {
    let bar = ProgressBar::new(100);
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg:<36} [{bar:40}] {pos}%") {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}

/// オーバーレイをセッションの状態に合わせる
pub fn update_loading_bar(bar: &ProgressBar, session: &Session) {
    let state = session.loading_state();
    bar.set_position(state.progress as u64);
    bar.set_message(state.message());
}
