//! 対話モード
//!
//! 1画面のUIをメニュー操作で再現する。結果が無い間は入力メニュー、
//! 結果が出たら結果メニューを表示する

use crate::app::App;
use crate::display::{loading_bar, print_session, update_loading_bar};
use crate::error::{Result, SurveyAiError};
use crate::location::LocationProvider;
use crate::report::SurveyReport;
use crate::scanner;
use dialoguer::{Input, Select};
use std::path::PathBuf;
use survey_ai_common::ImageSource;

/// メニュー項目
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    TakePhoto,
    UploadImages,
    RemoveImage,
    SetChainage,
    RunAnalysis,
    ToggleDetails,
    GenerateDescription,
    Summarize,
    SaveReport,
    DownloadImages,
    UploadAgain,
    RefreshLocation,
    RefreshServer,
    Quit,
}

impl MenuAction {
    pub fn label(&self) -> &'static str {
        match self {
            MenuAction::TakePhoto => "Take Photo",
            MenuAction::UploadImages => "Upload Images",
            MenuAction::RemoveImage => "Remove Image",
            MenuAction::SetChainage => "Manual Chainage (KM)",
            MenuAction::RunAnalysis => "Run Analysis",
            MenuAction::ToggleDetails => "Show/Hide Confidence Scores",
            MenuAction::GenerateDescription => "Generate Description",
            MenuAction::Summarize => "Summarize All Results",
            MenuAction::SaveReport => "Save Report",
            MenuAction::DownloadImages => "Download Analyzed Images",
            MenuAction::UploadAgain => "Upload Again",
            MenuAction::RefreshLocation => "Refresh Location",
            MenuAction::RefreshServer => "Refresh Server Status",
            MenuAction::Quit => "Quit",
        }
    }
}

/// 現在の状態で選べる項目
pub fn menu_actions(has_results: bool, has_images: bool, can_run: bool) -> Vec<MenuAction> {
    let mut actions = Vec::new();
    if has_results {
        actions.extend([
            MenuAction::ToggleDetails,
            MenuAction::GenerateDescription,
            MenuAction::Summarize,
            MenuAction::SaveReport,
            MenuAction::DownloadImages,
            MenuAction::UploadAgain,
        ]);
    } else {
        actions.extend([MenuAction::TakePhoto, MenuAction::UploadImages]);
        if has_images {
            actions.push(MenuAction::RemoveImage);
        }
        actions.push(MenuAction::SetChainage);
        if can_run {
            actions.push(MenuAction::RunAnalysis);
        }
    }
    actions.extend([MenuAction::RefreshLocation, MenuAction::RefreshServer, MenuAction::Quit]);
    actions
}

fn cli_error(e: dialoguer::Error) -> SurveyAiError {
    SurveyAiError::CliExecution(e.to_string())
}

fn prompt_text(prompt: &str) -> Result<String> {
    Input::<String>::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()
        .map_err(cli_error)
}

/// 1始まりの番号を入力させる
fn prompt_index(prompt: &str, count: usize) -> Result<Option<usize>> {
    if count == 0 {
        return Ok(None);
    }
    let items: Vec<String> = (1..=count).map(|n| format!("#{}", n)).collect();
    let selection = Select::new()
        .with_prompt(prompt)
        .items(&items)
        .default(0)
        .interact_opt()
        .map_err(cli_error)?;
    Ok(selection)
}

pub async fn run<L: LocationProvider>(app: &mut App<L>) -> Result<()> {
    println!("📷 survey-ai - Survey Image Analysis\n");
    app.start().await;

    loop {
        let backend_url = app.backend().base_url().to_string();
        print_session(app.session(), &backend_url);

        let session = app.session();
        let actions = menu_actions(
            !session.results().is_empty(),
            !session.selected().is_empty(),
            session.can_run_analysis(),
        );
        let labels: Vec<String> = actions
            .iter()
            .map(|a| match a {
                MenuAction::RunAnalysis => survey_ai_common::view::run_button_label(session),
                other => other.label().to_string(),
            })
            .collect();

        let Some(choice) = Select::new()
            .with_prompt("操作を選択")
            .items(&labels)
            .default(0)
            .interact_opt()
            .map_err(cli_error)?
        else {
            break;
        };

        match actions[choice] {
            MenuAction::TakePhoto => add_images(app, ImageSource::Camera)?,
            MenuAction::UploadImages => add_images(app, ImageSource::Gallery)?,
            MenuAction::RemoveImage => {
                if let Some(index) = prompt_index("削除する画像", app.session().selected().len())? {
                    app.remove_image(index);
                }
            }
            MenuAction::SetChainage => {
                let chainage = prompt_text("Chainage (KM)")?;
                app.set_chainage(chainage.trim());
            }
            MenuAction::RunAnalysis => {
                let bar = loading_bar();
                app.run_analysis(|s| update_loading_bar(&bar, s)).await;
                bar.finish_and_clear();
            }
            MenuAction::ToggleDetails => {
                if let Some(index) = prompt_index("結果", app.session().results().len())? {
                    app.toggle_result(index);
                }
            }
            MenuAction::GenerateDescription => {
                if let Some(index) = prompt_index("説明文を生成する結果", app.session().results().len())? {
                    println!("- 説明文を生成中...");
                    app.generate_image_description(index).await;
                }
            }
            MenuAction::Summarize => {
                println!("- 総括を生成中...");
                app.generate_overall_summary().await;
            }
            MenuAction::SaveReport => {
                let path = prompt_text("保存先 (report.json)")?;
                let path = if path.trim().is_empty() { "report.json".to_string() } else { path };
                let report = SurveyReport::from_session(app.session(), &backend_url);
                match report.save(&PathBuf::from(path.trim())) {
                    Ok(()) => println!("✔ レポートを保存: {}", path.trim()),
                    Err(e) => println!("保存エラー: {}", e),
                }
            }
            MenuAction::DownloadImages => {
                let dir = prompt_text("保存先フォルダ (uploads)")?;
                let dir = if dir.trim().is_empty() { "uploads".to_string() } else { dir };
                download_images(app, &PathBuf::from(dir.trim())).await;
            }
            MenuAction::UploadAgain => app.upload_again().await,
            MenuAction::RefreshLocation => app.get_location().await,
            MenuAction::RefreshServer => app.check_server_status().await,
            MenuAction::Quit => break,
        }
    }

    Ok(())
}

fn add_images<L: LocationProvider>(app: &mut App<L>, source: ImageSource) -> Result<()> {
    let input = prompt_text("画像ファイル/フォルダ（空白区切り）")?;
    let paths: Vec<PathBuf> = input.split_whitespace().map(PathBuf::from).collect();
    if paths.is_empty() {
        return Ok(());
    }

    let images = match scanner::collect_images(&paths) {
        Ok(images) => images,
        Err(e) => {
            println!("⚠ {}", e);
            return Ok(());
        }
    };

    let mut loaded = Vec::new();
    for path in &images {
        match scanner::load_image(path) {
            Ok(image) => loaded.push(image),
            Err(e) => println!("⚠ {}: {}", path.display(), e),
        }
    }

    let offered = loaded.len();
    let accepted = app.add_images(loaded, source);
    if accepted < offered {
        println!("- 上限{}枚のため{}枚を追加しませんでした", survey_ai_common::MAX_IMAGES, offered - accepted);
    }
    Ok(())
}

/// 解析済み画像を保存
pub async fn download_images<L: LocationProvider>(app: &App<L>, dir: &std::path::Path) {
    for result in app.session().results() {
        match app.backend().download_image(&result.filename, dir).await {
            crate::backend::ServedImage::Saved(path) => println!("✔ {}", path.display()),
            crate::backend::ServedImage::Placeholder(url) => {
                println!("✖ {} (placeholder: {})", result.filename, url)
            }
        }
    }
}
