use clap::Parser;
use survey_ai::{cli, config, display, error, interactive, scanner};
use survey_ai::app::App;
use survey_ai::backend::BackendClient;
use survey_ai::llm::LlmClient;
use survey_ai::location::{CommandLocation, DeviceLocation};
use survey_ai::report::SurveyReport;
use cli::{Cli, Commands};
use config::Config;
use error::{Result, SurveyAiError};
use survey_ai_common::{Coordinates, PositionOptions};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = Config::load()?;
    if let Some(url) = &cli.backend_url {
        config.backend_url = url.clone();
    }
    if let Some(url) = &cli.llm_url {
        config.llm_api_url = url.clone();
    }
    let fixed_location = cli.lat.zip(cli.lon).map(|(lat, lon)| Coordinates::new(lat, lon));

    match cli.command {
        Commands::Status => {
            let mut app = build_app(&config, fixed_location);
            app.start().await;
            display::print_status(app.session());
            display::print_error(app.session());
            if !app.session().server().accessible {
                return Err(SurveyAiError::CliExecution(app.session().server().message.clone()));
            }
        }

        Commands::Analyze { images, chainage, source, expand, describe, summarize, output, save_images } => {
            println!("📸 survey-ai - 写真解析\n");

            let paths = scanner::collect_images(&images)?;
            if paths.is_empty() {
                return Err(SurveyAiError::NoImagesFound(
                    images.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", "),
                ));
            }
            let loaded = paths
                .iter()
                .map(|p| scanner::load_image(p))
                .collect::<Result<Vec<_>>>()?;

            let mut app = build_app(&config, fixed_location);

            // 1. 位置・疎通確認
            println!("[1/3] 端末位置とバックエンドを確認中...");
            app.start().await;
            display::print_status(app.session());

            let offered = loaded.len();
            let accepted = app.add_images(loaded, source);
            println!("✔ {}枚の写真を選択 ({})", accepted, source);
            if accepted < offered {
                println!("- 上限{}枚のため{}枚を除外", survey_ai_common::MAX_IMAGES, offered - accepted);
            }
            if let Some(chainage) = chainage {
                app.set_chainage(chainage.trim());
            }

            // 2. 解析
            println!("\n[2/3] 解析中...");
            let bar = display::loading_bar();
            app.run_analysis(|s| display::update_loading_bar(&bar, s)).await;
            bar.finish_and_clear();
            if let Some(err) = app.session().error() {
                return Err(SurveyAiError::CliExecution(err.to_string()));
            }
            println!("✔ {}件の解析結果\n", app.session().results().len());

            // 3. 説明文・総括
            let mut failures = Vec::new();
            if describe {
                println!("[3/3] 説明文を生成中...");
                for index in 0..app.session().results().len() {
                    app.generate_image_description(index).await;
                    failures.extend(app.session().error().map(str::to_string));
                }
            }
            if summarize {
                println!("[3/3] 総括を生成中...");
                app.generate_overall_summary().await;
                failures.extend(app.session().error().map(str::to_string));
            }
            if let Some(index) = expand {
                app.toggle_result(index.saturating_sub(1));
            }

            display::print_results(app.session(), &config.backend_url);
            for failure in &failures {
                println!("⚠ Error! {}", failure);
            }

            if let Some(dir) = save_images {
                println!("\n- 解析済み画像を保存中...");
                interactive::download_images(&app, &dir).await;
            }

            if let Some(path) = output {
                let report = SurveyReport::from_session(app.session(), &config.backend_url);
                report.save(&path)?;
                println!("✔ 結果を保存: {}", path.display());
            }

            println!("\n✅ 解析完了");
        }

        Commands::Describe { report: path, index } => {
            println!("📝 survey-ai - 説明文生成\n");
            let mut report = SurveyReport::load(&path)?;
            let mut app = build_app(&config, fixed_location).with_session(report.clone().into_session());

            let targets: Vec<usize> = match index {
                Some(n) => vec![n.saturating_sub(1)],
                None => (0..app.session().results().len()).collect(),
            };

            let mut failures = 0;
            for target in targets {
                app.generate_image_description(target).await;
                if app.session().error().is_some() {
                    display::print_error(app.session());
                    failures += 1;
                } else if let Some(result) = app.session().results().get(target) {
                    println!("✔ {}", result.filename);
                }
            }

            report.update_from(app.session());
            report.save(&path)?;
            display::print_results(app.session(), &report.backend_url);
            println!("\n✔ 保存しました: {}", path.display());

            if failures > 0 {
                return Err(SurveyAiError::CliExecution(format!("{}件の説明文生成に失敗しました", failures)));
            }
        }

        Commands::Summarize { report: path } => {
            println!("📄 survey-ai - 総括生成\n");
            let mut report = SurveyReport::load(&path)?;
            let mut app = build_app(&config, fixed_location).with_session(report.clone().into_session());

            app.generate_overall_summary().await;
            if let Some(err) = app.session().error() {
                return Err(SurveyAiError::CliExecution(err.to_string()));
            }

            println!("Overall Summary:\n{}", app.session().summary());
            report.update_from(app.session());
            report.save(&path)?;
            println!("\n✔ 保存しました: {}", path.display());
        }

        Commands::Interactive => {
            let mut app = build_app(&config, fixed_location);
            interactive::run(&mut app).await?;
        }

        Commands::Config {
            set_backend_url,
            set_llm_url,
            set_model,
            set_location,
            set_location_command,
            clear_location,
            show,
        } => {
            // 引数・環境変数による一時的な上書きは保存しない
            let mut saved = Config::load_from(&Config::config_path()?)?;
            let mut changed = false;

            if let Some(url) = set_backend_url {
                saved.backend_url = url;
                changed = true;
            }
            if let Some(url) = set_llm_url {
                saved.llm_api_url = url;
                changed = true;
            }
            if let Some(model) = set_model {
                saved.llm_model = model;
                changed = true;
            }
            if clear_location {
                saved.device_location = None;
                saved.location_command = None;
                changed = true;
            }
            if let Some(coords) = set_location {
                saved.device_location = Some(coords);
                changed = true;
            }
            if let Some(command) = set_location_command {
                saved.location_command = Some(command);
                changed = true;
            }

            if changed {
                saved.save()?;
                println!("✔ 設定を保存しました");
            }

            if show || !changed {
                let effective = saved.with_env_overrides();
                println!("設定:");
                println!("  バックエンド: {}", effective.backend_url);
                println!("  LLM: {} ({})", effective.llm_api_url, effective.llm_model);
                println!("  疎通確認タイムアウト: {}s", effective.health_timeout_seconds);
                println!("  位置取得タイムアウト: {}s", effective.location_timeout_seconds);
                match (&effective.device_location, &effective.location_command) {
                    (Some(c), _) => println!("  端末位置: 固定 ({}, {})", c.lat, c.lon),
                    (None, Some(cmd)) => println!("  端末位置: コマンド `{}`", cmd),
                    (None, None) => println!("  端末位置: 未設定"),
                }
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("survey_ai=debug,survey_ai_common=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// 位置取得手段を決定（引数 > 設定の固定位置 > 設定のコマンド）
fn device_location(config: &Config, fixed: Option<Coordinates>) -> DeviceLocation {
    if let Some(coords) = fixed.or(config.device_location) {
        return DeviceLocation::Fixed(coords);
    }
    config
        .location_command
        .as_deref()
        .and_then(CommandLocation::from_command_line)
        .map(DeviceLocation::Command)
        .unwrap_or(DeviceLocation::Unsupported)
}

fn build_app(config: &Config, fixed: Option<Coordinates>) -> App<DeviceLocation> {
    let backend = BackendClient::new(config.backend_url.clone(), config.health_timeout());
    let llm = LlmClient::new(config.llm_api_url.clone(), config.llm_model.clone());
    let options = PositionOptions {
        timeout: config.location_timeout(),
        ..PositionOptions::default()
    };
    App::new(backend, llm, device_location(config, fixed), options)
}
