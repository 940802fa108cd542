use clap::{Parser, Subcommand};
use std::path::PathBuf;
use survey_ai_common::{Coordinates, ImageSource};

#[derive(Parser)]
#[command(name = "survey-ai")]
#[command(about = "道路測量写真のAI解析クライアント", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 解析バックエンドのURL（設定より優先）
    #[arg(long, global = true)]
    pub backend_url: Option<String>,

    /// LLMエンドポイントのURL（設定より優先）
    #[arg(long, global = true)]
    pub llm_url: Option<String>,

    /// 端末の緯度（指定時は固定位置を使う）
    #[arg(long, global = true, requires = "lon", allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// 端末の経度
    #[arg(long, global = true, requires = "lat", allow_hyphen_values = true)]
    pub lon: Option<f64>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// バックエンドの疎通と端末位置を確認
    Status,

    /// 画像を送信して解析
    Analyze {
        /// 画像ファイルまたはフォルダ（最大3枚）
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// チェイネージ（KM）
        #[arg(short, long)]
        chainage: Option<String>,

        /// 画像の取得元 (camera/gallery)。cameraのときのみ位置情報を添付
        #[arg(long, default_value = "gallery")]
        source: ImageSource,

        /// 信頼度を展開表示する結果番号（1始まり）
        #[arg(short, long)]
        expand: Option<usize>,

        /// 各画像の説明文を生成
        #[arg(short, long)]
        describe: bool,

        /// 全結果の総括を生成
        #[arg(short, long)]
        summarize: bool,

        /// レポートJSONの出力先
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 解析済み画像の保存先フォルダ
        #[arg(long)]
        save_images: Option<PathBuf>,
    },

    /// 保存済みレポートの結果に説明文を生成
    Describe {
        /// レポートJSONファイル
        #[arg(required = true)]
        report: PathBuf,

        /// 対象の結果番号（1始まり、省略時は全件）
        #[arg(short, long)]
        index: Option<usize>,
    },

    /// 保存済みレポートの総括を生成
    Summarize {
        /// レポートJSONファイル
        #[arg(required = true)]
        report: PathBuf,
    },

    /// 対話モード
    Interactive,

    /// 設定を表示/編集
    Config {
        /// バックエンドURLを設定
        #[arg(long)]
        set_backend_url: Option<String>,

        /// LLMエンドポイントを設定
        #[arg(long)]
        set_llm_url: Option<String>,

        /// LLMモデルを設定
        #[arg(long)]
        set_model: Option<String>,

        /// 固定の端末位置を設定 (例: 28.6139,77.2090)
        #[arg(long, value_parser = parse_coordinates, allow_hyphen_values = true)]
        set_location: Option<Coordinates>,

        /// 位置取得コマンドを設定 (例: termux-location)
        #[arg(long)]
        set_location_command: Option<String>,

        /// 固定位置と位置取得コマンドを解除
        #[arg(long)]
        clear_location: bool,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

/// "lat,lon" 形式の座標
pub fn parse_coordinates(s: &str) -> Result<Coordinates, String> {
    let (lat, lon) = s
        .split_once(',')
        .ok_or_else(|| format!("Invalid coordinates: {}. Use LAT,LON", s))?;
    let lat: f64 = lat.trim().parse().map_err(|_| format!("Invalid latitude: {}", lat))?;
    let lon: f64 = lon.trim().parse().map_err(|_| format!("Invalid longitude: {}", lon))?;

    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(format!("Coordinates out of range: {}", s));
    }
    Ok(Coordinates::new(lat, lon))
}
