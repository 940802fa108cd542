//! 端末位置の取得
//!
//! 取得手段は [`LocationProvider`] で差し替える。タイムアウトは
//! 手段によらず [`locate`] 側で `PositionOptions::timeout` を適用する

use serde::Deserialize;
use std::future::Future;
use survey_ai_common::{Coordinates, PositionError, PositionOptions};
use tokio::process::Command;
use tracing::{debug, warn};

pub trait LocationProvider {
    /// 位置取得手段があるか
    fn is_supported(&self) -> bool {
        true
    }

    /// 1回だけ測位する
    fn current_position(
        &self,
        options: &PositionOptions,
    ) -> impl Future<Output = Result<Coordinates, PositionError>> + Send;
}

/// タイムアウト付きで測位
pub async fn locate<L: LocationProvider>(
    provider: &L,
    options: &PositionOptions,
) -> Result<Coordinates, PositionError> {
    if !provider.is_supported() {
        return Err(PositionError::Unsupported);
    }

    match tokio::time::timeout(options.timeout, provider.current_position(options)).await {
        Ok(result) => result,
        Err(_) => Err(PositionError::Timeout),
    }
}

/// CLIで使う位置取得手段
#[derive(Debug, Clone)]
pub enum DeviceLocation {
    /// 引数・設定で与えた固定座標
    Fixed(Coordinates),
    /// 外部コマンドで測位
    Command(CommandLocation),
    /// 位置取得手段なし
    Unsupported,
}

impl LocationProvider for DeviceLocation {
    fn is_supported(&self) -> bool {
        !matches!(self, DeviceLocation::Unsupported)
    }

    async fn current_position(&self, options: &PositionOptions) -> Result<Coordinates, PositionError> {
        match self {
            DeviceLocation::Fixed(coords) => Ok(*coords),
            DeviceLocation::Command(command) => command.current_position(options).await,
            DeviceLocation::Unsupported => Err(PositionError::Unsupported),
        }
    }
}

/// 外部コマンドによる測位
///
/// 標準出力に `{"latitude": .., "longitude": ..}` を出すコマンドを想定
/// （Termux の `termux-location` など）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLocation {
    program: String,
    args: Vec<String>,
}

#[derive(Deserialize)]
struct LocatorOutput {
    #[serde(alias = "lat")]
    latitude: f64,
    #[serde(alias = "lon")]
    longitude: f64,
}

impl CommandLocation {
    /// 空白区切りのコマンドラインから作成
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    /// 実際に渡す引数
    ///
    /// `termux-location` を引数なしで指定した場合は精度設定に応じて補う
    pub fn args_for(&self, options: &PositionOptions) -> Vec<String> {
        if self.args.is_empty() && self.program.ends_with("termux-location") {
            let provider = if options.enable_high_accuracy { "gps" } else { "network" };
            return ["-p", provider, "-r", "once"].iter().map(|s| s.to_string()).collect();
        }
        self.args.clone()
    }

    async fn current_position(&self, options: &PositionOptions) -> Result<Coordinates, PositionError> {
        let args = self.args_for(options);
        debug!(program = %self.program, ?args, "running locator");

        let output = Command::new(&self.program)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => PositionError::Unsupported,
                _ => PositionError::Other(Some(e.to_string())),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(status = %output.status, stderr = %stderr.trim(), "locator failed");
            return Err(classify_failure(&stderr));
        }

        parse_locator_output(&String::from_utf8_lossy(&output.stdout))
    }
}

/// 失敗時の標準エラーから種別を判定
fn classify_failure(stderr: &str) -> PositionError {
    if stderr.to_lowercase().contains("permission") {
        PositionError::PermissionDenied
    } else {
        PositionError::PositionUnavailable
    }
}

/// コマンド出力をパース（出力が空なら測位できなかったとみなす）
pub fn parse_locator_output(stdout: &str) -> Result<Coordinates, PositionError> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Err(PositionError::PositionUnavailable);
    }

    serde_json::from_str::<LocatorOutput>(trimmed)
        .map(|o| Coordinates::new(o.latitude, o.longitude))
        .map_err(|e| PositionError::Other(Some(format!("unexpected locator output ({})", e))))
}
