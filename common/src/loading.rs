//! 解析中オーバーレイの表示状態
//!
//! メッセージは1.5秒ごとに巡回し、進捗は100msごとに1%ずつ10秒で100%に達する。
//! 実際の通信の進み具合とは無関係

use std::time::Duration;

/// 巡回表示するメッセージ
pub const LOADING_MESSAGES: [&str; 8] = [
    "MODEL IS LOADING...",
    "MODEL IS GETTING READY...",
    "MODEL IS FUELING UP...",
    "ANALYZING PIXELS...",
    "CRUNCHING DATA...",
    "ALIGNING SATELLITES...",
    "PERFORMING ADVANCED CALCULATIONS...",
    "GENERATING INSIGHTS...",
];

pub const MESSAGE_INTERVAL: Duration = Duration::from_millis(1500);
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);
pub const PROGRESS_DURATION: Duration = Duration::from_secs(10);

/// 進捗の総ステップ数 (10s / 100ms)
pub const PROGRESS_STEPS: u32 =
    (PROGRESS_DURATION.as_millis() / PROGRESS_INTERVAL.as_millis()) as u32;

/// タイマーから届く更新
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadingTick {
    /// 次のメッセージへ
    Message,
    /// 進捗ステップ（1始まり）
    Progress(u32),
}

/// ステップ番号から進捗率 (0..=100)
pub fn progress_for_step(step: u32) -> u8 {
    let percent = (step as f64 / PROGRESS_STEPS as f64 * 100.0).round();
    percent.min(100.0) as u8
}

/// オーバーレイの状態
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadingState {
    pub message_index: usize,
    pub progress: u8,
}

impl LoadingState {
    pub fn message(&self) -> &'static str {
        LOADING_MESSAGES[self.message_index % LOADING_MESSAGES.len()]
    }

    pub fn apply(&mut self, tick: LoadingTick) {
        match tick {
            LoadingTick::Message => {
                self.message_index = (self.message_index + 1) % LOADING_MESSAGES.len();
            }
            LoadingTick::Progress(step) => self.progress = progress_for_step(step),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
