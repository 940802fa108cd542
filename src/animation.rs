//! 解析中アニメーションのタイマー
//!
//! メッセージ巡回と進捗の2つのタスクを起動し、更新をチャネルで渡す。
//! 通信が終わったら `stop` で両方とも中断する（Dropでも中断される）

use survey_ai_common::loading::{MESSAGE_INTERVAL, PROGRESS_INTERVAL, PROGRESS_STEPS};
use survey_ai_common::LoadingTick;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub struct LoadingAnimation {
    rx: mpsc::UnboundedReceiver<LoadingTick>,
    tasks: Vec<JoinHandle<()>>,
}

impl LoadingAnimation {
    pub fn start() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        let message_tx = tx.clone();
        let messages = tokio::spawn(async move {
            let mut interval = tokio::time::interval(MESSAGE_INTERVAL);
            interval.tick().await;
            loop {
                interval.tick().await;
                if message_tx.send(LoadingTick::Message).is_err() {
                    break;
                }
            }
        });

        let progress = tokio::spawn(async move {
            let mut interval = tokio::time::interval(PROGRESS_INTERVAL);
            interval.tick().await;
            for step in 1..=PROGRESS_STEPS {
                interval.tick().await;
                if tx.send(LoadingTick::Progress(step)).is_err() {
                    break;
                }
            }
        });

        Self {
            rx,
            tasks: vec![messages, progress],
        }
    }

    /// 次の更新を待つ（両タスク終了後はNone）
    pub async fn next(&mut self) -> Option<LoadingTick> {
        self.rx.recv().await
    }

    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for LoadingAnimation {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}
