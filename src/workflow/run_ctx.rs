//! 发布上下文
//!
//! 封装"我正在执行第几个 run、发布哪个视频"这一信息

use std::fmt::Display;

/// 发布上下文
#[derive(Debug, Clone)]
pub struct RunCtx {
    /// run 序号（从 1 开始，仅用于日志显示）
    pub run_index: usize,
    /// 视频文件名（仅用于日志显示）
    pub video_label: String,
}

impl RunCtx {
    pub fn new(run_index: usize, video_label: impl Into<String>) -> Self {
        Self {
            run_index,
            video_label: video_label.into(),
        }
    }
}

impl Display for RunCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[run {} 视频#{}]", self.run_index, self.video_label)
    }
}
