//! 发布任务模型

use std::path::PathBuf;

use crate::config::Config;

/// 一次发布任务：视频 + 可选文案 + 可选的专属凭证文件
///
/// 外部协作者（素材提供方、文案数据源）只通过这个结构与核心交互
#[derive(Debug, Clone)]
pub struct PostTask {
    /// 待上传的视频文件路径
    pub video_path: PathBuf,
    /// 文案（空则跳过文案输入）
    pub caption: Option<String>,
    /// 本任务专属的凭证文件；空则用全局配置的凭证
    pub cookie_file: Option<PathBuf>,
}

impl PostTask {
    /// 从全局配置合成单视频任务（无清单目录时的运行模式）
    pub fn from_config(config: &Config) -> Self {
        Self {
            video_path: PathBuf::from(&config.video_path),
            caption: config.caption.clone(),
            cookie_file: None,
        }
    }

    /// 视频文件名（用于日志显示）
    pub fn video_label(&self) -> String {
        self.video_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.video_path.display().to_string())
    }
}
