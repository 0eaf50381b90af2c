//! 任务清单加载器
//!
//! 扫描目录下的 TOML 清单文件，每个文件可声明多条发布任务：
//!
//! ```toml
//! [[post]]
//! video = "clips/demo.mp4"
//! caption = "今日份视频"
//! cookies = "cookies/account_a.txt"
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{AppResult, FileError};
use crate::models::post::PostTask;

#[derive(Debug, Deserialize)]
struct ManifestFile {
    #[serde(default)]
    post: Vec<ManifestPost>,
}

#[derive(Debug, Deserialize)]
struct ManifestPost {
    video: PathBuf,
    #[serde(default)]
    caption: Option<String>,
    #[serde(default)]
    cookies: Option<PathBuf>,
}

/// 加载目录下所有 TOML 清单中的任务
///
/// 目录不存在时返回空列表（调用方回退到单视频模式），单个文件坏掉只警告不中断
pub async fn load_all_toml_files(folder: &str) -> AppResult<Vec<PostTask>> {
    let dir = Path::new(folder);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut tasks = Vec::new();
    let entries = std::fs::read_dir(dir).map_err(|e| FileError::ReadFailed {
        path: dir.to_path_buf(),
        source: e,
    })?;

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("toml") {
            continue;
        }
        match load_manifest(&path) {
            Ok(mut found) => {
                info!("📄 {} 中找到 {} 条任务", path.display(), found.len());
                tasks.append(&mut found);
            }
            Err(e) => warn!("⚠️ 跳过损坏的清单 {}: {}", path.display(), e),
        }
    }

    Ok(tasks)
}

fn load_manifest(path: &Path) -> AppResult<Vec<PostTask>> {
    let text = std::fs::read_to_string(path).map_err(|e| FileError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;
    let manifest: ManifestFile = toml::from_str(&text).map_err(|e| FileError::TomlParseFailed {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;
    Ok(manifest
        .post
        .into_iter()
        .map(|p| PostTask {
            video_path: p.video,
            caption: p.caption,
            cookie_file: p.cookies,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_parses_multiple_posts() {
        let text = r#"
[[post]]
video = "a.mp4"
caption = "第一条"

[[post]]
video = "b.mp4"
cookies = "cookies/b.txt"
"#;
        let manifest: ManifestFile = toml::from_str(text).unwrap();
        assert_eq!(manifest.post.len(), 2);
        assert_eq!(manifest.post[0].caption.as_deref(), Some("第一条"));
        assert!(manifest.post[0].cookies.is_none());
        assert_eq!(
            manifest.post[1].cookies.as_deref(),
            Some(Path::new("cookies/b.txt"))
        );
    }

    #[test]
    fn empty_manifest_is_valid() {
        let manifest: ManifestFile = toml::from_str("").unwrap();
        assert!(manifest.post.is_empty());
    }
}
