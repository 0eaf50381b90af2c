use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::error::{AppResult, BrowserError};

/// 启动无头浏览器并返回一张空白页
///
/// 注意：这里刻意停在 about:blank，不做任何导航。
/// 登录态必须在首次导航之前注入（见 `session::SessionHydrator::attach`），
/// 导航由调用方在注入完成后自行触发。
pub async fn launch_headless_browser() -> AppResult<(Browser, Page)> {
    info!("🚀 启动无头浏览器...");

    let config = BrowserConfig::builder()
        .new_headless_mode()
        .args(vec![
            "--disable-gpu",           // 无头模式下禁用 GPU，避免渲染崩溃
            "--no-sandbox",            // 容器环境中沙盒会导致启动失败
            "--disable-dev-shm-usage", // 防止共享内存不足
            "--mute-audio",
            "--disable-blink-features=AutomationControlled",
            "--remote-debugging-port=0",
        ])
        .build()
        .map_err(|e| {
            error!("配置无头浏览器失败: {}", e);
            BrowserError::ConfigurationFailed { message: e }
        })?;

    let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动无头浏览器失败: {}", e);
        BrowserError::LaunchFailed {
            source: Box::new(e),
        }
    })?;
    debug!("无头浏览器启动成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建页面失败: {}", e);
        BrowserError::PageCreationFailed {
            source: Box::new(e),
        }
    })?;

    info!("✅ 无头浏览器已就绪（空白页，等待注入登录态）");

    Ok((browser, page))
}
