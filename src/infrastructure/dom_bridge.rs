//! DOM 桥 - 基础设施层
//!
//! 持有唯一的 Page 资源，暴露三种能力：
//! - 执行 JS 并取回 JSON 结果（eval / eval_as）
//! - 顶层文档的元素查找（find）
//! - 文件输入通道（直接写 file input，或拦截文件选择对话框）
//!
//! 不认识 PostTask / 工作流状态，不处理业务流程。

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use chromiumoxide::cdp::browser_protocol::dom::{BackendNodeId, SetFileInputFilesParams};
use chromiumoxide::cdp::browser_protocol::page::SetInterceptFileChooserDialogParams;
use chromiumoxide::{Element, Page};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::{debug, error};

use crate::error::{AppResult, BrowserError};

/// DOM 桥
pub struct DomBridge {
    page: Page,
    navigated: AtomicBool,
}

impl DomBridge {
    /// 创建新的 DOM 桥（页面应处于 about:blank）
    pub fn new(page: Page) -> Self {
        Self {
            page,
            navigated: AtomicBool::new(false),
        }
    }

    /// 获取 page 的引用（用于订阅 CDP 事件等底层操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 页面是否已经导航过
    pub fn has_navigated(&self) -> bool {
        self.navigated.load(Ordering::Relaxed)
    }

    /// 导航到目标 URL 并等待加载完成
    pub async fn goto(&self, url: &str) -> AppResult<()> {
        debug!("导航到: {}", url);
        self.navigated.store(true, Ordering::Relaxed);
        self.page.goto(url).await.map_err(|e| {
            error!("导航到 {} 失败: {}", url, e);
            BrowserError::NavigationFailed {
                url: url.to_string(),
                source: Box::new(e),
            }
        })?;
        let _ = self.page.wait_for_navigation().await;
        Ok(())
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> AppResult<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value().map_err(|e| {
            BrowserError::ScriptExecutionFailed {
                source: Box::new(e),
            }
        })?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> AppResult<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value =
            serde_json::from_value(json_value).map_err(|e| BrowserError::ScriptExecutionFailed {
                source: Box::new(e),
            })?;
        Ok(typed_value)
    }

    /// 在顶层文档中查找元素（找不到返回 None，不报错）
    pub async fn find(&self, css: &str) -> Option<Element> {
        self.page.find_element(css).await.ok()
    }

    /// 把文件路径直接写入一个已解析出的 file input 元素
    pub async fn set_input_files(&self, element: &Element, path: &Path) -> AppResult<()> {
        let params = SetFileInputFilesParams {
            files: vec![path.to_string_lossy().into_owned()],
            node_id: None,
            backend_node_id: None,
            object_id: Some(element.remote_object_id.clone()),
        };
        self.page.execute(params).await?;
        Ok(())
    }

    /// 把文件路径写入文件选择事件携带的节点
    pub async fn set_input_files_on_node(
        &self,
        backend_node_id: BackendNodeId,
        path: &Path,
    ) -> AppResult<()> {
        let params = SetFileInputFilesParams {
            files: vec![path.to_string_lossy().into_owned()],
            node_id: None,
            backend_node_id: Some(backend_node_id),
            object_id: None,
        };
        self.page.execute(params).await?;
        Ok(())
    }

    /// 开启/关闭文件选择对话框拦截
    ///
    /// 开启后，页面上触发的文件选择不会弹出系统对话框，
    /// 而是产生 `Page.fileChooserOpened` 事件，由调用方供给文件路径。
    pub async fn intercept_file_chooser(&self, enabled: bool) -> AppResult<()> {
        self.page
            .execute(SetInterceptFileChooserDialogParams::new(enabled))
            .await?;
        Ok(())
    }
}
