use std::time::Duration;

use upload_video_publish::browser::launch_headless_browser;
use upload_video_publish::config::Config;
use upload_video_publish::infrastructure::DomBridge;
use upload_video_publish::locator::targets::{FILE_INPUT, PUBLISH_BUTTON};
use upload_video_publish::locator::{
    LocatorResolver, LocatorStrategy, Predicate, Presence, SearchScope, SemanticTarget,
};
use upload_video_publish::models::PostTask;
use upload_video_publish::services::{Action, ActionExecutor, ActionOutcome, ObstructionClearer};
use upload_video_publish::session::{ClientProfile, SessionHydrator};
use upload_video_publish::utils::logging;
use upload_video_publish::workflow::outcome::Severity;
use upload_video_publish::workflow::{PublishWorkflow, RunCtx, Verdict};

/// 本地页面夹具（data: URL，不依赖外部网络）
fn fixture_url(body: &str) -> String {
    format!("data:text/html,<html><body>{}</body></html>", body)
}

/// 模拟上传界面的完整夹具：文件输入 + 文案编辑器 + 合规框 + 可见性 + 发布按钮
const UPLOAD_SURFACE: &str = "\
<div data-e2e='upload-button'><input type='file' accept='video/*'></div>\
<div data-e2e='caption-container'><div contenteditable='true' style='width:200px;height:40px'></div></div>\
<div data-e2e='upload-content-check'><input type='checkbox'></div>\
<div data-e2e='visibility-everyone' style='width:80px;height:20px'>Everyone</div>\
<button data-e2e='post-button'>Post</button>";

#[tokio::test]
#[ignore] // 需要本机有 Chromium，手动运行：cargo test -- --ignored
async fn test_browser_launch() {
    logging::init(false);

    let result = launch_headless_browser().await;
    assert!(result.is_ok(), "应该能够启动无头浏览器");

    let (mut browser, _page) = result.unwrap();
    browser.close().await.expect("关闭浏览器失败");
    let _ = browser.wait().await;
}

#[tokio::test]
#[ignore]
async fn test_resolver_finds_publish_button_in_local_page() {
    logging::init(false);
    let config = Config::from_env();

    let (mut browser, page) = launch_headless_browser().await.expect("启动浏览器失败");
    let bridge = DomBridge::new(page);
    bridge
        .goto(&fixture_url("<button data-e2e='post-button'>Post</button>"))
        .await
        .expect("导航失败");

    let resolver = LocatorResolver::new(&config);
    let resolution = resolver
        .resolve(&bridge, &PUBLISH_BUTTON, Duration::from_secs(5))
        .await;

    let el = resolution.found().expect("发布按钮应该被解析到");
    assert_eq!(el.strategy_index, 0, "应该由 data-e2e 属性策略命中");
    assert!(el.in_top_document);
    assert!(!el.disabled);

    browser.close().await.ok();
    let _ = browser.wait().await;
}

#[tokio::test]
#[ignore]
async fn test_resolver_reports_not_found_without_error() {
    logging::init(false);
    let config = Config::from_env();

    let (mut browser, page) = launch_headless_browser().await.expect("启动浏览器失败");
    let bridge = DomBridge::new(page);
    bridge
        .goto(&fixture_url("<p>nothing to upload here</p>"))
        .await
        .expect("导航失败");

    let resolver = LocatorResolver::new(&config);
    let resolution = resolver
        .resolve(&bridge, &FILE_INPUT, Duration::from_secs(2))
        .await;

    assert!(!resolution.is_found(), "页面里没有 file input，应该是 NotFound");

    browser.close().await.ok();
    let _ = browser.wait().await;
}

#[tokio::test]
#[ignore]
async fn test_resolver_descends_into_nested_frames() {
    logging::init(false);
    let config = Config::from_env();

    let (mut browser, page) = launch_headless_browser().await.expect("启动浏览器失败");
    let bridge = DomBridge::new(page);
    // file input 只存在于子文档里
    bridge
        .goto(&fixture_url(
            "<iframe srcdoc=\"<input type='file'>\" style='width:300px;height:100px'></iframe>",
        ))
        .await
        .expect("导航失败");

    let resolver = LocatorResolver::new(&config);
    let resolution = resolver
        .resolve(&bridge, &FILE_INPUT, Duration::from_secs(5))
        .await;

    let el = resolution.found().expect("子文档里的 file input 应该被找到");
    assert!(!el.in_top_document);
    assert!(el.depth >= 1);
    assert_eq!(el.tag, "input");

    browser.close().await.ok();
    let _ = browser.wait().await;
}

#[tokio::test]
#[ignore]
async fn test_executor_clicks_through_overlay() {
    logging::init(false);
    let config = Config::from_env();

    let (mut browser, page) = launch_headless_browser().await.expect("启动浏览器失败");
    let bridge = DomBridge::new(page);
    // 遮罩盖住整个页面，按钮在它下面
    bridge
        .goto(&fixture_url(
            "<button data-e2e='post-button' onclick='window.__clicked=true'>Post</button>\
             <div class='modal-mask' style='position:fixed;inset:0;background:rgba(0,0,0,0.5)'></div>",
        ))
        .await
        .expect("导航失败");

    let clearer = ObstructionClearer::new(&config);
    let executor = ActionExecutor::new(&config);

    let outcome = executor
        .perform(&bridge, &clearer, &PUBLISH_BUTTON, Action::Click)
        .await
        .expect("执行点击出硬错误");
    assert!(outcome.is_success(), "清障后点击应该成功");

    let clicked: bool = bridge
        .eval_as("window.__clicked === true")
        .await
        .expect("读取点击标记失败");
    assert!(clicked, "按钮的 onclick 应该真的被触发");

    browser.close().await.ok();
    let _ = browser.wait().await;
}

#[tokio::test]
#[ignore]
async fn test_attach_after_navigation_is_rejected() {
    logging::init(false);
    let config = Config::from_env();

    let (mut browser, page) = launch_headless_browser().await.expect("启动浏览器失败");
    let bridge = DomBridge::new(page);
    bridge
        .goto(&fixture_url("<p>already navigated</p>"))
        .await
        .expect("导航失败");

    let hydrator = SessionHydrator::new(&config);
    let profile = ClientProfile {
        user_agent: config.user_agent.clone(),
        locale: config.locale.clone(),
        timezone: config.timezone.clone(),
    };
    let identity = hydrator
        .hydrate("sessionid=abc123; ttwid=xyz", profile)
        .expect("凭证解析失败");

    let err = hydrator.attach(&identity, &bridge).await.unwrap_err();
    assert!(err.to_string().contains("已导航"), "导航后注入必须被拒绝");

    browser.close().await.ok();
    let _ = browser.wait().await;
}

#[tokio::test]
#[ignore]
async fn test_dry_run_workflow_against_local_fixture() {
    logging::init(false);

    // 准备一个真实存在的"视频"文件
    let dir = std::env::temp_dir().join("publish_flow_it");
    std::fs::create_dir_all(&dir).expect("创建临时目录失败");
    let video = dir.join("clip.mp4");
    std::fs::write(&video, b"\x00\x00\x00\x18ftypmp42").expect("写视频文件失败");

    let mut config = Config::from_env();
    config.target_url = fixture_url(UPLOAD_SURFACE);
    config.dry_run = true;
    config.processing_ceiling = Duration::from_secs(10);

    let task = PostTask {
        video_path: video,
        caption: Some("integration fixture".to_string()),
        cookie_file: None,
    };
    let ctx = RunCtx::new(1, task.video_label());

    let (mut browser, page) = launch_headless_browser().await.expect("启动浏览器失败");
    let bridge = DomBridge::new(page);

    // data: URL 推导不出合法 cookie 域，凭证里显式给 domain
    let raw = r#"[
        {"name": "sessionid", "value": "abc123", "domain": ".example.com"},
        {"name": "ttwid", "value": "xyz", "domain": ".example.com"}
    ]"#;
    let workflow = PublishWorkflow::new(&config);
    let outcome = workflow.run(&bridge, raw, &task, &ctx).await;

    assert_eq!(
        outcome.verdict,
        Verdict::DryRunAccepted,
        "演练模式应该走完发布前所有阶段: {:?}",
        outcome.notes
    );
    assert!(
        !outcome.attempts.is_empty(),
        "至少文件挂载应该留下一条成功尝试记录"
    );

    browser.close().await.ok();
    let _ = browser.wait().await;
    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
#[ignore]
async fn test_missing_video_file_fails_attach_stage() {
    logging::init(false);

    let mut config = Config::from_env();
    config.target_url = fixture_url(UPLOAD_SURFACE);
    config.dry_run = true;

    let task = PostTask {
        video_path: std::path::PathBuf::from("/definitely/not/here/clip.mp4"),
        caption: None,
        cookie_file: None,
    };
    let ctx = RunCtx::new(1, task.video_label());

    let (mut browser, page) = launch_headless_browser().await.expect("启动浏览器失败");
    let bridge = DomBridge::new(page);

    let raw = r#"[{"name": "sessionid", "value": "abc123", "domain": ".example.com"}]"#;
    let workflow = PublishWorkflow::new(&config);
    let outcome = workflow.run(&bridge, raw, &task, &ctx).await;

    assert_eq!(
        outcome.verdict,
        Verdict::Failed {
            stage: "file-attach"
        },
        "视频文件不存在必须死在挂载阶段: {:?}",
        outcome.notes
    );
    assert!(
        outcome
            .notes
            .iter()
            .any(|n| n.stage == "file-attach" && n.detail.contains("文件不存在")),
        "失败详情应该带上类型化的文件错误: {:?}",
        outcome.notes
    );

    browser.close().await.ok();
    let _ = browser.wait().await;
}

#[tokio::test]
#[ignore]
async fn test_publish_click_yields_confirmation() {
    logging::init(false);

    let dir = std::env::temp_dir().join("publish_flow_it_confirm");
    std::fs::create_dir_all(&dir).expect("创建临时目录失败");
    let video = dir.join("clip.mp4");
    std::fs::write(&video, b"\x00\x00\x00\x18ftypmp42").expect("写视频文件失败");

    // 点击发布后页面注入成功标记，模拟平台的确认提示
    let surface = UPLOAD_SURFACE.replace(
        "<button data-e2e='post-button'>Post</button>",
        "<button data-e2e='post-button' onclick=\"const d=document.createElement('div');\
d.dataset.e2e='publish-success';d.textContent='posted';document.body.appendChild(d)\">Post</button>",
    );
    let mut config = Config::from_env();
    config.target_url = fixture_url(&surface);
    config.dry_run = false;
    config.processing_ceiling = Duration::from_secs(10);
    config.confirm_ceiling = Duration::from_secs(10);

    let task = PostTask {
        video_path: video,
        caption: None,
        cookie_file: None,
    };
    let ctx = RunCtx::new(1, task.video_label());

    let (mut browser, page) = launch_headless_browser().await.expect("启动浏览器失败");
    let bridge = DomBridge::new(page);

    let raw = r#"[{"name": "sessionid", "value": "abc123", "domain": ".example.com"}]"#;
    let workflow = PublishWorkflow::new(&config);
    let outcome = workflow.run(&bridge, raw, &task, &ctx).await;

    assert_eq!(
        outcome.verdict,
        Verdict::Confirmed,
        "出现成功标记后必须判定为已确认: {:?}",
        outcome.notes
    );

    browser.close().await.ok();
    let _ = browser.wait().await;
    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
#[ignore]
async fn test_disappearing_upload_surface_counts_as_published() {
    logging::init(false);

    let dir = std::env::temp_dir().join("publish_flow_it_gone");
    std::fs::create_dir_all(&dir).expect("创建临时目录失败");
    let video = dir.join("clip.mp4");
    std::fs::write(&video, b"\x00\x00\x00\x18ftypmp42").expect("写视频文件失败");

    // 点击发布后上传界面整体消失（部分站点会直接跳去作品页），
    // 没有成功标记，只能靠"界面不在了"判定——必须连续两轮都不在才算数
    let surface = UPLOAD_SURFACE.replace(
        "<button data-e2e='post-button'>Post</button>",
        "<button data-e2e='post-button' \
onclick=\"document.querySelector('div[data-e2e=upload-button]').remove()\">Post</button>",
    );
    let mut config = Config::from_env();
    config.target_url = fixture_url(&surface);
    config.dry_run = false;
    config.processing_ceiling = Duration::from_secs(10);
    config.confirm_ceiling = Duration::from_secs(10);

    let task = PostTask {
        video_path: video,
        caption: None,
        cookie_file: None,
    };
    let ctx = RunCtx::new(1, task.video_label());

    let (mut browser, page) = launch_headless_browser().await.expect("启动浏览器失败");
    let bridge = DomBridge::new(page);

    let raw = r#"[{"name": "sessionid", "value": "abc123", "domain": ".example.com"}]"#;
    let workflow = PublishWorkflow::new(&config);
    let outcome = workflow.run(&bridge, raw, &task, &ctx).await;

    assert_eq!(
        outcome.verdict,
        Verdict::Confirmed,
        "上传界面持续消失应该判定为已发布: {:?}",
        outcome.notes
    );

    browser.close().await.ok();
    let _ = browser.wait().await;
    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
#[ignore]
async fn test_workflow_survives_missing_caption_editor() {
    logging::init(false);

    let dir = std::env::temp_dir().join("publish_flow_it_no_caption");
    std::fs::create_dir_all(&dir).expect("创建临时目录失败");
    let video = dir.join("clip.mp4");
    std::fs::write(&video, b"\x00\x00\x00\x18ftypmp42").expect("写视频文件失败");

    // 页面上压根没有文案编辑器，文案阶段应该降级成警告而不是判死
    let surface = UPLOAD_SURFACE.replace(
        "<div data-e2e='caption-container'><div contenteditable='true' style='width:200px;height:40px'></div></div>",
        "",
    );
    let mut config = Config::from_env();
    config.target_url = fixture_url(&surface);
    config.dry_run = true;
    config.processing_ceiling = Duration::from_secs(10);
    // 编辑器注定找不到，压缩重试预算让测试别空等
    config.resolve_budget = Duration::from_secs(2);
    config.max_attempts = 2;
    config.action_ceiling = Duration::from_secs(10);

    let task = PostTask {
        video_path: video,
        caption: Some("落不了地的文案".to_string()),
        cookie_file: None,
    };
    let ctx = RunCtx::new(1, task.video_label());

    let (mut browser, page) = launch_headless_browser().await.expect("启动浏览器失败");
    let bridge = DomBridge::new(page);

    let raw = r#"[{"name": "sessionid", "value": "abc123", "domain": ".example.com"}]"#;
    let workflow = PublishWorkflow::new(&config);
    let outcome = workflow.run(&bridge, raw, &task, &ctx).await;

    assert_eq!(
        outcome.verdict,
        Verdict::DryRunAccepted,
        "缺文案编辑器不该让整个 run 失败: {:?}",
        outcome.notes
    );
    assert!(
        outcome
            .notes
            .iter()
            .any(|n| n.stage == "caption" && n.severity == Severity::Warning),
        "文案阶段应该留下一条警告: {:?}",
        outcome.notes
    );

    browser.close().await.ok();
    let _ = browser.wait().await;
    std::fs::remove_dir_all(&dir).ok();
}

/// 只搜顶层文档的 file input 阶梯，用于验证范围限定确实生效
static TOP_DOC_FILE_INPUT: SemanticTarget = SemanticTarget {
    role: "top-doc-file-input",
    strategies: &[LocatorStrategy {
        predicate: Predicate::Css("input[type='file']"),
        scope: SearchScope::DocumentOnly,
        presence: Presence::AttachedOnly,
    }],
};

#[tokio::test]
#[ignore]
async fn test_document_only_scope_ignores_frames() {
    logging::init(false);
    let config = Config::from_env();

    let (mut browser, page) = launch_headless_browser().await.expect("启动浏览器失败");
    let bridge = DomBridge::new(page);
    // file input 只在子文档里：AllFrames 能找到（见上面的嵌套 frame 用例），
    // 限定顶层文档就必须判 NotFound
    bridge
        .goto(&fixture_url(
            "<iframe srcdoc=\"<input type='file'>\" style='width:300px;height:100px'></iframe>",
        ))
        .await
        .expect("导航失败");

    let resolver = LocatorResolver::new(&config);
    let resolution = resolver
        .resolve(&bridge, &TOP_DOC_FILE_INPUT, Duration::from_secs(2))
        .await;

    assert!(
        !resolution.is_found(),
        "DocumentOnly 范围不该搜进 iframe"
    );

    browser.close().await.ok();
    let _ = browser.wait().await;
}

#[tokio::test]
#[ignore]
async fn test_exhausted_reports_attempts_actually_made() {
    logging::init(false);

    let mut config = Config::from_env();
    // 墙钟立刻到期，一轮交互都来不及跑
    config.action_ceiling = Duration::ZERO;

    let (mut browser, page) = launch_headless_browser().await.expect("启动浏览器失败");
    let bridge = DomBridge::new(page);
    bridge
        .goto(&fixture_url("<p>empty</p>"))
        .await
        .expect("导航失败");

    let clearer = ObstructionClearer::new(&config);
    let executor = ActionExecutor::new(&config);
    let outcome = executor
        .perform(&bridge, &clearer, &PUBLISH_BUTTON, Action::Click)
        .await
        .expect("执行不该出硬错误");

    match outcome {
        ActionOutcome::Exhausted { attempts, .. } => {
            assert_eq!(attempts, 0, "一轮都没跑就不能上报满额重试数");
        }
        other => panic!("墙钟为零时不可能成功: {:?}", other),
    }

    browser.close().await.ok();
    let _ = browser.wait().await;
}

#[tokio::test]
#[ignore]
async fn test_workflow_fails_when_publish_never_enables() {
    logging::init(false);

    let dir = std::env::temp_dir().join("publish_flow_it_disabled");
    std::fs::create_dir_all(&dir).expect("创建临时目录失败");
    let video = dir.join("clip.mp4");
    std::fs::write(&video, b"\x00\x00\x00\x18ftypmp42").expect("写视频文件失败");

    // 发布按钮永远处于禁用状态
    let surface = UPLOAD_SURFACE.replace(
        "<button data-e2e='post-button'>Post</button>",
        "<button data-e2e='post-button' disabled>Post</button>",
    );
    let mut config = Config::from_env();
    config.target_url = fixture_url(&surface);
    config.dry_run = false;
    config.processing_ceiling = Duration::from_secs(3);
    config.publish_enable_ceiling = Duration::from_secs(2);

    let task = PostTask {
        video_path: video,
        caption: None,
        cookie_file: None,
    };
    let ctx = RunCtx::new(1, task.video_label());

    let (mut browser, page) = launch_headless_browser().await.expect("启动浏览器失败");
    let bridge = DomBridge::new(page);

    let raw = r#"[{"name": "sessionid", "value": "abc123", "domain": ".example.com"}]"#;
    let workflow = PublishWorkflow::new(&config);
    let outcome = workflow.run(&bridge, raw, &task, &ctx).await;

    assert_eq!(
        outcome.verdict,
        Verdict::Failed {
            stage: "publish-click"
        },
        "按钮从未可用时必须死在发布点击阶段: {:?}",
        outcome.notes
    );

    browser.close().await.ok();
    let _ = browser.wait().await;
    std::fs::remove_dir_all(&dir).ok();
}
