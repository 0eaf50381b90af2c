use std::process::ExitCode;

use upload_video_publish::config::Config;
use upload_video_publish::orchestrator::App;
use upload_video_publish::utils::logging;

#[tokio::main]
async fn main() -> ExitCode {
    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    let failed = match App::initialize(config) {
        Ok(app) => match app.run().await {
            Ok(failed) => failed,
            Err(e) => {
                tracing::error!("❌ 运行失败: {:#}", e);
                return ExitCode::FAILURE;
            }
        },
        Err(e) => {
            tracing::error!("❌ 初始化失败: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    if failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
