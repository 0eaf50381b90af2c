//! 批量发布调度器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量任务的调度和统计。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：启动日志、加载任务清单
//! 2. **任务来源**：优先读 TOML 清单目录；没有清单时按 RUN_COUNT 复制单视频任务
//! 3. **并发控制**：使用 Semaphore 限制同时在跑的浏览器数量
//! 4. **分批处理**：每批跑满并发额度，整批收尾后再开下一批
//! 5. **全局统计**：确认 / 未确认 / 失败三档分别计数，换算退出码
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单个 run 的细节，全部委托 run_processor
//! - **run 隔离**：浏览器由 run_processor 按 run 创建销毁，本模块不持有
//! - **并发安全**：通过 Semaphore 和 tokio::spawn 实现并发

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::models::{load_all_toml_files, PostTask};
use crate::orchestrator::run_processor;
use crate::utils::logging::{init_log_file, log_startup, print_final_stats};
use crate::workflow::{RunCtx, Verdict};

/// 应用主结构
pub struct App {
    config: Config,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        init_log_file(&config.output_log_file)?;
        Ok(Self { config })
    }

    /// 运行应用主逻辑
    ///
    /// # 返回
    /// 失败的 run 数（0 表示全部被接受，调用方据此决定退出码）
    pub async fn run(&self) -> Result<usize> {
        let all_tasks = self.load_tasks().await?;

        if all_tasks.is_empty() {
            warn!("⚠️ 没有可执行的发布任务，程序结束");
            return Ok(0);
        }

        log_startup(
            all_tasks.len(),
            self.config.max_concurrent_runs,
            self.config.dry_run,
        );

        let stats = self.process_all_tasks(all_tasks).await?;

        print_final_stats(
            stats.confirmed,
            stats.unconfirmed,
            stats.failed,
            stats.total,
            &self.config.output_log_file,
        );

        Ok(stats.failed)
    }

    /// 确定任务列表
    ///
    /// 清单目录里有 TOML 就逐条执行清单任务；
    /// 目录不存在或为空则回退到"单视频 × RUN_COUNT"模式
    async fn load_tasks(&self) -> Result<Vec<PostTask>> {
        info!("\n📁 正在扫描任务清单目录: {}", self.config.manifest_folder);
        let manifest_tasks = load_all_toml_files(&self.config.manifest_folder).await?;
        if !manifest_tasks.is_empty() {
            return Ok(manifest_tasks);
        }

        let runs = self.config.run_count.max(1);
        info!("📋 未找到清单，回退到单视频模式（重复 {} 次）", runs);
        Ok(vec![PostTask::from_config(&self.config); runs])
    }

    /// 处理所有任务
    async fn process_all_tasks(&self, all_tasks: Vec<PostTask>) -> Result<RunStats> {
        let concurrency = self.config.max_concurrent_runs.max(1);
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let total = all_tasks.len();
        let mut stats = RunStats {
            total,
            ..Default::default()
        };

        // 分批处理
        for batch_start in (0..total).step_by(concurrency) {
            let batch_end = (batch_start + concurrency).min(total);
            let batch_tasks = &all_tasks[batch_start..batch_end];
            let batch_num = (batch_start / concurrency) + 1;
            let total_batches = (total + concurrency - 1) / concurrency;

            info!("\n{}", "=".repeat(60));
            info!(
                "📦 第 {}/{} 批：run {} ~ {}（共 {}）",
                batch_num,
                total_batches,
                batch_start + 1,
                batch_end,
                total
            );
            info!("{}", "=".repeat(60));

            let batch_result = self
                .process_batch(batch_tasks, batch_start, semaphore.clone())
                .await?;

            stats.confirmed += batch_result.confirmed;
            stats.unconfirmed += batch_result.unconfirmed;
            stats.failed += batch_result.failed;

            info!(
                "📦 第 {} 批完成：确认 {} / 未确认 {} / 失败 {}",
                batch_num, batch_result.confirmed, batch_result.unconfirmed, batch_result.failed
            );
        }

        Ok(stats)
    }

    /// 处理单个批次
    async fn process_batch(
        &self,
        batch_tasks: &[PostTask],
        batch_start: usize,
        semaphore: Arc<Semaphore>,
    ) -> Result<RunStats> {
        let mut batch_handles = Vec::new();

        for (idx, task) in batch_tasks.iter().enumerate() {
            let run_index = batch_start + idx + 1;
            let permit = semaphore.clone().acquire_owned().await?;

            let task = task.clone();
            let config = self.config.clone();
            let ctx = RunCtx::new(run_index, task.video_label());

            let handle = tokio::spawn(async move {
                let _permit = permit;
                run_processor::process_run(&config, &task, &ctx).await
            });
            batch_handles.push((run_index, handle));
        }

        let mut result = RunStats::default();
        for (run_index, handle) in batch_handles {
            match handle.await {
                Ok(Ok(outcome)) => match outcome.verdict {
                    Verdict::Confirmed | Verdict::DryRunAccepted => result.confirmed += 1,
                    Verdict::UnconfirmedSuccess => result.unconfirmed += 1,
                    Verdict::Failed { stage } => {
                        error!("[run {}] ❌ 在 {} 阶段失败", run_index, stage);
                        result.failed += 1;
                    }
                },
                Ok(Err(e)) => {
                    error!("[run {}] ❌ 硬错误: {}", run_index, e);
                    result.failed += 1;
                }
                Err(e) => {
                    error!("[run {}] ❌ 任务执行失败: {}", run_index, e);
                    result.failed += 1;
                }
            }
        }

        Ok(result)
    }
}

/// 全局统计
#[derive(Debug, Default)]
struct RunStats {
    confirmed: usize,
    unconfirmed: usize,
    failed: usize,
    total: usize,
}
