/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化日志
///
/// 日志写到 stderr，stdout 只留给报告输出。
///
/// # 参数
/// - `quiet`: 只输出警告及以上
/// - `verbose`: 输出调试日志
///
/// # 返回
/// 设置了 `RUST_LOG` 时以它为准
pub fn init(quiet: bool, verbose: bool) -> Result<()> {
    let level = if quiet {
        "warn"
    } else if verbose {
        "debug"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("日志初始化失败: {}", e))?;

    Ok(())
}

/// 记录程序启动信息
///
/// # 参数
/// - `subject`: 调研对象描述
/// - `llm`: LLM 后端选择
pub fn log_startup(subject: &str, llm: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 深度调研启动");
    info!("👤 调研对象: {}", subject);
    info!("🤖 LLM 选择: {}", llm);
    info!("{}", "=".repeat(60));
}

/// 记录阶段进度，形如 `[1/3] ...`
pub fn log_phase(step: usize, total: usize, message: &str) {
    info!("\n[{}/{}] {}", step, total, message);
}

/// 打印最终统计信息
///
/// # 参数
/// - `filled`: 获得数据的槽位数量
/// - `total`: 槽位总数
/// - `output`: 输出位置（文件路径或 stdout）
pub fn log_final_stats(filled: usize, total: usize, output: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 调研完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 获得数据: {}/{}", filled, total);
    info!("📄 输出位置: {}", output);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text_counts_chars() {
        assert_eq!(truncate_text("深度调研报告", 4), "深度调研...");
        assert_eq!(truncate_text("short", 10), "short");
    }
}
