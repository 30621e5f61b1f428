//! 日志初始化
//!
//! 结构化日志经 tracing 输出。日志中只出现地址、哈希、provider 名称、
//! 计数与延迟；助记词、私钥、口令永远不进日志。

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// 初始化日志系统
///
/// `level` 为默认过滤级别，可被 `RUST_LOG` 环境变量覆盖；
/// `json` 为 true 时输出结构化 JSON。
pub fn init_logging(level: &str, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        Registry::default()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()?;
    } else {
        Registry::default()
            .with(filter)
            .with(fmt::layer().with_ansi(true))
            .try_init()?;
    }
    Ok(())
}

/// 简化初始化（info 级文本日志）
pub fn init_default_logging() {
    if let Err(e) = init_logging("info", false) {
        eprintln!("Failed to initialize logging: {}", e);
    }
}
