//! 命令行脚本依赖的通用组件.

use log::LevelFilter;

pub mod loader;

const SEP: &str = "--------------------------------------------------------";

/// 简单分隔线.
#[inline]
pub fn sep_to<W: std::io::Write>(mut w: W) -> std::io::Result<()> {
    writeln!(&mut w, "{SEP}")
}

/// 获得可并行核心数.
pub fn cpus() -> usize {
    std::thread::available_parallelism().map_or_else(|_| num_cpus::get(), usize::from)
}

/// 由 `-v` 次数与 `-q` 决定日志级别. 默认为 `Info`.
pub fn log_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Warn;
    }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// 安装全局日志记录器.
pub fn init_logger(verbose: u8, quiet: bool) -> Result<(), log::SetLoggerError> {
    simple_logger::SimpleLogger::new()
        .with_level(log_level(verbose, quiet))
        .init()
}
