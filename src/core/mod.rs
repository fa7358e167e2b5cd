// 核心数据结构和类型定义

pub mod access_unit;
pub mod bit_reader;
pub mod clock;
pub mod config;
pub mod error;
pub mod event;
pub mod types;

use std::process;
use std::thread;

// 重新导出常用类型
pub use access_unit::{AccessUnit, AccessUnitStatus};
pub use bit_reader::BitReader;
pub use clock::{Clock, ManualTime, SystemTimeSource, TimeSource};
pub use config::{BufferingConfig, ClockConfig, CodecConfig, EngineConfig, NetworkConfig};
pub use error::{DrmError, PlayerError, Result};
pub use event::{Notification, Notifier};
pub use types::*;

/// 日志上下文（进程号 + 线程号）
pub fn log_ctx() -> String {
    format!("[pid:{} tid:{:?}]", process::id(), thread::current().id())
}
