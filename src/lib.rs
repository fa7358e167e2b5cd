//! 播放器引擎核心
//!
//! - `core`: 时钟、访问单元、错误、配置、通知等基础类型
//! - `player`: 数据源、媒体源线程、解码线程及平台能力查询

pub mod core;
pub mod player;

pub use crate::core::{
    AccessUnit, AccessUnitStatus, Clock, EngineConfig, MediaFormat, Notification, Notifier, PlayerError,
    Result, TrackType,
};
pub use crate::player::{CodecThread, CodecWorker, DataSource, MediaSource, ThreadedMediaSource};
