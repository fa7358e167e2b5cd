use crate::core::error::Result;
use crate::core::types::TrackType;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 引擎配置（可从 JSON 加载，缺省字段使用默认值）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub clock: ClockConfig,
    pub buffering: BufferingConfig,
    pub network: NetworkConfig,
    pub codec: CodecConfig,
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }
}

/// 播放时钟配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// 位置通知间隔（毫秒），40ms ≈ 25Hz
    pub notify_interval_ms: u64,
    /// 漂移修正阈值（微秒）
    pub drift_threshold_us: i64,
    /// 最大播放速率（超出则钳制）
    pub max_speed: f64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            notify_interval_ms: 40,
            drift_threshold_us: 100_000,
            max_speed: 16.0,
        }
    }
}

/// 数据源缓冲配置（访问单元数量）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferingConfig {
    pub video_capacity: usize,
    pub audio_capacity: usize,
    pub subtitle_capacity: usize,
    /// 队列低于该值时进入缓冲状态
    pub low_watermark: usize,
    /// 队列达到该值时缓冲完成
    pub high_watermark: usize,
}

impl BufferingConfig {
    pub fn capacity_for(&self, track: TrackType) -> usize {
        match track {
            TrackType::Video => self.video_capacity,
            TrackType::Audio => self.audio_capacity,
            TrackType::Subtitle | TrackType::Unknown => self.subtitle_capacity,
        }
    }
}

impl Default for BufferingConfig {
    fn default() -> Self {
        // 视频：200 packets ≈ 8秒（25fps）
        // 音频：150 packets ≈ 3秒（48kHz）
        Self {
            video_capacity: 200,
            audio_capacity: 150,
            subtitle_capacity: 64,
            low_watermark: 0,
            high_watermark: 40,
        }
    }
}

/// 网络读取配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// 最大重连次数
    pub max_reconnect_attempts: u32,
    /// 零字节读取的最大重试次数
    pub max_read_retries: u32,
    /// 重试间隔（毫秒）
    pub retry_sleep_ms: u64,
    /// 预读缓冲区大小（字节）
    pub read_ahead_bytes: usize,
    /// 向前跳读上限（字节），超过则重连
    pub skip_forward_limit: u64,
    /// 单次从传输层读取的块大小
    pub chunk_size: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            max_reconnect_attempts: 5,
            max_read_retries: 1000,
            retry_sleep_ms: 1,
            read_ahead_bytes: 256 * 1024,
            skip_forward_limit: 512 * 1024,
            chunk_size: 16 * 1024,
        }
    }
}

/// 解码线程配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    pub max_decoded_video_frames: usize,
    pub max_decoded_audio_frames: usize,
    pub max_decoded_subtitle_frames: usize,
    /// 工作线程轮询间隔（毫秒）
    pub worker_tick_ms: u64,
    /// 视频帧提前渲染量（微秒）
    pub video_render_ahead_us: i64,
}

impl CodecConfig {
    pub fn max_decoded_frames(&self, track: TrackType) -> usize {
        match track {
            TrackType::Video => self.max_decoded_video_frames,
            TrackType::Audio => self.max_decoded_audio_frames,
            TrackType::Subtitle | TrackType::Unknown => self.max_decoded_subtitle_frames,
        }
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_decoded_video_frames: 8,
            max_decoded_audio_frames: 16,
            max_decoded_subtitle_frames: 4,
            worker_tick_ms: 10,
            video_render_ahead_us: 10_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json_str(
            r#"{ "clock": { "drift_threshold_us": 50000 }, "network": { "max_reconnect_attempts": 2 } }"#,
        )
        .unwrap();

        assert_eq!(config.clock.drift_threshold_us, 50_000);
        assert_eq!(config.clock.notify_interval_ms, 40);
        assert_eq!(config.network.max_reconnect_attempts, 2);
        assert_eq!(config.network.retry_sleep_ms, 1);
        assert_eq!(config.buffering, BufferingConfig::default());
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let err = EngineConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, crate::core::PlayerError::ConfigError(_)));
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{ "codec": { "worker_tick_ms": 5 } }"#).unwrap();

        let config = EngineConfig::from_json_file(&path).unwrap();
        assert_eq!(config.codec.worker_tick_ms, 5);
        assert_eq!(config.codec.max_decoded_frames(TrackType::Video), 8);
    }
}
