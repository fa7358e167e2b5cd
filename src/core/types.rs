use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// 数据源地址
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceUri {
    /// 本地文件路径
    LocalFile(PathBuf),

    /// 网络流 URL
    Network {
        url: String,
        protocol: StreamProtocol,
    },
}

impl SourceUri {
    /// 从 URL 字符串解析数据源地址
    pub fn from_url(url: &str) -> Self {
        if let Some(path) = url.strip_prefix("file://") {
            SourceUri::LocalFile(PathBuf::from(path))
        } else if url.starts_with("http://") || url.starts_with("https://") {
            let protocol = if url.ends_with(".mpd") || url.contains("/dash/") {
                StreamProtocol::Dash
            } else {
                StreamProtocol::Http
            };
            SourceUri::Network {
                url: url.to_string(),
                protocol,
            }
        } else {
            // 默认当作本地文件
            SourceUri::LocalFile(PathBuf::from(url))
        }
    }

    /// 判断是否为网络流
    pub fn is_network_stream(&self) -> bool {
        matches!(self, SourceUri::Network { .. })
    }
}

/// 流媒体协议类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamProtocol {
    /// 普通 HTTP 渐进式下载
    Http,
    /// MPEG-DASH 自适应流
    Dash,
}

impl StreamProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamProtocol::Http => "HTTP",
            StreamProtocol::Dash => "DASH",
        }
    }
}

/// 轨道类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackType {
    Audio,
    Video,
    Subtitle,
    Unknown,
}

impl TrackType {
    /// 根据 MIME 类型推断轨道类型
    pub fn from_mime(mime: &str) -> Self {
        if mime.starts_with("audio/") {
            TrackType::Audio
        } else if mime.starts_with("video/") {
            TrackType::Video
        } else if mime.starts_with("text/")
            || mime.starts_with("subtitle/")
            || mime == "application/ttml+xml"
        {
            TrackType::Subtitle
        } else {
            TrackType::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrackType::Audio => "audio",
            TrackType::Video => "video",
            TrackType::Subtitle => "subtitle",
            TrackType::Unknown => "unknown",
        }
    }
}

/// 轨道媒体格式
#[derive(Debug, Clone, PartialEq)]
pub struct MediaFormat {
    pub mime: String,
    pub track_type: TrackType,
    pub duration_us: i64,
    // 视频
    pub width: u32,
    pub height: u32,
    // 音频
    pub sample_rate: u32,
    pub channel_count: u16,
    /// 最大输入单元大小（0 = 未知）
    pub max_input_size: usize,
    /// 编解码器专用数据（SPS/PPS、AudioSpecificConfig 等）
    pub codec_specific_data: Vec<Bytes>,
    pub language: Option<String>,
}

impl MediaFormat {
    fn empty(mime: &str) -> Self {
        Self {
            mime: mime.to_string(),
            track_type: TrackType::from_mime(mime),
            duration_us: -1,
            width: 0,
            height: 0,
            sample_rate: 0,
            channel_count: 0,
            max_input_size: 0,
            codec_specific_data: Vec::new(),
            language: None,
        }
    }

    pub fn video(mime: &str, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::empty(mime)
        }
    }

    pub fn audio(mime: &str, sample_rate: u32, channel_count: u16) -> Self {
        Self {
            sample_rate,
            channel_count,
            ..Self::empty(mime)
        }
    }

    pub fn subtitle(mime: &str, language: Option<&str>) -> Self {
        Self {
            language: language.map(str::to_string),
            ..Self::empty(mime)
        }
    }

    pub fn with_duration_us(mut self, duration_us: i64) -> Self {
        self.duration_us = duration_us;
        self
    }
}

/// 加密模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoMode {
    Unencrypted,
    AesCtr,
    AesCbc,
}

/// 单个加密访问单元的解密参数
#[derive(Debug, Clone, PartialEq)]
pub struct CryptoInfo {
    pub mode: CryptoMode,
    pub key_id: [u8; 16],
    pub iv: Vec<u8>,
    /// 每个子样本的明文字节数
    pub clear_bytes: Vec<u32>,
    /// 每个子样本的密文字节数
    pub encrypted_bytes: Vec<u32>,
}

impl CryptoInfo {
    pub fn subsample_count(&self) -> usize {
        self.clear_bytes.len()
    }
}

/// 轨道信息（供 UI / 选轨使用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub track_type: TrackType,
    pub mime: String,
    pub duration_us: i64,
    pub language: Option<String>,
    /// 自适应流的可选码率（bps），非自适应为空
    pub representations: Vec<u64>,
}

impl TrackInfo {
    pub fn from_format(format: &MediaFormat) -> Self {
        Self {
            track_type: format.track_type,
            mime: format.mime.clone(),
            duration_us: format.duration_us,
            language: format.language.clone(),
            representations: Vec::new(),
        }
    }
}

/// 元数据值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Int(i64),
    Text(String),
}

/// 媒体元数据（标题、作者等）
pub type MetaData = HashMap<String, MetaValue>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_uri_from_url() {
        assert_eq!(
            SourceUri::from_url("file:///sdcard/a.mp4"),
            SourceUri::LocalFile(PathBuf::from("/sdcard/a.mp4"))
        );
        assert_eq!(
            SourceUri::from_url("https://cdn.example.com/live/manifest.mpd"),
            SourceUri::Network {
                url: "https://cdn.example.com/live/manifest.mpd".to_string(),
                protocol: StreamProtocol::Dash,
            }
        );
        assert!(SourceUri::from_url("http://a/b.mp4").is_network_stream());
        assert!(!SourceUri::from_url("movie.mp4").is_network_stream());
    }

    #[test]
    fn test_track_type_from_mime() {
        assert_eq!(TrackType::from_mime("video/avc"), TrackType::Video);
        assert_eq!(TrackType::from_mime("audio/mp4a-latm"), TrackType::Audio);
        assert_eq!(TrackType::from_mime("application/ttml+xml"), TrackType::Subtitle);
        assert_eq!(TrackType::from_mime("application/octet-stream"), TrackType::Unknown);
    }
}
