use thiserror::Error;

/// 播放器级错误码（通过通知通道上报给上层）
pub const MEDIA_ERROR_UNKNOWN: i32 = 1;
pub const MEDIA_ERROR_IO: i32 = -1004;
pub const MEDIA_ERROR_MALFORMED: i32 = -1007;
pub const MEDIA_ERROR_UNSUPPORTED: i32 = -1010;
pub const MEDIA_ERROR_TIMED_OUT: i32 = -110;

/// DRM 错误分类（由底层解密失败码映射而来）
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrmError {
    #[error("DRM 未知错误")]
    Unknown,

    #[error("DRM 许可证已过期")]
    LicenseExpired,

    #[error("DRM 没有可用许可证")]
    NoLicense,

    #[error("DRM 输出保护级别不足")]
    InsufficientOutputProtection,
}

impl DrmError {
    /// 播放器级错误码
    pub fn code(&self) -> i32 {
        match self {
            DrmError::Unknown => -2000,
            DrmError::LicenseExpired => -2001,
            DrmError::NoLicense => -2002,
            DrmError::InsufficientOutputProtection => -2003,
        }
    }
}

#[derive(Error, Debug)]
pub enum PlayerError {
    #[error("IO 错误: {0}")]
    IoError(#[from] std::io::Error),

    #[error("读取越界: offset={offset}, 范围 [{start}, {end})")]
    OutOfRange { offset: u64, start: u64, end: u64 },

    #[error("读取不完整: 期望 {expected} 字节，实际 {actual} 字节")]
    ShortRead { expected: usize, actual: usize },

    #[error("重连失败：已达到最大重连次数 ({0})")]
    ReconnectExhausted(u32),

    #[error("比特流错误: {0}")]
    Bitstream(String),

    #[error("数据源错误: {0}")]
    SourceError(String),

    #[error("解码错误: {0}")]
    DecodeError(String),

    #[error("解密失败，底层错误码: {0}")]
    Crypto(i32),

    #[error("DRM 错误: {0}")]
    Drm(#[from] DrmError),

    #[error("不支持: {0}")]
    Unsupported(String),

    #[error("配置错误: {0}")]
    ConfigError(#[from] serde_json::Error),

    #[error("同步调用被取消")]
    Cancelled,

    #[error("对端已断开")]
    Disconnected,

    #[error("其他错误: {0}")]
    Other(String),

    #[error("Anyhow 错误: {0}")]
    AnyhowError(#[from] anyhow::Error),
}

impl PlayerError {
    /// 映射到播放器级错误码（用于 SourceError / PrepareFailed / CodecError 通知）
    pub fn code(&self) -> i32 {
        match self {
            PlayerError::IoError(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                MEDIA_ERROR_TIMED_OUT
            }
            PlayerError::IoError(_)
            | PlayerError::OutOfRange { .. }
            | PlayerError::ShortRead { .. }
            | PlayerError::ReconnectExhausted(_) => MEDIA_ERROR_IO,
            PlayerError::Bitstream(_) => MEDIA_ERROR_MALFORMED,
            PlayerError::Unsupported(_) => MEDIA_ERROR_UNSUPPORTED,
            PlayerError::Drm(drm) => drm.code(),
            _ => MEDIA_ERROR_UNKNOWN,
        }
    }
}

pub type Result<T> = std::result::Result<T, PlayerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let io = PlayerError::IoError(std::io::Error::new(std::io::ErrorKind::Other, "x"));
        assert_eq!(io.code(), MEDIA_ERROR_IO);

        let timeout = PlayerError::IoError(std::io::Error::new(std::io::ErrorKind::TimedOut, "x"));
        assert_eq!(timeout.code(), MEDIA_ERROR_TIMED_OUT);

        assert_eq!(PlayerError::Bitstream("eof".into()).code(), MEDIA_ERROR_MALFORMED);
        assert_eq!(PlayerError::Drm(DrmError::NoLicense).code(), -2002);
        assert_eq!(PlayerError::Cancelled.code(), MEDIA_ERROR_UNKNOWN);
    }
}
