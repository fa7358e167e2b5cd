use crate::core::Result;
use std::io::Read;

/// 区间请求的响应
pub struct RangeResponse {
    /// 响应体
    pub reader: Box<dyn Read + Send>,
    /// 响应体长度（服务端未告知时为 None）
    pub content_length: Option<u64>,
}

/// 网络传输层（HTTP Range 请求等）
///
/// length 为 None 表示开放区间 `bytes=offset-`。
pub trait RangeTransport: Send + Sync {
    fn open(&self, uri: &str, offset: u64, length: Option<u64>) -> Result<RangeResponse>;
}
