use crate::core::types::{CryptoInfo, MediaFormat};
use bytes::Bytes;
use std::sync::Arc;

/// 访问单元状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessUnitStatus {
    Ok,
    Error,
    EndOfStream,
    NoDataAvailable,
    FormatChanged,
}

/// 访问单元 - 数据源与解码线程之间交换的数据单位
///
/// 可以是一段带时间戳（可能加密）的基本流数据、格式变化标记，
/// 或者错误 / 结束 / 暂无数据等控制信号。
#[derive(Debug, Clone)]
pub struct AccessUnit {
    pub status: AccessUnitStatus,
    pub data: Option<Bytes>,
    /// 显示时间戳（微秒）
    pub time_us: i64,
    pub duration_us: i64,
    pub is_sync_sample: bool,
    /// 轨道索引（哨兵为 -1）
    pub track_index: i32,
    /// 仅 FormatChanged 时存在
    pub format: Option<Arc<MediaFormat>>,
    /// 仅加密数据时存在
    pub crypto_info: Option<Arc<CryptoInfo>>,
}

/// 共享的只读哨兵实例，不携带数据，分发时不分配内存
pub static ERROR: AccessUnit = AccessUnit::sentinel(AccessUnitStatus::Error);
pub static END_OF_STREAM: AccessUnit = AccessUnit::sentinel(AccessUnitStatus::EndOfStream);
pub static NO_DATA_AVAILABLE: AccessUnit = AccessUnit::sentinel(AccessUnitStatus::NoDataAvailable);

impl AccessUnit {
    const fn sentinel(status: AccessUnitStatus) -> Self {
        Self {
            status,
            data: None,
            time_us: -1,
            duration_us: 0,
            is_sync_sample: false,
            track_index: -1,
            format: None,
            crypto_info: None,
        }
    }

    /// 创建携带数据的访问单元
    pub fn new(track_index: i32, data: Bytes, time_us: i64, duration_us: i64, is_sync_sample: bool) -> Self {
        Self {
            status: AccessUnitStatus::Ok,
            data: Some(data),
            time_us,
            duration_us,
            is_sync_sample,
            track_index,
            format: None,
            crypto_info: None,
        }
    }

    /// 附加解密参数
    pub fn with_crypto_info(mut self, crypto_info: CryptoInfo) -> Self {
        self.crypto_info = Some(Arc::new(crypto_info));
        self
    }

    /// 格式变化标记
    pub fn format_changed(track_index: i32, format: MediaFormat) -> Self {
        Self {
            status: AccessUnitStatus::FormatChanged,
            track_index,
            format: Some(Arc::new(format)),
            ..Self::sentinel(AccessUnitStatus::FormatChanged)
        }
    }

    pub fn error() -> Self {
        ERROR.clone()
    }

    pub fn end_of_stream() -> Self {
        END_OF_STREAM.clone()
    }

    pub fn no_data() -> Self {
        NO_DATA_AVAILABLE.clone()
    }

    /// 数据大小（字节）
    pub fn size(&self) -> usize {
        self.data.as_ref().map_or(0, Bytes::len)
    }

    pub fn is_encrypted(&self) -> bool {
        self.crypto_info.is_some()
    }

    /// 是否为不携带数据的控制信号
    pub fn is_sentinel(&self) -> bool {
        matches!(
            self.status,
            AccessUnitStatus::Error | AccessUnitStatus::EndOfStream | AccessUnitStatus::NoDataAvailable
        )
    }
}
