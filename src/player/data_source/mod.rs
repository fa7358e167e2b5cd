// 数据源：按字节区间读取媒体资源（本地文件 / HTTP / DASH 分段）

pub mod buffered;
pub mod dash;
pub mod direct;
pub mod transport;

pub use buffered::BufferedDataSource;
pub use dash::DashBufferedDataSource;
pub use direct::DirectDataSource;
pub use transport::{RangeResponse, RangeTransport};

use crate::core::{log_ctx, NetworkConfig, PlayerError, Result, SourceUri, StreamProtocol};
use log::info;
use std::sync::Arc;

/// 字节数据源
///
/// `read_at` 要么读满整个缓冲区，要么返回错误；偏移是资源内的绝对偏移。
pub trait DataSource: Send {
    /// 从 offset 处读取 buf.len() 个字节，成功后当前偏移移到读取末尾
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()>;

    /// 可读长度（从区间起点算起），未知时返回 None
    fn length(&self) -> Option<u64>;

    fn current_offset(&self) -> u64;

    fn set_current_offset(&mut self, offset: u64) -> Result<()>;

    /// 从当前偏移顺序读取
    fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        let offset = self.current_offset();
        self.read_at(offset, buf)
    }

    fn skip_bytes(&mut self, count: u64) -> Result<()> {
        let target = self.current_offset().saturating_add(count);
        self.set_current_offset(target)
    }

    fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read(&mut buf)?;
        Ok(buf[0])
    }

    fn read_u16(&mut self) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.read(&mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }

    fn read_u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read(&mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }

    fn read_u64(&mut self) -> Result<u64> {
        let mut buf = [0u8; 8];
        self.read(&mut buf)?;
        Ok(u64::from_be_bytes(buf))
    }

    fn close(&mut self) {}
}

/// 检查 [offset, offset + len) 是否落在 [start, start + length) 内
pub(crate) fn check_range(offset: u64, len: usize, start: u64, length: Option<u64>) -> Result<()> {
    let end = length.map_or(u64::MAX, |l| start.saturating_add(l));
    let read_end = offset.saturating_add(len as u64);
    if offset < start || read_end > end {
        return Err(PlayerError::OutOfRange { offset, start, end });
    }
    Ok(())
}

/// 根据地址创建数据源
///
/// 本地路径使用 DirectDataSource；网络地址需要提供传输层，
/// DASH 地址使用 DashBufferedDataSource。
pub fn open_data_source(
    uri: &SourceUri,
    offset: u64,
    length: Option<u64>,
    config: &NetworkConfig,
    transport: Option<Arc<dyn RangeTransport>>,
) -> Result<Box<dyn DataSource>> {
    match uri {
        SourceUri::LocalFile(path) => {
            info!("{} 📁 打开本地数据源: {}", log_ctx(), path.display());
            Ok(Box::new(DirectDataSource::open(path, offset, length)?))
        }
        SourceUri::Network { url, protocol } => {
            let transport = transport.ok_or_else(|| {
                PlayerError::Unsupported(format!("网络地址缺少传输层: {}", url))
            })?;
            info!("{} 🌐 打开网络数据源: {} ({})", log_ctx(), url, protocol.as_str());
            match protocol {
                StreamProtocol::Http => Ok(Box::new(BufferedDataSource::new(
                    url.clone(),
                    transport,
                    offset,
                    length,
                    config.clone(),
                ))),
                StreamProtocol::Dash => Ok(Box::new(DashBufferedDataSource::new(
                    url.clone(),
                    transport,
                    offset,
                    length,
                    config.clone(),
                ))),
            }
        }
    }
}
