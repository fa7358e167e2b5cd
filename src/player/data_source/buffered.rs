use super::transport::RangeTransport;
use super::{check_range, DataSource};
use crate::core::{log_ctx, NetworkConfig, PlayerError, Result};
use bytes::{Buf, BytesMut};
use log::{debug, info, warn};
use std::io::{ErrorKind, Read};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// 当前打开的区间请求
struct Connection {
    reader: Box<dyn Read + Send>,
    /// 下一个字节的绝对偏移
    position: u64,
    /// 响应体末尾的绝对偏移（服务端告知长度时）
    end: Option<u64>,
    /// 请求时未指定长度
    open_ended: bool,
}

/// 网络统计
#[derive(Debug, Clone, Default)]
struct NetworkStats {
    bytes_received: u64,
    first_connected: Option<Instant>,
}

/// 带预读缓冲的网络数据源
///
/// 预读窗口总是以当前连接的读取位置结尾。读取时：
/// 窗口内的数据直接返回；目标在连接位置之后且不超过跳读上限时顺着连接读过去；
/// 其他情况按新偏移重新发起请求。
pub struct BufferedDataSource {
    uri: String,
    transport: Arc<dyn RangeTransport>,
    config: NetworkConfig,
    range_start: u64,
    range_length: Option<u64>,
    current_offset: u64,
    /// 所有请求都使用开放区间（DASH 复用连接）
    force_open_ended: bool,
    connection: Option<Connection>,
    /// 预读窗口，裁剪头部只移动起点
    buffer: BytesMut,
    /// 单次网络读取的暂存区
    scratch: Vec<u8>,
    buffer_start: u64,
    /// 资源总长度（开放区间响应告知时）
    total_length: Option<u64>,
    reconnect_attempts: u32,
    connection_count: u32,
    stats: NetworkStats,
    closed: bool,
}

impl BufferedDataSource {
    pub fn new(
        uri: String,
        transport: Arc<dyn RangeTransport>,
        offset: u64,
        length: Option<u64>,
        config: NetworkConfig,
    ) -> Self {
        Self {
            uri,
            transport,
            config,
            range_start: offset,
            range_length: length,
            current_offset: offset,
            force_open_ended: false,
            connection: None,
            buffer: BytesMut::new(),
            scratch: Vec::new(),
            buffer_start: offset,
            total_length: None,
            reconnect_attempts: 0,
            connection_count: 0,
            stats: NetworkStats::default(),
            closed: false,
        }
    }

    pub(crate) fn force_open_ended(mut self) -> Self {
        self.force_open_ended = true;
        self
    }

    /// 切换读取区间，保留连接与预读窗口
    pub(crate) fn set_range(&mut self, offset: u64, length: Option<u64>) {
        self.range_start = offset;
        self.range_length = length;
        self.current_offset = offset;
    }

    /// 当前连接的读取位置
    pub(crate) fn connection_position(&self) -> Option<u64> {
        self.connection.as_ref().map(|conn| conn.position)
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// 已发起的请求次数（含重连）
    pub fn connection_count(&self) -> u32 {
        self.connection_count
    }

    pub fn bytes_received(&self) -> u64 {
        self.stats.bytes_received
    }

    /// 平均带宽（字节/秒），尚无数据时为 None
    pub fn bandwidth_estimate(&self) -> Option<f64> {
        let start = self.stats.first_connected?;
        let elapsed = start.elapsed().as_secs_f64();
        if elapsed > 0.0 && self.stats.bytes_received > 0 {
            Some(self.stats.bytes_received as f64 / elapsed)
        } else {
            None
        }
    }

    fn request_length(&self, position: u64) -> Option<u64> {
        if self.force_open_ended {
            return None;
        }
        self.range_length
            .map(|length| self.range_start.saturating_add(length).saturating_sub(position))
    }

    fn open_at(&mut self, position: u64) -> Result<Connection> {
        let length = self.request_length(position);
        let response = self.transport.open(&self.uri, position, length)?;
        self.connection_count += 1;
        if self.stats.first_connected.is_none() {
            self.stats.first_connected = Some(Instant::now());
        }

        let end = response.content_length.map(|len| position.saturating_add(len));
        if length.is_none() && end.is_some() {
            self.total_length = end;
        }
        debug!(
            "{} 🌐 区间请求 #{}: offset={}, length={:?}, 响应长度={:?}",
            log_ctx(),
            self.connection_count,
            position,
            length,
            response.content_length
        );
        Ok(Connection {
            reader: response.reader,
            position,
            end,
            open_ended: length.is_none(),
        })
    }

    /// 在新偏移处建立连接，丢弃预读窗口
    fn connect(&mut self, position: u64) -> Result<()> {
        self.connection = None;
        let connection = self.open_at(position)?;
        self.buffer.clear();
        self.buffer_start = position;
        self.connection = Some(connection);
        Ok(())
    }

    /// 连接中断后从断点续传
    fn reconnect(&mut self) -> Result<()> {
        let position = self
            .connection
            .as_ref()
            .map_or(self.buffer_start + self.buffer.len() as u64, |conn| conn.position);
        self.connection = None;

        while self.reconnect_attempts < self.config.max_reconnect_attempts {
            self.reconnect_attempts += 1;
            warn!(
                "{} 🔄 尝试重连 ({}/{}) offset={}",
                log_ctx(),
                self.reconnect_attempts,
                self.config.max_reconnect_attempts,
                position
            );
            self.sleep_retry();
            match self.open_at(position) {
                Ok(connection) => {
                    self.connection = Some(connection);
                    return Ok(());
                }
                Err(e) => warn!("{} ⚠️ 重连失败: {}", log_ctx(), e),
            }
        }
        Err(PlayerError::ReconnectExhausted(self.config.max_reconnect_attempts))
    }

    fn sleep_retry(&self) {
        if self.config.retry_sleep_ms > 0 {
            thread::sleep(Duration::from_millis(self.config.retry_sleep_ms));
        }
    }

    /// 从连接读取一块数据追加到预读窗口，返回读取的字节数；0 表示数据已读完
    fn fill_chunk(&mut self) -> Result<usize> {
        let chunk_size = self.config.chunk_size.max(1);
        if self.scratch.len() != chunk_size {
            self.scratch.resize(chunk_size, 0);
        }
        let mut stalls = 0u32;

        loop {
            let Some(conn) = self.connection.as_mut() else {
                return Ok(0);
            };
            if conn.end.map_or(false, |end| conn.position >= end) {
                return Ok(0);
            }

            let stalled = match conn.reader.read(&mut self.scratch) {
                Ok(0) => {
                    if conn.end.is_none() && !conn.open_ended {
                        // 有界请求且长度未知：读到结束即为区间末尾
                        return Ok(0);
                    }
                    true
                }
                Ok(n) => {
                    conn.position += n as u64;
                    self.buffer.extend_from_slice(&self.scratch[..n]);
                    self.trim_buffer();
                    self.reconnect_attempts = 0;
                    self.stats.bytes_received += n as u64;
                    return Ok(n);
                }
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::Interrupted) => true,
                Err(e) => {
                    warn!("{} ⚠️ 网络读取失败: {}", log_ctx(), e);
                    self.reconnect()?;
                    stalls = 0;
                    continue;
                }
            };

            if stalled {
                stalls += 1;
                if stalls <= self.config.max_read_retries {
                    self.sleep_retry();
                    continue;
                }
                let open_ended = self.connection.as_ref().map_or(false, |conn| conn.open_ended);
                if !open_ended {
                    return Ok(0);
                }
                info!("{} 📡 开放区间请求提前结束，重新连接", log_ctx());
                self.reconnect()?;
                stalls = 0;
            }
        }
    }

    fn trim_buffer(&mut self) {
        let limit = self.config.read_ahead_bytes.max(self.config.chunk_size).max(1);
        if self.buffer.len() > limit {
            let excess = self.buffer.len() - limit;
            self.buffer.advance(excess);
            self.buffer_start += excess as u64;
        }
    }
}

impl DataSource for BufferedDataSource {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        check_range(offset, buf.len(), self.range_start, self.range_length)?;
        if self.closed {
            return Err(PlayerError::SourceError("数据源已关闭".to_string()));
        }

        let mut filled = 0;
        while filled < buf.len() {
            let position = offset + filled as u64;
            let buffer_end = self.buffer_start + self.buffer.len() as u64;

            if position >= self.buffer_start && position < buffer_end {
                let from = (position - self.buffer_start) as usize;
                let n = (buf.len() - filled).min(self.buffer.len() - from);
                buf[filled..filled + n].copy_from_slice(&self.buffer[from..from + n]);
                filled += n;
                continue;
            }

            let reusable = self.connection.as_ref().map_or(false, |conn| {
                position >= conn.position && position - conn.position <= self.config.skip_forward_limit
            });
            if !reusable {
                self.connect(position)?;
            }

            if self.fill_chunk()? == 0 {
                return Err(PlayerError::ShortRead {
                    expected: buf.len(),
                    actual: filled,
                });
            }
        }

        self.current_offset = offset + buf.len() as u64;
        Ok(())
    }

    fn length(&self) -> Option<u64> {
        self.range_length
            .or_else(|| self.total_length.map(|total| total.saturating_sub(self.range_start)))
    }

    fn current_offset(&self) -> u64 {
        self.current_offset
    }

    fn set_current_offset(&mut self, offset: u64) -> Result<()> {
        check_range(offset, 0, self.range_start, self.range_length)?;
        self.current_offset = offset;
        Ok(())
    }

    fn close(&mut self) {
        if !self.closed {
            info!(
                "{} 🔌 关闭网络数据源: {}（共 {} 次请求，接收 {} 字节）",
                log_ctx(),
                self.uri,
                self.connection_count,
                self.stats.bytes_received
            );
        }
        self.closed = true;
        self.connection = None;
        self.buffer.clear();
    }
}

impl Drop for BufferedDataSource {
    fn drop(&mut self) {
        self.close();
    }
}
