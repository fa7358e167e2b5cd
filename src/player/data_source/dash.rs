use super::buffered::BufferedDataSource;
use super::transport::RangeTransport;
use super::DataSource;
use crate::core::{log_ctx, NetworkConfig, Result};
use log::debug;
use std::sync::Arc;

/// DASH 分段数据源
///
/// 请求总是使用开放区间，连续的子分段可以沿用同一个连接；
/// `set_range` 只改变可读区间，是否重连由下一次读取的位置决定。
pub struct DashBufferedDataSource {
    inner: BufferedDataSource,
}

impl DashBufferedDataSource {
    pub fn new(
        uri: String,
        transport: Arc<dyn RangeTransport>,
        offset: u64,
        length: Option<u64>,
        config: NetworkConfig,
    ) -> Self {
        Self {
            inner: BufferedDataSource::new(uri, transport, offset, length, config).force_open_ended(),
        }
    }

    /// 切换到下一个分段区间
    pub fn set_range(&mut self, offset: u64, length: Option<u64>) {
        let contiguous = self.inner.connection_position() == Some(offset);
        debug!(
            "{} 🎞 DASH 切换区间: offset={}, length={:?}, 连续={}",
            log_ctx(),
            offset,
            length,
            contiguous
        );
        self.inner.set_range(offset, length);
    }

    pub fn connection_count(&self) -> u32 {
        self.inner.connection_count()
    }

    pub fn bandwidth_estimate(&self) -> Option<f64> {
        self.inner.bandwidth_estimate()
    }
}

impl DataSource for DashBufferedDataSource {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        self.inner.read_at(offset, buf)
    }

    fn length(&self) -> Option<u64> {
        self.inner.length()
    }

    fn current_offset(&self) -> u64 {
        self.inner.current_offset()
    }

    fn set_current_offset(&mut self, offset: u64) -> Result<()> {
        self.inner.set_current_offset(offset)
    }

    fn close(&mut self) {
        self.inner.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PlayerError;
    use crate::player::data_source::buffered::tests::{sample_data, MockTransport};

    fn config() -> NetworkConfig {
        NetworkConfig {
            max_reconnect_attempts: 2,
            max_read_retries: 1,
            retry_sleep_ms: 0,
            read_ahead_bytes: 256,
            skip_forward_limit: 64,
            chunk_size: 32,
        }
    }

    #[test]
    fn test_contiguous_segments_reuse_connection() {
        let data = sample_data(4096);
        let transport = Arc::new(MockTransport::new(data.clone()));
        let mut source = DashBufferedDataSource::new(
            "https://cdn.test/dash/video.mp4".to_string(),
            transport.clone(),
            0,
            Some(100),
            config(),
        );

        let mut segment = vec![0u8; 100];
        source.read(&mut segment).unwrap();
        assert_eq!(&segment[..], &data[..100]);

        // 下一个子分段紧接上一个
        source.set_range(100, Some(200));
        let mut segment = vec![0u8; 200];
        source.read(&mut segment).unwrap();
        assert_eq!(&segment[..], &data[100..300]);

        assert_eq!(transport.request_count(), 1);
        // 开放区间请求
        assert_eq!(transport.requests.lock()[0], (0, None));
    }

    #[test]
    fn test_distant_segment_reconnects() {
        let data = sample_data(4096);
        let transport = Arc::new(MockTransport::new(data.clone()));
        let mut source = DashBufferedDataSource::new(
            "https://cdn.test/dash/video.mp4".to_string(),
            transport.clone(),
            0,
            Some(64),
            config(),
        );
        let mut buf = vec![0u8; 64];
        source.read(&mut buf).unwrap();

        source.set_range(2048, Some(64));
        source.read(&mut buf).unwrap();
        assert_eq!(&buf[..], &data[2048..2112]);
        assert_eq!(transport.request_count(), 2);
        assert_eq!(transport.requests.lock()[1], (2048, None));
    }

    #[test]
    fn test_reads_limited_to_current_segment() {
        let transport = Arc::new(MockTransport::new(sample_data(1024)));
        let mut source = DashBufferedDataSource::new(
            "https://cdn.test/dash/video.mp4".to_string(),
            transport,
            0,
            Some(50),
            config(),
        );
        let mut buf = vec![0u8; 51];
        assert!(matches!(source.read(&mut buf), Err(PlayerError::OutOfRange { .. })));
        assert_eq!(source.length(), Some(50));
    }
}
