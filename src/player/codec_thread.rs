use crate::core::DrmError;
use log::debug;
use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use std::collections::VecDeque;

/// 解码输出缓冲区标志
pub const BUFFER_FLAG_SYNC_FRAME: u32 = 1;
pub const BUFFER_FLAG_CODEC_CONFIG: u32 = 2;
pub const BUFFER_FLAG_END_OF_STREAM: u32 = 4;

/// 底层解密失败码
pub const CRYPTO_ERROR_NO_KEY: i32 = 1;
pub const CRYPTO_ERROR_KEY_EXPIRED: i32 = 2;
pub const CRYPTO_ERROR_RESOURCE_BUSY: i32 = 3;
pub const CRYPTO_ERROR_INSUFFICIENT_OUTPUT_PROTECTION: i32 = 4;

/// 解码输出缓冲区信息
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferInfo {
    pub offset: usize,
    pub size: usize,
    pub presentation_time_us: i64,
    pub flags: u32,
}

impl BufferInfo {
    pub fn is_end_of_stream(&self) -> bool {
        self.flags & BUFFER_FLAG_END_OF_STREAM != 0
    }
}

/// 解码帧 - 指向解码器输出缓冲区的引用
///
/// 同一时刻只属于解码队列、帧池或调用方之一（通过所有权转移保证）。
#[derive(Debug, Default)]
pub struct Frame {
    /// 不直接渲染到 Surface 时使用的原始数据
    pub byte_buffer: Option<Vec<u8>>,
    pub info: BufferInfo,
    /// 解码器输出缓冲区句柄，未使用时为 -1
    pub buffer_index: i32,
}

impl Frame {
    pub fn new() -> Self {
        Self {
            byte_buffer: None,
            info: BufferInfo::default(),
            buffer_index: -1,
        }
    }

    /// 回收前复位（保留 byte_buffer 的容量以便复用）
    fn reset(&mut self) {
        if let Some(ref mut buffer) = self.byte_buffer {
            buffer.clear();
        }
        self.info = BufferInfo::default();
        self.buffer_index = -1;
    }
}

/// 解码线程基础设施：解码帧队列 + 帧对象池
///
/// 两个集合各自独立加锁；需要同时持有时，总是先锁队列再锁池。
pub struct CodecThread {
    decoded_frames: Mutex<VecDeque<Frame>>,
    frame_pool: Mutex<Vec<Frame>>,
}

impl CodecThread {
    pub fn new() -> Self {
        Self {
            decoded_frames: Mutex::new(VecDeque::new()),
            frame_pool: Mutex::new(Vec::new()),
        }
    }

    /// 追加到解码队列尾部（不做背压，由具体工作线程检查数量）
    pub fn add_decoded_frame(&self, frame: Frame) {
        self.decoded_frames.lock().push_back(frame);
    }

    /// 查看队首帧
    ///
    /// 返回的守卫持有队列锁，用完应尽快释放。
    pub fn peek_decoded_frame(&self) -> Option<MappedMutexGuard<'_, Frame>> {
        MutexGuard::try_map(self.decoded_frames.lock(), |frames| frames.front_mut()).ok()
    }

    /// 取出队首帧，队列为空时返回 None
    pub fn remove_first_decoded_frame(&self) -> Option<Frame> {
        self.decoded_frames.lock().pop_front()
    }

    /// 把解码队列中的所有帧移回帧池（flush / seek 时使用），返回移动的数量
    pub fn clear_decoded_frames(&self) -> usize {
        let mut frames = self.decoded_frames.lock();
        let mut pool = self.frame_pool.lock();
        let count = frames.len();
        for mut frame in frames.drain(..) {
            frame.reset();
            pool.push(frame);
        }
        if count > 0 {
            debug!("🧹 清空解码队列: {} 帧回收到帧池", count);
        }
        count
    }

    /// 归还帧到帧池
    pub fn add_frame_to_pool(&self, mut frame: Frame) {
        frame.reset();
        self.frame_pool.lock().push(frame);
    }

    /// 从帧池取一个帧；池为空时新建一个空帧
    pub fn remove_frame_from_pool(&self) -> Frame {
        self.frame_pool.lock().pop().unwrap_or_else(Frame::new)
    }

    pub fn decoded_frame_count(&self) -> usize {
        self.decoded_frames.lock().len()
    }

    pub fn frame_pool_count(&self) -> usize {
        self.frame_pool.lock().len()
    }

    /// 把底层解密失败码映射为播放器级 DRM 错误
    pub fn media_drm_error_code(code: i32) -> DrmError {
        match code {
            CRYPTO_ERROR_KEY_EXPIRED => DrmError::LicenseExpired,
            CRYPTO_ERROR_NO_KEY => DrmError::NoLicense,
            CRYPTO_ERROR_INSUFFICIENT_OUTPUT_PROTECTION => DrmError::InsufficientOutputProtection,
            _ => DrmError::Unknown,
        }
    }
}

impl Default for CodecThread {
    fn default() -> Self {
        Self::new()
    }
}
