use crate::core::{
    log_ctx, AccessUnit, AccessUnitStatus, Clock, CodecConfig, MediaFormat, Notification, Notifier,
    PlayerError, Result, TrackType,
};
use crate::player::codec_thread::{CodecThread, Frame};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, error, info, warn};
use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// 解码器输出状态
#[derive(Debug, Clone, PartialEq)]
pub enum OutputStatus {
    /// frame 已填充
    FrameReady,
    /// 暂无输出
    TryAgainLater,
    /// 输出格式变化（frame 未填充）
    FormatChanged(MediaFormat),
}

/// 编解码能力（平台硬件 / 软件解码器的抽象）
pub trait Decoder: Send {
    /// 按新格式（重新）配置
    fn configure(&mut self, format: &MediaFormat) -> Result<()>;

    /// 提交一个访问单元；输入缓冲区已满时返回 Ok(false)，稍后重试
    fn queue_input(&mut self, unit: &AccessUnit) -> Result<bool>;

    /// 输入结束
    fn queue_end_of_stream(&mut self) -> Result<()>;

    /// 取一个输出缓冲区填充到 frame
    fn dequeue_output(&mut self, frame: &mut Frame) -> Result<OutputStatus>;

    /// 归还输出缓冲区，render 为 true 时送显
    fn release_output(&mut self, frame: &Frame, render: bool) -> Result<()>;

    /// 丢弃所有输入输出（之后之前的缓冲区句柄全部失效）
    fn flush(&mut self) -> Result<()>;

    fn release(&mut self) {}
}

/// 渲染输出（音频写入 / 视频送显 / 字幕显示）
pub trait FrameRenderer: Send {
    fn render(&mut self, frame: &Frame) -> Result<()>;

    fn flush(&mut self) {}
}

/// 解码线程命令
#[derive(Debug)]
pub enum CodecMessage {
    Input(AccessUnit),
    Start,
    Pause,
    Flush,
    Seek(i64),
    Stop,
}

/// 单轨解码工作线程
///
/// 在 CodecThread 的队列 / 帧池之上运行：
/// 输入访问单元 → 解码器 → 解码队列 → 按时钟渲染 → 回收到帧池。
pub struct CodecWorker {
    track: TrackType,
    command_tx: Sender<CodecMessage>,
    codec: Arc<CodecThread>,
    handle: Option<JoinHandle<()>>,
}

impl CodecWorker {
    pub fn spawn(
        track: TrackType,
        decoder: Box<dyn Decoder>,
        renderer: Box<dyn FrameRenderer>,
        clock: Clock,
        notifier: Notifier,
        config: CodecConfig,
    ) -> Result<Self> {
        let (command_tx, command_rx) = unbounded::<CodecMessage>();
        let codec = Arc::new(CodecThread::new());

        let worker = WorkerLoop {
            track,
            decoder,
            renderer,
            clock,
            notifier,
            max_decoded_frames: config.max_decoded_frames(track).max(1),
            render_ahead_us: if track == TrackType::Video {
                config.video_render_ahead_us
            } else {
                0
            },
            codec: codec.clone(),
            pending_input: VecDeque::new(),
            playing: false,
            output_eos: false,
            rendered_first: false,
            seek_pending: false,
            seek_target_us: None,
            failed: false,
        };
        let tick = Duration::from_millis(config.worker_tick_ms.max(1));

        let handle = thread::Builder::new()
            .name(format!("codec-{}", track.as_str()))
            .spawn(move || worker.run(command_rx, tick))?;

        info!("{} 🎬 {} 解码线程已创建", log_ctx(), track.as_str());
        Ok(Self {
            track,
            command_tx,
            codec,
            handle: Some(handle),
        })
    }

    pub fn track(&self) -> TrackType {
        self.track
    }

    /// 解码队列 / 帧池（供调度器做流控判断）
    pub fn codec_thread(&self) -> &Arc<CodecThread> {
        &self.codec
    }

    pub fn queue_access_unit(&self, unit: AccessUnit) -> Result<()> {
        self.send(CodecMessage::Input(unit))
    }

    pub fn start(&self) -> Result<()> {
        self.send(CodecMessage::Start)
    }

    pub fn pause(&self) -> Result<()> {
        self.send(CodecMessage::Pause)
    }

    pub fn flush(&self) -> Result<()> {
        self.send(CodecMessage::Flush)
    }

    pub fn seek(&self, time_us: i64) -> Result<()> {
        self.send(CodecMessage::Seek(time_us))
    }

    /// 停止线程并等待退出
    pub fn stop(&mut self) {
        let _ = self.command_tx.send(CodecMessage::Stop);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
            info!("{} ✅ {} 解码线程已结束", log_ctx(), self.track.as_str());
        }
    }

    fn send(&self, message: CodecMessage) -> Result<()> {
        self.command_tx
            .send(message)
            .map_err(|_| PlayerError::Disconnected)
    }
}

impl Drop for CodecWorker {
    fn drop(&mut self) {
        if self.handle.is_some() {
            warn!("{} ⚠ CodecWorker 被 drop，但未调用 stop()，正在停止", log_ctx());
            self.stop();
        }
    }
}

struct WorkerLoop {
    track: TrackType,
    decoder: Box<dyn Decoder>,
    renderer: Box<dyn FrameRenderer>,
    clock: Clock,
    notifier: Notifier,
    max_decoded_frames: usize,
    render_ahead_us: i64,
    codec: Arc<CodecThread>,
    pending_input: VecDeque<AccessUnit>,
    playing: bool,
    output_eos: bool,
    rendered_first: bool,
    seek_pending: bool,
    /// seek 目标之前解码出的帧只归还不渲染
    seek_target_us: Option<i64>,
    /// 出错后停止处理，直到下一次 flush / seek
    failed: bool,
}

impl WorkerLoop {
    fn run(mut self, command_rx: Receiver<CodecMessage>, tick: Duration) {
        debug!("{} 🎬 {} 解码线程启动", log_ctx(), self.track.as_str());

        'outer: loop {
            match command_rx.recv_timeout(tick) {
                Ok(message) => {
                    if !self.handle_message(message) {
                        break;
                    }
                    // 先处理完积压的命令再解码
                    while let Ok(message) = command_rx.try_recv() {
                        if !self.handle_message(message) {
                            break 'outer;
                        }
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            if self.failed {
                continue;
            }
            if let Err(e) = self.step() {
                self.report_error(e);
            }
        }

        self.codec.clear_decoded_frames();
        self.decoder.release();
        debug!("{} 🛑 {} 解码线程退出", log_ctx(), self.track.as_str());
    }

    /// 返回 false 表示线程应退出
    fn handle_message(&mut self, message: CodecMessage) -> bool {
        match message {
            CodecMessage::Input(unit) => self.pending_input.push_back(unit),
            CodecMessage::Start => self.playing = true,
            CodecMessage::Pause => self.playing = false,
            CodecMessage::Flush => {
                self.flush();
                self.notifier
                    .notify(Notification::CodecFlushCompleted(self.track));
            }
            CodecMessage::Seek(time_us) => {
                info!("{} ⏩ {} 解码线程 Seek: {}us", log_ctx(), self.track.as_str(), time_us);
                self.flush();
                self.seek_pending = true;
                self.seek_target_us = Some(time_us);
            }
            CodecMessage::Stop => return false,
        }
        true
    }

    fn flush(&mut self) {
        let dropped_units = self.pending_input.len();
        self.pending_input.clear();
        if let Err(e) = self.decoder.flush() {
            error!("{} ❌ {} 解码器 flush 失败: {}", log_ctx(), self.track.as_str(), e);
        }
        let dropped_frames = self.codec.clear_decoded_frames();
        self.renderer.flush();
        self.output_eos = false;
        self.seek_target_us = None;
        self.failed = false;
        debug!(
            "{} 🧹 {} flush: 丢弃 {} 个访问单元, {} 帧",
            log_ctx(),
            self.track.as_str(),
            dropped_units,
            dropped_frames
        );
    }

    fn step(&mut self) -> Result<()> {
        self.feed_input()?;
        self.drain_output()?;
        if self.playing {
            self.render_due_frames()?;
        }
        Ok(())
    }

    fn feed_input(&mut self) -> Result<()> {
        while let Some(unit) = self.pending_input.front() {
            match unit.status {
                AccessUnitStatus::Ok => {
                    if !self.decoder.queue_input(unit)? {
                        // 解码器输入已满，下个周期重试
                        break;
                    }
                }
                AccessUnitStatus::FormatChanged => {
                    if let Some(ref format) = unit.format {
                        info!("{} 🔧 {} 格式变化: {}", log_ctx(), self.track.as_str(), format.mime);
                        self.decoder.configure(format)?;
                    }
                }
                AccessUnitStatus::EndOfStream => self.decoder.queue_end_of_stream()?,
                AccessUnitStatus::Error => {
                    self.pending_input.pop_front();
                    return Err(PlayerError::SourceError(format!(
                        "{} 轨道收到错误访问单元",
                        self.track.as_str()
                    )));
                }
                AccessUnitStatus::NoDataAvailable => {}
            }
            self.pending_input.pop_front();
        }
        Ok(())
    }

    fn drain_output(&mut self) -> Result<()> {
        while !self.output_eos && self.codec.decoded_frame_count() < self.max_decoded_frames {
            let mut frame = self.codec.remove_frame_from_pool();
            match self.decoder.dequeue_output(&mut frame) {
                Ok(OutputStatus::FrameReady) => {
                    if frame.info.is_end_of_stream() {
                        self.output_eos = true;
                    }
                    self.codec.add_decoded_frame(frame);
                }
                Ok(OutputStatus::TryAgainLater) => {
                    self.codec.add_frame_to_pool(frame);
                    break;
                }
                Ok(OutputStatus::FormatChanged(format)) => {
                    self.codec.add_frame_to_pool(frame);
                    if self.track == TrackType::Video {
                        self.notifier.notify(Notification::CodecVideoFormatChanged {
                            width: format.width,
                            height: format.height,
                        });
                    }
                }
                Err(e) => {
                    self.codec.add_frame_to_pool(frame);
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    fn render_due_frames(&mut self) -> Result<()> {
        loop {
            let info = match self.codec.peek_decoded_frame() {
                Some(frame) => frame.info,
                None => break,
            };

            if let Some(target_us) = self.seek_target_us {
                if info.size > 0 && info.presentation_time_us < target_us {
                    let Some(frame) = self.codec.remove_first_decoded_frame() else {
                        break;
                    };
                    let result = self.decoder.release_output(&frame, false);
                    self.codec.add_frame_to_pool(frame);
                    result?;
                    continue;
                }
                self.seek_target_us = None;
            }

            if !info.is_end_of_stream() || info.size > 0 {
                let now_us = self.clock.current_time_us();
                if info.presentation_time_us > now_us + self.render_ahead_us {
                    break;
                }
            }

            let Some(frame) = self.codec.remove_first_decoded_frame() else {
                break;
            };
            let result = self.render_frame(&frame);
            self.codec.add_frame_to_pool(frame);
            result?;

            if info.is_end_of_stream() {
                self.on_end_of_stream();
                break;
            }
        }
        Ok(())
    }

    fn render_frame(&mut self, frame: &Frame) -> Result<()> {
        let has_payload = frame.info.size > 0;
        if has_payload {
            self.renderer.render(frame)?;
        }
        self.decoder.release_output(frame, has_payload)?;
        if !has_payload {
            return Ok(());
        }

        match self.track {
            TrackType::Video => {
                if !self.rendered_first {
                    self.rendered_first = true;
                    self.notifier.notify(Notification::CodecVideoRenderingStart);
                }
                if self.seek_pending {
                    self.seek_pending = false;
                    self.notifier.notify(Notification::CodecVideoSeekCompleted);
                }
            }
            TrackType::Subtitle => {
                let data = frame
                    .byte_buffer
                    .as_ref()
                    .map(|buffer| {
                        let end = (frame.info.offset + frame.info.size).min(buffer.len());
                        let start = frame.info.offset.min(end);
                        bytes::Bytes::copy_from_slice(&buffer[start..end])
                    })
                    .unwrap_or_default();
                self.notifier.notify(Notification::CodecSubtitleData {
                    time_us: frame.info.presentation_time_us,
                    duration_us: 0,
                    data,
                });
            }
            TrackType::Audio | TrackType::Unknown => {}
        }
        Ok(())
    }

    fn on_end_of_stream(&mut self) {
        info!("{} 📄 {} 播放完成", log_ctx(), self.track.as_str());
        match self.track {
            TrackType::Audio => self.notifier.notify(Notification::CodecAudioCompleted),
            TrackType::Video => self.notifier.notify(Notification::CodecVideoCompleted),
            TrackType::Subtitle | TrackType::Unknown => {}
        }
    }

    fn report_error(&mut self, e: PlayerError) {
        let code = match e {
            PlayerError::Crypto(crypto_code) => CodecThread::media_drm_error_code(crypto_code).code(),
            ref other => other.code(),
        };
        error!("{} ❌ {} 解码失败: {} (code {})", log_ctx(), self.track.as_str(), e, code);
        self.failed = true;
        self.notifier.notify(Notification::CodecError {
            track: self.track,
            code,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::MEDIA_ERROR_UNKNOWN;
    use crate::core::{ClockConfig, DrmError, ManualTime};
    use crate::player::codec_thread::{BufferInfo, BUFFER_FLAG_END_OF_STREAM, CRYPTO_ERROR_KEY_EXPIRED};
    use bytes::Bytes;
    use crossbeam_channel::Receiver;
    use parking_lot::Mutex;
    use std::time::Instant;

    /// 直通解码器：每个输入单元产出一帧
    struct PassthroughDecoder {
        queued: VecDeque<(i64, usize, bool)>,
        next_index: i32,
        reject_encrypted_with: Option<i32>,
        announce_format: Option<MediaFormat>,
    }

    impl PassthroughDecoder {
        fn new() -> Self {
            Self {
                queued: VecDeque::new(),
                next_index: 0,
                reject_encrypted_with: None,
                announce_format: None,
            }
        }
    }

    impl Decoder for PassthroughDecoder {
        fn configure(&mut self, format: &MediaFormat) -> Result<()> {
            self.announce_format = Some(format.clone());
            Ok(())
        }

        fn queue_input(&mut self, unit: &AccessUnit) -> Result<bool> {
            if unit.is_encrypted() {
                if let Some(code) = self.reject_encrypted_with {
                    return Err(PlayerError::Crypto(code));
                }
            }
            if self.queued.len() >= 4 {
                return Ok(false);
            }
            self.queued.push_back((unit.time_us, unit.size(), false));
            Ok(true)
        }

        fn queue_end_of_stream(&mut self) -> Result<()> {
            self.queued.push_back((0, 0, true));
            Ok(())
        }

        fn dequeue_output(&mut self, frame: &mut Frame) -> Result<OutputStatus> {
            if let Some(format) = self.announce_format.take() {
                return Ok(OutputStatus::FormatChanged(format));
            }
            match self.queued.pop_front() {
                Some((pts, size, eos)) => {
                    frame.buffer_index = self.next_index;
                    self.next_index += 1;
                    frame.byte_buffer = Some(vec![0xAB; size]);
                    frame.info = BufferInfo {
                        offset: 0,
                        size,
                        presentation_time_us: pts,
                        flags: if eos { BUFFER_FLAG_END_OF_STREAM } else { 0 },
                    };
                    Ok(OutputStatus::FrameReady)
                }
                None => Ok(OutputStatus::TryAgainLater),
            }
        }

        fn release_output(&mut self, _frame: &Frame, _render: bool) -> Result<()> {
            Ok(())
        }

        fn flush(&mut self) -> Result<()> {
            self.queued.clear();
            Ok(())
        }
    }

    struct RecordingRenderer {
        rendered: Arc<Mutex<Vec<i64>>>,
    }

    impl FrameRenderer for RecordingRenderer {
        fn render(&mut self, frame: &Frame) -> Result<()> {
            self.rendered.lock().push(frame.info.presentation_time_us);
            Ok(())
        }
    }

    fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        condition()
    }

    fn wait_for(rx: &Receiver<Notification>, expected: &Notification) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while let Ok(notification) = rx.recv_deadline(deadline) {
            if &notification == expected {
                return true;
            }
        }
        false
    }

    struct Fixture {
        worker: CodecWorker,
        time: Arc<ManualTime>,
        clock: Clock,
        rendered: Arc<Mutex<Vec<i64>>>,
        events: Receiver<Notification>,
    }

    fn spawn_worker(track: TrackType, decoder: PassthroughDecoder) -> Fixture {
        let time = Arc::new(ManualTime::new(0));
        let clock = Clock::with_time_source(ClockConfig::default(), time.clone());
        let rendered = Arc::new(Mutex::new(Vec::new()));
        let (tx, events) = unbounded();
        let config = CodecConfig {
            worker_tick_ms: 1,
            ..CodecConfig::default()
        };
        let worker = CodecWorker::spawn(
            track,
            Box::new(decoder),
            Box::new(RecordingRenderer {
                rendered: rendered.clone(),
            }),
            clock.clone(),
            Notifier::new(tx),
            config,
        )
        .unwrap();
        Fixture {
            worker,
            time,
            clock,
            rendered,
            events,
        }
    }

    fn unit(pts: i64) -> AccessUnit {
        AccessUnit::new(0, Bytes::from_static(b"frame-data"), pts, 40_000, pts == 0)
    }

    #[test]
    fn test_video_frames_rendered_in_clock_order() {
        let mut fx = spawn_worker(TrackType::Video, PassthroughDecoder::new());
        for i in 0..3 {
            fx.worker.queue_access_unit(unit(i * 40_000)).unwrap();
        }
        fx.worker.queue_access_unit(AccessUnit::end_of_stream()).unwrap();
        fx.clock.start();
        fx.worker.start().unwrap();

        // 时钟停在 0：只有第一帧到期
        assert!(wait_for(&fx.events, &Notification::CodecVideoRenderingStart));
        assert_eq!(*fx.rendered.lock(), vec![0]);

        fx.time.advance(100_000);
        assert!(wait_for(&fx.events, &Notification::CodecVideoCompleted));
        assert_eq!(*fx.rendered.lock(), vec![0, 40_000, 80_000]);

        fx.worker.stop();
    }

    #[test]
    fn test_decoded_queue_is_bounded() {
        let mut fx = spawn_worker(TrackType::Audio, PassthroughDecoder::new());
        for i in 0..40 {
            fx.worker.queue_access_unit(unit(i * 20_000)).unwrap();
        }
        // 未开始播放：只解码到上限
        let codec = fx.worker.codec_thread().clone();
        assert!(wait_until(Duration::from_secs(2), || codec.decoded_frame_count() == 16));
        thread::sleep(Duration::from_millis(20));
        assert_eq!(codec.decoded_frame_count(), 16);
        assert!(fx.rendered.lock().is_empty());

        fx.worker.flush().unwrap();
        assert!(wait_for(&fx.events, &Notification::CodecFlushCompleted(TrackType::Audio)));
        assert_eq!(codec.decoded_frame_count(), 0);
        assert!(codec.frame_pool_count() >= 16);

        fx.worker.stop();
    }

    #[test]
    fn test_seek_reports_seek_completed() {
        let mut fx = spawn_worker(TrackType::Video, PassthroughDecoder::new());
        fx.clock.start();
        fx.worker.start().unwrap();
        fx.worker.queue_access_unit(unit(0)).unwrap();
        assert!(wait_for(&fx.events, &Notification::CodecVideoRenderingStart));

        fx.clock.set_seek_time_us(5_000_000);
        fx.worker.seek(5_000_000).unwrap();
        fx.worker.queue_access_unit(unit(5_000_000)).unwrap();
        assert!(wait_for(&fx.events, &Notification::CodecVideoSeekCompleted));
        assert_eq!(*fx.rendered.lock(), vec![0, 5_000_000]);

        fx.worker.stop();
    }

    #[test]
    fn test_frames_before_seek_target_are_dropped() {
        let mut fx = spawn_worker(TrackType::Video, PassthroughDecoder::new());
        fx.clock.start();
        fx.worker.start().unwrap();

        fx.clock.set_seek_time_us(200_000);
        fx.worker.seek(200_000).unwrap();
        // 从前一个关键帧开始解码
        for pts in [120_000, 160_000, 200_000, 240_000] {
            fx.worker.queue_access_unit(unit(pts)).unwrap();
        }
        fx.worker.queue_access_unit(AccessUnit::end_of_stream()).unwrap();

        assert!(wait_for(&fx.events, &Notification::CodecVideoSeekCompleted));
        fx.time.advance(100_000);
        assert!(wait_for(&fx.events, &Notification::CodecVideoCompleted));
        assert_eq!(*fx.rendered.lock(), vec![200_000, 240_000]);

        fx.worker.stop();
    }

    #[test]
    fn test_output_format_change_notified() {
        let mut fx = spawn_worker(TrackType::Video, PassthroughDecoder::new());
        fx.worker
            .queue_access_unit(AccessUnit::format_changed(0, MediaFormat::video("video/avc", 1920, 1080)))
            .unwrap();
        assert!(wait_for(
            &fx.events,
            &Notification::CodecVideoFormatChanged {
                width: 1920,
                height: 1080
            }
        ));
        fx.worker.stop();
    }

    #[test]
    fn test_subtitle_payload_delivered() {
        let mut fx = spawn_worker(TrackType::Subtitle, PassthroughDecoder::new());
        fx.clock.start();
        fx.worker.start().unwrap();
        fx.worker.queue_access_unit(unit(0)).unwrap();

        let deadline = Instant::now() + Duration::from_secs(2);
        let mut payload = None;
        while let Ok(notification) = fx.events.recv_deadline(deadline) {
            if let Notification::CodecSubtitleData { data, .. } = notification {
                payload = Some(data);
                break;
            }
        }
        assert_eq!(payload.map(|d| d.len()), Some(10));
        fx.worker.stop();
    }

    #[test]
    fn test_crypto_failure_mapped_to_drm_error() {
        let mut decoder = PassthroughDecoder::new();
        decoder.reject_encrypted_with = Some(CRYPTO_ERROR_KEY_EXPIRED);
        let mut fx = spawn_worker(TrackType::Video, decoder);

        let encrypted = unit(0).with_crypto_info(crate::core::CryptoInfo {
            mode: crate::core::CryptoMode::AesCtr,
            key_id: [1; 16],
            iv: vec![0; 16],
            clear_bytes: vec![0],
            encrypted_bytes: vec![10],
        });
        fx.worker.queue_access_unit(encrypted).unwrap();

        assert!(wait_for(
            &fx.events,
            &Notification::CodecError {
                track: TrackType::Video,
                code: DrmError::LicenseExpired.code()
            }
        ));
        fx.worker.stop();
    }

    #[test]
    fn test_error_unit_reported_as_codec_error() {
        let mut fx = spawn_worker(TrackType::Video, PassthroughDecoder::new());
        fx.clock.start();
        fx.worker.start().unwrap();
        fx.worker.queue_access_unit(AccessUnit::error()).unwrap();
        fx.worker.queue_access_unit(unit(0)).unwrap();

        assert!(wait_for(
            &fx.events,
            &Notification::CodecError {
                track: TrackType::Video,
                code: MEDIA_ERROR_UNKNOWN
            }
        ));
        // 出错后不再解码，直到 flush
        thread::sleep(Duration::from_millis(30));
        assert!(fx.rendered.lock().is_empty());

        fx.worker.flush().unwrap();
        fx.worker.queue_access_unit(unit(0)).unwrap();
        assert!(wait_for(&fx.events, &Notification::CodecVideoRenderingStart));
        assert_eq!(*fx.rendered.lock(), vec![0]);

        fx.worker.stop();
    }
}
