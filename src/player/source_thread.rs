use crate::core::{
    log_ctx, AccessUnit, BufferingConfig, MediaFormat, MetaData, Notification, Notifier, PlayerError,
    Result, TrackInfo, TrackType,
};
use crate::player::media_source::MediaSource;
use crossbeam_channel::{bounded, unbounded, Receiver, SendTimeoutError, Sender};
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// 单次发送等待时间，期间无法入队则先处理命令
const SEND_WAIT: Duration = Duration::from_millis(10);

/// 容器解析器接口
///
/// 不同的容器格式（MP4、TS、DASH 分段等）实现这个接口；
/// ThreadedMediaSource 在独立线程中驱动它。
pub trait Demuxer: Send {
    /// 解析头部信息，之后 tracks() 可用
    fn open(&mut self) -> Result<()>;

    /// 所有轨道的格式
    fn tracks(&self) -> Vec<MediaFormat>;

    /// 读取下一个访问单元及其轨道索引
    ///
    /// 返回：
    /// - Ok(Some(..)): 成功读取
    /// - Ok(None): 到达末尾
    /// - Err(e): 读取错误
    fn read_unit(&mut self) -> Result<Option<(usize, AccessUnit)>>;

    /// Seek 到指定位置（微秒）
    fn seek(&mut self, time_us: i64) -> Result<()>;

    fn duration_us(&self) -> Option<i64> {
        None
    }

    fn metadata(&self) -> MetaData {
        MetaData::new()
    }

    /// 轨道的可选码率（bps），初始使用第一个
    fn representations(&self, _track_index: usize) -> Vec<u64> {
        Vec::new()
    }

    /// 切换码率，格式发生变化时返回新格式
    fn switch_representation(&mut self, _track_index: usize, _bandwidth: u64) -> Result<Option<MediaFormat>> {
        Ok(None)
    }

    /// 获取描述信息（用于调试）
    fn description(&self) -> String;
}

/// 缓冲管理器
///
/// 按队列中访问单元的数量判断缓冲状态：
/// 低于低水位进入缓冲，达到高水位结束缓冲。
#[derive(Debug)]
pub struct BufferManager {
    low_watermark: usize,
    high_watermark: usize,
    is_buffering: bool,
    last_percent: Option<u8>,
}

impl BufferManager {
    pub fn new(low_watermark: usize, high_watermark: usize) -> Self {
        Self {
            low_watermark,
            high_watermark: high_watermark.max(low_watermark + 1),
            is_buffering: false,
            last_percent: None,
        }
    }

    /// 更新队列水位，返回需要上报的事件
    pub fn update(&mut self, level: usize) -> Vec<Notification> {
        let mut events = Vec::new();
        if !self.is_buffering && level <= self.low_watermark {
            info!("{} 🔄 开始缓冲（当前: {} / 目标: {}）", log_ctx(), level, self.high_watermark);
            self.is_buffering = true;
            self.last_percent = None;
            events.push(Notification::BufferingStart);
        }

        if self.is_buffering {
            let percent = self.progress(level);
            if self.last_percent != Some(percent) {
                self.last_percent = Some(percent);
                events.push(Notification::BufferingUpdate(percent));
            }
            if level >= self.high_watermark {
                info!("{} ✅ 缓冲完成（当前: {}）", log_ctx(), level);
                self.is_buffering = false;
                events.push(Notification::BufferingEnd);
            }
        }
        events
    }

    /// 数据已读完：结束缓冲状态
    pub fn finish(&mut self) -> Option<Notification> {
        if self.is_buffering {
            self.is_buffering = false;
            Some(Notification::BufferingEnd)
        } else {
            None
        }
    }

    pub fn is_buffering(&self) -> bool {
        self.is_buffering
    }

    /// 缓冲进度（0-100）
    pub fn progress(&self, level: usize) -> u8 {
        ((level.min(self.high_watermark) * 100) / self.high_watermark) as u8
    }
}

/// 带 seek 代数标记的访问单元，代数不匹配的单元会被丢弃
struct TaggedUnit {
    generation: u64,
    unit: AccessUnit,
}

enum SourceCommand {
    Start,
    Stop,
    Seek { time_us: i64, generation: u64 },
    TrackSelected { track: TrackType, index: Option<usize> },
    SwitchRepresentation { track_index: usize, bandwidth: u64 },
    Shutdown,
}

/// 准备完成后的媒体信息
#[derive(Debug, Clone, Default)]
struct PreparedInfo {
    formats: Vec<MediaFormat>,
    duration_us: Option<i64>,
    metadata: MetaData,
    representations: Vec<Vec<u64>>,
}

impl PreparedInfo {
    fn track_type(&self, index: usize) -> TrackType {
        self.formats.get(index).map_or(TrackType::Unknown, |f| f.track_type)
    }
}

/// 工作线程与调用方共享的状态
#[derive(Default)]
struct SharedState {
    info: Mutex<Option<PreparedInfo>>,
    selected: Mutex<HashMap<TrackType, usize>>,
    /// 当前 seek 代数
    generation: AtomicU64,
    /// 已读完的代数 + 1（0 表示未读完）
    eos_generation: AtomicU64,
    /// 出错的代数 + 1（0 表示无错误）
    error_generation: AtomicU64,
    /// 每个轨道当前码率与允许的码率档位
    current_representation: Mutex<HashMap<usize, u64>>,
    allowed_representations: Mutex<HashMap<usize, Vec<usize>>>,
}

impl SharedState {
    fn selected_index(&self, track: TrackType) -> Option<usize> {
        self.selected.lock().get(&track).copied()
    }

    fn is_selected(&self, index: usize, track: TrackType) -> bool {
        self.selected_index(track) == Some(index)
    }
}

type TrackQueue = (Sender<TaggedUnit>, Receiver<TaggedUnit>);

const QUEUED_TRACKS: [TrackType; 3] = [TrackType::Video, TrackType::Audio, TrackType::Subtitle];

/// 在独立线程中运行 Demuxer 的媒体源
///
/// - 每类轨道一个有界 channel，队列满时解析线程等待（背压）
/// - seek 后代数加一，旧代数的访问单元在出队时丢弃
/// - dequeue_access_unit 从不阻塞
pub struct ThreadedMediaSource<D: Demuxer + 'static> {
    demuxer: Option<D>,
    notifier: Notifier,
    config: BufferingConfig,
    shared: Arc<SharedState>,
    queues: HashMap<TrackType, TrackQueue>,
    command_tx: Option<Sender<SourceCommand>>,
    thread_handle: Option<JoinHandle<()>>,
    released: AtomicBool,
}

impl<D: Demuxer + 'static> ThreadedMediaSource<D> {
    pub fn new(demuxer: D, config: BufferingConfig, notifier: Notifier) -> Self {
        let queues = QUEUED_TRACKS
            .iter()
            .map(|&track| (track, bounded::<TaggedUnit>(config.capacity_for(track).max(1))))
            .collect();
        Self {
            demuxer: Some(demuxer),
            notifier,
            config,
            shared: Arc::new(SharedState::default()),
            queues,
            command_tx: None,
            thread_handle: None,
            released: AtomicBool::new(false),
        }
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.released.load(Ordering::Acquire) {
            return Err(PlayerError::Other("媒体源已释放".to_string()));
        }
        Ok(())
    }

    fn send(&self, command: SourceCommand) -> Result<()> {
        self.ensure_alive()?;
        let tx = self
            .command_tx
            .as_ref()
            .ok_or_else(|| PlayerError::Other("媒体源尚未准备".to_string()))?;
        tx.send(command).map_err(|_| PlayerError::Disconnected)
    }

    fn with_info<T>(&self, f: impl FnOnce(&PreparedInfo) -> T) -> Option<T> {
        self.shared.info.lock().as_ref().map(f)
    }

    /// 取出当前代数的下一个单元，seek 之前的旧数据直接丢弃
    fn take_current(rx: &Receiver<TaggedUnit>, generation: u64) -> Option<AccessUnit> {
        while let Ok(tagged) = rx.try_recv() {
            if tagged.generation == generation {
                return Some(tagged.unit);
            }
        }
        None
    }

    /// 为所有选中的自适应轨道挑选码率：不超过带宽的最高档，否则最低档
    fn pick_representation(representations: &[u64], allowed: Option<&Vec<usize>>, bandwidth_bps: u64) -> Option<u64> {
        let candidates: Vec<u64> = match allowed {
            Some(indices) => indices.iter().filter_map(|&i| representations.get(i).copied()).collect(),
            None => representations.to_vec(),
        };
        candidates
            .iter()
            .copied()
            .filter(|&bw| bw <= bandwidth_bps)
            .max()
            .or_else(|| candidates.iter().copied().min())
    }
}

impl<D: Demuxer + 'static> MediaSource for ThreadedMediaSource<D> {
    fn prepare_async(&mut self) -> Result<()> {
        self.ensure_alive()?;
        let demuxer = self
            .demuxer
            .take()
            .ok_or_else(|| PlayerError::Other("媒体源已在准备".to_string()))?;

        let (command_tx, command_rx) = unbounded::<SourceCommand>();
        let worker = SourceWorker {
            demuxer,
            shared: self.shared.clone(),
            notifier: self.notifier.clone(),
            queues: self.queues.clone(),
            command_rx,
            buffer_manager: BufferManager::new(self.config.low_watermark, self.config.high_watermark),
            outbox: VecDeque::new(),
            generation: 0,
            pumping: false,
            announced: false,
            eos: false,
            failed: false,
            unit_count: 0,
        };

        let handle = thread::Builder::new()
            .name("media-source".to_string())
            .spawn(move || worker.run())?;
        self.command_tx = Some(command_tx);
        self.thread_handle = Some(handle);
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        self.send(SourceCommand::Start)
    }

    fn stop(&mut self) -> Result<()> {
        self.send(SourceCommand::Stop)
    }

    fn seek_to(&mut self, time_us: i64) -> Result<()> {
        self.ensure_alive()?;
        // 先递增代数，之后出队的旧数据立即作废
        let generation = self.shared.generation.fetch_add(1, Ordering::AcqRel) + 1;
        info!("{} ⏩ MediaSource Seek: {}us (代数 {})", log_ctx(), time_us, generation);
        self.send(SourceCommand::Seek { time_us, generation })
    }

    fn release(&mut self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        info!("{} 🛑 MediaSource release", log_ctx());
        if let Some(tx) = self.command_tx.take() {
            let _ = tx.send(SourceCommand::Shutdown);
        }
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
        for (rx_track, (_, rx)) in &self.queues {
            let dropped = rx.try_iter().count();
            if dropped > 0 {
                debug!("{} 🧹 {} 队列丢弃 {} 个访问单元", log_ctx(), rx_track.as_str(), dropped);
            }
        }
    }

    fn format(&self, track: TrackType) -> Option<MediaFormat> {
        let index = self.shared.selected_index(track)?;
        self.with_info(|info| info.formats.get(index).cloned()).flatten()
    }

    fn dequeue_access_unit(&self, track: TrackType) -> AccessUnit {
        if self.released.load(Ordering::Acquire) {
            return AccessUnit::error();
        }
        let Some((_, rx)) = self.queues.get(&track) else {
            return AccessUnit::error();
        };

        let generation = self.shared.generation.load(Ordering::Acquire);
        if let Some(unit) = Self::take_current(rx, generation) {
            return unit;
        }

        let failed = self.shared.error_generation.load(Ordering::Acquire) == generation + 1;
        let ended = self.shared.eos_generation.load(Ordering::Acquire) == generation + 1;
        if failed || ended {
            // 标志在最后一个单元入队之后才置位：再取一次，避免丢掉末尾数据
            if let Some(unit) = Self::take_current(rx, generation) {
                return unit;
            }
        }

        if failed {
            AccessUnit::error()
        } else if ended && self.shared.selected_index(track).is_some() {
            AccessUnit::end_of_stream()
        } else {
            AccessUnit::no_data()
        }
    }

    fn track_info(&self) -> Vec<TrackInfo> {
        self.with_info(|info| {
            info.formats
                .iter()
                .enumerate()
                .map(|(index, format)| {
                    let mut track = TrackInfo::from_format(format);
                    track.representations = info.representations.get(index).cloned().unwrap_or_default();
                    track
                })
                .collect()
        })
        .unwrap_or_default()
    }

    fn select_track(&mut self, index: usize, select: bool) -> Result<()> {
        self.ensure_alive()?;
        let track = self
            .with_info(|info| info.formats.get(index).map(|f| f.track_type))
            .flatten()
            .ok_or_else(|| PlayerError::Other(format!("无效的轨道索引: {}", index)))?;

        {
            let mut selected = self.shared.selected.lock();
            if select {
                if selected.get(&track) == Some(&index) {
                    return Ok(());
                }
                selected.insert(track, index);
            } else if selected.get(&track) == Some(&index) {
                selected.remove(&track);
            } else {
                return Ok(());
            }
        }

        info!(
            "{} 🎚 {} 轨道 {} {}",
            log_ctx(),
            track.as_str(),
            index,
            if select { "选中" } else { "取消选中" }
        );
        if track == TrackType::Subtitle {
            self.notifier.notify(Notification::SubtitleChange);
        }
        self.send(SourceCommand::TrackSelected {
            track,
            index: select.then_some(index),
        })
    }

    fn selected_track_index(&self, track: TrackType) -> Option<usize> {
        self.shared.selected_index(track)
    }

    fn duration_us(&self) -> Option<i64> {
        self.with_info(|info| info.duration_us).flatten()
    }

    fn metadata(&self) -> MetaData {
        self.with_info(|info| info.metadata.clone()).unwrap_or_default()
    }

    fn is_adaptive(&self) -> bool {
        self.with_info(|info| info.representations.iter().any(|reps| reps.len() > 1))
            .unwrap_or(false)
    }

    fn set_bandwidth_estimate(&mut self, bandwidth_bps: u64) {
        let Some(representations) = self.with_info(|info| info.representations.clone()) else {
            return;
        };
        let selected: Vec<usize> = self.shared.selected.lock().values().copied().collect();

        for track_index in selected {
            let Some(reps) = representations.get(track_index) else {
                continue;
            };
            if reps.len() < 2 {
                continue;
            }
            let allowed = self.shared.allowed_representations.lock().get(&track_index).cloned();
            let Some(target) = Self::pick_representation(reps, allowed.as_ref(), bandwidth_bps) else {
                continue;
            };
            let current = self.shared.current_representation.lock().get(&track_index).copied();
            if current == Some(target) {
                continue;
            }
            debug!(
                "{} 📶 带宽 {} bps，轨道 {} 切换码率 {:?} → {}",
                log_ctx(),
                bandwidth_bps,
                track_index,
                current,
                target
            );
            self.shared.current_representation.lock().insert(track_index, target);
            if let Err(e) = self.send(SourceCommand::SwitchRepresentation {
                track_index,
                bandwidth: target,
            }) {
                warn!("{} ⚠️ 发送码率切换命令失败: {}", log_ctx(), e);
            }
        }
    }

    fn select_representations(&mut self, track: TrackType, indices: &[usize]) -> Result<()> {
        let index = self
            .shared
            .selected_index(track)
            .ok_or_else(|| PlayerError::Other(format!("{} 没有选中的轨道", track.as_str())))?;
        let available = self
            .with_info(|info| info.representations.get(index).map_or(0, Vec::len))
            .unwrap_or(0);
        if indices.is_empty() || indices.iter().any(|&i| i >= available) {
            return Err(PlayerError::Unsupported(format!(
                "无效的码率档位 {:?}（共 {} 档）",
                indices, available
            )));
        }
        self.shared
            .allowed_representations
            .lock()
            .insert(index, indices.to_vec());
        Ok(())
    }
}

impl<D: Demuxer + 'static> Drop for ThreadedMediaSource<D> {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            warn!("{} ⚠ ThreadedMediaSource 被 drop，但未调用 release()，正在停止", log_ctx());
        }
        self.release();
    }
}

/// 解析线程
struct SourceWorker<D: Demuxer> {
    demuxer: D,
    shared: Arc<SharedState>,
    notifier: Notifier,
    queues: HashMap<TrackType, TrackQueue>,
    command_rx: Receiver<SourceCommand>,
    buffer_manager: BufferManager,
    /// 待发送的访问单元（格式变化标记、队列满时暂存的数据）
    outbox: VecDeque<(TrackType, AccessUnit)>,
    generation: u64,
    pumping: bool,
    announced: bool,
    eos: bool,
    failed: bool,
    unit_count: usize,
}

impl<D: Demuxer> SourceWorker<D> {
    fn run(mut self) {
        info!("{} 🎬 MediaSource 线程启动: {}", log_ctx(), self.demuxer.description());

        if let Err(e) = self.demuxer.open() {
            error!("{} ❌ 准备失败: {}", log_ctx(), e);
            self.notifier.notify(Notification::SourcePrepareFailed(e.code()));
            return;
        }
        self.install_info();
        self.notifier.notify(Notification::SourcePrepared);

        loop {
            let idle = !self.pumping || ((self.eos || self.failed) && self.outbox.is_empty());
            let command = if idle {
                match self.command_rx.recv() {
                    Ok(command) => Some(command),
                    Err(_) => break,
                }
            } else {
                match self.command_rx.try_recv() {
                    Ok(command) => Some(command),
                    Err(crossbeam_channel::TryRecvError::Empty) => None,
                    Err(crossbeam_channel::TryRecvError::Disconnected) => break,
                }
            };

            match command {
                Some(command) => {
                    if !self.handle_command(command) {
                        break;
                    }
                }
                None => self.pump_once(),
            }
        }

        info!("{} 🛑 MediaSource 线程退出（共发送 {} 个访问单元）", log_ctx(), self.unit_count);
    }

    fn install_info(&mut self) {
        let formats = self.demuxer.tracks();
        let representations: Vec<Vec<u64>> = (0..formats.len())
            .map(|index| self.demuxer.representations(index))
            .collect();

        {
            let mut selected = self.shared.selected.lock();
            for (index, format) in formats.iter().enumerate() {
                if format.track_type != TrackType::Unknown {
                    selected.entry(format.track_type).or_insert(index);
                }
            }
        }
        {
            let mut current = self.shared.current_representation.lock();
            for (index, reps) in representations.iter().enumerate() {
                if let Some(&first) = reps.first() {
                    current.insert(index, first);
                }
            }
        }

        info!(
            "{} ✅ 准备完成: {} 个轨道, 时长 {:?}us",
            log_ctx(),
            formats.len(),
            self.demuxer.duration_us()
        );
        *self.shared.info.lock() = Some(PreparedInfo {
            formats,
            duration_us: self.demuxer.duration_us(),
            metadata: self.demuxer.metadata(),
            representations,
        });
    }

    /// 返回 false 表示线程应退出
    fn handle_command(&mut self, command: SourceCommand) -> bool {
        match command {
            SourceCommand::Start => {
                self.pumping = true;
                if !self.announced {
                    self.announced = true;
                    for track in QUEUED_TRACKS {
                        if let Some(index) = self.shared.selected_index(track) {
                            self.announce_format(track, index);
                        }
                    }
                }
            }
            SourceCommand::Stop => self.pumping = false,
            SourceCommand::Seek { time_us, generation } => {
                self.generation = generation;
                self.outbox.retain(|(_, unit)| unit.format.is_some());
                self.purge_queues(None);
                self.eos = false;
                self.failed = false;
                if let Err(e) = self.demuxer.seek(time_us) {
                    error!("{} ❌ Seek 失败: {}", log_ctx(), e);
                    self.fail(e);
                }
            }
            SourceCommand::TrackSelected { track, index } => {
                self.outbox.retain(|(t, _)| *t != track);
                self.purge_queues(Some(track));
                if let Some(index) = index {
                    if self.announced {
                        self.announce_format(track, index);
                    }
                }
            }
            SourceCommand::SwitchRepresentation { track_index, bandwidth } => {
                match self.demuxer.switch_representation(track_index, bandwidth) {
                    Ok(new_format) => {
                        let track = self.track_type(track_index);
                        if let Some(format) = new_format {
                            if let Some(info) = self.shared.info.lock().as_mut() {
                                if let Some(slot) = info.formats.get_mut(track_index) {
                                    *slot = format.clone();
                                }
                            }
                            if self.shared.is_selected(track_index, track) {
                                self.outbox
                                    .push_back((track, AccessUnit::format_changed(track_index as i32, format)));
                            }
                        }
                        info!("{} 📶 {} 码率切换到 {} bps", log_ctx(), track.as_str(), bandwidth);
                        self.notifier
                            .notify(Notification::RepresentationChanged { track, bandwidth });
                    }
                    Err(e) => warn!("{} ⚠️ 码率切换失败: {}", log_ctx(), e),
                }
            }
            SourceCommand::Shutdown => {
                info!("{} ⏹ MediaSource 线程收到停止命令", log_ctx());
                return false;
            }
        }
        true
    }

    fn track_type(&self, index: usize) -> TrackType {
        self.shared
            .info
            .lock()
            .as_ref()
            .map_or(TrackType::Unknown, |info| info.track_type(index))
    }

    fn announce_format(&mut self, track: TrackType, index: usize) {
        let format = self
            .shared
            .info
            .lock()
            .as_ref()
            .and_then(|info| info.formats.get(index).cloned());
        if let Some(format) = format {
            self.outbox
                .push_back((track, AccessUnit::format_changed(index as i32, format)));
        }
    }

    /// 清空队列中的旧数据（None 表示全部轨道）
    fn purge_queues(&self, only: Option<TrackType>) {
        for (track, (_, rx)) in &self.queues {
            if only.map_or(true, |t| t == *track) {
                let dropped = rx.try_iter().count();
                if dropped > 0 {
                    debug!("{} 🧹 {} 队列丢弃 {} 个旧访问单元", log_ctx(), track.as_str(), dropped);
                }
            }
        }
    }

    fn fail(&mut self, e: PlayerError) {
        self.failed = true;
        self.shared
            .error_generation
            .store(self.generation + 1, Ordering::Release);
        self.notifier.notify(Notification::SourceError(e.code()));
    }

    fn pump_once(&mut self) {
        if self.outbox.is_empty() {
            if self.eos || self.failed {
                return;
            }
            match self.demuxer.read_unit() {
                Ok(Some((index, unit))) => {
                    let track = self.track_type(index);
                    if !self.shared.is_selected(index, track) {
                        return;
                    }
                    self.outbox.push_back((track, unit));
                }
                Ok(None) => {
                    info!("{} 📄 MediaSource 到达末尾，等待命令（Seek/Stop）...", log_ctx());
                    self.eos = true;
                    self.shared
                        .eos_generation
                        .store(self.generation + 1, Ordering::Release);
                    if let Some(event) = self.buffer_manager.finish() {
                        self.notifier.notify(event);
                    }
                    return;
                }
                Err(e) => {
                    error!("{} ❌ 读取访问单元失败: {}", log_ctx(), e);
                    self.fail(e);
                    return;
                }
            }
        }

        let Some((track, unit)) = self.outbox.pop_front() else {
            return;
        };
        if !self.queues.contains_key(&track) {
            return;
        }

        self.update_buffering();
        let Some((tx, _)) = self.queues.get(&track) else {
            return;
        };
        let tagged = TaggedUnit {
            generation: self.generation,
            unit,
        };
        match tx.send_timeout(tagged, SEND_WAIT) {
            Ok(()) => {
                self.unit_count += 1;
                if self.unit_count <= 5 || self.unit_count % 100 == 0 {
                    debug!("{} 📦 发送 {} 访问单元 #{}", log_ctx(), track.as_str(), self.unit_count);
                }
            }
            Err(SendTimeoutError::Timeout(tagged)) => {
                // 队列已满：放回，先处理命令
                self.outbox.push_front((track, tagged.unit));
            }
            Err(SendTimeoutError::Disconnected(_)) => {
                warn!("{} ⚠️ {} 队列接收端已关闭", log_ctx(), track.as_str());
                self.pumping = false;
            }
        }
    }

    /// 以选中的音视频轨道中最少的队列长度作为缓冲水位
    fn update_buffering(&mut self) {
        let level = [TrackType::Video, TrackType::Audio]
            .iter()
            .filter(|track| self.shared.selected_index(**track).is_some())
            .filter_map(|track| self.queues.get(track).map(|(tx, _)| tx.len()))
            .min();
        if let Some(level) = level {
            for event in self.buffer_manager.update(level) {
                self.notifier.notify(event);
            }
        }
    }
}
