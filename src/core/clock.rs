use crate::core::config::ClockConfig;
use crate::core::event::{Notification, Notifier};
use crate::core::log_ctx;
use crossbeam_channel::{unbounded, RecvTimeoutError, Sender};
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// 时间源（微秒）
pub trait TimeSource: Send + Sync {
    fn now_us(&self) -> i64;
}

/// 单调系统时间源
pub struct SystemTimeSource {
    origin: Instant,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTimeSource {
    fn now_us(&self) -> i64 {
        self.origin.elapsed().as_micros() as i64
    }
}

/// 手动推进的时间源（测试、离线渲染）
#[derive(Default)]
pub struct ManualTime {
    now_us: AtomicI64,
}

impl ManualTime {
    pub fn new(now_us: i64) -> Self {
        Self {
            now_us: AtomicI64::new(now_us),
        }
    }

    pub fn set(&self, now_us: i64) {
        self.now_us.store(now_us, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_us: i64) {
        self.now_us.fetch_add(delta_us, Ordering::SeqCst);
    }
}

impl TimeSource for ManualTime {
    fn now_us(&self) -> i64 {
        self.now_us.load(Ordering::SeqCst)
    }
}

/// 时钟内部状态
///
/// 媒体时间 = (now - start_time_us) + (now - speed_anchor_us) * (speed - 1)
///
/// 变速只移动 speed_anchor_us，变速点之前累计的速率差由下一次查询时的
/// 漂移修正吸收（回退 / 超过阈值的前跳都会被折算进 start_time_us）。
#[derive(Debug, Clone)]
struct ClockState {
    start_time_us: i64,
    /// 暂停 / seek 时冻结的媒体时间
    start_time_offset_us: i64,
    running: bool,
    speed: f64,
    speed_anchor_us: i64,
    /// 上次报告的 (媒体时间, 墙钟时间)
    previous: Option<(i64, i64)>,
    seek_executed: bool,
    released: bool,
}

impl ClockState {
    fn new() -> Self {
        Self {
            start_time_us: 0,
            start_time_offset_us: 0,
            running: false,
            speed: 1.0,
            speed_anchor_us: 0,
            previous: None,
            seek_executed: false,
            released: false,
        }
    }

    fn raw_time_us(&self, now_us: i64) -> i64 {
        let elapsed = now_us - self.start_time_us;
        let speed_delta = ((now_us - self.speed_anchor_us) as f64 * (self.speed - 1.0)) as i64;
        elapsed + speed_delta
    }

    fn current_time_us(&mut self, now_us: i64, drift_threshold_us: i64) -> i64 {
        if !self.running {
            return self.start_time_offset_us;
        }

        let raw = self.raw_time_us(now_us);
        let reported = match self.previous {
            Some((previous_us, previous_wall_us)) if !self.seek_executed => {
                let expected =
                    previous_us + ((now_us - previous_wall_us) as f64 * self.speed) as i64;
                if raw < previous_us {
                    // 降速造成的回退：从上次报告值继续
                    let target = expected.max(previous_us);
                    self.start_time_us -= target - raw;
                    debug!("⏱️ 时钟回退 {}us，已修正到 {}us", previous_us - raw, target);
                    target
                } else if raw - expected > drift_threshold_us {
                    // 升速造成的前跳：平滑推进
                    self.start_time_us += raw - expected;
                    debug!("⏱️ 时钟前跳 {}us，已修正到 {}us", raw - expected, expected);
                    expected
                } else {
                    raw
                }
            }
            _ => raw,
        };

        self.seek_executed = false;
        self.previous = Some((reported, now_us));
        reported
    }
}

struct ClockShared {
    state: Mutex<ClockState>,
    time: Arc<dyn TimeSource>,
    config: ClockConfig,
    listener: Mutex<Notifier>,
}

impl ClockShared {
    fn current_time_us(&self) -> i64 {
        let now = self.time.now_us();
        self.state
            .lock()
            .current_time_us(now, self.config.drift_threshold_us)
    }
}

/// 位置通知线程命令
enum NotifierCommand {
    Resume,
    Pause,
    Shutdown,
}

/// 周期性位置通知线程（运行时约 25Hz）
struct PositionNotifier {
    command_tx: Sender<NotifierCommand>,
    handle: Option<JoinHandle<()>>,
}

impl PositionNotifier {
    fn spawn(shared: Arc<ClockShared>) -> Option<Self> {
        let (command_tx, command_rx) = unbounded::<NotifierCommand>();
        let interval = Duration::from_millis(shared.config.notify_interval_ms.max(1));

        let spawned = thread::Builder::new()
            .name("clock-notifier".to_string())
            .spawn(move || {
                debug!("{} ⏱️ 时钟通知线程启动", log_ctx());
                let mut active = false;
                loop {
                    let command = if active {
                        command_rx.recv_timeout(interval)
                    } else {
                        command_rx.recv().map_err(|_| RecvTimeoutError::Disconnected)
                    };
                    match command {
                        Ok(NotifierCommand::Resume) => active = true,
                        Ok(NotifierCommand::Pause) => active = false,
                        Ok(NotifierCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                        Err(RecvTimeoutError::Timeout) => {
                            let position_ms = shared.current_time_us() / 1000;
                            shared
                                .listener
                                .lock()
                                .notify(Notification::CodecNotifyPosition(position_ms));
                        }
                    }
                }
                debug!("{} 🛑 时钟通知线程退出", log_ctx());
            });

        match spawned {
            Ok(handle) => Some(Self {
                command_tx,
                handle: Some(handle),
            }),
            Err(e) => {
                error!("{} ❌ 创建时钟通知线程失败: {}", log_ctx(), e);
                None
            }
        }
    }

    fn send(&self, command: NotifierCommand) {
        let _ = self.command_tx.send(command);
    }

    fn shutdown(&mut self) {
        self.send(NotifierCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for PositionNotifier {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// 播放时钟 - 把墙钟时间换算成媒体时间
///
/// 支持开始 / 暂停 / seek / 变速。运行期间媒体时间对调用方单调不减，
/// 只有显式 seek 才会跳变。可跨线程克隆共享，所有状态在同一把锁内修改。
#[derive(Clone)]
pub struct Clock {
    shared: Arc<ClockShared>,
    notifier: Arc<Mutex<Option<PositionNotifier>>>,
}

impl Clock {
    pub fn new() -> Self {
        Self::with_time_source(ClockConfig::default(), Arc::new(SystemTimeSource::new()))
    }

    pub fn with_config(config: ClockConfig) -> Self {
        Self::with_time_source(config, Arc::new(SystemTimeSource::new()))
    }

    pub fn with_time_source(config: ClockConfig, time: Arc<dyn TimeSource>) -> Self {
        let shared = Arc::new(ClockShared {
            state: Mutex::new(ClockState::new()),
            time,
            config,
            listener: Mutex::new(Notifier::disabled()),
        });
        let notifier = PositionNotifier::spawn(shared.clone());
        Self {
            shared,
            notifier: Arc::new(Mutex::new(notifier)),
        }
    }

    /// 设置位置通知接收端
    pub fn set_listener(&self, listener: Notifier) {
        *self.shared.listener.lock() = listener;
    }

    /// 开始计时（已运行时无操作）
    pub fn start(&self) {
        {
            let mut state = self.shared.state.lock();
            if state.released {
                warn!("{} ⚠️ 时钟已释放，忽略 start()", log_ctx());
                return;
            }
            if state.running {
                return;
            }
            let now = self.shared.time.now_us();
            state.start_time_us = now - state.start_time_offset_us;
            state.speed_anchor_us = now;
            state.previous = Some((state.start_time_offset_us, now));
            state.running = true;
            info!("{} ▶️ 时钟开始: {}us", log_ctx(), state.start_time_offset_us);
        }
        self.send_to_notifier(NotifierCommand::Resume);
    }

    /// 暂停计时并冻结当前媒体时间（已暂停时无操作）
    pub fn pause(&self) {
        {
            let mut state = self.shared.state.lock();
            if !state.running {
                return;
            }
            let now = self.shared.time.now_us();
            let current = state.current_time_us(now, self.shared.config.drift_threshold_us);
            state.start_time_offset_us = current;
            state.running = false;
            info!("{} ⏸️ 时钟暂停: {}us", log_ctx(), current);
        }
        self.send_to_notifier(NotifierCommand::Pause);
    }

    /// 复位并永久释放通知线程，之后不能再 start
    pub fn stop(&self) {
        {
            let mut state = self.shared.state.lock();
            *state = ClockState::new();
            state.released = true;
        }
        if let Some(mut notifier) = self.notifier.lock().take() {
            notifier.shutdown();
        }
        info!("{} ⏹️ 时钟已停止", log_ctx());
    }

    /// 把媒体时间设置为 time_us
    pub fn set_seek_time_us(&self, time_us: i64) {
        let mut state = self.shared.state.lock();
        let now = self.shared.time.now_us();
        if state.running {
            state.start_time_us = now - time_us;
            state.speed_anchor_us = now;
        }
        state.start_time_offset_us = time_us;
        state.previous = Some((time_us, now));
        state.seek_executed = true;
        info!("{} 🎯 时钟 Seek 到: {}us", log_ctx(), time_us);
    }

    /// 设置播放速率
    ///
    /// 负数和非有限值被忽略；0 表示时间停止推进（时钟仍处于运行状态）；
    /// 超过 `max_speed` 的值被钳制。
    pub fn set_speed(&self, speed: f64) {
        if !speed.is_finite() || speed < 0.0 {
            warn!("{} ⚠️ 忽略无效播放速率: {}", log_ctx(), speed);
            return;
        }
        let speed = speed.min(self.shared.config.max_speed);

        let mut state = self.shared.state.lock();
        if state.running {
            let now = self.shared.time.now_us();
            let current = state.current_time_us(now, self.shared.config.drift_threshold_us);
            state.speed_anchor_us = now;
            state.previous = Some((current, now));
        }
        state.speed = speed;
        info!("{} ⏩ 播放速率: {}", log_ctx(), speed);
    }

    /// 当前媒体时间（微秒）
    pub fn current_time_us(&self) -> i64 {
        self.shared.current_time_us()
    }

    pub fn is_running(&self) -> bool {
        self.shared.state.lock().running
    }

    pub fn speed(&self) -> f64 {
        self.shared.state.lock().speed
    }

    fn send_to_notifier(&self, command: NotifierCommand) {
        if let Some(ref notifier) = *self.notifier.lock() {
            notifier.send(command);
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
