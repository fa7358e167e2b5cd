use crate::core::{log_ctx, Notification, Notifier};
use log::{info, warn};
use parking_lot::Mutex;

/// 外部输出控制（HDCP / 模拟输出限制等）上报的事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputControlEvent {
    /// 一般信息（输出保护级别变化等）
    Info { code: i32 },
    /// 输出被禁止
    Blocked { reason: i32 },
}

/// 输出控制事件监听接口
pub trait OutputControllerUpdateListener: Send + Sync {
    fn on_output_control_update(&self, event: OutputControlEvent);
}

/// 把输出控制事件转换为播放器通知
pub struct OutputControlNotifier {
    notifier: Notifier,
    last_blocked: Mutex<Option<i32>>,
}

impl OutputControlNotifier {
    pub fn new(notifier: Notifier) -> Self {
        Self {
            notifier,
            last_blocked: Mutex::new(None),
        }
    }

    /// 最近一次输出被禁止的原因
    pub fn last_blocked_reason(&self) -> Option<i32> {
        *self.last_blocked.lock()
    }
}

impl OutputControllerUpdateListener for OutputControlNotifier {
    fn on_output_control_update(&self, event: OutputControlEvent) {
        match event {
            OutputControlEvent::Info { code } => {
                info!("{} 🔒 输出控制信息: {}", log_ctx(), code);
                self.notifier.notify(Notification::OutputControlInfo(code));
            }
            OutputControlEvent::Blocked { reason } => {
                warn!("{} 🚫 输出被禁止: {}", log_ctx(), reason);
                *self.last_blocked.lock() = Some(reason);
                self.notifier.notify(Notification::OutputBlocked(reason));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_events_mapped_to_notifications() {
        let (tx, rx) = unbounded();
        let listener = OutputControlNotifier::new(Notifier::new(tx));

        listener.on_output_control_update(OutputControlEvent::Info { code: 7 });
        listener.on_output_control_update(OutputControlEvent::Blocked { reason: 3 });

        let first = rx.try_recv().unwrap();
        assert_eq!(first, Notification::OutputControlInfo(7));
        assert_eq!(first.kind(), 40);
        let second = rx.try_recv().unwrap();
        assert_eq!(second, Notification::OutputBlocked(3));
        assert_eq!(second.kind(), 41);
        assert_eq!(listener.last_blocked_reason(), Some(3));
    }

    #[test]
    fn test_listener_usable_as_trait_object() {
        let listener: Box<dyn OutputControllerUpdateListener> =
            Box::new(OutputControlNotifier::new(Notifier::disabled()));
        listener.on_output_control_update(OutputControlEvent::Blocked { reason: 1 });
    }
}
