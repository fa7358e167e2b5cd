use crate::core::types::TrackType;
use bytes::Bytes;
use crossbeam_channel::Sender;
use log::debug;

/// 通知通道上传递的事件（MediaSource / Clock / CodecWorker → 上层调度器）
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    SourcePrepared,
    SourcePrepareFailed(i32),
    BufferingStart,
    BufferingEnd,
    /// 缓冲进度（0-100）
    BufferingUpdate(u8),
    SubtitleChange,
    RepresentationChanged { track: TrackType, bandwidth: u64 },
    SourceError(i32),

    /// 播放位置（毫秒）
    CodecNotifyPosition(i64),
    CodecFlushCompleted(TrackType),
    CodecVideoRenderingStart,
    CodecVideoSeekCompleted,
    CodecAudioCompleted,
    CodecVideoCompleted,
    CodecSubtitleData { time_us: i64, duration_us: i64, data: Bytes },
    CodecVideoFormatChanged { width: u32, height: u32 },
    CodecError { track: TrackType, code: i32 },

    OutputControlInfo(i32),
    OutputBlocked(i32),
}

impl Notification {
    /// 事件类型编号
    pub fn kind(&self) -> i32 {
        match self {
            Notification::SourcePrepared => 1,
            Notification::SourcePrepareFailed(_) => 2,
            Notification::BufferingStart => 3,
            Notification::BufferingEnd => 4,
            Notification::BufferingUpdate(_) => 5,
            Notification::SubtitleChange => 6,
            Notification::RepresentationChanged { .. } => 7,
            Notification::SourceError(_) => 8,
            Notification::CodecNotifyPosition(_) => 20,
            Notification::CodecFlushCompleted(_) => 21,
            Notification::CodecVideoRenderingStart => 22,
            Notification::CodecVideoSeekCompleted => 23,
            Notification::CodecAudioCompleted => 24,
            Notification::CodecVideoCompleted => 25,
            Notification::CodecSubtitleData { .. } => 26,
            Notification::CodecVideoFormatChanged { .. } => 27,
            Notification::CodecError { .. } => 28,
            Notification::OutputControlInfo(_) => 40,
            Notification::OutputBlocked(_) => 41,
        }
    }
}

/// 通知发送端（fire-and-forget）
#[derive(Clone)]
pub struct Notifier {
    tx: Option<Sender<Notification>>,
}

impl Notifier {
    pub fn new(tx: Sender<Notification>) -> Self {
        Self { tx: Some(tx) }
    }

    /// 不发送任何事件的空通知器
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// 发送通知；接收端已关闭时静默丢弃
    pub fn notify(&self, notification: Notification) {
        if let Some(ref tx) = self.tx {
            if tx.send(notification).is_err() {
                debug!("通知接收端已关闭，丢弃事件");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_notifier_delivers_in_order() {
        let (tx, rx) = unbounded();
        let notifier = Notifier::new(tx);
        notifier.notify(Notification::BufferingStart);
        notifier.notify(Notification::BufferingUpdate(50));
        notifier.notify(Notification::BufferingEnd);

        let kinds: Vec<i32> = rx.try_iter().map(|n| n.kind()).collect();
        assert_eq!(kinds, vec![3, 5, 4]);
    }

    #[test]
    fn test_notifier_survives_closed_receiver() {
        let (tx, rx) = unbounded();
        drop(rx);
        Notifier::new(tx).notify(Notification::SourcePrepared);
        Notifier::disabled().notify(Notification::SourcePrepared);
    }
}
