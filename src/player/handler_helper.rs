use crate::core::{log_ctx, PlayerError, Result};
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use log::{debug, info};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// 等待回复时的检查间隔
const WAIT_TICK: Duration = Duration::from_millis(10);

/// 一次性回复通道
///
/// 处理方调用 `reply` 或 `fail` 回复；直接 drop 时等待方收到 Disconnected。
pub struct Reply<T> {
    tx: Sender<Result<T>>,
}

impl<T> Reply<T> {
    pub fn reply(self, value: T) {
        let _ = self.tx.send(Ok(value));
    }

    pub fn fail(self, error: PlayerError) {
        let _ = self.tx.send(Err(error));
    }
}

/// 同步调用桥：把消息发给处理线程并等待回复
///
/// 等待方每 10ms 检查一次代数，`release_all_locks` 递增代数后
/// 所有正在等待的调用都以 Cancelled 返回（用于 release 时解除阻塞）。
#[derive(Debug, Default)]
pub struct HandlerHelper {
    generation: AtomicU64,
    waiting: AtomicUsize,
}

impl HandlerHelper {
    pub fn new() -> Self {
        Self::default()
    }

    /// 发送消息并一直等待回复（直到被取消）
    pub fn call<M, T>(&self, target: &Sender<M>, make_message: impl FnOnce(Reply<T>) -> M) -> Result<T> {
        self.call_inner(target, make_message, None)
    }

    /// 发送消息并等待回复，超时返回 TimedOut
    pub fn call_timeout<M, T>(
        &self,
        target: &Sender<M>,
        timeout: Duration,
        make_message: impl FnOnce(Reply<T>) -> M,
    ) -> Result<T> {
        self.call_inner(target, make_message, Some(Instant::now() + timeout))
    }

    fn call_inner<M, T>(
        &self,
        target: &Sender<M>,
        make_message: impl FnOnce(Reply<T>) -> M,
        deadline: Option<Instant>,
    ) -> Result<T> {
        let generation = self.generation.load(Ordering::Acquire);
        let (tx, rx) = bounded::<Result<T>>(1);
        target
            .send(make_message(Reply { tx }))
            .map_err(|_| PlayerError::Disconnected)?;

        self.waiting.fetch_add(1, Ordering::AcqRel);
        let result = loop {
            match rx.recv_timeout(WAIT_TICK) {
                Ok(result) => break result,
                Err(RecvTimeoutError::Disconnected) => break Err(PlayerError::Disconnected),
                Err(RecvTimeoutError::Timeout) => {
                    if self.generation.load(Ordering::Acquire) != generation {
                        debug!("{} 🔓 同步调用被取消", log_ctx());
                        break Err(PlayerError::Cancelled);
                    }
                    if deadline.map_or(false, |d| Instant::now() >= d) {
                        break Err(PlayerError::IoError(std::io::Error::new(
                            std::io::ErrorKind::TimedOut,
                            "同步调用超时",
                        )));
                    }
                }
            }
        };
        self.waiting.fetch_sub(1, Ordering::AcqRel);
        result
    }

    /// 唤醒所有正在等待的调用
    pub fn release_all_locks(&self) {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        info!(
            "{} 🔓 释放所有同步等待（{} 个，代数 {}）",
            log_ctx(),
            self.waiting.load(Ordering::Acquire),
            generation
        );
    }

    /// 正在等待回复的调用数量
    pub fn waiting_count(&self) -> usize {
        self.waiting.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use std::sync::Arc;
    use std::thread;

    enum Request {
        Add(i32, i32, Reply<i32>),
        Ignore(Reply<i32>),
    }

    #[test]
    fn test_call_returns_handler_reply() {
        let (tx, rx) = unbounded::<Request>();
        let handler = thread::spawn(move || {
            while let Ok(request) = rx.recv() {
                match request {
                    Request::Add(a, b, reply) => reply.reply(a + b),
                    Request::Ignore(reply) => reply.fail(PlayerError::Other("busy".into())),
                }
            }
        });

        let helper = HandlerHelper::new();
        assert_eq!(helper.call(&tx, |reply| Request::Add(2, 3, reply)).unwrap(), 5);
        assert!(matches!(
            helper.call(&tx, Request::Ignore),
            Err(PlayerError::Other(_))
        ));
        drop(tx);
        handler.join().unwrap();
    }

    #[test]
    fn test_dropped_reply_is_disconnected() {
        let (tx, rx) = unbounded::<Request>();
        let handler = thread::spawn(move || {
            // 收到请求后直接丢弃
            let _ = rx.recv();
        });
        let helper = HandlerHelper::new();
        assert!(matches!(
            helper.call(&tx, |reply| Request::Add(1, 1, reply)),
            Err(PlayerError::Disconnected)
        ));
        handler.join().unwrap();
    }

    #[test]
    fn test_release_all_locks_wakes_waiters() {
        let (tx, rx) = unbounded::<Request>();
        let helper = Arc::new(HandlerHelper::new());

        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let helper = helper.clone();
                let tx = tx.clone();
                thread::spawn(move || helper.call(&tx, Request::Ignore))
            })
            .collect();

        // 等所有调用进入等待（处理方不回复，持有 rx 中的请求）
        let deadline = Instant::now() + Duration::from_secs(2);
        while helper.waiting_count() < 3 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(helper.waiting_count(), 3);

        helper.release_all_locks();
        for waiter in waiters {
            assert!(matches!(waiter.join().unwrap(), Err(PlayerError::Cancelled)));
        }
        assert_eq!(helper.waiting_count(), 0);

        // 之后的调用不受影响
        drop(rx);
        assert!(matches!(
            helper.call(&tx, Request::Ignore),
            Err(PlayerError::Disconnected)
        ));
    }

    #[test]
    fn test_call_timeout() {
        let (tx, _rx) = unbounded::<Request>();
        let helper = HandlerHelper::new();
        let result = helper.call_timeout(&tx, Duration::from_millis(30), Request::Ignore);
        match result {
            Err(e) => assert_eq!(e.code(), crate::core::error::MEDIA_ERROR_TIMED_OUT),
            Ok(_) => panic!("应当超时"),
        }
    }
}
