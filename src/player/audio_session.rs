use crate::core::{log_ctx, Result};
use log::warn;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

/// 本地生成的会话 ID 起点
const FALLBACK_SESSION_BASE: i32 = 0x4000_0000;

/// 平台音频会话分配
pub trait AudioSessionProvider: Send + Sync {
    fn generate_session_id(&self) -> Result<i32>;
}

/// 音频会话 ID 分配
///
/// 优先向平台申请；平台不可用或返回无效 ID 时使用本地递增生成器。
pub struct AudioSessionManager {
    provider: Option<Arc<dyn AudioSessionProvider>>,
    next_fallback: AtomicI32,
}

impl AudioSessionManager {
    pub fn new(provider: Option<Arc<dyn AudioSessionProvider>>) -> Self {
        Self {
            provider,
            next_fallback: AtomicI32::new(FALLBACK_SESSION_BASE),
        }
    }

    pub fn allocate(&self) -> i32 {
        if let Some(ref provider) = self.provider {
            match provider.generate_session_id() {
                Ok(id) if id > 0 => return id,
                Ok(id) => warn!("{} ⚠️ 平台返回无效的音频会话 ID: {}", log_ctx(), id),
                Err(e) => warn!("{} ⚠️ 申请音频会话失败: {}，使用本地 ID", log_ctx(), e),
            }
        }
        self.next_fallback.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for AudioSessionManager {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PlayerError;
    use std::collections::HashSet;
    use std::thread;

    struct FixedProvider(Result<i32>);

    impl AudioSessionProvider for FixedProvider {
        fn generate_session_id(&self) -> Result<i32> {
            match self.0 {
                Ok(id) => Ok(id),
                Err(_) => Err(PlayerError::Unsupported("no audio service".into())),
            }
        }
    }

    #[test]
    fn test_platform_id_used_when_available() {
        let manager = AudioSessionManager::new(Some(Arc::new(FixedProvider(Ok(42)))));
        assert_eq!(manager.allocate(), 42);
    }

    #[test]
    fn test_fallback_when_platform_fails() {
        let failing = AudioSessionManager::new(Some(Arc::new(FixedProvider(Err(PlayerError::Cancelled)))));
        let a = failing.allocate();
        let b = failing.allocate();
        assert!(a >= FALLBACK_SESSION_BASE);
        assert_ne!(a, b);

        let invalid = AudioSessionManager::new(Some(Arc::new(FixedProvider(Ok(0)))));
        assert!(invalid.allocate() >= FALLBACK_SESSION_BASE);
    }

    #[test]
    fn test_fallback_ids_unique_across_threads() {
        let manager = Arc::new(AudioSessionManager::default());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let manager = manager.clone();
                thread::spawn(move || (0..100).map(|_| manager.allocate()).collect::<Vec<_>>())
            })
            .collect();
        let mut ids = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(ids.insert(id));
            }
        }
        assert_eq!(ids.len(), 400);
    }
}
