use crate::core::{log_ctx, PlayerError, Result};
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::sync::Arc;

/// 安全解码器名称后缀
const SECURE_SUFFIX: &str = ".secure";

/// 平台解码器描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecInfo {
    pub name: String,
    pub mime_types: Vec<String>,
    pub is_encoder: bool,
    /// 支持安全（加密）输出路径
    pub secure: bool,
    pub hardware: bool,
}

impl CodecInfo {
    pub fn supports(&self, mime: &str) -> bool {
        self.mime_types.iter().any(|m| m.eq_ignore_ascii_case(mime))
    }
}

/// 平台解码器枚举
pub trait CodecRegistry: Send + Sync {
    fn codecs(&self) -> Result<Vec<CodecInfo>>;
}

/// 解码器选择
///
/// 首次查询时缓存平台解码器列表；硬件解码器优先。
/// 需要安全解码时只接受支持安全路径的解码器，并返回带 `.secure` 后缀的名称。
pub struct MediaCodecHelper {
    registry: Arc<dyn CodecRegistry>,
    cache: Mutex<Option<Arc<Vec<CodecInfo>>>>,
}

impl MediaCodecHelper {
    pub fn new(registry: Arc<dyn CodecRegistry>) -> Self {
        Self {
            registry,
            cache: Mutex::new(None),
        }
    }

    fn codecs(&self) -> Result<Arc<Vec<CodecInfo>>> {
        let mut cache = self.cache.lock();
        if let Some(ref codecs) = *cache {
            return Ok(codecs.clone());
        }
        let codecs = Arc::new(self.registry.codecs()?);
        debug!("{} 🔍 枚举到 {} 个编解码器", log_ctx(), codecs.len());
        *cache = Some(codecs.clone());
        Ok(codecs)
    }

    /// 按 MIME 查找解码器，返回可用于创建解码器的名称
    pub fn find_decoder(&self, mime: &str, secure: bool) -> Result<String> {
        let codecs = self.codecs()?;
        let best = codecs
            .iter()
            .filter(|c| !c.is_encoder && c.supports(mime) && (!secure || c.secure))
            .max_by_key(|c| c.hardware);

        match best {
            Some(codec) => {
                let name = if secure && !codec.name.ends_with(SECURE_SUFFIX) {
                    format!("{}{}", codec.name, SECURE_SUFFIX)
                } else {
                    codec.name.clone()
                };
                info!(
                    "{} 🎛 {} 选用解码器: {}{}",
                    log_ctx(),
                    mime,
                    name,
                    if codec.hardware { "（硬件）" } else { "" }
                );
                Ok(name)
            }
            None => {
                warn!("{} ⚠️ 没有可用的 {} 解码器（secure={}）", log_ctx(), mime, secure);
                Err(PlayerError::Unsupported(format!("没有可用的解码器: {}", mime)))
            }
        }
    }

    /// 清除缓存，下次查询重新枚举
    pub fn invalidate(&self) {
        self.cache.lock().take();
    }
}
