use super::{check_range, DataSource};
use crate::core::{log_ctx, PlayerError, Result};
use log::debug;
use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// 本地文件数据源
pub struct DirectDataSource {
    path: PathBuf,
    file: Option<File>,
    range_start: u64,
    range_length: Option<u64>,
    current_offset: u64,
}

impl DirectDataSource {
    /// 打开 [offset, offset + length) 区间；length 为 None 时到文件末尾
    pub fn open(path: &Path, offset: u64, length: Option<u64>) -> Result<Self> {
        let file = File::open(path)?;
        let range_length = match length {
            Some(length) => Some(length),
            None => Some(file.metadata()?.len().saturating_sub(offset)),
        };
        debug!(
            "{} 📁 DirectDataSource: {} 区间 [{}, +{:?})",
            log_ctx(),
            path.display(),
            offset,
            range_length
        );
        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            range_start: offset,
            range_length,
            current_offset: offset,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DataSource for DirectDataSource {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        check_range(offset, buf.len(), self.range_start, self.range_length)?;
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| PlayerError::SourceError("数据源已关闭".to_string()))?;

        file.seek(SeekFrom::Start(offset))?;
        let mut filled = 0;
        while filled < buf.len() {
            match file.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        if filled < buf.len() {
            return Err(PlayerError::ShortRead {
                expected: buf.len(),
                actual: filled,
            });
        }

        self.current_offset = offset + buf.len() as u64;
        Ok(())
    }

    fn length(&self) -> Option<u64> {
        self.range_length
    }

    fn current_offset(&self) -> u64 {
        self.current_offset
    }

    fn set_current_offset(&mut self, offset: u64) -> Result<()> {
        check_range(offset, 0, self.range_start, self.range_length)?;
        self.current_offset = offset;
        Ok(())
    }

    fn close(&mut self) {
        self.file.take();
    }
}
