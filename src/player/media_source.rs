use crate::core::{AccessUnit, MediaFormat, MetaData, Result, TrackInfo, TrackType};

/// 媒体源抽象接口
///
/// 负责把容器 / 清单中的基本流拆分为访问单元交给解码线程。
/// 事件（准备完成、缓冲状态、错误等）通过构造时传入的 Notifier 上报。
///
/// `release` 之后实例不可再使用。
pub trait MediaSource: Send {
    /// 异步准备；完成后上报 SourcePrepared 或 SourcePrepareFailed
    fn prepare_async(&mut self) -> Result<()>;

    /// 开始（或恢复）读取
    fn start(&mut self) -> Result<()>;

    /// 暂停读取，已缓冲的数据保留
    fn stop(&mut self) -> Result<()>;

    /// 跳转到指定位置（微秒），之前缓冲的数据全部作废
    fn seek_to(&mut self, time_us: i64) -> Result<()>;

    fn release(&mut self);

    /// 当前选中轨道的格式
    fn format(&self, track: TrackType) -> Option<MediaFormat>;

    /// 取下一个访问单元（不阻塞）
    ///
    /// 暂无数据时返回 NO_DATA_AVAILABLE，读完返回 END_OF_STREAM，出错返回 ERROR。
    fn dequeue_access_unit(&self, track: TrackType) -> AccessUnit;

    fn track_info(&self) -> Vec<TrackInfo>;

    /// 选择或取消选择轨道（索引对应 track_info 的顺序）
    fn select_track(&mut self, index: usize, select: bool) -> Result<()>;

    fn selected_track_index(&self, track: TrackType) -> Option<usize>;

    fn duration_us(&self) -> Option<i64>;

    fn metadata(&self) -> MetaData;

    /// 是否为自适应码率流
    fn is_adaptive(&self) -> bool {
        false
    }

    /// 带宽估计（bps），自适应流据此切换码率
    fn set_bandwidth_estimate(&mut self, _bandwidth_bps: u64) {}

    /// 限制某类轨道可用的码率档位（索引对应 TrackInfo::representations）
    fn select_representations(&mut self, _track: TrackType, _indices: &[usize]) -> Result<()> {
        Ok(())
    }
}
