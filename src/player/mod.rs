// 播放器核心模块

pub mod audio_session;
pub mod codec_helper;
pub mod codec_thread;
pub mod codec_worker;
pub mod data_source;
pub mod handler_helper;
pub mod media_source;
pub mod output_control;
pub mod source_thread;

pub use audio_session::{AudioSessionManager, AudioSessionProvider};
pub use codec_helper::{CodecInfo, CodecRegistry, MediaCodecHelper};
pub use codec_thread::{BufferInfo, CodecThread, Frame};
pub use codec_worker::{CodecMessage, CodecWorker, Decoder, FrameRenderer, OutputStatus};
pub use data_source::{
    open_data_source, BufferedDataSource, DashBufferedDataSource, DataSource, DirectDataSource,
    RangeResponse, RangeTransport,
};
pub use handler_helper::{HandlerHelper, Reply};
pub use media_source::MediaSource;
pub use output_control::{OutputControlEvent, OutputControlNotifier, OutputControllerUpdateListener};
pub use source_thread::{BufferManager, Demuxer, ThreadedMediaSource};
