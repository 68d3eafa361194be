pub mod bg_remove;
pub mod image_convert;
pub mod pdf_merge;
pub mod traits;
pub mod util;
pub mod video_transcode;

pub use bg_remove::BgRemoveProcessor;
pub use image_convert::ImageConvertProcessor;
pub use pdf_merge::PdfMergeProcessor;
pub use traits::{Processor, ProcessorDescriptor, ProcessorInput, ProgressSink};
pub use video_transcode::VideoTranscodeProcessor;
