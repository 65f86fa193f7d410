pub mod associator;
pub mod background;
pub mod candidate;
pub mod config;
pub mod error;
pub mod export;
pub mod frame;
pub mod pipeline;
pub mod point;
pub mod render;
pub mod segmenter;
pub mod smoother;
pub mod statistics;
pub mod track;

pub use associator::Associator;
pub use background::BackgroundModel;
pub use candidate::Candidate;
pub use config::{ScoreParams, SmoothingMethod, TrackerConfig};
pub use error::TrackError;
pub use export::ResultsTable;
pub use frame::Frame;
pub use pipeline::{FrameObserver, VideoInput, VideoPipeline};
pub use point::Point;
pub use segmenter::{ForegroundSegmenter, Mask};
pub use statistics::{ExperimentMeta, Statistics, StatisticsRecord};
pub use track::{Track, TrackSet};
