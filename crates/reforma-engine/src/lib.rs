//! Renovation estimate pipeline: listing lookup, room bucketing, per-room vision
//! classification and cost aggregation.

mod aggregator;
mod bucketer;
mod classifier;
mod config;
mod error;
mod fallback;
mod http;
mod imaging;
mod listing;
mod pipeline;
mod throttle;

pub use aggregator::{aggregate, RoomFindings};
pub use bucketer::RoomBuckets;
pub use classifier::{
    build_prompt, extract_reply_json, parse_verdict, OpenAiVisionClassifier, VisionClassifier,
};
pub use config::{normalize_api_base, PipelineConfig, DEFAULT_PROMPT_TEMPLATE};
pub use error::AnalysisError;
pub use fallback::{fallback_report, midpoint_estimate, FALLBACK_BANDS};
pub use imaging::{normalize_image, EncodedImage, HttpImageSource, ImageSource};
pub use listing::{property_id_from_input, ListingClient, ListingSource, ListingSummary};
pub use pipeline::{PropertyAnalysis, RenovationPipeline};
pub use throttle::{FixedDelayGate, NoThrottle, Throttle};
