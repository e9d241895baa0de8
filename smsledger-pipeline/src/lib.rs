//! smsledger-pipeline: SMS classification, duplicate merging and source mapping

pub mod classifier;
pub mod config;
pub mod error;
pub mod mapping;
pub mod merge;
pub mod normalize;
pub mod pipeline;
pub mod rule_list;

pub use classifier::{classify, Classifier, Rejection};
pub use config::ClassifierConfig;
pub use error::PipelineError;
pub use mapping::{apply_mapping, remap, resolve};
pub use merge::{merge, merge_within, DEFAULT_MERGE_WINDOW_MINUTES};
pub use normalize::{normalize, NormalizedMessage};
pub use pipeline::{upserts, Pipeline, SyncBatch};
pub use rule_list::RuleList;
