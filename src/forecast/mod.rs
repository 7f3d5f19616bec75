pub mod features;

pub use features::{FeatureComposer, FeatureLayout, TemporalContext};
