//! # Address Streams
//!
//! Synthesis of per-access address sequences over the composed iteration
//! space, and the statistical analyzers consumed by cache and performance
//! models.

pub mod stats;
pub mod synthesizer;

pub use stats::{
    match_streams, reuse_profile, stride_profile, MemberSpan, OverlapGroup, ReuseProfile,
    StrideProfile,
};
pub use synthesizer::{
    AccessPlan, AddressStream, AddressStreamSynthesizer, PlannedLevel, SynthesisConfig,
};
