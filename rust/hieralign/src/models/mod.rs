pub mod aligned;
pub mod feature;
pub mod parameters;

pub use aligned::{
    AlignedFeatureList,
    AlignedFeatureRow,
    Provenance,
};
pub use feature::{
    FeatureList,
    FeatureRow,
    PeakIdentity,
    Sample,
    SpectrumPoint,
};
pub use parameters::{
    AlignmentParameters,
    DistanceSentinels,
    Linkage,
    ValidationDistance,
};
