mod builder;

pub use builder::{
    AlignmentBuilder,
    SampleRow,
    flatten_lists,
};
