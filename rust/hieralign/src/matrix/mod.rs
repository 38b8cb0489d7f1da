mod builder;
mod chunked;

pub use builder::DistanceMatrixBuilder;
pub use chunked::ChunkedSymmetricMatrix;
