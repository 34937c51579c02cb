//! The eight IPID selection strategies.

pub mod global;
pub mod perbucket;
pub mod perbucket_shuffle;
pub mod perconn;
pub mod perdest;
pub mod prng_pure;
pub mod prng_queue;
pub mod prng_shuffle;

pub use global::Global;
pub use perbucket::{PerBucketL, PerBucketM};
pub use perbucket_shuffle::PerBucketShuffle;
pub use perconn::PerConnection;
pub use perdest::PerDest;
pub use prng_pure::PrngPure;
pub use prng_queue::PrngQueue;
pub use prng_shuffle::PrngShuffle;
