//! Byte-range streaming helpers.
//!
//! A located segment is served as a plain HTTP byte range:
//!
//! - [`parse_range_header`] turns a `Range` header into an inclusive range
//! - [`ByteRange`] renders the matching `Content-Range` / `Content-Length`
//! - [`copy_range`] copies the range out of the file in chunks and stops
//!   early when its cancellation token fires

mod copy;
mod range;

pub use copy::copy_range;
pub use range::{determine_content_type, parse_range_header, ByteRange};
