// Wire codecs shared by the model types

pub mod base64_payload;
pub mod duration;

pub use duration::{format_duration, parse_duration};
