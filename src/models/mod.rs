pub mod catalog;
pub mod stream;

pub use catalog::{Episode, Season, Subject, SubjectType};
pub use stream::{CaptionTrack, Category, StreamFormat, StreamVariant};
