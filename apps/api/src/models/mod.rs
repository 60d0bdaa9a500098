pub mod course;
pub mod insight;
pub mod interview;
pub mod resume;
pub mod user;
