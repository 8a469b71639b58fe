pub mod handlers;
pub mod jd_parser;
pub mod resume_parser;

pub use jd_parser::parse_job_description;
pub use resume_parser::{ResumeParser, TextResumeParser};
