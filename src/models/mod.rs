pub mod submission;

pub use submission::{Inserted, NewSubmission, Submission, Track};
