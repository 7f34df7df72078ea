pub mod context;
pub mod extract;
pub mod processor;
pub mod recognition;
pub mod recommend;
pub mod report;
pub mod rules;
pub mod validate;

pub use context::*;
pub use processor::*;
pub use report::*;
