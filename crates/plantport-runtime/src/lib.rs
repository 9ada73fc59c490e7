pub mod classifier;
pub mod engine;
pub mod postprocess;
pub mod preprocess;
pub mod request;
pub mod worker;
pub mod worker_model;

pub use classifier::*;
pub use engine::*;
pub use postprocess::*;
pub use preprocess::*;
pub use request::*;
pub use worker::*;
pub use worker_model::*;
