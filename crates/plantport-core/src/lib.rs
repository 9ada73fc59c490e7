pub mod artifact;
pub mod backend;
pub mod error;
pub mod labels;
pub mod probability;
pub mod spec;
pub mod tensor;

pub use artifact::*;
pub use backend::*;
pub use error::*;
pub use labels::*;
pub use probability::*;
pub use spec::*;
pub use tensor::*;
