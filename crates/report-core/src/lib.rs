pub mod error;
pub mod node;
pub mod traits;
pub mod types;

pub use error::*;
pub use node::ReportNode;
pub use traits::*;
pub use types::*;
