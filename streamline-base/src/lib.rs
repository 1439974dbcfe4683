pub mod hashing;

mod resource_id;
pub use resource_id::ResourceId;

mod load_state;
pub use load_state::{LoadState, LoadStateCell};
