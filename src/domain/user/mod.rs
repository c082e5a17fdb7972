pub mod model;

pub use model::{SubscriptionTier, User};
