//! Subscription entities.

pub mod model;

pub use model::{CreateSubscription, Subscription, SubscriptionStatus};
