pub mod push;

pub use push::{DeliveryError, PushSender};
