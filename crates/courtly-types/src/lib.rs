pub mod models;

pub use models::{Auth, Channel, Message, Recommendation, Stats};
