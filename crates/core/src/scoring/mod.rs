pub mod classifier;
pub mod risk_engine;
pub mod validator;

pub use classifier::classify;
pub use risk_engine::compute_risk;
pub use validator::{validate, ValidationError};
