pub mod answers;
pub mod payload;
pub mod profile;
pub mod recommendation;
pub mod risk;
