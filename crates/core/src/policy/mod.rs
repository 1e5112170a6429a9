pub mod allocator;
pub mod bands;
