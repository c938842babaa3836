pub mod access;
pub mod expression;
pub mod mutate;
pub mod plan;
