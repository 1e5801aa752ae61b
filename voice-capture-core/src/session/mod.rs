mod acquire;
pub mod manager;
mod pipeline;
