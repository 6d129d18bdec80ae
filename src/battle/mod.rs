pub mod commands;
pub mod conditions;
pub mod end_of_turn;
pub mod engine;
pub mod escape;
pub mod events;
pub mod legality;
pub mod order;
pub mod rng;
pub mod scheduler;
pub mod state;
pub mod stats;
pub mod targeting;

#[cfg(test)]
mod tests;
