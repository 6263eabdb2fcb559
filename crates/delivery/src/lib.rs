//! Delivery simulation — fan-out send, stochastic outcomes, per-recipient
//! logging and campaign counter reconciliation.

pub mod outcome;
pub mod simulator;
pub mod throttle;

pub use outcome::{OutcomeSource, RandomOutcomes, SeededOutcomes};
pub use simulator::{DeliverySimulator, DeliveryTally};
pub use throttle::SendThrottle;
