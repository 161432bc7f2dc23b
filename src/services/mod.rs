//! Business logic services

pub mod completion;
pub mod geo;
pub mod layout;
pub mod orchestrator;
pub mod ordering;
pub mod planner;
pub mod prompts;
pub mod travel_time;
