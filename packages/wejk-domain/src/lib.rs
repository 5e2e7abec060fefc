pub mod answer;
pub mod contract;
pub mod documents;
pub mod intent;
pub mod loop_control;
pub mod rate_limit;
