pub mod activities;
pub mod ai;
pub mod ai_response;
pub mod children;
pub mod metrics;
pub mod photos;
pub mod submissions;
