pub mod activity;
pub mod child;
pub mod completion;
