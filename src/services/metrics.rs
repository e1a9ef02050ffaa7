use lazy_static::lazy_static;
use prometheus::{register_counter_vec, CounterVec};

lazy_static! {
    pub static ref SUBMISSIONS_COUNTER: CounterVec = register_counter_vec!(
        "hunt_photo_submissions_total",
        "Photo submissions by outcome",
        &["outcome"]
    ).unwrap();

    pub static ref TOKENS_AWARDED_COUNTER: CounterVec = register_counter_vec!(
        "hunt_tokens_awarded_total",
        "Tokens credited to children by activity category",
        &["category"]
    ).unwrap();

    pub static ref GENERATED_ACTIVITIES_COUNTER: CounterVec = register_counter_vec!(
        "hunt_generated_activities_total",
        "Activities created through the text model by category",
        &["category"]
    ).unwrap();

    pub static ref AI_CALLS_COUNTER: CounterVec = register_counter_vec!(
        "hunt_ai_calls_total",
        "Calls to the AI provider by kind (text, vision) and outcome",
        &["kind", "outcome"]
    ).unwrap();
}

pub fn record_submission(outcome: &str) {
    SUBMISSIONS_COUNTER.with_label_values(&[outcome]).inc();
}
