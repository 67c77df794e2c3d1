use rstest::*;

#[fixture]
pub fn setup_log() {
    let _ = stderrlog::new()
        .verbosity(4)
        .timestamp(stderrlog::Timestamp::Millisecond)
        .init();
}
