/// Score for clearing a stage: remaining seconds, rounded up.
///
/// Any fraction of a second left counts as a full point; an expired or
/// negative clock scores 0.
pub fn final_score(time_remaining: f32) -> u32 {
    if !time_remaining.is_finite() || time_remaining <= 0.0 {
        return 0;
    }
    time_remaining.ceil() as u32
}
