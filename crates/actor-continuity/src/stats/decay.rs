//! Temporal decay and the combined continuity score.

/// `e^(−λΔt)`. Equals 1 at Δt = 0 and tends to 0 without reaching it.
pub fn temporal_decay(delta_t: f64, decay_rate: f64) -> f64 {
    (-decay_rate * delta_t).exp()
}

/// Time (seconds) for the decay factor to halve: `ln 2 / λ`.
///
/// Infinite when λ = 0.
pub fn half_life(decay_rate: f64) -> f64 {
    std::f64::consts::LN_2 / decay_rate
}

/// `decay(Δt) × e^(−distance)`, clamped to `[0, 1]`.
///
/// Negative Δt is treated as zero elapsed time.
pub fn continuity_score(distance: f64, delta_t: f64, decay_rate: f64) -> f64 {
    let decay = temporal_decay(delta_t.max(0.0), decay_rate);
    clamp_unit(decay * (-distance).exp())
}

/// Clamp into `[0, 1]`, mapping NaN to 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}
