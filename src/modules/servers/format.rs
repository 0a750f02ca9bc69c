const UNITS: [(u64, &str, &str); 4] = [
    (86_400, "day", "days"),
    (3_600, "hour", "hrs"),
    (60, "minute", "mins"),
    (1, "second", "secs"),
];

pub const ZERO_DURATION: &str = "0 seconds";

/// Renders a connection time such as `2 days, 1 hour, 5 secs`, skipping
/// zero components.
pub fn format_duration(seconds: u64) -> String {
    let mut remaining = seconds;
    let mut parts = Vec::with_capacity(UNITS.len());

    for (size, singular, plural) in UNITS {
        let count = remaining / size;
        remaining %= size;

        match count {
            0 => {}
            1 => parts.push(format!("1 {}", singular)),
            n => parts.push(format!("{} {}", n, plural)),
        }
    }

    if parts.is_empty() {
        ZERO_DURATION.to_string()
    } else {
        parts.join(", ")
    }
}
