//! Lookup tables keyed by provider condition codes ("rain", "clear-day", ...).

/// Phrase used when the condition code has no dedicated description.
pub const DEFAULT_DESCRIPTION: &str = "типичная погода, небо и облака";

const DESCRIPTIONS: &[(&str, &str)] = &[
    ("clear", "солнечная погода, ясное небо, без осадков"),
    ("cloudy", "пасмурная погода, облачное небо"),
    ("rain", "дождливая погода, лужи и капли дождя"),
    ("snow", "зимняя погода, снег и сугробы"),
    ("storm", "гроза, молнии и тучи"),
    ("fog", "туманная погода, ограниченная видимость"),
];

const DEFAULT_ICON: &str = "❓";

const ICONS: &[(&str, &str)] = &[
    ("partly-cloudy-day", "🌤️"),
    ("partly-cloudy-night", "🌙"),
    ("clear-day", "☀️"),
    ("clear-night", "🌌"),
    ("rain", "🌧️"),
    ("snow", "❄️"),
    ("thunderstorm", "⛈️"),
    ("cloudy", "☁️"),
    ("fog", "🌫️"),
    ("wind", "🌬️"),
];

/// Image prompt for a condition code. Always non-empty.
pub fn describe(condition_code: &str) -> &'static str {
    DESCRIPTIONS
        .iter()
        .find(|(code, _)| *code == condition_code)
        .map(|(_, phrase)| *phrase)
        .unwrap_or(DEFAULT_DESCRIPTION)
}

/// Emoji for a condition code, tolerant of case and spaces ("Clear Day").
pub fn icon(condition_code: &str) -> &'static str {
    let key = condition_code.to_lowercase().replace(' ', "-");
    ICONS
        .iter()
        .find(|(code, _)| *code == key)
        .map(|(_, icon)| *icon)
        .unwrap_or(DEFAULT_ICON)
}

/// Fill percentage of the min..max temperature bar, marking the rounded
/// daily average.
pub fn temperature_bar_pct(temp_max: f64, temp_min: f64) -> f64 {
    let span = temp_max - temp_min;
    if !span.is_finite() || span <= 0.0 {
        return 0.0;
    }
    let avg = ((temp_max + temp_min) / 2.0).round();
    ((avg - temp_min) / span * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_known_codes() {
        assert_eq!(describe("rain"), "дождливая погода, лужи и капли дождя");
        assert_eq!(describe("fog"), "туманная погода, ограниченная видимость");
    }

    #[test]
    fn describe_unknown_code_uses_default() {
        assert_eq!(describe("partly-cloudy-day"), DEFAULT_DESCRIPTION);
        assert_eq!(describe(""), DEFAULT_DESCRIPTION);
        assert!(!describe("anything").is_empty());
    }

    #[test]
    fn icon_normalizes_code() {
        assert_eq!(icon("clear-day"), "☀️");
        assert_eq!(icon("Partly Cloudy Night"), "🌙");
        assert_eq!(icon("volcano"), "❓");
    }

    #[test]
    fn bar_marks_rounded_average() {
        // avg = round(16.0) = 16 → (16 - 11) / 10
        assert!((temperature_bar_pct(21.0, 11.0) - 50.0).abs() < 1e-9);
        // avg = round(12.5) = 13 → (13 - 10) / 5
        assert!((temperature_bar_pct(15.0, 10.0) - 60.0).abs() < 1e-9);
    }

    #[test]
    fn bar_handles_degenerate_span() {
        assert_eq!(temperature_bar_pct(5.0, 5.0), 0.0);
        assert_eq!(temperature_bar_pct(3.0, 5.0), 0.0);
        assert_eq!(temperature_bar_pct(f64::NAN, 5.0), 0.0);
    }
}
