//! Plain-text rendering of the weather screen.

use skyframe_core::ScreenState;
use skyframe_core::condition::{icon, temperature_bar_pct};
use skyframe_core::model::DailyForecast;

const BAR_WIDTH: usize = 20;

pub fn render(state: &ScreenState) {
    if let Some(error) = &state.error {
        println!("⚠️  {error}\n");
    }

    println!("🌤️  Weather now");
    match &state.current {
        Some(current) => {
            println!("📍 Place:      {}", current.place);
            println!("🌡️  Temp:       {}°C", current.temperature_c);
            println!("🧣 Feels like: {}°C", current.feels_like_c);
            println!("🌬️  Wind:       {} km/h", current.wind_speed);
            println!("💧 Humidity:   {}%", current.humidity_pct);
        }
        None => println!("No current weather data"),
    }

    println!("\n📅 5-day forecast");
    match state.forecast.as_deref() {
        None => println!("Forecast unavailable"),
        Some([]) => println!("No upcoming days in the forecast"),
        Some(days) => {
            for day in days {
                println!("{}", forecast_line(day));
            }
        }
    }
}

pub fn render_image_status(state: &ScreenState) {
    if let Some(error) = &state.error {
        println!("⚠️  {error}");
    } else if state.image.is_none() {
        println!("No image generated");
    }
}

fn forecast_line(day: &DailyForecast) -> String {
    format!(
        "{:<12} {}  {:>3}° {} {:>3}°",
        day.label,
        icon(&day.condition_code),
        day.temp_min_c.round(),
        bar(temperature_bar_pct(day.temp_max_c, day.temp_min_c)),
        day.temp_max_c.round(),
    )
}

fn bar(pct: f64) -> String {
    let filled = ((pct / 100.0) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!("[{}{}]", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_scales_to_width() {
        assert_eq!(bar(0.0), format!("[{}]", "░".repeat(BAR_WIDTH)));
        assert_eq!(bar(100.0), format!("[{}]", "█".repeat(BAR_WIDTH)));
        assert_eq!(bar(50.0).matches('█').count(), BAR_WIDTH / 2);
    }

    #[test]
    fn forecast_line_shows_label_icon_and_rounded_temps() {
        let day = DailyForecast {
            label: "Вторник".into(),
            temp_max_c: 21.4,
            temp_min_c: 10.6,
            condition_code: "rain".into(),
        };
        let line = forecast_line(&day);
        assert!(line.starts_with("Вторник"));
        assert!(line.contains("🌧️"));
        assert!(line.contains(" 11°"));
        assert!(line.contains(" 21°"));
    }
}
