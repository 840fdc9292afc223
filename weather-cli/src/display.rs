use std::fmt::{self, Write};

use weather_core::{FormattedWeather, WeatherOutcome};

/// Plain-text rendering of a tool result for the terminal.
pub fn render(outcome: &WeatherOutcome) -> String {
    match outcome {
        WeatherOutcome::Error(err) => format!("Error: {}\n", err.error),
        WeatherOutcome::Weather(report) => {
            let mut out = String::new();
            match write_report(&mut out, report) {
                Ok(()) => out,
                Err(fmt::Error) => format!("Error: failed to format report for {}\n", report.location),
            }
        }
    }
}

fn write_report(out: &mut impl Write, report: &FormattedWeather) -> fmt::Result {
    let cw = &report.current_weather;

    writeln!(
        out,
        "{} ({:.4}, {:.4})",
        report.location, report.coordinates.latitude, report.coordinates.longitude
    )?;
    writeln!(
        out,
        "  Now: {}, {} (feels like {})",
        cw.description, cw.temperature_celsius, cw.feels_like_celsius
    )?;
    writeln!(
        out,
        "  Humidity {}  Pressure {}  Clouds {}  UV {}",
        cw.humidity, cw.pressure, cw.clouds, cw.uv_index
    )?;
    writeln!(
        out,
        "  Wind {} from {}  Visibility {}",
        cw.wind_speed_mps, cw.wind_direction, cw.visibility
    )?;

    if let Some(today) = &report.today_forecast {
        writeln!(out, "\nToday: {}", today.summary)?;
        writeln!(
            out,
            "  {} .. {}  (morning {}, evening {})  precipitation {}",
            today.min_temp, today.max_temp, today.morning_temp, today.evening_temp,
            today.precipitation_probability
        )?;
        writeln!(out, "  Sunrise {}  Sunset {}", today.sunrise, today.sunset)?;
    }

    if let Some(days) = &report.forecast_3_day {
        writeln!(out, "\nNext days:")?;
        for day in days {
            writeln!(
                out,
                "  {}: {}, {} .. {}, precipitation {}",
                day.date, day.weather, day.min_temp, day.max_temp, day.precipitation_probability
            )?;
        }
    }

    if let Some(alerts) = &report.alerts {
        writeln!(out, "\nAlerts:")?;
        for alert in alerts {
            writeln!(out, "  {} ({} - {})", alert.event, alert.start, alert.end)?;
            writeln!(out, "    {}", alert.description)?;
        }
    }

    Ok(())
}
