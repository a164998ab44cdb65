//! Plain-text renderings of the dashboard state.

use crate::{
    format::{day_of_week, greeting, user_friendly_time},
    store::{AppState, AuthUiState, IdentityState},
};

/// Forecast tab shows at most this many days.
pub const FORECAST_DAYS_SHOWN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Current,
    Forecast,
}

impl Tab {
    pub fn toggled(self) -> Self {
        match self {
            Tab::Current => Tab::Forecast,
            Tab::Forecast => Tab::Current,
        }
    }
}

pub fn render_weather(state: &AppState, tab: Tab) -> String {
    let weather = &state.weather;
    if weather.not_found {
        return "City not found.".to_string();
    }
    if weather.is_loading() {
        return "Loading...".to_string();
    }

    let doc = &weather.document;
    let mut header = format!("{}, {}", doc.location.name, doc.location.country);
    if state.identity.is_logged_in() {
        let saved = state.identity.has_saved_city(&doc.location.name);
        header.push_str(if saved { "  [saved]" } else { "  [not saved]" });
    }

    let mut lines = vec![header];
    if let Some(local) = user_friendly_time(&doc.location.localtime) {
        lines.push(greeting(&local.time).to_string());
        lines.push(format!("{}  {}", local.date, local.time));
    }
    lines.push(String::new());

    match tab {
        Tab::Current => {
            let c = &doc.current;
            lines.extend([
                format!("Temperature:   {} °C", c.temp_c),
                format!("Wind:          {} kph", c.wind_kph),
                format!("Cloud:         {}", c.cloud),
                format!("Humidity:      {} %", c.humidity),
                format!("Pressure:      {} mb", c.pressure_mb),
                format!("Visibility:    {} km", c.vis_km),
                format!("Precipitation: {} mm", c.precip_mm),
                format!("Feels like:    {} °C", c.feelslike_c),
                c.condition.text.clone(),
            ]);
        }
        Tab::Forecast => {
            for day in doc.forecast.forecast_days.iter().take(FORECAST_DAYS_SHOWN) {
                let name = day_of_week(&day.date).unwrap_or_else(|| day.date.clone());
                lines.push(format!(
                    "{name:<10} {} °C / {} °C  {}",
                    day.day.maxtemp_c, day.day.mintemp_c, day.day.condition.text
                ));
            }
        }
    }

    lines.join("\n") + "\n"
}

/// Greeting and saved-city list for a signed-in user, or the sign-up invitation.
pub fn render_favorites(identity: &IdentityState) -> String {
    let Some(user) = &identity.user else {
        return "Sign up to save weather insights for your favorite cities.".to_string();
    };

    // Accounts created without a name fall back to their email.
    let name = if user.display_name.is_empty() { &user.email } else { &user.display_name };

    let mut lines = vec![format!("Welcome, {name}"), "Your cities".to_string()];
    lines.extend(user.saved_cities.iter().map(|city| format!("  - {city}")));
    lines.join("\n") + "\n"
}

/// `None` while the modal is closed.
pub fn render_auth_modal(ui: &AuthUiState) -> Option<String> {
    if !ui.open_auth_modal {
        return None;
    }

    let form = if ui.show_login {
        "Log In (Don't have an account? Sign Up)"
    } else {
        "Sign up (Already have an account? Log In)"
    };

    Some(match &ui.error {
        Some(error) => format!("! {error}\n{form}"),
        None => form.to_string(),
    })
}
