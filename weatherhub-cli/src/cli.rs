use std::{sync::Arc, time::Duration};

use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Password, Select, Text};
use weatherhub_core::{
    Config, Dashboard, FetchOutcome, Store, Tab, WeatherFetcher,
    provider::RapidApiProvider,
    store::{AppState, WeatherState},
    view::{render_auth_modal, render_favorites, render_weather},
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherhub", version, about = "Weather dashboard with saved cities")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the weather API key and account settings.
    Configure,

    /// Show the weather for a city once and exit.
    Show {
        /// City name; defaults to the configured default city.
        city: Option<String>,

        /// Show the multi-day forecast instead of current conditions.
        #[arg(long)]
        forecast: bool,
    },

    /// Interactive dashboard with accounts and saved cities.
    Dashboard,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city, forecast } => show(city, forecast).await,
            Command::Dashboard => dashboard().await,
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut cfg = Config::load()?;

    let key = Password::new("RapidAPI key:").without_confirmation().prompt()?;
    cfg.set_rapidapi_key(key.trim().to_string());

    let host = Text::new("RapidAPI host:").with_default(&cfg.weather.rapidapi_host).prompt()?;
    cfg.weather.rapidapi_host = host.trim().to_string();

    let city = Text::new("Default city:").with_default(&cfg.weather.default_city).prompt()?;
    cfg.weather.default_city = city.trim().to_string();

    let api_key = Text::new("Firebase web API key (leave empty to skip accounts):").prompt()?;
    if !api_key.trim().is_empty() {
        let project_id = Text::new("Firebase project id:").prompt()?;
        cfg.set_firebase_project(api_key.trim().to_string(), project_id.trim().to_string());
    }

    cfg.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(city: Option<String>, forecast: bool) -> anyhow::Result<()> {
    let cfg = Config::load_with_env()?;
    let template = cfg.query_template()?;
    let city = city.unwrap_or_else(|| cfg.weather.default_city.clone());

    let store = Store::new(AppState {
        weather: WeatherState::with_search_term(&city),
        ..AppState::default()
    });
    let fetcher = WeatherFetcher::new(Arc::new(RapidApiProvider::new()), template, store.clone());

    let tab = if forecast { Tab::Forecast } else { Tab::Current };
    match fetcher.refresh().await {
        FetchOutcome::NotFound => anyhow::bail!("City not found: {city}"),
        _ => println!("{}", render_weather(&store.state(), tab)),
    }

    Ok(())
}

const SEARCH: &str = "Search city";
const TOGGLE_TAB: &str = "Toggle current / forecast";
const OPEN_SAVED: &str = "Open saved city";
const SAVE: &str = "Save this city";
const REMOVE: &str = "Remove this city";
const SIGN_UP: &str = "Sign up";
const LOG_IN: &str = "Log in";
const LOG_OUT: &str = "Log out";
const QUIT: &str = "Quit";

/// How long the menu waits for a sign-in or sign-out to show up locally.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(10);

async fn dashboard() -> anyhow::Result<()> {
    let cfg = Config::load_with_env()?;
    let app = Dashboard::from_config(&cfg).context("Cannot start the dashboard")?;
    let mut tab = Tab::Current;

    app.load().await;

    loop {
        let state = app.state();
        print_state(&state, tab);

        let choice = Select::new("What next?", menu(&state)).prompt()?;
        match choice {
            SEARCH => {
                let city = Text::new("City:").prompt()?;
                app.search(&city).await;
            }
            TOGGLE_TAB => tab = tab.toggled(),
            OPEN_SAVED => {
                let cities = state.identity.saved_cities().to_vec();
                let city = Select::new("Saved cities:", cities).prompt()?;
                app.search(&city).await;
            }
            SAVE => app.favorites().save_current_city().await,
            REMOVE => app.favorites().remove_current_city().await,
            SIGN_UP => {
                open_form(&app, false);
                let name = Text::new("Display name:").prompt()?;
                let email = Text::new("Email:").prompt()?;
                let password = Password::new("Password:").without_confirmation().prompt()?;
                if app.auth().sign_up(&name, &email, &password).await.is_ok() {
                    settle(&app, true).await;
                }
            }
            LOG_IN => {
                open_form(&app, true);
                let email = Text::new("Email:").prompt()?;
                let password = Password::new("Password:").without_confirmation().prompt()?;
                if app.auth().sign_in(&email, &password).await.is_ok() {
                    settle(&app, true).await;
                }
            }
            LOG_OUT => {
                if app.auth().sign_out().await.is_ok() {
                    settle(&app, false).await;
                }
            }
            _ => break,
        }
    }

    Ok(())
}

async fn settle(app: &Dashboard, signed_in: bool) {
    if app.settle_identity_within(signed_in, SETTLE_TIMEOUT).await.is_none() {
        eprintln!("Account state is taking longer than expected; the menu may be out of date.");
    }
}

/// Open the auth modal on the requested form, whatever its current state.
fn open_form(app: &Dashboard, login: bool) {
    if !app.state().auth_ui.open_auth_modal {
        app.auth().toggle_modal();
    }
    if app.state().auth_ui.show_login != login {
        app.auth().toggle_form();
    }
}

fn menu(state: &AppState) -> Vec<&'static str> {
    let mut items = vec![SEARCH, TOGGLE_TAB];

    if state.identity.is_logged_in() {
        if !state.identity.saved_cities().is_empty() {
            items.push(OPEN_SAVED);
        }
        if let Some(city) = state.weather.displayed_city() {
            items.push(if state.identity.has_saved_city(city) { REMOVE } else { SAVE });
        }
        items.push(LOG_OUT);
    } else {
        items.extend([SIGN_UP, LOG_IN]);
    }

    items.push(QUIT);
    items
}

fn print_state(state: &AppState, tab: Tab) {
    println!();
    println!("{}", render_weather(state, tab));
    println!("{}", render_favorites(&state.identity));
    if let Some(modal) = render_auth_modal(&state.auth_ui) {
        println!("{modal}");
    }
}
