//! End-to-end dashboard tests.
//!
//! The weather API is a wiremock server; accounts and profile documents use the
//! in-memory services.

use std::{sync::Arc, time::Duration};

use weatherhub_core::{
    Dashboard, FetchOutcome, QueryTemplate, Tab, UserProfile,
    auth::AuthService,
    memory::{InMemoryAuth, InMemoryDocumentStore},
    provider::{ApiCredentials, RapidApiProvider},
    view::{render_auth_modal, render_favorites, render_weather},
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    _server: MockServer,
    auth: Arc<InMemoryAuth>,
    docs: Arc<InMemoryDocumentStore>,
    app: Dashboard,
}

fn city_body(name: &str, country: &str, temp_c: f64) -> serde_json::Value {
    serde_json::json!({
        "location": {"name": name, "country": country, "localtime": "2024-01-05 14:30"},
        "current": {"temp_c": temp_c, "condition": {"text": "Partly cloudy"}},
        "forecast": {"forecastday": [
            {"date": "2024-01-05", "day": {"maxtemp_c": 20.0, "mintemp_c": 11.0}},
            {"date": "2024-01-06", "day": {"maxtemp_c": 19.0, "mintemp_c": 10.0}},
            {"date": "2024-01-07", "day": {"maxtemp_c": 18.0, "mintemp_c": 9.0}}
        ]}
    })
}

async fn harness() -> Harness {
    let server = MockServer::start().await;

    for (name, country, temp) in [("Paris", "France", 18.0), ("Berlin", "Germany", 7.5)] {
        Mock::given(method("GET"))
            .and(path("/forecast.json"))
            .and(query_param("q", name))
            .respond_with(ResponseTemplate::new(200).set_body_json(city_body(name, country, temp)))
            .mount(&server)
            .await;
    }

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": {"code": 1006, "message": "No matching location found."}
        })))
        .with_priority(10)
        .mount(&server)
        .await;

    let template = QueryTemplate {
        base_url: format!("{}/forecast.json", server.uri()),
        days: Some(3),
        credentials: ApiCredentials { key: "test-key".into(), host: "weather.test".into() },
    };

    let auth = Arc::new(InMemoryAuth::new());
    let docs = Arc::new(InMemoryDocumentStore::new());
    let provider = Arc::new(RapidApiProvider::new());
    let app = Dashboard::new(provider, template, auth.clone(), docs.clone(), "Paris");

    Harness { _server: server, auth, docs, app }
}

#[tokio::test]
async fn initial_load_shows_default_city() {
    let h = harness().await;
    assert_eq!(render_weather(&h.app.state(), Tab::Current), "Loading...");

    assert_eq!(h.app.load().await, FetchOutcome::Loaded);

    let state = h.app.state();
    let current = render_weather(&state, Tab::Current);
    assert!(current.starts_with("Paris, France\n"), "{current}");
    assert!(current.contains("Good afternoon"));
    assert!(current.contains("Temperature:   18 °C"));

    let forecast = render_weather(&state, Tab::Forecast);
    assert!(forecast.contains("Friday"));
    assert!(forecast.contains("Sunday"));
}

#[tokio::test]
async fn unknown_city_keeps_previous_document() {
    let h = harness().await;
    h.app.load().await;

    assert_eq!(h.app.search("Atlantis").await, FetchOutcome::NotFound);

    let state = h.app.state();
    assert_eq!(render_weather(&state, Tab::Current), "City not found.");
    assert_eq!(state.weather.document.location.name, "Paris");

    assert_eq!(h.app.search("Berlin").await, FetchOutcome::Loaded);
    assert!(render_weather(&h.app.state(), Tab::Current).starts_with("Berlin, Germany"));
}

#[tokio::test]
async fn sign_up_save_and_remove_city() {
    let h = harness().await;
    h.app.load().await;

    h.app.auth().toggle_modal();
    h.app.auth().sign_up("Ana", "ana@example.com", "secret1").await.unwrap();
    let state = h.app.settle_identity(true).await;

    assert!(render_auth_modal(&state.auth_ui).is_none());
    assert!(state.identity.saved_cities().is_empty());
    assert!(render_weather(&state, Tab::Current).starts_with("Paris, France  [not saved]"));

    let uid = h.auth.current_user().unwrap().uid;

    h.app.favorites().save_current_city().await;
    h.app.favorites().save_current_city().await;

    let state = h.app.state();
    assert_eq!(state.identity.saved_cities(), ["Paris".to_string()]);
    assert_eq!(h.docs.profile(&uid).await.unwrap().saved_cities, ["Paris".to_string()]);
    assert!(render_favorites(&state.identity).contains("  - Paris"));
    assert!(render_weather(&state, Tab::Current).starts_with("Paris, France  [saved]"));

    h.app.favorites().remove_current_city().await;

    assert!(h.app.state().identity.saved_cities().is_empty());
    assert!(h.docs.profile(&uid).await.unwrap().saved_cities.is_empty());
}

#[tokio::test]
async fn returning_user_gets_saved_cities_back() {
    let h = harness().await;
    h.app.load().await;

    h.app.auth().sign_up("Ana", "ana@example.com", "secret1").await.unwrap();
    h.app.settle_identity(true).await;
    h.app.search("Berlin").await;
    h.app.favorites().save_current_city().await;

    h.app.auth().sign_out().await.unwrap();
    let state = h.app.settle_identity(false).await;
    assert!(render_favorites(&state.identity).starts_with("Sign up to save"));

    h.app.auth().sign_in("ana@example.com", "secret1").await.unwrap();
    let state = h.app.settle_identity(true).await;

    assert_eq!(state.identity.saved_cities(), ["Berlin".to_string()]);
    assert_eq!(state.identity.user.unwrap().display_name, "Ana");
}

#[tokio::test]
async fn existing_profile_document_hydrates_on_sign_in() {
    let h = harness().await;

    h.app.auth().sign_up("Ana", "ana@example.com", "secret1").await.unwrap();
    h.app.settle_identity(true).await;
    let uid = h.auth.current_user().unwrap().uid;
    h.app.auth().sign_out().await.unwrap();
    h.app.settle_identity(false).await;

    let mut profile = UserProfile::new(uid.as_str(), "Ana", "ana@example.com");
    profile.saved_cities = vec!["Paris".into(), "Rome".into()];
    h.docs.insert(profile).await;

    h.app.auth().sign_in("ana@example.com", "secret1").await.unwrap();
    let state = h.app.settle_identity(true).await;

    assert_eq!(state.identity.saved_cities(), ["Paris".to_string(), "Rome".to_string()]);
}

#[tokio::test]
async fn wrong_password_shows_message_in_modal() {
    let h = harness().await;

    h.app.auth().sign_up("Ana", "ana@example.com", "secret1").await.unwrap();
    h.app.settle_identity(true).await;
    h.app.auth().sign_out().await.unwrap();
    h.app.settle_identity(false).await;

    h.app.auth().toggle_modal();
    h.app.auth().toggle_form();
    assert!(h.app.auth().sign_in("ana@example.com", "wrong-password").await.is_err());

    let state = h.app.state();
    assert!(!state.identity.is_logged_in());
    let modal = render_auth_modal(&state.auth_ui).unwrap();
    assert!(modal.contains("! Invalid login credentials."));
    assert!(modal.contains("Log In"));
}

#[tokio::test]
async fn saving_while_city_not_found_does_nothing() {
    let h = harness().await;
    h.app.load().await;

    h.app.auth().sign_up("Ana", "ana@example.com", "secret1").await.unwrap();
    h.app.settle_identity(true).await;
    let writes = h.docs.write_count();

    h.app.search("Atlantis").await;
    h.app.favorites().save_current_city().await;

    assert_eq!(h.docs.write_count(), writes);
    assert!(h.app.state().identity.saved_cities().is_empty());
}

#[tokio::test]
async fn account_without_display_name_signs_in() {
    let h = harness().await;

    h.auth.create_user("ana@example.com", "secret1").await.unwrap();
    h.app.auth().sign_out().await.unwrap();

    h.app.auth().toggle_modal();
    h.app.auth().toggle_form();
    h.app.auth().sign_in("ana@example.com", "secret1").await.unwrap();

    let state = h
        .app
        .settle_identity_within(true, Duration::from_secs(2))
        .await
        .expect("signed-in session reaches the store");

    assert!(render_auth_modal(&state.auth_ui).is_none());
    assert!(render_favorites(&state.identity).starts_with("Welcome, ana@example.com\n"));
}
