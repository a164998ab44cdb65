use crate::model::{DEFAULT_CITY, WeatherDocument};

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherState {
    pub document: WeatherDocument,
    pub search_term: String,
    pub not_found: bool,
    /// Id of the newest fetch; responses tagged with any other id are stale.
    pub latest_request: u64,
}

impl Default for WeatherState {
    fn default() -> Self {
        Self::with_search_term(DEFAULT_CITY)
    }
}

impl WeatherState {
    pub fn with_search_term(term: impl Into<String>) -> Self {
        Self {
            document: WeatherDocument::default(),
            search_term: term.into(),
            not_found: false,
            latest_request: 0,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.document.is_placeholder() && !self.not_found
    }

    /// City currently on screen, if any. Nothing is on screen while "not found" shows.
    pub fn displayed_city(&self) -> Option<&str> {
        let name = self.document.location.name.as_str();
        (!name.is_empty() && !self.not_found).then_some(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WeatherAction {
    SetSearchTerm(String),
    FetchStarted { request_id: u64 },
    ReplaceDocument { request_id: u64, document: WeatherDocument },
    FetchFailed { request_id: u64 },
}

pub fn reduce(state: &WeatherState, action: WeatherAction) -> WeatherState {
    match action {
        WeatherAction::SetSearchTerm(term) => {
            let term = term.trim();
            if term.is_empty() {
                return state.clone();
            }
            WeatherState { search_term: term.to_string(), ..state.clone() }
        }
        WeatherAction::FetchStarted { request_id } => {
            WeatherState { latest_request: state.latest_request.max(request_id), ..state.clone() }
        }
        WeatherAction::ReplaceDocument { request_id, document } => {
            if request_id != state.latest_request {
                return state.clone();
            }
            WeatherState { document, not_found: false, ..state.clone() }
        }
        WeatherAction::FetchFailed { request_id } => {
            if request_id != state.latest_request {
                return state.clone();
            }
            WeatherState { not_found: true, ..state.clone() }
        }
    }
}
