/// Auth modal: `closed -> sign-up form <-> login form -> closed`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthUiState {
    pub open_auth_modal: bool,
    /// Login form when `true`, sign-up form otherwise.
    pub show_login: bool,
    pub error: Option<String>,
    /// Bumped on every new message so an old clear timer cannot hide a newer one.
    pub error_generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthUiAction {
    ToggleModal,
    CloseModal,
    ToggleForm,
    ShowError { message: String },
    ClearError { generation: u64 },
}

pub fn reduce(state: &AuthUiState, action: AuthUiAction) -> AuthUiState {
    match action {
        AuthUiAction::ToggleModal if state.open_auth_modal => close(state),
        AuthUiAction::ToggleModal => AuthUiState {
            open_auth_modal: true,
            show_login: false,
            error: None,
            ..state.clone()
        },
        AuthUiAction::CloseModal => close(state),
        AuthUiAction::ToggleForm if state.open_auth_modal => {
            AuthUiState { show_login: !state.show_login, ..state.clone() }
        }
        AuthUiAction::ToggleForm => state.clone(),
        AuthUiAction::ShowError { message } => AuthUiState {
            error: Some(message),
            error_generation: state.error_generation + 1,
            ..state.clone()
        },
        AuthUiAction::ClearError { generation } if generation == state.error_generation => {
            AuthUiState { error: None, ..state.clone() }
        }
        AuthUiAction::ClearError { .. } => state.clone(),
    }
}

fn close(state: &AuthUiState) -> AuthUiState {
    AuthUiState { open_auth_modal: false, show_login: false, error: None, ..state.clone() }
}
