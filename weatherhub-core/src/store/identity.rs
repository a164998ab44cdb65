use crate::model::UserProfile;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityState {
    pub user: Option<UserProfile>,
}

impl IdentityState {
    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn uid(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.uid.as_str())
    }

    pub fn saved_cities(&self) -> &[String] {
        self.user.as_ref().map(|u| u.saved_cities.as_slice()).unwrap_or_default()
    }

    pub fn has_saved_city(&self, city: &str) -> bool {
        self.user.as_ref().is_some_and(|u| u.has_saved_city(city))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityAction {
    LoginUser(UserProfile),
    LogoutUser,
    SetSavedCities(Vec<String>),
}

pub fn reduce(state: &IdentityState, action: IdentityAction) -> IdentityState {
    match action {
        IdentityAction::LoginUser(mut profile) => {
            profile.saved_cities = dedup(profile.saved_cities);
            IdentityState { user: Some(profile) }
        }
        IdentityAction::LogoutUser => IdentityState { user: None },
        IdentityAction::SetSavedCities(cities) => match &state.user {
            Some(user) => IdentityState {
                user: Some(UserProfile { saved_cities: dedup(cities), ..user.clone() }),
            },
            None => state.clone(),
        },
    }
}

/// Saved cities are a set; keep the first occurrence of each name.
fn dedup(cities: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(cities.len());
    for city in cities {
        if !out.contains(&city) {
            out.push(city);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ana() -> UserProfile {
        UserProfile::new("u1", "Ana", "ana@example.com")
    }

    #[test]
    fn login_and_logout() {
        let state = reduce(&IdentityState::default(), IdentityAction::LoginUser(ana()));
        assert!(state.is_logged_in());
        assert_eq!(state.uid(), Some("u1"));

        let state = reduce(&state, IdentityAction::LogoutUser);
        assert!(!state.is_logged_in());
        assert!(state.saved_cities().is_empty());
    }

    #[test]
    fn saved_cities_are_deduplicated_in_order() {
        let state = reduce(&IdentityState::default(), IdentityAction::LoginUser(ana()));
        let state = reduce(
            &state,
            IdentityAction::SetSavedCities(vec!["Paris".into(), "Rome".into(), "Paris".into()]),
        );

        assert_eq!(state.saved_cities(), ["Paris".to_string(), "Rome".to_string()]);
        assert!(state.has_saved_city("Rome"));
    }

    #[test]
    fn saved_cities_ignored_when_signed_out() {
        let action = IdentityAction::SetSavedCities(vec!["Paris".into()]);
        let state = reduce(&IdentityState::default(), action);
        assert_eq!(state, IdentityState::default());
    }
}
