use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{Value, json};
use tokio::sync::watch;

use crate::{
    document::{ArrayOp, DocumentStore, USERS_COLLECTION},
    error::DocumentError,
    firebase::FirebaseSettings,
    model::UserProfile,
    provider::rapidapi::truncate_body,
};

/// User documents over the Firestore REST API.
#[derive(Debug)]
pub struct FirestoreStore {
    http: Client,
    settings: FirebaseSettings,
    token: Option<watch::Receiver<Option<String>>>,
}

impl FirestoreStore {
    pub fn new(settings: FirebaseSettings) -> Self {
        Self { http: Client::new(), settings, token: None }
    }

    /// Authorise requests with the signed-in user's id token.
    pub fn with_id_token(mut self, token: watch::Receiver<Option<String>>) -> Self {
        self.token = Some(token);
        self
    }

    fn database_path(&self) -> String {
        format!("projects/{}/databases/(default)/documents", self.settings.project_id)
    }

    fn document_name(&self, uid: &str) -> String {
        format!("{}/{USERS_COLLECTION}/{uid}", self.database_path())
    }

    fn document_url(&self, uid: &str) -> String {
        format!("{}/{}", self.settings.firestore_url, self.document_name(uid))
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        let token = self.token.as_ref().and_then(|rx| rx.borrow().clone());
        let req = req.query(&[("key", self.settings.api_key.as_str())]);
        match token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

async fn check(res: reqwest::Response) -> Result<String, DocumentError> {
    let status = res.status();
    let body = res.text().await?;
    if !status.is_success() {
        return Err(DocumentError::Status { status: status.as_u16(), body: truncate_body(&body) });
    }
    Ok(body)
}

fn encode_profile(profile: &UserProfile) -> Value {
    let cities: Vec<Value> =
        profile.saved_cities.iter().map(|c| json!({ "stringValue": c })).collect();

    json!({
        "fields": {
            "uid": { "stringValue": profile.uid },
            "displayName": { "stringValue": profile.display_name },
            "email": { "stringValue": profile.email },
            "savedCities": { "arrayValue": { "values": cities } },
        }
    })
}

fn decode_profile(uid: &str, doc: &Value) -> Result<UserProfile, DocumentError> {
    let fields = doc
        .get("fields")
        .and_then(Value::as_object)
        .ok_or_else(|| DocumentError::Malformed(format!("document for '{uid}' has no fields")))?;

    let string_field = |name: &str| -> String {
        fields
            .get(name)
            .and_then(|v| v.get("stringValue"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    // An empty array is sent as `"arrayValue": {}`.
    let saved_cities = match fields.get("savedCities") {
        None => Vec::new(),
        Some(v) => v
            .get("arrayValue")
            .ok_or_else(|| DocumentError::Malformed("savedCities is not an array".into()))?
            .get("values")
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(|v| v.get("stringValue").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
    };

    let stored_uid = string_field("uid");
    Ok(UserProfile {
        uid: if stored_uid.is_empty() { uid.to_string() } else { stored_uid },
        display_name: string_field("displayName"),
        email: string_field("email"),
        saved_cities,
    })
}

fn transform_for(document: String, op: &ArrayOp) -> Value {
    let (kind, city) = match op {
        ArrayOp::Union(city) => ("appendMissingElements", city),
        ArrayOp::Remove(city) => ("removeAllFromArray", city),
    };

    json!({
        "writes": [{
            "transform": {
                "document": document,
                "fieldTransforms": [{
                    "fieldPath": "savedCities",
                    kind: { "values": [{ "stringValue": city }] },
                }],
            },
            "currentDocument": { "exists": true },
        }]
    })
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>, DocumentError> {
        let res = self.authorize(self.http.get(self.document_url(uid))).send().await?;
        if res.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = check(res).await?;
        let doc: Value =
            serde_json::from_str(&body).map_err(|e| DocumentError::Malformed(e.to_string()))?;
        decode_profile(uid, &doc).map(Some)
    }

    async fn set_profile(&self, profile: &UserProfile) -> Result<(), DocumentError> {
        let res = self
            .authorize(self.http.patch(self.document_url(&profile.uid)))
            .json(&encode_profile(profile))
            .send()
            .await?;
        check(res).await?;
        tracing::debug!(uid = %profile.uid, "profile document written");
        Ok(())
    }

    async fn update_saved_cities(&self, uid: &str, op: ArrayOp) -> Result<(), DocumentError> {
        let url = format!("{}/{}:commit", self.settings.firestore_url, self.database_path());
        let body = transform_for(self.document_name(uid), &op);

        let res = self.authorize(self.http.post(url)).json(&body).send().await?;
        if res.status() == StatusCode::NOT_FOUND {
            return Err(DocumentError::NotFound(uid.to_string()));
        }
        check(res).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DOC_PATH: &str = "/projects/demo/databases/(default)/documents/Users/u1";
    const COMMIT_PATH: &str = "/projects/demo/databases/(default)/documents:commit";

    fn store(server: &MockServer) -> FirestoreStore {
        FirestoreStore::new(FirebaseSettings {
            firestore_url: server.uri(),
            ..FirebaseSettings::new("api-key", "demo")
        })
    }

    #[tokio::test]
    async fn reads_profile_document() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(DOC_PATH))
            .and(header("Authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "projects/demo/databases/(default)/documents/Users/u1",
                "fields": {
                    "uid": {"stringValue": "u1"},
                    "displayName": {"stringValue": "Ana"},
                    "email": {"stringValue": "ana@example.com"},
                    "savedCities": {"arrayValue": {"values": [{"stringValue": "Paris"}]}}
                }
            })))
            .mount(&server)
            .await;

        let (_tx, rx) = watch::channel(Some("tok".to_string()));
        let profile = store(&server).with_id_token(rx).get_profile("u1").await.unwrap().unwrap();

        assert_eq!(profile.display_name, "Ana");
        assert_eq!(profile.saved_cities, vec!["Paris"]);
    }

    #[tokio::test]
    async fn missing_document_is_none() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(DOC_PATH))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"code": 404, "status": "NOT_FOUND"}
            })))
            .mount(&server)
            .await;

        assert_eq!(store(&server).get_profile("u1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn union_uses_append_missing_elements() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(COMMIT_PATH))
            .and(body_partial_json(json!({
                "writes": [{
                    "transform": {
                        "document": "projects/demo/databases/(default)/documents/Users/u1",
                        "fieldTransforms": [{
                            "fieldPath": "savedCities",
                            "appendMissingElements": {"values": [{"stringValue": "Paris"}]}
                        }]
                    },
                    "currentDocument": {"exists": true}
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"writeResults": [{}]})))
            .expect(1)
            .mount(&server)
            .await;

        store(&server).update_saved_cities("u1", ArrayOp::Union("Paris".into())).await.unwrap();
    }

    #[tokio::test]
    async fn remove_uses_remove_all_from_array() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(COMMIT_PATH))
            .and(body_partial_json(json!({
                "writes": [{
                    "transform": {
                        "fieldTransforms": [{
                            "fieldPath": "savedCities",
                            "removeAllFromArray": {"values": [{"stringValue": "Rome"}]}
                        }]
                    },
                    "currentDocument": {"exists": true}
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"writeResults": [{}]})))
            .expect(1)
            .mount(&server)
            .await;

        store(&server).update_saved_cities("u1", ArrayOp::Remove("Rome".into())).await.unwrap();
    }

    #[tokio::test]
    async fn commit_on_missing_document_is_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(COMMIT_PATH))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"code": 404, "message": "No document to update", "status": "NOT_FOUND"}
            })))
            .mount(&server)
            .await;

        let err = store(&server)
            .update_saved_cities("u1", ArrayOp::Union("Paris".into()))
            .await
            .unwrap_err();

        match err {
            DocumentError::NotFound(uid) => assert_eq!(uid, "u1"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn set_profile_patches_document() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path(DOC_PATH))
            .and(body_partial_json(json!({
                "fields": {"displayName": {"stringValue": "Ana"}}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let profile = UserProfile::new("u1", "Ana", "ana@example.com");
        store(&server).set_profile(&profile).await.unwrap();
    }

    #[test]
    fn decodes_empty_array_value() {
        let doc = json!({"fields": {"savedCities": {"arrayValue": {}}}});
        let profile = decode_profile("u1", &doc).unwrap();
        assert_eq!(profile.uid, "u1");
        assert!(profile.saved_cities.is_empty());
    }

    #[test]
    fn encode_then_decode_keeps_cities() {
        let mut profile = UserProfile::new("u1", "Ana", "ana@example.com");
        profile.saved_cities = vec!["Paris".into(), "Niš".into()];
        assert_eq!(decode_profile("u1", &encode_profile(&profile)).unwrap(), profile);
    }
}
