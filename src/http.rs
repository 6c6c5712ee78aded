//! HTTP boundary: a sequential accept loop in front of the store and the
//! enrichment orchestrator.
//!
//! Every handler consumes a flat key-value map merged from the URL query
//! string and an urlencoded request body, so callers may send parameters
//! either way. Handlers return `Result<serde_json::Value, ApiError>`; the
//! loop turns that into a JSON response with the taxonomy's status code.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use tiny_http::{Header, Method, Response, Server};

use crate::{
    ApiError, Enricher, NewPerson, PersonDb, PersonFilter, PersonPatch, ServiceConfig,
    build_query, merge_params,
};

/// Everything a request needs, built once in `main` and passed by
/// reference into each handler.
pub(crate) struct ServiceState {
    pub(crate) db: PersonDb,
    pub(crate) enricher: Enricher,
    pub(crate) max_limit: Option<u64>,
}

pub(crate) fn run_http_service(
    config: &ServiceConfig,
    state: &ServiceState,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.bind, config.port);
    let server = Server::http(&addr)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, format!("server: {e}")))?;
    eprintln!("[http] listening on http://{addr}");

    for mut request in server.incoming_requests() {
        let url = request.url().to_string();
        let (path, query) = match url.split_once('?') {
            Some((path, query)) => (path.to_string(), query.to_string()),
            None => (url, String::new()),
        };

        let mut body = String::new();
        let _ = request.as_reader().read_to_string(&mut body);
        let params = merge_params(&query, &body);

        let response = match (request.method(), path.as_str()) {
            (Method::Get, "/") => Response::from_string("nothing to see here\n"),
            (Method::Post, "/people") => respond(handle_create(state, &params), "POST /people"),
            (Method::Get, "/people") => respond(handle_query(state, &params), "GET /people"),
            (Method::Post, "/people/edit") => {
                respond(handle_update(state, &params), "POST /people/edit")
            }
            (Method::Delete, "/people") => {
                respond(handle_delete(state, &params), "DELETE /people")
            }
            _ => json_response(404, &serde_json::json!({ "error": "not found" })),
        };
        let _ = request.respond(response);
    }
    Ok(())
}

fn respond(
    outcome: Result<serde_json::Value, ApiError>,
    route: &str,
) -> Response<Cursor<Vec<u8>>> {
    match outcome {
        Ok(value) => json_response(200, &value),
        Err(err) => {
            eprintln!("[http] {route}: {err}");
            json_response(err.status(), &serde_json::json!({ "error": err.to_string() }))
        }
    }
}

fn json_response(status: u16, value: &serde_json::Value) -> Response<Cursor<Vec<u8>>> {
    let mut response = Response::from_string(value.to_string()).with_status_code(status);
    if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]) {
        response = response.with_header(header);
    }
    response
}

// ── Parameter helpers ────────────────────────────────────────────────────

fn param<'a>(params: &'a HashMap<String, String>, key: &str) -> &'a str {
    params.get(key).map(String::as_str).unwrap_or("")
}

fn parse_id(params: &HashMap<String, String>) -> Result<i64, ApiError> {
    let raw = param(params, "id");
    if raw.is_empty() {
        return Err(ApiError::validation("id is required"));
    }
    raw.parse::<i64>()
        .map_err(|_| ApiError::validation(format!("invalid id: {raw}")))
}

fn patch_from_params(params: &HashMap<String, String>) -> Result<PersonPatch, ApiError> {
    let field = |key: &str| params.get(key).filter(|value| !value.is_empty()).cloned();
    let age = match field("age") {
        Some(raw) => {
            let age = raw
                .parse::<i64>()
                .map_err(|_| ApiError::validation(format!("invalid age: {raw}")))?;
            if age < 0 {
                return Err(ApiError::validation("age must be non-negative"));
            }
            Some(age)
        }
        None => None,
    };
    Ok(PersonPatch {
        name: field("name"),
        surname: field("surname"),
        patronymic: field("patronymic"),
        gender: field("gender"),
        age,
        nationality: field("nationality"),
    })
}

// ── Handlers ─────────────────────────────────────────────────────────────

pub(crate) fn handle_create(
    state: &ServiceState,
    params: &HashMap<String, String>,
) -> Result<serde_json::Value, ApiError> {
    let name = param(params, "name");
    let surname = param(params, "surname");
    if name.is_empty() || surname.is_empty() {
        return Err(ApiError::validation("name and surname are required"));
    }

    // Enrich first; nothing touches the store until all three lookups land.
    let profile = state.enricher.enrich(name)?;
    let person = state.db.insert(&NewPerson {
        name: name.to_string(),
        surname: surname.to_string(),
        patronymic: param(params, "patronymic").to_string(),
        profile,
    })?;
    eprintln!(
        "[http] created person {} ({} {})",
        person.id, person.name, person.surname
    );
    Ok(serde_json::json!({ "message": "person added", "person": person }))
}

pub(crate) fn handle_query(
    state: &ServiceState,
    params: &HashMap<String, String>,
) -> Result<serde_json::Value, ApiError> {
    let filter = PersonFilter::from_params(params);
    let spec = build_query(
        &filter,
        param(params, "limit"),
        param(params, "page"),
        state.max_limit,
    )?;
    let people = state.db.find(&spec)?;
    Ok(serde_json::json!(people))
}

pub(crate) fn handle_update(
    state: &ServiceState,
    params: &HashMap<String, String>,
) -> Result<serde_json::Value, ApiError> {
    let id = parse_id(params)?;
    let patch = patch_from_params(params)?;
    if patch.is_empty() {
        return Err(ApiError::validation("you must specify at least one parameter"));
    }

    // Read-modify-write; concurrent patches resolve as last-write-wins.
    let mut person = state.db.person_by_id(id)?;
    patch.apply(&mut person);
    state.db.save(&person)?;
    Ok(serde_json::json!({ "message": "person updated", "person": person }))
}

pub(crate) fn handle_delete(
    state: &ServiceState,
    params: &HashMap<String, String>,
) -> Result<serde_json::Value, ApiError> {
    let id = parse_id(params)?;
    state.db.delete_by_id(id)?;
    eprintln!("[http] deleted person {id}");
    Ok(serde_json::json!({ "message": "person deleted" }))
}

// ── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::mock::{classifier_config, spawn_classifiers};
    use crate::EnrichedProfile;
    use std::path::PathBuf;

    fn temp_db_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("namesake_test");
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(format!("test_http_{}_{name}.sqlite", std::process::id()))
    }

    fn state_with_mock(
        name: &str,
        age: (u16, &str),
        gender: (u16, &str),
        nationality: (u16, &str),
    ) -> (ServiceState, PathBuf) {
        let base = spawn_classifiers(age, gender, nationality);
        let config = classifier_config(&base);
        let path = temp_db_path(name);
        let _ = std::fs::remove_file(&path);
        let state = ServiceState {
            db: PersonDb::open_or_create(&path).unwrap(),
            enricher: Enricher::new(&config),
            max_limit: config.max_limit,
        };
        (state, path)
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn seed_person(state: &ServiceState, name: &str, surname: &str, gender: &str) -> i64 {
        state
            .db
            .insert(&NewPerson {
                name: name.to_string(),
                surname: surname.to_string(),
                patronymic: String::new(),
                profile: EnrichedProfile {
                    age: 30,
                    gender: gender.to_string(),
                    nationality: "US".to_string(),
                },
            })
            .unwrap()
            .id
    }

    #[test]
    fn test_create_persists_enriched_person() {
        let (state, path) = state_with_mock(
            "create",
            (200, r#"{"age": 34}"#),
            (200, r#"{"gender": "female"}"#),
            (200, r#"{"country": [{"country_id": "US"}, {"country_id": "GB"}]}"#),
        );

        let value =
            handle_create(&state, &params(&[("name", "Ann"), ("surname", "Lee")])).unwrap();
        let person = &value["person"];
        assert_eq!(person["name"], "Ann");
        assert_eq!(person["surname"], "Lee");
        assert_eq!(person["patronymic"], "");
        assert_eq!(person["age"], 34);
        assert_eq!(person["gender"], "female");
        assert_eq!(person["nationality"], "US");

        let id = person["id"].as_i64().unwrap();
        let stored = state.db.person_by_id(id).unwrap();
        assert_eq!(stored.age, 34);
        assert_eq!(stored.nationality, "US");

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_create_requires_name_and_surname() {
        let (state, path) = state_with_mock(
            "create_missing",
            (200, r#"{"age": 34}"#),
            (200, r#"{"gender": "female"}"#),
            (200, r#"{"country": []}"#),
        );

        let err = handle_create(&state, &params(&[("name", "Ann")])).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        let err = handle_create(&state, &params(&[("surname", "Lee")])).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(state.db.count(), 0);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_create_persists_nothing_when_enrichment_fails() {
        let (state, path) = state_with_mock(
            "create_upstream",
            (200, r#"{"age": 34}"#),
            (503, "unavailable"),
            (200, r#"{"country": []}"#),
        );

        let request = params(&[("name", "Ann"), ("surname", "Lee")]);
        let err = handle_create(&state, &request).unwrap_err();
        assert!(matches!(err, ApiError::Upstream { service: "gender", .. }));
        assert_eq!(state.db.count(), 0);

        // Retrying the same input still leaves no partial state behind.
        let _ = handle_create(&state, &request);
        assert_eq!(state.db.count(), 0);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_query_filters_and_paginates() {
        let (state, path) = state_with_mock(
            "query",
            (200, r#"{"age": 34}"#),
            (200, r#"{"gender": "female"}"#),
            (200, r#"{"country": []}"#),
        );
        for i in 0..5 {
            seed_person(&state, &format!("F{i}"), "Lee", "female");
        }
        seed_person(&state, "Bob", "Gray", "male");

        let value = handle_query(
            &state,
            &params(&[("gender", "female"), ("limit", "3"), ("page", "1")]),
        )
        .unwrap();
        let people = value.as_array().unwrap();
        assert_eq!(people.len(), 3);
        assert!(people.iter().all(|p| p["gender"] == "female"));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_query_rejects_empty_filter_set() {
        let (state, path) = state_with_mock(
            "query_empty",
            (200, r#"{"age": 34}"#),
            (200, r#"{"gender": "female"}"#),
            (200, r#"{"country": []}"#),
        );

        let err = handle_query(&state, &params(&[("limit", "3")])).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_update_applies_sparse_patch() {
        let (state, path) = state_with_mock(
            "update",
            (200, r#"{"age": 34}"#),
            (200, r#"{"gender": "female"}"#),
            (200, r#"{"country": []}"#),
        );
        let id = seed_person(&state, "Ann", "Lee", "female");
        let id_string = id.to_string();

        let request = params(&[("id", id_string.as_str()), ("gender", "male")]);
        handle_update(&state, &request).unwrap();
        let person = state.db.person_by_id(id).unwrap();
        assert_eq!(person.gender, "male");
        assert_eq!(person.name, "Ann");
        assert_eq!(person.age, 30);

        // Same patch again converges to the same record.
        handle_update(&state, &request).unwrap();
        assert_eq!(state.db.person_by_id(id).unwrap(), person);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_update_requires_id_and_some_field() {
        let (state, path) = state_with_mock(
            "update_missing",
            (200, r#"{"age": 34}"#),
            (200, r#"{"gender": "female"}"#),
            (200, r#"{"country": []}"#),
        );
        let id = seed_person(&state, "Ann", "Lee", "female");
        let id_string = id.to_string();

        let err = handle_update(&state, &params(&[("gender", "male")])).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let err = handle_update(&state, &params(&[("id", id_string.as_str())])).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        // Empty values count as absent, so they cannot blank a field.
        let err = handle_update(
            &state,
            &params(&[("id", id_string.as_str()), ("gender", "")]),
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(state.db.person_by_id(id).unwrap().gender, "female");

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_update_rejects_bad_age() {
        let (state, path) = state_with_mock(
            "update_age",
            (200, r#"{"age": 34}"#),
            (200, r#"{"gender": "female"}"#),
            (200, r#"{"country": []}"#),
        );
        let id = seed_person(&state, "Ann", "Lee", "female");
        let id_string = id.to_string();

        let err = handle_update(
            &state,
            &params(&[("id", id_string.as_str()), ("age", "old")]),
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let err = handle_update(
            &state,
            &params(&[("id", id_string.as_str()), ("age", "-1")]),
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_update_missing_person_is_store_error() {
        let (state, path) = state_with_mock(
            "update_ghost",
            (200, r#"{"age": 34}"#),
            (200, r#"{"gender": "female"}"#),
            (200, r#"{"country": []}"#),
        );

        let err =
            handle_update(&state, &params(&[("id", "999"), ("gender", "male")])).unwrap_err();
        assert!(matches!(err, ApiError::Store(_)));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_delete_requires_id() {
        let (state, path) = state_with_mock(
            "delete_missing_id",
            (200, r#"{"age": 34}"#),
            (200, r#"{"gender": "female"}"#),
            (200, r#"{"country": []}"#),
        );
        seed_person(&state, "Ann", "Lee", "female");

        let err = handle_delete(&state, &params(&[])).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        let err = handle_delete(&state, &params(&[("id", "abc")])).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        // The store was never touched
        assert_eq!(state.db.count(), 1);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_delete_removes_person() {
        let (state, path) = state_with_mock(
            "delete",
            (200, r#"{"age": 34}"#),
            (200, r#"{"gender": "female"}"#),
            (200, r#"{"country": []}"#),
        );
        let id = seed_person(&state, "Ann", "Lee", "female");
        let id_string = id.to_string();

        handle_delete(&state, &params(&[("id", id_string.as_str())])).unwrap();
        assert_eq!(state.db.count(), 0);

        let err = handle_delete(&state, &params(&[("id", id_string.as_str())])).unwrap_err();
        assert!(matches!(err, ApiError::Store(_)));

        std::fs::remove_file(&path).ok();
    }
}
