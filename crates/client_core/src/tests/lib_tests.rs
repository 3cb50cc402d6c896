use super::*;
use axum::{
    extract::State,
    http::{header, Method as HttpMethod, StatusCode as HttpStatus, Uri},
    response::{IntoResponse, Response as HttpResponse},
    Router,
};
use serde_json::{json, Value};
use shared::domain::{Coordinates, Mood};
use std::sync::Arc;
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct ServerState {
    seen: Arc<Mutex<Vec<String>>>,
    bodies: Arc<Mutex<Vec<Value>>>,
}

fn record_json(id: i64, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "coordinates": { "x": 4, "y": 12.5 },
        "creationDate": "2024-05-01T12:30:00",
        "realHero": true,
        "mood": "GLOOM",
        "impactSpeed": 300.0,
        "soundtrackName": "Imagine",
        "weaponType": "HAMMER"
    })
}

fn json_response(status: HttpStatus, body: String) -> HttpResponse {
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

fn query_param(uri: &Uri, key: &str) -> Option<String> {
    uri.query()?.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key).then(|| v.to_string())
    })
}

async fn handle_any(
    State(state): State<ServerState>,
    method: HttpMethod,
    uri: Uri,
    body: String,
) -> HttpResponse {
    let line = match uri.query() {
        Some(query) => format!("{method} {}?{query}", uri.path()),
        None => format!("{method} {}", uri.path()),
    };
    state.seen.lock().await.push(line);
    if !body.is_empty() {
        if let Ok(value) = serde_json::from_str::<Value>(&body) {
            state.bodies.lock().await.push(value);
        }
    }

    match (method.as_str(), uri.path()) {
        ("GET", "/api/human-beings") => {
            let number: u32 = query_param(&uri, "page")
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(0);
            let page = json!({
                "content": [record_json(1, "Neo")],
                "totalElements": 25,
                "totalPages": 3,
                "size": 10,
                "number": number
            });
            json_response(HttpStatus::OK, page.to_string())
        }
        ("GET", "/api/human-beings/group/soundtrack") => json_response(
            HttpStatus::OK,
            r#"{"Imagine":3,"Bohemian Rhapsody":1}"#.to_string(),
        ),
        ("GET", "/api/human-beings/7") => {
            json_response(HttpStatus::OK, record_json(7, "Trinity").to_string())
        }
        ("GET", "/api/human-beings/404") => json_response(
            HttpStatus::NOT_FOUND,
            json!({ "message": "HumanBeing with id 404 not found" }).to_string(),
        ),
        ("GET", "/api/human-beings/500") => {
            (HttpStatus::INTERNAL_SERVER_ERROR, "database is down").into_response()
        }
        ("GET", "/api/human-beings/503") => HttpStatus::SERVICE_UNAVAILABLE.into_response(),
        ("POST", "/api/human-beings") | ("PUT", _) => {
            let mut value: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
            if value.get("id").is_none() {
                value["id"] = json!(42);
            }
            value["creationDate"] = json!("2024-05-01T12:30:00");
            let status = if method == HttpMethod::POST {
                HttpStatus::CREATED
            } else {
                HttpStatus::OK
            };
            json_response(status, value.to_string())
        }
        ("DELETE", "/api/human-beings/weapon-type/HAMMER/all") => json_response(
            HttpStatus::BAD_REQUEST,
            json!({ "error": "nothing to delete" }).to_string(),
        ),
        ("DELETE", _) | ("PATCH", _) => HttpStatus::NO_CONTENT.into_response(),
        _ => HttpStatus::NOT_FOUND.into_response(),
    }
}

async fn spawn_backend() -> (HumanBeingClient, ServerState) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let state = ServerState::default();
    let app = Router::new().fallback(handle_any).with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    let client = HumanBeingClient::new(&format!("http://{addr}/api/")).expect("client");
    (client, state)
}

fn create_request() -> HumanBeingCreateRequest {
    HumanBeingCreateRequest {
        name: "Morpheus".into(),
        coordinates: Coordinates { x: 15, y: 277.0 },
        real_hero: false,
        has_toothpick: Some(true),
        car: None,
        mood: Some(Mood::Sadness),
        impact_speed: 664.0,
        soundtrack_name: "Clubbed to Death".into(),
        weapon_type: WeaponType::MachineGun,
    }
}

#[test]
fn rejects_unparseable_base_url() {
    let err = HumanBeingClient::new("not a url").expect_err("must fail");
    assert!(matches!(err, ClientError::InvalidBaseUrl { .. }));
}

#[test]
fn backend_message_prefers_structured_fields() {
    assert_eq!(
        backend_message(StatusCode::BAD_REQUEST, r#"{"message":"bad x","error":"Bad Request"}"#),
        "bad x"
    );
    assert_eq!(
        backend_message(StatusCode::BAD_REQUEST, r#"{"error":"Bad Request"}"#),
        "Bad Request"
    );
    assert_eq!(
        backend_message(StatusCode::CONFLICT, "  already exists \n"),
        "already exists"
    );
    assert_eq!(
        backend_message(StatusCode::BAD_GATEWAY, "<html>gateway</html>"),
        "Request failed with status code 502"
    );
    assert_eq!(
        backend_message(StatusCode::INTERNAL_SERVER_ERROR, ""),
        "Request failed with status code 500"
    );
}

#[tokio::test]
async fn list_sends_page_size_and_omits_blank_search() {
    let (client, state) = spawn_backend().await;

    let page = client
        .list(&ListQuery::new(2, 10, ""))
        .await
        .expect("list");
    assert_eq!(page.number, 2);
    assert_eq!(page.total_elements, 25);
    assert_eq!(page.content[0].name, "Neo");

    client
        .list(&ListQuery::new(0, 5, "Ne"))
        .await
        .expect("list with search");

    let seen = state.seen.lock().await.clone();
    assert_eq!(
        seen,
        [
            "GET /api/human-beings?page=2&size=10",
            "GET /api/human-beings?page=0&size=5&search=Ne",
        ]
    );
}

#[tokio::test]
async fn create_omits_backend_owned_fields_and_returns_populated_record() {
    let (client, state) = spawn_backend().await;

    let created = client.create(&create_request()).await.expect("create");
    assert_eq!(created.id, HumanBeingId(42));
    assert_eq!(created.creation_date, "2024-05-01T12:30:00");
    assert_eq!(created.to_create_request(), create_request());

    let bodies = state.bodies.lock().await.clone();
    assert!(bodies[0].get("id").is_none());
    assert!(bodies[0].get("creationDate").is_none());
    assert_eq!(bodies[0]["weaponType"], "MACHINE_GUN");
}

#[tokio::test]
async fn update_puts_full_record_with_id() {
    let (client, state) = spawn_backend().await;

    let request = HumanBeingUpdateRequest::new(HumanBeingId(7), create_request());
    let updated = client
        .update(HumanBeingId(7), &request)
        .await
        .expect("update");
    assert_eq!(updated.id, HumanBeingId(7));

    assert_eq!(state.seen.lock().await[0], "PUT /api/human-beings/7");
    assert_eq!(state.bodies.lock().await[0]["id"], 7);
}

#[tokio::test]
async fn get_surfaces_not_found_message() {
    let (client, _state) = spawn_backend().await;

    assert_eq!(
        client.get(HumanBeingId(7)).await.expect("get").name,
        "Trinity"
    );

    let err = client.get(HumanBeingId(404)).await.expect_err("must fail");
    assert!(err.is_not_found());
    assert_eq!(err.user_message(), "HumanBeing with id 404 not found");
}

#[tokio::test]
async fn failures_without_json_body_still_carry_a_message() {
    let (client, _state) = spawn_backend().await;

    let err = client.get(HumanBeingId(500)).await.expect_err("must fail");
    assert_eq!(err.to_string(), "database is down");

    let err = client.get(HumanBeingId(503)).await.expect_err("must fail");
    assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
    assert_eq!(err.to_string(), "Request failed with status code 503");
}

#[tokio::test]
async fn bulk_operations_hit_their_endpoints() {
    let (client, state) = spawn_backend().await;

    client
        .delete_one_by_weapon_type(WeaponType::Knife)
        .await
        .expect("delete one");
    client
        .update_all_moods_to_sadness()
        .await
        .expect("moods");
    client
        .assign_car_to_heroes_without_car()
        .await
        .expect("cars");
    client.delete(HumanBeingId(3)).await.expect("delete");

    let err = client
        .delete_all_by_weapon_type(WeaponType::Hammer)
        .await
        .expect_err("backend refuses");
    assert_eq!(err.user_message(), "nothing to delete");

    let groups = client.group_by_soundtrack().await.expect("groups");
    assert_eq!(
        operations::render_groups(&groups),
        "Imagine: 3 human beings\nBohemian Rhapsody: 1 human beings"
    );

    let seen = state.seen.lock().await.clone();
    assert_eq!(
        seen,
        [
            "DELETE /api/human-beings/weapon-type/KNIFE/one",
            "PATCH /api/human-beings/mood/sadness",
            "PATCH /api/human-beings/car/assign",
            "DELETE /api/human-beings/3",
            "DELETE /api/human-beings/weapon-type/HAMMER/all",
            "GET /api/human-beings/group/soundtrack",
        ]
    );
}
