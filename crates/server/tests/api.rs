use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use http_body_util::BodyExt;
use migration::MigratorTrait;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::Engine;
use server::{ServerState, router};

async fn app() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    router(ServerState::new(engine, db, None))
}

fn basic(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    auth: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    let body = match body {
        Some(body) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(&body).unwrap())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register(app: &Router, username: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({ "username": username, "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    basic(username, "secret123")
}

async fn create_category(app: &Router, auth: &str, name: &str, kind: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/categories",
        Some(auth),
        Some(json!({ "name": name, "kind": kind, "color": "#123abc" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["id"].as_str().unwrap().to_string()
}

async fn create_transaction(
    app: &Router,
    auth: &str,
    kind: &str,
    amount: i64,
    category_id: &str,
    occurred_at: &str,
) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/transactions",
        Some(auth),
        Some(json!({
            "kind": kind,
            "amount": amount,
            "categoryId": category_id,
            "occurredAt": occurred_at,
        })),
    )
    .await
}

#[tokio::test]
async fn requests_without_credentials_get_an_error_envelope() {
    let app = app().await;

    let (status, body) = send(&app, Method::GET, "/categories", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], json!(false));
    assert!(body["error"].is_string());
    assert!(body.get("data").is_none());

    register(&app, "alice").await;
    let wrong = basic("alice", "not-the-password");
    let (status, _) = send(&app, Method::GET, "/categories", Some(&wrong), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = app().await;
    register(&app, "alice").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({ "username": "alice", "password": "another1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn concurrent_registrations_conflict_instead_of_failing() {
    let app = app().await;
    let body = json!({ "username": "carol", "password": "secret123" });

    let (first, second) = tokio::join!(
        send(&app, Method::POST, "/auth/register", None, Some(body.clone())),
        send(&app, Method::POST, "/auth/register", None, Some(body.clone())),
    );
    let mut statuses = vec![first.0, second.0];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::CONFLICT]);

    let loser = if first.0 == StatusCode::CONFLICT { first.1 } else { second.1 };
    assert_eq!(loser["success"], json!(false));
    assert!(loser["error"].as_str().unwrap().contains("carol"));
}

#[tokio::test]
async fn dashboard_reports_the_month() {
    let app = app().await;
    let auth = register(&app, "alice").await;
    let salary = create_category(&app, &auth, "Salary", "income").await;
    let food = create_category(&app, &auth, "Food", "expense").await;

    let (status, _) =
        create_transaction(&app, &auth, "expense", 1_000, &food, "2024-03-05").await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) =
        create_transaction(&app, &auth, "income", 5_000, &salary, "2024-03-01T08:00:00Z").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app,
        Method::POST,
        "/budgets",
        Some(&auth),
        Some(json!({ "categoryId": food, "month": 3, "year": 2024, "amount": 2_000 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        Method::GET,
        "/dashboard?month=3&year=2024",
        Some(&auth),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], json!(true));

    let data = &body["data"];
    assert_eq!(
        data["summary"],
        json!({ "income": 5_000, "expense": 1_000, "balance": 4_000 })
    );
    let recent = data["recentTransactions"].as_array().unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0]["categoryName"], json!("Food"));
    assert_eq!(recent[0]["categoryColor"], json!("#123abc"));
    assert_eq!(recent[1]["categoryName"], json!("Salary"));
    assert_eq!(data["expenseByCategory"][0]["name"], json!("Food"));
    assert_eq!(data["expenseByCategory"][0]["percentage"], json!(100.0));

    let budget = &data["budgets"][0];
    assert!(budget["budgetId"].is_string());
    assert_eq!(budget["cap"], json!(2_000));
    assert_eq!(budget["spent"], json!(1_000));
    assert_eq!(budget["remaining"], json!(1_000));
    assert_eq!(budget["percentage"], json!(50.0));
}

#[tokio::test]
async fn validation_and_ownership_errors() {
    let app = app().await;
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;
    let salary = create_category(&app, &alice, "Salary", "income").await;
    let food = create_category(&app, &alice, "Food", "expense").await;

    // kind must match the category
    let (status, _) =
        create_transaction(&app, &alice, "expense", 1_000, &salary, "2024-03-05").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = create_transaction(&app, &alice, "expense", -5, &food, "2024-03-05").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) =
        create_transaction(&app, &alice, "expense", 1_000, &food, "yesterday").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) =
        create_transaction(&app, &alice, "expense", 1_000, &food, "2024-03-05").await;
    assert_eq!(status, StatusCode::CREATED);
    let tx_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/transactions/{tx_id}"),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::GET,
        "/transactions/not-a-uuid",
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::GET,
        "/dashboard?month=13&year=2024",
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn category_in_use_cannot_be_deleted() {
    let app = app().await;
    let auth = register(&app, "alice").await;
    let food = create_category(&app, &auth, "Food", "expense").await;
    let (_, body) = create_transaction(&app, &auth, "expense", 1_000, &food, "2024-03-05").await;
    let tx_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/categories/{food}"),
        Some(&auth),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], json!(false));

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/transactions/{tx_id}"),
        Some(&auth),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/categories/{food}"),
        Some(&auth),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn transaction_update_replaces_the_record() {
    let app = app().await;
    let auth = register(&app, "alice").await;
    let food = create_category(&app, &auth, "Food", "expense").await;
    let rent = create_category(&app, &auth, "Rent", "expense").await;
    let (_, body) = create_transaction(&app, &auth, "expense", 1_000, &food, "2024-03-05").await;
    let tx_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/transactions/{tx_id}"),
        Some(&auth),
        Some(json!({
            "kind": "expense",
            "amount": 70_000,
            "categoryId": rent,
            "occurredAt": "2024-03-01T00:00:00Z",
            "description": "March rent",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (_, body) = send(
        &app,
        Method::GET,
        "/transactions?kind=expense&limit=10",
        Some(&auth),
        None,
    )
    .await;
    let listed = body["data"].as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["amount"], json!(70_000));
    assert_eq!(listed[0]["categoryId"], json!(rent));
    assert_eq!(listed[0]["description"], json!("March rent"));
}

#[tokio::test]
async fn trends_and_category_report() {
    let app = app().await;
    let auth = register(&app, "alice").await;
    let food = create_category(&app, &auth, "Food", "expense").await;
    let rent = create_category(&app, &auth, "Rent", "expense").await;
    create_transaction(&app, &auth, "expense", 1_000, &food, "2024-01-10").await;
    create_transaction(&app, &auth, "expense", 500, &food, "2024-06-02").await;
    create_transaction(&app, &auth, "expense", 9_000, &rent, "2024-06-01").await;

    let (status, body) = send(
        &app,
        Method::GET,
        "/reports/trends?anchorMonth=6&anchorYear=2024",
        Some(&auth),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let points = body["data"].as_array().unwrap();
    assert_eq!(points.len(), 6);
    assert_eq!(points[0]["month"], json!(1));
    assert_eq!(points[0]["expense"], json!(1_000));
    assert_eq!(points[5]["month"], json!(6));
    assert_eq!(points[5]["expense"], json!(9_500));

    let (status, body) = send(
        &app,
        Method::GET,
        "/reports/categories?month=6&year=2024",
        Some(&auth),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let entries = body["data"].as_array().unwrap();
    assert_eq!(entries[0]["name"], json!("Rent"));
    assert_eq!(entries[1]["name"], json!("Food"));
    assert_eq!(entries[1]["transactions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn aggregate_skips_unparseable_dates() {
    let app = app().await;
    let auth = register(&app, "alice").await;
    let food = "6f1c1a4e-8a52-4d3e-9d7a-0c1e2b3a4d5f";

    let (status, body) = send(
        &app,
        Method::POST,
        "/reports/aggregate",
        Some(&auth),
        Some(json!({
            "month": 3,
            "year": 2024,
            "categories": [
                { "id": food, "name": "Food", "kind": "expense", "color": "#ff0000" }
            ],
            "transactions": [
                {
                    "id": "00000000-0000-4000-8000-000000000001",
                    "kind": "expense",
                    "amount": 1_000,
                    "categoryId": food,
                    "date": "2024-03-05"
                },
                {
                    "id": "00000000-0000-4000-8000-000000000002",
                    "kind": "expense",
                    "amount": 7_000,
                    "categoryId": food,
                    "date": "sometime in march"
                },
                {
                    "id": "00000000-0000-4000-8000-000000000003",
                    "kind": "income",
                    "amount": 5_000,
                    "categoryId": "00000000-0000-4000-8000-0000000000ff",
                    "date": "2024-02-20"
                }
            ],
            "budgets": [
                {
                    "id": "00000000-0000-4000-8000-0000000000aa",
                    "categoryId": food,
                    "month": 3,
                    "year": 2024,
                    "amount": 0
                }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let data = &body["data"];
    assert_eq!(
        data["summary"],
        json!({ "income": 0, "expense": 1_000, "balance": -1_000 })
    );
    // recent transactions are drawn from every parseable row
    assert_eq!(data["recentTransactions"].as_array().unwrap().len(), 2);
    assert_eq!(data["budgets"][0]["percentage"], json!(100.0));
}

fn aggregate_body(amounts: &[i64], cap: i64) -> Value {
    let food = "6f1c1a4e-8a52-4d3e-9d7a-0c1e2b3a4d5f";
    let transactions: Vec<Value> = amounts
        .iter()
        .enumerate()
        .map(|(n, amount)| {
            json!({
                "id": format!("00000000-0000-4000-8000-{:012}", n + 1),
                "kind": "expense",
                "amount": amount,
                "categoryId": food,
                "date": "2024-03-05"
            })
        })
        .collect();
    json!({
        "month": 3,
        "year": 2024,
        "categories": [
            { "id": food, "name": "Food", "kind": "expense", "color": "#ff0000" }
        ],
        "transactions": transactions,
        "budgets": [
            {
                "id": "00000000-0000-4000-8000-0000000000aa",
                "categoryId": food,
                "month": 3,
                "year": 2024,
                "amount": cap
            }
        ]
    })
}

#[tokio::test]
async fn aggregate_rejects_non_positive_amounts() {
    let app = app().await;
    let auth = register(&app, "alice").await;

    for amounts in [vec![1_000, -900], vec![1_000, 0]] {
        let (status, body) = send(
            &app,
            Method::POST,
            "/reports/aggregate",
            Some(&auth),
            Some(aggregate_body(&amounts, 2_000)),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");
        assert_eq!(body["success"], json!(false));
    }

    let (status, body) = send(
        &app,
        Method::POST,
        "/reports/aggregate",
        Some(&auth),
        Some(aggregate_body(&[1_000], -5)),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");
}

#[tokio::test]
async fn oversized_amounts_are_rejected_not_summed() {
    let app = app().await;
    let auth = register(&app, "alice").await;
    let half = i64::MAX / 2 + 1;

    let (status, body) = send(
        &app,
        Method::POST,
        "/reports/aggregate",
        Some(&auth),
        Some(aggregate_body(&[half, half], 2_000)),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");
    assert_eq!(body["success"], json!(false));

    let food = create_category(&app, &auth, "Food", "expense").await;
    let (status, body) =
        create_transaction(&app, &auth, "expense", half, &food, "2024-03-05").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");

    let (status, body) = send(
        &app,
        Method::GET,
        "/dashboard?month=3&year=2024",
        Some(&auth),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["summary"]["expense"], json!(0));
}

#[tokio::test]
async fn receipt_scanning_unconfigured_is_unavailable() {
    let app = app().await;
    let auth = register(&app, "alice").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/receipts/scan",
        Some(&auth),
        Some(json!({ "imageBase64": "aGVsbG8=" })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], json!(false));
}
