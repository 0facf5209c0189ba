// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Batch meal-prep plan tests.

use axum::http::{Method, StatusCode};
use serde_json::json;

mod common;

fn plan_json(days: u32) -> String {
    let runtime: Vec<_> = (1..=days)
        .map(|day| {
            json!({
                "day": day,
                "dish": format!("Chickpea bowl {day}"),
                "instructions": ["Reheat chickpeas", "Assemble bowl"],
                "macros": {"calories": "520", "protein": "22g", "carbs": "70g", "fats": "14g"}
            })
        })
        .collect();

    json!({
        "title": "Chickpea week",
        "ingredients": ["2 cups chickpeas", "1 cup rice"],
        "buildPhase": [
            {"task": "Pressure cook chickpeas", "duration": "30 mins", "temperature": null, "rationale": "Longest step first"},
            {"task": "Cook rice", "duration": "20 mins", "rationale": "Runs alongside the chickpeas"}
        ],
        "runtimePhase": runtime,
        "storageTip": "Keep components in separate boxes"
    })
    .to_string()
}

#[tokio::test]
async fn test_generate_and_list_plan() {
    let app = common::create_test_app();
    let (token, user_id) = app.signup("Asha", "asha@example.com", "curry-leaves").await;
    app.llm.push_ok(plan_json(3));

    let response = app
        .post(
            "/api/batch/generate",
            Some(&token),
            json!({"ingredients": ["chickpeas", "rice"], "days": 3, "servings": 2}),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    assert_eq!(response.body["saved"], true);
    let plan = &response.body["plan"];
    assert_eq!(plan["ownerId"], user_id.as_str());
    assert_eq!(plan["days"], 3);
    assert_eq!(plan["buildPhase"].as_array().unwrap().len(), 2);
    assert_eq!(plan["runtimePhase"].as_array().unwrap().len(), 3);

    let prompts = app.llm.prompts();
    assert!(prompts[0].user.contains("3 day(s)"));

    let listed = app.get("/api/batch", &token).await;
    assert_eq!(listed.body["plans"].as_array().unwrap().len(), 1);

    let plan_id = plan["id"].as_str().unwrap();
    let fetched = app.get(&format!("/api/batch/{plan_id}"), &token).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body["plan"]["title"], "Chickpea week");
}

#[tokio::test]
async fn test_days_out_of_range() {
    let app = common::create_test_app();
    let (token, _) = app.signup("Asha", "asha@example.com", "curry-leaves").await;

    for days in [0, 8] {
        let response = app
            .post(
                "/api/batch/generate",
                Some(&token),
                json!({"ingredients": ["chickpeas"], "days": days}),
            )
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
    }
    assert!(app.llm.prompts().is_empty());
}

#[tokio::test]
async fn test_plan_without_build_phase_rejected() {
    let app = common::create_test_app();
    let (token, _) = app.signup("Asha", "asha@example.com", "curry-leaves").await;
    app.llm.push_ok(
        json!({"title": "Nothing", "buildPhase": [], "runtimePhase": []}).to_string(),
    );

    let response = app
        .post(
            "/api/batch/generate",
            Some(&token),
            json!({"ingredients": ["chickpeas"], "days": 2}),
        )
        .await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    let listed = app.get("/api/batch", &token).await;
    assert_eq!(listed.body["plans"], json!([]));
}

#[tokio::test]
async fn test_plans_are_private() {
    let app = common::create_test_app();
    let (alice, _) = app.signup("Alice", "alice@example.com", "password-a").await;
    let (bob, _) = app.signup("Bob", "bob@example.com", "password-b").await;
    app.llm.push_ok(plan_json(2));

    let created = app
        .post(
            "/api/batch/generate",
            Some(&alice),
            json!({"ingredients": ["chickpeas"], "days": 2}),
        )
        .await;
    let uri = format!("/api/batch/{}", created.body["plan"]["id"].as_str().unwrap());

    assert_eq!(app.get(&uri, &bob).await.status, StatusCode::NOT_FOUND);
    let stolen = app.request(Method::DELETE, &uri, Some(&bob), None).await;
    assert_eq!(stolen.status, StatusCode::NOT_FOUND);

    let deleted = app.request(Method::DELETE, &uri, Some(&alice), None).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    assert_eq!(app.get(&uri, &alice).await.status, StatusCode::NOT_FOUND);
}
