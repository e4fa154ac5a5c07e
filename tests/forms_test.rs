//! Form lifecycle, conditional submission and results over HTTP.

mod common;

use axum::http::{header, StatusCode};
use common::{lunch_form, TestApp};
use serde_json::json;

#[tokio::test]
async fn test_create_and_fetch_form() {
    let app = TestApp::new().await;
    let token = app.register_and_login("owner@example.com").await;
    let (form_id, ids) = app.create_form(&token, lunch_form()).await;
    assert_eq!(ids.len(), 4);

    let (status, body) = app
        .request("GET", &format!("/api/forms/{}", form_id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["form"]["title"], "Team lunch");
    assert_eq!(body["form"]["is_owner"], true);
    assert_eq!(body["form"]["author_name"], "Tester");

    // draft keys are resolved to the stored question ids
    let questions = body["form"]["questions"].as_array().unwrap();
    assert_eq!(questions[1]["condition"]["question_id"], ids[0]);
    assert_eq!(questions[1]["condition"]["value"], "Yes");
    assert!(questions[3].get("condition").is_none());

    let (_, body) = app
        .request("GET", &format!("/api/forms/{}", form_id), None, None)
        .await;
    assert_eq!(body["form"]["is_owner"], false);

    let (status, _) = app.request("GET", "/api/forms/9999", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_form_validation() {
    let app = TestApp::new().await;
    let token = app.register_and_login("owner@example.com").await;

    let (status, _) = app.request("POST", "/api/forms", None, Some(lunch_form())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let bad_forms = [
        json!({ "title": "   " }),
        json!({ "title": "No options", "questions": [
            { "type": "single", "title": "Pick one", "options": [] }
        ]}),
        json!({ "title": "Forward reference", "questions": [
            { "id": "a", "type": "short_text", "title": "First",
              "condition": { "question_id": "b", "value": "x" } },
            { "id": "b", "type": "short_text", "title": "Second" }
        ]}),
    ];
    for form in bad_forms {
        let (status, _) = app
            .request("POST", "/api/forms", Some(&token), Some(form.clone()))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", form);
    }
}

#[tokio::test]
async fn test_listing_open_and_own_forms() {
    let app = TestApp::new().await;
    let token = app.register_and_login("owner@example.com").await;
    let (open_id, _) = app.create_form(&token, lunch_form()).await;
    let (closed_id, _) = app
        .create_form(&token, json!({ "title": "Closed one", "questions": [] }))
        .await;
    app.request(
        "PUT",
        &format!("/api/forms/{}", closed_id),
        Some(&token),
        Some(json!({ "is_open": false })),
    )
    .await;

    let (_, body) = app.request("GET", "/api/forms", None, None).await;
    let public: Vec<i64> = body["forms"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["id"].as_i64().unwrap())
        .collect();
    assert_eq!(public, vec![open_id]);

    let (status, _) = app.request("GET", "/api/forms?my=true", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, body) = app.request("GET", "/api/forms?my=true", Some(&token), None).await;
    assert_eq!(body["forms"].as_array().unwrap().len(), 2);
    assert_eq!(body["forms"][0]["response_count"], 0);
}

#[tokio::test]
async fn test_unmet_condition_skips_required_question() {
    let app = TestApp::new().await;
    let token = app.register_and_login("owner@example.com").await;
    let (form_id, ids) = app.create_form(&token, lunch_form()).await;
    let (attend, menu, diet) = (ids[0], ids[1], ids[2]);

    // "menu" is required but hidden when not attending; the stray diet
    // answer is dropped
    let mut answers = serde_json::Map::new();
    answers.insert(attend.to_string(), json!("No"));
    answers.insert(diet.to_string(), json!("vegan"));
    let (status, body) = app.submit(form_id, json!({ "answers": answers })).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);

    // attending makes "menu" visible and required
    let (status, body) = app
        .submit(form_id, json!({ "answers": { attend.to_string(): "Yes" } }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["missing"], json!([menu]));

    let (status, _) = app
        .submit(
            form_id,
            json!({ "answers": { attend.to_string(): "Yes", menu.to_string(): ["Pizza", "Sushi"] } }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = app
        .request("GET", &format!("/api/forms/{}/responses", form_id), Some(&token), None)
        .await;
    let responses = body["responses"].as_array().unwrap();
    assert_eq!(responses.len(), 2);
    // newest first
    let newest = responses[0]["answers"].as_array().unwrap();
    assert_eq!(newest.len(), 2);
    assert_eq!(newest[1]["value"], json!(["Pizza", "Sushi"]));
    let oldest = responses[1]["answers"].as_array().unwrap();
    assert_eq!(oldest.len(), 1);
    assert_eq!(oldest[0]["question_id"], attend);
}

#[tokio::test]
async fn test_submission_value_checks() {
    let app = TestApp::new().await;
    let token = app.register_and_login("owner@example.com").await;
    let (form_id, ids) = app.create_form(&token, lunch_form()).await;

    let bad = [
        json!({ ids[0].to_string(): "Maybe" }),
        json!({ ids[0].to_string(): "No", ids[3].to_string(): 7 }),
        json!({ ids[0].to_string(): "No", "424242": "stray" }),
    ];
    for answers in bad {
        let (status, _) = app.submit(form_id, json!({ "answers": answers.clone() })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", answers);
    }

    let (status, _) = app.submit(9999, json!({ "answers": {} })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_closed_form_rejects_submission() {
    let app = TestApp::new().await;
    let token = app.register_and_login("owner@example.com").await;
    let (form_id, ids) = app.create_form(&token, lunch_form()).await;

    let (status, body) = app
        .request(
            "PUT",
            &format!("/api/forms/{}", form_id),
            Some(&token),
            Some(json!({ "is_open": false })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["form"]["is_open"], false);
    // toggling does not touch the title
    assert_eq!(body["form"]["title"], "Team lunch");

    let (status, body) = app
        .submit(form_id, json!({ "answers": { ids[0].to_string(): "No" } }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "this survey is closed");
    assert_eq!(app.database.count_responses(form_id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_past_deadline_rejects_submission() {
    let app = TestApp::new().await;
    let token = app.register_and_login("owner@example.com").await;
    let mut form = lunch_form();
    form["deadline"] = json!("2020-01-01T00:00:00Z");
    let (form_id, ids) = app.create_form(&token, form).await;

    let (status, body) = app
        .submit(form_id, json!({ "answers": { ids[0].to_string(): "No" } }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "the deadline for this survey has passed");
}

#[tokio::test]
async fn test_date_only_deadline_stays_open_all_day() {
    let app = TestApp::new().await;
    let token = app.register_and_login("owner@example.com").await;
    let mut form = lunch_form();
    form["deadline"] = json!("2030-12-31");
    let (form_id, ids) = app.create_form(&token, form).await;

    let (_, body) = app
        .request("GET", &format!("/api/forms/{}", form_id), None, None)
        .await;
    assert!(
        body["form"]["deadline"]
            .as_str()
            .unwrap()
            .starts_with("2030-12-31T23:59:59"),
        "{}",
        body
    );

    let (status, body) = app
        .submit(form_id, json!({ "answers": { ids[0].to_string(): "No" } }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);

    let (status, body) = app
        .request(
            "PUT",
            &format!("/api/forms/{}", form_id),
            Some(&token),
            Some(json!({ "title": "Team lunch", "deadline": "2031-01-15" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let form = app.database.get_form(form_id).await.unwrap().unwrap();
    assert_eq!(form.deadline.unwrap().to_rfc3339(), "2031-01-15T23:59:59+00:00");
}

#[tokio::test]
async fn test_malformed_body_gets_error_envelope() {
    let app = TestApp::new().await;
    let token = app.register_and_login("owner@example.com").await;
    let (form_id, _) = app.create_form(&token, lunch_form()).await;

    let (status, body) = app
        .submit(form_id, json!({ "answers": { "abc": "x" } }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("JSON"), "{}", body);

    let (status, body) = app
        .request(
            "POST",
            "/api/forms",
            Some(&token),
            Some(json!({ "title": "Party", "deadline": "soon" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("invalid deadline"), "{}", body);

    let response = app.raw("POST", "/api/auth/login", None, None).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_visibility_preview_numbers_visible_questions() {
    let app = TestApp::new().await;
    let token = app.register_and_login("owner@example.com").await;
    let (form_id, ids) = app.create_form(&token, lunch_form()).await;
    let uri = format!("/api/forms/{}/visibility", form_id);

    let (status, body) = app.request("POST", &uri, None, Some(json!({ "answers": {} }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 4);
    let visible = body["visible"].as_array().unwrap();
    assert_eq!(visible.len(), 2);
    assert_eq!(visible[1]["id"], ids[3]);
    assert_eq!(visible[1]["number"], 2);

    let (_, body) = app
        .request(
            "POST",
            &uri,
            None,
            Some(json!({ "answers": { ids[0].to_string(): "Yes" } })),
        )
        .await;
    let numbers: Vec<i64> = body["visible"]
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["number"].as_i64().unwrap())
        .collect();
    assert_eq!(numbers, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn test_non_owner_is_forbidden() {
    let app = TestApp::new().await;
    let owner = app.register_and_login("owner@example.com").await;
    let other = app.register_and_login("other@example.com").await;
    let (form_id, _) = app.create_form(&owner, lunch_form()).await;

    let routes = [
        ("PUT", format!("/api/forms/{}", form_id), Some(json!({ "title": "Mine now" }))),
        ("DELETE", format!("/api/forms/{}", form_id), None),
        ("POST", format!("/api/forms/{}/duplicate", form_id), None),
        ("GET", format!("/api/forms/{}/responses", form_id), None),
        ("GET", format!("/api/forms/{}/results", form_id), None),
        ("GET", format!("/api/forms/{}/export", form_id), None),
        ("GET", format!("/api/forms/{}/invitations", form_id), None),
    ];
    for (method, uri, body) in routes {
        let (status, _) = app.request(method, &uri, Some(&other), body).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{} {}", method, uri);
    }

    // a missing form looks the same to owner routes
    let (status, _) = app
        .request("GET", "/api/forms/9999/responses", Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_duplicate_form_remaps_conditions() {
    let app = TestApp::new().await;
    let token = app.register_and_login("owner@example.com").await;
    let (form_id, _) = app.create_form(&token, lunch_form()).await;

    let (status, body) = app
        .request("POST", &format!("/api/forms/{}/duplicate", form_id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["form"]["title"], "Team lunch (Copy)");
    assert_eq!(body["form"]["is_open"], false);

    let copy_id = body["form"]["id"].as_i64().unwrap();
    let copy_ids = app.question_ids(copy_id).await;
    let (_, body) = app
        .request("GET", &format!("/api/forms/{}", copy_id), None, None)
        .await;
    assert_eq!(body["form"]["questions"][1]["condition"]["question_id"], copy_ids[0]);
    assert_eq!(body["form"]["questions"][2]["condition"]["question_id"], copy_ids[0]);
}

#[tokio::test]
async fn test_editing_questions_keeps_collected_answers() {
    let app = TestApp::new().await;
    let token = app.register_and_login("owner@example.com").await;
    let (form_id, ids) = app.create_form(&token, lunch_form()).await;
    app.submit(
        form_id,
        json!({ "answers": { ids[0].to_string(): "No", ids[3].to_string(): 4 } }),
    )
    .await;

    // keep attendance (renamed) and the rating, drop the rest, add a comment
    let update = json!({
        "title": "Team lunch v2",
        "questions": [
            { "id": ids[0], "type": "single", "title": "Joining us?", "options": ["Yes", "No"], "required": true },
            { "id": ids[3], "type": "rating", "title": "How excited are you?" },
            { "id": "new", "type": "long_text", "title": "Anything else?",
              "condition": { "question_id": ids[0], "value": "Yes" } }
        ]
    });
    let (status, body) = app
        .request("PUT", &format!("/api/forms/{}", form_id), Some(&token), Some(update))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let new_ids = app.question_ids(form_id).await;
    assert_eq!(&new_ids[..2], &[ids[0], ids[3]]);

    let (_, body) = app
        .request("GET", &format!("/api/forms/{}/responses", form_id), Some(&token), None)
        .await;
    let answers = body["responses"][0]["answers"].as_array().unwrap();
    assert_eq!(answers.len(), 2);
    assert_eq!(answers[0]["question_title"], "Joining us?");
    assert_eq!(answers[1]["value"], "4");
}

#[tokio::test]
async fn test_results_aggregation() {
    let app = TestApp::new().await;
    let token = app.register_and_login("owner@example.com").await;
    let (form_id, ids) = app.create_form(&token, lunch_form()).await;
    let (attend, menu, _, mood) = (ids[0], ids[1], ids[2], ids[3]);

    for answers in [
        json!({ attend.to_string(): "Yes", menu.to_string(): ["Pizza"], mood.to_string(): 5 }),
        json!({ attend.to_string(): "Yes", menu.to_string(): ["Pizza", "Salad"], mood.to_string(): 3 }),
        json!({ attend.to_string(): "No" }),
        json!({ attend.to_string(): "No", mood.to_string(): "1" }),
    ] {
        let (status, body) = app.submit(form_id, json!({ "answers": answers })).await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
    }

    let (status, body) = app
        .request("GET", &format!("/api/forms/{}/results", form_id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let results = &body["results"];
    assert_eq!(results["response_count"], 4);
    assert_eq!(results["question_count"], 4);
    // 4 + 2 + 0 + 3 answered cells out of 16
    assert_eq!(results["completion_rate"], 56);

    let attend_stats = &results["questions"][0];
    assert_eq!(attend_stats["answer_count"]["Yes"], 2);
    assert_eq!(attend_stats["answer_percentage"]["No"], 50.0);

    let menu_stats = &results["questions"][1];
    assert_eq!(menu_stats["total_responses"], 2);
    assert_eq!(menu_stats["answer_count"]["Pizza"], 2);
    assert_eq!(menu_stats["answer_count"]["Sushi"], 0);
    assert_eq!(menu_stats["answer_percentage"]["Salad"], 50.0);

    let mood_stats = &results["questions"][3];
    assert_eq!(mood_stats["average"], 3.0);
    assert_eq!(mood_stats["answer_count"]["2"], 0);
    assert_eq!(mood_stats["response_rate"], 75.0);
}

#[tokio::test]
async fn test_export_csv_and_xlsx() {
    let app = TestApp::new().await;
    let token = app.register_and_login("owner@example.com").await;
    let (form_id, ids) = app.create_form(&token, lunch_form()).await;
    app.submit(
        form_id,
        json!({ "answers": {
            ids[0].to_string(): "Yes",
            ids[1].to_string(): ["Pizza", "Salad"],
            ids[2].to_string(): "no \"nuts\""
        }}),
    )
    .await;

    let response = app
        .raw("GET", &format!("/api/forms/{}/export?format=csv", form_id), Some(&token), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"Team_lunch_responses.csv\""
    );
    let csv = String::from_utf8(response.body).unwrap();
    let mut lines = csv.trim_start_matches('\u{feff}').lines();
    assert_eq!(
        lines.next().unwrap(),
        "\"Submitted At\",\"Will you join?\",\"What would you like?\",\"Dietary needs\",\"How excited are you?\""
    );
    let row = lines.next().unwrap();
    assert!(row.ends_with(",\"Yes\",\"Pizza, Salad\",\"no \"\"nuts\"\"\",\"\""), "{}", row);

    let response = app
        .raw("GET", &format!("/api/forms/{}/export?format=xlsx", form_id), Some(&token), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(&response.body[..2], b"PK");

    let (status, _) = app
        .request("GET", &format!("/api/forms/{}/export?format=pdf", form_id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_form_cascades() {
    let app = TestApp::new().await;
    let token = app.register_and_login("owner@example.com").await;
    let (form_id, ids) = app.create_form(&token, lunch_form()).await;
    app.submit(form_id, json!({ "answers": { ids[0].to_string(): "No" } }))
        .await;

    let (status, _) = app
        .request("DELETE", &format!("/api/forms/{}", form_id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .request("GET", &format!("/api/forms/{}", form_id), None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(app.database.count_responses(form_id).await.unwrap(), 0);
}
