use axum::http::{Method, StatusCode};
use axum::Router;
use tower::ServiceExt;

use crate::test_support;


pub(crate) async fn post_submit(
    app: Router,
    token: &str,
    exam_id: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/exams/{exam_id}/submit"),
            Some(token),
            Some(body),
        ))
        .await
        .expect("submit request");

    let status = response.status();
    let json = test_support::read_json(response).await;
    (status, json)
}

pub(crate) async fn post_single_answer(
    app: Router,
    token: &str,
    exam_id: &str,
    question_id: &str,
    selected: &str,
) -> StatusCode {
    let response = app
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/exams/{exam_id}/answers"),
            Some(token),
            Some(serde_json::json!({
                "questionId": question_id,
                "selectedAnswer": selected,
            })),
        ))
        .await
        .expect("single answer request");

    response.status()
}
