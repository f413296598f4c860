// src/controllers/request_controller.rs

use actix_web::{get, patch, post, web, HttpResponse};
use serde_json::json;

use super::PartyQuery;
use crate::error::AppResult;
use crate::services::request_service::{self, AllocationTerms, RequestForm, StatusForm};
use crate::state::AppState;

/// POST /requests
#[post("")]
pub async fn create_request(
    form: web::Json<RequestForm>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let request = request_service::create_request(data.requests.as_ref(), form.into_inner()).await?;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Request created successfully!",
        "request": request,
    })))
}

/// GET /requests?userId=&userType=
/// Every request for the admin view, or those one user has filed.
#[get("")]
pub async fn list_requests(
    query: web::Query<PartyQuery>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let requests =
        request_service::list_requests(data.requests.as_ref(), query.into_inner().into_filter()?)
            .await?;

    Ok(HttpResponse::Ok().json(json!({ "success": true, "requests": requests })))
}

/// PATCH /requests/{id}
/// Approves, rejects or marks a request allocated.
#[patch("/{id}")]
pub async fn update_request(
    path: web::Path<String>,
    form: web::Json<StatusForm>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let request =
        request_service::update_request_status(data.requests.as_ref(), &id, form.into_inner())
            .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Request status updated successfully!",
        "request": request,
    })))
}

/// POST /requests/{id}/allocate
/// Creates the allocation for a request and marks the request allocated.
#[post("/{id}/allocate")]
pub async fn allocate_request(
    path: web::Path<String>,
    terms: web::Json<AllocationTerms>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let (allocation, request) = request_service::allocate_request(
        data.users.as_ref(),
        data.allocations.as_ref(),
        data.requests.as_ref(),
        &id,
        terms.into_inner(),
    )
    .await?;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Teacher allocated successfully!",
        "allocation": allocation,
        "request": request,
    })))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test, web, App};
    use serde_json::{json, Value};

    use crate::routes;
    use crate::state::AppState;

    fn account(kind: &str, name: &str) -> Value {
        json!({
            "type": kind,
            "name": name,
            "email": format!("{}@example.com", name.to_lowercase()),
            "password": "password123",
            "phone": "9876543210",
            "city": "Pune",
            "subjects": ["Chemistry"],
            "class": "11",
            "experience": "4",
            "qualification": "M.Sc",
        })
    }

    #[actix_web::test]
    async fn request_to_allocation_workflow() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::for_tests()))
                .configure(routes::init),
        )
        .await;

        let mut ids = Vec::new();
        for (kind, name) in [("teacher", "Ravi"), ("student", "Asha")] {
            let req = test::TestRequest::post()
                .uri("/api/users/register")
                .set_json(account(kind, name))
                .to_request();
            let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
            ids.push(body["user"]["_id"].as_str().unwrap().to_string());
        }
        let (teacher, student) = (&ids[0], &ids[1]);

        let request = json!({
            "requesterId": teacher,
            "requesterType": "teacher",
            "requesterName": "Ravi",
            "targetId": student,
            "targetType": "student",
            "targetName": "Asha",
            "subjects": ["Chemistry"],
            "message": "Evenings work best",
        });
        let req = test::TestRequest::post().uri("/api/requests").set_json(&request).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["request"]["status"], "pending");
        let request_id = body["request"]["_id"].as_str().unwrap().to_string();

        let req = test::TestRequest::post().uri("/api/requests").set_json(&request).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::patch()
            .uri(&format!("/api/requests/{}", request_id))
            .set_json(json!({ "status": "approved" }))
            .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["request"]["status"], "approved");

        let req = test::TestRequest::post()
            .uri(&format!("/api/requests/{}/allocate", request_id))
            .set_json(json!({ "fees": 1800, "time": "19:00", "days": ["Sat"] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Teacher allocated successfully!");
        assert_eq!(body["request"]["status"], "allocated");
        assert_eq!(body["request"]["allocationId"], body["allocation"]["_id"]);
        assert_eq!(body["allocation"]["studentName"], "Asha");
        assert_eq!(body["allocation"]["subjects"], json!(["Chemistry"]));

        let req = test::TestRequest::get()
            .uri(&format!("/api/requests?userId={}&userType=teacher", teacher))
            .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["requests"].as_array().unwrap().len(), 1);

        let req = test::TestRequest::get()
            .uri(&format!("/api/allocations?userId={}&userType=teacher", teacher))
            .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["allocations"].as_array().unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn invalid_and_unknown_status_updates() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::for_tests()))
                .configure(routes::init),
        )
        .await;

        let req = test::TestRequest::patch()
            .uri("/api/requests/000000000000000000000000")
            .set_json(json!({ "status": "finished" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Invalid status");

        let req = test::TestRequest::patch()
            .uri("/api/requests/000000000000000000000000")
            .set_json(json!({ "status": "approved" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Request not found");

        let req = test::TestRequest::get().uri("/api/requests/000000000000000000000000").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
