use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use serde_json::json;

use super::domain::BidderId;
use super::profile::LookupFailure;
use super::projection::{BidderView, RegistryView};
use super::repository::{EvaluationRepository, EvaluationStatus, RepositoryError};
use super::service::{BidEvaluationService, BidSubmission, ServiceError};

const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Router exposing submission, results, cancellation and registry lookups.
pub fn evaluation_router<R>(service: Arc<BidEvaluationService<R>>) -> Router
where
    R: EvaluationRepository + 'static,
{
    Router::new()
        .route("/api/process-new-bid", post(submit_handler::<R>))
        .route("/api/v1/bidders", get(list_handler::<R>))
        .route("/api/v1/bidders/:bidder_id", get(bidder_handler::<R>))
        .route("/api/v1/evaluations/:bidder_id", delete(cancel_handler::<R>))
        .route("/api/v1/empresa/:ruc", get(registry_handler::<R>))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(service)
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let payload = json!({
        "error": message.into(),
    });
    (status, axum::Json(payload)).into_response()
}

/// Every lookup failure reads as "no such company" to the dashboard.
fn lookup_failure_response(failure: &LookupFailure) -> Response {
    let payload = json!({
        "error": failure.to_string(),
        "failure": failure,
    });
    (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
}

fn is_pdf(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|value| value.parse::<mime::Mime>().ok())
        .is_some_and(|parsed| parsed.essence_str() == mime::APPLICATION_PDF.essence_str())
}

/// Read `pliego`, `contrato` and the optional `id` parts.
async fn read_submission(multipart: &mut Multipart) -> Result<BidSubmission, Response> {
    let mut tender = None;
    let mut proposal = None;
    let mut bidder_id = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => return Err(error_response(StatusCode::BAD_REQUEST, err.body_text())),
        };
        let name = field.name().unwrap_or_default().to_string();
        if matches!(name.as_str(), "pliego" | "contrato") && is_pdf(field.content_type()) {
            return Err(error_response(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                format!("{name}: PDF binaries are not accepted; send the text layer or layout JSON"),
            ));
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|err| error_response(StatusCode::BAD_REQUEST, err.body_text()))?;
        match name.as_str() {
            "pliego" => tender = Some(bytes.to_vec()),
            "contrato" => proposal = Some(bytes.to_vec()),
            "id" => bidder_id = Some(String::from_utf8_lossy(&bytes).into_owned()),
            _ => {}
        }
    }

    let tender =
        tender.ok_or_else(|| error_response(StatusCode::BAD_REQUEST, "missing part: pliego"))?;
    let proposal =
        proposal.ok_or_else(|| error_response(StatusCode::BAD_REQUEST, "missing part: contrato"))?;
    Ok(BidSubmission {
        bidder_id,
        tender,
        proposal,
    })
}

pub(crate) async fn submit_handler<R>(
    State(service): State<Arc<BidEvaluationService<R>>>,
    mut multipart: Multipart,
) -> Response
where
    R: EvaluationRepository + 'static,
{
    let submission = match read_submission(&mut multipart).await {
        Ok(submission) => submission,
        Err(response) => return response,
    };

    match service.submit(submission) {
        Ok(record) => (StatusCode::ACCEPTED, axum::Json(record.status_view())).into_response(),
        Err(ServiceError::Repository(RepositoryError::Conflict)) => {
            error_response(StatusCode::CONFLICT, "bidder id already submitted")
        }
        Err(other) => error_response(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
    }
}

pub(crate) async fn list_handler<R>(State(service): State<Arc<BidEvaluationService<R>>>) -> Response
where
    R: EvaluationRepository + 'static,
{
    match service.list_evaluated() {
        Ok(results) => {
            let views: Vec<BidderView> = results.iter().map(BidderView::from).collect();
            (StatusCode::OK, axum::Json(views)).into_response()
        }
        Err(other) => error_response(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
    }
}

pub(crate) async fn bidder_handler<R>(
    State(service): State<Arc<BidEvaluationService<R>>>,
    Path(bidder_id): Path<String>,
) -> Response
where
    R: EvaluationRepository + 'static,
{
    let id = BidderId(bidder_id);
    match service.get(&id) {
        Ok(record) => match (&record.status, &record.result) {
            (EvaluationStatus::Evaluated, Some(result)) => {
                (StatusCode::OK, axum::Json(BidderView::from(result))).into_response()
            }
            (EvaluationStatus::Pending, _) => {
                (StatusCode::ACCEPTED, axum::Json(record.status_view())).into_response()
            }
            (EvaluationStatus::Evaluated, None)
            | (EvaluationStatus::Failed, _)
            | (EvaluationStatus::Cancelled, _) => {
                (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(record.status_view())).into_response()
            }
        },
        Err(ServiceError::Repository(RepositoryError::NotFound)) => {
            error_response(StatusCode::NOT_FOUND, format!("unknown bidder {id}"))
        }
        Err(other) => error_response(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
    }
}

pub(crate) async fn cancel_handler<R>(
    State(service): State<Arc<BidEvaluationService<R>>>,
    Path(bidder_id): Path<String>,
) -> Response
where
    R: EvaluationRepository + 'static,
{
    let id = BidderId(bidder_id);
    match service.cancel(&id) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(ServiceError::Repository(RepositoryError::NotFound)) => {
            error_response(StatusCode::NOT_FOUND, format!("unknown bidder {id}"))
        }
        Err(err @ ServiceError::NotCancellable { .. }) => {
            error_response(StatusCode::CONFLICT, err.to_string())
        }
        Err(other) => error_response(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
    }
}

pub(crate) async fn registry_handler<R>(
    State(service): State<Arc<BidEvaluationService<R>>>,
    Path(ruc): Path<String>,
) -> Response
where
    R: EvaluationRepository + 'static,
{
    match service.lookup_registry(&ruc).await {
        Ok(record) => (StatusCode::OK, axum::Json(RegistryView::from(record))).into_response(),
        Err(ServiceError::Lookup(failure)) => lookup_failure_response(&failure),
        Err(other) => error_response(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
    }
}
