use axum::{
    Router,
    body::Bytes,
    extract::{Path, Query, Request, State},
    http::{Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_shared::auth;
use api_shared::{
    AckKindReq, AcknowledgeReq, ChecklistRes, ClassificationRes, CoordinatorStateRes,
    CreateStudentReq, DiscrepancyRes, DocumentRes, ExtractReq, ExtractRes, HealthRes,
    HealthService, ItemKindRes, ItemRes, ListDocumentsRes, ListStudentsRes, SectionRes,
    SetCompletedReq, SetNameReq, StudentRes,
};
use preflight_core::{
    extraction, AckOutcome, ChecklistError, ChecklistResult, ChecklistService, CoordinatorState,
    CoreConfig, DiscrepancyClassification, DiscrepancyCoordinator, DiscrepancyKind,
    DiscrepancyStatus, ItemKind, SectionView, StudentProfile,
};
use preflight_files::{DocumentKind, DocumentMetadata, DocumentsService, FilesError};
use preflight_types::{NonEmptyText, StudentId};

/// Application state shared across REST API handlers.
///
/// Coordinators live in-process, one per student, behind a single mutex: each
/// evaluation is a tiny synchronous read-then-write over the coordinator, so
/// no finer-grained locking is meaningful. Only completion flags and captured
/// name values persist; a coordinator is re-seeded from storage on first
/// touch after a restart.
#[derive(Clone)]
struct AppState {
    checklist_service: ChecklistService,
    coordinators: Arc<Mutex<HashMap<StudentId, DiscrepancyCoordinator>>>,
    students_dir: PathBuf,
    api_key: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        create_student,
        list_students,
        get_checklist,
        set_completed,
        set_item_name,
        get_discrepancy,
        acknowledge,
        extract,
        store_document,
        list_documents
    ),
    components(schemas(
        HealthRes,
        CreateStudentReq,
        StudentRes,
        ListStudentsRes,
        ChecklistRes,
        SectionRes,
        ItemRes,
        ItemKindRes,
        SetCompletedReq,
        SetNameReq,
        DiscrepancyRes,
        ClassificationRes,
        CoordinatorStateRes,
        AcknowledgeReq,
        AckKindReq,
        ExtractReq,
        ExtractRes,
        DocumentRes,
        ListDocumentsRes
    ))
)]
struct ApiDoc;

/// Main entry point for the Preflight application.
///
/// Starts the REST server with OpenAPI docs at `/swagger-ui`.
///
/// # Environment Variables
/// - `PREFLIGHT_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `PREFLIGHT_DATA_DIR`: Directory for student data storage (default: "/preflight_data")
/// - `API_KEY`: When set, non-GET routes require a matching `x-api-key` header
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("preflight=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("PREFLIGHT_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let data_dir = PathBuf::from(
        std::env::var("PREFLIGHT_DATA_DIR").unwrap_or_else(|_| "/preflight_data".into()),
    );
    let api_key = std::env::var("API_KEY").ok();

    let config = CoreConfig::new(data_dir)?;
    std::fs::create_dir_all(config.students_dir())?;
    let checklist_service = ChecklistService::new(&config)?;

    tracing::info!("++ Starting Preflight REST on {}", rest_addr);

    let state = AppState {
        checklist_service,
        coordinators: Arc::new(Mutex::new(HashMap::new())),
        students_dir: config.students_dir(),
        api_key,
    };

    let app = Router::new()
        .route("/health", get(health))
        .route("/students", get(list_students))
        .route("/students", post(create_student))
        .route("/students/:id/checklist", get(get_checklist))
        .route("/students/:id/items/:item_id/complete", post(set_completed))
        .route("/students/:id/items/:item_id/name", put(set_item_name))
        .route("/students/:id/discrepancy", get(get_discrepancy))
        .route("/students/:id/discrepancy/acknowledge", post(acknowledge))
        .route("/extract", post(extract))
        .route("/students/:id/documents", post(store_document))
        .route("/students/:id/documents", get(list_documents))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Requires `x-api-key` on non-GET requests when an API key is configured.
async fn require_api_key(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if let Some(expected) = &state.api_key {
        if req.method() != Method::GET {
            let provided = req
                .headers()
                .get("x-api-key")
                .and_then(|value| value.to_str().ok());
            if let Err(e) = auth::validate_api_key(expected, provided) {
                return (StatusCode::UNAUTHORIZED, e.to_string()).into_response();
            }
        }
    }
    next.run(req).await
}

type ApiError = (StatusCode, &'static str);

/// Maps core errors onto HTTP status codes. Internal failures are logged; the
/// wire gets a generic message.
fn map_error(e: ChecklistError) -> ApiError {
    match e {
        ChecklistError::StudentNotFound(_) => (StatusCode::NOT_FOUND, "Student not found"),
        ChecklistError::UnknownItem(_) => (StatusCode::NOT_FOUND, "Unknown checklist item"),
        ChecklistError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "Invalid input"),
        ChecklistError::GateBlocked(_) => (
            StatusCode::CONFLICT,
            "Resolve the name discrepancy before completing this item",
        ),
        other => {
            tracing::error!("Checklist operation error: {:?}", other);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        }
    }
}

fn parse_student_id(id: &str) -> Result<StudentId, ApiError> {
    StudentId::parse(id).map_err(|_| (StatusCode::BAD_REQUEST, "Invalid student id"))
}

/// Runs `f` with the student's coordinator, creating and seeding it from
/// persisted state on first touch.
fn with_coordinator<R>(
    state: &AppState,
    id: StudentId,
    f: impl FnOnce(&ChecklistService, &mut DiscrepancyCoordinator) -> ChecklistResult<R>,
) -> ChecklistResult<R> {
    let mut coordinators = state
        .coordinators
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let coordinator = match coordinators.entry(id) {
        Entry::Occupied(entry) => entry.into_mut(),
        Entry::Vacant(entry) => {
            let mut coordinator = DiscrepancyCoordinator::new();
            state.checklist_service.evaluate(id, &mut coordinator)?;
            entry.insert(coordinator)
        }
    };
    f(&state.checklist_service, coordinator)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for monitoring and load balancers.
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/students",
    request_body = CreateStudentReq,
    responses(
        (status = 200, description = "Student created", body = StudentRes),
        (status = 400, description = "Bad request"),
        (status = 500, description = "Internal server error")
    )
)]
/// Create a new student profile with an empty checklist.
async fn create_student(
    State(state): State<AppState>,
    Json(req): Json<CreateStudentReq>,
) -> Result<Json<StudentRes>, ApiError> {
    let display_name = NonEmptyText::new(&req.display_name)
        .map_err(|_| (StatusCode::BAD_REQUEST, "display_name cannot be empty"))?;
    let profile = state
        .checklist_service
        .create_student(display_name)
        .map_err(map_error)?;
    Ok(Json(student_res(&profile)))
}

#[utoipa::path(
    get,
    path = "/students",
    responses(
        (status = 200, description = "List of students", body = ListStudentsRes)
    )
)]
/// List all student profiles.
async fn list_students(State(state): State<AppState>) -> Json<ListStudentsRes> {
    let students = state
        .checklist_service
        .list_students()
        .iter()
        .map(student_res)
        .collect();
    Json(ListStudentsRes { students })
}

#[utoipa::path(
    get,
    path = "/students/{id}/checklist",
    params(("id" = String, Path, description = "Student id")),
    responses(
        (status = 200, description = "The student's checklist", body = ChecklistRes),
        (status = 404, description = "Student not found")
    )
)]
/// The checklist dataset merged with the student's completion state.
async fn get_checklist(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ChecklistRes>, ApiError> {
    let id = parse_student_id(&id)?;
    let sections = state.checklist_service.checklist(id).map_err(map_error)?;
    Ok(Json(checklist_res(sections)))
}

#[utoipa::path(
    post,
    path = "/students/{id}/items/{item_id}/complete",
    params(
        ("id" = String, Path, description = "Student id"),
        ("item_id" = String, Path, description = "Checklist item id")
    ),
    request_body = SetCompletedReq,
    responses(
        (status = 200, description = "Completion updated"),
        (status = 404, description = "Student or item not found"),
        (status = 409, description = "Blocked by an unresolved name discrepancy")
    )
)]
/// Set or clear a checklist item's completion flag.
///
/// The two document-name items are gate-driven and cannot be marked complete
/// while a name discrepancy is unresolved.
async fn set_completed(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(String, String)>,
    Json(req): Json<SetCompletedReq>,
) -> Result<StatusCode, ApiError> {
    let id = parse_student_id(&id)?;
    with_coordinator(&state, id, |service, coordinator| {
        service.set_completed(id, &item_id, req.completed, coordinator)
    })
    .map_err(map_error)?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    put,
    path = "/students/{id}/items/{item_id}/name",
    params(
        ("id" = String, Path, description = "Student id"),
        ("item_id" = String, Path, description = "Document-name item id (101 or 201)")
    ),
    request_body = SetNameReq,
    responses(
        (status = 200, description = "Name written; discrepancy re-evaluated", body = DiscrepancyRes),
        (status = 400, description = "Item does not carry a document name"),
        (status = 404, description = "Student or item not found")
    )
)]
/// Write a document-name value and re-run the discrepancy evaluation.
///
/// The evaluation runs exactly once, synchronously, before the response.
async fn set_item_name(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(String, String)>,
    Json(req): Json<SetNameReq>,
) -> Result<Json<DiscrepancyRes>, ApiError> {
    let id = parse_student_id(&id)?;
    let status = with_coordinator(&state, id, |service, coordinator| {
        service.set_item_name(id, &item_id, req.name, coordinator)
    })
    .map_err(map_error)?;
    Ok(Json(discrepancy_res(status)))
}

#[utoipa::path(
    get,
    path = "/students/{id}/discrepancy",
    params(("id" = String, Path, description = "Student id")),
    responses(
        (status = 200, description = "Current discrepancy status", body = DiscrepancyRes),
        (status = 404, description = "Student not found")
    )
)]
/// Current classification, gates, and dialog flags for a student.
async fn get_discrepancy(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DiscrepancyRes>, ApiError> {
    let id = parse_student_id(&id)?;
    let status = with_coordinator(&state, id, |service, coordinator| {
        Ok(service.discrepancy_status(coordinator))
    })
    .map_err(map_error)?;
    Ok(Json(discrepancy_res(status)))
}

#[utoipa::path(
    post,
    path = "/students/{id}/discrepancy/acknowledge",
    params(("id" = String, Path, description = "Student id")),
    request_body = AcknowledgeReq,
    responses(
        (status = 200, description = "Acknowledged; gates opened", body = DiscrepancyRes),
        (status = 404, description = "Student not found"),
        (status = 409, description = "No matching pending discrepancy")
    )
)]
/// Acknowledge a pending discrepancy, forcing both gates open.
async fn acknowledge(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AcknowledgeReq>,
) -> Result<Json<DiscrepancyRes>, ApiError> {
    let id = parse_student_id(&id)?;
    let kind = match req.kind {
        AckKindReq::MiddleName => DiscrepancyKind::MiddleName,
        AckKindReq::General => DiscrepancyKind::General,
    };
    let (outcome, status) = with_coordinator(&state, id, |service, coordinator| {
        service.acknowledge(id, kind, coordinator)
    })
    .map_err(map_error)?;
    if outcome == AckOutcome::NotPending {
        return Err((
            StatusCode::CONFLICT,
            "No matching pending discrepancy to acknowledge",
        ));
    }
    Ok(Json(discrepancy_res(status)))
}

#[utoipa::path(
    post,
    path = "/extract",
    request_body = ExtractReq,
    responses(
        (status = 200, description = "Best-effort extracted fields", body = ExtractRes)
    )
)]
/// Scrape holder name, certificate number, and date from OCR text.
async fn extract(Json(req): Json<ExtractReq>) -> Json<ExtractRes> {
    Json(ExtractRes {
        name: extraction::extract_holder_name(&req.text),
        certificate_number: extraction::extract_certificate_number(&req.text),
        date: extraction::extract_date(&req.text),
    })
}

#[derive(serde::Deserialize)]
struct StoreDocumentParams {
    filename: Option<String>,
    kind: String,
}

#[utoipa::path(
    post,
    path = "/students/{id}/documents",
    params(
        ("id" = String, Path, description = "Student id"),
        ("filename" = Option<String>, Query, description = "Original filename"),
        ("kind" = String, Query, description = "pilot_certificate or medical_certificate")
    ),
    request_body = Vec<u8>,
    responses(
        (status = 200, description = "Document stored", body = DocumentRes),
        (status = 404, description = "Student not found"),
        (status = 409, description = "Identical content already stored")
    )
)]
/// Store a captured document photo in content-addressed storage.
async fn store_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<StoreDocumentParams>,
    body: Bytes,
) -> Result<Json<DocumentRes>, ApiError> {
    let id = parse_student_id(&id)?;
    let kind = DocumentKind::parse(&params.kind)
        .map_err(|_| (StatusCode::BAD_REQUEST, "Unknown document kind"))?;
    let documents = DocumentsService::new(&state.students_dir, id)
        .map_err(|_| (StatusCode::NOT_FOUND, "Student not found"))?;
    let filename = params.filename.as_deref().unwrap_or("capture");
    let metadata = documents.add_bytes(&body, filename, kind).map_err(|e| {
        if matches!(e, FilesError::DocumentAlreadyExists(_)) {
            (StatusCode::CONFLICT, "Identical content already stored")
        } else {
            tracing::error!("Document store error: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        }
    })?;
    Ok(Json(document_res(&metadata)))
}

#[utoipa::path(
    get,
    path = "/students/{id}/documents",
    params(("id" = String, Path, description = "Student id")),
    responses(
        (status = 200, description = "Stored documents", body = ListDocumentsRes),
        (status = 404, description = "Student not found")
    )
)]
/// List metadata for a student's stored document photos.
async fn list_documents(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ListDocumentsRes>, ApiError> {
    let id = parse_student_id(&id)?;
    let service = DocumentsService::new(&state.students_dir, id)
        .map_err(|_| (StatusCode::NOT_FOUND, "Student not found"))?;
    let documents = service
        .list()
        .map_err(|e| {
            tracing::error!("Document list error: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        })?
        .iter()
        .map(document_res)
        .collect();
    Ok(Json(ListDocumentsRes { documents }))
}

fn student_res(profile: &StudentProfile) -> StudentRes {
    StudentRes {
        id: profile.id.to_string(),
        display_name: profile.display_name.clone(),
        created_at: profile.created_at.to_rfc3339(),
    }
}

fn checklist_res(sections: Vec<SectionView>) -> ChecklistRes {
    ChecklistRes {
        sections: sections
            .into_iter()
            .map(|section| SectionRes {
                title: section.title,
                items: section
                    .items
                    .into_iter()
                    .map(|item| ItemRes {
                        id: item.id,
                        title: item.title,
                        detail: item.detail,
                        kind: match item.kind {
                            ItemKind::Task => ItemKindRes::Task,
                            ItemKind::CertificateName => ItemKindRes::CertificateName,
                            ItemKind::MedicalName => ItemKindRes::MedicalName,
                        },
                        completed: item.completed,
                        value: item.value,
                    })
                    .collect(),
            })
            .collect(),
    }
}

fn discrepancy_res(status: DiscrepancyStatus) -> DiscrepancyRes {
    DiscrepancyRes {
        state: match status.state {
            CoordinatorState::Unevaluated => CoordinatorStateRes::Unevaluated,
            CoordinatorState::Resolved => CoordinatorStateRes::Resolved,
            CoordinatorState::PendingMiddleNameAck => CoordinatorStateRes::PendingMiddleNameAck,
            CoordinatorState::PendingGeneralAck => CoordinatorStateRes::PendingGeneralAck,
            CoordinatorState::Acknowledged => CoordinatorStateRes::Acknowledged,
        },
        classification: match status.classification {
            DiscrepancyClassification::Match => ClassificationRes::Match,
            DiscrepancyClassification::MiddleNameOnly => ClassificationRes::MiddleNameOnly,
            DiscrepancyClassification::General => ClassificationRes::General,
            DiscrepancyClassification::Indeterminate => ClassificationRes::Indeterminate,
        },
        certificate_name_gate: status.gates.certificate_name_gate,
        medical_name_gate: status.gates.medical_name_gate,
        show_general_dialog: status.dialogs.show_general_dialog,
        show_middle_name_dialog: status.dialogs.show_middle_name_dialog,
    }
}

fn document_res(metadata: &DocumentMetadata) -> DocumentRes {
    DocumentRes {
        hash: metadata.hash.to_string(),
        kind: metadata.kind.as_str().to_owned(),
        relative_path: metadata.relative_path.as_str().to_owned(),
        size_bytes: metadata.size_bytes,
        media_type: metadata.media_type.as_ref().map(|m| m.as_str().to_owned()),
        original_filename: metadata.original_filename.as_str().to_owned(),
        stored_at: metadata.stored_at.to_rfc3339(),
    }
}
