use crate::state::AppState;
use ait::instructions::{Instruction, InstructionError};
use ait::providers::configs::{ProviderType, ProvidersConfig, StoredProviderConfig};
use ait::providers::factory::create_provider_with_timeout;
use ait::store::{
    load_instruction_set, load_providers_config, save_instruction_set, save_providers_config,
    StoreError,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

fn store_failure(e: StoreError) -> Response {
    tracing::error!(error = %e, "settings store failed");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

fn instruction_failure(e: InstructionError) -> Response {
    let status = match e {
        InstructionError::Incomplete | InstructionError::EmptyId(_) => StatusCode::BAD_REQUEST,
        InstructionError::Duplicate(_) => StatusCode::CONFLICT,
        InstructionError::Builtin(_) => StatusCode::FORBIDDEN,
        InstructionError::NotFound(_) => StatusCode::NOT_FOUND,
    };
    error_response(status, e.to_string())
}

async fn get_providers(State(state): State<AppState>) -> Response {
    match load_providers_config(state.store.as_ref()).await {
        Ok(configs) => Json(configs).into_response(),
        Err(e) => store_failure(e),
    }
}

async fn put_providers(
    State(state): State<AppState>,
    Json(configs): Json<ProvidersConfig>,
) -> Response {
    match save_providers_config(state.store.as_ref(), configs.clone()).await {
        Ok(()) => {
            tracing::info!(active = %configs.active_provider, "provider settings saved");
            Json(configs).into_response()
        }
        Err(e) => store_failure(e),
    }
}

/// An unsaved provider config; absent fields fall back to the defaults.
#[derive(Debug, Deserialize)]
struct TestRequest {
    #[serde(rename = "type")]
    provider_type: ProviderType,
    #[serde(flatten)]
    overrides: StoredProviderConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct TestResponse {
    ok: bool,
    message: String,
}

async fn test_provider(
    State(state): State<AppState>,
    Json(request): Json<TestRequest>,
) -> Json<TestResponse> {
    let mut draft = ProvidersConfig {
        active_provider: request.provider_type,
        ..Default::default()
    };
    draft
        .providers
        .insert(request.provider_type, request.overrides);
    let config = draft.active();

    let outcome = match create_provider_with_timeout(config, state.request_timeout) {
        Ok(provider) => provider.test_connectivity().await,
        Err(e) => Err(e),
    };

    Json(match outcome {
        Ok(_) => TestResponse {
            ok: true,
            message: "Connection successful".to_string(),
        },
        Err(e) => {
            tracing::info!(provider = %request.provider_type, error = %e, "connectivity test failed");
            TestResponse {
                ok: false,
                message: e.to_string(),
            }
        }
    })
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstructionView {
    id: String,
    title: String,
    instruction: String,
    builtin: bool,
}

impl From<Instruction> for InstructionView {
    fn from(instruction: Instruction) -> Self {
        Self {
            builtin: instruction.is_builtin(),
            id: instruction.id,
            title: instruction.title,
            instruction: instruction.instruction_text,
        }
    }
}

#[derive(Debug, Deserialize)]
struct InstructionRequest {
    title: String,
    instruction: String,
}

async fn list_instructions(State(state): State<AppState>) -> Response {
    match load_instruction_set(state.store.as_ref()).await {
        Ok(set) => {
            let views: Vec<InstructionView> = set.all().into_iter().map(Into::into).collect();
            Json(views).into_response()
        }
        Err(e) => store_failure(e),
    }
}

async fn add_instruction(
    State(state): State<AppState>,
    Json(request): Json<InstructionRequest>,
) -> Response {
    let mut set = match load_instruction_set(state.store.as_ref()).await {
        Ok(set) => set,
        Err(e) => return store_failure(e),
    };
    let added = match set.add_custom(&request.title, &request.instruction) {
        Ok(added) => added,
        Err(e) => return instruction_failure(e),
    };
    if let Err(e) = save_instruction_set(state.store.as_ref(), set).await {
        return store_failure(e);
    }
    (StatusCode::CREATED, Json(InstructionView::from(added))).into_response()
}

async fn update_instruction(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<InstructionRequest>,
) -> Response {
    let mut set = match load_instruction_set(state.store.as_ref()).await {
        Ok(set) => set,
        Err(e) => return store_failure(e),
    };
    let updated = match set.update_custom(&id, &request.title, &request.instruction) {
        Ok(updated) => updated,
        Err(e) => return instruction_failure(e),
    };
    if let Err(e) = save_instruction_set(state.store.as_ref(), set).await {
        return store_failure(e);
    }
    Json(InstructionView::from(updated)).into_response()
}

async fn remove_instruction(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let mut set = match load_instruction_set(state.store.as_ref()).await {
        Ok(set) => set,
        Err(e) => return store_failure(e),
    };
    if let Err(e) = set.remove_custom(&id) {
        return instruction_failure(e);
    }
    match save_instruction_set(state.store.as_ref(), set).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => store_failure(e),
    }
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/settings/providers", get(get_providers).put(put_providers))
        .route("/settings/providers/test", post(test_provider))
        .route(
            "/settings/instructions",
            get(list_instructions).post(add_instruction),
        )
        .route(
            "/settings/instructions/:id",
            delete(remove_instruction).put(update_instruction),
        )
        .with_state(state)
}
