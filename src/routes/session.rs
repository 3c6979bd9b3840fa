/// Session Routes
///
/// Login, logout and profile are identical for riders and captains, so they
/// are written once and mounted per role as `login::<User>`,
/// `login::<Captain>` and so on.

use actix_web::{web, HttpRequest, HttpResponse};
use lazy_static::lazy_static;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::auth::{
    extract_session_token, hash_password, hash_password_async, removal_cookie, session_cookie,
    verify_password_async,
};
use crate::configuration::ApplicationSettings;
use crate::domain::{Actor, ActorDraft};
use crate::error::{AppError, AuthError, ErrorContext, ValidationError};
use crate::middleware::SessionVerifier;
use crate::validators::{parse_email, FieldErrors};

lazy_static! {
    // Checked against when the email is unknown, so a miss costs the same
    // bcrypt work as a wrong password.
    static ref UNKNOWN_ACCOUNT_HASH: String =
        hash_password("unknown-account-placeholder").unwrap_or_default();
}

/// `fullname` block shared by both registration payloads
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct FullNameInput {
    pub firstname: String,
    pub lastname: Option<String>,
}

/// Login request, same shape for both roles
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `{ "<role>": actor }`, plus `"token"` when one was issued.
fn actor_body<A: Actor>(actor: &A, token: Option<&str>) -> Result<Value, AppError> {
    let mut body = Map::new();
    body.insert(
        A::ROLE.key().to_string(),
        serde_json::to_value(actor)
            .map_err(|e| AppError::Internal(format!("Failed to serialize actor: {}", e)))?,
    );
    if let Some(token) = token {
        body.insert("token".to_string(), Value::String(token.to_string()));
    }
    Ok(Value::Object(body))
}

/// Persist a validated draft and hand back a fresh session token.
///
/// The `email_exists` pre-check only gives the common case a clean answer.
/// Two racing registrations can both pass it; the store's unique constraint
/// then rejects the loser with the same "email already in use" error.
pub(crate) async fn complete_registration<A: Actor>(
    draft: A::Draft,
    password: String,
    verifier: &SessionVerifier<A>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new(format!("{}_registration", A::ROLE));

    if verifier.actors().email_exists(draft.email()).await? {
        let err = AppError::email_in_use();
        context.log_error(&err);
        return Err(err);
    }

    let password_hash = hash_password_async(password).await?;
    let actor = verifier.actors().insert(draft, password_hash).await?;
    let token = verifier.keys().issue(actor.id(), actor.email())?;

    tracing::info!(
        request_id = %context.request_id,
        actor_id = %actor.id(),
        role = %A::ROLE,
        "Actor registered successfully"
    );

    Ok(HttpResponse::Created().json(actor_body(&actor, Some(&token))?))
}

/// POST /{users,captains}/login
///
/// # Errors
/// - 400: Validation error (missing/invalid email, missing password)
/// - 400: Invalid email or password
/// - 500: Internal server error
///
/// # Security Notes
/// - Unknown email and wrong password produce the same status and message
/// - Both paths run one bcrypt verification
pub async fn login<A: Actor>(
    form: web::Json<LoginRequest>,
    verifier: web::Data<SessionVerifier<A>>,
    app_config: web::Data<ApplicationSettings>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();
    let context = ErrorContext::new(format!("{}_login", A::ROLE));

    let mut errors = FieldErrors::new();
    let email = errors.check(parse_email(&form.email));
    if form.password.is_empty() {
        errors.check::<()>(Err(ValidationError::EmptyField("password".to_string())));
    }
    let email = errors.into_result(email)?;

    let credentials = verifier.actors().find_credentials_by_email(&email).await?;

    let credentials = match credentials {
        Some(credentials) => credentials,
        None => {
            let _ = verify_password_async(form.password, UNKNOWN_ACCOUNT_HASH.clone()).await;
            let err = AppError::Auth(AuthError::InvalidCredentials);
            context.log_error(&err);
            return Err(err);
        }
    };

    if !verify_password_async(form.password, credentials.password_hash).await? {
        let err = AppError::Auth(AuthError::InvalidCredentials);
        context
            .clone()
            .with_actor_id(credentials.actor.id().to_string())
            .log_error(&err);
        return Err(err);
    }

    let actor = credentials.actor;
    let token = verifier.keys().issue(actor.id(), actor.email())?;

    tracing::info!(
        request_id = %context.request_id,
        actor_id = %actor.id(),
        role = %A::ROLE,
        "Actor logged in successfully"
    );

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(
            token.clone(),
            verifier.keys().expiry_seconds(),
            app_config.secure_cookies,
        ))
        .json(actor_body(&actor, Some(&token))?))
}

/// GET /{users,captains}/profile
///
/// Runs behind `SessionGuard`, which has already put the actor into the
/// request extensions.
///
/// # Errors
/// - 401: Missing, invalid or revoked token (from the guard)
/// - 404: Actor missing
pub async fn profile<A: Actor>(actor: Option<web::ReqData<A>>) -> Result<HttpResponse, AppError> {
    let actor = actor
        .map(|a| a.into_inner())
        .ok_or_else(|| AppError::not_found(A::ROLE.not_found_message()))?;

    Ok(HttpResponse::Ok().json(actor_body(&actor, None)?))
}

/// POST /{users,captains}/logout
///
/// Adds the presented token to the revocation ledger and clears the cookie.
/// The token must be genuine for this role, but it may already be revoked:
/// logging out twice with the same token succeeds both times.
///
/// # Errors
/// - 401: No token, or a token not signed with this role's secret
pub async fn logout<A: Actor>(
    req: HttpRequest,
    verifier: web::Data<SessionVerifier<A>>,
) -> Result<HttpResponse, AppError> {
    let token = extract_session_token(&req).ok_or(AppError::Auth(AuthError::MissingToken))?;
    let claims = verifier.keys().verify(&token)?;

    verifier.ledger().revoke(&token).await?;

    tracing::info!(actor_id = %claims.id, role = %A::ROLE, "Actor logged out");

    Ok(HttpResponse::Ok()
        .cookie(removal_cookie())
        .json(json!({ "message": "Logged out" })))
}
