use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::Utc;
use password_hash::rand_core::OsRng;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, ConnectionTrait, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::auth::{SignInRequest, SignInResponse, SignUpRequest},
    entity::{
        Users,
        users::{ActiveModel, Column, Model as UserModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, issue_token},
    models::UserProfile,
    response::{ApiResponse, Meta},
    state::AppState,
    validation::Validate,
};

/// Advisory lock key held while a sign-up decides admin status and inserts.
const SIGN_UP_LOCK: i64 = 0x5349_474e_5550;

/// Registers a user. The very first account becomes an admin.
pub async fn sign_up(
    state: &AppState,
    payload: SignUpRequest,
) -> AppResult<ApiResponse<UserProfile>> {
    let payload = payload.normalized();
    payload.validate()?;

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(payload.password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();

    // Sign-ups are serialized by a transaction-scoped advisory lock, so the
    // "no users yet" check and the insert cannot interleave with another sign-up.
    let txn = state.orm.begin().await?;
    txn.execute_unprepared(&format!("SELECT pg_advisory_xact_lock({SIGN_UP_LOCK})"))
        .await?;

    let overlap = Users::find()
        .filter(
            Condition::any()
                .add(Column::Email.eq(payload.email.as_str()))
                .add(Column::Login.eq(payload.login.as_str()))
                .add(Column::Phone.eq(payload.phone.as_str())),
        )
        .one(&txn)
        .await?;
    if let Some(existing) = overlap {
        return Err(conflict_on(&existing, &payload));
    }

    let is_admin = Users::find().count(&txn).await? == 0;

    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(payload.email),
        login: Set(payload.login),
        phone: Set(payload.phone),
        password_hash: Set(password_hash),
        firstname: Set(payload.firstname),
        lastname: Set(payload.lastname),
        address: Set(payload.address),
        favorites: Set(Vec::new()),
        is_admin: Set(is_admin),
        created_at: Set(Utc::now().fixed_offset()),
    };
    let user = active.insert(&txn).await.map_err(unique_to_conflict)?;
    txn.commit().await?;

    tracing::info!(user_id = %user.id, is_admin, "user registered");
    Ok(ApiResponse::success(
        "Registration success",
        UserProfile::from(user),
        None,
    ))
}

pub async fn sign_in(
    state: &AppState,
    payload: SignInRequest,
) -> AppResult<ApiResponse<SignInResponse>> {
    payload.validate()?;
    let user = Users::find()
        .filter(Column::Login.eq(payload.login.trim()))
        .one(&state.orm)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    if Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        tracing::debug!(login = %user.login, "sign-in rejected");
        return Err(AppError::Unauthorized);
    }

    let token = issue_token(
        &state.config.jwt_secret,
        user.id,
        state.config.session_ttl_hours,
    )?;

    tracing::info!(user_id = %user.id, "user signed in");
    let resp = SignInResponse {
        token: format!("Bearer {}", token),
        user: UserProfile::from(user),
    };
    Ok(ApiResponse::success("Signed in", resp, Some(Meta::empty())))
}

pub async fn me(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<UserProfile>> {
    let account = current_user(state, user).await?;
    Ok(ApiResponse::success("Profile", UserProfile::from(account), None))
}

/// The caller's account; a token for a deleted account is treated as unauthenticated.
pub async fn current_user(state: &AppState, user: &AuthUser) -> AppResult<UserModel> {
    Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::Unauthorized)
}

fn conflict_on(existing: &UserModel, payload: &SignUpRequest) -> AppError {
    let field = if existing.email == payload.email {
        "email"
    } else if existing.login == payload.login {
        "login"
    } else {
        "phone"
    };
    AppError::Conflict(format!("User with such {field} already exists"))
}

// The unique indexes back the overlap check.
fn unique_to_conflict(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("User with such phone, email or login already exists".into())
        }
        _ => AppError::OrmError(err),
    }
}
