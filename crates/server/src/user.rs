//! Accounts: the users table, password hashing and registration.

use api_types::{
    Envelope,
    user::{Register, Registered},
};
use axum::{Json, extract::State, http::StatusCode};
use engine::EngineError;
use sea_orm::{ActiveValue, entity::prelude::*};
use sha2::{Digest, Sha256};

use crate::{ServerError, extract::AppJson, server::ServerState};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub username: String,
    pub password_hash: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Hex SHA-256 of the password salted with the username.
pub(crate) fn hash_password(username: &str, password: &str) -> String {
    let digest = Sha256::digest(format!("{username}:{password}").as_bytes());
    format!("{digest:x}")
}

/// Look up `username` and check `password` against the stored hash.
pub(crate) async fn authenticate(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> Result<Option<Model>, DbErr> {
    let Some(user) = Entity::find_by_id(username).one(db).await? else {
        return Ok(None);
    };
    if user.password_hash != hash_password(username, password) {
        return Ok(None);
    }
    Ok(Some(user))
}

pub async fn register(
    State(state): State<ServerState>,
    AppJson(payload): AppJson<Register>,
) -> Result<(StatusCode, Json<Envelope<Registered>>), ServerError> {
    let username = payload.username.trim();
    if username.is_empty() || username.contains(':') {
        return Err(EngineError::InvalidName(
            "username must be non-empty and contain no ':'".to_string(),
        )
        .into());
    }
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(EngineError::InvalidName(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        ))
        .into());
    }

    if Entity::find_by_id(username).one(&state.db).await?.is_some() {
        return Err(EngineError::ExistingKey(username.to_string()).into());
    }

    ActiveModel {
        username: ActiveValue::Set(username.to_string()),
        password_hash: ActiveValue::Set(hash_password(username, &payload.password)),
    }
    .insert(&state.db)
    .await
    .map_err(|err| EngineError::on_write(err, username))?;
    tracing::info!("registered user {username}");

    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok(Registered {
            username: username.to_string(),
        })),
    ))
}
