use crate::catalog::is_static_model_id;
use crate::db::models::{DbUserModel, UserModelCreate};
use crate::db::schema::SQLITE_INIT;
use crate::error::CinkbertError;
use chrono::Utc;
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::{str::FromStr, time::Duration};
use tracing::{debug, info};
use uuid::Uuid;

const USER_MODEL_COLUMNS: &str = "id, user_id, url_id, name, provider_model_id, subject_type, \
     supports_file_upload, is_custom, lora_path, trigger_word, created_at, updated_at";

#[derive(Debug)]
pub enum DbActorMessage {
    /// Insert a trained model, allocating a unique `url_id`.
    CreateUserModel(UserModelCreate, RpcReplyPort<Result<DbUserModel, CinkbertError>>),

    /// List one user's models, newest first.
    ListUserModels(String, RpcReplyPort<Result<Vec<DbUserModel>, CinkbertError>>),

    /// Look up a model by (user_id, url_id).
    GetUserModel(
        String,
        String,
        RpcReplyPort<Result<Option<DbUserModel>, CinkbertError>>,
    ),

    UrlIdExists(String, RpcReplyPort<Result<bool, CinkbertError>>),
}

#[derive(Clone)]
pub struct DbActorHandle {
    actor: ActorRef<DbActorMessage>,
}

impl DbActorHandle {
    pub async fn create_user_model(
        &self,
        create: UserModelCreate,
    ) -> Result<DbUserModel, CinkbertError> {
        ractor::call!(self.actor, DbActorMessage::CreateUserModel, create).map_err(|e| {
            CinkbertError::RactorError(format!("DbActor CreateUserModel RPC failed: {e}"))
        })?
    }

    pub async fn list_user_models(&self, user_id: &str) -> Result<Vec<DbUserModel>, CinkbertError> {
        ractor::call!(
            self.actor,
            DbActorMessage::ListUserModels,
            user_id.to_string()
        )
        .map_err(|e| CinkbertError::RactorError(format!("DbActor ListUserModels RPC failed: {e}")))?
    }

    pub async fn get_user_model(
        &self,
        user_id: &str,
        url_id: &str,
    ) -> Result<Option<DbUserModel>, CinkbertError> {
        ractor::call!(
            self.actor,
            DbActorMessage::GetUserModel,
            user_id.to_string(),
            url_id.to_string()
        )
        .map_err(|e| CinkbertError::RactorError(format!("DbActor GetUserModel RPC failed: {e}")))?
    }

    pub async fn url_id_exists(&self, url_id: &str) -> Result<bool, CinkbertError> {
        ractor::call!(self.actor, DbActorMessage::UrlIdExists, url_id.to_string())
            .map_err(|e| CinkbertError::RactorError(format!("DbActor UrlIdExists RPC failed: {e}")))?
    }
}

struct DbActorState {
    pool: SqlitePool,
}

struct DbActor;

#[ractor::async_trait]
impl Actor for DbActor {
    type Msg = DbActorMessage;
    type State = DbActorState;
    type Arguments = String;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        database_url: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let connect_opts = SqliteConnectOptions::from_str(database_url.as_str())
            .map_err(|e| ActorProcessingErr::from(format!("invalid database url: {e}")))?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5))
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .connect_with(connect_opts)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db connect failed: {e}")))?;

        apply_schema(&pool)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db schema init failed: {e}")))?;

        info!("DbActor initialized");
        Ok(DbActorState { pool })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            DbActorMessage::CreateUserModel(create, reply) => {
                let res = self.create_user_model(&state.pool, create).await;
                let _ = reply.send(res);
            }
            DbActorMessage::ListUserModels(user_id, reply) => {
                let res = self.list_user_models(&state.pool, &user_id).await;
                let _ = reply.send(res);
            }
            DbActorMessage::GetUserModel(user_id, url_id, reply) => {
                let res = self.get_user_model(&state.pool, &user_id, &url_id).await;
                let _ = reply.send(res);
            }
            DbActorMessage::UrlIdExists(url_id, reply) => {
                let res = url_id_taken(&state.pool, &url_id).await;
                let _ = reply.send(res);
            }
        }
        Ok(())
    }
}

impl DbActor {
    async fn create_user_model(
        &self,
        pool: &SqlitePool,
        create: UserModelCreate,
    ) -> Result<DbUserModel, CinkbertError> {
        // Allocation and insert run inside one message, so two trainings with the
        // same name cannot race for the same slug.
        let url_id = allocate_url_id(pool, &create.url_id).await?;
        let now = Utc::now();

        let row = sqlx::query_as::<_, DbUserModel>(&format!(
            r#"
        INSERT INTO user_models (
            id, user_id, url_id, name, provider_model_id, subject_type,
            supports_file_upload, is_custom, lora_path, trigger_word, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, 1, ?, ?, ?, ?)
        RETURNING {USER_MODEL_COLUMNS}
        "#
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(create.user_id)
        .bind(&url_id)
        .bind(create.name)
        .bind(create.provider_model_id)
        .bind(create.subject_type)
        .bind(create.supports_file_upload)
        .bind(create.lora_path)
        .bind(create.trigger_word)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await?;

        debug!(url_id = %row.url_id, user_id = %row.user_id, "user model created");
        Ok(row)
    }

    async fn list_user_models(
        &self,
        pool: &SqlitePool,
        user_id: &str,
    ) -> Result<Vec<DbUserModel>, CinkbertError> {
        let rows = sqlx::query_as::<_, DbUserModel>(&format!(
            r#"
        SELECT {USER_MODEL_COLUMNS}
        FROM user_models
        WHERE user_id = ?
        ORDER BY created_at DESC, url_id
        "#
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    async fn get_user_model(
        &self,
        pool: &SqlitePool,
        user_id: &str,
        url_id: &str,
    ) -> Result<Option<DbUserModel>, CinkbertError> {
        let row = sqlx::query_as::<_, DbUserModel>(&format!(
            r#"
        SELECT {USER_MODEL_COLUMNS}
        FROM user_models
        WHERE user_id = ? AND url_id = ?
        "#
        ))
        .bind(user_id)
        .bind(url_id)
        .fetch_optional(pool)
        .await?;

        Ok(row)
    }
}

/// Returns `preferred` when free, else `preferred-<unix millis>` (bumped until free).
async fn allocate_url_id(pool: &SqlitePool, preferred: &str) -> Result<String, CinkbertError> {
    if !is_static_model_id(preferred) && !url_id_taken(pool, preferred).await? {
        return Ok(preferred.to_string());
    }

    let mut millis = Utc::now().timestamp_millis();
    loop {
        let candidate = format!("{preferred}-{millis}");
        if !url_id_taken(pool, &candidate).await? {
            return Ok(candidate);
        }
        millis += 1;
    }
}

async fn url_id_taken(pool: &SqlitePool, url_id: &str) -> Result<bool, CinkbertError> {
    let taken: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM user_models WHERE url_id = ?)")
            .bind(url_id)
            .fetch_one(pool)
            .await?;
    Ok(taken)
}

/// Spawn the database actor and return a cloneable handle.
pub async fn spawn(database_url: &str) -> Result<DbActorHandle, CinkbertError> {
    let (actor, _jh) = ractor::Actor::spawn(
        Some(format!("DbActor:{}", Uuid::new_v4())),
        DbActor,
        database_url.to_string(),
    )
    .await
    .map_err(|e| CinkbertError::RactorError(format!("failed to spawn DbActor: {e}")))?;

    Ok(DbActorHandle { actor })
}

async fn apply_schema(pool: &SqlitePool) -> Result<(), CinkbertError> {
    for stmt in SQLITE_INIT.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(pool).await?;
    }
    Ok(())
}
