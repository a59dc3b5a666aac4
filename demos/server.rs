//! Example server: a relational `notes` resource and a document `memos`
//! resource under API_PREFIX, plus the common routes.

use axum::Router;
use crud_sdk::repository::{document, sql};
use crud_sdk::{
    common_routes_with_ready, init_tracing, CrudEndpoints, DocumentRepository, Mapper, Model, ModelMapper, Settings,
    SqlRepository,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Note {
    #[serde(default)]
    id: Option<i64>,
    value: String,
}

impl Model for Note {
    type Id = i64;
    const COLLECTION: &'static str = "note";
    const FIELDS: &'static [&'static str] = &["id", "value"];

    fn id(&self) -> Option<&i64> {
        self.id.as_ref()
    }

    fn overwrite_with(&mut self, patch: Self) {
        self.value = patch.value;
    }
}

#[derive(Deserialize)]
struct NoteCreate {
    value: String,
}

#[derive(Serialize)]
struct NoteRead {
    id: i64,
    value: String,
}

struct NoteMapper;

impl Mapper for NoteMapper {
    type Model = Note;
    type Create = NoteCreate;
    type Read = NoteRead;

    fn to_model(create: NoteCreate) -> Note {
        Note {
            id: None,
            value: create.value,
        }
    }

    fn to_read(model: Note) -> NoteRead {
        NoteRead {
            id: model.id.unwrap_or_default(),
            value: model.value,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Memo {
    #[serde(default)]
    id: Option<String>,
    title: String,
    #[serde(default)]
    body: Option<String>,
}

impl Model for Memo {
    type Id = String;
    const COLLECTION: &'static str = "memo";
    const FIELDS: &'static [&'static str] = &["id", "title", "body"];

    fn id(&self) -> Option<&String> {
        self.id.as_ref()
    }

    fn overwrite_with(&mut self, patch: Self) {
        self.title = patch.title;
        self.body = patch.body;
    }
}

fn note_table_ddl(database_url: &str) -> &'static str {
    if database_url.starts_with("postgres") {
        r#"CREATE TABLE IF NOT EXISTS "note" ("id" BIGSERIAL PRIMARY KEY, "value" TEXT NOT NULL)"#
    } else {
        r#"CREATE TABLE IF NOT EXISTS "note" ("id" INTEGER PRIMARY KEY AUTOINCREMENT, "value" TEXT NOT NULL)"#
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;
    init_tracing("crud_sdk=info");

    let pool = sql::connect(&settings.database_url, settings.pool_size()).await?;
    sqlx::query(note_table_ddl(&settings.database_url))
        .execute(&pool)
        .await?;
    let db = document::open(settings.document_path.as_deref())?;

    let notes = CrudEndpoints::<NoteMapper, _>::new(
        &format!("{}/notes", settings.api_prefix),
        SqlRepository::<Note>::new(pool.clone())?,
    )
    .with_body_limit(settings.body_limit)
    .with_default_page_size(settings.default_page_size);
    let memos = CrudEndpoints::<ModelMapper<Memo>, _>::new(
        &format!("{}/memos", settings.api_prefix),
        DocumentRepository::<Memo>::new(&db)?,
    )
    .with_body_limit(settings.body_limit)
    .with_default_page_size(settings.default_page_size);

    let app = Router::new()
        .merge(common_routes_with_ready(pool))
        .merge(notes.router())
        .merge(memos.router());

    let listener = TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
