use crud_sdk::repository::sql;
use crud_sdk::{CrudRepository, DataError, Model, PageRequest, PagingRepository, Sort, SqlRepository, UnitOfWork};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct Item {
    #[serde(default)]
    id: Option<i64>,
    name: String,
    rank: Option<i64>,
}

impl Model for Item {
    type Id = i64;
    const COLLECTION: &'static str = "item";
    const FIELDS: &'static [&'static str] = &["id", "name", "rank"];

    fn id(&self) -> Option<&i64> {
        self.id.as_ref()
    }

    fn overwrite_with(&mut self, patch: Self) {
        self.name = patch.name;
        self.rank = patch.rank;
    }
}

fn item(name: &str, rank: i64) -> Item {
    Item {
        id: None,
        name: name.into(),
        rank: Some(rank),
    }
}

async fn repository() -> SqlRepository<Item> {
    let pool = sql::connect("sqlite::memory:", 1).await.unwrap();
    sqlx::query(r#"CREATE TABLE "item" ("id" INTEGER PRIMARY KEY AUTOINCREMENT, "name" TEXT NOT NULL, "rank" INTEGER)"#)
        .execute(&pool)
        .await
        .unwrap();
    SqlRepository::new(pool).unwrap()
}

async fn seeded() -> SqlRepository<Item> {
    let repo = repository().await;
    repo.save_all(vec![item("b", 2), item("a", 3), item("c", 1)]).await.unwrap();
    repo
}

#[tokio::test]
async fn save_assigns_ids_and_reloads() {
    let repo = repository().await;
    let saved = repo.save(item("a", 1)).await.unwrap();
    assert_eq!(saved.id, Some(1));
    assert_eq!(repo.find_by_id(&1).await.unwrap(), Some(saved));
    assert!(repo.exists_by_id(&1).await.unwrap());
    assert!(!repo.exists_by_id(&2).await.unwrap());
    assert_eq!(repo.find_by_id(&2).await.unwrap(), None);
}

#[tokio::test]
async fn save_with_id_replaces_or_inserts() {
    let repo = seeded().await;
    let replaced = repo
        .save(Item {
            id: Some(1),
            name: "b2".into(),
            rank: None,
        })
        .await
        .unwrap();
    assert_eq!(replaced.rank, None);
    assert_eq!(repo.count().await.unwrap(), 3);

    let inserted = repo
        .save(Item {
            id: Some(10),
            name: "z".into(),
            rank: Some(9),
        })
        .await
        .unwrap();
    assert_eq!(inserted.id, Some(10));
    assert_eq!(repo.count().await.unwrap(), 4);
}

#[tokio::test]
async fn find_all_honours_sort() {
    let repo = seeded().await;
    let names = |items: Vec<Item>| items.into_iter().map(|i| i.name).collect::<Vec<_>>();

    let unsorted = repo.find_all(None).await.unwrap();
    assert_eq!(unsorted.len(), 3);

    let sort: Sort = "rank.desc".parse().unwrap();
    assert_eq!(names(repo.find_all(Some(&sort)).await.unwrap()), vec!["a", "b", "c"]);

    let sort = Sort::by(["name"]);
    assert_eq!(names(repo.find_all(Some(&sort)).await.unwrap()), vec!["a", "b", "c"]);

    let sort = Sort::by(["colour"]);
    assert!(matches!(
        repo.find_all(Some(&sort)).await,
        Err(DataError::UnknownSortKey { .. })
    ));
}

#[tokio::test]
async fn find_page_windows_and_counts() {
    let repo = seeded().await;
    let sort = Sort::by(["rank"]);
    let page = repo
        .find_page(&PageRequest::new(1, 2).unwrap(), Some(&sort))
        .await
        .unwrap();
    assert_eq!(page.content().len(), 1);
    assert_eq!(page.content()[0].name, "a");
    assert_eq!(page.total_elements(), Some(3));
    assert_eq!(page.total_pages(), 2);
    assert!(page.is_last());

    let page = repo
        .find_page(&PageRequest::new(5, 2).unwrap(), None)
        .await
        .unwrap();
    assert!(!page.has_content());
    assert_eq!(page.total_elements(), Some(3));
}

#[tokio::test]
async fn bulk_lookups_and_deletes() {
    let repo = seeded().await;
    let found = repo.find_all_by_id(&[3, 1, 42]).await.unwrap();
    let ids: Vec<i64> = found.iter().filter_map(|i| i.id).collect();
    assert_eq!(ids, vec![1, 3]);
    assert!(repo.find_all_by_id(&[]).await.unwrap().is_empty());

    repo.delete_all_by_id(&[1, 2]).await.unwrap();
    assert_eq!(repo.count().await.unwrap(), 1);

    repo.delete_by_id(&3).await.unwrap();
    repo.delete_by_id(&3).await.unwrap();
    assert_eq!(repo.count().await.unwrap(), 0);

    repo.save(item("d", 4)).await.unwrap();
    repo.delete_all().await.unwrap();
    assert_eq!(repo.count().await.unwrap(), 0);
}

#[tokio::test]
async fn uncommitted_session_rolls_back() {
    let repo = seeded().await;

    let session = repo.begin().await.unwrap();
    session.save(item("x", 0)).await.unwrap();
    session.delete_by_id(&1).await.unwrap();
    assert_eq!(session.count().await.unwrap(), 3);
    drop(session);
    assert_eq!(repo.count().await.unwrap(), 3);
    assert!(repo.exists_by_id(&1).await.unwrap());

    let session = repo.begin().await.unwrap();
    session.save(item("y", 0)).await.unwrap();
    session.commit().await.unwrap();
    assert_eq!(repo.count().await.unwrap(), 4);
}

#[tokio::test]
async fn save_all_is_all_or_nothing() {
    let pool = sql::connect("sqlite::memory:", 1).await.unwrap();
    sqlx::query(
        r#"CREATE TABLE "item" ("id" INTEGER PRIMARY KEY AUTOINCREMENT, "name" TEXT NOT NULL, "rank" INTEGER CHECK ("rank" >= 0))"#,
    )
    .execute(&pool)
    .await
    .unwrap();
    let repo = SqlRepository::<Item>::new(pool).unwrap();

    let result = repo.save_all(vec![item("ok", 1), item("negative", -1)]).await;
    assert!(matches!(result, Err(DataError::Sql(_))));
    assert_eq!(repo.count().await.unwrap(), 0);

    repo.save_all(vec![item("ok", 1), item("zero", 0)]).await.unwrap();
    assert_eq!(repo.count().await.unwrap(), 2);
}

#[derive(Clone, Serialize, Deserialize)]
struct BadName {
    id: Option<i64>,
}

impl Model for BadName {
    type Id = i64;
    const COLLECTION: &'static str = "bad name";
    const FIELDS: &'static [&'static str] = &["id"];

    fn id(&self) -> Option<&i64> {
        self.id.as_ref()
    }

    fn overwrite_with(&mut self, _patch: Self) {}
}

#[tokio::test]
async fn rejects_invalid_declarations() {
    let pool = sql::connect("sqlite::memory:", 1).await.unwrap();
    assert!(matches!(
        SqlRepository::<BadName>::new(pool),
        Err(DataError::InvalidArgument(_))
    ));
}
