use crud_sdk::repository::document;
use crud_sdk::{CrudRepository, DataError, DocumentRepository, Model, PageRequest, PagingRepository, Sort, UnitOfWork};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct Doc {
    #[serde(default)]
    id: Option<String>,
    name: String,
    score: Option<f64>,
}

impl Model for Doc {
    type Id = String;
    const COLLECTION: &'static str = "doc";
    const FIELDS: &'static [&'static str] = &["id", "name", "score"];

    fn id(&self) -> Option<&String> {
        self.id.as_ref()
    }

    fn overwrite_with(&mut self, patch: Self) {
        self.name = patch.name;
        self.score = patch.score;
    }
}

fn doc(name: &str, score: Option<f64>) -> Doc {
    Doc {
        id: None,
        name: name.into(),
        score,
    }
}

fn repository() -> (sled::Db, DocumentRepository<Doc>) {
    let db = document::open(None).unwrap();
    let repo = DocumentRepository::new(&db).unwrap();
    (db, repo)
}

#[tokio::test]
async fn save_generates_string_ids() {
    let (_db, repo) = repository();
    let saved = repo.save(doc("a", Some(1.0))).await.unwrap();
    let id = saved.id.clone().unwrap();
    assert!(uuid::Uuid::parse_str(&id).is_ok());
    assert_eq!(repo.find_by_id(&id).await.unwrap(), Some(saved));
    assert!(repo.exists_by_id(&id).await.unwrap());
    assert_eq!(repo.find_by_id(&"missing".to_string()).await.unwrap(), None);
}

#[tokio::test]
async fn stores_identity_under_document_id() {
    let (_db, repo) = repository();
    let saved = repo.save(doc("a", None)).await.unwrap();
    let key = saved.id.unwrap();
    let raw = repo.tree().get(key.as_bytes()).unwrap().unwrap();
    let stored: Value = serde_json::from_slice(&raw).unwrap();
    assert_eq!(stored[document::DOCUMENT_ID], key.as_str());
    assert!(stored.get("id").is_none());
}

#[tokio::test]
async fn save_with_id_replaces_whole_document() {
    let (_db, repo) = repository();
    let saved = repo.save(doc("a", Some(1.0))).await.unwrap();
    let replaced = repo
        .save(Doc {
            id: saved.id.clone(),
            name: "b".into(),
            score: None,
        })
        .await
        .unwrap();
    assert_eq!(replaced.id, saved.id);
    assert_eq!(replaced.score, None);
    assert_eq!(repo.count().await.unwrap(), 1);
}

#[tokio::test]
async fn sorts_and_pages_in_memory() {
    let (_db, repo) = repository();
    repo.save_all(vec![
        doc("b", Some(2.0)),
        doc("a", Some(3.0)),
        doc("c", None),
        doc("d", Some(1.5)),
    ])
    .await
    .unwrap();

    let names = |docs: &[Doc]| docs.iter().map(|d| d.name.clone()).collect::<Vec<_>>();

    let sort: Sort = "score.des".parse().unwrap();
    let all = repo.find_all(Some(&sort)).await.unwrap();
    assert_eq!(names(&all), vec!["a", "b", "d", "c"]);

    let sort = Sort::by(["score"]);
    let page = repo
        .find_page(&PageRequest::new(0, 3).unwrap(), Some(&sort))
        .await
        .unwrap();
    assert_eq!(names(page.content()), vec!["c", "d", "b"]);
    assert_eq!(page.total_elements(), Some(4));
    assert_eq!(page.total_pages(), 2);

    let past_end = repo
        .find_page(&PageRequest::new(7, 3).unwrap(), None)
        .await
        .unwrap();
    assert!(!past_end.has_content());
    assert_eq!(past_end.total_elements(), Some(repo.count().await.unwrap()));

    let sort = Sort::by(["colour"]);
    assert!(matches!(
        repo.find_page(&PageRequest::default(), Some(&sort)).await,
        Err(DataError::UnknownSortKey { .. })
    ));
}

#[tokio::test]
async fn deletes() {
    let (_db, repo) = repository();
    let saved = repo
        .save_all(vec![doc("a", None), doc("b", None), doc("c", None)])
        .await
        .unwrap();
    let ids: Vec<String> = saved.iter().filter_map(|d| d.id.clone()).collect();
    assert_eq!(ids.len(), 3);

    assert_eq!(repo.find_all_by_id(&ids[..2]).await.unwrap().len(), 2);

    repo.delete_all_by_id(&ids[..2]).await.unwrap();
    assert_eq!(repo.count().await.unwrap(), 1);

    repo.delete_by_id(&ids[2]).await.unwrap();
    assert!(!repo.exists_by_id(&ids[2]).await.unwrap());

    repo.save(doc("d", None)).await.unwrap();
    repo.delete_all().await.unwrap();
    assert_eq!(repo.count().await.unwrap(), 0);
}

#[tokio::test]
async fn commit_flushes() {
    let (_db, repo) = repository();
    let session = repo.begin().await.unwrap();
    session.save(doc("a", None)).await.unwrap();
    session.commit().await.unwrap();
    assert_eq!(repo.count().await.unwrap(), 1);
}

#[derive(Clone, Serialize, Deserialize)]
struct Numbered {
    id: Option<i64>,
}

impl Model for Numbered {
    type Id = i64;
    const COLLECTION: &'static str = "numbered";
    const FIELDS: &'static [&'static str] = &["id"];

    fn id(&self) -> Option<&i64> {
        self.id.as_ref()
    }

    fn overwrite_with(&mut self, _patch: Self) {}
}

#[test]
fn rejects_non_string_ids() {
    let db = document::open(None).unwrap();
    assert!(matches!(
        DocumentRepository::<Numbered>::new(&db),
        Err(DataError::InvalidArgument(_))
    ));
}
