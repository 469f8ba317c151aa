//! Round trips against a real server.
//!
//! Skipped unless `MONGOLAYER_TEST_URI` is set. Transaction tests additionally need
//! `MONGOLAYER_TEST_REPLICA_SET=1` since standalone servers reject transactions.
#![cfg(feature = "mongodb")]

use std::env;

use futures::FutureExt;
use mongolayer::{
    bson::Document as BsonDocument,
    mongodb::{DocumentIndexes, IndexManager, MongoClient, Repository, TransactionalRepository},
    prelude::*,
};
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};

const TEST_URI_ENV: &str = "MONGOLAYER_TEST_URI";
const REPLICA_SET_ENV: &str = "MONGOLAYER_TEST_REPLICA_SET";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Article {
    #[serde(flatten)]
    pub base: BaseDocument,
    pub title: String,
    pub status: String,
    pub view_count: i64,
    pub tags: Vec<String>,
}

impl Document for Article {
    fn collection_name() -> &'static str {
        "articles"
    }

    fn base(&self) -> &BaseDocument {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseDocument {
        &mut self.base
    }

    fn indexes() -> Vec<IndexDefinition> {
        vec![
            IndexDefinition::ascending("status").named("idx_status"),
            IndexDefinition::compound([("status", SortDirection::Asc), ("created_at", SortDirection::Desc)])
                .named("idx_status_created_at"),
            IndexDefinition::text(["title"]).named("idx_title_text"),
        ]
    }
}

#[derive(UpdateSet)]
pub struct ArticlePatch {
    #[bson = "title,omitempty"]
    pub title: String,
    #[bson = "status,omitempty"]
    pub status: String,
}

fn article(title: &str, status: &str, view_count: i64) -> Article {
    Article {
        title: title.to_string(),
        status: status.to_string(),
        view_count,
        ..Default::default()
    }
}

async fn connect() -> Option<MongoClient> {
    let uri = env::var(TEST_URI_ENV).ok()?;
    let config = ClientConfig::builder()
        .uri(uri)
        .database(format!("mongolayer_test_{}", ObjectId::new()))
        .build();

    Some(MongoClient::connect(config).await.expect("failed to connect to test server"))
}

async fn cleanup(client: MongoClient) {
    client.database().drop().await.expect("failed to drop test database");
    client.close().await;
}

#[tokio::test]
async fn insert_find_update_delete() {
    let Some(client) = connect().await else {
        return;
    };
    let articles = Repository::<Article>::new(&client);

    let mut draft = article("Rust", "draft", 0);
    let id = articles.insert_one(&mut draft).await.unwrap();
    assert_eq!(draft.id(), Some(id));

    let stored = articles.find_by_id(id).await.unwrap();
    assert_eq!(stored.title, "Rust");

    let patch = ArticlePatch { title: String::new(), status: "published".into() };
    let result = articles.update_fields_by_id(id, &patch).await.unwrap().unwrap();
    assert_eq!(result.modified_count, 1);

    let empty = ArticlePatch { title: String::new(), status: String::new() };
    assert!(articles.update_fields_by_id(id, &empty).await.unwrap().is_none());

    let updated = articles.find_by_id(id).await.unwrap();
    assert_eq!(updated.status, "published");
    assert_eq!(updated.title, "Rust");
    assert!(updated.updated_at() >= stored.updated_at());

    assert!(articles.exists(doc! { "status": "published" }).await.unwrap());
    assert_eq!(articles.delete_by_id(id).await.unwrap().deleted_count, 1);

    let err = articles.find_by_id(id).await.unwrap_err();
    assert!(matches!(err, DocumentStoreError::DocumentNotFound(name) if name == "articles"));

    cleanup(client).await;
}

#[tokio::test]
async fn query_and_paginate() {
    let Some(client) = connect().await else {
        return;
    };
    let articles = Repository::<Article>::new(&client);

    let mut batch: Vec<Article> = (0..5).map(|n| article(&format!("post {n}"), "published", n)).collect();
    batch.push(article("hidden", "draft", 100));
    let ids = articles.insert_many(&mut batch).await.unwrap();
    assert_eq!(ids.len(), 6);
    assert_eq!(batch[0].id(), Some(ids[0]));

    let popular = articles
        .query(
            &Query::builder()
                .filter(Filter::eq("status", "published").and(Filter::gte("view_count", 2)))
                .sort("view_count", SortDirection::Desc)
                .limit(2)
                .build(),
        )
        .await
        .unwrap();
    let counts: Vec<i64> = popular.iter().map(|a| a.view_count).collect();
    assert_eq!(counts, vec![4, 3]);

    let page = articles
        .find_with_pagination(doc! { "status": "published" }, PaginationParams::new(2, 2))
        .await
        .unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.pagination.total, 5);
    assert_eq!(page.pagination.total_page, 3);
    assert_eq!(page.next_page(), Some(3));

    let counts: Vec<BsonDocument> = articles
        .aggregate(vec![doc! { "$group": { "_id": "$status", "n": { "$sum": 1 } } }, doc! { "$sort": { "_id": 1 } }])
        .await
        .unwrap();
    assert_eq!(counts, vec![doc! { "_id": "draft", "n": 1 }, doc! { "_id": "published", "n": 5 }]);

    cleanup(client).await;
}

#[tokio::test]
async fn declared_indexes() {
    let Some(client) = connect().await else {
        return;
    };

    let names = DocumentIndexes::new(&client).ensure_indexes::<Article>().await.unwrap();
    assert_eq!(names, vec!["idx_status", "idx_status_created_at", "idx_title_text"]);

    let indexes = IndexManager::new(&client, Article::collection_name());
    assert!(indexes.index_exists("idx_status").await.unwrap());

    indexes.drop_index("idx_status").await.unwrap();
    assert!(!indexes.index_exists("idx_status").await.unwrap());

    cleanup(client).await;
}

#[tokio::test]
async fn transaction_commits_both_writes() {
    if env::var(REPLICA_SET_ENV).is_err() {
        return;
    }
    let Some(client) = connect().await else {
        return;
    };
    // Collections cannot be created implicitly inside older server transactions.
    client.database().create_collection(Article::collection_name()).await.unwrap();

    let articles = TransactionalRepository::<Article>::new(&client);
    let ids = articles
        .with_transaction(|session, repository| {
            async move {
                let mut sessioned = repository.in_session(session);
                let first = sessioned.insert_one(&mut article("a", "draft", 0)).await?;
                let second = sessioned.insert_one(&mut article("b", "draft", 0)).await?;
                Ok((first, second))
            }
            .boxed()
        })
        .await
        .unwrap();

    assert_eq!(articles.repository().count(doc! {}).await.unwrap(), 2);
    assert!(articles.repository().find_by_id(ids.0).await.is_ok());

    cleanup(client).await;
}
