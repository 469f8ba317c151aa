//! End-to-end tour against a running server.
//!
//! ```sh
//! MONGOLAYER_URI=mongodb://localhost:27017 RUST_LOG=info \
//!     cargo run -p mongolayer --example quickstart --features mongodb
//! ```

use futures::FutureExt;
use mongolayer::{
    mongodb::{DocumentIndexes, MongoClient, Repository, TransactionManager},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    pub first_name: String,
    pub last_name: String,
    pub avatar: String,
    pub bio: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    #[serde(flatten)]
    pub base: BaseDocument,
    pub username: String,
    pub email: String,
    pub password: String,
    pub status: String,
    pub profile: Profile,
}

impl Document for User {
    fn collection_name() -> &'static str {
        "users"
    }

    fn base(&self) -> &BaseDocument {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseDocument {
        &mut self.base
    }

    fn indexes() -> Vec<IndexDefinition> {
        vec![
            IndexDefinition::ascending("username").named("idx_username_unique").unique(),
            IndexDefinition::ascending("email").named("idx_email_unique").unique(),
            IndexDefinition::ascending("status").named("idx_status"),
            IndexDefinition::compound([("profile.first_name", SortDirection::Asc), ("profile.last_name", SortDirection::Asc)])
                .named("idx_profile_name"),
            IndexDefinition::compound([("status", SortDirection::Asc), ("created_at", SortDirection::Desc)])
                .named("idx_status_created_at"),
            IndexDefinition::text(["profile.bio"]).named("idx_profile_bio_text"),
        ]
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Article {
    #[serde(flatten)]
    pub base: BaseDocument,
    pub title: String,
    pub content: String,
    pub author_id: Option<ObjectId>,
    pub tags: Vec<String>,
    pub status: String,
    pub view_count: i64,
    pub like_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<ObjectId>,
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
            IndexDefinition::compound([
                ("category_id", SortDirection::Asc),
                ("status", SortDirection::Asc),
                ("created_at", SortDirection::Desc),
            ])
            .named("idx_category_status_created_at"),
            IndexDefinition::compound([("author_id", SortDirection::Asc), ("status", SortDirection::Asc)])
                .named("idx_author_status"),
            IndexDefinition::text(["title", "content"]).named("idx_title_content_text"),
        ]
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Category {
    #[serde(flatten)]
    pub base: BaseDocument,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ObjectId>,
    pub sort: i32,
    pub is_active: bool,
}

impl Document for Category {
    fn collection_name() -> &'static str {
        "categories"
    }

    fn base(&self) -> &BaseDocument {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseDocument {
        &mut self.base
    }

    fn indexes() -> Vec<IndexDefinition> {
        vec![IndexDefinition::ascending("name").named("idx_name_unique").unique()]
    }
}

/// Changes applied to a user by the profile form.
#[derive(Debug, Default, UpdateSet)]
pub struct UserPatch {
    #[bson = "status,omitempty"]
    pub status: String,
    #[bson = "profile.bio,omitempty"]
    pub bio: String,
    #[bson = "profile.avatar,omitempty"]
    pub avatar: String,
    #[bson = "-"]
    pub password: String,
}

#[tokio::main]
async fn main() -> DocumentStoreResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let client = MongoClient::connect(ClientConfig::from_env()).await?;

    let indexes = DocumentIndexes::new(&client);
    indexes.ensure_indexes::<User>().await?;
    indexes.ensure_indexes::<Article>().await?;
    indexes.ensure_indexes::<Category>().await?;
    for name in [User::collection_name(), Article::collection_name(), Category::collection_name()] {
        indexes.ensure_base_document_indexes(name).await?;
    }

    let users = Repository::<User>::new(&client);
    let articles = Repository::<Article>::new(&client);
    let categories = Repository::<Category>::new(&client);

    let mut john = User {
        username: format!("john_{}", ObjectId::new()),
        email: format!("john_{}@example.com", ObjectId::new()),
        password: "hashed".into(),
        status: "active".into(),
        profile: Profile {
            first_name: "John".into(),
            last_name: "Doe".into(),
            bio: "Software Developer".into(),
            ..Default::default()
        },
        ..Default::default()
    };
    let john_id = users.insert_one(&mut john).await?;
    tracing::info!(id = %john_id, username = %john.username, "inserted user");

    let patch = UserPatch {
        status: "premium".into(),
        bio: "Senior Software Developer".into(),
        password: "never written".into(),
        ..Default::default()
    };
    tracing::info!(update = %build_update_set(&patch), "applying patch");
    users.update_fields_by_id(john_id, &patch).await?;

    let john = users.find_by_id(john_id).await?;
    tracing::info!(status = %john.status, bio = %john.profile.bio, "reloaded user");

    let mut rust = Category { name: format!("rust_{}", ObjectId::new()), is_active: true, ..Default::default() };
    let category_id = categories.insert_one(&mut rust).await?;

    let mut drafts: Vec<Article> = (1..=12)
        .map(|n| Article {
            title: format!("Ownership, part {n}"),
            content: "Borrowing rules explained".into(),
            author_id: Some(john_id),
            tags: vec!["rust".into()],
            status: if n % 3 == 0 { "draft".into() } else { "published".into() },
            view_count: n * 10,
            category_id: Some(category_id),
            ..Default::default()
        })
        .collect();
    articles.insert_many(&mut drafts).await?;

    let popular = articles
        .query(
            &Query::builder()
                .filter(
                    Filter::eq("category_id", category_id)
                        .and(Filter::eq("status", "published"))
                        .and(Filter::gte("view_count", 50_i64)),
                )
                .sort("view_count", SortDirection::Desc)
                .limit(3)
                .build(),
        )
        .await?;
    for article in &popular {
        tracing::info!(title = %article.title, views = article.view_count, "popular article");
    }

    let page = articles
        .find_with_pagination(doc! { "author_id": john_id }, PaginationParams::builder().with_page(2).with_page_size(5).build())
        .await?;
    tracing::info!(
        page = page.pagination.page,
        total = page.pagination.total,
        total_page = page.pagination.total_page,
        next = ?page.next_page(),
        "article page"
    );

    let by_status = articles
        .aggregate(vec![
            doc! { "$match": { "author_id": john_id } },
            doc! { "$group": { "_id": "$status", "count": { "$sum": 1 } } },
        ])
        .await?;
    tracing::info!(?by_status, "articles by status");

    // Transactions need a replica set; a standalone server rejects them.
    let transactions = TransactionManager::new(&client);
    let outcome = transactions
        .with_transaction(|session| {
            let users = users.clone();
            let articles = articles.clone();
            async move {
                let archived = articles
                    .in_session(session)
                    .update_one(doc! { "author_id": john_id, "status": "draft" }, doc! { "$set": { "status": "archived" } })
                    .await?;
                users
                    .in_session(session)
                    .update_by_id(john_id, doc! { "$set": { "status": "retired" } })
                    .await?;
                Ok(archived.modified_count)
            }
            .boxed()
        })
        .await;
    match outcome {
        Ok(archived) => tracing::info!(archived, "transaction committed"),
        Err(err) => tracing::warn!(error = %err, "transaction skipped"),
    }

    let retired = users.count(doc! { "status": "retired" }).await?;
    tracing::info!(retired, "retired users");

    client.close().await;
    Ok(())
}
