use bson::{Bson, DateTime, Document, doc, oid::ObjectId};
use futures::TryStreamExt;
use mongodb::{
    ClientSession, Collection,
    options::FindOptions,
    results::{DeleteResult, UpdateResult},
};

use mongolayer_core::{
    document::Document as StoredDocument,
    error::{DocumentStoreError, DocumentStoreResult},
    page::{Page, PaginationParams, PaginationResult},
    query::Query,
    update::{UpdateSet, build_update_set, stamp_updated_at},
};

use crate::{client::MongoClient, error::map_driver_error};

/// Typed CRUD access to the collection of `T`.
///
/// Every method is a single driver call plus the bookkeeping of the document model:
/// inserts run [`before_insert`](StoredDocument::before_insert), replacements run
/// [`before_update`](StoredDocument::before_update) and raw updates get
/// `$set.updated_at` stamped with the current time.
///
/// # Example
///
/// ```ignore
/// let users = Repository::<User>::new(&client);
///
/// let mut user = User { username: "alice".into(), ..Default::default() };
/// let id = users.insert_one(&mut user).await?;
///
/// users.update_fields_by_id(id, &UserPatch { status: "active".into() }).await?;
/// let user = users.find_by_id(id).await?;
/// ```
#[derive(Debug)]
pub struct Repository<T: StoredDocument> {
    collection: Collection<T>,
}

impl<T: StoredDocument> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self { collection: self.collection.clone() }
    }
}

impl<T: StoredDocument> Repository<T> {
    /// Binds to the collection named by [`StoredDocument::collection_name`].
    pub fn new(client: &MongoClient) -> Self {
        Self::with_collection_name(client, T::collection_name())
    }

    /// Binds to a differently named collection holding `T` documents.
    pub fn with_collection_name(client: &MongoClient, name: &str) -> Self {
        Self { collection: client.collection(name) }
    }

    /// The underlying driver collection.
    pub fn collection(&self) -> &Collection<T> {
        &self.collection
    }

    pub fn collection_name(&self) -> &str {
        self.collection.name()
    }

    /// Inserts `document` and writes its id back.
    pub async fn insert_one(&self, document: &mut T) -> DocumentStoreResult<ObjectId> {
        document.before_insert();

        let result = self
            .collection
            .insert_one(&*document)
            .await
            .map_err(map_driver_error)?;
        let id = inserted_object_id(result.inserted_id)?;
        document.set_id(id);

        Ok(id)
    }

    /// Inserts all `documents` in order and returns their ids.
    pub async fn insert_many(&self, documents: &mut [T]) -> DocumentStoreResult<Vec<ObjectId>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }
        documents.iter_mut().for_each(StoredDocument::before_insert);

        let mut result = self
            .collection
            .insert_many(documents.iter())
            .await
            .map_err(map_driver_error)?;

        (0..documents.len())
            .map(|index| {
                result
                    .inserted_ids
                    .remove(&index)
                    .ok_or_else(|| {
                        DocumentStoreError::Backend(format!("missing inserted id for document {index}"))
                    })
                    .and_then(inserted_object_id)
            })
            .collect()
    }

    /// Returns the first match, or [`DocumentStoreError::DocumentNotFound`].
    pub async fn find_one(&self, filter: Document) -> DocumentStoreResult<T> {
        self.collection
            .find_one(filter)
            .await
            .map_err(map_driver_error)?
            .ok_or_else(|| self.not_found())
    }

    pub async fn find_by_id(&self, id: ObjectId) -> DocumentStoreResult<T> {
        self.find_one(by_id(id)).await
    }

    pub async fn find(
        &self,
        filter: Document,
        options: impl Into<Option<FindOptions>>,
    ) -> DocumentStoreResult<Vec<T>> {
        self.collection
            .find(filter)
            .with_options(options)
            .await
            .map_err(map_driver_error)?
            .try_collect()
            .await
            .map_err(map_driver_error)
    }

    /// Runs a composed [`Query`].
    pub async fn query(&self, query: &Query) -> DocumentStoreResult<Vec<T>> {
        self.find(query.filter_document()?, find_options(query)).await
    }

    /// Fetches one page of matches together with the total count.
    pub async fn find_with_pagination(
        &self,
        filter: Document,
        params: PaginationParams,
    ) -> DocumentStoreResult<Page<T>> {
        let options = FindOptions::builder()
            .skip(params.offset())
            .limit(i64::try_from(params.page_size).unwrap_or(i64::MAX))
            .build();
        let items = self.find(filter.clone(), options).await?;
        let total = self.count(filter).await?;

        Ok(Page::new(items, PaginationResult::new(params, total)))
    }

    /// Applies `update` to the first match. `$set.updated_at` is refreshed.
    pub async fn update_one(&self, filter: Document, mut update: Document) -> DocumentStoreResult<UpdateResult> {
        stamp_updated_at(&mut update, DateTime::now())?;

        self.collection
            .update_one(filter, update)
            .await
            .map_err(map_driver_error)
    }

    pub async fn update_by_id(&self, id: ObjectId, update: Document) -> DocumentStoreResult<UpdateResult> {
        self.update_one(by_id(id), update).await
    }

    pub async fn update_many(&self, filter: Document, mut update: Document) -> DocumentStoreResult<UpdateResult> {
        stamp_updated_at(&mut update, DateTime::now())?;

        self.collection
            .update_many(filter, update)
            .await
            .map_err(map_driver_error)
    }

    /// Updates the document with `id`, inserting it if it does not exist.
    pub async fn upsert_by_id(&self, id: ObjectId, mut update: Document) -> DocumentStoreResult<UpdateResult> {
        stamp_updated_at(&mut update, DateTime::now())?;

        self.collection
            .update_one(by_id(id), update)
            .upsert(true)
            .await
            .map_err(map_driver_error)
    }

    /// Writes the qualifying fields of `fields` to the document with `id`.
    ///
    /// Returns `None` without contacting the server when no field qualifies.
    pub async fn update_fields_by_id<U: UpdateSet + ?Sized>(
        &self,
        id: ObjectId,
        fields: &U,
    ) -> DocumentStoreResult<Option<UpdateResult>> {
        let update = build_update_set(fields);
        if update.is_empty() {
            tracing::debug!(collection = %self.collection_name(), %id, "no fields to update");
            return Ok(None);
        }

        self.update_by_id(id, update).await.map(Some)
    }

    /// Replaces the first match with `document`.
    pub async fn replace_one(&self, filter: Document, document: &mut T) -> DocumentStoreResult<UpdateResult> {
        document.before_update();

        self.collection
            .replace_one(filter, &*document)
            .await
            .map_err(map_driver_error)
    }

    pub async fn delete_one(&self, filter: Document) -> DocumentStoreResult<DeleteResult> {
        self.collection
            .delete_one(filter)
            .await
            .map_err(map_driver_error)
    }

    pub async fn delete_by_id(&self, id: ObjectId) -> DocumentStoreResult<DeleteResult> {
        self.delete_one(by_id(id)).await
    }

    pub async fn delete_many(&self, filter: Document) -> DocumentStoreResult<DeleteResult> {
        self.collection
            .delete_many(filter)
            .await
            .map_err(map_driver_error)
    }

    pub async fn count(&self, filter: Document) -> DocumentStoreResult<u64> {
        self.collection
            .count_documents(filter)
            .await
            .map_err(map_driver_error)
    }

    /// Returns `true` if at least one document matches.
    pub async fn exists(&self, filter: Document) -> DocumentStoreResult<bool> {
        let count = self
            .collection
            .count_documents(filter)
            .limit(1)
            .await
            .map_err(map_driver_error)?;

        Ok(count > 0)
    }

    /// Runs an aggregation pipeline and collects the raw result documents.
    pub async fn aggregate(&self, pipeline: Vec<Document>) -> DocumentStoreResult<Vec<Document>> {
        self.collection
            .aggregate(pipeline)
            .await
            .map_err(map_driver_error)?
            .try_collect()
            .await
            .map_err(map_driver_error)
    }

    /// Binds this repository to `session` so every call joins its transaction.
    pub fn in_session<'s>(&'s self, session: &'s mut ClientSession) -> SessionRepository<'s, T> {
        SessionRepository { repository: self, session }
    }

    fn not_found(&self) -> DocumentStoreError {
        DocumentStoreError::DocumentNotFound(self.collection_name().to_string())
    }
}

/// A [`Repository`] whose operations run inside a client session.
pub struct SessionRepository<'s, T: StoredDocument> {
    repository: &'s Repository<T>,
    session: &'s mut ClientSession,
}

impl<T: StoredDocument> SessionRepository<'_, T> {
    pub async fn insert_one(&mut self, document: &mut T) -> DocumentStoreResult<ObjectId> {
        document.before_insert();

        let result = self.repository
            .collection
            .insert_one(&*document)
            .session(&mut *self.session)
            .await
            .map_err(map_driver_error)?;
        let id = inserted_object_id(result.inserted_id)?;
        document.set_id(id);

        Ok(id)
    }

    pub async fn find_one(&mut self, filter: Document) -> DocumentStoreResult<T> {
        self.repository.collection
            .find_one(filter)
            .session(&mut *self.session)
            .await
            .map_err(map_driver_error)?
            .ok_or_else(|| self.repository.not_found())
    }

    pub async fn find_by_id(&mut self, id: ObjectId) -> DocumentStoreResult<T> {
        self.find_one(by_id(id)).await
    }

    pub async fn find(
        &mut self,
        filter: Document,
        options: impl Into<Option<FindOptions>>,
    ) -> DocumentStoreResult<Vec<T>> {
        let mut cursor = self.repository
            .collection
            .find(filter)
            .with_options(options)
            .session(&mut *self.session)
            .await
            .map_err(map_driver_error)?;

        cursor
            .stream(&mut *self.session)
            .try_collect()
            .await
            .map_err(map_driver_error)
    }

    pub async fn update_one(&mut self, filter: Document, mut update: Document) -> DocumentStoreResult<UpdateResult> {
        stamp_updated_at(&mut update, DateTime::now())?;

        self.repository.collection
            .update_one(filter, update)
            .session(&mut *self.session)
            .await
            .map_err(map_driver_error)
    }

    pub async fn update_by_id(&mut self, id: ObjectId, update: Document) -> DocumentStoreResult<UpdateResult> {
        self.update_one(by_id(id), update).await
    }

    /// Session-bound [`Repository::update_fields_by_id`].
    pub async fn update_fields_by_id<U: UpdateSet + ?Sized>(
        &mut self,
        id: ObjectId,
        fields: &U,
    ) -> DocumentStoreResult<Option<UpdateResult>> {
        let update = build_update_set(fields);
        if update.is_empty() {
            return Ok(None);
        }

        self.update_by_id(id, update).await.map(Some)
    }

    pub async fn replace_one(&mut self, filter: Document, document: &mut T) -> DocumentStoreResult<UpdateResult> {
        document.before_update();

        self.repository.collection
            .replace_one(filter, &*document)
            .session(&mut *self.session)
            .await
            .map_err(map_driver_error)
    }

    pub async fn delete_one(&mut self, filter: Document) -> DocumentStoreResult<DeleteResult> {
        self.repository.collection
            .delete_one(filter)
            .session(&mut *self.session)
            .await
            .map_err(map_driver_error)
    }

    pub async fn delete_by_id(&mut self, id: ObjectId) -> DocumentStoreResult<DeleteResult> {
        self.delete_one(by_id(id)).await
    }

    pub async fn count(&mut self, filter: Document) -> DocumentStoreResult<u64> {
        self.repository.collection
            .count_documents(filter)
            .session(&mut *self.session)
            .await
            .map_err(map_driver_error)
    }
}

fn by_id(id: ObjectId) -> Document {
    doc! { "_id": id }
}

fn inserted_object_id(id: Bson) -> DocumentStoreResult<ObjectId> {
    match id {
        Bson::ObjectId(id) => Ok(id),
        other => Err(DocumentStoreError::InvalidDocument(format!(
            "expected an ObjectId for the inserted document, got {other}"
        ))),
    }
}

/// Driver find options for the sort, skip and limit of `query`.
pub(crate) fn find_options(query: &Query) -> FindOptions {
    FindOptions::builder()
        .sort(query.sort_document())
        .skip(query.skip)
        .limit(query.limit)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongolayer_core::query::{Filter, SortDirection};
    use pretty_assertions::assert_eq;

    #[test]
    fn find_options_from_query() {
        let query = Query::builder()
            .filter(Filter::eq("status", "published"))
            .sort("created_at", SortDirection::Desc)
            .skip(10)
            .limit(5)
            .build();
        let options = find_options(&query);

        assert_eq!(options.sort, Some(doc! { "created_at": -1 }));
        assert_eq!(options.skip, Some(10));
        assert_eq!(options.limit, Some(5));
    }

    #[test]
    fn empty_query_sets_no_options() {
        let options = find_options(&Query::new());

        assert_eq!(options.sort, None);
        assert_eq!(options.skip, None);
        assert_eq!(options.limit, None);
    }

    #[test]
    fn inserted_id_must_be_object_id() {
        let id = ObjectId::new();
        assert_eq!(inserted_object_id(Bson::ObjectId(id)).unwrap(), id);

        let err = inserted_object_id(Bson::Int32(7)).unwrap_err();
        assert!(matches!(err, DocumentStoreError::InvalidDocument(_)));
    }
}
