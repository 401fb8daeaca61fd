use crate::config::database::Connection;
use crate::modules::task::model::Task;
use bson::{doc, oid::ObjectId, Document};
use mongodb::{options::ReturnDocument, Collection};

pub struct TaskCrud {
    collection: Collection<Task>,
}

impl TaskCrud {
    pub fn new(connection: &Connection) -> Self {
        Self {
            collection: connection.tasks(),
        }
    }

    pub async fn create(&self, task: Task) -> Result<ObjectId, mongodb::error::Error> {
        self.collection.insert_one(&task).await?;
        Ok(task.id)
    }

    pub async fn find_by_id(&self, id: &ObjectId) -> Result<Option<Task>, mongodb::error::Error> {
        self.collection.find_one(doc! { "_id": id }).await
    }

    /// Oldest first, so the list keeps the order tasks were added in.
    pub async fn find_all(&self) -> Result<Vec<Task>, mongodb::error::Error> {
        use futures::TryStreamExt;

        let cursor = self
            .collection
            .find(doc! {})
            .sort(doc! { "created_at": 1, "_id": 1 })
            .await?;

        cursor.try_collect().await
    }

    /// Sets the text and, when given, the completion flag. Returns the task as
    /// stored after the update, or `None` if no task has that id.
    pub async fn update(
        &self,
        id: &ObjectId,
        text: String,
        completed: Option<bool>,
    ) -> Result<Option<Task>, mongodb::error::Error> {
        let mut set: Document = doc! {
            "text": text,
            "updated_at": bson::DateTime::now(),
        };
        if let Some(completed) = completed {
            set.insert("completed", completed);
        }

        self.collection
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await
    }

    pub async fn delete(&self, id: &ObjectId) -> Result<bool, mongodb::error::Error> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }
}
