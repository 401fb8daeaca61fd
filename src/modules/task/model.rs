use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Documents written without timestamps read back as the Unix epoch.
fn unix_epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Task {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(
        default = "unix_epoch",
        with = "bson::serde_helpers::chrono_datetime_as_bson_datetime"
    )]
    pub created_at: DateTime<Utc>,
    #[serde(
        default = "unix_epoch",
        with = "bson::serde_helpers::chrono_datetime_as_bson_datetime"
    )]
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(text: String, completed: bool) -> Self {
        let now = Utc::now();
        Self {
            id: ObjectId::new(),
            text,
            completed,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_reads_document_without_timestamps() {
        let id = ObjectId::new();

        let task: Task = bson::from_document(doc! { "_id": id, "text": "legacy" }).unwrap();

        assert_eq!(task.id, id);
        assert_eq!(task.text, "legacy");
        assert!(!task.completed);
        assert_eq!(task.created_at, DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(task.updated_at, DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn test_stores_timestamps_as_bson_dates() {
        let task = Task::new("paint".to_string(), false);

        let document = bson::to_document(&task).unwrap();

        assert!(document.get_datetime("created_at").is_ok());
        assert!(document.get_datetime("updated_at").is_ok());
    }
}
