use chrono::{DateTime, SecondsFormat, Utc};
use congress_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::entity::EntityKind;

/// A stored item of one congress entity kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    record_id: NonEmptyString,
    entity: EntityKind,
    data: Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Record {
    /// Creates a validated record.
    pub fn new(
        record_id: impl Into<String>,
        entity: EntityKind,
        data: Value,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        if !data.is_object() {
            return Err(AppError::Validation(
                "record data must be a JSON object".to_owned(),
            ));
        }

        Ok(Self {
            record_id: NonEmptyString::new(record_id)?,
            entity,
            data,
            created_at,
            updated_at,
        })
    }

    /// Returns the stable record identifier.
    #[must_use]
    pub fn record_id(&self) -> &NonEmptyString {
        &self.record_id
    }

    /// Returns the entity kind.
    #[must_use]
    pub fn entity(&self) -> EntityKind {
        self.entity
    }

    /// Returns the record JSON object.
    #[must_use]
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last modification timestamp.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the value of a declared or implicit field.
    ///
    /// Implicit fields are rendered the way declared date-time fields are
    /// stored, so every field reads through the same path.
    #[must_use]
    pub fn field_value(&self, field: &str) -> Option<Value> {
        match field {
            "id" => Some(Value::String(self.record_id.as_str().to_owned())),
            "created_at" => Some(render_timestamp(self.created_at)),
            "updated_at" => Some(render_timestamp(self.updated_at)),
            _ => self.data.get(field).cloned(),
        }
    }

    /// Returns a copy with the patch merged over the current data.
    #[must_use]
    pub fn merged(&self, patch: Map<String, Value>, updated_at: DateTime<Utc>) -> Self {
        let mut data = self.data.as_object().cloned().unwrap_or_default();
        data.extend(patch);

        Self {
            record_id: self.record_id.clone(),
            entity: self.entity,
            data: Value::Object(data),
            created_at: self.created_at,
            updated_at,
        }
    }

    /// Returns the data object with the implicit fields included.
    #[must_use]
    pub fn to_document(&self) -> Value {
        let mut document = self.data.as_object().cloned().unwrap_or_default();
        document.insert(
            "id".to_owned(),
            Value::String(self.record_id.as_str().to_owned()),
        );
        document.insert("created_at".to_owned(), render_timestamp(self.created_at));
        document.insert("updated_at".to_owned(), render_timestamp(self.updated_at));
        Value::Object(document)
    }
}

fn render_timestamp(value: DateTime<Utc>) -> Value {
    Value::String(value.to_rfc3339_opts(SecondsFormat::Secs, true))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::{Map, json};

    use super::Record;
    use crate::entity::EntityKind;

    #[test]
    fn record_requires_object_data() {
        let now = Utc::now();
        assert!(Record::new("r-1", EntityKind::Countries, json!([]), now, now).is_err());
        assert!(Record::new("", EntityKind::Countries, json!({}), now, now).is_err());
    }

    #[test]
    fn implicit_fields_read_through_field_value() {
        let now = Utc::now();
        let record = Record::new("r-1", EntityKind::Countries, json!({"name": "Chile"}), now, now)
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(record.field_value("id"), Some(json!("r-1")));
        assert_eq!(record.field_value("name"), Some(json!("Chile")));
        assert!(record.field_value("created_at").is_some());
        assert_eq!(record.field_value("code2"), None);
    }

    #[test]
    fn merged_overlays_patch_fields() {
        let now = Utc::now();
        let record = Record::new(
            "r-1",
            EntityKind::Countries,
            json!({"name": "Chile", "code2": "CL"}),
            now,
            now,
        )
        .unwrap_or_else(|_| unreachable!());

        let mut patch = Map::new();
        patch.insert("name".to_owned(), json!("Chili"));
        let merged = record.merged(patch, now);

        assert_eq!(merged.data(), &json!({"name": "Chili", "code2": "CL"}));
        assert_eq!(merged.record_id(), record.record_id());
    }
}
