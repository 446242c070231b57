use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use congress_core::{AppError, AppResult, Principal};
use congress_domain::{
    Action, EntityKind, FieldType, FilterOperator, PayloadMode, PermissionString, Record,
    TypedValue,
};

use crate::refine::{
    ExplicitQuery, Predicate, QueryParams, RefineOptions, RefineQuery, RefinedPage, refine,
};
use crate::{AuthorizationService, RecordRepository};


/// Resource-specific action that lifts the public-only scope on events.
const EVENTS_LIST_ALL: &str = "listall";

/// Application service for congress record CRUD and listing.
#[derive(Clone)]
pub struct RecordService {
    repository: Arc<dyn RecordRepository>,
    authorization_service: AuthorizationService,
    options: RefineOptions,
}

impl RecordService {
    /// Creates a record service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn RecordRepository>,
        authorization_service: AuthorizationService,
        options: RefineOptions,
    ) -> Self {
        Self {
            repository,
            authorization_service,
            options,
        }
    }

    /// Lists records from suffix-encoded query parameters.
    pub async fn list_records(
        &self,
        actor: &Principal,
        kind: EntityKind,
        params: &QueryParams,
    ) -> AppResult<RefinedPage<Record>> {
        self.require(actor, kind, Action::List).await?;

        let query = RefineQuery::from_params(params, kind.schema(), &self.options);
        self.run_scoped(actor, kind, query).await
    }

    /// Lists records from an explicit condition list.
    pub async fn query_records(
        &self,
        actor: &Principal,
        kind: EntityKind,
        query: ExplicitQuery,
    ) -> AppResult<RefinedPage<Record>> {
        self.require(actor, kind, Action::List).await?;

        let query = query.into_refine_query(kind.schema(), &self.options)?;
        self.run_scoped(actor, kind, query).await
    }

    /// Returns one record.
    pub async fn get_record(
        &self,
        actor: &Principal,
        kind: EntityKind,
        record_id: &str,
    ) -> AppResult<Record> {
        self.require_object(actor, kind, Action::Show, record_id)
            .await?;
        self.find_existing(kind, record_id).await
    }

    /// Creates a record from a full payload.
    pub async fn create_record(
        &self,
        actor: &Principal,
        kind: EntityKind,
        payload: &Value,
    ) -> AppResult<Record> {
        self.require(actor, kind, Action::Create).await?;

        let data = kind
            .schema()
            .validate_payload(payload, PayloadMode::Create)?;
        let now = Utc::now();
        let record = Record::new(
            Uuid::new_v4().to_string(),
            kind,
            Value::Object(data),
            now,
            now,
        )?;

        self.repository.insert_record(record.clone()).await?;
        info!(
            subject = %actor.subject(),
            resource = %kind,
            record_id = %record.record_id(),
            "record created"
        );

        Ok(record)
    }

    /// Merges a partial payload into an existing record.
    pub async fn update_record(
        &self,
        actor: &Principal,
        kind: EntityKind,
        record_id: &str,
        payload: &Value,
    ) -> AppResult<Record> {
        self.require_object(actor, kind, Action::Update, record_id)
            .await?;

        let patch = kind
            .schema()
            .validate_payload(payload, PayloadMode::Update)?;
        let existing = self.find_existing(kind, record_id).await?;
        let updated = existing.merged(patch, Utc::now());

        self.repository.update_record(updated.clone()).await?;
        info!(
            subject = %actor.subject(),
            resource = %kind,
            record_id,
            "record updated"
        );

        Ok(updated)
    }

    /// Deletes a record.
    pub async fn delete_record(
        &self,
        actor: &Principal,
        kind: EntityKind,
        record_id: &str,
    ) -> AppResult<()> {
        self.require_object(actor, kind, Action::Delete, record_id)
            .await?;

        if !self.repository.delete_record(kind, record_id).await? {
            return Err(not_found(kind, record_id));
        }

        info!(
            subject = %actor.subject(),
            resource = %kind,
            record_id,
            "record deleted"
        );

        Ok(())
    }

    async fn run_scoped(
        &self,
        actor: &Principal,
        kind: EntityKind,
        query: RefineQuery,
    ) -> AppResult<RefinedPage<Record>> {
        let query = match self.visibility_scope(actor, kind).await? {
            Some(scope) => query.and_scope(scope),
            None => query,
        };

        refine(self.repository.as_ref(), kind, query).await
    }

    /// Events are limited to public ones unless the caller may list all.
    async fn visibility_scope(
        &self,
        actor: &Principal,
        kind: EntityKind,
    ) -> AppResult<Option<Predicate>> {
        if kind != EntityKind::Events {
            return Ok(None);
        }

        let list_all = PermissionString::new(kind.as_str(), EVENTS_LIST_ALL)?;
        if self
            .authorization_service
            .has_permission(actor, &list_all)
            .await?
        {
            return Ok(None);
        }

        Ok(Some(Predicate::Compare {
            field: "is_public".to_owned(),
            field_type: FieldType::Boolean,
            operator: FilterOperator::Eq,
            value: TypedValue::Boolean(true),
            truncate_to_date: false,
        }))
    }

    async fn find_existing(&self, kind: EntityKind, record_id: &str) -> AppResult<Record> {
        self.repository
            .find_record(kind, record_id)
            .await?
            .ok_or_else(|| not_found(kind, record_id))
    }

    async fn require(&self, actor: &Principal, kind: EntityKind, action: Action) -> AppResult<()> {
        let required = PermissionString::for_action(kind.as_str(), action)?;
        self.authorization_service
            .require_permission(actor, &required)
            .await
    }

    async fn require_object(
        &self,
        actor: &Principal,
        kind: EntityKind,
        action: Action,
        record_id: &str,
    ) -> AppResult<()> {
        let required = PermissionString::for_action(kind.as_str(), action)?;
        self.authorization_service
            .require_object_permission(actor, &required, record_id)
            .await
    }
}

fn not_found(kind: EntityKind, record_id: &str) -> AppError {
    AppError::NotFound(format!("{kind} record '{record_id}' does not exist"))
}
