use std::fmt::{Display, Formatter};
use std::str::FromStr;

use congress_core::AppError;
use serde::{Deserialize, Serialize};

use crate::schema::{EntitySchema, FieldDefinition, FieldType};

use FieldType::{Boolean, DateTime, Float, Integer, Reference, Text};

const COUNTRIES: EntitySchema = EntitySchema::new(&[
    FieldDefinition::required("name", Text),
    FieldDefinition::required("code2", Text),
    FieldDefinition::required("code3", Text),
    FieldDefinition::optional("devco", Boolean),
    FieldDefinition::optional("preferred", Boolean),
]);

const LOCATION_TYPES: EntitySchema = EntitySchema::new(&[
    FieldDefinition::required("name", Text),
    FieldDefinition::optional("description", Text),
]);

const LOCATIONS: EntitySchema = EntitySchema::new(&[
    FieldDefinition::required("name", Text),
    FieldDefinition::optional("road", Text),
    FieldDefinition::optional("number", Text),
    FieldDefinition::optional("city", Text),
    FieldDefinition::optional("state", Text),
    FieldDefinition::optional("postal_code", Text),
    FieldDefinition::optional("latitude", Float),
    FieldDefinition::optional("longitude", Float),
    FieldDefinition::optional("link", Text),
    FieldDefinition::optional("country_id", Reference),
    FieldDefinition::optional("location_type_id", Reference),
]);

const COMPANIES: EntitySchema = EntitySchema::new(&[
    FieldDefinition::required("name", Text),
    FieldDefinition::optional("sponsoring", Boolean),
    FieldDefinition::optional("location_id", Reference),
]);

const COMPANY_EMPLOYEES: EntitySchema = EntitySchema::new(&[
    FieldDefinition::optional("departement", Text),
    FieldDefinition::optional("function", Text),
    FieldDefinition::required("user_id", Reference),
    FieldDefinition::required("company_id", Reference),
]);

const CATEGORIES: EntitySchema = EntitySchema::new(&[
    FieldDefinition::required("name", Text),
    FieldDefinition::optional("description", Text),
]);

const EVENT_TYPES: EntitySchema = EntitySchema::new(&[
    FieldDefinition::required("code", Text),
    FieldDefinition::required("name_de", Text),
    FieldDefinition::required("name_en", Text),
    FieldDefinition::optional("description_de", Text),
    FieldDefinition::optional("description_en", Text),
]);

const EVENTS: EntitySchema = EntitySchema::new(&[
    FieldDefinition::required("name", Text),
    FieldDefinition::required("start_date", DateTime),
    FieldDefinition::required("end_date", DateTime),
    FieldDefinition::optional("is_public", Boolean),
    FieldDefinition::optional("location_id", Reference),
    FieldDefinition::optional("event_type_id", Reference),
    FieldDefinition::optional("category_id", Reference),
]);

const SESSIONS: EntitySchema = EntitySchema::new(&[
    FieldDefinition::required("name", Text),
    FieldDefinition::required("start_time", DateTime),
    FieldDefinition::required("end_time", DateTime),
    FieldDefinition::required("event_id", Reference),
]);

const PROGRAMS: EntitySchema = EntitySchema::new(&[
    FieldDefinition::required("title", Text),
    FieldDefinition::optional("description", Text),
    FieldDefinition::optional("type", Text),
    FieldDefinition::optional("location_id", Reference),
    FieldDefinition::optional("capacity", Integer),
    FieldDefinition::required("start_time", DateTime),
    FieldDefinition::required("end_time", DateTime),
    FieldDefinition::optional("level", Text),
    FieldDefinition::optional("speaker_id", Reference),
    FieldDefinition::optional("tags", Text),
    FieldDefinition::required("session_id", Reference),
    FieldDefinition::optional("is_featured", Boolean),
]);

const FILES: EntitySchema = EntitySchema::new(&[
    FieldDefinition::required("name", Text),
    FieldDefinition::required("size", Integer),
    FieldDefinition::required("location", Text),
    FieldDefinition::optional("external", Boolean),
    FieldDefinition::optional("uploaded_by_id", Reference),
]);

const CONTACTS: EntitySchema = EntitySchema::new(&[
    FieldDefinition::required("email", Text),
    FieldDefinition::optional("titles", Text),
    FieldDefinition::required("first_name", Text),
    FieldDefinition::optional("last_name", Text),
    FieldDefinition::optional("phone_number", Text),
    FieldDefinition::optional("user_id", Reference),
]);

/// Congress entities served through the generic record endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Countries.
    Countries,
    /// Location categories.
    LocationTypes,
    /// Venues and addresses.
    Locations,
    /// Companies.
    Companies,
    /// Company employee links.
    CompanyEmployees,
    /// Event categories.
    Categories,
    /// Event types.
    EventTypes,
    /// Events.
    Events,
    /// Day sessions within an event.
    Sessions,
    /// Program items within a session.
    Programs,
    /// Uploaded file metadata.
    Files,
    /// Contacts.
    Contacts,
}

impl EntityKind {
    /// Returns the resource name used in routes and permission strings.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Countries => "countries",
            Self::LocationTypes => "locationtypes",
            Self::Locations => "locations",
            Self::Companies => "companies",
            Self::CompanyEmployees => "companyemployees",
            Self::Categories => "categories",
            Self::EventTypes => "eventtypes",
            Self::Events => "events",
            Self::Sessions => "sessions",
            Self::Programs => "programs",
            Self::Files => "files",
            Self::Contacts => "contacts",
        }
    }

    /// Returns every entity kind.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[EntityKind] = &[
            EntityKind::Countries,
            EntityKind::LocationTypes,
            EntityKind::Locations,
            EntityKind::Companies,
            EntityKind::CompanyEmployees,
            EntityKind::Categories,
            EntityKind::EventTypes,
            EntityKind::Events,
            EntityKind::Sessions,
            EntityKind::Programs,
            EntityKind::Files,
            EntityKind::Contacts,
        ];

        ALL
    }

    /// Returns the field registry of the entity.
    #[must_use]
    pub fn schema(&self) -> &'static EntitySchema {
        match self {
            Self::Countries => &COUNTRIES,
            Self::LocationTypes => &LOCATION_TYPES,
            Self::Locations => &LOCATIONS,
            Self::Companies => &COMPANIES,
            Self::CompanyEmployees => &COMPANY_EMPLOYEES,
            Self::Categories => &CATEGORIES,
            Self::EventTypes => &EVENT_TYPES,
            Self::Events => &EVENTS,
            Self::Sessions => &SESSIONS,
            Self::Programs => &PROGRAMS,
            Self::Files => &FILES,
            Self::Contacts => &CONTACTS,
        }
    }

    /// Parses a route segment into an entity kind.
    pub fn parse_transport(value: &str) -> Result<Self, AppError> {
        Self::from_str(value)
    }
}

impl FromStr for EntityKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| AppError::NotFound(format!("unknown resource '{value}'")))
    }
}

impl Display for EntityKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}
