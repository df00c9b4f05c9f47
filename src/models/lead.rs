// src/models/lead.rs

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        query::{
            contains_ci, eq_ci, has_tag, ListQuery, Pagination, Queryable, RecordFilter, SortSpec,
            SortValue,
        },
    },
    models::{
        activity::ActivityEntry,
        fields::{clearable, empty_string_as_none, TagList},
    },
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LeadStage {
    #[default]
    New,
    Contacted,
    Qualified,
    Converted,
}

impl LeadStage {
    pub const ALL: [LeadStage; 4] = [
        LeadStage::New,
        LeadStage::Contacted,
        LeadStage::Qualified,
        LeadStage::Converted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStage::New => "new",
            LeadStage::Contacted => "contacted",
            LeadStage::Qualified => "qualified",
            LeadStage::Converted => "converted",
        }
    }
}

impl fmt::Display for LeadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LeadStage::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| format!("Invalid stage: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: Uuid,
    #[schema(example = "Padaria Central")]
    pub name: String,
    #[serde(default)]
    #[schema(example = "contato@padaria.com")]
    pub email: Option<String>,
    #[serde(default)]
    #[schema(example = "+55 11 99999-0000")]
    pub phone: Option<String>,
    #[serde(default)]
    pub stage: LeadStage,
    #[serde(default)]
    pub owner: Option<Uuid>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub activity: Vec<ActivityEntry>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Lead {
    pub fn apply(&mut self, changes: &LeadChanges) -> Vec<String> {
        let mut diff = Vec::new();

        if let Some(name) = &changes.name {
            let name = name.trim();
            if name != self.name {
                diff.push(format!("name: {} → {}", self.name, name));
                self.name = name.to_string();
            }
        }
        if let Some(email) = &changes.email {
            if *email != self.email {
                diff.push(format!("email: {}", email.as_deref().unwrap_or("cleared")));
                self.email = email.clone();
            }
        }
        if let Some(phone) = &changes.phone {
            if *phone != self.phone {
                diff.push(format!("phone: {}", phone.as_deref().unwrap_or("cleared")));
                self.phone = phone.clone();
            }
        }
        if let Some(stage) = changes.stage {
            if stage != self.stage {
                diff.push(format!("stage: {} → {}", self.stage, stage));
                self.stage = stage;
            }
        }
        if let Some(owner) = changes.owner {
            if owner != self.owner {
                diff.push(match owner {
                    Some(id) => format!("owner: {}", id),
                    None => "owner: cleared".to_string(),
                });
                self.owner = owner;
            }
        }
        if let Some(tags) = &changes.tags {
            if tags.0 != self.tags {
                diff.push(format!("tags: {}", tags.0.join(", ")));
                self.tags = tags.0.clone();
            }
        }

        diff
    }

    fn search_text(&self) -> String {
        let owner = self.owner.map(|id| id.to_string()).unwrap_or_default();
        let tags = self.tags.join(" ");
        [self.name.as_str(), owner.as_str(), tags.as_str()].join(" ")
    }
}

impl Queryable for Lead {
    const SORT_KEYS: &'static [&'static str] = &["name", "email", "phone", "stage", "owner", "tags"];

    fn scope_owner(&self) -> Option<Uuid> {
        self.owner
    }

    fn sort_value(&self, key: &str) -> SortValue {
        let text = match key {
            "name" => self.name.clone(),
            "email" => self.email.clone().unwrap_or_default(),
            "phone" => self.phone.clone().unwrap_or_default(),
            "stage" => self.stage.as_str().to_string(),
            "owner" => self.owner.map(|id| id.to_string()).unwrap_or_default(),
            "tags" => self.tags.join(", "),
            _ => String::new(),
        };
        SortValue::Text(text.to_lowercase())
    }
}

// --- PAYLOADS ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeadPayload {
    #[validate(
        required(message = "Name required"),
        length(min = 1, message = "Name required")
    )]
    #[schema(example = "Padaria Central")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(email(message = "Please enter a valid email"))]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub phone: Option<String>,
    pub stage: Option<LeadStage>,
    /// Quando ausente, o lead fica com quem criou
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub owner: Option<Uuid>,
    #[schema(value_type = Option<Vec<String>>)]
    pub tags: Option<TagList>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadChanges {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "clearable")]
    #[schema(value_type = Option<String>)]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "clearable")]
    #[schema(value_type = Option<String>)]
    pub phone: Option<Option<String>>,
    pub stage: Option<LeadStage>,
    #[serde(default, deserialize_with = "clearable")]
    #[schema(value_type = Option<Uuid>)]
    pub owner: Option<Option<Uuid>>,
    #[schema(value_type = Option<Vec<String>>)]
    pub tags: Option<TagList>,
}

impl LeadChanges {
    pub fn check(&self) -> Result<(), AppError> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(AppError::validation("Name required"));
            }
        }
        if let Some(Some(email)) = &self.email {
            if !validator::ValidateEmail::validate_email(email) {
                return Err(AppError::validation("Please enter a valid email"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadBulkPayload {
    pub ids: Vec<Uuid>,
    pub updates: LeadChanges,
}

// --- LISTAGEM ---

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LeadListQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub page: Option<usize>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub page_size: Option<usize>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub sort_by: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub sort_dir: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub stage: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub owner: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub tag: Option<String>,
    /// Busca livre em nome, dono e tags
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub q: Option<String>,
}

impl LeadListQuery {
    pub fn into_list_query(
        self,
        default_page_size: usize,
        max_page_size: usize,
    ) -> Result<ListQuery<LeadFilter>, AppError> {
        let sort = SortSpec::parse::<Lead>(self.sort_by.as_deref(), self.sort_dir.as_deref())?;
        let pagination =
            Pagination::from_params(self.page, self.page_size, default_page_size, max_page_size)?;
        Ok(ListQuery {
            filter: LeadFilter {
                name: self.name,
                email: self.email,
                phone: self.phone,
                stage: self.stage,
                owner: self.owner,
                tag: self.tag,
                q: self.q,
            },
            sort,
            pagination,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct LeadFilter {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub stage: Option<String>,
    pub owner: Option<String>,
    pub tag: Option<String>,
    pub q: Option<String>,
}

impl LeadFilter {
    pub fn text(q: impl Into<String>) -> Self {
        Self {
            q: Some(q.into()),
            ..Self::default()
        }
    }
}

impl RecordFilter<Lead> for LeadFilter {
    fn matches(&self, lead: &Lead) -> bool {
        if let Some(stage) = &self.stage {
            if !eq_ci(lead.stage.as_str(), stage) {
                return false;
            }
        }
        if let Some(owner) = &self.owner {
            let current = lead.owner.map(|id| id.to_string()).unwrap_or_default();
            if !eq_ci(&current, owner) {
                return false;
            }
        }
        if let Some(name) = &self.name {
            if !contains_ci(&lead.name, name) {
                return false;
            }
        }
        if let Some(email) = &self.email {
            if !contains_ci(lead.email.as_deref().unwrap_or_default(), email) {
                return false;
            }
        }
        if let Some(phone) = &self.phone {
            if !contains_ci(lead.phone.as_deref().unwrap_or_default(), phone) {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !has_tag(&lead.tags, tag) {
                return false;
            }
        }
        if let Some(q) = &self.q {
            if !contains_ci(&lead.search_text(), q) {
                return false;
            }
        }
        true
    }
}
