//! Schema/Model Registry
//!
//! Per-entity declarative definitions turned into frozen metadata. A model is
//! registered exactly once against an explicit [`ModelRegistry`] owned by the
//! composition root; repositories receive the resulting [`ModelDef`] and never
//! consult global state.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{RepoError, Result};

/// Universal field names shared by every stored record.
pub mod fields {
    pub const ID: &str = "id";
    pub const FEATURE_ENTITY: &str = "featureEntity";
    pub const CREATED_AT_DATE: &str = "createdAtDate";
    pub const CREATED_AT_DAY_STAMP: &str = "createdAtDayStamp";
    pub const CREATOR_USER_ID: &str = "creatorUserId";
    pub const LAST_MODIFIED_DATE: &str = "lastModifiedDate";
    pub const LAST_MODIFIER_USER_ID: &str = "lastModifierUserId";
    pub const DELETED_AT_DATE: &str = "deletedAtDate";
    pub const DELETER_USER_ID: &str = "deleterUserId";
    pub const NUMBER_CODE: &str = "numberCode";
    pub const RECORD_DATE: &str = "recordDate";
    pub const SK01: &str = "sk01";
    pub const SK02: &str = "sk02";
    pub const SK03: &str = "sk03";
    pub const TENANT_ID: &str = "tenantId";
    pub const FEATURE_ENTITY_TENANT_ID: &str = "featureEntityTenantId";
    pub const TARGET_ID: &str = "targetId";
    pub const DANGEROUSLY_EXPIRE_AT: &str = "dangerouslyExpireAt";

    /// Base fields merged into every model's schema.
    pub const UNIVERSAL: &[&str] = &[
        ID,
        FEATURE_ENTITY,
        CREATED_AT_DATE,
        CREATED_AT_DAY_STAMP,
        CREATOR_USER_ID,
        LAST_MODIFIED_DATE,
        LAST_MODIFIER_USER_ID,
        DELETED_AT_DATE,
        DELETER_USER_ID,
        NUMBER_CODE,
        RECORD_DATE,
        SK01,
        SK02,
        SK03,
    ];

    /// Base fields always included in the lite projection.
    pub const ALWAYS_LITE: &[&str] = &[
        ID,
        FEATURE_ENTITY,
        CREATED_AT_DATE,
        CREATED_AT_DAY_STAMP,
        RECORD_DATE,
        NUMBER_CODE,
        TENANT_ID,
        TARGET_ID,
    ];
}

/// Declared shape of a single schema field. Validation internals beyond the
/// required flag are the store engine's concern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldSpec {
    pub required: bool,
}

impl FieldSpec {
    pub fn required() -> Self {
        Self { required: true }
    }

    pub fn optional() -> Self {
        Self { required: false }
    }
}

/// A declared pair of field names whose values must always match, letting a
/// domain-named field be queried via a conventionally-indexed key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldAlias {
    pub source: String,
    pub dest: String,
}

/// Result-projection spec for list queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LiteFieldSpec {
    /// All declared schema fields plus the always-on base fields.
    #[default]
    Basic,
    /// An explicit field list (always-on base fields are still added).
    Explicit(Vec<String>),
    /// No projection: list queries return full rows.
    All,
}

/// Declarative per-entity definition, consumed by [`ModelRegistry::register`].
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub model_name: String,
    pub table_name: String,
    pub schema: IndexMap<String, FieldSpec>,
    pub lite_fields: LiteFieldSpec,
    pub excluded_fields: Vec<String>,
    pub field_aliases: Vec<FieldAlias>,
    pub strict_required_fields: Vec<String>,
    pub is_temp: bool,
}

impl ModelConfig {
    pub fn new(model_name: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            table_name: table_name.into(),
            schema: IndexMap::new(),
            lite_fields: LiteFieldSpec::Basic,
            excluded_fields: Vec::new(),
            field_aliases: Vec::new(),
            strict_required_fields: Vec::new(),
            is_temp: false,
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.schema.insert(name.into(), spec);
        self
    }

    pub fn with_lite_fields(mut self, spec: LiteFieldSpec) -> Self {
        self.lite_fields = spec;
        self
    }

    pub fn with_excluded_field(mut self, name: impl Into<String>) -> Self {
        self.excluded_fields.push(name.into());
        self
    }

    pub fn with_alias(mut self, source: impl Into<String>, dest: impl Into<String>) -> Self {
        self.field_aliases.push(FieldAlias {
            source: source.into(),
            dest: dest.into(),
        });
        self
    }

    pub fn with_strict_required(mut self, name: impl Into<String>) -> Self {
        self.strict_required_fields.push(name.into());
        self
    }

    /// Route this model to the temporary table. Temp models must strictly
    /// require [`fields::DANGEROUSLY_EXPIRE_AT`].
    pub fn temp_table(mut self) -> Self {
        self.is_temp = true;
        self
    }
}

/// Frozen per-model metadata.
#[derive(Debug, Clone)]
pub struct ModelDef {
    model_name: String,
    feature_entity: String,
    table_name: String,
    schema: IndexMap<String, FieldSpec>,
    lite_fields: Vec<String>,
    field_aliases: Vec<FieldAlias>,
    strict_required_fields: Vec<String>,
    is_temp: bool,
}

impl ModelDef {
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Partition discriminator for this entity kind
    /// (snake_case stem of the model name).
    pub fn feature_entity(&self) -> &str {
        &self.feature_entity
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Merged schema: universal base fields plus declared entity fields.
    pub fn schema(&self) -> &IndexMap<String, FieldSpec> {
        &self.schema
    }

    /// The computed lite projection. Empty means "no projection".
    pub fn lite_fields(&self) -> &[String] {
        &self.lite_fields
    }

    pub fn field_aliases(&self) -> &[FieldAlias] {
        &self.field_aliases
    }

    pub fn strict_required_fields(&self) -> &[String] {
        &self.strict_required_fields
    }

    pub fn is_temp(&self) -> bool {
        self.is_temp
    }

    /// A copy of this definition with one more strictly-required field.
    /// Used by repository layers that structurally demand a field.
    pub fn require_strictly(&self, field: &str) -> Self {
        let mut out = self.clone();
        if !out.strict_required_fields.iter().any(|f| f == field) {
            out.strict_required_fields.push(field.to_string());
        }
        out
    }

    /// Project a row down to the registered lite fields.
    /// Pass-through when no lite fields were computed.
    pub fn to_lite_data(&self, row: &Value) -> Value {
        if self.lite_fields.is_empty() {
            return row.clone();
        }
        let Some(source) = row.as_object() else {
            return row.clone();
        };
        let mut out = serde_json::Map::new();
        for field in &self.lite_fields {
            if let Some(value) = source.get(field) {
                out.insert(field.clone(), value.clone());
            }
        }
        Value::Object(out)
    }
}

/// Explicit model registry, owned by the composition root.
///
/// Registration is the fail-fast point for programmer errors: duplicate
/// names, naming-convention violations, and temp models missing the expiry
/// requirement are all rejected here rather than tolerated at runtime.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    registered: HashSet<String>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, config: ModelConfig) -> Result<Arc<ModelDef>> {
        let stem = validate_model_name(&config.model_name)?;

        if !self.registered.insert(config.model_name.clone()) {
            return Err(RepoError::configuration(format!(
                "model '{}' is already registered",
                config.model_name
            )));
        }

        if config.is_temp
            && !config
                .strict_required_fields
                .iter()
                .any(|f| f == fields::DANGEROUSLY_EXPIRE_AT)
        {
            return Err(RepoError::configuration(format!(
                "temp-table model '{}' must strictly require '{}'",
                config.model_name,
                fields::DANGEROUSLY_EXPIRE_AT
            )));
        }

        for alias in &config.field_aliases {
            if alias.source.is_empty() || alias.dest.is_empty() || alias.source == alias.dest {
                return Err(RepoError::configuration(format!(
                    "model '{}' declares an invalid field alias '{}' -> '{}'",
                    config.model_name, alias.source, alias.dest
                )));
            }
        }

        // Merged schema: universal base fields first, declared fields after
        // (declared specs win on overlap).
        let mut schema: IndexMap<String, FieldSpec> = IndexMap::new();
        for base in fields::UNIVERSAL {
            let spec = if *base == fields::ID {
                FieldSpec::required()
            } else {
                FieldSpec::optional()
            };
            schema.insert((*base).to_string(), spec);
        }
        for (name, spec) in &config.schema {
            schema.insert(name.clone(), *spec);
        }

        let lite_fields = compute_lite_fields(&config);

        Ok(Arc::new(ModelDef {
            feature_entity: pascal_to_snake(&stem),
            model_name: config.model_name,
            table_name: config.table_name,
            schema,
            lite_fields,
            field_aliases: config.field_aliases,
            strict_required_fields: config.strict_required_fields,
            is_temp: config.is_temp,
        }))
    }
}

/// Model names are UpperCamelCase and end in `Model`
/// (e.g. `RoleClaimModel`). Returns the stem before the suffix.
fn validate_model_name(name: &str) -> Result<String> {
    let stem = name.strip_suffix("Model").unwrap_or_default();
    let well_formed = !stem.is_empty()
        && stem.chars().next().is_some_and(|c| c.is_ascii_uppercase())
        && stem.chars().all(|c| c.is_ascii_alphanumeric());
    if !well_formed {
        return Err(RepoError::configuration(format!(
            "model name '{}' must be UpperCamelCase ending in 'Model'",
            name
        )));
    }
    Ok(stem.to_string())
}

fn compute_lite_fields(config: &ModelConfig) -> Vec<String> {
    let declared: Vec<String> = match &config.lite_fields {
        LiteFieldSpec::All => return Vec::new(),
        LiteFieldSpec::Basic => config.schema.keys().cloned().collect(),
        LiteFieldSpec::Explicit(list) => list.clone(),
    };

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for field in declared
        .into_iter()
        .chain(fields::ALWAYS_LITE.iter().map(|f| f.to_string()))
    {
        if config.excluded_fields.contains(&field) {
            continue;
        }
        if seen.insert(field.clone()) {
            out.push(field);
        }
    }
    out
}

fn pascal_to_snake(stem: &str) -> String {
    let mut out = String::with_capacity(stem.len() + 4);
    for (i, c) in stem.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
