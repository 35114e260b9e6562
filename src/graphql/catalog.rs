//! GraphQL lookup catalog: whitelists, fragments, templates and code tables.

use super::composer::{compose_selection, QueryTemplate, FIELDS_PLACEHOLDER};
use crate::{Error, ErrorContext, Result};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

const EMBEDDED_CATALOG: &str = include_str!("catalog.yaml");

static EMBEDDED: OnceCell<Arc<GraphQlCatalog>> = OnceCell::new();

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateParam {
    pub name: String,
    /// Code table translating non-numeric identifiers to numeric IDs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityQuery {
    pub template: String,
    /// Field of `data` holding the entity, when the caller wants it unwrapped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    #[serde(default)]
    pub params: Vec<TemplateParam>,
    pub fields: Vec<String>,
    #[serde(default)]
    pub fragments: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphQlCatalog {
    #[serde(default)]
    pub entities: HashMap<String, EntityQuery>,
    #[serde(default)]
    pub code_tables: HashMap<String, HashMap<String, i64>>,
}

impl GraphQlCatalog {
    /// The catalog shipped with the crate, parsed once per process.
    pub fn embedded() -> Result<Arc<Self>> {
        EMBEDDED
            .get_or_try_init(|| Self::from_yaml_str(EMBEDDED_CATALOG).map(Arc::new))
            .cloned()
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let catalog: Self = serde_yaml::from_str(text).map_err(|e| {
            Error::configuration_with_context(
                "invalid GraphQL catalog",
                ErrorContext::new()
                    .with_details(e.to_string())
                    .with_source("graphql_catalog"),
            )
        })?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration_with_context(
                "cannot read GraphQL catalog",
                ErrorContext::new()
                    .with_field_path(path.display().to_string())
                    .with_details(e.to_string())
                    .with_source("graphql_catalog"),
            )
        })?;
        Self::from_yaml_str(&text)
    }

    /// Every template must place the selection and each declared parameter;
    /// fragments and code tables must refer to things that exist.
    pub fn validate(&self) -> Result<()> {
        for (name, entity) in &self.entities {
            let placeholders = QueryTemplate::new(&entity.template).placeholders();
            if !entity.template.contains(FIELDS_PLACEHOLDER) {
                return Err(invalid(name, "template has no ${fields} placeholder"));
            }
            for param in &entity.params {
                if !placeholders.contains(&param.name.as_str()) {
                    return Err(invalid(
                        name,
                        format!("parameter '{}' does not appear in the template", param.name),
                    ));
                }
                if let Some(ref table) = param.codes {
                    if !self.code_tables.contains_key(table) {
                        return Err(invalid(name, format!("unknown code table '{}'", table)));
                    }
                }
            }
            for field in entity.fragments.keys() {
                if !entity.fields.contains(field) {
                    return Err(invalid(
                        name,
                        format!("fragment for '{}' which is not a selectable field", field),
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn entity(&self, name: &str) -> Result<&EntityQuery> {
        self.entities.get(name).ok_or_else(|| {
            Error::lookup_with_context(
                format!("unknown GraphQL entity '{}'", name),
                ErrorContext::new()
                    .with_field_path(name)
                    .with_source("graphql_catalog"),
            )
        })
    }

    pub fn resolve_code(&self, table: &str, code: &str) -> Result<i64> {
        self.code_tables
            .get(table)
            .and_then(|t| t.get(code))
            .copied()
            .ok_or_else(|| {
                Error::lookup_with_context(
                    format!("unknown code '{}'", code),
                    ErrorContext::new()
                        .with_field_path(table)
                        .with_source("graphql_catalog"),
                )
            })
    }

    /// Compose the full single-line query for `entity`.
    ///
    /// `params` supplies a value for every declared template parameter;
    /// `requested` optionally narrows the selection.
    pub fn compose(
        &self,
        entity: &str,
        params: &[(&str, &str)],
        requested: Option<&[&str]>,
    ) -> Result<String> {
        let query = self.entity(entity)?;

        let mut vars = Vec::with_capacity(query.params.len());
        for param in &query.params {
            let raw = params
                .iter()
                .find(|(name, _)| *name == param.name)
                .map(|(_, value)| *value)
                .ok_or_else(|| {
                    Error::lookup_with_context(
                        format!("missing parameter '{}'", param.name),
                        ErrorContext::new()
                            .with_field_path(format!("{}.{}", entity, param.name))
                            .with_source("graphql_catalog"),
                    )
                })?;
            let value = match param.codes {
                Some(ref table) if raw.parse::<i64>().is_err() => {
                    self.resolve_code(table, raw)?.to_string()
                }
                _ => raw.to_string(),
            };
            vars.push((param.name.as_str(), value));
        }

        let selection = compose_selection(requested, &query.fields, &query.fragments);
        Ok(QueryTemplate::new(&query.template).render(&vars, &selection))
    }
}

fn invalid(entity: &str, details: impl Into<String>) -> Error {
    Error::configuration_with_context(
        "invalid GraphQL catalog entry",
        ErrorContext::new()
            .with_field_path(entity)
            .with_details(details)
            .with_source("graphql_catalog"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const COUNCILS: &str = r#"
entities:
  council_activities:
    template: 'query { activities(sectorCouncil: ${council}) { ${fields} } }'
    params:
      - name: council
        codes: sector_councils
    fields: [id, title, organization]
    fragments:
      organization: "{ id }"
code_tables:
  sector_councils:
    IT: 12
    ENERGY: 7
"#;

    #[test]
    fn test_embedded_catalog_is_valid() {
        let catalog = GraphQlCatalog::embedded().unwrap();
        assert!(catalog.entities.contains_key("activity_timeline"));
        assert!(catalog.entities.contains_key("activities_timelines"));
        assert!(catalog.entities.contains_key("strategy_organization"));
        assert!(Arc::ptr_eq(&catalog, &GraphQlCatalog::embedded().unwrap()));
    }

    #[test]
    fn test_compose_activity_detail() {
        let catalog = GraphQlCatalog::embedded().unwrap();
        let query = catalog
            .compose("activity_timeline", &[("id", "15")], Some(&["name", "organization", "bogus"]))
            .unwrap();
        assert!(query.starts_with("query {"));
        assert!(query.contains(r#"activitiesTimeline(id: "/api/activities_timeline/15")"#));
        assert!(query.contains("name,organization{ id, title, ico }"));
        assert!(!query.contains("bogus"));
        assert!(!query.contains('\n'));
    }

    #[test]
    fn test_code_table_translates_identifiers() {
        let catalog = GraphQlCatalog::from_yaml_str(COUNCILS).unwrap();
        let by_code = catalog
            .compose("council_activities", &[("council", "IT")], None)
            .unwrap();
        let by_id = catalog
            .compose("council_activities", &[("council", "12")], None)
            .unwrap();
        assert_eq!(by_code, by_id);
        assert_eq!(
            by_code,
            "query { activities(sectorCouncil: 12) { id,title,organization{ id } } }"
        );

        let err = catalog
            .compose("council_activities", &[("council", "NOPE")], None)
            .unwrap_err();
        assert!(matches!(err, Error::Lookup { .. }));
    }

    #[test]
    fn test_missing_parameter_and_unknown_entity() {
        let catalog = GraphQlCatalog::from_yaml_str(COUNCILS).unwrap();
        assert!(matches!(
            catalog.compose("council_activities", &[], None),
            Err(Error::Lookup { .. })
        ));
        assert!(matches!(
            catalog.compose("nothing", &[], None),
            Err(Error::Lookup { .. })
        ));
    }

    #[test]
    fn test_validation_rejects_inconsistent_entries() {
        let no_fields = "entities:\n  a:\n    template: 'query { a }'\n    fields: [id]\n";
        assert!(matches!(
            GraphQlCatalog::from_yaml_str(no_fields),
            Err(Error::Configuration { .. })
        ));

        let stray_fragment = "entities:\n  a:\n    template: 'query { a { ${fields} } }'\n    fields: [id]\n    fragments:\n      other: '{ id }'\n";
        assert!(matches!(
            GraphQlCatalog::from_yaml_str(stray_fragment),
            Err(Error::Configuration { .. })
        ));

        let unknown_table = "entities:\n  a:\n    template: 'query { a(id: ${id}) { ${fields} } }'\n    params:\n      - name: id\n        codes: missing\n    fields: [id]\n";
        assert!(matches!(
            GraphQlCatalog::from_yaml_str(unknown_table),
            Err(Error::Configuration { .. })
        ));
    }
}
