//! Strategy organization lookups.

use super::core::SriClient;
use crate::params::ArgumentSet;
use crate::Result;
use serde_json::Value;

const ORGANIZATIONS_PATH: &str = "api/strategy_organizations";
const CATEGORIES_PATH: &str = "api/strategy_organization_categories";

impl SriClient {
    /// Search organizations by type, group and title. Omitted or empty
    /// criteria are not sent.
    pub async fn search_organization(
        &self,
        type_id: Option<i64>,
        group_id: Option<i64>,
        title: Option<&str>,
    ) -> Result<Value> {
        let args = self.bind(
            "search_organization",
            &[
                type_id.map(Value::from),
                group_id.map(Value::from),
                title.map(Value::from),
            ],
        )?;
        self.organization_search(&args).await
    }

    /// The organization registered under `crn`, if any.
    pub async fn get_organization_by_crn(&self, crn: &str) -> Result<Option<Value>> {
        let crn = crn.trim();
        if crn.is_empty() {
            return Ok(None);
        }
        let args = ArgumentSet::from_pairs([("ico", crn)]);
        let found = self.organization_search(&args).await?;
        Ok(match found {
            Value::Array(mut items) if !items.is_empty() => Some(items.swap_remove(0)),
            _ => None,
        })
    }

    /// One organization by ID. A missing organization surfaces as the 404
    /// transport error; see [`find_organization_by_id`](Self::find_organization_by_id).
    pub async fn get_organization_by_id(&self, id: i64) -> Result<Value> {
        let args = ArgumentSet::from_pairs([("id", id)]);
        let path = format!("{}/{}", ORGANIZATIONS_PATH, id);
        self.cached_get("get-organization", &args, self.config.cache_ttl(), &path, &[])
            .await
    }

    pub async fn find_organization_by_id(&self, id: i64) -> Result<Option<Value>> {
        match self.get_organization_by_id(id).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Organization categories, optionally below `parent` and at `level`.
    /// Level zero is a real level and is sent as such.
    pub async fn get_strategy_organization_categories(
        &self,
        level: Option<i64>,
        parent: Option<i64>,
    ) -> Result<Value> {
        let mut args = ArgumentSet::new();
        if let Some(parent) = parent {
            args.insert_non_empty("parent.id", parent);
        }
        if let Some(level) = level {
            args.insert("level", level);
        }
        let query = args.to_query_pairs();
        self.cached_get(
            "strategy-organization-categories",
            &args,
            self.config.cache_ttl(),
            CATEGORIES_PATH,
            &query,
        )
        .await
    }

    pub async fn get_organization_activities_by_focus(
        &self,
        organization: Option<i64>,
    ) -> Result<Value> {
        self.organization_activities(
            "get_organization_activities_by_focus",
            "api/organization_activities_by_focuses",
            organization,
        )
        .await
    }

    pub async fn get_organization_activities_by_year(
        &self,
        organization: Option<i64>,
    ) -> Result<Value> {
        self.organization_activities(
            "get_organization_activities_by_year",
            "api/organization_activities_by_years",
            organization,
        )
        .await
    }

    pub async fn get_organization_activities_by_sector_councils(
        &self,
        organization: Option<i64>,
    ) -> Result<Value> {
        self.organization_activities(
            "get_organization_activities_by_sector_councils",
            "api/organization_activities_by_sector_councils",
            organization,
        )
        .await
    }

    async fn organization_search(&self, args: &ArgumentSet) -> Result<Value> {
        let query = args.to_query_pairs();
        self.cached_get(
            "search-organization",
            args,
            self.config.cache_ttl(),
            ORGANIZATIONS_PATH,
            &query,
        )
        .await
    }

    async fn organization_activities(
        &self,
        operation: &str,
        path: &str,
        organization: Option<i64>,
    ) -> Result<Value> {
        let args = self.bind(operation, &[organization.map(Value::from)])?;
        let query = args.to_query_pairs();
        let namespace = operation.replace('_', "-");
        self.cached_get(&namespace, &args, self.config.cache_ttl(), path, &query)
            .await
    }
}
