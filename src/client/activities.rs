//! GraphQL lookups composed from the catalog.

use super::core::SriClient;
use crate::params::ArgumentSet;
use crate::Result;
use serde_json::Value;
use tracing::debug;

impl SriClient {
    /// Uncached GraphQL passthrough.
    pub async fn graphql(&self, query: &str) -> Result<Value> {
        self.transport.graphql(query).await
    }

    /// Compose and run the query of a catalog entity.
    ///
    /// `params` fills the template's identifiers and `fields` narrows the
    /// selection to the listed whitelisted fields. The result is the
    /// entity's root object when the catalog names one, else all of `data`.
    pub async fn query_entity(
        &self,
        entity: &str,
        params: &[(&str, &str)],
        fields: Option<&[&str]>,
    ) -> Result<Value> {
        let query = self.catalog.compose(entity, params, fields)?;
        let root = self.catalog.entity(entity)?.root.clone();

        let mut args = ArgumentSet::from_pairs(params.iter().copied());
        args.insert("query", query.as_str());
        let namespace = format!("graphql-{}", entity);

        debug!(entity, "graphql lookup");
        let transport = &self.transport;
        let query = query.as_str();
        let response: Value = self
            .fetch(&namespace, &args, self.config.cache_ttl(), move || async move {
                transport.execute_graphql(query).await.map(|(raw, _)| raw)
            })
            .await?;

        let mut data = response.get("data").cloned().unwrap_or(Value::Null);
        Ok(match root {
            Some(root) => data.get_mut(&root).map(Value::take).unwrap_or(Value::Null),
            None => data,
        })
    }

    /// Activities timeline as a flat list of nodes.
    pub async fn get_activities_timeline(&self, fields: Option<&[&str]>) -> Result<Value> {
        let timeline = self.query_entity("activities_timelines", &[], fields).await?;
        let nodes = timeline
            .get("edges")
            .and_then(Value::as_array)
            .map(|edges| {
                edges
                    .iter()
                    .filter_map(|edge| edge.get("node"))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        Ok(Value::Array(nodes))
    }

    pub async fn get_activity_detail(&self, id: &str, fields: Option<&[&str]>) -> Result<Value> {
        self.query_entity("activity_timeline", &[("id", id)], fields)
            .await
    }

    pub async fn get_organization_detail(&self, id: i64, fields: Option<&[&str]>) -> Result<Value> {
        let id = id.to_string();
        self.query_entity("strategy_organization", &[("id", id.as_str())], fields)
            .await
    }
}
