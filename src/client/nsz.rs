//! NSZ (occupational standard) lookups.

use super::core::SriClient;
use crate::params::ArgumentSet;
use crate::transport::Method;
use crate::Result;
use serde_json::Value;

impl SriClient {
    /// One occupational standard by its numeric ID.
    pub async fn get_nsz_by_id(&self, id: i64) -> Result<Value> {
        let args = ArgumentSet::from_pairs([("id", id)]);
        let path = format!("api/nszs/{}.json", id);
        self.cached_get("nsz-by-id", &args, self.config.nsz_cache_ttl(), &path, &[])
            .await
    }

    /// Unpaginated standard list.
    ///
    /// `query` overrides the default `pagination=false`; `body` is sent as
    /// the JSON request body when non-empty.
    pub async fn get_nsz_list(&self, query: &ArgumentSet, body: &ArgumentSet) -> Result<Value> {
        // Query and body are keyed apart so a body value is never shadowed
        // by a query parameter of the same name.
        let mut args = ArgumentSet::new();
        args.insert_non_empty("query", serde_json::to_value(query)?);
        args.insert_non_empty("body", serde_json::to_value(body)?);

        let mut request_query = query.clone();
        request_query.merge_missing(&ArgumentSet::from_pairs([("pagination", false)]));
        let pairs = request_query.to_query_pairs();

        let body = if body.is_empty() {
            None
        } else {
            Some(serde_json::to_string(body)?)
        };

        let transport = &self.transport;
        let pairs = pairs.as_slice();
        self.fetch("nsz-list", &args, self.config.nsz_cache_ttl(), move || {
            transport.request(Method::Get, "api/nszs.json", Some(pairs), body)
        })
        .await
    }

    /// ISCO classifications of all standards, or just the values of `field`
    /// from the items that carry it.
    pub async fn get_nsz_iscos(&self, field: Option<&str>) -> Result<Value> {
        let query = vec![("pagination".to_string(), "false".to_string())];
        let list = self
            .cached_get(
                "nsz-iscos",
                &ArgumentSet::new(),
                self.config.nsz_cache_ttl(),
                "api/nsz_iscos.json",
                &query,
            )
            .await?;

        let Some(field) = field else {
            return Ok(list);
        };
        let values: Vec<Value> = list
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.get(field))
                    .filter(|v| !v.is_null())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(Value::Array(values))
    }
}
