//! Fixed analytical query templates used by the dashboard
//!
//! User-selected values are bound as named parameters (`$name`) and sent
//! next to the statement, never spliced into it.

use crate::error::{ColumnarError, Result};
use crate::session::{QueryResult, Session};
use serde_json::{Map, Value};

/// A statement plus the named parameters it expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryTemplate {
    pub name: &'static str,
    pub statement: &'static str,
    /// Parameter names without the leading `$`
    pub parameters: &'static [&'static str],
    /// Parameters bound to `null` when no value is given
    pub optional: &'static [&'static str],
}

impl QueryTemplate {
    /// Check `values` against the declared parameters.
    ///
    /// Extra values are dropped so nothing undeclared reaches the engine.
    pub fn bind(&self, values: &Map<String, Value>) -> Result<Map<String, Value>> {
        let mut bound = Map::new();
        for name in self.parameters {
            let value = lookup(values, name)
                .ok_or_else(|| ColumnarError::MissingParameter((*name).to_string()))?;
            bound.insert((*name).to_string(), value.clone());
        }
        for name in self.optional {
            let value = lookup(values, name).cloned().unwrap_or(Value::Null);
            bound.insert((*name).to_string(), value);
        }
        Ok(bound)
    }

    /// Bind `values` and run the template on `session`.
    pub fn run(&self, session: &Session, values: &Map<String, Value>) -> Result<QueryResult> {
        let params = self.bind(values)?;
        session.query_with(self.statement, params)
    }
}

fn lookup<'a>(values: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    values
        .get(name)
        .or_else(|| values.get(&format!("${}", name)))
}

/// Ten customers with the highest total transaction amount.
pub const TOP_SPENDERS: QueryTemplate = QueryTemplate {
    name: "top_spenders",
    statement: r#"SELECT c.name, SUM(amt.amount) AS total_spend
FROM `customers` c
JOIN `accounts` a ON ANY acc IN c.accounts SATISFIES acc = a.account_id END
JOIN `transactions` t ON a.account_id = t.account_id
UNNEST t.transactions AS amt
GROUP BY c.name
ORDER BY total_spend DESC
LIMIT 10"#,
    parameters: &[],
    optional: &[],
};

/// Spend per customer for one transaction category.
pub const SPEND_BY_CATEGORY: QueryTemplate = QueryTemplate {
    name: "spend_by_category",
    statement: r#"SELECT c.name, SUM(amt.amount) AS total_spend
FROM `customers` c
JOIN `accounts` a ON ANY acc IN c.accounts SATISFIES acc = a.account_id END
JOIN `transactions` t ON a.account_id = t.account_id
UNNEST t.transactions AS amt
WHERE amt.category = $category
GROUP BY c.name
ORDER BY total_spend DESC
LIMIT 10"#,
    parameters: &["category"],
    optional: &[],
};

/// Customer names with their `geo` coordinates, for the map.
///
/// `$state` narrows the rows to one state; `null` keeps every state.
pub const CUSTOMER_LOCATIONS: QueryTemplate = QueryTemplate {
    name: "customer_locations",
    statement: r#"SELECT c.name, c.address.state AS state, c.address.geo AS geo
FROM `customers` c
WHERE c.address.geo IS NOT UNKNOWN
  AND ($state IS NULL OR c.address.state = $state)
ORDER BY c.name
LIMIT 500"#,
    parameters: &[],
    optional: &["state"],
};

/// All templates, in dashboard order.
pub const ALL: [QueryTemplate; 3] = [TOP_SPENDERS, SPEND_BY_CATEGORY, CUSTOMER_LOCATIONS];
