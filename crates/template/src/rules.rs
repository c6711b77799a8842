//! Named rules that produce the value of `computed` fields.

use crate::values::{DATE_FORMAT, FieldValue, OrderData};
use crate::RenderMetadata;
use annex9_types::TemplateVersionId;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Inputs available to a rule.
pub struct RuleContext<'a> {
    pub data: &'a OrderData,
    pub metadata: &'a RenderMetadata,
    pub template: &'a TemplateVersionId,
}

/// A rule returns the text to print, or the reason it cannot.
pub type RuleFn = dyn Fn(&RuleContext<'_>) -> Result<String, String> + Send + Sync;

#[derive(Clone)]
pub struct RuleRegistry {
    rules: BTreeMap<String, Arc<RuleFn>>,
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &self.rules.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl RuleRegistry {
    pub fn empty() -> Self {
        Self {
            rules: BTreeMap::new(),
        }
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("order_reference", |ctx| Ok(ctx.metadata.reference.clone()));
        registry.register("generation_date", |ctx| {
            Ok(ctx.metadata.created_at.format(DATE_FORMAT).to_string())
        });
        registry.register("generation_timestamp", |ctx| {
            Ok(ctx.metadata.created_at.format("%d/%m/%Y %H:%M").to_string())
        });
        registry.register("reservation_reference", |ctx| {
            Ok(match ctx.data.get("reservation_number") {
                Some(FieldValue::Text(s)) => s.trim().to_string(),
                Some(FieldValue::Number(n)) => format_plain(*n),
                _ => ctx.metadata.reference.clone(),
            })
        });
        registry.register("passenger_total", |ctx| {
            let adults = count(ctx.data, "passengers_adult")?;
            let children = count(ctx.data, "passengers_child")?;
            Ok(format_plain(adults + children))
        });
        registry
    }

    /// Adds or replaces the rule called `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, rule: F)
    where
        F: Fn(&RuleContext<'_>) -> Result<String, String> + Send + Sync + 'static,
    {
        self.rules.insert(name.into(), Arc::new(rule));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn evaluate(&self, name: &str, ctx: &RuleContext<'_>) -> Result<String, String> {
        let rule = self
            .rules
            .get(name)
            .ok_or_else(|| format!("unknown rule '{name}'"))?;
        rule(ctx)
    }
}

fn count(data: &OrderData, key: &str) -> Result<f64, String> {
    match data.get(key) {
        None => Ok(0.0),
        Some(FieldValue::Number(n)) => Ok(*n),
        Some(FieldValue::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("'{key}' is not a number: '{s}'")),
        Some(other) => Err(format!("'{key}' is not a number: {other:?}")),
    }
}

/// Whole numbers without a fractional part, everything else as is.
pub(crate) fn format_plain(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}
