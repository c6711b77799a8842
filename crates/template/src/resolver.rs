//! Pairing template fields with order values.

use crate::rules::{RuleContext, format_plain};
use crate::schema::{ChoiceOption, FieldKind, FieldSpec};
use crate::values::{DATE_FORMAT, FieldValue, OrderData, TIME_FORMAT};
use crate::{RenderMetadata, RuleRegistry, TemplateError, TemplateLoader, TemplateVersion, ValidationError};
use annex9_types::TemplateVersionId;
use chrono::{NaiveDate, NaiveTime};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// A field value in the form the renderer draws it.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedValue {
    /// Nothing to draw.
    Blank,
    Text(String),
    Checked(bool),
    /// Index into the field's options.
    Choice { selected: Option<usize> },
    Image(Arc<Vec<u8>>),
}

#[derive(Debug, Clone)]
pub struct ResolvedField<'t> {
    pub spec: &'t FieldSpec,
    pub value: ResolvedValue,
}

/// Loads template versions once and resolves order data against them.
///
/// Loaded versions are cached by id and never reloaded; publishing a layout
/// change means publishing a new id.
#[derive(Debug)]
pub struct TemplateResolver {
    loader: TemplateLoader,
    cache: RwLock<HashMap<TemplateVersionId, Arc<TemplateVersion>>>,
}

impl TemplateResolver {
    pub fn new(loader: TemplateLoader) -> Self {
        Self {
            loader,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn rules(&self) -> &RuleRegistry {
        self.loader.rules()
    }

    pub fn load(&self, id: &str) -> Result<Arc<TemplateVersion>, TemplateError> {
        let key = TemplateVersionId::from(id);
        if let Some(version) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(version.clone());
        }

        let loaded = Arc::new(self.loader.load(id)?);
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        // Another thread may have loaded it meanwhile; keep the first instance.
        Ok(cache.entry(key).or_insert(loaded).clone())
    }

    pub fn preload<'a>(&self, ids: impl IntoIterator<Item = &'a str>) -> Result<(), TemplateError> {
        for id in ids {
            self.load(id)?;
        }
        Ok(())
    }

    pub fn cached_versions(&self) -> Vec<TemplateVersionId> {
        let mut ids: Vec<_> = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    /// Resolves every field of `template`, in declaration order.
    ///
    /// Fails on the first required field without a value and on the first
    /// value that does not match its field type.
    pub fn resolve<'t>(
        &self,
        template: &'t TemplateVersion,
        data: &OrderData,
        metadata: &RenderMetadata,
    ) -> Result<Vec<ResolvedField<'t>>, ValidationError> {
        metadata.validate()?;
        let ctx = RuleContext {
            data,
            metadata,
            template: &template.id,
        };
        template
            .fields
            .iter()
            .map(|spec| {
                let value = self.resolve_field(spec, &ctx)?;
                let fillable = !matches!(spec.kind, FieldKind::StampBlock);
                if spec.required && fillable && value == ResolvedValue::Blank {
                    return Err(ValidationError::missing(spec.key.as_str()));
                }
                Ok(ResolvedField { spec, value })
            })
            .collect()
    }

    fn resolve_field(
        &self,
        spec: &FieldSpec,
        ctx: &RuleContext<'_>,
    ) -> Result<ResolvedValue, ValidationError> {
        let key = spec.key.as_str();
        let fail = |reason: String| ValidationError::new(key, reason);

        match &spec.kind {
            FieldKind::StampBlock => return Ok(ResolvedValue::Blank),
            FieldKind::Computed { rule } => {
                let text = self.loader.rules().evaluate(rule, ctx).map_err(fail)?;
                return Ok(text_or_blank(text));
            }
            _ => {}
        }

        let Some(value) = ctx.data.get(spec.source_key()) else {
            return Ok(match &spec.kind {
                FieldKind::Choice { .. } if !spec.required => ResolvedValue::Choice { selected: None },
                _ => ResolvedValue::Blank,
            });
        };

        let resolved = match (&spec.kind, value) {
            (FieldKind::Text | FieldKind::Textarea, value) => text_or_blank(as_text(value).ok_or_else(
                || fail(format!("expected text, got {}", describe(value))),
            )?),
            (FieldKind::Date, FieldValue::Date(date)) => {
                ResolvedValue::Text(date.format(DATE_FORMAT).to_string())
            }
            (FieldKind::Date, FieldValue::Text(s)) => {
                let date = NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
                    .map_err(|_| fail(format!("'{s}' is not a date in DD/MM/YYYY form")))?;
                ResolvedValue::Text(date.format(DATE_FORMAT).to_string())
            }
            (FieldKind::Time, FieldValue::Time(time)) => {
                ResolvedValue::Text(time.format(TIME_FORMAT).to_string())
            }
            (FieldKind::Time, FieldValue::Text(s)) => {
                let time = NaiveTime::parse_from_str(s.trim(), TIME_FORMAT)
                    .map_err(|_| fail(format!("'{s}' is not a time in HH:MM form")))?;
                ResolvedValue::Text(time.format(TIME_FORMAT).to_string())
            }
            (FieldKind::Number { decimals, suffix }, value) => {
                let n = match value {
                    FieldValue::Number(n) => *n,
                    FieldValue::Text(s) => s
                        .trim()
                        .replace(',', ".")
                        .parse::<f64>()
                        .map_err(|_| fail(format!("'{s}' is not a number")))?,
                    other => return Err(fail(format!("expected a number, got {}", describe(other)))),
                };
                if !n.is_finite() {
                    return Err(fail(format!("{n} is not a finite number")));
                }
                let mut text = format!("{:.*}", *decimals as usize, n);
                if let Some(suffix) = suffix {
                    text.push_str(suffix);
                }
                ResolvedValue::Text(text)
            }
            (FieldKind::Checkbox { checked_value }, value) => {
                ResolvedValue::Checked(match (checked_value, value) {
                    (_, FieldValue::Bool(b)) => *b,
                    (Some(expected), FieldValue::Text(s)) => s.trim() == expected,
                    (None, FieldValue::Text(s)) => match s.trim().to_ascii_lowercase().as_str() {
                        "true" | "yes" | "oui" | "1" => true,
                        "false" | "no" | "non" | "0" => false,
                        _ => return Err(fail(format!("'{s}' is not a yes/no value"))),
                    },
                    (_, other) => {
                        return Err(fail(format!("expected a boolean, got {}", describe(other))));
                    }
                })
            }
            (FieldKind::Choice { options }, FieldValue::Text(s)) => {
                let wanted = s.trim();
                let index = options
                    .iter()
                    .position(|option| {
                        option.value().eq_ignore_ascii_case(wanted)
                            || option.label().eq_ignore_ascii_case(wanted)
                    })
                    .ok_or_else(|| {
                        let known: Vec<_> = options.iter().map(ChoiceOption::value).collect();
                        fail(format!("'{wanted}' is not one of {}", known.join(", ")))
                    })?;
                ResolvedValue::Choice {
                    selected: Some(index),
                }
            }
            (FieldKind::SignatureBlock, FieldValue::Image(bytes)) => ResolvedValue::Image(bytes.clone()),
            (kind, other) => {
                return Err(fail(format!(
                    "{:?} field cannot take {}",
                    kind.field_type(),
                    describe(other)
                )));
            }
        };
        Ok(resolved)
    }
}

fn text_or_blank(text: String) -> ResolvedValue {
    if text.trim().is_empty() {
        ResolvedValue::Blank
    } else {
        ResolvedValue::Text(text)
    }
}

fn as_text(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Text(s) => Some(s.clone()),
        FieldValue::Number(n) => Some(format_plain(*n)),
        FieldValue::Date(d) => Some(d.format(DATE_FORMAT).to_string()),
        FieldValue::Time(t) => Some(t.format(TIME_FORMAT).to_string()),
        FieldValue::Bool(_) | FieldValue::Image(_) => None,
    }
}

fn describe(value: &FieldValue) -> &'static str {
    match value {
        FieldValue::Text(_) => "text",
        FieldValue::Number(_) => "a number",
        FieldValue::Bool(_) => "a boolean",
        FieldValue::Date(_) => "a date",
        FieldValue::Time(_) => "a time",
        FieldValue::Image(_) => "image bytes",
    }
}
