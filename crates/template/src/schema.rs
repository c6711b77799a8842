//! The JSON layout format of a template version.

use annex9_layout::ShrinkPolicy;
use annex9_types::{Align, Color, FieldKey, MmRect, PageSpec, TemplateVersionId};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateDefinition {
    pub version: TemplateVersionId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub page: PageSpec,
    #[serde(default)]
    pub fonts: Vec<FontDecl>,
    /// Font of fields and labels that do not name one.
    #[serde(default)]
    pub default_font: FontRef,
    /// Resource path of a one-page PDF; `None` draws on a blank page.
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub decorations: Vec<Decoration>,
    pub fields: Vec<FieldSpec>,
}

/// A font the template may use. Without a `path` the name must be one of
/// the built-in standard fonts.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FontDecl {
    pub name: String,
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FontRef {
    pub name: String,
    pub size: f32,
}

impl Default for FontRef {
    fn default() -> Self {
        Self {
            name: "Helvetica".to_string(),
            size: 10.0,
        }
    }
}

/// `true`/absent: default policy, `false`: off, object: custom policy.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ShrinkSetting {
    Toggle(bool),
    Policy(ShrinkPolicy),
}

impl Default for ShrinkSetting {
    fn default() -> Self {
        ShrinkSetting::Toggle(true)
    }
}

impl ShrinkSetting {
    pub fn resolve(&self, default: ShrinkPolicy) -> Option<ShrinkPolicy> {
        match self {
            ShrinkSetting::Toggle(true) => Some(default),
            ShrinkSetting::Toggle(false) => None,
            ShrinkSetting::Policy(policy) => Some(*policy),
        }
    }
}

/// One entry of a `choice` field: a bare label, or a stored value with the
/// label printed on the form.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ChoiceOption {
    Label(String),
    Pair { value: String, label: String },
}

impl ChoiceOption {
    pub fn value(&self) -> &str {
        match self {
            ChoiceOption::Label(label) => label,
            ChoiceOption::Pair { value, .. } => value,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            ChoiceOption::Label(label) => label,
            ChoiceOption::Pair { label, .. } => label,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Textarea,
    Date,
    Time,
    Number,
    Checkbox,
    SignatureBlock,
    StampBlock,
    Computed,
    Choice,
}

/// Field type together with its type-specific options.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text,
    Textarea,
    Date,
    Time,
    Number { decimals: u8, suffix: Option<String> },
    Checkbox { checked_value: Option<String> },
    SignatureBlock,
    StampBlock,
    Computed { rule: String },
    Choice { options: Vec<ChoiceOption> },
}

impl FieldKind {
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldKind::Text => FieldType::Text,
            FieldKind::Textarea => FieldType::Textarea,
            FieldKind::Date => FieldType::Date,
            FieldKind::Time => FieldType::Time,
            FieldKind::Number { .. } => FieldType::Number,
            FieldKind::Checkbox { .. } => FieldType::Checkbox,
            FieldKind::SignatureBlock => FieldType::SignatureBlock,
            FieldKind::StampBlock => FieldType::StampBlock,
            FieldKind::Computed { .. } => FieldType::Computed,
            FieldKind::Choice { .. } => FieldType::Choice,
        }
    }

    /// Whether values of this kind go through text layout.
    pub fn draws_text(&self) -> bool {
        !matches!(
            self,
            FieldKind::Checkbox { .. } | FieldKind::SignatureBlock | FieldKind::StampBlock
        )
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawField")]
pub struct FieldSpec {
    pub key: FieldKey,
    pub kind: FieldKind,
    pub required: bool,
    pub box_mm: MmRect,
    pub font: Option<FontRef>,
    pub wrap: bool,
    pub align: Align,
    pub shrink: ShrinkSetting,
    pub baseline_mm: Option<f32>,
    /// Order data key to read, when it differs from `key`.
    pub source: Option<String>,
}

impl FieldSpec {
    pub fn source_key(&self) -> &str {
        self.source.as_deref().unwrap_or(self.key.as_str())
    }

    pub fn font_or<'a>(&'a self, default: &'a FontRef) -> &'a FontRef {
        self.font.as_ref().unwrap_or(default)
    }
}

/// Flat wire form of a field; converted into [`FieldSpec`] so that options
/// belonging to another type are rejected.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawField {
    key: FieldKey,
    #[serde(rename = "type")]
    field_type: FieldType,
    #[serde(default)]
    required: bool,
    box_mm: MmRect,
    #[serde(default)]
    font: Option<FontRef>,
    #[serde(default)]
    wrap: Option<bool>,
    #[serde(default)]
    align: Option<Align>,
    #[serde(default)]
    shrink: ShrinkSetting,
    #[serde(default)]
    baseline_mm: Option<f32>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    rule: Option<String>,
    #[serde(default)]
    decimals: Option<u8>,
    #[serde(default)]
    suffix: Option<String>,
    #[serde(default)]
    checked_value: Option<String>,
    #[serde(default)]
    options: Option<Vec<ChoiceOption>>,
}

impl TryFrom<RawField> for FieldSpec {
    type Error = String;

    fn try_from(raw: RawField) -> Result<Self, Self::Error> {
        let key = raw.key;
        let misplaced = |option: &str, owner: &str| {
            format!("field '{key}': `{option}` only applies to {owner} fields")
        };

        if raw.field_type != FieldType::Computed && raw.rule.is_some() {
            return Err(misplaced("rule", "computed"));
        }
        if raw.field_type != FieldType::Number && (raw.decimals.is_some() || raw.suffix.is_some()) {
            return Err(misplaced("decimals/suffix", "number"));
        }
        if raw.field_type != FieldType::Checkbox && raw.checked_value.is_some() {
            return Err(misplaced("checked_value", "checkbox"));
        }
        if raw.field_type != FieldType::Choice && raw.options.is_some() {
            return Err(misplaced("options", "choice"));
        }

        let kind = match raw.field_type {
            FieldType::Text => FieldKind::Text,
            FieldType::Textarea => FieldKind::Textarea,
            FieldType::Date => FieldKind::Date,
            FieldType::Time => FieldKind::Time,
            FieldType::Number => FieldKind::Number {
                decimals: raw.decimals.unwrap_or(2),
                suffix: raw.suffix,
            },
            FieldType::Checkbox => FieldKind::Checkbox {
                checked_value: raw.checked_value,
            },
            FieldType::SignatureBlock => FieldKind::SignatureBlock,
            FieldType::StampBlock => FieldKind::StampBlock,
            FieldType::Computed => FieldKind::Computed {
                rule: raw
                    .rule
                    .ok_or_else(|| format!("computed field '{key}' needs a `rule`"))?,
            },
            FieldType::Choice => match raw.options {
                Some(options) if !options.is_empty() => FieldKind::Choice { options },
                _ => return Err(format!("choice field '{key}' needs non-empty `options`")),
            },
        };

        let align = raw.align.unwrap_or(match kind {
            FieldKind::Number { .. } => Align::Right,
            FieldKind::Checkbox { .. } => Align::Center,
            _ => Align::Left,
        });

        Ok(FieldSpec {
            wrap: raw.wrap.unwrap_or(kind == FieldKind::Textarea),
            kind,
            key,
            required: raw.required,
            box_mm: raw.box_mm,
            font: raw.font,
            align,
            shrink: raw.shrink,
            baseline_mm: raw.baseline_mm,
            source: raw.source,
        })
    }
}

fn default_stroke_width() -> f32 {
    0.5
}

/// Static artwork drawn beneath the fields.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Decoration {
    /// A label whose baseline starts at (`x_mm`, `y_mm`) from the top-left
    /// corner. With `center`/`right` alignment, `x_mm` is the centre/end.
    Text {
        x_mm: f32,
        y_mm: f32,
        text: String,
        #[serde(default)]
        font: Option<FontRef>,
        #[serde(default)]
        align: Align,
        #[serde(default)]
        color: Option<Color>,
    },
    Line {
        from_mm: [f32; 2],
        to_mm: [f32; 2],
        #[serde(default = "default_stroke_width")]
        width_pt: f32,
        #[serde(default)]
        color: Option<Color>,
    },
    Rect {
        box_mm: MmRect,
        #[serde(default)]
        fill: Option<Color>,
        #[serde(default)]
        stroke: Option<Color>,
        #[serde(default = "default_stroke_width")]
        width_pt: f32,
    },
}
