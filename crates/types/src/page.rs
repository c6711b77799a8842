//! Page size and orientation as declared by a template.

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum PageSize {
    #[default]
    A4,
    A5,
    Letter,
    Custom { width_mm: f32, height_mm: f32 },
}

impl PageSize {
    /// Portrait dimensions in millimetres.
    pub fn portrait_mm(&self) -> (f32, f32) {
        match *self {
            PageSize::A4 => (210.0, 297.0),
            PageSize::A5 => (148.0, 210.0),
            PageSize::Letter => (215.9, 279.4),
            PageSize::Custom { width_mm, height_mm } => (width_mm, height_mm),
        }
    }

    fn parse_named(name: &str) -> Result<Self, String> {
        match name.trim().to_ascii_uppercase().as_str() {
            "A4" => Ok(PageSize::A4),
            "A5" => Ok(PageSize::A5),
            "LETTER" => Ok(PageSize::Letter),
            other => Err(format!("Unknown page size '{}'", other)),
        }
    }
}

impl<'de> Deserialize<'de> for PageSize {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum PageSizeDef {
            Named(String),
            Custom { width_mm: f32, height_mm: f32 },
        }

        match PageSizeDef::deserialize(deserializer)? {
            PageSizeDef::Named(name) => Self::parse_named(&name).map_err(de::Error::custom),
            PageSizeDef::Custom { width_mm, height_mm } => {
                if width_mm <= 0.0 || height_mm <= 0.0 {
                    return Err(de::Error::custom("page dimensions must be positive"));
                }
                Ok(PageSize::Custom { width_mm, height_mm })
            }
        }
    }
}

impl Serialize for PageSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        match self {
            PageSize::A4 => serializer.serialize_str("A4"),
            PageSize::A5 => serializer.serialize_str("A5"),
            PageSize::Letter => serializer.serialize_str("Letter"),
            PageSize::Custom { width_mm, height_mm } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("width_mm", width_mm)?;
                map.serialize_entry("height_mm", height_mm)?;
                map.end()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// The `page` block of a template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageSpec {
    #[serde(default)]
    pub size: PageSize,
    #[serde(default)]
    pub orientation: Orientation,
}

impl PageSpec {
    /// Effective (width, height) in millimetres after applying the orientation.
    pub fn dimensions_mm(&self) -> (f32, f32) {
        let (w, h) = self.size.portrait_mm();
        match self.orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        }
    }

    pub fn width_mm(&self) -> f32 {
        self.dimensions_mm().0
    }

    pub fn height_mm(&self) -> f32 {
        self.dimensions_mm().1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_and_custom_sizes() {
        let a4: PageSpec = serde_json::from_str(r#"{"size":"A4","orientation":"portrait"}"#).unwrap();
        assert_eq!(a4.dimensions_mm(), (210.0, 297.0));

        let custom: PageSpec =
            serde_json::from_str(r#"{"size":{"width_mm":100,"height_mm":50}}"#).unwrap();
        assert_eq!(custom.dimensions_mm(), (100.0, 50.0));
    }

    #[test]
    fn test_landscape_swaps_dimensions() {
        let spec = PageSpec { size: PageSize::A4, orientation: Orientation::Landscape };
        assert_eq!(spec.dimensions_mm(), (297.0, 210.0));
    }

    #[test]
    fn test_unknown_size_is_rejected() {
        let result: Result<PageSpec, _> = serde_json::from_str(r#"{"size":"B52"}"#);
        assert!(result.is_err());
    }
}
