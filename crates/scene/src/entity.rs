use std::fmt;

/// Stable identity of an entity across frames.
///
/// Keys are assigned by the upstream data source and never mutated here;
/// reconciliation matches entities between frames purely by key equality.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityKey(String);

impl EntityKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

/// A measure driving fill color: numeric or categorical.
#[derive(Debug, Clone, PartialEq)]
pub enum Measure {
    Number(f64),
    Category(String),
}

/// One data point for one time frame.
///
/// All measure fields are optional: the engine decides per frame whether an
/// entity is renderable. `size` of zero is a valid, renderable value,
/// distinct from absent.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub key: EntityKey,
    pub lon: Option<f64>,
    pub lat: Option<f64>,
    pub size: Option<f64>,
    pub color: Option<Measure>,
    /// Display label as ordered dimension/value pairs.
    pub label: Vec<(String, String)>,
}

impl Entity {
    pub fn new(key: impl Into<EntityKey>) -> Self {
        Self {
            key: key.into(),
            lon: None,
            lat: None,
            size: None,
            color: None,
            label: Vec::new(),
        }
    }

    /// An entity can be positioned and sized only when all three measures
    /// are present. Note `Some(0.0)` is a present size.
    pub fn is_renderable(&self) -> bool {
        self.size.is_some() && self.lon.is_some() && self.lat.is_some()
    }

    /// Label values joined across dimensions, frame dimension excluded
    /// upstream.
    pub fn label_text(&self) -> String {
        self.label
            .iter()
            .map(|(_, v)| v.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl From<&str> for Entity {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

#[cfg(test)]
mod tests {
    use super::Entity;

    #[test]
    fn zero_size_is_renderable_but_absent_size_is_not() {
        let mut e = Entity::new("swe");
        e.lon = Some(18.0);
        e.lat = Some(59.3);
        assert!(!e.is_renderable());

        e.size = Some(0.0);
        assert!(e.is_renderable());

        e.size = None;
        assert!(!e.is_renderable());
    }

    #[test]
    fn label_joins_dimension_values() {
        let mut e = Entity::new("swe");
        e.label = vec![
            ("geo".to_string(), "Sweden".to_string()),
            ("gender".to_string(), "female".to_string()),
        ];
        assert_eq!(e.label_text(), "Sweden female");
    }
}
