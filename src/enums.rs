//! Enumerated field mappings between raw integers and symbolic labels.

/// An ordered bijection between raw integer values and labels.
///
/// Duplicates are kept as declared and reported when the owning schema is
/// compiled, so that the error can name the field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnumMapping {
    entries: Vec<(i64, String)>,
}

impl EnumMapping {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (i64, S)>,
        S: Into<String>,
    {
        EnumMapping {
            entries: entries
                .into_iter()
                .map(|(value, label)| (value, label.into()))
                .collect(),
        }
    }

    /// Returns the label for a raw value.
    pub fn label(&self, value: i64) -> Option<&str> {
        self.entries
            .iter()
            .find(|(v, _)| *v == value)
            .map(|(_, label)| label.as_str())
    }

    /// Returns the raw value for a label.
    pub fn value(&self, label: &str) -> Option<i64> {
        self.entries
            .iter()
            .find(|(_, l)| l == label)
            .map(|(value, _)| *value)
    }

    pub fn contains(&self, value: i64) -> bool {
        self.label(value).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, &str)> {
        self.entries.iter().map(|(v, l)| (*v, l.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First raw value that appears twice, if any.
    pub(crate) fn duplicate_value(&self) -> Option<i64> {
        self.entries
            .iter()
            .enumerate()
            .find(|(i, (v, _))| self.entries[..*i].iter().any(|(prev, _)| prev == v))
            .map(|(_, (v, _))| *v)
    }
}

impl<S: Into<String>> FromIterator<(i64, S)> for EnumMapping {
    fn from_iter<I: IntoIterator<Item = (i64, S)>>(iter: I) -> Self {
        EnumMapping::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_both_ways() {
        let mapping = EnumMapping::new([(0, "TEMPERATURE"), (1, "HUMIDITY")]);
        assert_eq!(mapping.label(1), Some("HUMIDITY"));
        assert_eq!(mapping.value("TEMPERATURE"), Some(0));
        assert_eq!(mapping.label(2), None);
        assert_eq!(mapping.value("PRESSURE"), None);
        assert!(mapping.contains(0));
        assert_eq!(mapping.len(), 2);
    }

    #[test]
    fn test_iter_keeps_declaration_order() {
        let mapping: EnumMapping = [(5, "B"), (1, "A")].into_iter().collect();
        assert_eq!(mapping.iter().collect::<Vec<_>>(), vec![(5, "B"), (1, "A")]);
    }

    #[test]
    fn test_duplicate_value() {
        assert_eq!(EnumMapping::new([(1, "A"), (2, "B")]).duplicate_value(), None);
        assert_eq!(
            EnumMapping::new([(1, "A"), (2, "B"), (1, "C")]).duplicate_value(),
            Some(1)
        );
    }
}
