use super::attribute::Attribute;
use super::types::AttributeType;

/// Ordered, mutable list of attributes.
///
/// Lookups are first-match linear searches; per-request lists are small
/// enough that no index structure is warranted. Duplicate types are
/// permitted and preserved in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairList {
    pairs: Vec<Attribute>,
}

impl PairList {
    pub fn new() -> Self {
        PairList { pairs: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Append an attribute to the end of the list.
    pub fn push(&mut self, attribute: Attribute) {
        self.pairs.push(attribute);
    }

    /// First attribute of the given type, if any.
    pub fn find(&self, attr_type: AttributeType) -> Option<&Attribute> {
        self.pairs.iter().find(|p| p.attr_type == attr_type)
    }

    /// First attribute matching any of the candidate types, tried in
    /// candidate order (not list order).
    pub fn find_any(&self, candidates: &[AttributeType]) -> Option<&Attribute> {
        candidates.iter().find_map(|&attr_type| self.find(attr_type))
    }

    /// Remove the first attribute of the given type, returning it.
    pub fn remove(&mut self, attr_type: AttributeType) -> Option<Attribute> {
        let idx = self.pairs.iter().position(|p| p.attr_type == attr_type)?;
        Some(self.pairs.remove(idx))
    }

    /// Move every entry of `source` onto the end of this list, leaving
    /// `source` empty.
    pub fn move_append(&mut self, source: &mut PairList) {
        self.pairs.append(&mut source.pairs);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.pairs.iter()
    }
}

impl FromIterator<Attribute> for PairList {
    fn from_iter<I: IntoIterator<Item = Attribute>>(iter: I) -> Self {
        PairList {
            pairs: iter.into_iter().collect(),
        }
    }
}
