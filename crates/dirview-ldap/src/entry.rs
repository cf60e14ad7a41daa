//! Raw directory entries as returned by a search.

/// Raw LDAP entry: a DN and its attributes in the order the backend delivered them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LdapEntry {
    /// Distinguished name of the entry.
    pub dn: String,
    /// Attribute name and values pairs.
    pub attributes: Vec<(String, Vec<String>)>,
}

impl LdapEntry {
    /// Creates an entry with no attributes.
    #[must_use]
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: Vec::new(),
        }
    }

    /// Appends an attribute with its values.
    #[must_use]
    pub fn with_attribute<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes
            .push((name.into(), values.into_iter().map(Into::into).collect()));
        self
    }

    /// Returns the first value of the attribute if present.
    #[must_use]
    pub fn first(&self, attribute: &str) -> Option<&str> {
        self.values(attribute)
            .and_then(|values| values.first().map(String::as_str))
    }

    /// Returns all values of the first attribute with that name.
    #[must_use]
    pub fn values(&self, attribute: &str) -> Option<&[String]> {
        self.attributes
            .iter()
            .find(|(name, _)| name == attribute)
            .map(|(_, values)| values.as_slice())
    }

    /// Iterates over every value list stored under `attribute` (an attribute may repeat).
    pub fn all_values<'a>(&'a self, attribute: &'a str) -> impl Iterator<Item = &'a String> + 'a {
        self.attributes
            .iter()
            .filter(move |(name, _)| name == attribute)
            .flat_map(|(_, values)| values.iter())
    }
}
