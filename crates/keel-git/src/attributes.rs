//! Parser for `git check-attr -z` output.
//!
//! With `-z`, every result is three NUL-terminated fields in this order:
//!
//! ```text
//! <path> NUL <attribute> NUL <value> NUL
//! ```
//!
//! The value is `unspecified`, `set`, `unset` or the literal assigned value.

/// Attribute marking a tracked file as machine-generated.
pub const LINGUIST_GENERATED: &str = "linguist-generated";

/// One `path, attribute, value` result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeRecord {
    /// Repository-relative path.
    pub path: String,
    /// Attribute name that was queried.
    pub attribute: String,
    /// Attribute value for the path.
    pub value: String,
}

/// Decoded `check-attr` output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckAttrOutput {
    records: Vec<AttributeRecord>,
    trailing: Vec<String>,
}

impl CheckAttrOutput {
    /// Decodes raw `check-attr -z` output.
    ///
    /// A missing final terminator is accepted. Fields left over after the
    /// last complete triple are kept aside, see [`trailing`](Self::trailing).
    pub fn parse(bytes: &[u8]) -> Self {
        let body = bytes.strip_suffix(b"\0").unwrap_or(bytes);
        if body.is_empty() {
            return Self::default();
        }

        let fields: Vec<String> = body
            .split(|b| *b == 0)
            .map(|field| String::from_utf8_lossy(field).into_owned())
            .collect();

        let mut triples = fields.chunks_exact(3);
        let records = triples
            .by_ref()
            .map(|triple| AttributeRecord {
                path: triple[0].clone(),
                attribute: triple[1].clone(),
                value: triple[2].clone(),
            })
            .collect();
        let trailing = triples.remainder().to_vec();

        Self { records, trailing }
    }

    /// Complete records, in output order.
    pub fn records(&self) -> &[AttributeRecord] {
        &self.records
    }

    /// Fields that did not form a complete record.
    pub fn trailing(&self) -> &[String] {
        &self.trailing
    }

    /// Returns true if the output was a whole number of records.
    pub fn is_aligned(&self) -> bool {
        self.trailing.is_empty()
    }

    /// Paths whose `attribute` is set to the literal value `true`.
    pub fn paths_set_true(&self, attribute: &str) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| r.attribute == attribute && r.value == "true")
            .map(|r| r.path.clone())
            .collect()
    }
}
