use std::cell::OnceCell;
use std::collections::HashMap;
use std::fmt;

/// Stable identifier of a record, unique within one content list
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordId {
    Int(i64),
    Str(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(n) => write!(f, "{}", n),
            RecordId::Str(s) => write!(f, "{}", s),
        }
    }
}

macro_rules! int_record_id {
    ($($t:ty),*) => {
        $(
            impl From<$t> for RecordId {
                fn from(n: $t) -> Self {
                    RecordId::Int(n as i64)
                }
            }
        )*
    };
}

int_record_id!(i32, i64, u32, u64, usize);

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId::Str(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        RecordId::Str(s)
    }
}

/// What the query evaluator searches in
#[derive(Debug, Clone)]
pub enum Searchable {
    /// A single blob of text, searched as a whole
    Text(String),
    /// Named values plus the names searched by field-less terms
    Fields {
        values: HashMap<String, String>,
        default_fields: Vec<String>,
    },
}

/// One row of application data as the table sees it
#[derive(Debug, Clone)]
pub struct Record {
    pub id: RecordId,
    searchable: Searchable,
    /// Rendered cell contents, filled on first visual build
    fields: Option<Vec<String>>,
    search_text: OnceCell<String>,
    key_map: OnceCell<HashMap<String, String>>,
}

impl Record {
    pub fn new(id: impl Into<RecordId>, searchable: Searchable) -> Self {
        Self {
            id: id.into(),
            searchable,
            fields: None,
            search_text: OnceCell::new(),
            key_map: OnceCell::new(),
        }
    }

    /// Record searched as a single text blob
    pub fn text(id: impl Into<RecordId>, text: impl Into<String>) -> Self {
        Self::new(id, Searchable::Text(text.into()))
    }

    /// Record with named values; `default_fields` are what field-less terms search
    pub fn with_values<I, K, V>(id: impl Into<RecordId>, values: I, default_fields: &[&str]) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        let values = values
            .into_iter()
            .map(|(k, v)| (k.into(), v.to_string()))
            .collect();
        let default_fields = default_fields.iter().map(|s| s.to_string()).collect();
        Self::new(id, Searchable::Fields { values, default_fields })
    }

    pub fn searchable(&self) -> &Searchable {
        &self.searchable
    }

    /// Replace what the filter sees; the derived search caches are rebuilt
    /// on next use
    pub fn set_searchable(&mut self, searchable: Searchable) {
        self.searchable = searchable;
        self.search_text.take();
        self.key_map.take();
    }

    /// Pre-fill the rendered cells instead of waiting for the fill callback
    pub fn with_visual_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn fields(&self) -> Option<&[String]> {
        self.fields.as_deref()
    }

    pub fn set_fields(&mut self, fields: Vec<String>) {
        self.fields = Some(fields);
    }

    /// Drop the cached cells so the next build renders them again
    pub fn invalidate_fields(&mut self) {
        self.fields = None;
    }

    /// Lower-cased text searched by field-less terms
    pub fn search_text(&self) -> &str {
        self.search_text.get_or_init(|| match &self.searchable {
            Searchable::Text(text) => text.to_lowercase(),
            Searchable::Fields { values, default_fields } => default_fields
                .iter()
                .map(|name| values.get(name).map(String::as_str).unwrap_or(""))
                .collect::<Vec<_>>()
                .join(" ")
                .to_lowercase(),
        })
    }

    /// Look up a named value, exact key first, then ignoring case
    pub fn field_value(&self, name: &str) -> Option<&str> {
        let Searchable::Fields { values, .. } = &self.searchable else {
            return None;
        };

        if let Some(value) = values.get(name) {
            return Some(value);
        }

        let key_map = self.key_map.get_or_init(|| {
            values
                .keys()
                .map(|key| (key.to_lowercase(), key.clone()))
                .collect()
        });

        key_map
            .get(&name.to_lowercase())
            .and_then(|key| values.get(key))
            .map(String::as_str)
    }
}
