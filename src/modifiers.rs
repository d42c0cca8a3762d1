//! OData query modifier accumulation and serialization.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left verbatim in modifier values.
///
/// OData expressions use quotes, parentheses, slashes and commas as syntax,
/// so only the remaining reserved characters (space, `&`, `#`, `+`, `?`, ...)
/// are escaped.
const VALUE_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b',')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'/')
    .remove(b'*')
    .remove(b':')
    .remove(b'$')
    .remove(b'@')
    .remove(b'=');

/// Kind of OData query modifier.
///
/// [`ModifierKind::ALL`] defines the canonical serialization order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModifierKind {
    Select,
    Expand,
    Filter,
    Top,
    OrderBy,
    Skip,
    SkipToken,
}

impl ModifierKind {
    /// All kinds, in the order they appear in a query string.
    pub const ALL: [ModifierKind; 7] = [
        ModifierKind::Select,
        ModifierKind::Expand,
        ModifierKind::Filter,
        ModifierKind::Top,
        ModifierKind::OrderBy,
        ModifierKind::Skip,
        ModifierKind::SkipToken,
    ];

    /// Returns the query parameter name, including the `$` prefix.
    pub fn param_name(&self) -> &'static str {
        match self {
            ModifierKind::Select => "$select",
            ModifierKind::Expand => "$expand",
            ModifierKind::Filter => "$filter",
            ModifierKind::Top => "$top",
            ModifierKind::OrderBy => "$orderby",
            ModifierKind::Skip => "$skip",
            ModifierKind::SkipToken => "$skiptoken",
        }
    }

    fn slot(&self) -> usize {
        *self as usize
    }
}

/// Accumulated OData query modifiers for one resource chain.
///
/// `$select` and `$expand` accumulate de-duplicated field lists; every other
/// modifier keeps only its last value. Mutation is single-owner: build one
/// set per request chain rather than sharing one across threads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ODataMods {
    select: Vec<String>,
    expand: Vec<String>,
    scalars: [Option<String>; ModifierKind::ALL.len()],
}

impl ODataMods {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add comma-separated fields to `$select`, skipping fields already present.
    pub fn add_select(&mut self, fields: &str) -> &mut Self {
        merge_fields(&mut self.select, fields);
        self
    }

    /// Add comma-separated fields to `$expand`, skipping fields already present.
    pub fn add_expand(&mut self, fields: &str) -> &mut Self {
        merge_fields(&mut self.expand, fields);
        self
    }

    /// Set `$filter`, replacing any previous filter.
    ///
    /// Multi-line expressions are collapsed onto one line. A blank
    /// expression clears the filter.
    pub fn add_filter(&mut self, expr: &str) -> &mut Self {
        let expr = collapse_lines(expr);
        if expr.is_empty() {
            self.scalars[ModifierKind::Filter.slot()] = None;
            return self;
        }
        self.set(ModifierKind::Filter, expr)
    }

    /// Set `$top`, replacing any previous value.
    pub fn add_top(&mut self, n: usize) -> &mut Self {
        self.set(ModifierKind::Top, n.to_string())
    }

    /// Set `$orderby`, replacing any previous ordering.
    pub fn add_order_by(&mut self, field: &str, ascending: bool) -> &mut Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.set(ModifierKind::OrderBy, format!("{} {}", field.trim(), direction))
    }

    /// Set `$skip`, replacing any previous value.
    pub fn add_skip(&mut self, n: usize) -> &mut Self {
        self.set(ModifierKind::Skip, n.to_string())
    }

    /// Set the `$skiptoken` paging token, replacing any previous token.
    pub fn add_skip_token(&mut self, token: &str) -> &mut Self {
        self.set(ModifierKind::SkipToken, token.to_string())
    }

    fn set(&mut self, kind: ModifierKind, value: String) -> &mut Self {
        self.scalars[kind.slot()] = Some(value);
        self
    }

    /// Returns the raw (unencoded) value of a modifier, if set.
    pub fn get(&self, kind: ModifierKind) -> Option<String> {
        match kind {
            ModifierKind::Select => join_fields(&self.select),
            ModifierKind::Expand => join_fields(&self.expand),
            _ => self.scalars[kind.slot()].clone(),
        }
    }

    /// Number of modifier kinds currently set.
    pub fn len(&self) -> usize {
        ModifierKind::ALL
            .iter()
            .filter(|kind| self.get(**kind).is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serialize to a query string without the leading `?`.
    ///
    /// Parameters appear in [`ModifierKind::ALL`] order regardless of the
    /// order they were added in. An empty set yields an empty string.
    pub fn to_query(&self) -> String {
        ModifierKind::ALL
            .iter()
            .filter_map(|kind| {
                self.get(*kind).map(|value| {
                    format!(
                        "{}={}",
                        kind.param_name(),
                        utf8_percent_encode(&value, VALUE_ENCODE_SET)
                    )
                })
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

fn merge_fields(target: &mut Vec<String>, fields: &str) {
    for field in fields.split(',').map(str::trim).filter(|f| !f.is_empty()) {
        if !target.iter().any(|existing| existing == field) {
            target.push(field.to_string());
        }
    }
}

fn join_fields(fields: &[String]) -> Option<String> {
    if fields.is_empty() {
        None
    } else {
        Some(fields.join(","))
    }
}

fn collapse_lines(expr: &str) -> String {
    expr.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
