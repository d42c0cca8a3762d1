//! Request URL composition.

use crate::modifiers::ODataMods;

/// Append serialized modifiers to a base resource path.
///
/// Returns `base` unchanged when no modifiers are set. Bases that already
/// carry a query string are extended with `&`. The base is not validated;
/// malformed input passes through.
pub fn compose_url(base: &str, mods: &ODataMods) -> String {
    let query = mods.to_query();
    if query.is_empty() {
        return base.to_string();
    }

    let separator = if base.ends_with('?') || base.ends_with('&') {
        ""
    } else if base.contains('?') {
        "&"
    } else {
        "?"
    };

    format!("{}{}{}", base, separator, query)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://contoso.sharepoint.com/sites/dev/_api/web/lists";

    #[test]
    fn empty_modifiers_return_base_unchanged() {
        assert_eq!(compose_url(BASE, &ODataMods::new()), BASE);
    }

    #[test]
    fn modifiers_joined_with_question_mark() {
        let mut mods = ODataMods::new();
        mods.add_top(3);
        assert_eq!(compose_url(BASE, &mods), format!("{}?$top=3", BASE));
    }

    #[test]
    fn query_bearing_base_joined_with_ampersand() {
        let mut mods = ODataMods::new();
        mods.add_select("Title");
        let base = "https://contoso.sharepoint.com/_api/web/GetFolderByServerRelativePath(decodedurl=@p)?@p='/Shared%20Documents'";
        assert_eq!(
            compose_url(base, &mods),
            format!("{}&$select=Title", base)
        );
    }

    #[test]
    fn trailing_separator_not_doubled() {
        let mut mods = ODataMods::new();
        mods.add_top(1);
        assert_eq!(compose_url("/_api/web?", &mods), "/_api/web?$top=1");
        assert_eq!(compose_url("/_api/web?a=1&", &mods), "/_api/web?a=1&$top=1");
    }

    #[test]
    fn malformed_base_passes_through() {
        let mut mods = ODataMods::new();
        mods.add_top(1);
        assert_eq!(compose_url("not a url", &mods), "not a url?$top=1");
        assert_eq!(compose_url("", &ODataMods::new()), "");
    }
}
