//! Integration tests for query composition and response normalization.

use serde_json::{json, Value};
use sp_odata::{
    compose_url, normalize, normalize_collection, normalize_entity, CollectionResponse,
    EntityResponse, ModifierKind, NormalizeError, Normalized, ODataMods,
};

const LISTS: &str = "https://contoso.sharepoint.com/sites/dev/_api/web/lists";

fn parse(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap()
}

// === Modifier Composition Tests ===

mod composition {
    use super::*;

    #[test]
    fn empty_modifiers_leave_base_unchanged() {
        assert_eq!(compose_url(LISTS, &ODataMods::new()), LISTS);
    }

    #[test]
    fn select_is_idempotent() {
        let mut once = ODataMods::new();
        once.add_select("Id");
        let mut twice = ODataMods::new();
        twice.add_select("Id").add_select("Id");

        assert_eq!(compose_url(LISTS, &once), compose_url(LISTS, &twice));
    }

    #[test]
    fn order_is_canonical_regardless_of_call_order() {
        let mut a = ODataMods::new();
        a.add_skip(20)
            .add_top(10)
            .add_filter("Hidden eq false")
            .add_expand("RootFolder")
            .add_select("Title");
        let mut b = ODataMods::new();
        b.add_select("Title")
            .add_expand("RootFolder")
            .add_filter("Hidden eq false")
            .add_top(10)
            .add_skip(20);

        let url = compose_url(LISTS, &a);
        assert_eq!(url, compose_url(LISTS, &b));
        assert_eq!(
            url,
            format!(
                "{}?$select=Title&$expand=RootFolder&$filter=Hidden%20eq%20false&$top=10&$skip=20",
                LISTS
            )
        );
    }

    #[test]
    fn later_scalar_wins() {
        let mut mods = ODataMods::new();
        mods.add_top(5).add_top(50).add_filter("a eq 1").add_filter("b eq 2");
        assert_eq!(mods.get(ModifierKind::Top).as_deref(), Some("50"));
        assert_eq!(mods.get(ModifierKind::Filter).as_deref(), Some("b eq 2"));
    }

    #[test]
    fn existing_query_is_extended() {
        let mut mods = ODataMods::new();
        mods.add_top(1);
        assert_eq!(
            compose_url(&format!("{}?foo=bar", LISTS), &mods),
            format!("{}?foo=bar&$top=1", LISTS)
        );
    }

    #[test]
    fn quoted_filter_keeps_quotes() {
        let mut mods = ODataMods::new();
        mods.add_filter("Title eq 'Site Pages'");
        assert_eq!(
            compose_url(LISTS, &mods),
            format!("{}?$filter=Title%20eq%20'Site%20Pages'", LISTS)
        );
    }
}

// === Response Shape Tests ===

mod shapes {
    use super::*;

    #[test]
    fn verbose_and_nometadata_entities_share_fields() {
        let verbose = br#"{"d":{"__metadata":{"id":"x","type":"SP.Web"},"Title":"Dev","Id":"4f1"}}"#;
        let nometadata = br#"{"Title":"Dev","Id":"4f1"}"#;

        let v = parse(&normalize_entity(verbose).unwrap());
        let n = parse(&normalize_entity(nometadata).unwrap());

        for field in ["Title", "Id"] {
            assert_eq!(v[field], n[field]);
        }
    }

    #[test]
    fn collections_agree_across_verbosities() {
        let verbose = br#"{"d":{"results":[{"Id":1},{"Id":2},{"Id":3}]}}"#;
        let minimal = br#"{"odata.metadata":"x","value":[{"Id":1},{"Id":2},{"Id":3}]}"#;
        let bare = br#"[{"Id":1},{"Id":2},{"Id":3}]"#;

        let expected = normalize_collection(verbose).unwrap();
        assert_eq!(expected.len(), 3);
        assert_eq!(normalize_collection(minimal).unwrap(), expected);
        assert_eq!(normalize_collection(bare).unwrap(), expected);
    }

    #[test]
    fn normalization_is_idempotent() {
        let payloads: [&[u8]; 5] = [
            br#"{"d":{"results":[{"Id":1,"Title":"a"}]}}"#,
            br#"{"d":{"Id":1,"Title":"a"}}"#,
            br#"{"value":[{"Id":1}]}"#,
            br#"{"d":{"Id":1,"value":[{"x":1}]}}"#,
            br#"{"Id":7,"d":{"Owner":"x"}}"#,
        ];
        for payload in payloads {
            let once = normalize(payload).unwrap().to_bytes();
            let twice = normalize(&once).unwrap().to_bytes();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn auto_mode_reports_kind() {
        assert!(matches!(
            normalize(br#"{"d":{"results":[]}}"#).unwrap(),
            Normalized::Collection(items) if items.is_empty()
        ));
        assert!(matches!(
            normalize(br#"{"Id":1}"#).unwrap(),
            Normalized::Entity(_)
        ));
    }

    #[test]
    fn unexpected_shape_fails_collection_with_raw_bytes() {
        let raw = br#"{"unexpected":"shape"}"#;
        let err = normalize_collection(raw).unwrap_err();
        assert!(matches!(err, NormalizeError::UnrecognizedShape { .. }));
        assert_eq!(err.raw(), raw);
    }

    #[test]
    fn invalid_json_keeps_raw_bytes() {
        let raw = b"not json";
        let err = normalize_entity(raw).unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidJson { .. }));
        assert_eq!(err.raw(), raw);
    }
}

// === Remote Error Envelope Tests ===

mod envelopes {
    use super::*;

    #[test]
    fn verbose_error_envelope() {
        let raw = json!({
            "error": {
                "code": "-2147024809, System.ArgumentException",
                "message": { "lang": "en-US", "value": "List 'Nope' does not exist." }
            }
        })
        .to_string();

        let err = normalize_collection(raw.as_bytes()).unwrap_err();
        match &err {
            NormalizeError::Remote { error, .. } => {
                assert_eq!(error.code, -2147024809);
                assert_eq!(error.type_name, "System.ArgumentException");
                assert_eq!(error.message, "List 'Nope' does not exist.");
            }
            other => panic!("expected remote error, got {:?}", other),
        }
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn minimal_error_envelope() {
        let raw = json!({
            "odata.error": {
                "code": "-1, Microsoft.SharePoint.Client.InvalidClientQueryException",
                "message": { "lang": "en-US", "value": "The expression is not valid." }
            }
        })
        .to_string();

        let err = normalize_entity(raw.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("The expression is not valid."));
    }
}

// === Response Accessor Tests ===

mod accessors {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "PascalCase")]
    struct List {
        title: String,
        item_count: u32,
    }

    #[test]
    fn collection_unmarshal_from_verbose() {
        let resp = CollectionResponse::new(
            br#"{"d":{"results":[{"__metadata":{"type":"SP.List"},"Title":"Tasks","ItemCount":4},{"__metadata":{"type":"SP.List"},"Title":"Docs","ItemCount":9}]}}"#
                .to_vec(),
        );
        let lists: Vec<List> = resp.unmarshal().unwrap();
        assert_eq!(
            lists,
            vec![
                List {
                    title: "Tasks".into(),
                    item_count: 4
                },
                List {
                    title: "Docs".into(),
                    item_count: 9
                },
            ]
        );
    }

    #[test]
    fn entity_unmarshal_from_nometadata() {
        let resp = EntityResponse::new(br#"{"Title":"Tasks","ItemCount":4}"#.to_vec());
        let list: List = resp.unmarshal().unwrap();
        assert_eq!(list.item_count, 4);
    }
}
