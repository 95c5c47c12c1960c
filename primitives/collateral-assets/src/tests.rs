use crate::*;

// helpers
fn record_json(status: &str) -> String {
    format!(
        r#"{{"value":"FHE-MjUw","gameName":"Aurora","assetType":"Weapon","timestamp":1700000000,"owner":"0xAbC","status":{status}}}"#
    )
}

#[test]
fn record_reads_camel_case_fields() {
    let rec = AssetRecord::from_bytes(record_json("\"approved\"").as_bytes()).expect("parse");
    assert_eq!(rec.value, "FHE-MjUw");
    assert_eq!(rec.game_name, "Aurora");
    assert_eq!(rec.asset_type, "Weapon");
    assert_eq!(rec.timestamp, 1_700_000_000);
    assert_eq!(rec.owner, "0xAbC");
    assert_eq!(rec.status, AssetStatus::Approved);
    assert!(rec.extra.is_empty());
}

#[test]
fn missing_null_or_empty_status_reads_as_pending() {
    for status in ["null", "\"\""] {
        let rec = AssetRecord::from_bytes(record_json(status).as_bytes()).expect("parse");
        assert_eq!(rec.status, AssetStatus::Pending, "status {status}");
    }

    let without = r#"{"value":"1","gameName":"g","assetType":"t","timestamp":1,"owner":"o"}"#;
    let rec = AssetRecord::from_bytes(without.as_bytes()).expect("parse");
    assert_eq!(rec.status, AssetStatus::Pending);
}

#[test]
fn unknown_status_is_a_parse_error() {
    assert!(AssetRecord::from_bytes(record_json("\"frozen\"").as_bytes()).is_err());
}

#[test]
fn unknown_fields_survive_a_rewrite() {
    let raw = r#"{"value":"FHE-MQ==","gameName":"g","assetType":"t","timestamp":5,"owner":"o","status":"pending","loanId":42}"#;
    let mut rec = AssetRecord::from_bytes(raw.as_bytes()).expect("parse");
    rec.status = AssetStatus::Rejected;

    let back: serde_json::Value =
        serde_json::from_slice(&rec.to_bytes().expect("encode")).expect("json");
    assert_eq!(back["loanId"], 42);
    assert_eq!(back["status"], "rejected");
    assert_eq!(back["gameName"], "g");
}

#[test]
fn addresses_compare_ignoring_case() {
    let a = Address::new("0xAbCdEf");
    assert_eq!(a, Address::new("0xabcdef"));
    assert!(a.matches("0XABCDEF"));
    assert_ne!(a, Address::new("0xabcde0"));
    assert!(Address::new("  ").is_empty());
}

#[test]
fn generated_ids_are_distinct_and_keyed_by_prefix() {
    let a = AssetId::generate();
    let b = AssetId::generate();
    assert_ne!(a, b);
    assert!(a.as_str().contains('-'));
    assert_eq!(a.record_key(), format!("asset_{a}"));
}

#[test]
fn only_pending_is_non_terminal() {
    assert!(!AssetStatus::Pending.is_terminal());
    assert!(AssetStatus::Approved.is_terminal());
    assert!(AssetStatus::Rejected.is_terminal());
    assert_eq!(ReviewDecision::Approve.target_status(), AssetStatus::Approved);
    assert_eq!(ReviewDecision::Reject.target_status(), AssetStatus::Rejected);
}
