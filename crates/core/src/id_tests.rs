use super::*;

#[test]
fn displays_as_raw_id() {
    let id = JobId::new("J1");
    assert_eq!(id.to_string(), "J1");
    assert_eq!(id.as_str(), "J1");
}

#[test]
fn compares_against_str() {
    let id = JobId::new("abc");
    assert_eq!(id, *"abc");
}

#[test]
fn borrows_as_str_for_map_lookup() {
    use std::collections::HashMap;
    let mut map: HashMap<JobId, u32> = HashMap::new();
    map.insert(JobId::new("J1"), 1);
    assert_eq!(map.get("J1"), Some(&1));
}
