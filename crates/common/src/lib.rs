pub mod types;
pub mod utils;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_type_ok() {
        let h = types::Health { status: "ok" };
        assert_eq!(h.status, "ok");
    }

    #[test]
    fn success_envelope_carries_data() {
        let r = types::ApiResponse::success(vec![1, 2, 3]);
        assert_eq!(r.code, 200);
        assert_eq!(r.message, "success");
        assert_eq!(r.data.map(|d| d.len()), Some(3));
    }

    #[test]
    fn page_serializes_with_list_key() {
        let p = types::Page { total: 1, page: 1, page_size: 20, list: vec!["a"] };
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["list"][0], "a");
        assert_eq!(v["page_size"], 20);
    }
}
