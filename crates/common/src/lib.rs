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
    fn version_response_serializes_as_string() {
        let body = serde_json::to_value(types::VersionResponse { version: "7".into() }).unwrap();
        assert_eq!(body, serde_json::json!({"version": "7"}));
    }

    #[test]
    fn error_body_omits_empty_message() {
        let body = serde_json::to_value(types::ErrorBody { error: "Not Found".into(), message: None }).unwrap();
        assert_eq!(body, serde_json::json!({"error": "Not Found"}));
    }
}
