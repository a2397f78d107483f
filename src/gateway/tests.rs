// src/gateway/tests.rs
//!
//! Tests for classification, transfer assembly and dispatch ordering
//!

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::gateway::classify::{classify, response_mode, ResponseMode};
    use crate::gateway::dispatcher::{
        assemble_transfer, ApiGateway, RawResponse, Transfer, Transport,
    };
    use crate::gateway::types::{ApiErrorKind, ApiMethod, ApiRequest, ApiResult};

    const VALID_KEY: &str = "AAAA-BBBB-CCCC-DDDD";

    // ============================================================================
    // Response Mode Table Tests
    // ============================================================================

    #[test]
    fn test_response_mode_table() {
        assert_eq!(response_mode("sendCommand"), ResponseMode::Text);
        assert_eq!(response_mode("getConfiguration"), ResponseMode::Text);
        assert_eq!(response_mode("getSolution"), ResponseMode::Binary);

        for command in ["getMember", "getForumPosts", "setKeys", "anythingElse"] {
            assert_eq!(response_mode(command), ResponseMode::Json);
        }
    }

    // ============================================================================
    // Classification Tests
    // ============================================================================

    #[test]
    fn test_classify_json_success_without_code() {
        let body = br#"{"username": "typedef", "level": 3}"#;
        let result = classify("getMember", 200, body);

        match result {
            ApiResult::Json(value) => {
                assert_eq!(value["username"], "typedef");
                assert_eq!(value["level"], 3);
            }
            other => panic!("expected Json, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_json_success_with_code_200() {
        let body = br#"{"code": 200, "message": "ok"}"#;
        let result = classify("getMember", 200, body);

        assert!(matches!(result, ApiResult::Json(_)));
    }

    #[test]
    fn test_classify_json_api_level_error() {
        let body = br#"{"code": 403, "message": "insufficient permissions"}"#;
        let result = classify("getMember", 200, body);

        match result {
            ApiResult::Error {
                kind,
                message,
                code,
            } => {
                assert_eq!(kind, ApiErrorKind::ApiLevel);
                assert_eq!(message, "insufficient permissions");
                assert_eq!(code, Some(403));
            }
            other => panic!("expected ApiLevel error, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_json_error_without_message_field() {
        let body = br#"{"code": 500}"#;
        let result = classify("getMember", 200, body);

        match result {
            ApiResult::Error { kind, code, .. } => {
                assert_eq!(kind, ApiErrorKind::ApiLevel);
                assert_eq!(code, Some(500));
            }
            other => panic!("expected ApiLevel error, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_json_parse_failure() {
        let body = b"<html>maintenance page</html>";
        let result = classify("getMember", 200, body);

        match result {
            ApiResult::Error { kind, .. } => assert_eq!(kind, ApiErrorKind::Parse),
            other => panic!("expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_json_array_passes_through() {
        let body = br#"[{"id": 1}, {"id": 2}]"#;
        let result = classify("getForumPosts", 200, body);

        assert!(matches!(result, ApiResult::Json(_)));
    }

    #[test]
    fn test_classify_is_pure() {
        let cases: [(&str, u16, &[u8]); 3] = [
            ("getMember", 200, br#"{"a": 1}"#),
            ("sendCommand", 200, b"ok"),
            ("getSolution", 404, b"not found"),
        ];

        for (command, status, body) in cases {
            let first = classify(command, status, body);
            let second = classify(command, status, body);
            assert_eq!(first, second, "classify must be pure for {}", command);
        }
    }

    #[test]
    fn test_classify_text_plain_reply() {
        let body = b"command executed\nsession refreshed";
        let result = classify("sendCommand", 200, body);

        match result {
            ApiResult::Text(text) => assert!(text.contains("command executed")),
            other => panic!("expected Text, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_text_auth_markers() {
        let bodies: [&[u8]; 3] = [
            b"invalid license key",
            b"Authorization denied for this member",
            b"error: INVALID LICENSE KEY, contact support",
        ];

        for body in bodies {
            let result = classify("sendCommand", 200, body);
            match result {
                ApiResult::Error { kind, .. } => {
                    assert_eq!(kind, ApiErrorKind::Auth, "body {:?}", body)
                }
                other => panic!("expected Auth error for {:?}, got {:?}", body, other),
            }
        }
    }

    #[test]
    fn test_classify_text_never_becomes_json() {
        // A configuration blob that happens to be valid JSON must stay text
        let body = br#"{"looks": "like json"}"#;
        let result = classify("getConfiguration", 200, body);

        assert!(matches!(result, ApiResult::Text(_)));
    }

    #[test]
    fn test_classify_binary_success() {
        use base64::{engine::general_purpose::STANDARD, Engine as _};

        let body: Vec<u8> = vec![0x4d, 0x5a, 0x00, 0xff, 0x10];
        let result = classify("getSolution", 200, &body);

        match result {
            ApiResult::Binary(encoded) => {
                assert_eq!(STANDARD.decode(&encoded).unwrap(), body);
            }
            other => panic!("expected Binary, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_binary_failure_is_download_error() {
        let result = classify("getSolution", 404, b"solution not found");

        match result {
            ApiResult::Error {
                kind,
                message,
                code,
            } => {
                assert_eq!(kind, ApiErrorKind::Download);
                assert_eq!(message, "solution not found");
                assert_eq!(code, Some(404));
            }
            other => panic!("expected Download error, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_binary_never_parsed() {
        // Binary replies that look like JSON error envelopes stay binary
        let body = br#"{"code": 403}"#;
        let result = classify("getSolution", 200, body);

        assert!(matches!(result, ApiResult::Binary(_)));
    }

    // ============================================================================
    // Transfer Assembly Tests
    // ============================================================================

    #[test]
    fn test_assembly_order_cmd_first_key_last() {
        let request = ApiRequest {
            command: "getMember".to_string(),
            parameters: vec![("bans".to_string(), "1".to_string())],
            method: ApiMethod::Get,
            body: None,
        };

        let transfer = assemble_transfer(VALID_KEY, &request);

        assert_eq!(transfer.query.first().map(|(n, _)| n.as_str()), Some("cmd"));
        assert_eq!(transfer.query.last().map(|(n, _)| n.as_str()), Some("key"));
        assert_eq!(transfer.query[0].1, "getMember");
        assert_eq!(transfer.query[1], ("bans".to_string(), "1".to_string()));
        assert_eq!(transfer.query[2].1, VALID_KEY);
    }

    #[test]
    fn test_assembly_drops_reserved_parameters() {
        let request = ApiRequest {
            command: "getMember".to_string(),
            parameters: vec![
                ("key".to_string(), "EVIL-EVIL-EVIL-EVIL".to_string()),
                ("cmd".to_string(), "somethingElse".to_string()),
                ("scripts".to_string(), "1".to_string()),
            ],
            method: ApiMethod::Get,
            body: None,
        };

        let transfer = assemble_transfer(VALID_KEY, &request);

        let keys: Vec<&str> = transfer
            .query
            .iter()
            .filter(|(n, _)| n == "key")
            .map(|(_, v)| v.as_str())
            .collect();
        assert_eq!(keys, vec![VALID_KEY]);

        let cmds: Vec<&str> = transfer
            .query
            .iter()
            .filter(|(n, _)| n == "cmd")
            .map(|(_, v)| v.as_str())
            .collect();
        assert_eq!(cmds, vec!["getMember"]);

        assert!(transfer.query.contains(&("scripts".to_string(), "1".to_string())));
    }

    #[test]
    fn test_assembly_get_never_carries_form() {
        let request = ApiRequest {
            command: "getMember".to_string(),
            parameters: Vec::new(),
            method: ApiMethod::Get,
            body: Some(vec![("ignored".to_string(), "1".to_string())]),
        };

        let transfer = assemble_transfer(VALID_KEY, &request);
        assert!(transfer.form.is_none());
    }

    #[test]
    fn test_assembly_post_carries_form() {
        let request = ApiRequest {
            command: "setConfiguration".to_string(),
            parameters: Vec::new(),
            method: ApiMethod::Post,
            body: Some(vec![("value".to_string(), "{\"x\":1}".to_string())]),
        };

        let transfer = assemble_transfer(VALID_KEY, &request);
        assert_eq!(
            transfer.form,
            Some(vec![("value".to_string(), "{\"x\":1}".to_string())])
        );
        assert_eq!(transfer.method, ApiMethod::Post);
    }

    // ============================================================================
    // Dispatch Ordering Tests
    // ============================================================================

    enum MockOutcome {
        Respond { status: u16, body: Vec<u8> },
        Fail(String),
    }

    struct MockTransport {
        calls: AtomicUsize,
        last_transfer: Mutex<Option<Transfer>>,
        outcome: MockOutcome,
    }

    impl MockTransport {
        fn json_ok(body: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                last_transfer: Mutex::new(None),
                outcome: MockOutcome::Respond {
                    status: 200,
                    body: body.as_bytes().to_vec(),
                },
            }
        }

        fn failing(reason: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                last_transfer: Mutex::new(None),
                outcome: MockOutcome::Fail(reason.to_string()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Transport for &MockTransport {
        fn send(
            &self,
            transfer: Transfer,
        ) -> impl Future<Output = Result<RawResponse, String>> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_transfer.lock().unwrap() = Some(transfer);

            let outcome = match &self.outcome {
                MockOutcome::Respond { status, body } => Ok(RawResponse {
                    status: *status,
                    body: body.clone(),
                }),
                MockOutcome::Fail(reason) => Err(reason.clone()),
            };
            async move { outcome }
        }
    }

    #[tokio::test]
    async fn test_dispatch_rejects_malformed_key_before_transport() {
        let transport = MockTransport::json_ok(r#"{"ok": true}"#);
        let gateway = ApiGateway::with_transport(&transport);

        let request = ApiRequest::get("getMember");
        let result = gateway.dispatch("AB12-CD34-EF56", &request).await;

        match result {
            ApiResult::Error { kind, .. } => assert_eq!(kind, ApiErrorKind::InvalidKeyFormat),
            other => panic!("expected InvalidKeyFormat, got {:?}", other),
        }
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_dispatch_injects_credential_and_command() {
        let transport = MockTransport::json_ok(r#"{"ok": true}"#);
        let gateway = ApiGateway::with_transport(&transport);

        let request = ApiRequest::get("getMember");
        let result = gateway.dispatch(VALID_KEY, &request).await;

        assert!(matches!(result, ApiResult::Json(_)));
        assert_eq!(transport.call_count(), 1);

        let transfer = transport.last_transfer.lock().unwrap().clone().unwrap();
        assert!(transfer
            .query
            .contains(&("cmd".to_string(), "getMember".to_string())));
        assert!(transfer
            .query
            .contains(&("key".to_string(), VALID_KEY.to_string())));
    }

    #[tokio::test]
    async fn test_dispatch_enforces_rate_limit() {
        let transport = MockTransport::json_ok(r#"{"ok": true}"#);
        let gateway = ApiGateway::with_transport(&transport);
        let request = ApiRequest::get("getMember");

        for _ in 0..5 {
            let result = gateway.dispatch(VALID_KEY, &request).await;
            assert!(!result.is_error(), "first five calls must pass");
        }

        let result = gateway.dispatch(VALID_KEY, &request).await;
        match result {
            ApiResult::Error { kind, .. } => assert_eq!(kind, ApiErrorKind::RateLimited),
            other => panic!("expected RateLimited, got {:?}", other),
        }

        // The sixth call never reached the transport
        assert_eq!(transport.call_count(), 5);
    }

    #[tokio::test]
    async fn test_dispatch_malformed_key_does_not_consume_window() {
        let transport = MockTransport::json_ok(r#"{"ok": true}"#);
        let gateway = ApiGateway::with_transport(&transport);

        for _ in 0..10 {
            let result = gateway.dispatch("bad-key", &ApiRequest::get("getMember")).await;
            assert!(result.is_error());
        }

        // The full window is still available for well-formed calls
        for _ in 0..5 {
            let result = gateway.dispatch(VALID_KEY, &ApiRequest::get("getMember")).await;
            assert!(!result.is_error());
        }
        assert_eq!(transport.call_count(), 5);
    }

    #[tokio::test]
    async fn test_dispatch_maps_transport_failure_to_network_error() {
        let transport = MockTransport::failing("connection refused");
        let gateway = ApiGateway::with_transport(&transport);

        let result = gateway.dispatch(VALID_KEY, &ApiRequest::get("getMember")).await;

        match result {
            ApiResult::Error {
                kind,
                message,
                code,
            } => {
                assert_eq!(kind, ApiErrorKind::Network);
                // Transport detail stays in the log, not in the surfaced message
                assert_eq!(message, "network request failed");
                assert_eq!(code, None);
            }
            other => panic!("expected Network error, got {:?}", other),
        }
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_classifies_by_command() {
        let transport = MockTransport {
            calls: AtomicUsize::new(0),
            last_transfer: Mutex::new(None),
            outcome: MockOutcome::Respond {
                status: 200,
                body: b"plain text configuration".to_vec(),
            },
        };
        let gateway = ApiGateway::with_transport(&transport);

        let result = gateway
            .dispatch(VALID_KEY, &ApiRequest::get("getConfiguration"))
            .await;

        assert!(matches!(result, ApiResult::Text(_)));
    }

    // ============================================================================
    // Result Serialization Tests
    // ============================================================================

    #[test]
    fn test_api_result_serialization_shape() {
        let result = ApiResult::error(ApiErrorKind::RateLimited, "slow down", None);
        let json = serde_json::to_string(&result).unwrap();

        assert!(json.contains("\"kind\":\"error\""));
        assert!(json.contains("\"RateLimited\""));
        assert!(json.contains("\"slow down\""));
    }

    #[test]
    fn test_api_request_deserialization_defaults() {
        let json = r#"{"command": "getMember"}"#;
        let request: ApiRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.command, "getMember");
        assert!(request.parameters.is_empty());
        assert_eq!(request.method, ApiMethod::Get);
        assert!(request.body.is_none());
    }

    #[test]
    fn test_api_request_deserialization_full() {
        let json = r#"{
            "command": "setConfiguration",
            "parameters": [["member", "typedef"]],
            "method": "POST",
            "body": [["value", "{}"]]
        }"#;
        let request: ApiRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.command, "setConfiguration");
        assert_eq!(request.method, ApiMethod::Post);
        assert_eq!(
            request.parameters,
            vec![("member".to_string(), "typedef".to_string())]
        );
        assert_eq!(
            request.body,
            Some(vec![("value".to_string(), "{}".to_string())])
        );
    }
}
