//! Integration tests for the coverswitch daemon IPC protocol.
//!
//! These tests verify the protocol without a running daemon. They test:
//! - Command serialization/deserialization
//! - Response formatting
//! - The wire format the platform bridge depends on

use coverswitch_ipc::{
    decode_line, encode_line, GesturePhase, IpcCommand, IpcError, IpcRect, IpcResponse,
    LaunchTarget, WindowInfo, MAX_IPC_MESSAGE_SIZE,
};

fn window(id: u64, title: &str, app: &str) -> WindowInfo {
    WindowInfo {
        window_id: id,
        title: title.to_string(),
        app: app.to_string(),
        minimized: false,
        workspace: 0,
        monitor: 0,
        focus_timestamp: id,
        transient_for: None,
        rect: IpcRect::new(0, 0, 1280, 720),
    }
}

// ============================================================================
// IPC Command Roundtrip Tests
// ============================================================================

/// Test that all IPC commands can be serialized and deserialized correctly.
#[test]
fn test_all_commands_roundtrip() {
    let commands = vec![
        IpcCommand::Launch {
            target: LaunchTarget::Windows,
        },
        IpcCommand::Launch {
            target: LaunchTarget::Applications,
        },
        IpcCommand::Next,
        IpcCommand::Previous,
        IpcCommand::Select,
        IpcCommand::Cancel,
        IpcCommand::Key {
            action: "next_window_of_app".to_string(),
        },
        IpcCommand::ModifiersReleased,
        IpcCommand::Gesture {
            phase: GesturePhase::End,
            progress: -0.75,
        },
        IpcCommand::SyncWindows { windows: vec![] },
        IpcCommand::SyncWindows {
            windows: vec![window(1, "Inbox", "mail")],
        },
        IpcCommand::WindowDestroyed { window_id: u64::MAX },
        IpcCommand::SetWorkspace { workspace: 2 },
        IpcCommand::SetMonitor {
            monitor: 0,
            rect: IpcRect::new(-1920, 0, 1920, 1080),
        },
        IpcCommand::Query,
        IpcCommand::DrainRequests,
        IpcCommand::Reload,
        IpcCommand::Stop,
    ];

    for cmd in commands {
        let json = serde_json::to_string(&cmd).expect("serialize");
        let parsed: IpcCommand = serde_json::from_str(&json).expect("deserialize");

        let json2 = serde_json::to_string(&parsed).expect("re-serialize");
        assert_eq!(json, json2, "Command roundtrip failed: {:?}", cmd);
    }
}

/// Test that all IPC responses can be serialized and deserialized correctly.
#[test]
fn test_all_responses_roundtrip() {
    let responses = vec![
        IpcResponse::Ok,
        IpcResponse::ignored("Switcher is not open"),
        IpcResponse::error("Test error"),
        IpcResponse::SwitcherState {
            open: true,
            mode: Some("applications".to_string()),
            state: Some("looping".to_string()),
            current_index: Some(2.5),
            window_count: 4,
            selected_window: Some(12345),
        },
        IpcResponse::SwitcherState {
            open: false,
            mode: None,
            state: None,
            current_index: None,
            window_count: 0,
            selected_window: None,
        },
        IpcResponse::HostRequests {
            activate: vec![1],
            minimize: vec![2, 3],
            close: vec![],
        },
    ];

    for resp in responses {
        let json = serde_json::to_string(&resp).expect("serialize");
        let parsed: IpcResponse = serde_json::from_str(&json).expect("deserialize");

        let json2 = serde_json::to_string(&parsed).expect("re-serialize");
        assert_eq!(json, json2, "Response roundtrip failed");
    }
}

// ============================================================================
// Protocol Format Tests
// ============================================================================

/// Test that commands are newline-delimited in the protocol.
#[test]
fn test_protocol_newline_delimited() {
    let cmd = IpcCommand::SyncWindows {
        windows: vec![window(1, "Multi\nline title", "editor")],
    };
    let line = encode_line(&cmd).expect("encode");

    // Embedded newlines are escaped, so the frame holds exactly one
    assert!(line.ends_with('\n'));
    assert_eq!(line.matches('\n').count(), 1);

    let parsed: IpcCommand = decode_line(&line).expect("decode");
    assert_eq!(parsed, cmd);
}

/// The exact wire format the platform bridge emits.
#[test]
fn test_bridge_wire_format() {
    let json = r#"{"type":"sync_windows","windows":[{"window_id":5,"title":"Files","app":"org.gnome.Nautilus","workspace":1,"focus_timestamp":99,"transient_for":4,"rect":{"x":10,"y":20,"width":300,"height":200}}]}"#;
    let cmd: IpcCommand = serde_json::from_str(json).expect("parse");

    match cmd {
        IpcCommand::SyncWindows { windows } => {
            assert_eq!(windows.len(), 1);
            let w = &windows[0];
            assert_eq!(w.window_id, 5);
            assert_eq!(w.workspace, 1);
            assert_eq!(w.monitor, 0);
            assert_eq!(w.transient_for, Some(4));
            assert_eq!(w.rect, IpcRect::new(10, 20, 300, 200));
        }
        other => panic!("Expected SyncWindows, got {:?}", other),
    }

    let cmd: IpcCommand =
        serde_json::from_str(r#"{"type":"gesture","phase":"begin","progress":1}"#).expect("parse");
    assert_eq!(
        cmd,
        IpcCommand::Gesture {
            phase: GesturePhase::Begin,
            progress: 1.0
        }
    );
}

/// Test the response shape the CLI prints for `query`.
#[test]
fn test_switcher_state_wire_format() {
    let resp = IpcResponse::SwitcherState {
        open: true,
        mode: Some("windows".to_string()),
        state: Some("idle".to_string()),
        current_index: Some(1.0),
        window_count: 3,
        selected_window: Some(7),
    };
    let value: serde_json::Value = serde_json::to_value(&resp).expect("serialize");
    assert_eq!(value["status"], "switcher_state");
    assert_eq!(value["mode"], "windows");
    assert_eq!(value["state"], "idle");
    assert_eq!(value["current_index"], 1.0);
    assert_eq!(value["selected_window"], 7);
}

// ============================================================================
// Error Response Tests
// ============================================================================

#[test]
fn test_error_response_special_chars() {
    let resp = IpcResponse::error("quote \" backslash \\ newline \n tab \t");
    let line = encode_line(&resp).expect("encode");
    assert_eq!(line.matches('\n').count(), 1);

    let parsed: IpcResponse = decode_line(&line).expect("decode");
    assert_eq!(parsed, resp);
}

#[test]
fn test_window_info_unicode_title() {
    let cmd = IpcCommand::SyncWindows {
        windows: vec![window(9, "Entwürfe · 日本語 🎉", "mail")],
    };
    let line = encode_line(&cmd).expect("encode");
    let parsed: IpcCommand = decode_line(&line).expect("decode");
    assert_eq!(parsed, cmd);
}

// ============================================================================
// Invalid Input Tests
// ============================================================================

/// Test parsing invalid JSON.
#[test]
fn test_invalid_json_parsing() {
    let invalid_inputs = vec!["not json", "{", "{invalid}", "null", "123", "true"];

    for input in invalid_inputs {
        let result: Result<IpcCommand, _> = serde_json::from_str(input);
        assert!(result.is_err(), "Should fail to parse: {}", input);
    }

    let result: Result<IpcCommand, _> = decode_line("");
    assert!(matches!(result, Err(IpcError::Closed)));
}

/// Test parsing unknown command type.
#[test]
fn test_unknown_command_type() {
    let json = r#"{"type":"focus_left"}"#;
    let result: Result<IpcCommand, _> = serde_json::from_str(json);
    assert!(result.is_err());
}

/// Test parsing a command with a missing field.
#[test]
fn test_missing_required_field() {
    let json = r#"{"type":"window_destroyed"}"#;
    let result: Result<IpcCommand, _> = serde_json::from_str(json);
    assert!(result.is_err());

    let json = r#"{"type":"gesture","phase":"update"}"#;
    let result: Result<IpcCommand, _> = serde_json::from_str(json);
    assert!(result.is_err());
}

/// Test parsing unknown response type.
#[test]
fn test_unknown_response_type() {
    let json = r#"{"status":"teleported"}"#;
    let result: Result<IpcResponse, _> = serde_json::from_str(json);
    assert!(result.is_err());
}

/// A bridge flooding the socket with a huge inventory is rejected.
#[test]
fn test_oversized_inventory_rejected() {
    let windows: Vec<WindowInfo> = (0..2000)
        .map(|i| window(i, &"x".repeat(64), "app"))
        .collect();
    let cmd = IpcCommand::SyncWindows { windows };
    assert!(serde_json::to_string(&cmd).expect("serialize").len() > MAX_IPC_MESSAGE_SIZE);
    assert!(matches!(encode_line(&cmd), Err(IpcError::TooLarge(_))));
}
