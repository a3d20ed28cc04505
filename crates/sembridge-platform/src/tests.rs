#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use serde_json::{Value, json};

    use sembridge_core::*;
    use sembridge_dom::{Document, ElementId, HostDom, Key, Tag};

    use crate::{BridgeOptions, Session};

    fn session() -> Session<Document> {
        Session::in_memory(&BridgeOptions::default())
    }

    fn call(s: &mut Session<Document>, method: &str, args: Value) {
        let msg = json!({"method": method, "args": args}).to_string();
        s.handle_channel_message(&msg).unwrap();
    }

    fn open(s: &mut Session<Document>, client: i64, action: &str) {
        call(
            s,
            "TextInput.setClient",
            json!([client, {
                "inputType": {"name": "TextInputType.text"},
                "inputAction": action,
            }]),
        );
        call(s, "TextInput.show", Value::Null);
    }

    fn field(id: NodeId, focused: bool) -> SemanticsNodeUpdate {
        SemanticsNodeUpdate::new(id)
            .with_flag(SemanticsFlags::IS_TEXT_FIELD, true)
            .with_flag(SemanticsFlags::IS_FOCUSED, focused)
            .label("Message")
            .rect(Rect::new(4.0, 8.0, 120.0, 24.0))
    }

    fn show_field(s: &mut Session<Document>, focused: bool) -> ElementId {
        s.update_semantics(&SemanticsUpdate::full(vec![field(0, focused)]));
        s.tree().element_of(0).unwrap()
    }

    fn messages(s: &mut Session<Document>) -> Vec<Value> {
        s.take_outbound()
            .iter()
            .map(|m| serde_json::from_str(m).unwrap())
            .collect()
    }

    #[test]
    fn test_user_edit_is_sent_to_framework() {
        let mut s = session();
        open(&mut s, 1, "TextInputAction.done");
        let el = show_field(&mut s, true);
        assert_eq!(s.dom().active_element(), Some(el));

        s.dom_mut().type_text(el, "hi");
        s.pump_native_events();

        let out = messages(&mut s);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["method"], "TextInputClient.updateEditingState");
        assert_eq!(out[0]["args"][0], 1);
        assert_eq!(
            out[0]["args"][1],
            json!({
                "text": "hi",
                "selectionBase": 2,
                "selectionExtent": 2,
                "composingBase": -1,
                "composingExtent": -1,
            })
        );
    }

    #[test]
    fn test_set_editing_state_round_trip() {
        let mut s = session();
        open(&mut s, 1, "TextInputAction.done");
        let el = show_field(&mut s, true);

        call(
            &mut s,
            "TextInput.setEditingState",
            json!({"text": "updated", "selectionBase": 2, "selectionExtent": 3}),
        );
        s.settle();

        assert_eq!(s.dom().value(el).as_deref(), Some("updated"));
        let sel = s.dom().selection(el).unwrap();
        assert_eq!((sel.start, sel.end), (2, 3));
        assert!(s.take_outbound().is_empty());
    }

    #[test]
    fn test_enter_performs_action() {
        let mut s = session();
        open(&mut s, 7, "TextInputAction.go");
        let el = show_field(&mut s, true);

        s.dom_mut().press_key(el, Key::Enter);
        s.pump_native_events();

        let out = messages(&mut s);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["method"], "TextInputClient.performAction");
        assert_eq!(out[0]["args"], json!([7, "TextInputAction.go"]));
    }

    #[test]
    fn test_hide_hands_focus_back_after_one_turn() {
        let mut s = session();
        open(&mut s, 1, "TextInputAction.done");
        let el = show_field(&mut s, true);

        call(&mut s, "TextInput.hide", Value::Null);
        assert_eq!(s.dom().active_element(), Some(el));
        assert!(s.dom().is_connected(el));

        s.run_deferred_turn();
        assert_eq!(s.dom().active_element(), Some(s.dom().root()));

        // Showing again reuses the same element once semantics focuses it.
        call(&mut s, "TextInput.show", Value::Null);
        show_field(&mut s, false);
        assert_eq!(show_field(&mut s, true), el);
        assert_eq!(s.dom().active_element(), Some(el));
        assert_eq!(s.strategy().active_element(), Some(el));
    }

    #[test]
    fn test_stale_client_commands_are_dropped() {
        let mut s = session();
        open(&mut s, 1, "TextInputAction.done");
        let el = show_field(&mut s, true);

        call(
            &mut s,
            "TextInput.setClient",
            json!([2, {"inputType": {"name": "TextInputType.text"}}]),
        );
        call(&mut s, "TextInput.setEditingState", json!([1, {"text": "old"}]));
        assert_eq!(s.dom().value(el).as_deref(), Some(""));

        show_field(&mut s, false);
        show_field(&mut s, true);
        call(&mut s, "TextInput.setEditingState", json!([2, {"text": "new"}]));
        assert_eq!(s.dom().value(el).as_deref(), Some("new"));
        assert_eq!(s.client(), Some(ClientId(2)));

        call(&mut s, "TextInput.clearClient", Value::Null);
        call(&mut s, "TextInput.setEditingState", json!([2, {"text": "late"}]));
        assert_eq!(s.dom().value(el).as_deref(), Some("new"));
        assert_eq!(s.client(), None);
    }

    #[test]
    fn test_focus_settles_regardless_of_selection_quirk() {
        for quirk in [false, true] {
            let mut s = Session::in_memory(&BridgeOptions {
                focus_on_selection: quirk,
                ..BridgeOptions::default()
            });
            open(&mut s, 1, "TextInputAction.done");
            let el = show_field(&mut s, true);

            s.dom_mut().user_blur(el);
            call(
                &mut s,
                "TextInput.setEditingState",
                json!({"text": "abc", "selectionBase": 1, "selectionExtent": 1}),
            );
            s.settle();
            s.update_semantics(&SemanticsUpdate::full(vec![field(0, true)]));
            s.settle();

            assert_eq!(s.dom().active_element(), Some(el), "quirk={quirk}");
            assert_eq!(s.dom().value(el).as_deref(), Some("abc"));
        }
    }

    #[test]
    fn test_blurred_field_waits_for_a_new_focus() {
        let mut s = session();
        open(&mut s, 1, "TextInputAction.done");
        let el = show_field(&mut s, true);

        s.dom_mut().user_blur(el);
        s.settle();
        let root = s.dom().root();
        assert_eq!(s.dom().active_element(), Some(root));
        assert_eq!(s.strategy().active_element(), None);

        s.update_semantics(&SemanticsUpdate::full(vec![field(0, true).label("Subject")]));
        s.settle();
        assert_eq!(s.dom().active_element(), Some(root));

        show_field(&mut s, false);
        show_field(&mut s, true);
        assert_eq!(s.dom().active_element(), Some(el));
    }

    #[test]
    fn test_command_geometry_without_semantics_rect() {
        let mut s = session();
        open(&mut s, 1, "TextInputAction.done");
        s.update_semantics(&SemanticsUpdate::full(vec![
            SemanticsNodeUpdate::new(0)
                .with_flag(SemanticsFlags::IS_TEXT_FIELD, true)
                .with_flag(SemanticsFlags::IS_FOCUSED, true),
        ]));
        let el = s.tree().element_of(0).unwrap();

        let mut transform = vec![0.0; 16];
        for i in [0, 5, 10, 15] {
            transform[i] = 1.0;
        }
        transform[12] = 30.0;
        transform[13] = 40.0;
        call(
            &mut s,
            "TextInput.setEditableSizeAndTransform",
            json!({"width": 200.0, "height": 32.0, "transform": transform}),
        );
        assert_eq!(s.dom().style(el, "width").as_deref(), Some("200px"));
        assert_eq!(
            s.dom().style(el, "transform").as_deref(),
            Some("translate(30px, 40px)")
        );
    }

    #[test]
    fn test_style_is_mirrored() {
        let mut s = session();
        open(&mut s, 1, "TextInputAction.done");
        let el = show_field(&mut s, true);
        call(
            &mut s,
            "TextInput.setStyle",
            json!({"fontSize": 16.0, "fontFamily": "Inter", "fontWeightIndex": 6}),
        );
        assert_eq!(s.dom().style(el, "font-size").as_deref(), Some("16px"));
        assert_eq!(s.dom().style(el, "font-weight").as_deref(), Some("700"));
    }

    #[test]
    fn test_multiline_session_uses_textarea() {
        let mut s = session();
        call(
            &mut s,
            "TextInput.setClient",
            json!([3, {
                "inputType": {"name": "TextInputType.multiline"},
                "inputAction": "TextInputAction.newline",
            }]),
        );
        call(&mut s, "TextInput.show", Value::Null);
        s.update_semantics(&SemanticsUpdate::full(vec![
            field(0, true).with_flag(SemanticsFlags::IS_MULTILINE, true),
        ]));
        let el = s.tree().element_of(0).unwrap();
        assert_eq!(s.dom().tag(el), Some(Tag::TextArea));
        assert_eq!(s.dom().attribute(el, "enterkeyhint").as_deref(), Some("enter"));

        s.dom_mut().press_key(el, Key::Enter);
        s.pump_native_events();
        assert!(s.take_outbound().is_empty());
    }

    #[test]
    fn test_sink_receives_messages() {
        let sent: Rc<RefCell<Vec<String>>> = Rc::default();
        let mut s = session().with_sink(sent.clone());
        open(&mut s, 1, "TextInputAction.done");
        let el = show_field(&mut s, true);

        s.dom_mut().type_text(el, "a");
        s.pump_native_events();
        assert_eq!(sent.borrow().len(), 1);
        assert!(s.take_outbound().is_empty());
    }

    #[test]
    fn test_errors_surface_to_caller() {
        let mut s = session();
        assert!(matches!(
            s.handle_channel_message(r#"{"method":"TextInput.nope"}"#),
            Err(BridgeError::UnknownMethod(_))
        ));
        assert!(matches!(
            s.update_semantics_json("{nodes"),
            Err(BridgeError::Decode(_))
        ));
        // Commands without a client are harmless.
        call(&mut s, "TextInput.setEditingState", json!({"text": "x"}));
        call(&mut s, "TextInput.hide", Value::Null);
        call(&mut s, "TextInput.clearClient", Value::Null);
    }

    #[test]
    fn test_shutdown_removes_elements() {
        let mut s = session();
        open(&mut s, 1, "TextInputAction.done");
        show_field(&mut s, true);
        s.shutdown();
        assert!(s.dom().semantics_children().is_empty());
        assert!(s.tree().is_empty());
        assert_eq!(s.dom().active_element(), Some(s.dom().root()));
    }
}
