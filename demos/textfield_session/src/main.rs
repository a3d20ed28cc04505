//! Drives one in-memory session through a typical editing round trip and
//! prints what the framework would receive. Run with `RUST_LOG=debug` to see
//! the bridge's own logging and an inspector dump after each step.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Context;
use serde_json::json;

use sembridge_core::*;
use sembridge_devtools::Inspector;
use sembridge_dom::{Document, HostDom, Key};
use sembridge_platform::{BridgeOptions, Session};

fn call(s: &mut Session<Document>, method: &str, args: serde_json::Value) -> anyhow::Result<()> {
    let msg = json!({"method": method, "args": args}).to_string();
    s.handle_channel_message(&msg)
        .with_context(|| format!("{method} rejected"))
}

fn email_field(focused: bool) -> SemanticsNodeUpdate {
    SemanticsNodeUpdate::new(1)
        .with_flag(SemanticsFlags::IS_TEXT_FIELD, true)
        .with_flag(SemanticsFlags::IS_FOCUSED, focused)
        .label("Email")
        .hint("name@example.com")
        .rect(Rect::new(24.0, 64.0, 300.0, 36.0))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let sent: Rc<RefCell<Vec<String>>> = Rc::default();
    let mut session = Session::in_memory(&BridgeOptions::default()).with_sink(sent.clone());
    let mut inspector = Inspector::new();
    inspector.enabled = log::log_enabled!(log::Level::Debug);

    call(
        &mut session,
        "TextInput.setClient",
        json!([1, {
            "inputType": {"name": "TextInputType.emailAddress"},
            "inputAction": "TextInputAction.send",
        }]),
    )?;
    call(&mut session, "TextInput.show", serde_json::Value::Null)?;
    session.update_semantics(&SemanticsUpdate::full(vec![email_field(true)]));
    inspector.frame(&session);

    let el = session
        .tree()
        .element_of(1)
        .context("text field has no element")?;

    session.dom_mut().type_text(el, "ada@example.org");
    session.pump_native_events();

    call(
        &mut session,
        "TextInput.setEditingState",
        json!({"text": "ada@example.com", "selectionBase": 15, "selectionExtent": 15}),
    )?;
    session.dom_mut().press_key(el, Key::Enter);
    session.pump_native_events();
    inspector.frame(&session);

    call(&mut session, "TextInput.clearClient", serde_json::Value::Null)?;
    session.settle();
    inspector.frame(&session);

    println!("element value: {:?}", session.dom().value(el).unwrap_or_default());
    println!(
        "focus on root: {}",
        session.dom().active_element() == Some(session.dom().root())
    );
    for message in sent.borrow().iter() {
        println!("-> {message}");
    }
    Ok(())
}
