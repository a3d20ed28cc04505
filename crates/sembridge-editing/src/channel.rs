//! Text input channel messages.
//!
//! Inbound calls arrive as `{"method": "TextInput.<name>", "args": ...}`.
//! Commands addressed to a client carry `[clientId, payload]`; the rest carry
//! their payload directly (or nothing). Outbound messages mirror the same
//! shape with `TextInputClient.*` methods.

use serde::Deserialize;
use serde_json::{Value, json};

use sembridge_core::{BridgeError, BridgeResult, ClientId, InputAction, InputConfiguration};

use crate::editing_state::EditingState;
use crate::placement::EditableTextGeometry;

#[derive(Clone, Debug, PartialEq)]
pub enum TextInputCommand {
    SetClient {
        client: ClientId,
        config: InputConfiguration,
    },
    Show,
    Hide,
    ClearClient,
    SetEditingState(EditingState),
    SetEditableSizeAndTransform(EditableTextGeometry),
    SetStyle(EditableTextStyle),
    /// Recognized but not acted upon.
    Ignored(&'static str),
}

impl TextInputCommand {
    pub fn name(&self) -> &'static str {
        match self {
            TextInputCommand::SetClient { .. } => "TextInput.setClient",
            TextInputCommand::Show => "TextInput.show",
            TextInputCommand::Hide => "TextInput.hide",
            TextInputCommand::ClearClient => "TextInput.clearClient",
            TextInputCommand::SetEditingState(_) => "TextInput.setEditingState",
            TextInputCommand::SetEditableSizeAndTransform(_) => {
                "TextInput.setEditableSizeAndTransform"
            }
            TextInputCommand::SetStyle(_) => "TextInput.setStyle",
            TextInputCommand::Ignored(name) => name,
        }
    }
}

/// Font and alignment of the framework's text, mirrored onto the native
/// element so IME candidate windows line up with the drawn glyphs.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditableTextStyle {
    pub font_size: Option<f64>,
    pub font_family: Option<String>,
    pub font_weight_index: Option<u8>,
    pub text_align_index: Option<u8>,
    pub text_direction_index: Option<u8>,
}

impl EditableTextStyle {
    /// CSS weight for the framework's weight index (`w100` is index 0).
    pub fn font_weight(&self) -> Option<u16> {
        self.font_weight_index.map(|i| (u16::from(i) + 1) * 100)
    }

    pub fn text_align(&self) -> Option<&'static str> {
        Some(match self.text_align_index? {
            0 => "left",
            1 => "right",
            2 => "center",
            3 => "justify",
            4 => "start",
            5 => "end",
            _ => return None,
        })
    }

    pub fn direction(&self) -> Option<&'static str> {
        match self.text_direction_index? {
            0 => Some("rtl"),
            1 => Some("ltr"),
            _ => None,
        }
    }

    /// `(property, value)` pairs to write as inline style.
    pub fn css(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        if let Some(size) = self.font_size {
            out.push(("font-size", format!("{size}px")));
        }
        if let Some(family) = &self.font_family {
            out.push(("font-family", family.clone()));
        }
        if let Some(weight) = self.font_weight() {
            out.push(("font-weight", weight.to_string()));
        }
        if let Some(align) = self.text_align() {
            out.push(("text-align", align.to_string()));
        }
        if let Some(dir) = self.direction() {
            out.push(("direction", dir.to_string()));
        }
        out
    }
}

#[derive(Deserialize)]
struct MethodCall {
    method: String,
    #[serde(default)]
    args: Value,
}

fn bad_args(method: &str, reason: impl Into<String>) -> BridgeError {
    BridgeError::BadArguments {
        method: method.to_string(),
        reason: reason.into(),
    }
}

/// Splits `[clientId, payload]` argument lists. Payloads without a leading
/// id are returned untouched.
fn split_client(args: &Value) -> (Option<ClientId>, &Value) {
    match args.as_array().map(Vec::as_slice) {
        Some([id, payload]) if id.is_i64() => (id.as_i64().map(ClientId), payload),
        _ => (None, args),
    }
}

/// Decodes a JSON method call into a command and the client it names, if
/// any. Commands without an explicit client apply to the current one.
pub fn decode_method_call(json: &str) -> BridgeResult<(Option<ClientId>, TextInputCommand)> {
    let call: MethodCall = serde_json::from_str(json)?;
    decode_call(&call.method, &call.args)
}

pub fn decode_call(method: &str, args: &Value) -> BridgeResult<(Option<ClientId>, TextInputCommand)> {
    let (client, payload) = split_client(args);
    let command = match method {
        "TextInput.setClient" => {
            let client = client.ok_or_else(|| bad_args(method, "expected [clientId, configuration]"))?;
            let config = InputConfiguration::deserialize(payload)?;
            return Ok((
                Some(client),
                TextInputCommand::SetClient { client, config },
            ));
        }
        "TextInput.show" => TextInputCommand::Show,
        "TextInput.hide" => TextInputCommand::Hide,
        "TextInput.clearClient" => TextInputCommand::ClearClient,
        "TextInput.setEditingState" => {
            TextInputCommand::SetEditingState(EditingState::from_channel(payload)?)
        }
        "TextInput.setEditableSizeAndTransform" => TextInputCommand::SetEditableSizeAndTransform(
            EditableTextGeometry::from_channel(payload)?,
        ),
        "TextInput.setStyle" => {
            TextInputCommand::SetStyle(EditableTextStyle::deserialize(payload)?)
        }
        "TextInput.requestAutofill" => TextInputCommand::Ignored("TextInput.requestAutofill"),
        "TextInput.finishAutofillContext" => {
            TextInputCommand::Ignored("TextInput.finishAutofillContext")
        }
        "TextInput.setMarkedTextRect" => TextInputCommand::Ignored("TextInput.setMarkedTextRect"),
        "TextInput.setCaretRect" => TextInputCommand::Ignored("TextInput.setCaretRect"),
        other => return Err(BridgeError::UnknownMethod(other.to_string())),
    };
    Ok((client, command))
}

pub fn encode_update_editing_state(client: ClientId, state: &EditingState) -> String {
    json!({
        "method": "TextInputClient.updateEditingState",
        "args": [client, state.to_channel()],
    })
    .to_string()
}

pub fn encode_perform_action(client: ClientId, action: InputAction) -> String {
    json!({
        "method": "TextInputClient.performAction",
        "args": [client, action],
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sembridge_core::InputType;

    #[test]
    fn test_decode_set_client() {
        let (client, cmd) = decode_method_call(
            r#"{"method":"TextInput.setClient","args":[3,{
                "inputType":{"name":"TextInputType.number","decimal":true},
                "inputAction":"TextInputAction.next",
                "obscureText":true
            }]}"#,
        )
        .unwrap();
        assert_eq!(client, Some(ClientId(3)));
        let TextInputCommand::SetClient { config, .. } = cmd else {
            panic!("expected setClient, got {cmd:?}");
        };
        assert_eq!(config.input_type, InputType::Number { decimal: true });
        assert_eq!(config.input_action, InputAction::Next);
        assert!(config.obscure_text);
        assert!(config.autocorrect);
    }

    #[test]
    fn test_decode_editing_state_with_and_without_client() {
        let (client, cmd) = decode_method_call(
            r#"{"method":"TextInput.setEditingState","args":{"text":"updated","selectionBase":2,"selectionExtent":3}}"#,
        )
        .unwrap();
        assert_eq!(client, None);
        assert_eq!(
            cmd,
            TextInputCommand::SetEditingState(EditingState::new("updated", 2, 3))
        );

        let (client, _) = decode_method_call(
            r#"{"method":"TextInput.setEditingState","args":[9,{"text":"x"}]}"#,
        )
        .unwrap();
        assert_eq!(client, Some(ClientId(9)));
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(
            decode_method_call(r#"{"method":"TextInput.bogus"}"#),
            Err(BridgeError::UnknownMethod(m)) if m == "TextInput.bogus"
        ));
        assert!(matches!(
            decode_method_call(r#"{"method":"TextInput.setClient","args":{}}"#),
            Err(BridgeError::BadArguments { .. })
        ));
        assert!(matches!(
            decode_method_call("not json"),
            Err(BridgeError::Decode(_))
        ));
    }

    #[test]
    fn test_ignored_methods_decode() {
        let (_, cmd) = decode_method_call(r#"{"method":"TextInput.requestAutofill"}"#).unwrap();
        assert_eq!(cmd.name(), "TextInput.requestAutofill");
    }

    #[test]
    fn test_style_css() {
        let (_, cmd) = decode_method_call(
            r#"{"method":"TextInput.setStyle","args":{
                "fontSize":14.0,"fontFamily":"Roboto","fontWeightIndex":3,
                "textAlignIndex":2,"textDirectionIndex":0
            }}"#,
        )
        .unwrap();
        let TextInputCommand::SetStyle(style) = cmd else {
            panic!("expected setStyle");
        };
        assert_eq!(
            style.css(),
            vec![
                ("font-size", "14px".to_string()),
                ("font-family", "Roboto".to_string()),
                ("font-weight", "400".to_string()),
                ("text-align", "center".to_string()),
                ("direction", "rtl".to_string()),
            ]
        );
    }

    #[test]
    fn test_outbound_messages() {
        let msg = encode_update_editing_state(ClientId(1), &EditingState::collapsed("ab", 2));
        let v: Value = serde_json::from_str(&msg).unwrap();
        assert_eq!(v["method"], "TextInputClient.updateEditingState");
        assert_eq!(v["args"][0], 1);
        assert_eq!(v["args"][1]["text"], "ab");

        let msg = encode_perform_action(ClientId(1), InputAction::Go);
        let v: Value = serde_json::from_str(&msg).unwrap();
        assert_eq!(v["args"], json!([1, "TextInputAction.go"]));
    }
}
