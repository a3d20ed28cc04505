use serde::{Deserialize, Serialize};

/// Id of the framework-side text input client a command is addressed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub i64);

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "client#{}", self.0)
    }
}

/// Kind of keyboard the framework asked for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "InputTypeWire")]
pub enum InputType {
    #[default]
    Text,
    Multiline,
    Number {
        decimal: bool,
    },
    Phone,
    Datetime,
    Email,
    Url,
    VisiblePassword,
    Name,
    Address,
    /// No virtual keyboard at all.
    None,
}

#[derive(Deserialize)]
struct InputTypeWire {
    name: String,
    #[serde(default)]
    decimal: Option<bool>,
}

impl From<InputTypeWire> for InputType {
    fn from(w: InputTypeWire) -> Self {
        let name = w.name.strip_prefix("TextInputType.").unwrap_or(&w.name);
        match name {
            "multiline" => InputType::Multiline,
            "number" => InputType::Number {
                decimal: w.decimal.unwrap_or(false),
            },
            "phone" => InputType::Phone,
            "datetime" => InputType::Datetime,
            "emailAddress" => InputType::Email,
            "url" => InputType::Url,
            "visiblePassword" => InputType::VisiblePassword,
            "name" => InputType::Name,
            "address" => InputType::Address,
            "none" => InputType::None,
            "text" => InputType::Text,
            other => {
                log::debug!("unknown input type {other:?}; using text");
                InputType::Text
            }
        }
    }
}

impl InputType {
    /// Value for the DOM `inputmode` attribute, if the type maps to one.
    pub fn input_mode(self) -> Option<&'static str> {
        match self {
            InputType::Text | InputType::Multiline => None,
            InputType::Number { decimal: false } => Some("numeric"),
            InputType::Number { decimal: true } => Some("decimal"),
            InputType::Phone => Some("tel"),
            InputType::Email => Some("email"),
            InputType::Url => Some("url"),
            InputType::None => Some("none"),
            InputType::Datetime
            | InputType::VisiblePassword
            | InputType::Name
            | InputType::Address => Some("text"),
        }
    }
}

/// What the framework wants to happen on the "enter" gesture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InputAction {
    #[default]
    Unspecified,
    None,
    Done,
    Go,
    Search,
    Send,
    Next,
    Previous,
    Newline,
}

impl From<String> for InputAction {
    fn from(s: String) -> Self {
        let name = s.strip_prefix("TextInputAction.").unwrap_or(&s);
        match name {
            "none" => InputAction::None,
            "done" => InputAction::Done,
            "go" => InputAction::Go,
            "search" => InputAction::Search,
            "send" => InputAction::Send,
            "next" => InputAction::Next,
            "previous" => InputAction::Previous,
            "newline" => InputAction::Newline,
            _ => InputAction::Unspecified,
        }
    }
}

impl From<InputAction> for String {
    fn from(a: InputAction) -> Self {
        format!("TextInputAction.{}", a.name())
    }
}

impl InputAction {
    pub fn name(self) -> &'static str {
        match self {
            InputAction::Unspecified => "unspecified",
            InputAction::None => "none",
            InputAction::Done => "done",
            InputAction::Go => "go",
            InputAction::Search => "search",
            InputAction::Send => "send",
            InputAction::Next => "next",
            InputAction::Previous => "previous",
            InputAction::Newline => "newline",
        }
    }

    /// Value for the DOM `enterkeyhint` attribute.
    pub fn enter_key_hint(self) -> Option<&'static str> {
        match self {
            InputAction::Unspecified | InputAction::None => None,
            InputAction::Done => Some("done"),
            InputAction::Go => Some("go"),
            InputAction::Search => Some("search"),
            InputAction::Send => Some("send"),
            InputAction::Next => Some("next"),
            InputAction::Previous => Some("previous"),
            InputAction::Newline => Some("enter"),
        }
    }
}

/// Read-only description of the editing session the framework requested.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InputConfiguration {
    pub input_type: InputType,
    pub input_action: InputAction,
    pub obscure_text: bool,
    pub read_only: bool,
    pub autocorrect: bool,
}

impl Default for InputConfiguration {
    fn default() -> Self {
        Self {
            input_type: InputType::Text,
            input_action: InputAction::Done,
            obscure_text: false,
            read_only: false,
            autocorrect: true,
        }
    }
}

impl InputConfiguration {
    pub fn single_line() -> Self {
        Self::default()
    }

    pub fn multiline() -> Self {
        Self {
            input_type: InputType::Multiline,
            input_action: InputAction::Newline,
            ..Self::default()
        }
    }

    pub fn with_action(mut self, action: InputAction) -> Self {
        self.input_action = action;
        self
    }

    pub fn is_multiline(&self) -> bool {
        self.input_type == InputType::Multiline
    }
}
