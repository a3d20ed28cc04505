use slotmap::new_key_type;

new_key_type! {
    /// Handle to an element owned by a [`HostDom`](crate::HostDom).
    pub struct ElementId;
}

/// Element kinds the bridge creates or needs to recognise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tag {
    Input,
    TextArea,
    Div,
    /// The framework's root interaction surface (the canvas host).
    Surface,
}

impl Tag {
    pub fn name(self) -> &'static str {
        match self {
            Tag::Input => "input",
            Tag::TextArea => "textarea",
            Tag::Div => "div",
            Tag::Surface => "sembridge-surface",
        }
    }

    pub fn is_editable(self) -> bool {
        matches!(self, Tag::Input | Tag::TextArea)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SelectionDirection {
    #[default]
    None,
    Forward,
    Backward,
}

impl SelectionDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SelectionDirection::None => "none",
            SelectionDirection::Forward => "forward",
            SelectionDirection::Backward => "backward",
        }
    }
}

/// Native selection of an editable element, in UTF-16 code units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SelectionRange {
    pub start: usize,
    pub end: usize,
    pub direction: SelectionDirection,
}

impl SelectionRange {
    pub fn collapsed(at: usize) -> Self {
        Self {
            start: at,
            end: at,
            direction: SelectionDirection::None,
        }
    }

    /// Builds the DOM form of a base/extent pair; the DOM always stores
    /// `start <= end` and records which end is the focus.
    pub fn from_base_extent(base: usize, extent: usize) -> Self {
        if extent < base {
            Self {
                start: extent,
                end: base,
                direction: SelectionDirection::Backward,
            }
        } else {
            Self {
                start: base,
                end: extent,
                direction: if base == extent {
                    SelectionDirection::None
                } else {
                    SelectionDirection::Forward
                },
            }
        }
    }

    /// Inverse of [`from_base_extent`](Self::from_base_extent).
    pub fn base_extent(&self) -> (usize, usize) {
        match self.direction {
            SelectionDirection::Backward => (self.end, self.start),
            _ => (self.start, self.end),
        }
    }
}
