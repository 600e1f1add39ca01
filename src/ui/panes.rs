/// Panel identifiers for the 2-panel layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaneFocus {
    /// Left panel: the contact form (name, phone, email, address)
    Form,
    /// Right panel, top: the live search box
    Search,
    /// Right panel, bottom: the filtered results table
    Results,
}

/// Form field identifiers, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Name,
    Phone,
    Email,
    Address,
}

impl Default for FormField {
    fn default() -> Self {
        FormField::Name
    }
}

impl FormField {
    pub const ALL: [FormField; 4] = [
        FormField::Name,
        FormField::Phone,
        FormField::Email,
        FormField::Address,
    ];

    pub fn title(self) -> &'static str {
        match self {
            FormField::Name => "NAME *",
            FormField::Phone => "PHONE *",
            FormField::Email => "EMAIL",
            FormField::Address => "ADDRESS",
        }
    }

    /// Get the next field, wrapping at the end
    pub fn next(self) -> Self {
        match self {
            FormField::Name => FormField::Phone,
            FormField::Phone => FormField::Email,
            FormField::Email => FormField::Address,
            FormField::Address => FormField::Name,
        }
    }

    /// Get the previous field, wrapping at the beginning
    pub fn prev(self) -> Self {
        match self {
            FormField::Name => FormField::Address,
            FormField::Phone => FormField::Name,
            FormField::Email => FormField::Phone,
            FormField::Address => FormField::Email,
        }
    }
}
