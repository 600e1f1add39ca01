use crossterm::event::{Event, KeyEvent};
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

use crate::store::{Contact, ContactDraft};

use super::panes::FormField;

/// Edit state for the contact form: one input per field plus the focused
/// field. The form is plain data shaping; nothing here touches the store.
#[derive(Default)]
pub struct ContactForm {
    name: Input,
    phone: Input,
    email: Input,
    address: Input,
    pub field: FormField,
}

impl ContactForm {
    /// Snapshot the current form text as a draft for the store.
    pub fn draft(&self) -> ContactDraft {
        ContactDraft {
            name: self.name.value().to_string(),
            phone: self.phone.value().to_string(),
            email: self.email.value().to_string(),
            address: self.address.value().to_string(),
        }
    }

    /// Load a contact into the form for editing.
    pub fn load(&mut self, contact: &Contact) {
        self.name = Input::new(contact.name.clone());
        self.phone = Input::new(contact.phone.clone());
        self.email = Input::new(contact.email.clone());
        self.address = Input::new(contact.address.clone());
        self.field = FormField::Name;
    }

    pub fn clear(&mut self) {
        self.name.reset();
        self.phone.reset();
        self.email.reset();
        self.address.reset();
        self.field = FormField::Name;
    }

    pub fn value(&self, field: FormField) -> &str {
        self.input(field).value()
    }

    pub fn visual_cursor(&self) -> usize {
        self.input(self.field).visual_cursor()
    }

    pub fn focus_next(&mut self) {
        self.field = self.field.next();
    }

    pub fn focus_prev(&mut self) {
        self.field = self.field.prev();
    }

    /// Route a key event into the focused field's input.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> bool {
        self.input_mut(self.field)
            .handle_event(&Event::Key(key))
            .is_some()
    }

    fn input(&self, field: FormField) -> &Input {
        match field {
            FormField::Name => &self.name,
            FormField::Phone => &self.phone,
            FormField::Email => &self.email,
            FormField::Address => &self.address,
        }
    }

    fn input_mut(&mut self, field: FormField) -> &mut Input {
        match field {
            FormField::Name => &mut self.name,
            FormField::Phone => &mut self.phone,
            FormField::Email => &mut self.email,
            FormField::Address => &mut self.address,
        }
    }
}
