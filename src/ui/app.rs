use std::io::stdout;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;
use tui_widgets::popup::PopupState;

use crate::config::{Config, UiColors};
use crate::search;
use crate::store::{Contact, ContactId, Store, StoreError};

use super::draw;
use super::edit::ContactForm;
use super::panes::PaneFocus;

#[derive(Debug, Clone)]
pub struct ConfirmModal {
    pub title: String,
    pub message: String,
    pub action: ConfirmAction,
}

/// Action to perform when the confirm modal is accepted. Confirmation lives
/// entirely up here; the store only ever sees the post-confirmation call.
#[derive(Debug, Clone)]
pub enum ConfirmAction {
    /// Delete the contact with this id
    DeleteContact(ContactId),
}

/// File path input modal, used for both import and export
#[derive(Debug, Clone)]
pub struct PathModal {
    pub purpose: PathPurpose,
    pub input: Input,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathPurpose {
    Import,
    Export,
}

impl PathPurpose {
    pub fn title(self) -> &'static str {
        match self {
            PathPurpose::Import => "IMPORT JSON",
            PathPurpose::Export => "EXPORT JSON",
        }
    }
}

pub struct App<'a> {
    store: &'a mut Store,
    config: &'a Config,
    pub form: ContactForm,
    pub search_input: Input,
    pub focused_pane: PaneFocus,
    /// Filtered view, as ids into the store. Derived, never mutated directly;
    /// rebuilt whenever the query or the store changes.
    pub visible: Vec<ContactId>,
    /// Cursor row within `visible`.
    pub cursor: Option<usize>,
    /// The record currently loaded into the form for update/delete. An id,
    /// not a row index: it stays correct when the filter changes under it.
    pub selected: Option<ContactId>,
    pub status: Option<String>,
    pub confirm_modal: Option<ConfirmModal>,
    pub path_modal: Option<PathModal>,
    pub modal_popup: PopupState,
}

impl<'a> App<'a> {
    pub fn new(store: &'a mut Store, config: &'a Config) -> Self {
        let mut app = Self {
            store,
            config,
            form: ContactForm::default(),
            search_input: Input::default(),
            focused_pane: PaneFocus::Form,
            visible: Vec::new(),
            cursor: None,
            selected: None,
            status: None,
            confirm_modal: None,
            path_modal: None,
            modal_popup: PopupState::default(),
        };
        app.refresh_visible();
        app
    }

    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        stdout.execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        terminal.backend_mut().execute(LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop<B>(&mut self, terminal: &mut Terminal<B>) -> Result<()>
    where
        B: ratatui::backend::Backend,
    {
        loop {
            draw::render(terminal, self)?;

            if event::poll(Duration::from_millis(250))? {
                match event::read()? {
                    Event::Key(key) => {
                        if self.handle_key(key)? {
                            break;
                        }
                    }
                    Event::Resize(_, _) => {}
                    _ => {}
                }
            }
        }
        Ok(())
    }

    pub fn store(&self) -> &Store {
        self.store
    }

    pub fn ui_colors(&self) -> &UiColors {
        &self.config.ui.colors
    }

    /// Resolve the filtered view to records, skipping ids the store no
    /// longer knows (cannot happen between refreshes, but stale rows must
    /// never panic a draw).
    pub fn visible_contacts(&self) -> Vec<&Contact> {
        self.visible
            .iter()
            .filter_map(|id| self.store.get(*id))
            .collect()
    }

    pub fn cursor_contact(&self) -> Option<&Contact> {
        let id = *self.visible.get(self.cursor?)?;
        self.store.get(id)
    }

    /// Rebuild the filtered view from the live query and clamp the cursor.
    /// The id-based selection needs no fixup: it either still resolves or
    /// the record is gone.
    fn refresh_visible(&mut self) {
        self.visible = search::filter(self.store.contacts(), self.search_input.value())
            .into_iter()
            .map(|c| c.id)
            .collect();
        self.cursor = match self.cursor {
            _ if self.visible.is_empty() => None,
            None => Some(0),
            Some(row) => Some(row.min(self.visible.len() - 1)),
        };
    }

    fn set_status<S: Into<String>>(&mut self, message: S) {
        self.status = Some(message.into());
    }

    fn report(&mut self, err: StoreError) {
        self.set_status(err.to_string());
    }

    // ------------------------------------------------------------------
    // Key routing
    // ------------------------------------------------------------------

    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        // Ctrl+C always quits (hardcoded for safety)
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            return Ok(true);
        }

        if self.confirm_modal.is_some() {
            self.handle_confirm_modal_key(key);
            return Ok(false);
        }

        if self.path_modal.is_some() {
            self.handle_path_modal_key(key);
            return Ok(false);
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            if let Some(done) = self.handle_control_key(key) {
                return Ok(done);
            }
        }

        match self.focused_pane {
            PaneFocus::Form => self.handle_form_key(key),
            PaneFocus::Search => self.handle_search_key(key),
            PaneFocus::Results => self.handle_results_key(key),
        }
    }

    /// Global Ctrl shortcuts; `None` means the key was not one of ours.
    fn handle_control_key(&mut self, key: KeyEvent) -> Option<bool> {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => return Some(true),
            KeyCode::Char('a') | KeyCode::Char('A') => self.add_contact(),
            KeyCode::Char('u') | KeyCode::Char('U') => self.update_contact(),
            KeyCode::Char('d') | KeyCode::Char('D') => self.request_delete(),
            KeyCode::Char('n') | KeyCode::Char('N') => self.clear_form(),
            KeyCode::Char('o') | KeyCode::Char('O') => self.open_path_modal(PathPurpose::Import),
            KeyCode::Char('e') | KeyCode::Char('E') => self.open_path_modal(PathPurpose::Export),
            KeyCode::Char('f') | KeyCode::Char('F') => {
                self.focused_pane = PaneFocus::Search;
            }
            _ => return None,
        }
        Some(false)
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Esc => {
                self.focused_pane = PaneFocus::Results;
            }
            KeyCode::Tab | KeyCode::Down | KeyCode::Enter => self.form.focus_next(),
            KeyCode::BackTab | KeyCode::Up => self.form.focus_prev(),
            _ => {
                self.form.handle_key_event(key);
            }
        }
        Ok(false)
    }

    fn handle_search_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Down => {
                self.focused_pane = PaneFocus::Results;
            }
            KeyCode::Tab => {
                self.focused_pane = PaneFocus::Results;
            }
            KeyCode::BackTab => {
                self.focused_pane = PaneFocus::Form;
            }
            _ => {
                // Live filter: every edit recomputes the view.
                if self.search_input.handle_event(&Event::Key(key)).is_some() {
                    self.refresh_visible();
                }
            }
        }
        Ok(false)
    }

    fn handle_results_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Char('/') => {
                self.focused_pane = PaneFocus::Search;
            }
            KeyCode::Tab => {
                self.focused_pane = PaneFocus::Form;
            }
            KeyCode::BackTab => {
                self.focused_pane = PaneFocus::Search;
            }
            KeyCode::Down | KeyCode::Char('j') => self.move_cursor(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_cursor(-1),
            KeyCode::Enter => self.activate_cursor_row(),
            KeyCode::Char('x') | KeyCode::Delete => self.request_delete(),
            _ => {}
        }
        Ok(false)
    }

    fn handle_confirm_modal_key(&mut self, key: KeyEvent) {
        let Some(modal) = self.confirm_modal.take() else {
            return;
        };

        match key.code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {}
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => match modal.action {
                ConfirmAction::DeleteContact(id) => self.delete_contact(id),
            },
            // Put the modal back if the key wasn't handled
            _ => self.confirm_modal = Some(modal),
        }
    }

    fn handle_path_modal_key(&mut self, key: KeyEvent) {
        let Some(mut modal) = self.path_modal.take() else {
            return;
        };

        match key.code {
            KeyCode::Esc => {}
            KeyCode::Enter => {
                let path = PathBuf::from(modal.input.value().trim());
                if path.as_os_str().is_empty() {
                    self.path_modal = Some(modal);
                    return;
                }
                match modal.purpose {
                    PathPurpose::Import => self.import_from(&path),
                    PathPurpose::Export => self.export_to(&path),
                }
            }
            _ => {
                modal.input.handle_event(&Event::Key(key));
                self.path_modal = Some(modal);
            }
        }
    }

    // ------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------

    fn move_cursor(&mut self, delta: isize) {
        if self.visible.is_empty() {
            self.cursor = None;
            return;
        }
        let last = self.visible.len() - 1;
        let row = match self.cursor {
            None => 0,
            Some(row) => row
                .saturating_add_signed(delta)
                .min(last),
        };
        self.cursor = Some(row);
    }

    /// Load the cursor row into the form and make it the selection.
    fn activate_cursor_row(&mut self) {
        let Some(contact) = self.cursor_contact().cloned() else {
            return;
        };
        self.form.load(&contact);
        self.selected = Some(contact.id);
        self.focused_pane = PaneFocus::Form;
        self.set_status(format!("Editing \"{}\"", contact.name));
    }

    fn clear_form(&mut self) {
        self.form.clear();
        self.selected = None;
        self.status = None;
    }

    fn add_contact(&mut self) {
        let draft = self.form.draft();
        match self.store.add(&draft) {
            Ok(id) => {
                let name = self.store.get(id).map(|c| c.name.clone()).unwrap_or_default();
                self.refresh_visible();
                self.form.clear();
                self.selected = None;
                self.set_status(format!("Added \"{}\"", name));
            }
            // The record is in memory even though the save failed; show it
            // and surface the warning.
            Err(err @ StoreError::Persistence { .. }) => {
                self.refresh_visible();
                self.form.clear();
                self.selected = None;
                self.report(err);
            }
            Err(err) => self.report(err),
        }
    }

    fn update_contact(&mut self) {
        let Some(id) = self.selected else {
            self.report(StoreError::NoSelection);
            return;
        };
        let draft = self.form.draft();
        match self.store.update(id, &draft) {
            Ok(()) => {
                self.refresh_visible();
                self.form.clear();
                self.selected = None;
                self.set_status("Contact updated");
            }
            Err(err @ StoreError::Persistence { .. }) => {
                self.refresh_visible();
                self.form.clear();
                self.selected = None;
                self.report(err);
            }
            Err(err) => self.report(err),
        }
    }

    /// Open the yes/no dialog; the actual mutation happens on confirm.
    fn request_delete(&mut self) {
        let Some(id) = self.selected else {
            self.report(StoreError::NoSelection);
            return;
        };
        let Some(contact) = self.store.get(id) else {
            self.selected = None;
            self.report(StoreError::NoSelection);
            return;
        };
        self.confirm_modal = Some(ConfirmModal {
            title: "CONFIRM DELETE".to_string(),
            message: format!("Delete contact \"{}\"?", contact.name),
            action: ConfirmAction::DeleteContact(id),
        });
    }

    fn delete_contact(&mut self, id: ContactId) {
        match self.store.delete_confirmed(id) {
            Ok(removed) => {
                self.refresh_visible();
                self.form.clear();
                self.selected = None;
                self.set_status(format!("Deleted \"{}\"", removed.name));
            }
            Err(err @ StoreError::Persistence { .. }) => {
                self.refresh_visible();
                self.form.clear();
                self.selected = None;
                self.report(err);
            }
            Err(err) => self.report(err),
        }
    }

    fn open_path_modal(&mut self, purpose: PathPurpose) {
        let initial = match purpose {
            PathPurpose::Import => String::new(),
            PathPurpose::Export => "contacts_export.json".to_string(),
        };
        self.path_modal = Some(PathModal {
            purpose,
            input: Input::new(initial),
        });
    }

    fn import_from(&mut self, path: &std::path::Path) {
        match self.store.import_merge(path) {
            Ok(report) => {
                self.refresh_visible();
                if report.skipped > 0 {
                    self.set_status(format!(
                        "Imported {} contacts ({} skipped)",
                        report.added, report.skipped
                    ));
                } else {
                    self.set_status(format!("Imported {} contacts", report.added));
                }
            }
            Err(err @ StoreError::Persistence { .. }) => {
                self.refresh_visible();
                self.report(err);
            }
            Err(err) => self.report(err),
        }
    }

    fn export_to(&mut self, path: &std::path::Path) {
        match self.store.export(path) {
            Ok(()) => self.set_status(format!("Exported to {}", path.display())),
            Err(err) => self.report(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::store::{ContactDraft, Store};
    use crossterm::event::KeyEventKind;
    use tempfile::TempDir;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: crossterm::event::KeyEventState::NONE,
        }
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent {
            code: KeyCode::Char(c),
            modifiers: KeyModifiers::CONTROL,
            kind: KeyEventKind::Press,
            state: crossterm::event::KeyEventState::NONE,
        }
    }

    fn test_config() -> Config {
        Config {
            config_path: None,
            book: PathBuf::from("contacts.json"),
            ui: Default::default(),
        }
    }

    fn seeded_store(dir: &TempDir) -> Store {
        let (mut store, _) = Store::open(dir.path().join("contacts.json"));
        for (name, phone) in [("Acme", "555-0100"), ("Boreal", "555-0101")] {
            store
                .add(&ContactDraft {
                    name: name.to_string(),
                    phone: phone.to_string(),
                    ..ContactDraft::default()
                })
                .unwrap();
        }
        store
    }

    #[test]
    fn typing_in_search_filters_the_view() {
        let dir = TempDir::new().unwrap();
        let mut store = seeded_store(&dir);
        let config = test_config();
        let mut app = App::new(&mut store, &config);
        assert_eq!(app.visible.len(), 2);

        app.focused_pane = PaneFocus::Search;
        app.handle_key(key(KeyCode::Char('b'))).unwrap();
        assert_eq!(app.visible.len(), 1);
        assert_eq!(app.visible_contacts()[0].name, "Boreal");

        app.handle_key(key(KeyCode::Backspace)).unwrap();
        assert_eq!(app.visible.len(), 2);
    }

    #[test]
    fn delete_without_selection_reports_no_selection() {
        let dir = TempDir::new().unwrap();
        let mut store = seeded_store(&dir);
        let config = test_config();
        let mut app = App::new(&mut store, &config);

        app.handle_key(ctrl('d')).unwrap();
        assert!(app.confirm_modal.is_none());
        assert_eq!(app.status.as_deref(), Some("no contact is selected"));
        assert_eq!(app.store().len(), 2);
    }

    #[test]
    fn delete_flow_requires_confirmation() {
        let dir = TempDir::new().unwrap();
        let mut store = seeded_store(&dir);
        let config = test_config();
        let mut app = App::new(&mut store, &config);

        // Activate the first row, then request deletion.
        app.focused_pane = PaneFocus::Results;
        app.handle_key(key(KeyCode::Enter)).unwrap();
        assert!(app.selected.is_some());
        app.handle_key(ctrl('d')).unwrap();
        assert!(app.confirm_modal.is_some());
        assert_eq!(app.store().len(), 2);

        // Declining keeps the record.
        app.handle_key(key(KeyCode::Char('n'))).unwrap();
        assert!(app.confirm_modal.is_none());
        assert_eq!(app.store().len(), 2);

        // Confirming removes it.
        app.handle_key(ctrl('d')).unwrap();
        app.handle_key(key(KeyCode::Char('y'))).unwrap();
        assert_eq!(app.store().len(), 1);
        assert_eq!(app.visible.len(), 1);
        assert!(app.selected.is_none());
    }

    #[test]
    fn selection_survives_a_filter_change() {
        let dir = TempDir::new().unwrap();
        let mut store = seeded_store(&dir);
        let config = test_config();
        let mut app = App::new(&mut store, &config);

        app.focused_pane = PaneFocus::Results;
        app.handle_key(key(KeyCode::Down)).unwrap();
        app.handle_key(key(KeyCode::Enter)).unwrap();
        let selected = app.selected.unwrap();

        // Narrow the filter to the *other* record; the selection id still
        // points at Boreal, not at whatever occupies row 0 now.
        app.focused_pane = PaneFocus::Search;
        for c in "acme".chars() {
            app.handle_key(key(KeyCode::Char(c))).unwrap();
        }
        assert_eq!(app.visible.len(), 1);
        assert_eq!(app.selected, Some(selected));
        assert_eq!(app.store().get(selected).unwrap().name, "Boreal");
    }

    #[test]
    fn add_via_form_appends_and_clears() {
        let dir = TempDir::new().unwrap();
        let (mut store, _) = Store::open(dir.path().join("contacts.json"));
        let config = test_config();
        let mut app = App::new(&mut store, &config);

        for c in "Acme".chars() {
            app.handle_key(key(KeyCode::Char(c))).unwrap();
        }
        app.handle_key(key(KeyCode::Tab)).unwrap();
        for c in "555-0100".chars() {
            app.handle_key(key(KeyCode::Char(c))).unwrap();
        }
        app.handle_key(ctrl('a')).unwrap();

        assert_eq!(app.store().len(), 1);
        assert_eq!(app.visible.len(), 1);
        assert_eq!(app.form.draft(), ContactDraft::default());
        assert_eq!(app.status.as_deref(), Some("Added \"Acme\""));
    }

    #[test]
    fn invalid_add_leaves_form_and_store_alone() {
        let dir = TempDir::new().unwrap();
        let (mut store, _) = Store::open(dir.path().join("contacts.json"));
        let config = test_config();
        let mut app = App::new(&mut store, &config);

        for c in "Acme".chars() {
            app.handle_key(key(KeyCode::Char(c))).unwrap();
        }
        app.handle_key(ctrl('a')).unwrap();

        assert_eq!(app.store().len(), 0);
        assert_eq!(app.form.draft().name, "Acme");
        assert_eq!(app.status.as_deref(), Some("phone is required"));
    }
}
