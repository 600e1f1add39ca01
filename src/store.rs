use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::validate;

/// Stable runtime handle for a contact. Assigned on load/add/import and never
/// written to disk; selections hold one of these instead of a row index so a
/// changed filter or a mutation cannot redirect them to the wrong record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContactId(Uuid);

impl ContactId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ContactId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One contact entry. The four text fields are exactly what the book file
/// stores; `email` and `address` may be empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    #[serde(skip, default = "ContactId::new")]
    pub id: ContactId,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
}

impl Contact {
    fn new(name: String, phone: String, email: String, address: String) -> Self {
        Self {
            id: ContactId::new(),
            name,
            phone,
            email,
            address,
        }
    }

    fn from_draft(draft: &ContactDraft) -> Self {
        Self::new(
            draft.name.trim().to_string(),
            draft.phone.trim().to_string(),
            draft.email.trim().to_string(),
            draft.address.trim().to_string(),
        )
    }

    pub fn natural_key(&self) -> (String, String) {
        natural_key(&self.name, &self.phone)
    }
}

/// Raw form text before trimming and validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactDraft {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
}

/// The `(name, phone)` pair that defines a duplicate: name compared
/// case-insensitively after trimming, phone compared exactly after trimming.
pub fn natural_key(name: &str, phone: &str) -> (String, String) {
    (name.trim().to_lowercase(), phone.trim().to_string())
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{field} is required")]
    MissingField { field: &'static str },
    #[error("phone must be 7-20 characters using digits, spaces, +, -, ( and )")]
    InvalidPhone,
    #[error("email must look like local@domain.tld")]
    InvalidEmail,
    #[error("a contact named \"{name}\" with phone {phone} already exists")]
    DuplicateKey { name: String, phone: String },
    #[error("no contact is selected")]
    NoSelection,
    #[error("failed to write {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("import failed: {reason}")]
    Import { reason: String },
}

/// Outcome of a merge import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    /// Records actually appended to the book.
    pub added: usize,
    /// File entries dropped: missing name/phone, or a natural key already
    /// present in the book or earlier in the file.
    pub skipped: usize,
}

/// How `Store::open` found the book file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Book file existed and parsed; holds the record count.
    Loaded(usize),
    /// No book file yet; starting with an empty book.
    Missing,
    /// Book file present but unreadable or malformed; starting empty. The
    /// file stays on disk untouched until the next successful save
    /// overwrites it.
    Recovered(String),
}

/// The canonical ordered contact list, mirrored to a JSON file after every
/// successful mutation. Element order is insertion order; nothing reorders it.
pub struct Store {
    contacts: Vec<Contact>,
    path: PathBuf,
}

impl Store {
    /// Open the book at `path`. Never fails: a missing file means an empty
    /// book, and a corrupt one is bypassed for this session (reported via
    /// the returned outcome).
    pub fn open(path: impl Into<PathBuf>) -> (Self, LoadOutcome) {
        let path = path.into();
        let outcome;
        let contacts = if path.exists() {
            match fs::read_to_string(&path) {
                Ok(raw) => match serde_json::from_str::<Vec<Contact>>(&raw) {
                    Ok(contacts) => {
                        outcome = LoadOutcome::Loaded(contacts.len());
                        contacts
                    }
                    Err(err) => {
                        outcome = LoadOutcome::Recovered(format!(
                            "could not parse {}: {}",
                            path.display(),
                            err
                        ));
                        Vec::new()
                    }
                },
                Err(err) => {
                    outcome = LoadOutcome::Recovered(format!(
                        "could not read {}: {}",
                        path.display(),
                        err
                    ));
                    Vec::new()
                }
            }
        } else {
            outcome = LoadOutcome::Missing;
            Vec::new()
        };
        (Self { contacts, path }, outcome)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn get(&self, id: ContactId) -> Option<&Contact> {
        self.contacts.iter().find(|c| c.id == id)
    }

    fn position(&self, id: ContactId) -> Option<usize> {
        self.contacts.iter().position(|c| c.id == id)
    }

    fn find_by_key(&self, key: &(String, String)) -> Option<&Contact> {
        self.contacts.iter().find(|c| &c.natural_key() == key)
    }

    /// Validate and append a new contact. Rejects a draft whose
    /// `(name, phone)` pair matches an existing record. The new record goes
    /// at the end; a save failure keeps the in-memory append.
    pub fn add(&mut self, draft: &ContactDraft) -> Result<ContactId, StoreError> {
        validate::validate(draft)?;
        let contact = Contact::from_draft(draft);
        if let Some(existing) = self.find_by_key(&contact.natural_key()) {
            return Err(StoreError::DuplicateKey {
                name: existing.name.clone(),
                phone: existing.phone.clone(),
            });
        }
        let id = contact.id;
        self.contacts.push(contact);
        self.save()?;
        Ok(id)
    }

    /// Replace the fields of the contact `id` refers to, keeping its position.
    /// Unlike `add` this does not re-check the natural key against other
    /// records: editing a contact into a key another record holds is allowed.
    pub fn update(&mut self, id: ContactId, draft: &ContactDraft) -> Result<(), StoreError> {
        validate::validate(draft)?;
        let index = self.position(id).ok_or(StoreError::NoSelection)?;
        let replacement = Contact {
            id,
            ..Contact::from_draft(draft)
        };
        self.contacts[index] = replacement;
        self.save()
    }

    /// Remove the contact `id` refers to. Confirmation is the caller's
    /// problem; this is the post-confirmation mutation. Returns the removed
    /// record so the caller can report it.
    pub fn delete_confirmed(&mut self, id: ContactId) -> Result<Contact, StoreError> {
        let index = self.position(id).ok_or(StoreError::NoSelection)?;
        let removed = self.contacts.remove(index);
        self.save()?;
        Ok(removed)
    }

    /// Write the whole book to its fixed path. A failure here does not roll
    /// back whatever mutation preceded it; memory and disk reconverge on the
    /// next successful save.
    pub fn save(&self) -> Result<(), StoreError> {
        write_book(&self.path, &self.contacts)
    }

    /// Same serialization as `save`, to a caller-chosen path.
    pub fn export(&self, path: &Path) -> Result<(), StoreError> {
        write_book(path, &self.contacts)
    }

    /// Merge a JSON contact file into the book. Entries missing a name or
    /// phone after trimming are dropped, as are entries whose natural key is
    /// already present (in the book or earlier in the same file). Everything
    /// else is appended in file order and saved once. Pattern validation is
    /// deliberately skipped here: import only checks presence.
    ///
    /// An unreadable file, malformed JSON, a non-array document or a
    /// non-object entry fails the whole import with the book untouched.
    pub fn import_merge(&mut self, path: &Path) -> Result<ImportReport, StoreError> {
        let raw = fs::read_to_string(path).map_err(|err| StoreError::Import {
            reason: format!("could not read {}: {}", path.display(), err),
        })?;
        let doc: Value = serde_json::from_str(&raw).map_err(|err| StoreError::Import {
            reason: format!("could not parse {}: {}", path.display(), err),
        })?;
        let Value::Array(entries) = doc else {
            return Err(StoreError::Import {
                reason: format!("{} is not a JSON array of contacts", path.display()),
            });
        };

        let mut seen: HashSet<(String, String)> =
            self.contacts.iter().map(Contact::natural_key).collect();
        let mut accepted = Vec::new();
        for (index, entry) in entries.iter().enumerate() {
            let Value::Object(fields) = entry else {
                return Err(StoreError::Import {
                    reason: format!("entry {} is not an object", index + 1),
                });
            };
            let name = text_field(fields.get("name"));
            let phone = text_field(fields.get("phone"));
            let email = text_field(fields.get("email"));
            let address = text_field(fields.get("address"));
            if name.is_empty() || phone.is_empty() {
                continue;
            }
            if !seen.insert(natural_key(&name, &phone)) {
                continue;
            }
            accepted.push(Contact::new(name, phone, email, address));
        }

        let report = ImportReport {
            added: accepted.len(),
            skipped: entries.len() - accepted.len(),
        };
        if report.added > 0 {
            self.contacts.extend(accepted);
            self.save()?;
        }
        Ok(report)
    }
}

/// Coerce an imported JSON value to trimmed text. Numbers and booleans
/// stringify; null, absent fields and containers become empty text and fall
/// to the presence check.
fn text_field(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Serialize as pretty-printed 2-space-indented JSON, UTF-8 with non-ASCII
/// text stored literally. Writes to a sibling temp file first so a failed
/// write cannot truncate an existing book.
fn write_book(path: &Path, contacts: &[Contact]) -> Result<(), StoreError> {
    let persistence = |source: io::Error| StoreError::Persistence {
        path: path.to_path_buf(),
        source,
    };
    let mut json = serde_json::to_string_pretty(contacts)
        .map_err(|err| persistence(io::Error::new(io::ErrorKind::InvalidData, err)))?;
    json.push('\n');
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, json).map_err(persistence)?;
    fs::rename(&tmp, path).map_err(persistence)
}
