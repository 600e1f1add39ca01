use crate::store::Contact;

/// Normalize a string for matching: case folding only, the stored text is
/// otherwise matched literally.
pub fn normalize(s: &str) -> String {
    s.to_lowercase()
}

pub fn normalize_query(query: &str) -> Option<String> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(normalize(trimmed))
    }
}

/// Derive the filtered view: an order-preserving subsequence of `contacts`
/// whose name or phone contains the query, case-insensitively. An empty or
/// whitespace-only query selects everything. Email and address are not
/// searched.
pub fn filter<'a>(contacts: &'a [Contact], query: &str) -> Vec<&'a Contact> {
    match normalize_query(query) {
        None => contacts.iter().collect(),
        Some(term) => contacts
            .iter()
            .filter(|c| normalize(&c.name).contains(&term) || normalize(&c.phone).contains(&term))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ContactDraft, LoadOutcome, Store};
    use tempfile::TempDir;

    fn store_with(names_phones: &[(&str, &str)]) -> (Store, TempDir) {
        let dir = TempDir::new().unwrap();
        let (mut store, outcome) = Store::open(dir.path().join("contacts.json"));
        assert_eq!(outcome, LoadOutcome::Missing);
        for (name, phone) in names_phones {
            store
                .add(&ContactDraft {
                    name: name.to_string(),
                    phone: phone.to_string(),
                    ..ContactDraft::default()
                })
                .unwrap();
        }
        (store, dir)
    }

    #[test]
    fn empty_query_returns_everything_in_order() {
        let (store, _dir) = store_with(&[("Acme", "555-0100"), ("Boreal", "555-0101")]);
        let all = filter(store.contacts(), "");
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "Acme");
        assert_eq!(all[1].name, "Boreal");

        let all = filter(store.contacts(), "   ");
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn matches_name_case_insensitively() {
        let (store, _dir) = store_with(&[
            ("Acme Traders", "555-0100"),
            ("Boreal Books", "555-0101"),
            ("Acme East", "555-0102"),
        ]);
        let hits = filter(store.contacts(), "aCmE");
        assert_eq!(hits.len(), 2);
        // Relative store order is preserved.
        assert_eq!(hits[0].name, "Acme Traders");
        assert_eq!(hits[1].name, "Acme East");
    }

    #[test]
    fn matches_phone_substring() {
        let (store, _dir) = store_with(&[("Acme", "555-0100"), ("Boreal", "556-0101")]);
        let hits = filter(store.contacts(), "0101");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Boreal");
    }

    #[test]
    fn does_not_search_email_or_address() {
        let dir = TempDir::new().unwrap();
        let (mut store, _) = Store::open(dir.path().join("contacts.json"));
        store
            .add(&ContactDraft {
                name: "Acme".to_string(),
                phone: "555-0100".to_string(),
                email: "hidden@match.example".to_string(),
                address: "Matchless Lane".to_string(),
            })
            .unwrap();

        assert!(filter(store.contacts(), "hidden").is_empty());
        assert!(filter(store.contacts(), "matchless").is_empty());
    }

    #[test]
    fn query_is_trimmed_before_matching() {
        let (store, _dir) = store_with(&[("Acme", "555-0100")]);
        assert_eq!(filter(store.contacts(), "  acme  ").len(), 1);
    }
}
