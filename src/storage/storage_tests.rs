use super::*;
use crate::identity::Role;

fn mem() -> Store {
    Store::open_in_memory().unwrap()
}

#[test]
fn open_creates_all_tables_on_disk() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("nested").join("auth.db");
    let store = Store::open(&path).unwrap();
    assert!(path.exists());
    for t in schema::TABLES {
        let n: i64 = store
            .conn()
            .query_row("SELECT COUNT(1) FROM sqlite_master WHERE type='table' AND name=?1", [t], |r| r.get(0))
            .unwrap();
        assert_eq!(n, 1, "missing table {t}");
    }
    // Reopening an existing file is fine
    drop(store);
    Store::open(&path).unwrap();
}

#[test]
fn default_admin_is_seeded_once() {
    let mut store = mem();
    assert!(store.ensure_default_admin("admin@college.com", "h1").unwrap());
    assert!(!store.ensure_default_admin("other@college.com", "h2").unwrap());
    let creds = store.credentials_for(Role::Admin, "admin@college.com").unwrap();
    assert_eq!(creds.len(), 1);
    assert!(store.credentials_for(Role::Admin, "other@college.com").unwrap().is_empty());
}

#[test]
fn admin_email_is_unique() {
    let store = mem();
    store.create_admin("a@x.com", "h").unwrap();
    assert!(store.create_admin("a@x.com", "h").is_err());
}

#[test]
fn demo_staff_only_seeds_empty_table() {
    let mut store = mem();
    store.create_staff("m1@x.com", "h").unwrap();
    assert!(!store.seed_demo_staff("h").unwrap());
    let mut empty = mem();
    assert!(empty.seed_demo_staff("h").unwrap());
    assert_eq!(empty.list_staff().unwrap()[0].email, DEMO_STAFF_EMAIL);
}

#[test]
fn duplicate_staff_emails_are_accepted_and_ordered() {
    let store = mem();
    let a = store.create_staff("dup@x.com", "first").unwrap();
    let b = store.create_staff("dup@x.com", "second").unwrap();
    let creds = store.credentials_for(Role::Staff, "dup@x.com").unwrap();
    assert_eq!(creds, vec![(a, "first".to_string()), (b, "second".to_string())]);
}

#[test]
fn map_only_unmentored_students() {
    let store = mem();
    let id = store.create_student("st@x.com", "h", None).unwrap();
    assert_eq!(store.map_student(id, "m1@x.com").unwrap(), MapOutcome::Mapped);
    assert_eq!(store.map_student(id, "m2@x.com").unwrap(), MapOutcome::AlreadyAssigned);
    assert_eq!(store.get_student(id).unwrap().unwrap().mentor_email.as_deref(), Some("m1@x.com"));
    assert_eq!(store.map_student(9999, "m1@x.com").unwrap(), MapOutcome::NotFound);
}

#[test]
fn unmap_requires_current_mentor() {
    let store = mem();
    let id = store.create_student("st@x.com", "h", Some("m1@x.com")).unwrap();
    assert_eq!(store.unmap_student(id, "m2@x.com").unwrap(), UnmapOutcome::NotMentor);
    assert_eq!(store.unmap_student(id, "m1@x.com").unwrap(), UnmapOutcome::Unmapped);
    // Second unmap: no longer the mentor, nothing changes
    assert_eq!(store.unmap_student(id, "m1@x.com").unwrap(), UnmapOutcome::NotMentor);
    assert_eq!(store.get_student(id).unwrap().unwrap().mentor_email, None);
    assert_eq!(store.unmap_student(9999, "m1@x.com").unwrap(), UnmapOutcome::NotFound);
}

#[test]
fn staff_rename_moves_mentees() {
    let mut store = mem();
    let staff = store.create_staff("m1@x.com", "h").unwrap();
    let st = store.create_student("st@x.com", "h", Some("m1@x.com")).unwrap();
    assert!(store.update_staff(staff, "m9@x.com", None).unwrap());
    assert_eq!(store.get_student(st).unwrap().unwrap().mentor_email.as_deref(), Some("m9@x.com"));
    // Password untouched when not supplied
    assert_eq!(store.credentials_for(Role::Staff, "m9@x.com").unwrap()[0].1, "h");
    assert!(!store.update_staff(4242, "x@x.com", None).unwrap());
}

#[test]
fn renaming_one_of_two_shared_email_rows_keeps_mentees() {
    let mut store = mem();
    let first = store.create_staff("m1@x.com", "h").unwrap();
    store.create_staff("m1@x.com", "h2").unwrap();
    let st = store.create_student("st@x.com", "h", Some("m1@x.com")).unwrap();
    assert!(store.update_staff(first, "m9@x.com", None).unwrap());
    assert_eq!(store.get_student(st).unwrap().unwrap().mentor_email.as_deref(), Some("m1@x.com"));
    assert_eq!(store.credentials_for(Role::Staff, "m1@x.com").unwrap().len(), 1);
}

#[test]
fn staff_delete_releases_mentees() {
    let mut store = mem();
    let staff = store.create_staff("m1@x.com", "h").unwrap();
    let st = store.create_student("st@x.com", "h", Some("m1@x.com")).unwrap();
    assert!(store.delete_staff(staff).unwrap());
    assert!(store.get_staff(staff).unwrap().is_none());
    assert_eq!(store.get_student(st).unwrap().unwrap().mentor_email, None);
    assert!(!store.delete_staff(staff).unwrap());
}

#[test]
fn student_rename_moves_documents() {
    let mut store = mem();
    let st = store.create_student("old@x.com", "h", Some("m1@x.com")).unwrap();
    store.insert_document("old@x.com", "a.pdf", Some("Transcript")).unwrap();
    assert!(store.update_student(st, "new@x.com", Some("h2")).unwrap());
    assert!(store.documents_for_student("old@x.com").unwrap().is_empty());
    assert_eq!(store.documents_for_student("new@x.com").unwrap().len(), 1);
    assert_eq!(store.credentials_for(Role::Student, "new@x.com").unwrap()[0].1, "h2");
    // Mentor survives an admin edit
    assert_eq!(store.get_student(st).unwrap().unwrap().mentor_email.as_deref(), Some("m1@x.com"));
}

#[test]
fn student_delete_keeps_documents() {
    let store = mem();
    let st = store.create_student("st@x.com", "h", None).unwrap();
    store.insert_document("st@x.com", "a.pdf", None).unwrap();
    assert!(store.delete_student(st).unwrap());
    assert!(store.get_student(st).unwrap().is_none());
    assert_eq!(store.count_documents().unwrap(), 1);
}

#[test]
fn mentor_listing_follows_mapping() {
    let store = mem();
    store.create_student("s1@x.com", "h", Some("m1@x.com")).unwrap();
    store.create_student("s2@x.com", "h", Some("m2@x.com")).unwrap();
    store.insert_document("s1@x.com", "cert_A.pdf", Some("Transcript")).unwrap();
    store.insert_document("s2@x.com", "cert_B.pdf", Some("Degree")).unwrap();

    let docs = store.documents_for_mentor("m1@x.com").unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].filename, "cert_A.pdf");
    assert_eq!(docs[0].cert_type.as_deref(), Some("Transcript"));
    assert_eq!(docs[0].student_email, "s1@x.com");
    assert!(docs[0].uploaded_at.is_some());

    assert_eq!(store.students_mentored_by("m2@x.com").unwrap().len(), 1);
    assert!(store.documents_for_mentor("nobody@x.com").unwrap().is_empty());
}

#[test]
fn shared_store_is_cloneable_handle() {
    let shared = SharedStore::open_in_memory().unwrap();
    let other = shared.clone();
    shared.0.lock().create_staff("m1@x.com", "h").unwrap();
    assert_eq!(other.0.lock().list_staff().unwrap().len(), 1);
}
