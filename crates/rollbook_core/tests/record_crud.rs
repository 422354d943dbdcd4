use rollbook_core::db::open_db_in_memory;
use rollbook_core::repo::record::Record;
use rollbook_core::{
    Meeting, Member, RecordId, RecordRepository, RepoError, RepoResult, SqliteRecordRepository,
};
use rusqlite::types::Value;
use rusqlite::{Connection, Row};
use std::collections::HashSet;

fn member_repo(conn: &mut Connection) -> SqliteRecordRepository<'_, Member> {
    SqliteRecordRepository::try_new(conn).unwrap()
}

#[test]
fn save_assigns_id_and_roundtrips() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = member_repo(&mut conn);

    let mut member = Member::new("Ada Lovelace", "ada@example.org", 1_000);
    assert!(member.id.is_none());
    repo.save(&mut member).unwrap();

    let id = member.id.expect("save should assign an id");
    let loaded = repo.get_by_id(id).unwrap().unwrap();
    assert_eq!(loaded, member);
}

#[test]
fn get_by_id_of_unknown_id_returns_none() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = member_repo(&mut conn);

    assert!(repo.get_by_id(42).unwrap().is_none());
}

#[test]
fn get_by_ids_with_empty_input_returns_empty() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = member_repo(&mut conn);

    assert!(repo.get_by_ids(&[]).unwrap().is_empty());
}

#[test]
fn get_by_ids_returns_exactly_the_requested_set() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = member_repo(&mut conn);

    let mut a = Member::new("Ada", "ada@example.org", 1);
    let mut b = Member::new("Grace", "grace@example.org", 2);
    let mut c = Member::new("Edsger", "edsger@example.org", 3);
    repo.save(&mut a).unwrap();
    repo.save(&mut b).unwrap();
    repo.save(&mut c).unwrap();

    let wanted = [a.id.unwrap(), c.id.unwrap(), a.id.unwrap()];
    let found = repo.get_by_ids(&wanted).unwrap();

    let found_ids: Vec<RecordId> = found.iter().map(|member| member.id.unwrap()).collect();
    let unique: HashSet<RecordId> = found_ids.iter().copied().collect();
    assert_eq!(found.len(), 2, "no duplicates and none extra");
    assert_eq!(unique, HashSet::from([a.id.unwrap(), c.id.unwrap()]));
}

#[test]
fn count_all_matches_list_length() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = member_repo(&mut conn);

    assert_eq!(repo.count_all().unwrap(), 0);
    assert!(repo.list().unwrap().is_empty());

    for n in 0..4 {
        let mut member = Member::new(format!("Member {n}"), format!("m{n}@example.org"), n);
        repo.save(&mut member).unwrap();
    }

    assert_eq!(repo.count_all().unwrap(), repo.list().unwrap().len() as i64);
    assert_eq!(repo.count_all().unwrap(), 4);
}

#[test]
fn list_sorted_orders_ascending_by_column() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = member_repo(&mut conn);

    for (name, email) in [
        ("Charlie", "charlie@example.org"),
        ("Alice", "alice@example.org"),
        ("Bob", "bob@example.org"),
    ] {
        let mut member = Member::new(name, email, 0);
        repo.save(&mut member).unwrap();
    }

    let sorted = repo.list_sorted(&["full_name"]).unwrap();
    let names: Vec<&str> = sorted.iter().map(|member| member.full_name.as_str()).collect();
    assert_eq!(names, ["Alice", "Bob", "Charlie"]);
}

#[test]
fn list_sorted_without_columns_matches_list() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = member_repo(&mut conn);

    for n in 0..3 {
        let mut member = Member::new(format!("Member {n}"), format!("m{n}@example.org"), n);
        repo.save(&mut member).unwrap();
    }

    let listed: HashSet<RecordId> = repo
        .list()
        .unwrap()
        .into_iter()
        .map(|member| member.id.unwrap())
        .collect();
    let unsorted: HashSet<RecordId> = repo
        .list_sorted(&[])
        .unwrap()
        .into_iter()
        .map(|member| member.id.unwrap())
        .collect();
    assert_eq!(listed, unsorted);
}

#[test]
fn list_sorted_rejects_unknown_column() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = member_repo(&mut conn);

    let err = repo.list_sorted(&["full_name", "shoe_size"]).unwrap_err();
    assert!(matches!(
        err,
        RepoError::UnknownSortColumn {
            table: "members",
            column,
        } if column == "shoe_size"
    ));
}

#[test]
fn duplicate_key_save_rolls_back_and_leaves_session_usable() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = member_repo(&mut conn);

    let mut first = Member::new("Ada", "shared@example.org", 1);
    repo.save(&mut first).unwrap();

    let mut duplicate = Member::new("Impostor", "shared@example.org", 2);
    let err = repo.save(&mut duplicate).unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
    assert!(duplicate.id.is_none(), "failed save must not bind an id");
    assert_eq!(repo.count_all().unwrap(), 1);

    let mut third = Member::new("Grace", "grace@example.org", 3);
    repo.save(&mut third).unwrap();
    assert_eq!(repo.count_all().unwrap(), 2);
}

#[test]
fn save_all_assigns_distinct_ids() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = member_repo(&mut conn);

    let mut batch = vec![
        Member::new("Ada", "ada@example.org", 1),
        Member::new("Grace", "grace@example.org", 2),
        Member::new("Edsger", "edsger@example.org", 3),
    ];
    repo.save_all(&mut batch).unwrap();

    let ids: HashSet<RecordId> = batch.iter().map(|member| member.id.unwrap()).collect();
    assert_eq!(ids.len(), 3);
    assert_eq!(repo.count_all().unwrap(), 3);
}

#[test]
fn save_all_failure_aborts_the_whole_batch() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = member_repo(&mut conn);

    let mut existing = Member::new("Ada", "taken@example.org", 1);
    repo.save(&mut existing).unwrap();

    let mut batch = vec![
        Member::new("Fresh", "fresh@example.org", 2),
        Member::new("Clash", "taken@example.org", 3),
    ];
    let err = repo.save_all(&mut batch).unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));

    assert_eq!(repo.count_all().unwrap(), 1, "no partial commit");
    assert!(batch.iter().all(|member| member.id.is_none()));
}

#[test]
fn update_persists_local_mutation() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = member_repo(&mut conn);

    let mut member = Member::new("Ada", "ada@example.org", 1);
    repo.save(&mut member).unwrap();

    member.full_name = "Ada King".to_string();
    member.joined_at = 99;
    repo.update(&mut member).unwrap();

    let loaded = repo.get_by_id(member.id.unwrap()).unwrap().unwrap();
    assert_eq!(loaded.full_name, "Ada King");
    assert_eq!(loaded.joined_at, 99);
}

#[test]
fn update_of_unsaved_record_inserts_and_binds_id() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = member_repo(&mut conn);

    let mut member = Member::new("Ada", "ada@example.org", 1);
    repo.update(&mut member).unwrap();

    assert!(member.id.is_some());
    assert_eq!(repo.count_all().unwrap(), 1);
}

#[test]
fn remove_then_get_returns_none() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = member_repo(&mut conn);

    let mut member = Member::new("Ada", "ada@example.org", 1);
    repo.save(&mut member).unwrap();
    let id = member.id.unwrap();

    repo.remove(&member).unwrap();
    assert!(repo.get_by_id(id).unwrap().is_none());
}

#[test]
fn remove_of_unsaved_record_is_missing_id() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = member_repo(&mut conn);

    let member = Member::new("Ada", "ada@example.org", 1);
    let err = repo.remove(&member).unwrap_err();
    assert!(matches!(err, RepoError::MissingId { table: "members" }));
}

#[test]
fn remove_of_missing_row_is_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = member_repo(&mut conn);

    let mut member = Member::new("Ada", "ada@example.org", 1);
    repo.save(&mut member).unwrap();
    repo.remove(&member).unwrap();

    let err = repo.remove(&member).unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            table: "members",
            id,
        } if id == member.id.unwrap()
    ));
}

#[test]
fn repository_is_generic_over_the_record_type() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo: SqliteRecordRepository<'_, Meeting> =
        SqliteRecordRepository::try_new(&mut conn).unwrap();

    let mut meeting = Meeting::new("Annual assembly", 1_700_000_000_000);
    repo.save(&mut meeting).unwrap();

    meeting.minutes = Some("quorum reached".to_string());
    repo.update(&mut meeting).unwrap();

    let loaded = repo.get_by_id(meeting.id.unwrap()).unwrap().unwrap();
    assert_eq!(loaded.minutes.as_deref(), Some("quorum reached"));
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let mut conn = Connection::open_in_memory().unwrap();

    let result: RepoResult<SqliteRecordRepository<'_, Member>> =
        SqliteRecordRepository::try_new(&mut conn);
    match result {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert!(expected_version > 0),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_required_table() {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("PRAGMA user_version = 99;").unwrap();

    let result: RepoResult<SqliteRecordRepository<'_, Member>> =
        SqliteRecordRepository::try_new(&mut conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredTable("members"))
    ));
}

#[test]
fn repository_rejects_connection_missing_required_column() {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "PRAGMA user_version = 99;
         CREATE TABLE members (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            full_name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE
         );",
    )
    .unwrap();

    let result: RepoResult<SqliteRecordRepository<'_, Member>> =
        SqliteRecordRepository::try_new(&mut conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "members",
            column: "joined_at"
        })
    ));
}

/// Test-local record bound to a table whose id column is not unique.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Widget {
    id: Option<RecordId>,
    label: String,
}

impl Record for Widget {
    const TABLE: &'static str = "widgets";
    const COLUMNS: &'static [&'static str] = &["label"];

    fn id(&self) -> Option<RecordId> {
        self.id
    }

    fn assign_id(&mut self, id: RecordId) {
        self.id = Some(id);
    }

    fn to_values(&self) -> Vec<Value> {
        vec![Value::Text(self.label.clone())]
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            id: Some(row.get("id")?),
            label: row.get("label")?,
        })
    }
}

#[test]
fn get_by_id_fails_when_multiple_rows_share_an_id() {
    let mut conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE widgets (id INTEGER NOT NULL, label TEXT NOT NULL);
         INSERT INTO widgets (id, label) VALUES (7, 'first');
         INSERT INTO widgets (id, label) VALUES (7, 'second');",
    )
    .unwrap();

    let repo: SqliteRecordRepository<'_, Widget> =
        SqliteRecordRepository::try_new(&mut conn).unwrap();
    let err = repo.get_by_id(7).unwrap_err();
    assert!(matches!(
        err,
        RepoError::MultipleRowsForId {
            table: "widgets",
            id: 7,
        }
    ));
}
