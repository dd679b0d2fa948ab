//! `user_progress` rows: one transaction per graded attempt.

use std::collections::HashMap;

use rusqlite::{params, OptionalExtension};
use tracing::debug;

use super::Db;
use crate::error::StoreError;
use crate::mastery::{Counters, Demotion};
use crate::registry::SkillDef;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttemptRecord {
    pub counters: Counters,
    pub demotion: Option<Demotion>,
}

const SELECT_COUNTERS: &str = "SELECT consecutive_correct, total_correct, total_attempted, consecutive_incorrect
     FROM user_progress WHERE user_id = ?1 AND skill_id = ?2";

fn counters_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Counters> {
    Ok(Counters {
        consecutive_correct: row.get(0)?,
        total_correct: row.get(1)?,
        total_attempted: row.get(2)?,
        consecutive_incorrect: row.get(3)?,
    })
}

impl Db {
    /// Read-or-default the counters, apply one attempt and upsert, atomically.
    /// On any error the transaction is dropped (rolled back) and the stored
    /// counters are left as they were.
    pub fn record_attempt(&self, user_id: i64, skill: &SkillDef, correct: bool) -> Result<AttemptRecord, StoreError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let mut counters = tx
                .query_row(SELECT_COUNTERS, params![user_id, skill.id], counters_from_row)
                .optional()?
                .unwrap_or_default();
            let demotion = counters.record(correct, skill.prerequisite);

            tx.execute(
                "INSERT INTO user_progress
                   (user_id, skill_id, consecutive_correct, total_correct, total_attempted, consecutive_incorrect)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT (user_id, skill_id) DO UPDATE SET
                   consecutive_correct = excluded.consecutive_correct,
                   total_correct = excluded.total_correct,
                   total_attempted = excluded.total_attempted,
                   consecutive_incorrect = excluded.consecutive_incorrect",
                params![
                    user_id,
                    skill.id,
                    counters.consecutive_correct,
                    counters.total_correct,
                    counters.total_attempted,
                    counters.consecutive_incorrect
                ],
            )?;
            tx.commit()?;

            debug!(target: "mastery", user_id, skill_id = skill.id, correct, ?counters, "Progress updated");
            Ok(AttemptRecord { counters, demotion })
        })
    }

    /// `None` when the user has never been graded on the skill.
    pub fn progress(&self, user_id: i64, skill_id: &str) -> Result<Option<Counters>, StoreError> {
        self.with_conn(|conn| {
            Ok(conn.query_row(SELECT_COUNTERS, params![user_id, skill_id], counters_from_row).optional()?)
        })
    }

    pub fn progress_for_user(&self, user_id: i64) -> Result<HashMap<String, Counters>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT skill_id, consecutive_correct, total_correct, total_attempted, consecutive_incorrect
                 FROM user_progress WHERE user_id = ?1",
            )?;
            let rows = stmt.query_map([user_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    Counters {
                        consecutive_correct: row.get(1)?,
                        total_correct: row.get(2)?,
                        total_attempted: row.get(3)?,
                        consecutive_incorrect: row.get(4)?,
                    },
                ))
            })?;
            Ok(rows.collect::<Result<HashMap<_, _>, _>>()?)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{find, SKILLS};

    fn db_with_user() -> (Db, i64) {
        let db = Db::open_in_memory().unwrap();
        db.sync_registry(SKILLS, &[]).unwrap();
        let id = db.create_user("ada", "hash").unwrap();
        (db, id)
    }

    #[test]
    fn row_is_created_lazily_on_first_attempt() {
        let (db, user) = db_with_user();
        let skill = find("remainder-theorem").unwrap();
        assert_eq!(db.progress(user, skill.id).unwrap(), None);

        let rec = db.record_attempt(user, skill, true).unwrap();
        assert_eq!(rec.demotion, None);
        assert_eq!(
            db.progress(user, skill.id).unwrap(),
            Some(Counters { consecutive_correct: 1, total_correct: 1, total_attempted: 1, consecutive_incorrect: 0 })
        );
    }

    #[test]
    fn third_miss_demotes_and_persists_the_reset() {
        let (db, user) = db_with_user();
        let skill = find("factor-theorem").unwrap();
        assert_eq!(db.record_attempt(user, skill, false).unwrap().demotion, None);
        assert_eq!(db.record_attempt(user, skill, false).unwrap().demotion, None);
        let third = db.record_attempt(user, skill, false).unwrap();
        assert_eq!(third.demotion.map(|d| d.to_skill_id), Some("remainder-theorem"));

        let stored = db.progress(user, skill.id).unwrap().unwrap();
        assert_eq!(stored.consecutive_incorrect, 0);
        assert_eq!(stored.total_attempted, 3);
    }

    #[test]
    fn failed_write_leaves_prior_counters_untouched() {
        let (db, user) = db_with_user();
        let skill = find("remainder-theorem").unwrap();
        db.record_attempt(user, skill, true).unwrap();

        db.with_conn(|c| {
            c.execute_batch(
                "CREATE TRIGGER refuse_progress BEFORE UPDATE ON user_progress
                 BEGIN SELECT RAISE(ABORT, 'read-only'); END;",
            )?;
            Ok(())
        })
        .unwrap();

        assert!(db.record_attempt(user, skill, false).is_err());
        assert_eq!(db.progress(user, skill.id).unwrap().unwrap().total_attempted, 1);
    }

    #[test]
    fn progress_is_keyed_by_user() {
        let (db, ada) = db_with_user();
        let bob = db.create_user("bob", "hash").unwrap();
        let skill = find("linear-eq-addition").unwrap();
        db.record_attempt(ada, skill, true).unwrap();
        db.record_attempt(bob, skill, false).unwrap();

        let ada_map = db.progress_for_user(ada).unwrap();
        assert_eq!(ada_map[skill.id].total_correct, 1);
        assert_eq!(db.progress_for_user(bob).unwrap()[skill.id].consecutive_incorrect, 1);
    }
}
