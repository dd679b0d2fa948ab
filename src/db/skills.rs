//! Skill rows and dependency edges: startup reconciliation with the registry
//! plus the read side used by the dashboard.

use std::collections::HashMap;

use rusqlite::{params, OptionalExtension};
use tracing::{info, warn};

use super::Db;
use crate::config::DependencyCfg;
use crate::error::StoreError;
use crate::registry::SkillDef;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkillRow {
    pub skill_id: String,
    pub display_name: String,
    pub description: String,
    pub prerequisite_skill_id: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub inserted: usize,
    pub updated: usize,
    pub edges_added: usize,
}

impl Db {
    /// Insert missing skills, update changed metadata in place, and record the
    /// prerequisite of each skill (plus any configured extra edges) as a
    /// dependency edge. Safe to run on every start.
    pub fn sync_registry(&self, skills: &[SkillDef], extra: &[DependencyCfg]) -> Result<SyncReport, StoreError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute_batch("PRAGMA defer_foreign_keys = ON;")?;
            let mut report = SyncReport::default();

            for def in skills {
                let existing = tx
                    .query_row(
                        "SELECT skill_id, display_name, description, prerequisite_skill_id FROM skills WHERE skill_id = ?1",
                        [def.id],
                        |row| {
                            Ok(SkillRow {
                                skill_id: row.get(0)?,
                                display_name: row.get(1)?,
                                description: row.get(2)?,
                                prerequisite_skill_id: row.get(3)?,
                            })
                        },
                    )
                    .optional()?;

                match existing {
                    None => {
                        tx.execute(
                            "INSERT INTO skills (skill_id, display_name, description, prerequisite_skill_id) VALUES (?1, ?2, ?3, ?4)",
                            params![def.id, def.display_name, def.description, def.prerequisite],
                        )?;
                        info!(target: "algebra_tutor", skill_id = def.id, "Added skill");
                        report.inserted += 1;
                    }
                    Some(row)
                        if row.display_name != def.display_name
                            || row.description != def.description
                            || row.prerequisite_skill_id.as_deref() != def.prerequisite =>
                    {
                        tx.execute(
                            "UPDATE skills SET display_name = ?2, description = ?3, prerequisite_skill_id = ?4 WHERE skill_id = ?1",
                            params![def.id, def.display_name, def.description, def.prerequisite],
                        )?;
                        info!(target: "algebra_tutor", skill_id = def.id, "Updated skill");
                        report.updated += 1;
                    }
                    Some(_) => {}
                }
            }

            let known = |id: &str| skills.iter().any(|s| s.id == id);
            let registry_edges = skills
                .iter()
                .filter_map(|s| s.prerequisite.map(|p| (p.to_string(), s.id.to_string())));
            let configured_edges = extra.iter().filter_map(|d| {
                if known(&d.prerequisite) && known(&d.target) && d.prerequisite != d.target {
                    Some((d.prerequisite.clone(), d.target.clone()))
                } else {
                    warn!(target: "algebra_tutor", prerequisite = %d.prerequisite, target = %d.target, "Skipping dependency edge with unknown skill");
                    None
                }
            });

            for (prerequisite, target) in registry_edges.chain(configured_edges) {
                report.edges_added += tx.execute(
                    "INSERT OR IGNORE INTO skill_dependencies (prerequisite_id, target_id) VALUES (?1, ?2)",
                    params![prerequisite, target],
                )?;
            }

            tx.commit()?;
            Ok(report)
        })
    }

    pub fn list_skills(&self) -> Result<Vec<SkillRow>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT skill_id, display_name, description, prerequisite_skill_id FROM skills ORDER BY rowid",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(SkillRow {
                        skill_id: row.get(0)?,
                        display_name: row.get(1)?,
                        description: row.get(2)?,
                        prerequisite_skill_id: row.get(3)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Prerequisites of every target, from the dependency-edge table.
    pub fn requirements_by_target(&self) -> Result<HashMap<String, Vec<String>>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT target_id, prerequisite_id FROM skill_dependencies ORDER BY id")?;
            let mut out: HashMap<String, Vec<String>> = HashMap::new();
            let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;
            for row in rows {
                let (target, prerequisite) = row?;
                out.entry(target).or_default().push(prerequisite);
            }
            Ok(out)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SKILLS;

    fn extra(prerequisite: &str, target: &str) -> DependencyCfg {
        DependencyCfg { prerequisite: prerequisite.into(), target: target.into() }
    }

    #[test]
    fn first_sync_inserts_every_skill_and_edge() {
        let db = Db::open_in_memory().unwrap();
        let report = db.sync_registry(SKILLS, &[]).unwrap();
        assert_eq!(report.inserted, SKILLS.len());
        assert_eq!(report.updated, 0);
        assert_eq!(report.edges_added, SKILLS.iter().filter(|s| s.prerequisite.is_some()).count());

        let rows = db.list_skills().unwrap();
        assert_eq!(rows.len(), SKILLS.len());
        assert_eq!(rows[1].skill_id, "factor-theorem");
        assert_eq!(rows[1].prerequisite_skill_id.as_deref(), Some("remainder-theorem"));
    }

    #[test]
    fn resync_is_a_no_op() {
        let db = Db::open_in_memory().unwrap();
        db.sync_registry(SKILLS, &[]).unwrap();
        assert_eq!(db.sync_registry(SKILLS, &[]).unwrap(), SyncReport::default());
    }

    #[test]
    fn changed_metadata_is_updated_in_place() {
        let db = Db::open_in_memory().unwrap();
        db.sync_registry(SKILLS, &[]).unwrap();

        let mut edited: Vec<SkillDef> = SKILLS.to_vec();
        edited[0].display_name = "Remainders";
        let report = db.sync_registry(&edited, &[]).unwrap();
        assert_eq!(report, SyncReport { inserted: 0, updated: 1, edges_added: 0 });
        assert_eq!(db.list_skills().unwrap()[0].display_name, "Remainders");
    }

    #[test]
    fn configured_edges_are_added_once_and_unknown_ones_skipped() {
        let db = Db::open_in_memory().unwrap();
        let edges = [
            extra("remainder-theorem", "linear-eq-addition"),
            extra("remainder-theorem", "linear-eq-addition"),
            extra("trigonometry", "factor-theorem"),
        ];
        db.sync_registry(SKILLS, &edges).unwrap();

        let reqs = db.requirements_by_target().unwrap();
        assert_eq!(
            reqs.get("linear-eq-addition").cloned().unwrap_or_default(),
            vec!["linear-eq-substitution".to_string(), "remainder-theorem".to_string()]
        );
        assert_eq!(reqs.get("factor-theorem").map(Vec::len), Some(1));
    }
}
