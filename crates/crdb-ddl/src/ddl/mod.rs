//! DDL statement planning for column and table changes.
//!
//! The target dialect cannot change a column's type in place, so a
//! type/precision/decimals change rebuilds the column: add a temporary
//! column, copy values across with the right cast, drop the original,
//! rename. DDL statements are not guaranteed atomic as a group; the
//! randomized temporary name keeps a retry from colliding with debris
//! left by an interrupted earlier attempt. Row values that fail the copy
//! cast are not pre-validated: the UPDATE aborts and the caller decides
//! what to do with the partially-altered schema.

use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;
use tracing::debug;

use crate::core::schema::{ColumnMap, ColumnSpec, TypeFamily};
use crate::dialect::{CastRule, DialectProfile};
use crate::error::{DdlError, Result};

/// Generates collision-resistant temporary column names.
///
/// Monotonic counter plus a random token: never a fixed name, so a
/// second migration attempt cannot collide with a column left over from
/// an interrupted first attempt. This is the only mitigation against
/// concurrent migrations of the same table; true mutual exclusion needs
/// an external advisory lock.
#[derive(Debug, Default)]
pub struct TempColumnNamer {
    counter: AtomicU64,
}

impl TempColumnNamer {
    /// Next temporary name for a rebuild of `field`.
    pub fn next(&self, field: &str) -> String {
        let sequence = self.counter.fetch_add(1, Ordering::Relaxed);
        let token: u32 = rand::thread_rng().gen_range(0..1_000_000);
        format!("{}__temp{}{}", field, sequence, token)
    }
}

/// Plans the ordered DDL needed to reconcile a column with its desired
/// definition.
pub struct MigrationPlanner {
    profile: DialectProfile,
    namer: TempColumnNamer,
}

impl MigrationPlanner {
    /// Create a planner for the given dialect profile.
    pub fn new(profile: DialectProfile) -> Self {
        Self {
            profile,
            namer: TempColumnNamer::default(),
        }
    }

    /// The dialect profile this planner generates for.
    pub fn profile(&self) -> &DialectProfile {
        &self.profile
    }

    /// Ordered statements altering `spec.name` in `table` to match `spec`.
    ///
    /// `columns` is the table's current descriptor map from the reader;
    /// a spec naming a column the table does not have fails fast.
    ///
    /// Statement order matters and must not be shuffled: rebuild
    /// statements first, then default changes, then nullability. Setting
    /// NOT NULL before a default exists would reject already-null rows.
    pub fn plan_alter_column(
        &self,
        table: &str,
        columns: &ColumnMap,
        spec: &ColumnSpec,
    ) -> Result<Vec<String>> {
        let current = columns
            .get(&spec.name)
            .ok_or_else(|| DdlError::unknown_column(table, &spec.name))?;

        let old_family = current.family;
        let old_length = current.max_length;
        let old_decimals = current.scale.filter(|s| *s != 0);
        let old_default = if current.has_default {
            current.default_value.clone()
        } else {
            None
        };

        let type_changed = spec.family != old_family;
        let precision_changed = !spec.family.is_unbounded()
            && old_length != -1
            && spec.length.is_some_and(|l| l as i32 != old_length);
        let decimals_changed = matches!(spec.family, TypeFamily::Numeric | TypeFamily::Float)
            && spec.decimals.is_some_and(|d| d != 0)
            && old_decimals.is_some()
            && spec.decimals.map(|d| d as i32) != old_decimals;
        let default_changed = spec.default != old_default;
        let not_null_changed = spec.not_null != current.not_null;

        let specs_changed = type_changed || precision_changed || decimals_changed;

        let mut plan = Vec::new();

        if specs_changed {
            let temp = self.namer.next(&spec.name);
            let type_sql = self.profile.column_type_sql(spec);

            // The temporary column starts nullable so existing rows can
            // be populated before the constraint is enforced.
            plan.push(format!(
                "ALTER TABLE {} ADD COLUMN {} {}",
                table, temp, type_sql
            ));

            let source = match self.profile.cast_rule(old_family, spec.family) {
                CastRule::ViaNumeric => format!("CAST({} AS NUMERIC)", spec.name),
                CastRule::ViaNumericToInteger => {
                    format!("CAST(CAST({} AS NUMERIC) AS INTEGER)", spec.name)
                }
                CastRule::Inline => format!("{}::{}", spec.name, type_sql),
                CastRule::Assign => spec.name.clone(),
            };
            plan.push(format!("UPDATE {} SET {} = {}", table, temp, source));

            plan.push(format!("ALTER TABLE {} DROP COLUMN {}", table, spec.name));
            plan.push(format!(
                "ALTER TABLE {} RENAME COLUMN {} TO {}",
                table, temp, spec.name
            ));
        }

        // A rebuild loses the default, so reapply it even when unchanged.
        if default_changed || specs_changed {
            if let Some(literal) = self.profile.default_literal(spec) {
                plan.push(format!(
                    "ALTER TABLE {} ALTER COLUMN {} SET DEFAULT {}",
                    table, spec.name, literal
                ));
            } else if !specs_changed {
                // A rebuilt column already starts without a default.
                plan.push(format!(
                    "ALTER TABLE {} ALTER COLUMN {} DROP DEFAULT",
                    table, spec.name
                ));
            }
        }

        // The rebuilt column was added nullable, so NOT NULL must be
        // re-established even when the flag itself did not change.
        if not_null_changed || (specs_changed && spec.not_null) {
            if spec.not_null {
                plan.push(format!(
                    "ALTER TABLE {} ALTER COLUMN {} SET NOT NULL",
                    table, spec.name
                ));
            } else {
                plan.push(format!(
                    "ALTER TABLE {} ALTER COLUMN {} DROP NOT NULL",
                    table, spec.name
                ));
            }
        }

        debug!(
            table,
            column = spec.name.as_str(),
            statements = plan.len(),
            rebuild = specs_changed,
            "planned alter column"
        );
        Ok(plan)
    }

    /// Extra statements needed after renaming `table` to `new_name`.
    ///
    /// The sequence backing the identity column must be renamed to match,
    /// and the dialect refuses to rename a sequence while a column
    /// default still references it: the default is dropped first and
    /// re-established against the new sequence name afterwards. The
    /// statements run against the new table name, after the rename itself.
    pub fn plan_rename_table(&self, table: &str, new_name: &str) -> Vec<String> {
        // Identity sequences are exclusively on the id column.
        let old_sequence = self.profile.sequence_name(table, "id");
        let new_sequence = self.profile.sequence_name(new_name, "id");

        vec![
            format!("ALTER TABLE {} ALTER COLUMN id DROP DEFAULT", new_name),
            format!(
                "ALTER SEQUENCE {} RENAME TO {}",
                old_sequence, new_sequence
            ),
            format!(
                "ALTER TABLE {} ALTER COLUMN id SET DEFAULT {}",
                new_name,
                self.profile.sequence_default(&new_sequence)
            ),
        ]
    }

    /// Statement resetting a table's identity sequence to `next_value`.
    pub fn reset_sequence_sql(&self, table: &str, next_value: i64) -> Vec<String> {
        vec![format!(
            "SELECT setval('{}', {}, false)",
            self.profile.sequence_name(table, "id"),
            next_value
        )]
    }

    /// Statement dropping a sequence by name.
    pub fn drop_sequence_sql(&self, sequence: &str) -> Vec<String> {
        vec![format!("DROP SEQUENCE {}", sequence)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::ColumnInfo;

    fn planner() -> MigrationPlanner {
        MigrationPlanner::new(DialectProfile::cockroachdb())
    }

    fn column(
        name: &str,
        family: TypeFamily,
        max_length: i32,
        scale: Option<i32>,
        not_null: bool,
        default: Option<&str>,
    ) -> ColumnInfo {
        ColumnInfo {
            name: name.to_string(),
            family,
            max_length,
            scale,
            not_null,
            has_default: default.is_some(),
            default_value: default.map(str::to_string),
            primary_key_identity: false,
            binary: Some(false),
            unique: None,
        }
    }

    fn spec(
        name: &str,
        family: TypeFamily,
        length: Option<u32>,
        decimals: Option<u32>,
        not_null: bool,
        default: Option<&str>,
    ) -> ColumnSpec {
        ColumnSpec {
            name: name.to_string(),
            family,
            length,
            decimals,
            not_null,
            default: default.map(str::to_string),
            sequence: false,
        }
    }

    fn map(columns: Vec<ColumnInfo>) -> ColumnMap {
        columns.into_iter().collect()
    }

    // Pull the temp column name out of an ADD COLUMN statement.
    fn temp_name(add_statement: &str) -> String {
        add_statement
            .split_whitespace()
            .nth(5)
            .expect("ADD COLUMN statement shape")
            .to_string()
    }

    #[test]
    fn test_decimals_change_rebuilds_column() {
        let planner = planner();
        let columns = map(vec![column(
            "amount",
            TypeFamily::Numeric,
            10,
            Some(2),
            true,
            Some("0"),
        )]);
        let desired = spec(
            "amount",
            TypeFamily::Numeric,
            Some(10),
            Some(4),
            true,
            Some("0"),
        );

        let plan = planner.plan_alter_column("t1", &columns, &desired).unwrap();

        assert_eq!(plan.len(), 6);
        let temp = temp_name(&plan[0]);
        assert_eq!(
            plan[0],
            format!("ALTER TABLE t1 ADD COLUMN {} NUMERIC(10,4)", temp)
        );
        // same family: plain assignment, no cast
        assert_eq!(plan[1], format!("UPDATE t1 SET {} = amount", temp));
        assert_eq!(plan[2], "ALTER TABLE t1 DROP COLUMN amount");
        assert_eq!(
            plan[3],
            format!("ALTER TABLE t1 RENAME COLUMN {} TO amount", temp)
        );
        // defaults and NOT NULL are reapplied after the rebuild, defaults first
        assert_eq!(plan[4], "ALTER TABLE t1 ALTER COLUMN amount SET DEFAULT 0");
        assert_eq!(plan[5], "ALTER TABLE t1 ALTER COLUMN amount SET NOT NULL");
    }

    #[test]
    fn test_nullability_and_default_change_in_place() {
        let planner = planner();
        let columns = map(vec![column(
            "name",
            TypeFamily::Varchar,
            50,
            None,
            false,
            None,
        )]);
        let desired = spec(
            "name",
            TypeFamily::Varchar,
            Some(50),
            None,
            true,
            Some("x"),
        );

        let plan = planner.plan_alter_column("t1", &columns, &desired).unwrap();

        assert_eq!(
            plan,
            vec![
                "ALTER TABLE t1 ALTER COLUMN name SET DEFAULT 'x'",
                "ALTER TABLE t1 ALTER COLUMN name SET NOT NULL",
            ]
        );
    }

    #[test]
    fn test_satisfied_spec_produces_empty_plan() {
        let planner = planner();
        let columns = map(vec![column(
            "name",
            TypeFamily::Varchar,
            50,
            None,
            true,
            Some("x"),
        )]);
        let desired = spec(
            "name",
            TypeFamily::Varchar,
            Some(50),
            None,
            true,
            Some("x"),
        );

        let plan = planner.plan_alter_column("t1", &columns, &desired).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_second_application_skips_rebuild() {
        let planner = planner();
        let desired = spec(
            "amount",
            TypeFamily::Numeric,
            Some(10),
            Some(4),
            true,
            Some("0"),
        );

        let before = map(vec![column(
            "amount",
            TypeFamily::Numeric,
            10,
            Some(2),
            true,
            Some("0"),
        )]);
        let first = planner.plan_alter_column("t1", &before, &desired).unwrap();
        assert!(first.iter().any(|s| s.contains("ADD COLUMN")));

        // descriptor as the reader would see it after the first plan ran
        let after = map(vec![column(
            "amount",
            TypeFamily::Numeric,
            10,
            Some(4),
            true,
            Some("0"),
        )]);
        let second = planner.plan_alter_column("t1", &after, &desired).unwrap();
        assert!(second.iter().all(|s| !s.contains("ADD COLUMN")));
        assert!(second.is_empty());
    }

    #[test]
    fn test_char_to_integer_composes_numeric_cast() {
        let planner = planner();
        let columns = map(vec![column(
            "grade",
            TypeFamily::Varchar,
            10,
            None,
            false,
            None,
        )]);
        let desired = spec("grade", TypeFamily::Integer, Some(10), None, false, None);

        let plan = planner.plan_alter_column("t1", &columns, &desired).unwrap();
        assert!(plan[1].ends_with("= CAST(CAST(grade AS NUMERIC) AS INTEGER)"));
    }

    #[test]
    fn test_text_to_numeric_uses_numeric_cast() {
        let planner = planner();
        let columns = map(vec![column(
            "score",
            TypeFamily::Text,
            -1,
            None,
            false,
            None,
        )]);
        let desired = spec(
            "score",
            TypeFamily::Numeric,
            Some(10),
            Some(2),
            false,
            None,
        );

        let plan = planner.plan_alter_column("t1", &columns, &desired).unwrap();
        assert!(plan[1].ends_with("= CAST(score AS NUMERIC)"));
    }

    #[test]
    fn test_other_family_change_uses_inline_cast() {
        let planner = planner();
        let columns = map(vec![column(
            "code",
            TypeFamily::Integer,
            9,
            None,
            false,
            None,
        )]);
        let desired = spec("code", TypeFamily::Varchar, Some(30), None, false, None);

        let plan = planner.plan_alter_column("t1", &columns, &desired).unwrap();
        assert!(plan[1].ends_with("= code::VARCHAR(30)"));
    }

    #[test]
    fn test_text_target_never_triggers_precision_rebuild() {
        let planner = planner();
        // lengths differ, but text is unbounded: no precision change
        let columns = map(vec![column(
            "notes",
            TypeFamily::Text,
            -1,
            None,
            false,
            None,
        )]);
        let desired = spec("notes", TypeFamily::Text, Some(255), None, false, None);

        let plan = planner.plan_alter_column("t1", &columns, &desired).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_dropping_default_without_rebuild() {
        let planner = planner();
        let columns = map(vec![column(
            "name",
            TypeFamily::Varchar,
            50,
            None,
            false,
            Some("x"),
        )]);
        let desired = spec("name", TypeFamily::Varchar, Some(50), None, false, None);

        let plan = planner.plan_alter_column("t1", &columns, &desired).unwrap();
        assert_eq!(plan, vec!["ALTER TABLE t1 ALTER COLUMN name DROP DEFAULT"]);
    }

    #[test]
    fn test_unknown_column_fails_fast() {
        let planner = planner();
        let columns = map(vec![]);
        let desired = spec("ghost", TypeFamily::Integer, Some(10), None, false, None);

        let err = planner
            .plan_alter_column("t1", &columns, &desired)
            .unwrap_err();
        assert!(matches!(err, DdlError::UnknownColumn { .. }));
    }

    #[test]
    fn test_temp_names_are_unique_per_attempt() {
        let planner = planner();
        let columns = map(vec![column(
            "amount",
            TypeFamily::Numeric,
            10,
            Some(2),
            false,
            None,
        )]);
        let desired = spec(
            "amount",
            TypeFamily::Numeric,
            Some(10),
            Some(4),
            false,
            None,
        );

        let first = planner.plan_alter_column("t1", &columns, &desired).unwrap();
        let second = planner.plan_alter_column("t1", &columns, &desired).unwrap();

        assert_ne!(temp_name(&first[0]), temp_name(&second[0]));
        assert!(temp_name(&first[0]).starts_with("amount__temp"));
    }

    #[test]
    fn test_rename_table_rebinds_identity_sequence() {
        let planner = planner();
        let plan = planner.plan_rename_table("t1", "t2");

        assert_eq!(
            plan,
            vec![
                "ALTER TABLE t2 ALTER COLUMN id DROP DEFAULT",
                "ALTER SEQUENCE t1_id_seq RENAME TO t2_id_seq",
                "ALTER TABLE t2 ALTER COLUMN id SET DEFAULT nextval('t2_id_seq')",
            ]
        );
    }

    #[test]
    fn test_sequence_maintenance_sql() {
        let planner = planner();
        assert_eq!(
            planner.reset_sequence_sql("t1", 42),
            vec!["SELECT setval('t1_id_seq', 42, false)"]
        );
        assert_eq!(
            planner.drop_sequence_sql("t1_id_seq"),
            vec!["DROP SEQUENCE t1_id_seq"]
        );
    }
}
