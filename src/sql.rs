use sqlparser::ast::{
    self, AssignmentTarget, Expr, ObjectNamePart, SetExpr, Statement, TableFactor, TableObject,
    Value, ValueWithSpan,
};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;
use ulid::Ulid;

use crate::model::*;
use crate::time::{self, TimeError, Timestamp};

const DOCTOR_COLUMNS: &[&str] = &["id", "name", "active"];
const APPOINTMENT_COLUMNS: &[&str] = &[
    "id",
    "doctor_id",
    "start_time",
    "duration_minutes",
    "patient",
    "notes",
];

/// Parsed command from SQL input.
#[derive(Debug, PartialEq)]
pub enum Command {
    InsertDoctor {
        id: Ulid,
        name: Option<String>,
        active: bool,
    },
    UpdateDoctor {
        id: Ulid,
        changes: DoctorChanges,
    },
    InsertAppointment {
        new: NewAppointment,
        /// `RETURNING` was present: answer with the stored row.
        returning: bool,
    },
    SelectDoctors,
    SelectAppointments {
        doctor_id: Option<Ulid>,
    },
    SelectOverlap {
        doctor_id: Ulid,
        start_time: Timestamp,
        duration_minutes: u32,
    },
}

pub fn parse_sql(sql: &str) -> Result<Command, SqlError> {
    let dialect = PostgreSqlDialect {};
    let stmts = Parser::parse_sql(&dialect, sql).map_err(|e| SqlError::Parse(e.to_string()))?;
    let Some(stmt) = stmts.first() else {
        return Err(SqlError::Empty);
    };
    if stmts.len() > 1 {
        return Err(SqlError::Unsupported("multiple statements".into()));
    }

    match stmt {
        Statement::Insert(insert) => parse_insert(insert),
        Statement::Update {
            table,
            assignments,
            selection,
            ..
        } => parse_update(&table.relation, assignments, selection),
        Statement::Query(query) => parse_select(query),
        other => Err(SqlError::Unsupported(format!("{other}"))),
    }
}

// ── INSERT ────────────────────────────────────────────────────

/// One VALUES row addressed by column name.
struct Row<'a> {
    columns: Vec<String>,
    values: &'a [Expr],
}

impl<'a> Row<'a> {
    /// Explicit column lists must match the row exactly; without one, values
    /// fill `defaults` left to right and trailing columns may be omitted.
    fn new(
        table: &'static str,
        defaults: &[&str],
        explicit: &[ast::Ident],
        values: &'a [Expr],
    ) -> Result<Self, SqlError> {
        let columns: Vec<String> = if explicit.is_empty() {
            if values.len() > defaults.len() {
                return Err(SqlError::WrongArity(table, defaults.len(), values.len()));
            }
            defaults.iter().map(|c| c.to_string()).collect()
        } else {
            if explicit.len() != values.len() {
                return Err(SqlError::WrongArity(table, explicit.len(), values.len()));
            }
            explicit.iter().map(|c| c.value.to_lowercase()).collect()
        };
        if let Some(unknown) = columns.iter().find(|c| !defaults.contains(&c.as_str())) {
            return Err(SqlError::UnknownColumn {
                table,
                column: unknown.clone(),
            });
        }
        Ok(Self { columns, values })
    }

    fn get(&self, column: &str) -> Option<&'a Expr> {
        let pos = self.columns.iter().position(|c| c == column)?;
        self.values.get(pos)
    }

    fn require(&self, column: &'static str) -> Result<&'a Expr, SqlError> {
        self.get(column).ok_or(SqlError::MissingValue(column))
    }
}

fn parse_insert(insert: &ast::Insert) -> Result<Command, SqlError> {
    let table = insert_table_name(insert)?;
    let values = extract_insert_values(insert)?;

    match table.as_str() {
        "doctors" => {
            let row = Row::new("doctors", DOCTOR_COLUMNS, &insert.columns, values)?;
            Ok(Command::InsertDoctor {
                id: parse_ulid_expr(row.require("id")?)?,
                name: row.get("name").map(parse_opt_string).transpose()?.flatten(),
                active: row.get("active").map(parse_bool).transpose()?.unwrap_or(true),
            })
        }
        "appointments" => {
            let row = Row::new("appointments", APPOINTMENT_COLUMNS, &insert.columns, values)?;
            let mut new = NewAppointment::new(
                parse_ulid_expr(row.require("doctor_id")?)?,
                parse_timestamp_expr(row.require("start_time")?)?,
                parse_minutes(row.require("duration_minutes")?)?,
            );
            new.id = row.get("id").map(parse_ulid_or_null).transpose()?.flatten();
            new.patient = row.get("patient").map(parse_opt_string).transpose()?.flatten();
            new.notes = row.get("notes").map(parse_opt_string).transpose()?.flatten();
            Ok(Command::InsertAppointment {
                new,
                returning: insert.returning.is_some(),
            })
        }
        _ => Err(SqlError::UnknownTable(table)),
    }
}

// ── UPDATE ────────────────────────────────────────────────────

fn parse_update(
    relation: &TableFactor,
    assignments: &[ast::Assignment],
    selection: &Option<Expr>,
) -> Result<Command, SqlError> {
    let table = table_factor_name(relation)?;
    match table.as_str() {
        "doctors" => {}
        "appointments" => return Err(SqlError::Unsupported("appointments are immutable".into())),
        _ => return Err(SqlError::UnknownTable(table)),
    }

    let mut changes = DoctorChanges::default();
    for assignment in assignments {
        let column = match &assignment.target {
            AssignmentTarget::ColumnName(name) => object_name_last(name),
            AssignmentTarget::Tuple(_) => None,
        }
        .ok_or_else(|| SqlError::Unsupported("tuple assignment".into()))?;
        match column.as_str() {
            "name" => changes.name = Some(parse_opt_string(&assignment.value)?),
            "active" => changes.active = Some(parse_bool(&assignment.value)?),
            _ => {
                return Err(SqlError::UnknownColumn {
                    table: "doctors",
                    column,
                });
            }
        }
    }

    let filters = collect_filters(selection.as_ref())?;
    let id = parse_ulid_expr(find_filter(&filters, "id").ok_or(SqlError::MissingValue("id"))?)?;
    Ok(Command::UpdateDoctor { id, changes })
}

// ── SELECT ────────────────────────────────────────────────────

fn parse_select(query: &ast::Query) -> Result<Command, SqlError> {
    let select = match query.body.as_ref() {
        SetExpr::Select(s) => s,
        _ => return Err(SqlError::Unsupported("non-SELECT query".into())),
    };

    let Some(from) = select.from.first() else {
        return Err(SqlError::Parse("SELECT without FROM".into()));
    };
    let table = table_factor_name(&from.relation)?;
    let filters = collect_filters(select.selection.as_ref())?;

    match table.as_str() {
        "doctors" => Ok(Command::SelectDoctors),
        "appointments" => Ok(Command::SelectAppointments {
            doctor_id: find_filter(&filters, "doctor_id")
                .map(parse_ulid_expr)
                .transpose()?,
        }),
        "overlaps" => {
            let required = |col: &'static str| find_filter(&filters, col).ok_or(SqlError::MissingValue(col));
            Ok(Command::SelectOverlap {
                doctor_id: parse_ulid_expr(required("doctor_id")?)?,
                start_time: parse_timestamp_expr(required("start_time")?)?,
                duration_minutes: parse_minutes(required("duration_minutes")?)?,
            })
        }
        _ => Err(SqlError::UnknownTable(table)),
    }
}

/// Flatten `a = x AND b = y ...` into `(column, value)` pairs.
fn collect_filters(selection: Option<&Expr>) -> Result<Vec<(String, &Expr)>, SqlError> {
    fn walk<'a>(expr: &'a Expr, out: &mut Vec<(String, &'a Expr)>) -> Result<(), SqlError> {
        match expr {
            Expr::Nested(inner) => walk(inner, out),
            Expr::BinaryOp {
                left,
                op: ast::BinaryOperator::And,
                right,
            } => {
                walk(left, out)?;
                walk(right, out)
            }
            Expr::BinaryOp {
                left,
                op: ast::BinaryOperator::Eq,
                right,
            } => {
                let col = expr_column_name(left)
                    .ok_or_else(|| SqlError::Unsupported(format!("filter on {left}")))?;
                out.push((col, right));
                Ok(())
            }
            other => Err(SqlError::Unsupported(format!("filter {other}"))),
        }
    }

    let mut out = Vec::new();
    if let Some(expr) = selection {
        walk(expr, &mut out)?;
    }
    Ok(out)
}

fn find_filter<'a>(filters: &[(String, &'a Expr)], column: &str) -> Option<&'a Expr> {
    filters.iter().find(|(c, _)| c == column).map(|(_, e)| *e)
}

// ── Helpers ───────────────────────────────────────────────────

fn object_name_last(name: &ast::ObjectName) -> Option<String> {
    name.0.last().and_then(|part| match part {
        ObjectNamePart::Identifier(ident) => Some(ident.value.to_lowercase()),
        _ => None,
    })
}

fn insert_table_name(insert: &ast::Insert) -> Result<String, SqlError> {
    match &insert.table {
        TableObject::TableName(name) => {
            object_name_last(name).ok_or_else(|| SqlError::Parse("empty table name".into()))
        }
        _ => Err(SqlError::Parse("unsupported table object in INSERT".into())),
    }
}

fn table_factor_name(tf: &TableFactor) -> Result<String, SqlError> {
    match tf {
        TableFactor::Table { name, .. } => {
            object_name_last(name).ok_or_else(|| SqlError::Parse("empty table name".into()))
        }
        _ => Err(SqlError::Parse("complex table expression".into())),
    }
}

fn extract_insert_values(insert: &ast::Insert) -> Result<&[Expr], SqlError> {
    let body = insert
        .source
        .as_ref()
        .ok_or(SqlError::Parse("no VALUES".into()))?;
    match body.body.as_ref() {
        SetExpr::Values(values) => match values.rows.as_slice() {
            [] => Err(SqlError::Parse("empty VALUES".into())),
            [row] => Ok(row),
            _ => Err(SqlError::Unsupported("multi-row INSERT".into())),
        },
        _ => Err(SqlError::Parse("expected VALUES".into())),
    }
}

fn expr_column_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Identifier(ident) => Some(ident.value.to_lowercase()),
        Expr::CompoundIdentifier(parts) => parts.last().map(|i| i.value.to_lowercase()),
        _ => None,
    }
}

fn extract_value(expr: &Expr) -> Option<&Value> {
    match expr {
        Expr::Value(ValueWithSpan { value, .. }) => Some(value),
        _ => None,
    }
}

fn parse_ulid_expr(expr: &Expr) -> Result<Ulid, SqlError> {
    match extract_value(expr) {
        Some(Value::SingleQuotedString(s)) => {
            Ulid::from_string(s).map_err(|e| SqlError::Parse(format!("bad ULID {s:?}: {e}")))
        }
        Some(value) => Err(SqlError::Parse(format!("expected ULID string, got {value}"))),
        None => Err(SqlError::Parse(format!("expected value, got {expr}"))),
    }
}

fn parse_ulid_or_null(expr: &Expr) -> Result<Option<Ulid>, SqlError> {
    match extract_value(expr) {
        Some(Value::Null) => Ok(None),
        _ => parse_ulid_expr(expr).map(Some),
    }
}

fn parse_i64_expr(expr: &Expr) -> Result<i64, SqlError> {
    if let Expr::UnaryOp {
        op: ast::UnaryOperator::Minus,
        expr,
    } = expr
    {
        return Ok(-parse_i64_expr(expr)?);
    }
    match extract_value(expr) {
        Some(Value::Number(s, _) | Value::SingleQuotedString(s)) => s
            .trim()
            .parse()
            .map_err(|e| SqlError::Parse(format!("bad integer {s:?}: {e}"))),
        Some(value) => Err(SqlError::Parse(format!("expected number, got {value}"))),
        None => Err(SqlError::Parse(format!("expected value, got {expr}"))),
    }
}

/// A duration in minutes. Zero passes through so the engine rejects it along
/// with the other invalid appointments.
fn parse_minutes(expr: &Expr) -> Result<u32, SqlError> {
    let v = parse_i64_expr(expr)?;
    u32::try_from(v).map_err(|_| SqlError::OutOfRange("duration_minutes", v))
}

/// A quoted timestamp (offset optional), or epoch milliseconds as a bare
/// integer or an all-digit string (how bound parameters arrive).
fn parse_timestamp_expr(expr: &Expr) -> Result<Timestamp, SqlError> {
    match extract_value(expr) {
        Some(Value::SingleQuotedString(s)) if !is_epoch_ms(s) => Ok(time::parse_timestamp(s)?),
        _ => Ok(Timestamp::from_epoch_ms(parse_i64_expr(expr)?)?),
    }
}

fn is_epoch_ms(s: &str) -> bool {
    let digits = s.trim();
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn parse_opt_string(expr: &Expr) -> Result<Option<String>, SqlError> {
    match extract_value(expr) {
        Some(Value::Null) => Ok(None),
        Some(Value::SingleQuotedString(s)) => Ok(Some(s.clone())),
        Some(value) => Err(SqlError::Parse(format!("expected string or NULL, got {value}"))),
        None => Err(SqlError::Parse(format!("expected value, got {expr}"))),
    }
}

fn parse_bool(expr: &Expr) -> Result<bool, SqlError> {
    match extract_value(expr) {
        Some(Value::Boolean(b)) => Ok(*b),
        Some(Value::SingleQuotedString(s)) => match s.to_lowercase().as_str() {
            "true" | "t" | "1" => Ok(true),
            "false" | "f" | "0" => Ok(false),
            _ => Err(SqlError::Parse(format!("bad bool: {s}"))),
        },
        Some(Value::Number(n, _)) => Ok(n != "0"),
        Some(value) => Err(SqlError::Parse(format!("expected bool, got {value}"))),
        None => Err(SqlError::Parse(format!("expected value, got {expr}"))),
    }
}

// ── Errors ────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum SqlError {
    #[error("parse error: {0}")]
    Parse(String),
    #[error("empty query")]
    Empty,
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error("unknown table: {0}")]
    UnknownTable(String),
    #[error("{table}: unknown column {column}")]
    UnknownColumn { table: &'static str, column: String },
    #[error("{0}: expected {1} values, got {2}")]
    WrongArity(&'static str, usize, usize),
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("{0} out of range: {1}")]
    OutOfRange(&'static str, i64),
    #[error(transparent)]
    Time(#[from] TimeError),
}

impl SqlError {
    /// Postgres SQLSTATE reported on the wire.
    pub fn sqlstate(&self) -> &'static str {
        match self {
            SqlError::Time(_) => "22007", // invalid_datetime_format
            SqlError::OutOfRange(..) => "22023", // invalid_parameter_value
            SqlError::UnknownTable(_) => "42P01", // undefined_table
            SqlError::UnknownColumn { .. } => "42703", // undefined_column
            _ => "42601", // syntax_error
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate, TimeZone, Utc};

    const D1: &str = "01ARZ3NDEKTSV4RRFFQ69G5FAV";
    const A1: &str = "01BX5ZZKBKACTAV9WEVGEMMVRZ";

    fn ulid(s: &str) -> Ulid {
        Ulid::from_string(s).unwrap()
    }

    fn expect_appointment(sql: &str) -> (NewAppointment, bool) {
        match parse_sql(sql).unwrap() {
            Command::InsertAppointment { new, returning } => (new, returning),
            other => panic!("expected InsertAppointment, got {other:?}"),
        }
    }

    #[test]
    fn parse_insert_doctor() {
        let sql = format!("INSERT INTO doctors (id, name, active) VALUES ('{D1}', 'Dr. Okafor', false)");
        assert_eq!(
            parse_sql(&sql).unwrap(),
            Command::InsertDoctor {
                id: ulid(D1),
                name: Some("Dr. Okafor".into()),
                active: false
            }
        );
    }

    #[test]
    fn parse_insert_doctor_defaults_active() {
        let sql = format!("INSERT INTO doctors (id) VALUES ('{D1}')");
        assert_eq!(
            parse_sql(&sql).unwrap(),
            Command::InsertDoctor {
                id: ulid(D1),
                name: None,
                active: true
            }
        );
    }

    #[test]
    fn parse_insert_doctor_positional_with_null_name() {
        let sql = format!("INSERT INTO doctors VALUES ('{D1}', NULL, 't')");
        assert!(matches!(
            parse_sql(&sql).unwrap(),
            Command::InsertDoctor { name: None, active: true, .. }
        ));
    }

    #[test]
    fn parse_insert_appointment_named_columns() {
        let sql = format!(
            "INSERT INTO appointments (id, doctor_id, start_time, duration_minutes, patient, notes) \
             VALUES ('{A1}', '{D1}', '2026-01-05 10:00:00', 30, 'Ana', 'follow-up')"
        );
        let (new, returning) = expect_appointment(&sql);
        let naive = NaiveDate::from_ymd_opt(2026, 1, 5)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        assert_eq!(
            new,
            NewAppointment::new(ulid(D1), naive, 30)
                .with_id(ulid(A1))
                .with_patient("Ana")
                .with_notes("follow-up")
        );
        assert!(!returning);
    }

    #[test]
    fn parse_insert_appointment_generated_id_and_returning() {
        let sql = format!(
            "INSERT INTO appointments (doctor_id, start_time, duration_minutes) \
             VALUES ('{D1}', '2026-01-05T10:00:00+02:00', 45) RETURNING *"
        );
        let (new, returning) = expect_appointment(&sql);
        assert_eq!(new.id, None);
        assert_eq!(new.duration_minutes, 45);
        let aware = FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 1, 5, 10, 0, 0)
            .unwrap();
        assert_eq!(new.start_time, Timestamp::Aware(aware));
        assert!(returning);
    }

    #[test]
    fn parse_insert_appointment_null_id_and_epoch_start() {
        let sql = format!("INSERT INTO appointments VALUES (NULL, '{D1}', 1767607200000, 30)");
        let (new, _) = expect_appointment(&sql);
        assert_eq!(new.id, None);
        assert_eq!(time::to_ms(new.start_time.to_utc()), 1_767_607_200_000);
        assert_eq!(new.patient, None);
    }

    #[test]
    fn parse_insert_appointment_missing_duration() {
        let sql = format!("INSERT INTO appointments (doctor_id, start_time) VALUES ('{D1}', '2026-01-05 10:00')");
        assert!(matches!(parse_sql(&sql), Err(SqlError::MissingValue("duration_minutes"))));
    }

    #[test]
    fn parse_insert_appointment_bad_timestamp() {
        let sql = format!("INSERT INTO appointments (doctor_id, start_time, duration_minutes) VALUES ('{D1}', 'tomorrow', 30)");
        let err = parse_sql(&sql).unwrap_err();
        assert!(matches!(err, SqlError::Time(_)));
        assert_eq!(err.sqlstate(), "22007");
    }

    #[test]
    fn parse_insert_appointment_negative_duration() {
        let sql = format!(
            "INSERT INTO appointments (doctor_id, start_time, duration_minutes) VALUES ('{D1}', '2026-01-05 10:00', -30)"
        );
        let err = parse_sql(&sql).unwrap_err();
        assert!(matches!(err, SqlError::OutOfRange("duration_minutes", -30)));
        assert_eq!(err.sqlstate(), "22023");

        let sql = format!(
            "SELECT * FROM overlaps WHERE doctor_id = '{D1}' AND start_time = '2026-01-05 10:00' AND duration_minutes = 99999999999"
        );
        assert_eq!(parse_sql(&sql).unwrap_err().sqlstate(), "22023");
    }

    #[test]
    fn parse_quoted_epoch_ms_start() {
        // 2026-01-05T10:00:00Z, quoted the way a bound parameter arrives.
        let sql = format!(
            "INSERT INTO appointments (doctor_id, start_time, duration_minutes) VALUES ('{D1}', '1767607200000', '30')"
        );
        let (new, _) = expect_appointment(&sql);
        assert_eq!(
            new.start_time.to_utc(),
            Utc.with_ymd_and_hms(2026, 1, 5, 10, 0, 0).unwrap()
        );
        assert_eq!(new.duration_minutes, 30);
    }

    #[test]
    fn parse_insert_unknown_column() {
        let sql = format!("INSERT INTO doctors (id, specialty) VALUES ('{D1}', 'cardiology')");
        assert!(matches!(
            parse_sql(&sql),
            Err(SqlError::UnknownColumn { table: "doctors", .. })
        ));
    }

    #[test]
    fn parse_insert_column_value_mismatch() {
        let sql = format!("INSERT INTO doctors (id, name) VALUES ('{D1}')");
        assert!(matches!(parse_sql(&sql), Err(SqlError::WrongArity("doctors", 2, 1))));
    }

    #[test]
    fn parse_multi_row_insert_rejected() {
        let sql = format!("INSERT INTO doctors (id) VALUES ('{D1}'), ('{A1}')");
        assert!(matches!(parse_sql(&sql), Err(SqlError::Unsupported(_))));
    }

    #[test]
    fn parse_update_doctor() {
        let sql = format!("UPDATE doctors SET active = false, name = 'Dr. O' WHERE id = '{D1}'");
        assert_eq!(
            parse_sql(&sql).unwrap(),
            Command::UpdateDoctor {
                id: ulid(D1),
                changes: DoctorChanges {
                    name: Some(Some("Dr. O".into())),
                    active: Some(false)
                }
            }
        );
    }

    #[test]
    fn parse_update_clears_name() {
        let sql = format!("UPDATE doctors SET name = NULL WHERE id = '{D1}'");
        match parse_sql(&sql).unwrap() {
            Command::UpdateDoctor { changes, .. } => {
                assert_eq!(changes.name, Some(None));
                assert_eq!(changes.active, None);
            }
            other => panic!("expected UpdateDoctor, got {other:?}"),
        }
    }

    #[test]
    fn parse_update_requires_id() {
        assert!(matches!(
            parse_sql("UPDATE doctors SET active = true"),
            Err(SqlError::MissingValue("id"))
        ));
    }

    #[test]
    fn parse_update_appointments_rejected() {
        let sql = format!("UPDATE appointments SET duration_minutes = 60 WHERE id = '{A1}'");
        assert!(matches!(parse_sql(&sql), Err(SqlError::Unsupported(_))));
    }

    #[test]
    fn parse_selects() {
        assert_eq!(parse_sql("SELECT * FROM doctors").unwrap(), Command::SelectDoctors);
        assert_eq!(
            parse_sql("SELECT * FROM appointments").unwrap(),
            Command::SelectAppointments { doctor_id: None }
        );
        assert_eq!(
            parse_sql(&format!("SELECT * FROM appointments WHERE doctor_id = '{D1}'")).unwrap(),
            Command::SelectAppointments {
                doctor_id: Some(ulid(D1))
            }
        );
    }

    #[test]
    fn parse_select_overlap() {
        let sql = format!(
            "SELECT * FROM overlaps WHERE doctor_id = '{D1}' AND start_time = '2026-01-05 10:15' AND duration_minutes = 30"
        );
        match parse_sql(&sql).unwrap() {
            Command::SelectOverlap {
                doctor_id,
                start_time,
                duration_minutes,
            } => {
                assert_eq!(doctor_id, ulid(D1));
                assert!(matches!(start_time, Timestamp::Naive(_)));
                assert_eq!(duration_minutes, 30);
            }
            other => panic!("expected SelectOverlap, got {other:?}"),
        }
    }

    #[test]
    fn parse_select_overlap_missing_filter() {
        let sql = format!("SELECT * FROM overlaps WHERE doctor_id = '{D1}'");
        assert!(matches!(parse_sql(&sql), Err(SqlError::MissingValue("start_time"))));
    }

    #[test]
    fn parse_or_filter_unsupported() {
        let sql = format!("SELECT * FROM appointments WHERE doctor_id = '{D1}' OR doctor_id = '{A1}'");
        assert!(matches!(parse_sql(&sql), Err(SqlError::Unsupported(_))));
    }

    #[test]
    fn parse_unknown_table_errors() {
        let err = parse_sql("SELECT * FROM patients").unwrap_err();
        assert!(matches!(err, SqlError::UnknownTable(_)));
        assert_eq!(err.sqlstate(), "42P01");
    }

    #[test]
    fn parse_empty_errors() {
        assert!(matches!(parse_sql(""), Err(SqlError::Empty)));
    }

    #[test]
    fn parse_garbage_is_syntax_error() {
        let err = parse_sql("BOOK ME IN").unwrap_err();
        assert_eq!(err.sqlstate(), "42601");
    }
}
