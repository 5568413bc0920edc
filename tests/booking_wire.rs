use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_postgres::error::SqlState;
use tokio_postgres::{Config, NoTls, SimpleQueryMessage, SimpleQueryRow};
use ulid::Ulid;

use clinicd::engine::Engine;
use clinicd::limits::MAX_PATIENT_LEN;
use clinicd::wire;

const PASSWORD: &str = "clinicd";

// ── Test infrastructure ──────────────────────────────────────

async fn start_test_server() -> (SocketAddr, Arc<Engine>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let dir = std::env::temp_dir().join(format!("clinicd_int_test_{}", Ulid::new()));
    std::fs::create_dir_all(&dir).unwrap();
    let engine = Arc::new(Engine::new(dir.join("clinic.wal")).unwrap());

    let served = engine.clone();
    tokio::spawn(async move {
        loop {
            let (socket, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => break,
            };
            let engine = served.clone();
            tokio::spawn(async move {
                let _ = wire::process_connection(socket, engine, PASSWORD.to_string(), None).await;
            });
        }
    });

    (addr, engine)
}

async fn connect(addr: SocketAddr) -> tokio_postgres::Client {
    let mut config = Config::new();
    config
        .host(addr.ip().to_string())
        .port(addr.port())
        .dbname("clinic")
        .user("frontdesk")
        .password(PASSWORD);

    let (client, connection) = config.connect(NoTls).await.unwrap();
    tokio::spawn(async move {
        let _ = connection.await;
    });
    client
}

async fn rows(client: &tokio_postgres::Client, sql: &str) -> Vec<SimpleQueryRow> {
    client
        .simple_query(sql)
        .await
        .unwrap()
        .into_iter()
        .filter_map(|m| match m {
            SimpleQueryMessage::Row(row) => Some(row),
            _ => None,
        })
        .collect()
}

async fn add_doctor(client: &tokio_postgres::Client, active: bool) -> Ulid {
    let id = Ulid::new();
    client
        .batch_execute(&format!(
            "INSERT INTO doctors (id, name, active) VALUES ('{id}', 'Dr. Test', {active})"
        ))
        .await
        .unwrap();
    id
}

fn book_sql(doctor: Ulid, start: &str, minutes: u32) -> String {
    format!(
        "INSERT INTO appointments (doctor_id, start_time, duration_minutes, patient) \
         VALUES ('{doctor}', '{start}', {minutes}, 'Pat')"
    )
}

// ── Tests ────────────────────────────────────────────────────

#[tokio::test]
async fn register_and_list_doctors() {
    let (addr, _engine) = start_test_server().await;
    let client = connect(addr).await;

    let id = add_doctor(&client, true).await;
    let listed = rows(&client, "SELECT * FROM doctors").await;

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].get("id"), Some(id.to_string().as_str()));
    assert_eq!(listed[0].get("name"), Some("Dr. Test"));
    assert_eq!(listed[0].get("active"), Some("t"));
}

#[tokio::test]
async fn booking_returns_normalized_row() {
    let (addr, _engine) = start_test_server().await;
    let client = connect(addr).await;
    let doctor = add_doctor(&client, true).await;

    let returned = rows(
        &client,
        &format!("{} RETURNING *", book_sql(doctor, "2026-01-05T12:00:00+02:00", 30)),
    )
    .await;

    assert_eq!(returned.len(), 1);
    let row = &returned[0];
    assert!(Ulid::from_string(row.get("id").unwrap()).is_ok());
    assert_eq!(row.get("doctor_id"), Some(doctor.to_string().as_str()));
    assert_eq!(row.get("start_time"), Some("2026-01-05T10:00:00Z"));
    assert_eq!(row.get("end_time"), Some("2026-01-05T10:30:00Z"));
    assert_eq!(row.get("duration_minutes"), Some("30"));
    assert_eq!(row.get("patient"), Some("Pat"));
    assert_eq!(row.get("notes"), None);
}

#[tokio::test]
async fn overlap_is_exclusion_violation() {
    let (addr, _engine) = start_test_server().await;
    let client = connect(addr).await;
    let doctor = add_doctor(&client, true).await;

    client
        .batch_execute(&book_sql(doctor, "2026-01-05 10:00:00", 30))
        .await
        .unwrap();

    let err = client
        .batch_execute(&book_sql(doctor, "2026-01-05 10:15:00", 30))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(&SqlState::EXCLUSION_VIOLATION));

    // Back-to-back is fine.
    client
        .batch_execute(&book_sql(doctor, "2026-01-05 10:30:00", 30))
        .await
        .unwrap();

    let booked = rows(
        &client,
        &format!("SELECT * FROM appointments WHERE doctor_id = '{doctor}'"),
    )
    .await;
    let starts: Vec<_> = booked.iter().map(|r| r.get("start_time").unwrap().to_string()).collect();
    assert_eq!(starts, ["2026-01-05T10:00:00Z", "2026-01-05T10:30:00Z"]);
}

#[tokio::test]
async fn bad_doctor_is_foreign_key_violation() {
    let (addr, _engine) = start_test_server().await;
    let client = connect(addr).await;

    let unknown = Ulid::new();
    let err = client
        .batch_execute(&book_sql(unknown, "2026-01-05 10:00:00", 30))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(&SqlState::FOREIGN_KEY_VIOLATION));

    let inactive = add_doctor(&client, false).await;
    let err = client
        .batch_execute(&book_sql(inactive, "2026-01-05 10:00:00", 30))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(&SqlState::FOREIGN_KEY_VIOLATION));
}

#[tokio::test]
async fn deactivation_blocks_new_bookings() {
    let (addr, _engine) = start_test_server().await;
    let client = connect(addr).await;
    let doctor = add_doctor(&client, true).await;

    client
        .batch_execute(&format!("UPDATE doctors SET active = false WHERE id = '{doctor}'"))
        .await
        .unwrap();
    let err = client
        .batch_execute(&book_sql(doctor, "2026-01-05 10:00:00", 30))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(&SqlState::FOREIGN_KEY_VIOLATION));

    let err = client
        .batch_execute(&format!("UPDATE doctors SET active = true WHERE id = '{}'", Ulid::new()))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(&SqlState::NO_DATA_FOUND));
}

#[tokio::test]
async fn invalid_input_errors() {
    let (addr, _engine) = start_test_server().await;
    let client = connect(addr).await;
    let doctor = add_doctor(&client, true).await;

    let err = client
        .batch_execute(&book_sql(doctor, "2026-01-05 10:00:00", 0))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(&SqlState::INVALID_PARAMETER_VALUE));

    let err = client
        .batch_execute(&book_sql(doctor, "half past ten", 30))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(&SqlState::INVALID_DATETIME_FORMAT));

    let err = client
        .batch_execute(&format!(
            "INSERT INTO appointments (doctor_id, start_time, duration_minutes) \
             VALUES ('{doctor}', '2026-01-05 10:00', -30)"
        ))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(&SqlState::INVALID_PARAMETER_VALUE));

    let err = client
        .batch_execute(&format!(
            "INSERT INTO appointments (doctor_id, start_time, duration_minutes, patient) \
             VALUES ('{doctor}', '2026-01-05 10:00', 30, '{}')",
            "p".repeat(MAX_PATIENT_LEN + 1)
        ))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(&SqlState::INVALID_PARAMETER_VALUE));

    let err = client.batch_execute("SELECT * FROM patients").await.unwrap_err();
    assert_eq!(err.code(), Some(&SqlState::UNDEFINED_TABLE));
}

#[tokio::test]
async fn overlap_probe_has_no_side_effects() {
    let (addr, engine) = start_test_server().await;
    let client = connect(addr).await;
    let doctor = add_doctor(&client, true).await;
    client
        .batch_execute(&book_sql(doctor, "2026-01-05 10:00:00", 30))
        .await
        .unwrap();

    let probe = |start: &str| {
        format!(
            "SELECT * FROM overlaps WHERE doctor_id = '{doctor}' AND start_time = '{start}' AND duration_minutes = 30"
        )
    };
    let hit = rows(&client, &probe("2026-01-05 10:15:00")).await;
    assert_eq!(hit[0].get("overlap"), Some("t"));
    let miss = rows(&client, &probe("2026-01-05 10:30:00")).await;
    assert_eq!(miss[0].get("overlap"), Some("f"));

    assert_eq!(engine.appointments_for_doctor(doctor).await.len(), 1);
}

#[tokio::test]
async fn extended_protocol_booking() {
    let (addr, _engine) = start_test_server().await;
    let client = connect(addr).await;
    let doctor = add_doctor(&client, true).await;

    let inserted = client
        .execute(
            "INSERT INTO appointments (doctor_id, start_time, duration_minutes) VALUES ($1, $2, $3)",
            &[&doctor.to_string(), &"2026-01-05 09:00", &"45"],
        )
        .await
        .unwrap();
    assert_eq!(inserted, 1);

    let found = client
        .query(
            "SELECT * FROM appointments WHERE doctor_id = $1",
            &[&doctor.to_string()],
        )
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    let start: String = found[0].get("start_time");
    let end: String = found[0].get("end_time");
    assert_eq!(start, "2026-01-05T09:00:00Z");
    assert_eq!(end, "2026-01-05T09:45:00Z");
}

#[tokio::test]
async fn extended_protocol_epoch_ms_and_dollar_text() {
    let (addr, engine) = start_test_server().await;
    let client = connect(addr).await;
    let doctor = add_doctor(&client, true).await;

    // 1767607200000 ms is 2026-01-05T10:00:00Z.
    client
        .execute(
            "INSERT INTO appointments (doctor_id, start_time, duration_minutes, notes) VALUES ($1, $2, $3, $4)",
            &[&doctor.to_string(), &"1767607200000", &"30", &"copay $1"],
        )
        .await
        .unwrap();

    let booked = engine.appointments_for_doctor(doctor).await;
    assert_eq!(booked.len(), 1);
    assert_eq!(booked[0].notes.as_deref(), Some("copay $1"));
    assert_eq!(booked[0].start_time.to_rfc3339(), "2026-01-05T10:00:00+00:00");

    let err = client
        .execute(
            "INSERT INTO appointments (doctor_id, start_time, duration_minutes) VALUES ($1, $2, $3)",
            &[&doctor.to_string(), &"2026-01-05 11:00", &"-15"],
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(&SqlState::INVALID_PARAMETER_VALUE));
}

#[tokio::test]
async fn concurrent_clients_same_slot_admit_one() {
    let (addr, engine) = start_test_server().await;
    let setup = connect(addr).await;
    let doctor = add_doctor(&setup, true).await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        handles.push(tokio::spawn(async move {
            let client = connect(addr).await;
            client
                .batch_execute(&book_sql(doctor, "2026-01-05 14:00:00", 60))
                .await
                .map_err(|e| e.code().cloned())
        }));
    }

    let mut ok = 0;
    for h in handles {
        match h.await.unwrap() {
            Ok(()) => ok += 1,
            Err(code) => assert_eq!(code, Some(SqlState::EXCLUSION_VIOLATION)),
        }
    }
    assert_eq!(ok, 1);
    assert_eq!(engine.appointments_for_doctor(doctor).await.len(), 1);
}
