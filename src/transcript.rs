use crate::model::{Appointment, Date};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Append-only JSONL log of what happened during one session.
/// Passwords are never written.
pub struct Transcript {
    path: PathBuf,
    session_id: String,
    data_file: PathBuf,
    file: Option<File>,
}

#[derive(Serialize)]
struct Event<'a> {
    ts: DateTime<Utc>,
    session_id: &'a str,
    data_file: &'a Path,
    #[serde(rename = "type")]
    event_type: &'a str,
    #[serde(flatten)]
    data: serde_json::Value,
}

impl Transcript {
    pub fn new(path: &Path, session_id: &str, data_file: &Path) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            session_id: session_id.to_string(),
            data_file: data_file.to_path_buf(),
            file: Some(file),
        })
    }

    /// A transcript that records nothing
    pub fn disabled(session_id: &str, data_file: &Path) -> Self {
        Self {
            path: PathBuf::new(),
            session_id: session_id.to_string(),
            data_file: data_file.to_path_buf(),
            file: None,
        }
    }

    /// Where events are written, or `None` when disabled.
    pub fn path(&self) -> Option<&Path> {
        self.file.as_ref().map(|_| self.path.as_path())
    }

    pub fn log(&mut self, event_type: &str, data: serde_json::Value) -> Result<()> {
        let Some(file) = self.file.as_mut() else {
            return Ok(());
        };
        let event = Event {
            ts: Utc::now(),
            session_id: &self.session_id,
            data_file: &self.data_file,
            event_type,
            data,
        };
        let line = serde_json::to_string(&event)?;
        writeln!(file, "{}", line)?;
        file.flush()?;
        Ok(())
    }

    pub fn session_start(&mut self, seeded: bool) -> Result<()> {
        self.log("session_start", serde_json::json!({ "seeded": seeded }))
    }

    pub fn session_end(&mut self) -> Result<()> {
        self.log("session_end", serde_json::json!({}))
    }

    pub fn login(&mut self, user: &str, role: &str) -> Result<()> {
        self.log(
            "login",
            serde_json::json!({ "user": user, "role": role }),
        )
    }

    pub fn login_failed(&mut self, user: &str, reason: &str) -> Result<()> {
        self.log(
            "login_failed",
            serde_json::json!({ "user": user, "reason": reason }),
        )
    }

    pub fn register(&mut self, user: &str) -> Result<()> {
        self.log("register", serde_json::json!({ "user": user }))
    }

    pub fn booked(&mut self, appt: &Appointment) -> Result<()> {
        self.log("appointment_booked", appointment_json(appt))
    }

    pub fn cancelled(&mut self, appt: &Appointment) -> Result<()> {
        self.log("appointment_cancelled", appointment_json(appt))
    }

    pub fn rescheduled(&mut self, appt: &Appointment, from: &Date) -> Result<()> {
        let mut data = appointment_json(appt);
        data["from"] = serde_json::json!(from.to_string());
        self.log("appointment_rescheduled", data)
    }

    pub fn reassigned(&mut self, appt: &Appointment) -> Result<()> {
        self.log("appointment_reassigned", appointment_json(appt))
    }

    pub fn saved(&mut self, appointments: usize) -> Result<()> {
        self.log("saved", serde_json::json!({ "appointments": appointments }))
    }
}

fn appointment_json(appt: &Appointment) -> serde_json::Value {
    serde_json::json!({
        "date": appt.date.to_string(),
        "doctor": appt.doctor,
        "patient": appt.patient,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn read_events(path: &Path) -> Vec<serde_json::Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_events_are_jsonl() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("s.jsonl");
        let mut t = Transcript::new(&path, "abc", Path::new("/tmp/data.dat")).unwrap();
        assert_eq!(t.path(), Some(path.as_path()));

        t.session_start(true).unwrap();
        t.login("DrSmith", "General Practice").unwrap();
        let appt = Appointment::new(Date::new(1, 2, 2026), 0, 3);
        t.rescheduled(&appt, &Date::new(5, 5, 2025)).unwrap();

        let events = read_events(&path);
        assert_eq!(events.len(), 3);
        assert_eq!(events[0]["type"], "session_start");
        assert_eq!(events[0]["seeded"], true);
        assert_eq!(events[1]["session_id"], "abc");
        assert_eq!(events[1]["user"], "DrSmith");
        assert_eq!(events[2]["date"], "01.02.2026");
        assert_eq!(events[2]["from"], "05.05.2025");
        assert_eq!(events[2]["data_file"], "/tmp/data.dat");
    }

    #[test]
    fn test_disabled_transcript_is_silent() {
        let mut t = Transcript::disabled("abc", Path::new("data.dat"));
        assert!(t.path().is_none());
        t.saved(3).unwrap();
    }
}
