//! Logged-in user and the actions available to them.
//!
//! A session never owns the roster; every operation borrows it. Appointment
//! positions passed in are 1-based positions in the user's own list, as shown
//! by `appointments`.

use crate::model::{Appointment, Date, User};
use crate::roster::{Roster, Side, UserRef};
use crate::utils::validation::{self, CredentialError};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    UnknownUser(String),
    WrongPassword(String),
    Credentials(CredentialError),
    DoctorCannotBook,
    NoSuchAppointment(usize),
    NoSuchUser(usize),
    DoctorBusy { doctor: String, date: Date },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::UnknownUser(name) => {
                write!(f, "There is nobody with the username {}", name)
            }
            SessionError::WrongPassword(name) => write!(f, "Invalid password for user {}", name),
            SessionError::Credentials(e) => write!(f, "{}", e),
            SessionError::DoctorCannotBook => {
                f.write_str("As a doctor, you cannot create new appointments")
            }
            SessionError::NoSuchAppointment(n) => write!(f, "No appointment number {}", n),
            SessionError::NoSuchUser(n) => write!(f, "No entry number {} in the list", n),
            SessionError::DoctorBusy { doctor, date } => {
                write!(f, "{} already has an appointment on {}", doctor, date)
            }
        }
    }
}

impl std::error::Error for SessionError {}

impl From<CredentialError> for SessionError {
    fn from(e: CredentialError) -> Self {
        SessionError::Credentials(e)
    }
}

pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// The authenticated user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub user: UserRef,
}

impl Session {
    /// Log in by name and password. The password length is checked before the
    /// comparison so malformed input gets the length message.
    pub fn login(roster: &Roster, name: &str, password: &str) -> SessionResult<Self> {
        validation::check_username(name)?;
        let user = roster
            .find_user(name)
            .ok_or_else(|| SessionError::UnknownUser(name.to_string()))?;
        validation::check_password_length(password)?;
        let record = roster
            .user(user)
            .ok_or_else(|| SessionError::UnknownUser(name.to_string()))?;
        if record.password != password {
            return Err(SessionError::WrongPassword(name.to_string()));
        }
        Ok(Self { user })
    }

    /// Register a new patient and log them in.
    pub fn register(roster: &mut Roster, name: &str, password: &str) -> SessionResult<Self> {
        let index = roster.register_patient(name, password)?;
        Ok(Self {
            user: UserRef::patient(index),
        })
    }

    pub fn is_doctor(&self) -> bool {
        self.user.side == Side::Doctor
    }

    pub fn current<'a>(&self, roster: &'a Roster) -> Option<&'a User> {
        roster.user(self.user)
    }

    /// Roster indices of this user's appointments, in roster order.
    pub fn appointments(&self, roster: &Roster) -> Vec<usize> {
        roster.appointments_for(self.user)
    }

    /// Book an appointment with `doctor` (roster index). Patients only.
    pub fn book(&self, roster: &mut Roster, date: Date, doctor: usize) -> SessionResult<usize> {
        if self.is_doctor() {
            return Err(SessionError::DoctorCannotBook);
        }
        let Some(record) = roster.doctors.get(doctor) else {
            return Err(SessionError::NoSuchUser(doctor + 1));
        };
        if !roster.is_doctor_free(doctor, &date) {
            return Err(SessionError::DoctorBusy {
                doctor: record.name.clone(),
                date,
            });
        }
        roster
            .add_appointment(Appointment::new(date, doctor, self.user.index))
            .map_err(|_| SessionError::NoSuchUser(doctor + 1))
    }

    /// Delete the appointment at view position `n`.
    pub fn cancel(&self, roster: &mut Roster, n: usize) -> SessionResult<Appointment> {
        let index = self.resolve(roster, n)?;
        roster
            .remove_appointment(index)
            .map_err(|_| SessionError::NoSuchAppointment(n))
    }

    /// Move appointment `n` to `date`. A patient may only move to a date on
    /// which the doctor has no other booking.
    pub fn reschedule(&self, roster: &mut Roster, n: usize, date: Date) -> SessionResult<()> {
        let index = self.resolve(roster, n)?;
        let appt = &roster.appointments[index];
        if !self.is_doctor() && appt.date != date && !roster.is_doctor_free(appt.doctor, &date) {
            return Err(SessionError::DoctorBusy {
                doctor: name_of(roster.doctors.get(appt.doctor)),
                date,
            });
        }
        roster
            .set_date(index, date)
            .map_err(|_| SessionError::NoSuchAppointment(n))
    }

    /// Point the other side of appointment `n` at `other` (roster index on
    /// the other side). A patient may only move to a doctor who is free that day.
    pub fn reassign(&self, roster: &mut Roster, n: usize, other: usize) -> SessionResult<()> {
        let index = self.resolve(roster, n)?;
        let side = self.user.side.other();
        if other >= roster.count(side) {
            return Err(SessionError::NoSuchUser(other + 1));
        }
        if side == Side::Doctor {
            let appt = &roster.appointments[index];
            if appt.doctor != other && !roster.is_doctor_free(other, &appt.date) {
                return Err(SessionError::DoctorBusy {
                    doctor: name_of(roster.doctors.get(other)),
                    date: appt.date,
                });
            }
        }
        roster
            .replace_participant(index, UserRef { side, index: other })
            .map_err(|_| SessionError::NoSuchUser(other + 1))
    }

    fn resolve(&self, roster: &Roster, n: usize) -> SessionResult<usize> {
        n.checked_sub(1)
            .and_then(|i| self.appointments(roster).get(i).copied())
            .ok_or(SessionError::NoSuchAppointment(n))
    }
}

fn name_of(user: Option<&User>) -> String {
    user.map(|u| u.name.clone()).unwrap_or_default()
}
