//! In-memory roster of doctors, patients and appointments.

use crate::model::{Appointment, Date, Role, User};
use crate::utils::validation::{self, CredentialError};
use anyhow::{bail, Result};

/// Which collection a user lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Doctor,
    Patient,
}

impl Side {
    /// The side an appointment's counterpart sits on
    pub fn other(&self) -> Side {
        match self {
            Side::Doctor => Side::Patient,
            Side::Patient => Side::Doctor,
        }
    }
}

/// Reference to a user by collection and index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserRef {
    pub side: Side,
    pub index: usize,
}

impl UserRef {
    pub fn doctor(index: usize) -> Self {
        Self {
            side: Side::Doctor,
            index,
        }
    }

    pub fn patient(index: usize) -> Self {
        Self {
            side: Side::Patient,
            index,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    pub doctors: Vec<User>,
    pub patients: Vec<User>,
    pub appointments: Vec<Appointment>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Roster seeded when no data file exists yet
    pub fn with_defaults() -> Self {
        let doctors = vec![
            User::doctor("DrSmith", "#Password123", Role::GeneralPractice),
            User::doctor("DrJohnson", "@securE456", Role::Cardiology),
            User::doctor("DrWilliams", "^Doctor789", Role::Pediatrics),
            User::doctor("DrBrown", ")mediC2023", Role::Neurology),
            User::doctor("DrDavis", "(Health2024", Role::Orthopedics),
        ];
        let patients = vec![
            User::patient("EmilyClark", "Se@ure123Pass"),
            User::patient("JacobMiller", "P@ssw0rdSafe"),
            User::patient("SophiaBrown", "H3alth#Care2023"),
            User::patient("NoahWilson", "Patient$789Abcd"),
            User::patient("OliviaJones", "M3dical!Records"),
        ];
        let appointments = vec![
            Appointment::new(Date::new(12, 1, 2025), 2, 1),
            Appointment::new(Date::new(23, 3, 2025), 0, 3),
            Appointment::new(Date::new(15, 7, 2025), 4, 0),
            Appointment::new(Date::new(8, 12, 2025), 1, 4),
            Appointment::new(Date::new(19, 2, 2025), 3, 2),
        ];
        Self {
            doctors,
            patients,
            appointments,
        }
    }

    /// Look a user up by name across both collections, doctors first.
    pub fn find_user(&self, name: &str) -> Option<UserRef> {
        if let Some(i) = self.doctors.iter().position(|d| d.name == name) {
            return Some(UserRef::doctor(i));
        }
        self.patients
            .iter()
            .position(|p| p.name == name)
            .map(UserRef::patient)
    }

    pub fn user(&self, user: UserRef) -> Option<&User> {
        match user.side {
            Side::Doctor => self.doctors.get(user.index),
            Side::Patient => self.patients.get(user.index),
        }
    }

    /// Number of users on one side
    pub fn count(&self, side: Side) -> usize {
        match side {
            Side::Doctor => self.doctors.len(),
            Side::Patient => self.patients.len(),
        }
    }

    /// Indices of the appointments the user takes part in, in roster order.
    pub fn appointments_for(&self, user: UserRef) -> Vec<usize> {
        self.appointments
            .iter()
            .enumerate()
            .filter(|(_, a)| participant(a, user.side) == user.index)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn add_appointment(&mut self, appointment: Appointment) -> Result<usize> {
        self.check_participants(&appointment)?;
        self.appointments.push(appointment);
        Ok(self.appointments.len() - 1)
    }

    /// Remove exactly one appointment, keeping the others in order.
    pub fn remove_appointment(&mut self, index: usize) -> Result<Appointment> {
        if index >= self.appointments.len() {
            bail!("No appointment at index {}", index);
        }
        Ok(self.appointments.remove(index))
    }

    pub fn replace_doctor(&mut self, appointment: usize, doctor: usize) -> Result<()> {
        self.replace_participant(appointment, UserRef::doctor(doctor))
    }

    pub fn replace_patient(&mut self, appointment: usize, patient: usize) -> Result<()> {
        self.replace_participant(appointment, UserRef::patient(patient))
    }

    /// Re-point one side of an appointment at a different user.
    pub fn replace_participant(&mut self, appointment: usize, user: UserRef) -> Result<()> {
        if user.index >= self.count(user.side) {
            bail!("No {:?} at index {}", user.side, user.index);
        }
        let Some(appt) = self.appointments.get_mut(appointment) else {
            bail!("No appointment at index {}", appointment);
        };
        match user.side {
            Side::Doctor => appt.doctor = user.index,
            Side::Patient => appt.patient = user.index,
        }
        Ok(())
    }

    pub fn set_date(&mut self, appointment: usize, date: Date) -> Result<()> {
        let Some(appt) = self.appointments.get_mut(appointment) else {
            bail!("No appointment at index {}", appointment);
        };
        appt.date = date;
        Ok(())
    }

    /// Append a new patient account. Returns the patient's index.
    pub fn register_patient(
        &mut self,
        name: &str,
        password: &str,
    ) -> std::result::Result<usize, CredentialError> {
        validation::check_username(name)?;
        if self.patients.iter().any(|p| p.name == name) {
            return Err(CredentialError::UsernameTaken(name.to_string()));
        }
        validation::check_password(password)?;
        self.patients.push(User::patient(name, password));
        Ok(self.patients.len() - 1)
    }

    /// Doctors with no appointment on exactly this date.
    pub fn free_doctors(&self, date: &Date) -> Vec<usize> {
        let mut free = vec![true; self.doctors.len()];
        for appt in self.appointments.iter().filter(|a| a.date == *date) {
            if let Some(slot) = free.get_mut(appt.doctor) {
                *slot = false;
            }
        }
        free.iter()
            .enumerate()
            .filter(|(_, is_free)| **is_free)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn is_doctor_free(&self, doctor: usize, date: &Date) -> bool {
        !self
            .appointments
            .iter()
            .any(|a| a.doctor == doctor && a.date == *date)
    }

    /// Every appointment must reference an existing doctor and patient.
    pub fn validate(&self) -> Result<()> {
        for (i, appt) in self.appointments.iter().enumerate() {
            self.check_participants(appt)
                .map_err(|e| anyhow::anyhow!("Appointment {}: {}", i, e))?;
        }
        Ok(())
    }

    fn check_participants(&self, appt: &Appointment) -> Result<()> {
        if appt.doctor >= self.doctors.len() {
            bail!(
                "doctor index {} out of range ({} doctors)",
                appt.doctor,
                self.doctors.len()
            );
        }
        if appt.patient >= self.patients.len() {
            bail!(
                "patient index {} out of range ({} patients)",
                appt.patient,
                self.patients.len()
            );
        }
        Ok(())
    }
}

fn participant(appt: &Appointment, side: Side) -> usize {
    match side {
        Side::Doctor => appt.doctor,
        Side::Patient => appt.patient,
    }
}
