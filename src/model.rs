//! Core records: users, dates and appointments.

use std::fmt;

/// Account role. `Patient` marks a patient account; every other variant is a
/// doctor's specialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    GeneralPractice,
    Cardiology,
    Dermatology,
    Neurology,
    Pediatrics,
    Orthopedics,
    Gynecology,
    InternalMedicine,
    Surgery,
    Patient,
}

impl Role {
    /// Every specialization a doctor can hold, in on-disk code order.
    pub const SPECIALIZATIONS: [Role; 9] = [
        Role::GeneralPractice,
        Role::Cardiology,
        Role::Dermatology,
        Role::Neurology,
        Role::Pediatrics,
        Role::Orthopedics,
        Role::Gynecology,
        Role::InternalMedicine,
        Role::Surgery,
    ];

    /// Stable numeric code written to the data file
    pub fn code(&self) -> u8 {
        match self {
            Role::GeneralPractice => 0,
            Role::Cardiology => 1,
            Role::Dermatology => 2,
            Role::Neurology => 3,
            Role::Pediatrics => 4,
            Role::Orthopedics => 5,
            Role::Gynecology => 6,
            Role::InternalMedicine => 7,
            Role::Surgery => 8,
            Role::Patient => 9,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            9 => Some(Role::Patient),
            c => Role::SPECIALIZATIONS.get(c as usize).copied(),
        }
    }

    pub fn is_doctor(&self) -> bool {
        *self != Role::Patient
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::GeneralPractice => "General Practice",
            Role::Cardiology => "Cardiology",
            Role::Dermatology => "Dermatology",
            Role::Neurology => "Neurology",
            Role::Pediatrics => "Pediatrics",
            Role::Orthopedics => "Orthopedics",
            Role::Gynecology => "Gynecology",
            Role::InternalMedicine => "Internal Medicine",
            Role::Surgery => "Surgery",
            Role::Patient => "Patient",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A doctor or patient account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub name: String,
    pub password: String,
    pub role: Role,
}

impl User {
    pub fn doctor(name: &str, password: &str, role: Role) -> Self {
        Self {
            name: name.to_string(),
            password: password.to_string(),
            role,
        }
    }

    pub fn patient(name: &str, password: &str) -> Self {
        Self {
            name: name.to_string(),
            password: password.to_string(),
            role: Role::Patient,
        }
    }
}

/// Calendar date with no calendar validation: 31.02 is a valid value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Date {
    pub day: u8,
    pub month: u8,
    pub year: u32,
}

impl Date {
    pub fn new(day: u8, month: u8, year: u32) -> Self {
        Self { day, month, year }
    }

    /// Unset day and month in the given year; the starting point for a new booking.
    pub fn blank(year: u32) -> Self {
        Self::new(0, 0, year)
    }

    /// Parse `DD.MM.YYYY`. Also accepts `/` and `-` separators and unpadded fields.
    /// Range checks belong to `validation::check_date`.
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.trim().split(['.', '/', '-']).collect();
        if parts.len() != 3 {
            return None;
        }
        let day = parts[0].parse().ok()?;
        let month = parts[1].parse().ok()?;
        let year = parts[2].parse().ok()?;
        Some(Self::new(day, month, year))
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}.{:02}.{}", self.day, self.month, self.year)
    }
}

/// A booking. Participants are indices into the roster's doctor and patient lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appointment {
    pub date: Date,
    pub doctor: usize,
    pub patient: usize,
}

impl Appointment {
    pub fn new(date: Date, doctor: usize, patient: usize) -> Self {
        Self {
            date,
            doctor,
            patient,
        }
    }
}
