//! Binary encoding of the roster.
//!
//! Layout (all integers little-endian):
//! ```text
//! magic    "CLNC"
//! version  u16
//! doctors  u32 count, then name:str password:str role:u8
//! patients u32 count, then name:str password:str
//! appts    u32 count, then day:u8 month:u8 year:u32 doctor:u32 patient:u32
//! str      u32 byte length, then UTF-8 bytes
//! ```
//! The format is positional; nothing is tagged.

use crate::model::{Appointment, Date, Role, User};
use crate::roster::Roster;
use anyhow::{bail, Context, Result};
use std::io::{Cursor, Read, Write};

pub const MAGIC: &[u8; 4] = b"CLNC";
pub const VERSION: u16 = 1;

/// Upper bound on a single string field; anything larger is a corrupt file.
const MAX_STR_LEN: u32 = 1 << 16;

pub fn encode(roster: &Roster) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_roster(&mut buf, roster)?;
    Ok(buf)
}

pub fn decode(bytes: &[u8]) -> Result<Roster> {
    let mut cursor = Cursor::new(bytes);
    let roster = read_roster(&mut cursor)?;
    let consumed = cursor.position() as usize;
    if consumed != bytes.len() {
        bail!(
            "{} trailing bytes after roster data",
            bytes.len() - consumed
        );
    }
    Ok(roster)
}

/// Refuses a roster that `read_roster` would reject, before writing anything.
pub fn write_roster<W: Write>(w: &mut W, roster: &Roster) -> Result<()> {
    roster.validate()?;
    if let Some(d) = roster.doctors.iter().find(|d| !d.role.is_doctor()) {
        bail!("Doctor record {} carries the patient role", d.name);
    }

    w.write_all(MAGIC)?;
    w.write_all(&VERSION.to_le_bytes())?;

    write_count(w, roster.doctors.len())?;
    for doctor in &roster.doctors {
        write_str(w, &doctor.name)?;
        write_str(w, &doctor.password)?;
        w.write_all(&[doctor.role.code()])?;
    }

    write_count(w, roster.patients.len())?;
    for patient in &roster.patients {
        write_str(w, &patient.name)?;
        write_str(w, &patient.password)?;
    }

    write_count(w, roster.appointments.len())?;
    for appt in &roster.appointments {
        write_date(w, &appt.date)?;
        write_count(w, appt.doctor)?;
        write_count(w, appt.patient)?;
    }
    Ok(())
}

pub fn read_roster<R: Read>(r: &mut R) -> Result<Roster> {
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic).context("Reading file header")?;
    if &magic != MAGIC {
        bail!("Not a clinic data file (bad magic {:?})", magic);
    }
    let version = read_u16(r).context("Reading format version")?;
    if version != VERSION {
        bail!("Unsupported data file version {}", version);
    }

    let count = read_u32(r).context("Reading doctor count")?;
    let mut doctors = Vec::new();
    for i in 0..count {
        doctors.push(read_doctor(r).with_context(|| format!("Reading doctor {}", i))?);
    }

    let count = read_u32(r).context("Reading patient count")?;
    let mut patients = Vec::new();
    for i in 0..count {
        patients.push(read_patient(r).with_context(|| format!("Reading patient {}", i))?);
    }

    let count = read_u32(r).context("Reading appointment count")?;
    let mut appointments = Vec::new();
    for i in 0..count {
        let date = read_date(r).with_context(|| format!("Reading appointment {}", i))?;
        let doctor = read_u32(r).with_context(|| format!("Reading appointment {}", i))?;
        let patient = read_u32(r).with_context(|| format!("Reading appointment {}", i))?;
        appointments.push(Appointment::new(date, doctor as usize, patient as usize));
    }

    let roster = Roster {
        doctors,
        patients,
        appointments,
    };
    roster.validate()?;
    Ok(roster)
}

fn read_doctor<R: Read>(r: &mut R) -> Result<User> {
    let name = read_str(r)?;
    let password = read_str(r)?;
    let code = read_u8(r)?;
    let role = Role::from_code(code).ok_or_else(|| anyhow::anyhow!("Unknown role code {}", code))?;
    if !role.is_doctor() {
        bail!("Doctor record {} carries the patient role", name);
    }
    Ok(User {
        name,
        password,
        role,
    })
}

fn read_patient<R: Read>(r: &mut R) -> Result<User> {
    let name = read_str(r)?;
    let password = read_str(r)?;
    Ok(User::patient(&name, &password))
}

fn write_count<W: Write>(w: &mut W, n: usize) -> Result<()> {
    let n = u32::try_from(n).context("Count does not fit in u32")?;
    w.write_all(&n.to_le_bytes())?;
    Ok(())
}

fn write_str<W: Write>(w: &mut W, s: &str) -> Result<()> {
    if s.len() > MAX_STR_LEN as usize {
        bail!("String length {} exceeds limit", s.len());
    }
    write_count(w, s.len())?;
    w.write_all(s.as_bytes())?;
    Ok(())
}

fn write_date<W: Write>(w: &mut W, date: &Date) -> Result<()> {
    w.write_all(&[date.day, date.month])?;
    w.write_all(&date.year.to_le_bytes())?;
    Ok(())
}

fn read_u8<R: Read>(r: &mut R) -> Result<u8> {
    let mut b = [0u8; 1];
    r.read_exact(&mut b)?;
    Ok(b[0])
}

fn read_u16<R: Read>(r: &mut R) -> Result<u16> {
    let mut b = [0u8; 2];
    r.read_exact(&mut b)?;
    Ok(u16::from_le_bytes(b))
}

fn read_u32<R: Read>(r: &mut R) -> Result<u32> {
    let mut b = [0u8; 4];
    r.read_exact(&mut b)?;
    Ok(u32::from_le_bytes(b))
}

fn read_str<R: Read>(r: &mut R) -> Result<String> {
    let len = read_u32(r)?;
    if len > MAX_STR_LEN {
        bail!("String length {} exceeds limit", len);
    }
    let mut buf = vec![0u8; len as usize];
    r.read_exact(&mut buf)?;
    String::from_utf8(buf).context("String field is not valid UTF-8")
}

fn read_date<R: Read>(r: &mut R) -> Result<Date> {
    let day = read_u8(r)?;
    let month = read_u8(r)?;
    let year = read_u32(r)?;
    Ok(Date::new(day, month, year))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_defaults() {
        let roster = Roster::with_defaults();
        let bytes = encode(&roster).unwrap();
        assert_eq!(decode(&bytes).unwrap(), roster);
    }

    #[test]
    fn test_roundtrip_after_edits() {
        let mut roster = Roster::with_defaults();
        roster.register_patient("newpatient1", "Abc123!x").unwrap();
        roster
            .add_appointment(Appointment::new(Date::new(31, 2, 2027), 4, 5))
            .unwrap();
        roster.doctors.push(User::doctor("DrÉmile", "Ünïcode!9", Role::Surgery));
        roster.remove_appointment(0).unwrap();

        let decoded = decode(&encode(&roster).unwrap()).unwrap();
        assert_eq!(decoded, roster);
    }

    #[test]
    fn test_roundtrip_varied_rosters() {
        let names = ["Émile", "Zoë", "张伟", "Ørjan", "plain"];
        for size in 0..12usize {
            let mut roster = Roster::new();
            for i in 0..size {
                let role = Role::SPECIALIZATIONS[i % Role::SPECIALIZATIONS.len()];
                let name = format!("Dr{}{}", names[i % names.len()], i);
                roster.doctors.push(User::doctor(&name, "P@ss✓word", role));
                roster
                    .patients
                    .push(User::patient(&format!("{}{}", names[(i + 2) % names.len()], i), ""));
            }
            for i in 0..size * 2 {
                // Every appointment appears twice
                let j = i / 2;
                let appt = Appointment::new(
                    Date::new((j % 31) as u8, (j % 13) as u8, 2025 + j as u32),
                    j % size,
                    (j + 1) % size,
                );
                roster.appointments.push(appt);
            }

            let bytes = encode(&roster).unwrap();
            assert_eq!(decode(&bytes).unwrap(), roster, "size {}", size);
        }
    }

    #[test]
    fn test_empty_roster_layout() {
        let bytes = encode(&Roster::new()).unwrap();
        let mut expected = b"CLNC".to_vec();
        expected.extend_from_slice(&1u16.to_le_bytes());
        expected.extend_from_slice(&[0u8; 12]);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_field_order() {
        let roster = Roster {
            doctors: vec![User::doctor("Dr", "pw", Role::Cardiology)],
            patients: vec![User::patient("P", "q")],
            appointments: vec![Appointment::new(Date::new(2, 3, 2026), 0, 0)],
        };
        let bytes = encode(&roster).unwrap();
        let body = &bytes[6..];
        let parts: [&[u8]; 16] = [
            &1u32.to_le_bytes(),
            &2u32.to_le_bytes(),
            b"Dr",
            &2u32.to_le_bytes(),
            b"pw",
            &[1],
            &1u32.to_le_bytes(),
            &1u32.to_le_bytes(),
            b"P",
            &1u32.to_le_bytes(),
            b"q",
            &1u32.to_le_bytes(),
            &[2, 3],
            &2026u32.to_le_bytes(),
            &0u32.to_le_bytes(),
            &0u32.to_le_bytes(),
        ];
        assert_eq!(body, &parts.concat()[..]);
    }

    #[test]
    fn test_truncated_file_rejected() {
        let bytes = encode(&Roster::with_defaults()).unwrap();
        for cut in [0, 3, 6, 10, bytes.len() / 2, bytes.len() - 1] {
            assert!(decode(&bytes[..cut]).is_err(), "cut at {}", cut);
        }
    }

    #[test]
    fn test_foreign_file_rejected() {
        let err = decode(b"PK\x03\x04 not a roster").unwrap_err();
        assert!(err.to_string().contains("bad magic"));
    }

    #[test]
    fn test_unknown_version_rejected() {
        let mut bytes = encode(&Roster::new()).unwrap();
        bytes[4] = 9;
        let err = decode(&bytes).unwrap_err();
        assert!(err.to_string().contains("version"));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = encode(&Roster::with_defaults()).unwrap();
        bytes.push(0);
        assert!(decode(&bytes).is_err());
    }

    #[test]
    fn test_dangling_index_rejected() {
        let roster = Roster {
            doctors: vec![User::doctor("DrSmith", "pw", Role::Surgery)],
            patients: vec![User::patient("P", "q")],
            appointments: vec![Appointment::new(Date::new(1, 1, 2026), 0, 0)],
        };
        let mut bytes = encode(&roster).unwrap();
        // The patient index is the last field in the file
        let at = bytes.len() - 4;
        bytes[at..].copy_from_slice(&1u32.to_le_bytes());
        assert!(decode(&bytes).is_err());
    }

    #[test]
    fn test_bad_role_code_rejected() {
        let roster = Roster {
            doctors: vec![User::doctor("Doc", "pw", Role::Surgery)],
            ..Roster::default()
        };
        let mut bytes = encode(&roster).unwrap();
        // header(6) + count(4) + "Doc"(4+3) + "pw"(4+2) => role byte
        let role_at = 6 + 4 + 7 + 6;
        assert_eq!(bytes[role_at], Role::Surgery.code());
        bytes[role_at] = 200;
        assert!(decode(&bytes).is_err());
        bytes[role_at] = Role::Patient.code();
        assert!(decode(&bytes).is_err());
    }

    #[test]
    fn test_encode_rejects_undecodable() {
        let mut roster = Roster::with_defaults();
        roster.doctors[0].password = "x".repeat(MAX_STR_LEN as usize + 1);
        let err = encode(&roster).unwrap_err();
        assert!(err.to_string().contains("exceeds limit"));

        let mut roster = Roster::with_defaults();
        roster
            .doctors
            .push(User::doctor("DrPatient", "pw", Role::Patient));
        assert!(encode(&roster).is_err());

        let mut roster = Roster::with_defaults();
        roster
            .appointments
            .push(Appointment::new(Date::new(1, 1, 2026), 0, 42));
        let mut out = Vec::new();
        assert!(write_roster(&mut out, &roster).is_err());
        assert!(out.is_empty());

        // A string exactly at the limit still round-trips
        let mut roster = Roster::with_defaults();
        roster.patients[0].password = "y".repeat(MAX_STR_LEN as usize);
        assert_eq!(decode(&encode(&roster).unwrap()).unwrap(), roster);
    }
}
