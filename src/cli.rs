use crate::{
    model::{Appointment, Date, User},
    roster::{Roster, Side},
    session::{Session, SessionError},
    store,
    transcript::Transcript,
    utils::validation::{self, YearRange},
};
use anyhow::Result;
use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::cell::RefCell;
use std::path::PathBuf;

/// Clinic appointment booking
#[derive(Parser, Debug, Clone)]
#[command(name = "clinic", version, about = "Clinic appointment booking")]
pub struct Args {
    #[arg(long, env = "CLINIC_DATA", help = "Path to the data file")]
    pub data: Option<PathBuf>,

    #[arg(long, help = "Path to a config file (default ~/.clinic/config.toml)")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Directory for session transcripts")]
    pub transcripts_dir: Option<PathBuf>,

    #[arg(long, help = "Do not write a session transcript")]
    pub no_transcript: bool,

    #[arg(long, help = "Debug output")]
    pub debug: bool,
}

pub struct Context {
    pub args: Args,
    pub data_path: PathBuf,
    pub years: YearRange,
    pub session_id: String,
    pub roster: RefCell<Roster>,
    pub transcript: RefCell<Transcript>,
}

/// Source of input lines. `Ok(None)` means end of input.
pub trait LineReader {
    /// `remember` is false for secrets that must stay out of history.
    fn read_line(&mut self, prompt: &str, remember: bool) -> Result<Option<String>>;
}

impl LineReader for DefaultEditor {
    fn read_line(&mut self, prompt: &str, remember: bool) -> Result<Option<String>> {
        match self.readline(prompt) {
            Ok(line) => {
                let line = line.trim().to_string();
                if remember && !line.is_empty() {
                    self.add_history_entry(line.as_str())?;
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Get the path to the history file
pub fn history_path() -> PathBuf {
    crate::config::config_dir().join("history")
}

impl Context {
    fn debug(&self, msg: &str) {
        if self.args.debug {
            eprintln!("[DEBUG] {}", msg);
        }
    }

    /// Write the whole roster back to the data file.
    pub fn save(&self) -> Result<()> {
        let roster = self.roster.borrow();
        store::save(&self.data_path, &roster)?;
        let _ = self.transcript.borrow_mut().saved(roster.appointments.len());
        self.debug(&format!("saved {}", self.data_path.display()));
        Ok(())
    }

    fn save_or_warn(&self) {
        if let Err(e) = self.save() {
            eprintln!("[store] Failed to save: {:#}", e);
        }
    }
}

/// Interactive entry point: authenticate, then run the command loop.
/// Saves on exit.
pub fn run(ctx: &Context, input: &mut dyn LineReader) -> Result<()> {
    println!("--- Clinic System ---");
    ctx.debug(&format!("Session: {}", ctx.session_id));

    let session = match authenticate(ctx, input)? {
        Some(s) => s,
        None => {
            ctx.save()?;
            return Ok(());
        }
    };

    {
        let roster = ctx.roster.borrow();
        if let Some(user) = session.current(&roster) {
            println!(
                "\nWelcome, {} ({})",
                user.name,
                if session.is_doctor() { "Doctor" } else { "Patient" }
            );
        }
    }
    println!("Type 'help' for commands, 'q' to quit");
    print_appointments(ctx, &session);

    loop {
        let Some(line) = input.read_line("clinic> ", true)? else {
            break;
        };
        if line.is_empty() {
            continue;
        }
        match parse_command(&line, &ctx.years) {
            Ok(Command::Quit) => break,
            Ok(cmd) => {
                if let Err(e) = execute(ctx, &session, cmd) {
                    println!("Error: {}", e);
                }
            }
            Err(msg) => println!("{}", msg),
        }
    }

    ctx.save()?;
    println!("\nAll data saved successfully\nGoodbye!");
    Ok(())
}

/// Ask whether the user has an account and run login or registration.
/// Returns `None` if the user quits.
pub fn authenticate(ctx: &Context, input: &mut dyn LineReader) -> Result<Option<Session>> {
    loop {
        let Some(answer) =
            input.read_line("Do you have an existing account? [1] Yes [2] No [q] Quit: ", false)?
        else {
            return Ok(None);
        };
        match answer.to_lowercase().as_str() {
            "1" | "y" | "yes" => return login(ctx, input),
            "2" | "n" | "no" => return register(ctx, input),
            "q" | "quit" => return Ok(None),
            _ => println!("Error: answer must be 1, 2 or q"),
        }
    }
}

fn login(ctx: &Context, input: &mut dyn LineReader) -> Result<Option<Session>> {
    println!("\nLog In");
    let name = loop {
        let Some(name) = read_username(input)? else {
            return Ok(None);
        };
        if let Err(e) = validation::check_username(&name) {
            println!("{}", e);
            continue;
        }
        if ctx.roster.borrow().find_user(&name).is_none() {
            let err = SessionError::UnknownUser(name.clone());
            println!("{}", err);
            let _ = ctx.transcript.borrow_mut().login_failed(&name, "unknown_user");
            continue;
        }
        break name;
    };

    loop {
        let Some(password) = read_password(input)? else {
            return Ok(None);
        };
        let result = Session::login(&ctx.roster.borrow(), &name, &password);
        match result {
            Ok(session) => {
                let role = session
                    .current(&ctx.roster.borrow())
                    .map(|u| u.role.as_str())
                    .unwrap_or_default();
                let _ = ctx.transcript.borrow_mut().login(&name, role);
                return Ok(Some(session));
            }
            Err(e) => {
                println!("{}", e);
                if matches!(e, SessionError::WrongPassword(_)) {
                    let _ = ctx
                        .transcript
                        .borrow_mut()
                        .login_failed(&name, "wrong_password");
                }
            }
        }
    }
}

fn register(ctx: &Context, input: &mut dyn LineReader) -> Result<Option<Session>> {
    println!("\nRegister");
    let name = loop {
        let Some(name) = read_username(input)? else {
            return Ok(None);
        };
        if let Err(e) = validation::check_username(&name) {
            println!("{}", e);
            continue;
        }
        if ctx.roster.borrow().patients.iter().any(|p| p.name == name) {
            println!("{}", validation::CredentialError::UsernameTaken(name));
            continue;
        }
        break name;
    };

    loop {
        let Some(password) = read_password(input)? else {
            return Ok(None);
        };
        let result = Session::register(&mut ctx.roster.borrow_mut(), &name, &password);
        match result {
            Ok(session) => {
                let _ = ctx.transcript.borrow_mut().register(&name);
                ctx.save_or_warn();
                return Ok(Some(session));
            }
            Err(e) => println!("{}", e),
        }
    }
}

fn read_username(input: &mut dyn LineReader) -> Result<Option<String>> {
    let prompt = format!(
        "Enter a username ({}-{} characters, q to quit): ",
        validation::MIN_USERNAME_LEN,
        validation::MAX_USERNAME_LEN
    );
    Ok(input
        .read_line(&prompt, false)?
        .filter(|s| s != "q"))
}

fn read_password(input: &mut dyn LineReader) -> Result<Option<String>> {
    let prompt = format!(
        "Enter a password ({}-{} characters, q to quit): ",
        validation::MIN_PASSWORD_LEN,
        validation::MAX_PASSWORD_LEN
    );
    Ok(input
        .read_line(&prompt, false)?
        .filter(|s| s != "q"))
}

/// A parsed command-loop line. Numbers are 1-based as displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Doctors(Option<Date>),
    Patients,
    Book { date: Date, doctor: usize },
    Reschedule { n: usize, date: Date },
    Reassign { n: usize, other: usize },
    Cancel(usize),
    Save,
    Help,
    Quit,
}

pub fn parse_command(line: &str, years: &YearRange) -> std::result::Result<Command, String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let Some(&head) = parts.first() else {
        return Err("Empty command".to_string());
    };
    let args = &parts[1..];

    let cmd = match (head.to_lowercase().as_str(), args.len()) {
        ("list" | "ls", 0) => Command::List,
        ("doctors", 0) => Command::Doctors(None),
        ("doctors", 1) => Command::Doctors(Some(date_arg(args[0], years)?)),
        ("patients", 0) => Command::Patients,
        ("book" | "new", 2) => Command::Book {
            date: date_arg(args[0], years)?,
            doctor: number_arg(args[1])?,
        },
        ("date" | "reschedule", 2) => Command::Reschedule {
            n: number_arg(args[0])?,
            date: date_arg(args[1], years)?,
        },
        ("reassign", 2) => Command::Reassign {
            n: number_arg(args[0])?,
            other: number_arg(args[1])?,
        },
        ("cancel" | "delete", 1) => Command::Cancel(number_arg(args[0])?),
        ("save", 0) => Command::Save,
        ("help", _) => Command::Help,
        ("q" | "quit" | "exit", 0) => Command::Quit,
        (
            "doctors" | "patients" | "book" | "new" | "date" | "reschedule" | "reassign"
            | "cancel" | "delete" | "save" | "list" | "ls",
            _,
        ) => return Err(format!("Wrong number of arguments for '{}'. Type 'help'.", head)),
        _ => return Err(format!("Unknown command: {}. Type 'help'.", head)),
    };
    Ok(cmd)
}

fn number_arg(s: &str) -> std::result::Result<usize, String> {
    match s.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(format!("Error: '{}' is not a number from the list", s)),
    }
}

fn date_arg(s: &str, years: &YearRange) -> std::result::Result<Date, String> {
    validation::parse_date(s, years).map_err(|e| e.to_string())
}

/// Run one command against the roster, saving after every change.
pub fn execute(ctx: &Context, session: &Session, cmd: Command) -> Result<()> {
    match cmd {
        Command::List => print_appointments(ctx, session),
        Command::Doctors(date) => print_doctors(ctx, date.as_ref()),
        Command::Patients => print_patients(ctx),
        Command::Book { date, doctor } => {
            let doctor = doctor.checked_sub(1).ok_or(SessionError::NoSuchUser(doctor))?;
            let index = session.book(&mut ctx.roster.borrow_mut(), date, doctor)?;
            let appt = ctx.roster.borrow().appointments[index].clone();
            let _ = ctx.transcript.borrow_mut().booked(&appt);
            ctx.save()?;
            println!("Appointment booked for {}", date);
        }
        Command::Reschedule { n, date } => {
            let from = resolve_date(ctx, session, n);
            session.reschedule(&mut ctx.roster.borrow_mut(), n, date)?;
            log_change(ctx, session, n, |t, appt| {
                t.rescheduled(appt, &from.unwrap_or(date))
            });
            ctx.save()?;
            println!("Appointment {} moved to {}", n, date);
        }
        Command::Reassign { n, other } => {
            let other = other.checked_sub(1).ok_or(SessionError::NoSuchUser(other))?;
            session.reassign(&mut ctx.roster.borrow_mut(), n, other)?;
            log_change(ctx, session, n, |t, appt| t.reassigned(appt));
            ctx.save()?;
            println!("Appointment {} updated", n);
        }
        Command::Cancel(n) => {
            let removed = session.cancel(&mut ctx.roster.borrow_mut(), n)?;
            let _ = ctx.transcript.borrow_mut().cancelled(&removed);
            ctx.save()?;
            println!("Appointment {} on {} deleted", n, removed.date);
        }
        Command::Save => {
            ctx.save()?;
            println!("Data saved successfully!");
        }
        Command::Help => print_help(session),
        Command::Quit => {}
    }
    Ok(())
}

fn resolve_date(ctx: &Context, session: &Session, n: usize) -> Option<Date> {
    let roster = ctx.roster.borrow();
    let view = session.appointments(&roster);
    let index = *view.get(n.checked_sub(1)?)?;
    Some(roster.appointments[index].date)
}

fn log_change<F>(ctx: &Context, session: &Session, n: usize, f: F)
where
    F: FnOnce(&mut Transcript, &Appointment) -> Result<()>,
{
    let roster = ctx.roster.borrow();
    let view = session.appointments(&roster);
    if let Some(&index) = n.checked_sub(1).and_then(|i| view.get(i)) {
        let _ = f(&mut *ctx.transcript.borrow_mut(), &roster.appointments[index]);
    }
}

fn print_help(session: &Session) {
    println!("Commands:");
    println!("  list                     - show my appointments");
    println!("  doctors [DD.MM.YYYY]     - list doctors (free on a date if given)");
    println!("  patients                 - list patients");
    if !session.is_doctor() {
        println!("  book DD.MM.YYYY <n>      - book doctor n on a date");
    }
    println!("  date <n> DD.MM.YYYY      - move appointment n to a new date");
    if session.is_doctor() {
        println!("  reassign <n> <m>         - give appointment n to patient m");
    } else {
        println!("  reassign <n> <m>         - move appointment n to doctor m");
    }
    println!("  cancel <n>               - delete appointment n");
    println!("  save                     - write the data file");
    println!("  q | quit                 - save and exit");
}

fn print_appointments(ctx: &Context, session: &Session) {
    let roster = ctx.roster.borrow();
    let view = session.appointments(&roster);
    if view.is_empty() {
        if session.is_doctor() {
            println!("No appointments made yet");
        } else {
            println!("No appointments made yet, use 'book' to make one");
        }
        return;
    }
    for (pos, &index) in view.iter().enumerate() {
        println!("{}", format_appointment(&roster, session.user.side, pos + 1, index));
    }
}

/// Render one entry of a user's appointment list, showing the counterpart.
pub fn format_appointment(roster: &Roster, viewer: Side, pos: usize, index: usize) -> String {
    let appt = &roster.appointments[index];
    match viewer {
        Side::Doctor => {
            let patient = name_or_unknown(roster.patients.get(appt.patient));
            format!("{}) Patient: {}\n   Date: {}", pos, patient, appt.date)
        }
        Side::Patient => {
            let doctor = roster.doctors.get(appt.doctor);
            format!(
                "{}) Doctor: {}\n   Date: {}\n   Specialization: {}",
                pos,
                name_or_unknown(doctor),
                appt.date,
                doctor.map(|d| d.role.as_str()).unwrap_or("?")
            )
        }
    }
}

fn name_or_unknown(user: Option<&User>) -> &str {
    user.map(|u| u.name.as_str()).unwrap_or("<unknown>")
}

fn print_doctors(ctx: &Context, date: Option<&Date>) {
    let roster = ctx.roster.borrow();
    let listed: Vec<usize> = match date {
        Some(d) => roster.free_doctors(d),
        None => (0..roster.doctors.len()).collect(),
    };
    if listed.is_empty() {
        println!("{}", no_doctors_message(date));
        return;
    }
    if let Some(d) = date {
        println!("Doctors free on {}:", d);
    }
    for i in listed {
        let doctor = &roster.doctors[i];
        println!("{}) {} - {}", i + 1, doctor.name, doctor.role);
    }
}

fn no_doctors_message(date: Option<&Date>) -> String {
    match date {
        Some(d) => format!("No doctors are free on {}", d),
        None => "No doctors are registered".to_string(),
    }
}

fn print_patients(ctx: &Context) {
    let roster = ctx.roster.borrow();
    for (i, patient) in roster.patients.iter().enumerate() {
        println!("{}) {}", i + 1, patient.name);
    }
}
