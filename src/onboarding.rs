use anyhow::Result;
use std::io::{BufRead, Write};

use crate::models::{Experience, JobField, JobType, UserProfile, WorkLocation};

pub const FIRST_STEP: u8 = 1;
pub const LAST_STEP: u8 = 4;

// Nothing is validated; blanks pass through as empty strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileDraft {
    pub name: Option<String>,
    pub field: JobField,
    pub custom_field: Option<String>,
    pub role: Option<String>,
    pub experience: Experience,
    pub location: WorkLocation,
    pub job_type: JobType,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub resume_text: Option<String>,
    pub linkedin_url: Option<String>,
    pub portfolio_url: Option<String>,
}

impl Default for ProfileDraft {
    fn default() -> Self {
        Self {
            name: None,
            field: JobField::SoftwareDeveloper,
            custom_field: None,
            role: None,
            experience: Experience::Fresher,
            location: WorkLocation::Remote,
            job_type: JobType::FullTime,
            email: None,
            phone: None,
            resume_text: None,
            linkedin_url: None,
            portfolio_url: None,
        }
    }
}

impl ProfileDraft {
    fn into_profile(self) -> UserProfile {
        UserProfile {
            name: self.name.unwrap_or_default(),
            field: self.field,
            custom_field: self.custom_field,
            role: self.role.unwrap_or_default(),
            experience: self.experience,
            location: self.location,
            job_type: self.job_type,
            email: self.email.unwrap_or_default(),
            phone: self.phone.unwrap_or_default(),
            resume_text: self.resume_text.unwrap_or_default(),
            linkedin_url: self.linkedin_url,
            portfolio_url: self.portfolio_url,
        }
    }
}

#[derive(Debug)]
pub struct ProfileBuilder {
    step: u8,
    draft: ProfileDraft,
}

impl Default for ProfileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileBuilder {
    pub fn new() -> Self {
        Self {
            step: FIRST_STEP,
            draft: ProfileDraft::default(),
        }
    }

    pub fn step(&self) -> u8 {
        self.step
    }

    pub fn draft_mut(&mut self) -> &mut ProfileDraft {
        &mut self.draft
    }

    pub fn next(&mut self) {
        if self.step < LAST_STEP {
            self.step += 1;
        }
    }

    pub fn back(&mut self) {
        if self.step > FIRST_STEP {
            self.step -= 1;
        }
    }

    pub fn is_last_step(&self) -> bool {
        self.step == LAST_STEP
    }

    // Only possible on the last step.
    pub fn finish(self) -> std::result::Result<UserProfile, Self> {
        if self.is_last_step() {
            Ok(self.draft.into_profile())
        } else {
            Err(self)
        }
    }
}

enum Nav {
    Next,
    Back,
    Quit,
}

pub fn run_interactive<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<Option<UserProfile>> {
    let mut builder = ProfileBuilder::new();

    loop {
        writeln!(out, "\nStep {} of {}", builder.step(), LAST_STEP)?;
        match builder.step() {
            1 => {
                writeln!(out, "What's your field?")?;
                let draft = builder.draft_mut();
                draft.field = choose(input, out, &JobField::ALL, draft.field, JobField::as_str)?;
                if draft.field == JobField::Other {
                    draft.custom_field = prompt(input, out, "Describe your field")?;
                } else {
                    draft.custom_field = None;
                }
            }
            2 => {
                writeln!(out, "Preferences")?;
                let draft = builder.draft_mut();
                if let Some(role) = prompt(input, out, "Preferred Job Title (e.g. Senior Frontend Engineer)")? {
                    draft.role = Some(role);
                }
                writeln!(out, "Experience Level")?;
                draft.experience = choose(input, out, &Experience::ALL, draft.experience, Experience::as_str)?;
                writeln!(out, "Work Mode")?;
                draft.location = choose(input, out, &WorkLocation::ALL, draft.location, WorkLocation::as_str)?;
                writeln!(out, "Job Type")?;
                draft.job_type = choose(input, out, &JobType::ALL, draft.job_type, JobType::as_str)?;
            }
            3 => {
                writeln!(out, "Contact Details")?;
                let draft = builder.draft_mut();
                if let Some(name) = prompt(input, out, "Full Name")? {
                    draft.name = Some(name);
                }
                if let Some(email) = prompt(input, out, "Email Address")? {
                    draft.email = Some(email);
                }
                if let Some(phone) = prompt(input, out, "Phone Number")? {
                    draft.phone = Some(phone);
                }
            }
            _ => {
                writeln!(out, "Resume & Portfolio")?;
                let draft = builder.draft_mut();
                if let Some(resume) = prompt_multiline(input, out, "Paste resume text (end with an empty line)")? {
                    draft.resume_text = Some(resume);
                }
                if let Some(url) = prompt(input, out, "LinkedIn URL (optional)")? {
                    draft.linkedin_url = Some(url);
                }
                if let Some(url) = prompt(input, out, "Portfolio URL (optional)")? {
                    draft.portfolio_url = Some(url);
                }
            }
        }

        let label = if builder.is_last_step() { "Get Started" } else { "Continue" };
        match navigate(input, out, label, builder.step() > FIRST_STEP)? {
            Nav::Quit => return Ok(None),
            Nav::Back => builder.back(),
            Nav::Next if builder.is_last_step() => {
                return Ok(builder.finish().ok());
            }
            Nav::Next => builder.next(),
        }
    }
}

fn read_line<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
}

fn prompt<R: BufRead, W: Write>(input: &mut R, out: &mut W, label: &str) -> Result<Option<String>> {
    write!(out, "{}: ", label)?;
    out.flush()?;
    Ok(read_line(input)?.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
}

fn prompt_multiline<R: BufRead, W: Write>(input: &mut R, out: &mut W, label: &str) -> Result<Option<String>> {
    writeln!(out, "{}:", label)?;
    let mut lines = Vec::new();
    while let Some(line) = read_line(input)? {
        if line.trim().is_empty() {
            break;
        }
        lines.push(line);
    }
    Ok(if lines.is_empty() { None } else { Some(lines.join("\n")) })
}

fn choose<R: BufRead, W: Write, T: Copy + PartialEq>(
    input: &mut R,
    out: &mut W,
    options: &[T],
    current: T,
    label: fn(&T) -> &'static str,
) -> Result<T> {
    for (i, option) in options.iter().enumerate() {
        let marker = if *option == current { "*" } else { " " };
        writeln!(out, " {} {}. {}", marker, i + 1, label(option))?;
    }
    write!(out, "Choice [enter keeps *]: ")?;
    out.flush()?;

    let Some(answer) = read_line(input)? else {
        return Ok(current);
    };
    let answer = answer.trim();
    if let Ok(n) = answer.parse::<usize>() {
        if let Some(option) = n.checked_sub(1).and_then(|i| options.get(i)) {
            return Ok(*option);
        }
    }
    Ok(options
        .iter()
        .find(|o| label(*o).eq_ignore_ascii_case(answer))
        .copied()
        .unwrap_or(current))
}

fn navigate<R: BufRead, W: Write>(input: &mut R, out: &mut W, label: &str, can_go_back: bool) -> Result<Nav> {
    let back = if can_go_back { ", b = back" } else { "" };
    write!(out, "[enter = {}{}, q = quit]: ", label, back)?;
    out.flush()?;

    Ok(match read_line(input)?.as_deref().map(str::trim) {
        None | Some("q") | Some("quit") => Nav::Quit,
        Some("b") | Some("back") if can_go_back => Nav::Back,
        _ => Nav::Next,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_step_bounds() {
        let mut builder = ProfileBuilder::new();
        builder.back();
        assert_eq!(builder.step(), 1);
        for _ in 0..10 {
            builder.next();
        }
        assert_eq!(builder.step(), 4);
        builder.back();
        assert_eq!(builder.step(), 3);
    }

    #[test]
    fn test_finish_only_on_last_step() {
        let builder = ProfileBuilder::new();
        let mut builder = builder.finish().unwrap_err();
        builder.next();
        builder.next();
        builder.next();
        let profile = builder.finish().unwrap();
        // nothing was entered: defaults and empty strings, no validation
        assert_eq!(profile.field, JobField::SoftwareDeveloper);
        assert_eq!(profile.experience, Experience::Fresher);
        assert_eq!(profile.location, WorkLocation::Remote);
        assert_eq!(profile.job_type, JobType::FullTime);
        assert_eq!(profile.role, "");
        assert_eq!(profile.email, "");
    }

    #[test]
    fn test_interactive_full_walkthrough() {
        let script = [
            "9",                // field: Other
            "Robotics",         // custom field
            "",                 // continue
            "Backend Engineer", // role
            "3",                // 3-5
            "hybrid",           // work mode by name
            "",                 // keep Full-time
            "",                 // continue
            "Asha",
            "asha@example.com",
            "555-0100",
            "",     // continue
            "Rust", // resume line 1
            "Go",   // resume line 2
            "",     // end resume
            "",     // no linkedin
            "https://asha.dev",
            "", // get started
        ]
        .join("\n");
        let mut input = Cursor::new(format!("{script}\n"));
        let mut out = Vec::new();

        let profile = run_interactive(&mut input, &mut out).unwrap().unwrap();
        assert_eq!(profile.field, JobField::Other);
        assert_eq!(profile.field_label(), "Robotics");
        assert_eq!(profile.role, "Backend Engineer");
        assert_eq!(profile.experience, Experience::ThreeToFive);
        assert_eq!(profile.location, WorkLocation::Hybrid);
        assert_eq!(profile.job_type, JobType::FullTime);
        assert_eq!(profile.name, "Asha");
        assert_eq!(profile.resume_text, "Rust\nGo");
        assert_eq!(profile.linkedin_url, None);
        assert_eq!(profile.portfolio_url.as_deref(), Some("https://asha.dev"));

        let transcript = String::from_utf8(out).unwrap();
        assert!(transcript.contains("Step 4 of 4"));
        assert!(transcript.contains("Get Started"));
    }

    #[test]
    fn test_interactive_back_keeps_entries() {
        let script = [
            "",          // step 1: keep default field
            "",          // continue
            "Data Role", // step 2 role
            "", "", "",  // keep experience, mode, type
            "b",         // back to step 1
            "2",         // Data Analyst
            "",          // continue
            "", "", "", "", // step 2 again, keep everything
            "",          // continue
            "", "", "",  // step 3 blank
            "",          // continue
            "", "", "",  // step 4 blank resume, urls
            "",          // get started
        ]
        .join("\n");
        let mut input = Cursor::new(format!("{script}\n"));
        let mut out = Vec::new();

        let profile = run_interactive(&mut input, &mut out).unwrap().unwrap();
        assert_eq!(profile.field, JobField::DataAnalyst);
        assert_eq!(profile.role, "Data Role");
        assert_eq!(profile.name, "");
    }

    #[test]
    fn test_interactive_quit_and_eof_abandon() {
        let mut input = Cursor::new("\nq\n".to_string());
        let mut out = Vec::new();
        assert!(run_interactive(&mut input, &mut out).unwrap().is_none());

        let mut input = Cursor::new(String::new());
        assert!(run_interactive(&mut input, &mut out).unwrap().is_none());
    }
}
