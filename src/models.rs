use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobField {
    #[serde(rename = "Software Developer")]
    SoftwareDeveloper,
    #[serde(rename = "Data Analyst")]
    DataAnalyst,
    #[serde(rename = "Product Analyst")]
    ProductAnalyst,
    #[serde(rename = "Cyber Security")]
    CyberSecurity,
    #[serde(rename = "Digital Marketing")]
    DigitalMarketing,
    Finance,
    Sales,
    Teaching,
    Other,
}

impl JobField {
    pub const ALL: [JobField; 9] = [
        JobField::SoftwareDeveloper,
        JobField::DataAnalyst,
        JobField::ProductAnalyst,
        JobField::CyberSecurity,
        JobField::DigitalMarketing,
        JobField::Finance,
        JobField::Sales,
        JobField::Teaching,
        JobField::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobField::SoftwareDeveloper => "Software Developer",
            JobField::DataAnalyst => "Data Analyst",
            JobField::ProductAnalyst => "Product Analyst",
            JobField::CyberSecurity => "Cyber Security",
            JobField::DigitalMarketing => "Digital Marketing",
            JobField::Finance => "Finance",
            JobField::Sales => "Sales",
            JobField::Teaching => "Teaching",
            JobField::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Experience {
    Fresher,
    #[serde(rename = "1-3")]
    OneToThree,
    #[serde(rename = "3-5")]
    ThreeToFive,
    #[serde(rename = "5+")]
    FivePlus,
}

impl Experience {
    pub const ALL: [Experience; 4] = [
        Experience::Fresher,
        Experience::OneToThree,
        Experience::ThreeToFive,
        Experience::FivePlus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Experience::Fresher => "Fresher",
            Experience::OneToThree => "1-3",
            Experience::ThreeToFive => "3-5",
            Experience::FivePlus => "5+",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkLocation {
    Remote,
    #[serde(rename = "On-site")]
    OnSite,
    Hybrid,
}

impl WorkLocation {
    pub const ALL: [WorkLocation; 3] = [WorkLocation::Remote, WorkLocation::OnSite, WorkLocation::Hybrid];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkLocation::Remote => "Remote",
            WorkLocation::OnSite => "On-site",
            WorkLocation::Hybrid => "Hybrid",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobType {
    #[serde(rename = "Full-time")]
    FullTime,
    #[serde(rename = "Part-time")]
    PartTime,
    Internship,
    Contract,
}

impl JobType {
    pub const ALL: [JobType; 4] = [JobType::FullTime, JobType::PartTime, JobType::Internship, JobType::Contract];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::FullTime => "Full-time",
            JobType::PartTime => "Part-time",
            JobType::Internship => "Internship",
            JobType::Contract => "Contract",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub field: JobField,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_field: Option<String>, // only meaningful when field is Other
    pub role: String,
    pub experience: Experience,
    pub location: WorkLocation,
    pub job_type: JobType,
    pub email: String,
    pub phone: String,
    pub resume_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portfolio_url: Option<String>,
}

impl UserProfile {
    /// The field label shown to the user, preferring the free-text entry for "Other".
    pub fn field_label(&self) -> &str {
        match (&self.field, self.custom_field.as_deref()) {
            (JobField::Other, Some(custom)) if !custom.trim().is_empty() => custom,
            (field, _) => field.as_str(),
        }
    }

    pub fn initials(&self) -> String {
        let initials: String = self.name.chars().take(2).collect::<String>().to_uppercase();
        if initials.is_empty() {
            "JD".to_string()
        } else {
            initials
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    LinkedIn,
    Indeed,
    Naukri,
    Foundit,
    CareerPage,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::LinkedIn,
        Platform::Indeed,
        Platform::Naukri,
        Platform::Foundit,
        Platform::CareerPage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::LinkedIn => "LinkedIn",
            Platform::Indeed => "Indeed",
            Platform::Naukri => "Naukri",
            Platform::Foundit => "Foundit",
            Platform::CareerPage => "CareerPage",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationStatus {
    Applied,
    Shortlisted,
    #[serde(rename = "In Review")]
    InReview,
    Rejected,
    #[serde(rename = "Interview Scheduled")]
    InterviewScheduled,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "Applied",
            ApplicationStatus::Shortlisted => "Shortlisted",
            ApplicationStatus::InReview => "In Review",
            ApplicationStatus::Rejected => "Rejected",
            ApplicationStatus::InterviewScheduled => "Interview Scheduled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobApplication {
    pub id: String,
    pub company_name: String,
    pub role: String,
    pub platform: Platform,
    pub status: ApplicationStatus,
    pub applied_date: String, // display string, e.g. "Just now"
    pub match_score: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterviewType {
    #[serde(rename = "HR")]
    Hr,
    Technical,
    Final,
}

impl InterviewType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewType::Hr => "HR",
            InterviewType::Technical => "Technical",
            InterviewType::Final => "Final",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interview {
    pub id: String,
    pub company_name: String,
    pub role: String,
    pub date: String,
    pub time: String,
    #[serde(rename = "type")]
    pub interview_type: InterviewType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tips: Option<Vec<String>>,
}

/// Interviews present at startup.
pub fn seed_interviews() -> Vec<Interview> {
    vec![Interview {
        id: "1".to_string(),
        company_name: "Stripe".to_string(),
        role: "Frontend Engineer".to_string(),
        date: "Oct 15, 2024".to_string(),
        time: "10:00 AM".to_string(),
        interview_type: InterviewType::Technical,
        tips: Some(vec![
            "Focus on React performance".to_string(),
            "Explain state management patterns".to_string(),
            "Review CSS architecture".to_string(),
        ]),
    }]
}

macro_rules! display_via_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_via_as_str!(JobField, Experience, WorkLocation, JobType, Platform, ApplicationStatus, InterviewType);

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_profile() -> UserProfile {
        UserProfile {
            name: "Asha Rao".to_string(),
            field: JobField::SoftwareDeveloper,
            custom_field: None,
            role: "Backend Engineer".to_string(),
            experience: Experience::ThreeToFive,
            location: WorkLocation::Hybrid,
            job_type: JobType::FullTime,
            email: "asha@example.com".to_string(),
            phone: "555-0100".to_string(),
            resume_text: "Rust, Go, Postgres".to_string(),
            linkedin_url: None,
            portfolio_url: None,
        }
    }

    #[test]
    fn test_profile_serializes_with_source_field_names() {
        let json = serde_json::to_value(sample_profile()).unwrap();
        assert_eq!(json["jobType"], "Full-time");
        assert_eq!(json["experience"], "3-5");
        assert_eq!(json["field"], "Software Developer");
        assert_eq!(json["resumeText"], "Rust, Go, Postgres");
        assert!(json.get("linkedinUrl").is_none());
    }

    #[test]
    fn test_profile_parses_stored_json() {
        let raw = r#"{"name":"Li","field":"Other","customField":"Robotics","role":"","experience":"5+",
            "location":"On-site","jobType":"Contract","email":"","phone":"","resumeText":""}"#;
        let profile: UserProfile = serde_json::from_str(raw).unwrap();
        assert_eq!(profile.field_label(), "Robotics");
        assert_eq!(profile.location, WorkLocation::OnSite);
        assert_eq!(profile.experience, Experience::FivePlus);
    }

    #[test]
    fn test_initials() {
        assert_eq!(sample_profile().initials(), "AS");
        let mut anon = sample_profile();
        anon.name.clear();
        assert_eq!(anon.initials(), "JD");
    }

    #[test]
    fn test_interview_type_serializes_as_type() {
        let json = serde_json::to_value(&seed_interviews()[0]).unwrap();
        assert_eq!(json["type"], "Technical");
        assert_eq!(json["companyName"], "Stripe");
        assert_eq!(json["tips"].as_array().map(|t| t.len()), Some(3));
    }

    #[test]
    fn test_status_display() {
        assert_eq!(ApplicationStatus::InReview.to_string(), "In Review");
        assert_eq!(Platform::CareerPage.to_string(), "CareerPage");
    }
}
