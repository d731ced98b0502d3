use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Excused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemarkKind {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub subject_name: String,
    pub marks: f64,
    pub max_marks: f64,
    /// Derived letter grade. Re-normalized on every create/update so it
    /// never drifts from marks/max_marks. Older blobs may omit it.
    #[serde(default)]
    pub grade: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub date: String,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Remark {
    pub id: String,
    pub text: String,
    pub date: String,
    #[serde(rename = "type")]
    pub kind: RemarkKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    pub roll_number: String,
    #[serde(rename = "class")]
    pub class_label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_contact: Option<String>,
    #[serde(default)]
    pub subjects: Vec<Subject>,
    // Blobs written by older versions may lack these two arrays.
    #[serde(default)]
    pub attendance: Vec<AttendanceRecord>,
    #[serde(default)]
    pub remarks: Vec<Remark>,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields needed to create a student; everything else starts empty.
#[derive(Debug, Clone)]
pub struct NewStudent {
    pub name: String,
    pub roll_number: String,
    pub class_label: String,
    pub email: Option<String>,
    pub parent_contact: Option<String>,
}

impl Student {
    pub fn create(new: NewStudent) -> Student {
        let now = now_rfc3339();
        Student {
            id: Uuid::new_v4().to_string(),
            name: new.name,
            roll_number: new.roll_number,
            class_label: new.class_label,
            email: new.email,
            parent_contact: new.parent_contact,
            subjects: Vec::new(),
            attendance: Vec::new(),
            remarks: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = now_rfc3339();
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentStats {
    pub total_marks: f64,
    pub max_possible_marks: f64,
    pub percentage: f64,
    pub average_marks: f64,
    pub gpa: f64,
    pub overall_grade: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorerRef {
    pub name: String,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectAverage {
    pub subject: String,
    pub average: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeCount {
    pub grade: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassAnalytics {
    pub total_students: usize,
    pub class_average: f64,
    pub highest_scorer: Option<ScorerRef>,
    pub lowest_scorer: Option<ScorerRef>,
    pub subject_averages: Vec<SubjectAverage>,
    pub grade_distribution: Vec<GradeCount>,
}

pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

pub fn today_iso_date() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}
