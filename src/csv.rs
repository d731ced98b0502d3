use serde::Serialize;

use crate::calc::{attendance_rate, student_stats};
use crate::model::{NewStudent, Student};

pub const EXPORT_HEADER: &str =
    "Name,Roll Number,Class,Email,Parent Contact,Total Marks,Percentage,GPA,Grade,Attendance Rate";

const TEMPLATE_HEADER: &str = "Name,Roll Number,Class,Email,Parent Contact";

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Splits one CSV record; commas inside quotes are kept, doubled quotes
/// unescape to one.
pub fn parse_csv_record(line: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut buf = String::new();
    let mut in_quotes = false;
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0usize;
    while i < chars.len() {
        let ch = chars[i];
        if ch == '"' {
            if in_quotes && i + 1 < chars.len() && chars[i + 1] == '"' {
                buf.push('"');
                i += 2;
                continue;
            }
            in_quotes = !in_quotes;
            i += 1;
            continue;
        }
        if ch == ',' && !in_quotes {
            out.push(buf);
            buf = String::new();
            i += 1;
            continue;
        }
        buf.push(ch);
        i += 1;
    }
    out.push(buf);
    out
}

/// Marks totals render the way the UI showed them: whole numbers bare,
/// fractional values as-is.
fn fmt_marks(n: f64) -> String {
    if n.is_finite() && n == n.trunc() {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

pub fn export_roster_csv(students: &[Student]) -> String {
    let mut csv = String::from(EXPORT_HEADER);
    csv.push('\n');
    for student in students {
        let stats = student_stats(&student.subjects);
        let has_subjects = !student.subjects.is_empty();
        let pct = if has_subjects {
            format!("{:.2}", stats.percentage)
        } else {
            "0".to_string()
        };
        let gpa = if has_subjects {
            format!("{:.2}", stats.gpa)
        } else {
            "0".to_string()
        };
        let rate = if student.attendance.is_empty() {
            "0".to_string()
        } else {
            format!("{:.1}", attendance_rate(student))
        };
        let fields = [
            student.name.clone(),
            student.roll_number.clone(),
            student.class_label.clone(),
            student.email.clone().unwrap_or_default(),
            student.parent_contact.clone().unwrap_or_default(),
            format!(
                "{}/{}",
                fmt_marks(stats.total_marks),
                fmt_marks(stats.max_possible_marks)
            ),
            format!("{}%", pct),
            gpa,
            stats.overall_grade.clone(),
            format!("{}%", rate),
        ];
        let row: Vec<String> = fields.iter().map(|f| quote(f)).collect();
        csv.push_str(&row.join(","));
        csv.push('\n');
    }
    csv
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub success: usize,
    pub errors: Vec<String>,
}

/// Validates raw CSV text into creatable students, best-effort per line.
///
/// Line numbers count non-blank lines with the header as line 1. A roll
/// number clashing with the roster (via `roll_taken`) or with a row
/// accepted earlier in the same batch is rejected. Nothing is applied
/// here; the caller commits the accepted rows in one batch.
pub fn parse_roster_csv<F>(text: &str, roll_taken: F) -> (Vec<NewStudent>, Vec<String>)
where
    F: Fn(&str) -> bool,
{
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.len() < 2 {
        return (Vec::new(), vec!["CSV file is empty or invalid".to_string()]);
    }

    let mut accepted: Vec<NewStudent> = Vec::new();
    let mut errors: Vec<String> = Vec::new();

    for (i, line) in lines[1..].iter().enumerate() {
        let line_no = i + 2;
        let fields: Vec<String> = parse_csv_record(line)
            .into_iter()
            .map(|f| f.trim().to_string())
            .collect();

        if fields.len() < 3 || fields[..3].iter().any(|f| f.is_empty()) {
            errors.push(format!("Line {}: Invalid format", line_no));
            continue;
        }
        let roll = fields[1].clone();
        if roll_taken(&roll) || accepted.iter().any(|s| s.roll_number == roll) {
            errors.push(format!(
                "Line {}: Roll number {} already exists",
                line_no, roll
            ));
            continue;
        }

        let optional = |idx: usize| -> Option<String> {
            fields
                .get(idx)
                .filter(|f| !f.is_empty())
                .map(|f| f.to_string())
        };
        accepted.push(NewStudent {
            name: fields[0].clone(),
            roll_number: roll,
            class_label: fields[2].clone(),
            email: optional(3),
            parent_contact: optional(4),
        });
    }

    (accepted, errors)
}

/// Import template: the five-column header plus two sample rows.
pub fn import_template_csv() -> String {
    let samples = [
        ["John Doe", "S001", "10th Grade", "john@example.com", "+1234567890"],
        ["Jane Smith", "S002", "10th Grade", "jane@example.com", "+1234567891"],
    ];
    let mut csv = String::from(TEMPLATE_HEADER);
    csv.push('\n');
    for row in samples {
        let quoted: Vec<String> = row.iter().map(|f| quote(f)).collect();
        csv.push_str(&quoted.join(","));
        csv.push('\n');
    }
    csv
}
