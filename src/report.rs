use chrono::Utc;

use crate::calc::{student_stats, subject_percentage};
use crate::model::Student;

fn rule(ch: char, width: usize) -> String {
    std::iter::repeat(ch).take(width).collect()
}

fn generated_on() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Fixed-width performance report for one student.
pub fn student_report(student: &Student) -> String {
    let stats = student_stats(&student.subjects);

    let mut out = String::new();
    out.push_str("STUDENT PERFORMANCE REPORT\n");
    out.push_str(&rule('=', 60));
    out.push_str("\n\n");
    out.push_str(&format!("Student Name: {}\n", student.name));
    out.push_str(&format!("Roll Number: {}\n", student.roll_number));
    out.push_str(&format!("Class: {}\n", student.class_label));
    if let Some(email) = &student.email {
        out.push_str(&format!("Email: {}\n", email));
    }
    out.push('\n');

    out.push_str("OVERALL PERFORMANCE\n");
    out.push_str(&rule('-', 60));
    out.push('\n');
    out.push_str(&format!(
        "Total Marks: {}/{}\n",
        stats.total_marks, stats.max_possible_marks
    ));
    out.push_str(&format!("Percentage: {:.2}%\n", stats.percentage));
    out.push_str(&format!("GPA: {:.2}\n", stats.gpa));
    out.push_str(&format!("Overall Grade: {}\n", stats.overall_grade));
    out.push('\n');

    if !student.subjects.is_empty() {
        out.push_str("SUBJECT-WISE PERFORMANCE\n");
        out.push_str(&rule('-', 60));
        out.push('\n');
        out.push_str("Subject                    Marks    Max    %        Grade\n");
        out.push_str(&rule('-', 60));
        out.push('\n');
        for subject in &student.subjects {
            let pct = subject_percentage(subject);
            out.push_str(&format!(
                "{:<25}{:>5}{:>6}{:>7.2}%{:>5}\n",
                subject.subject_name, subject.marks, subject.max_marks, pct, subject.grade
            ));
        }
    }

    out.push('\n');
    out.push_str(&rule('-', 60));
    out.push('\n');
    out.push_str(&format!("Generated on: {}\n", generated_on()));
    out
}

/// One-paragraph-per-student summary of the whole roster.
pub fn roster_report(students: &[Student]) -> String {
    let mut out = String::new();
    out.push_str("ALL STUDENTS PERFORMANCE REPORT\n");
    out.push_str(&rule('=', 80));
    out.push_str("\n\n");
    out.push_str(&format!("Generated on: {}\n", generated_on()));
    out.push_str(&format!("Total Students: {}\n\n", students.len()));

    for (i, student) in students.iter().enumerate() {
        let stats = student_stats(&student.subjects);
        out.push_str(&format!("{}. {}\n", i + 1, student.name));
        out.push_str(&format!(
            "   Roll No: {} | Class: {}\n",
            student.roll_number, student.class_label
        ));
        out.push_str(&format!(
            "   Subjects: {} | Total: {}/{}\n",
            student.subjects.len(),
            stats.total_marks,
            stats.max_possible_marks
        ));
        out.push_str(&format!(
            "   Percentage: {:.2}% | GPA: {:.2} | Grade: {}\n\n",
            stats.percentage, stats.gpa, stats.overall_grade
        ));
    }

    out
}
