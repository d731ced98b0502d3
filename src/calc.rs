use crate::model::{
    AttendanceStatus, ClassAnalytics, GradeCount, ScorerRef, Student, StudentStats, Subject,
    SubjectAverage,
};

/// Fixed display order for grade buckets, best first.
pub const GRADE_RANK: [&str; 8] = ["A+", "A", "B+", "B", "C", "D", "F", "N/A"];

/// Closed, exhaustive bands; boundary values map to the higher band.
pub fn grade_for_percentage(pct: f64) -> &'static str {
    if pct >= 90.0 {
        "A+"
    } else if pct >= 80.0 {
        "A"
    } else if pct >= 70.0 {
        "B+"
    } else if pct >= 60.0 {
        "B"
    } else if pct >= 50.0 {
        "C"
    } else if pct >= 40.0 {
        "D"
    } else {
        "F"
    }
}

/// Unknown or absent grades carry no grade points.
pub fn gpa_for_grade(grade: &str) -> f64 {
    match grade {
        "A+" => 4.0,
        "A" => 3.7,
        "B+" => 3.3,
        "B" => 3.0,
        "C" => 2.7,
        "D" => 2.0,
        _ => 0.0,
    }
}

pub fn subject_percentage(subject: &Subject) -> f64 {
    if subject.max_marks > 0.0 {
        100.0 * subject.marks / subject.max_marks
    } else {
        0.0
    }
}

/// Normalization step for the derived grade field. Every Subject
/// create/update path must pass through here. Idempotent.
pub fn refresh_subject_grade(subject: &mut Subject) {
    subject.grade = grade_for_percentage(subject_percentage(subject)).to_string();
}

/// Aggregate statistics over one student's subject list.
///
/// Note the asymmetry: `overall_grade` comes from the aggregate
/// percentage, while `gpa` averages each subject's own stored grade, so
/// every subject's band weighs equally regardless of its max_marks.
pub fn student_stats(subjects: &[Subject]) -> StudentStats {
    if subjects.is_empty() {
        return StudentStats {
            total_marks: 0.0,
            max_possible_marks: 0.0,
            percentage: 0.0,
            average_marks: 0.0,
            gpa: 0.0,
            overall_grade: "N/A".to_string(),
        };
    }

    let total_marks: f64 = subjects.iter().map(|s| s.marks).sum();
    let max_possible_marks: f64 = subjects.iter().map(|s| s.max_marks).sum();
    let percentage = if max_possible_marks > 0.0 {
        100.0 * total_marks / max_possible_marks
    } else {
        0.0
    };
    let average_marks = total_marks / subjects.len() as f64;
    let total_gpa: f64 = subjects.iter().map(|s| gpa_for_grade(&s.grade)).sum();

    StudentStats {
        total_marks,
        max_possible_marks,
        percentage,
        average_marks,
        gpa: total_gpa / subjects.len() as f64,
        overall_grade: grade_for_percentage(percentage).to_string(),
    }
}

/// Roster-wide aggregates. Each student counts equally in the class
/// average, whatever their subject count. Scorer ties resolve to the
/// first student in roster order, for highest and lowest independently.
pub fn class_analytics(students: &[Student]) -> ClassAnalytics {
    if students.is_empty() {
        return ClassAnalytics {
            total_students: 0,
            class_average: 0.0,
            highest_scorer: None,
            lowest_scorer: None,
            subject_averages: Vec::new(),
            grade_distribution: Vec::new(),
        };
    }

    let stats: Vec<StudentStats> = students.iter().map(|s| student_stats(&s.subjects)).collect();

    let total_percentage: f64 = stats.iter().map(|st| st.percentage).sum();
    let class_average = total_percentage / students.len() as f64;

    let mut hi = 0usize;
    let mut lo = 0usize;
    for i in 1..students.len() {
        if stats[i].percentage > stats[hi].percentage {
            hi = i;
        }
        if stats[i].percentage < stats[lo].percentage {
            lo = i;
        }
    }
    let highest_scorer = Some(ScorerRef {
        name: students[hi].name.clone(),
        percentage: stats[hi].percentage,
    });
    let lowest_scorer = Some(ScorerRef {
        name: students[lo].name.clone(),
        percentage: stats[lo].percentage,
    });

    // Group by exact subject name, first-seen order.
    let mut groups: Vec<(String, f64, usize)> = Vec::new();
    for student in students {
        for subject in &student.subjects {
            let pct = subject_percentage(subject);
            match groups
                .iter_mut()
                .find(|(name, _, _)| *name == subject.subject_name)
            {
                Some((_, total, count)) => {
                    *total += pct;
                    *count += 1;
                }
                None => groups.push((subject.subject_name.clone(), pct, 1)),
            }
        }
    }
    let subject_averages = groups
        .into_iter()
        .map(|(subject, total, count)| SubjectAverage {
            subject,
            average: total / count as f64,
        })
        .collect();

    // Emitted in rank order; grades nobody earned are omitted.
    let grade_distribution = GRADE_RANK
        .iter()
        .filter_map(|grade| {
            let count = stats.iter().filter(|st| st.overall_grade == *grade).count();
            if count > 0 {
                Some(GradeCount {
                    grade: grade.to_string(),
                    count,
                })
            } else {
                None
            }
        })
        .collect();

    ClassAnalytics {
        total_students: students.len(),
        class_average,
        highest_scorer,
        lowest_scorer,
        subject_averages,
        grade_distribution,
    }
}

/// Share of attendance records marked present, as a percentage.
pub fn attendance_rate(student: &Student) -> f64 {
    if student.attendance.is_empty() {
        return 0.0;
    }
    let present = student
        .attendance
        .iter()
        .filter(|r| r.status == AttendanceStatus::Present)
        .count();
    100.0 * present as f64 / student.attendance.len() as f64
}
