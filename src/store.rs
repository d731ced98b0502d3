use std::fmt;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::calc::refresh_subject_grade;
use crate::model::{
    now_rfc3339, AttendanceRecord, NewStudent, Remark, RemarkKind, Student, Subject,
};

pub const STORE_FILE: &str = "students.json";

/// Single-blob persistence seam. The roster never touches the
/// filesystem directly, which keeps the engines testable without one.
pub trait BlobPort {
    /// None when no blob has been written yet.
    fn read(&self) -> anyhow::Result<Option<String>>;
    fn write(&self, blob: &str) -> anyhow::Result<()>;
}

pub struct FileBlob {
    path: PathBuf,
}

impl FileBlob {
    pub fn in_workspace(workspace: &Path) -> anyhow::Result<FileBlob> {
        std::fs::create_dir_all(workspace)?;
        Ok(FileBlob {
            path: workspace.join(STORE_FILE),
        })
    }
}

impl BlobPort for FileBlob {
    fn read(&self) -> anyhow::Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, blob: &str) -> anyhow::Result<()> {
        std::fs::write(&self.path, blob)?;
        Ok(())
    }
}

#[derive(Debug)]
pub enum StoreError {
    StudentNotFound,
    SubjectNotFound,
    RemarkNotFound,
    DuplicateRollNumber(String),
    Persist(anyhow::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::StudentNotFound => write!(f, "student not found"),
            StoreError::SubjectNotFound => write!(f, "subject not found"),
            StoreError::RemarkNotFound => write!(f, "remark not found"),
            StoreError::DuplicateRollNumber(roll) => {
                write!(f, "roll number {} already exists", roll)
            }
            StoreError::Persist(e) => write!(f, "{}", e),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct StudentPatch {
    pub name: Option<String>,
    pub roll_number: Option<String>,
    pub class_label: Option<String>,
    /// Outer None = leave alone, inner None = clear.
    pub email: Option<Option<String>>,
    pub parent_contact: Option<Option<String>>,
}

#[derive(Debug, Default, Clone)]
pub struct SubjectPatch {
    pub subject_name: Option<String>,
    pub marks: Option<f64>,
    pub max_marks: Option<f64>,
}

/// In-memory roster backed by one serialized blob. Every mutation
/// rewrites the whole blob before the in-memory state is swapped, so a
/// failed write leaves both sides untouched.
pub struct Roster {
    port: Box<dyn BlobPort>,
    students: Vec<Student>,
}

impl Roster {
    /// A missing or unreadable blob degrades to an empty roster rather
    /// than failing the workspace open.
    pub fn open(port: Box<dyn BlobPort>) -> Roster {
        let students = match port.read() {
            Ok(Some(blob)) => serde_json::from_str(&blob).unwrap_or_default(),
            Ok(None) | Err(_) => Vec::new(),
        };
        Roster { port, students }
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn get(&self, id: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.id == id)
    }

    pub fn roll_number_taken(&self, roll: &str) -> bool {
        self.students.iter().any(|s| s.roll_number == roll)
    }

    fn commit(&mut self, students: Vec<Student>) -> Result<(), StoreError> {
        let blob = serde_json::to_string(&students)
            .map_err(|e| StoreError::Persist(e.into()))?;
        self.port.write(&blob).map_err(StoreError::Persist)?;
        self.students = students;
        Ok(())
    }

    /// Roll uniqueness is enforced here and on import only; edits via
    /// `update_student` may introduce collisions.
    pub fn create_student(&mut self, new: NewStudent) -> Result<Student, StoreError> {
        if self.roll_number_taken(&new.roll_number) {
            return Err(StoreError::DuplicateRollNumber(new.roll_number));
        }
        let student = Student::create(new);
        let mut next = self.students.clone();
        next.push(student.clone());
        self.commit(next)?;
        Ok(student)
    }

    pub fn update_student(
        &mut self,
        id: &str,
        patch: StudentPatch,
    ) -> Result<Student, StoreError> {
        let mut next = self.students.clone();
        let student = next
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(StoreError::StudentNotFound)?;
        if let Some(name) = patch.name {
            student.name = name;
        }
        if let Some(roll) = patch.roll_number {
            student.roll_number = roll;
        }
        if let Some(class_label) = patch.class_label {
            student.class_label = class_label;
        }
        if let Some(email) = patch.email {
            student.email = email;
        }
        if let Some(contact) = patch.parent_contact {
            student.parent_contact = contact;
        }
        student.touch();
        let updated = student.clone();
        self.commit(next)?;
        Ok(updated)
    }

    pub fn delete_student(&mut self, id: &str) -> Result<(), StoreError> {
        let mut next = self.students.clone();
        let before = next.len();
        next.retain(|s| s.id != id);
        if next.len() == before {
            return Err(StoreError::StudentNotFound);
        }
        self.commit(next)
    }

    pub fn add_subject(
        &mut self,
        student_id: &str,
        subject_name: String,
        marks: f64,
        max_marks: f64,
    ) -> Result<Subject, StoreError> {
        let mut next = self.students.clone();
        let student = next
            .iter_mut()
            .find(|s| s.id == student_id)
            .ok_or(StoreError::StudentNotFound)?;
        let mut subject = Subject {
            id: Uuid::new_v4().to_string(),
            subject_name,
            marks,
            max_marks,
            grade: String::new(),
        };
        refresh_subject_grade(&mut subject);
        student.subjects.push(subject.clone());
        student.touch();
        self.commit(next)?;
        Ok(subject)
    }

    pub fn update_subject(
        &mut self,
        student_id: &str,
        subject_id: &str,
        patch: SubjectPatch,
    ) -> Result<Subject, StoreError> {
        let mut next = self.students.clone();
        let student = next
            .iter_mut()
            .find(|s| s.id == student_id)
            .ok_or(StoreError::StudentNotFound)?;
        let subject = student
            .subjects
            .iter_mut()
            .find(|sub| sub.id == subject_id)
            .ok_or(StoreError::SubjectNotFound)?;
        if let Some(name) = patch.subject_name {
            subject.subject_name = name;
        }
        if let Some(marks) = patch.marks {
            subject.marks = marks;
        }
        if let Some(max_marks) = patch.max_marks {
            subject.max_marks = max_marks;
        }
        refresh_subject_grade(subject);
        let updated = subject.clone();
        student.touch();
        self.commit(next)?;
        Ok(updated)
    }

    pub fn delete_subject(
        &mut self,
        student_id: &str,
        subject_id: &str,
    ) -> Result<(), StoreError> {
        let mut next = self.students.clone();
        let student = next
            .iter_mut()
            .find(|s| s.id == student_id)
            .ok_or(StoreError::StudentNotFound)?;
        let before = student.subjects.len();
        student.subjects.retain(|sub| sub.id != subject_id);
        if student.subjects.len() == before {
            return Err(StoreError::SubjectNotFound);
        }
        student.touch();
        self.commit(next)
    }

    /// Append-only; a second record on the same date is kept, not merged.
    pub fn add_attendance(
        &mut self,
        student_id: &str,
        record: AttendanceRecord,
    ) -> Result<AttendanceRecord, StoreError> {
        let mut next = self.students.clone();
        let student = next
            .iter_mut()
            .find(|s| s.id == student_id)
            .ok_or(StoreError::StudentNotFound)?;
        student.attendance.push(record.clone());
        student.touch();
        self.commit(next)?;
        Ok(record)
    }

    pub fn add_remark(
        &mut self,
        student_id: &str,
        text: String,
        kind: RemarkKind,
    ) -> Result<Remark, StoreError> {
        let mut next = self.students.clone();
        let student = next
            .iter_mut()
            .find(|s| s.id == student_id)
            .ok_or(StoreError::StudentNotFound)?;
        let remark = Remark {
            id: Uuid::new_v4().to_string(),
            text,
            date: now_rfc3339(),
            kind,
        };
        student.remarks.push(remark.clone());
        student.touch();
        self.commit(next)?;
        Ok(remark)
    }

    pub fn delete_remark(
        &mut self,
        student_id: &str,
        remark_id: &str,
    ) -> Result<(), StoreError> {
        let mut next = self.students.clone();
        let student = next
            .iter_mut()
            .find(|s| s.id == student_id)
            .ok_or(StoreError::StudentNotFound)?;
        let before = student.remarks.len();
        student.remarks.retain(|r| r.id != remark_id);
        if student.remarks.len() == before {
            return Err(StoreError::RemarkNotFound);
        }
        student.touch();
        self.commit(next)
    }

    /// Commits every accepted row in one write. Callers validate rolls
    /// (against the roster and within the batch) before getting here.
    pub fn import_batch(&mut self, accepted: Vec<NewStudent>) -> Result<usize, StoreError> {
        if accepted.is_empty() {
            return Ok(0);
        }
        let count = accepted.len();
        let mut next = self.students.clone();
        next.extend(accepted.into_iter().map(Student::create));
        self.commit(next)?;
        Ok(count)
    }
}
