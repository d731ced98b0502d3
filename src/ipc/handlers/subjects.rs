use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{get_required_f64, get_required_str, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::store::{Roster, SubjectPatch};

fn subjects_add(
    roster: &mut Roster,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let subject_name = get_required_str(params, "subjectName")?;
    if subject_name.trim().is_empty() {
        return Err(HandlerErr::bad_params("subjectName must be non-empty"));
    }
    let marks = get_required_f64(params, "marks")?;
    let max_marks = get_required_f64(params, "maxMarks")?;
    if marks < 0.0 {
        return Err(HandlerErr::bad_params("marks must be non-negative"));
    }
    if max_marks <= 0.0 {
        return Err(HandlerErr::bad_params("maxMarks must be positive"));
    }
    let subject = roster.add_subject(&student_id, subject_name, marks, max_marks)?;
    Ok(json!({ "subject": subject }))
}

fn subjects_update(
    roster: &mut Roster,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let subject_id = get_required_str(params, "subjectId")?;
    let Some(patch_json) = params.get("patch") else {
        return Err(HandlerErr::bad_params("missing patch"));
    };
    let marks = patch_json.get("marks").and_then(|v| v.as_f64());
    let max_marks = patch_json.get("maxMarks").and_then(|v| v.as_f64());
    if let Some(m) = marks {
        if m < 0.0 {
            return Err(HandlerErr::bad_params("marks must be non-negative"));
        }
    }
    if let Some(m) = max_marks {
        if m <= 0.0 {
            return Err(HandlerErr::bad_params("maxMarks must be positive"));
        }
    }
    let patch = SubjectPatch {
        subject_name: patch_json
            .get("subjectName")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()),
        marks,
        max_marks,
    };
    // The store re-derives the letter grade on every update.
    let subject = roster.update_subject(&student_id, &subject_id, patch)?;
    Ok(json!({ "subject": subject }))
}

fn subjects_delete(
    roster: &mut Roster,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let subject_id = get_required_str(params, "subjectId")?;
    roster.delete_subject(&student_id, &subject_id)?;
    Ok(json!({ "ok": true }))
}

fn dispatch(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(roster) = state.roster.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let result = match req.method.as_str() {
        "subjects.add" => subjects_add(roster, &req.params),
        "subjects.update" => subjects_update(roster, &req.params),
        "subjects.delete" => subjects_delete(roster, &req.params),
        _ => unreachable!("routed method"),
    };
    match result {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "subjects.add" | "subjects.update" | "subjects.delete" => Some(dispatch(state, req)),
        _ => None,
    }
}
