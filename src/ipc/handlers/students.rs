use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{get_required_str, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::model::NewStudent;
use crate::store::{Roster, StudentPatch};

fn new_student_from_params(params: &serde_json::Value) -> Result<NewStudent, HandlerErr> {
    let name = get_required_str(params, "name")?;
    let roll_number = get_required_str(params, "rollNumber")?;
    let class_label = get_required_str(params, "class")?;
    if name.trim().is_empty() || roll_number.trim().is_empty() || class_label.trim().is_empty() {
        return Err(HandlerErr::bad_params(
            "name, rollNumber and class must be non-empty",
        ));
    }
    let optional = |key: &str| {
        params
            .get(key)
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.to_string())
    };
    Ok(NewStudent {
        name,
        roll_number,
        class_label,
        email: optional("email"),
        parent_contact: optional("parentContact"),
    })
}

/// Present-with-null clears the field; absent leaves it alone.
fn optional_field_patch(
    patch: &serde_json::Value,
    key: &str,
) -> Result<Option<Option<String>>, HandlerErr> {
    let Some(v) = patch.get(key) else {
        return Ok(None);
    };
    if v.is_null() {
        return Ok(Some(None));
    }
    match v.as_str() {
        Some(s) => Ok(Some(Some(s.to_string()))),
        None => Err(HandlerErr::bad_params(format!(
            "{} must be string or null",
            key
        ))),
    }
}

fn students_list(roster: &Roster) -> Result<serde_json::Value, HandlerErr> {
    Ok(json!({ "students": roster.students() }))
}

fn students_get(roster: &Roster, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let student = roster
        .get(&student_id)
        .ok_or_else(|| HandlerErr::new("not_found", "student not found"))?;
    Ok(json!({ "student": student }))
}

fn students_create(
    roster: &mut Roster,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let new = new_student_from_params(params)?;
    let student = roster.create_student(new)?;
    Ok(json!({ "studentId": student.id, "student": student }))
}

fn students_update(
    roster: &mut Roster,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let Some(patch_json) = params.get("patch") else {
        return Err(HandlerErr::bad_params("missing patch"));
    };
    let str_field = |key: &str| {
        patch_json
            .get(key)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    };
    // Roll numbers are only checked for uniqueness at creation and
    // import; an edit may introduce a collision.
    let patch = StudentPatch {
        name: str_field("name"),
        roll_number: str_field("rollNumber"),
        class_label: str_field("class"),
        email: optional_field_patch(patch_json, "email")?,
        parent_contact: optional_field_patch(patch_json, "parentContact")?,
    };
    let student = roster.update_student(&student_id, patch)?;
    Ok(json!({ "student": student }))
}

fn students_delete(
    roster: &mut Roster,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    roster.delete_student(&student_id)?;
    Ok(json!({ "ok": true }))
}

fn dispatch(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(roster) = state.roster.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let result = match req.method.as_str() {
        "students.list" => students_list(roster),
        "students.get" => students_get(roster, &req.params),
        "students.create" => students_create(roster, &req.params),
        "students.update" => students_update(roster, &req.params),
        "students.delete" => students_delete(roster, &req.params),
        _ => unreachable!("routed method"),
    };
    match result {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" | "students.get" | "students.create" | "students.update"
        | "students.delete" => Some(dispatch(state, req)),
        _ => None,
    }
}
