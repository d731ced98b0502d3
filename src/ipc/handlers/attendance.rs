use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{get_optional_str, get_required_str, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::model::{today_iso_date, AttendanceRecord, AttendanceStatus};
use crate::store::Roster;

fn parse_status(raw: &str) -> Result<AttendanceStatus, HandlerErr> {
    match raw {
        "present" => Ok(AttendanceStatus::Present),
        "absent" => Ok(AttendanceStatus::Absent),
        "late" => Ok(AttendanceStatus::Late),
        "excused" => Ok(AttendanceStatus::Excused),
        _ => Err(HandlerErr::bad_params(
            "status must be present, absent, late or excused",
        )),
    }
}

fn attendance_add(
    roster: &mut Roster,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let status = parse_status(&get_required_str(params, "status")?)?;
    // Marking events default to today; an explicit date stamps that day
    // instead. Duplicate entries on the same date are allowed.
    let date = get_optional_str(params, "date").unwrap_or_else(today_iso_date);
    let record = roster.add_attendance(&student_id, AttendanceRecord { date, status })?;
    Ok(json!({ "record": record }))
}

fn dispatch(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(roster) = state.roster.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match attendance_add(roster, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.add" => Some(dispatch(state, req)),
        _ => None,
    }
}
