use serde_json::json;

use crate::calc::{attendance_rate, class_analytics, student_stats};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{get_required_str, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::store::Roster;

fn analytics_student_open(
    roster: &Roster,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let student = roster
        .get(&student_id)
        .ok_or_else(|| HandlerErr::new("not_found", "student not found"))?;
    let stats = student_stats(&student.subjects);
    Ok(json!({
        "student": student,
        "stats": stats,
        "attendanceRate": attendance_rate(student)
    }))
}

fn analytics_class_open(roster: &Roster) -> Result<serde_json::Value, HandlerErr> {
    let analytics = class_analytics(roster.students());
    serde_json::to_value(analytics)
        .map_err(|e| HandlerErr::new("serialize_failed", e.to_string()))
}

fn dispatch(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(roster) = state.roster.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let result = match req.method.as_str() {
        "analytics.studentOpen" => analytics_student_open(roster, &req.params),
        "analytics.classOpen" => analytics_class_open(roster),
        _ => unreachable!("routed method"),
    };
    match result {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "analytics.studentOpen" | "analytics.classOpen" => Some(dispatch(state, req)),
        _ => None,
    }
}
