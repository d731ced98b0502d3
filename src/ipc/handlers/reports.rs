use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{get_required_str, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::report;
use crate::store::Roster;

fn student_report(
    roster: &Roster,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let student = roster
        .get(&student_id)
        .ok_or_else(|| HandlerErr::new("not_found", "student not found"))?;
    Ok(json!({ "text": report::student_report(student) }))
}

fn roster_report(roster: &Roster) -> Result<serde_json::Value, HandlerErr> {
    Ok(json!({ "text": report::roster_report(roster.students()) }))
}

fn dispatch(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(roster) = state.roster.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let result = match req.method.as_str() {
        "reports.studentReport" => student_report(roster, &req.params),
        "reports.rosterReport" => roster_report(roster),
        _ => unreachable!("routed method"),
    };
    match result {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "reports.studentReport" | "reports.rosterReport" => Some(dispatch(state, req)),
        _ => None,
    }
}
