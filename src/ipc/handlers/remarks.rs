use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{get_required_str, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::model::RemarkKind;
use crate::store::Roster;

fn parse_kind(raw: &str) -> Result<RemarkKind, HandlerErr> {
    match raw {
        "positive" => Ok(RemarkKind::Positive),
        "negative" => Ok(RemarkKind::Negative),
        "neutral" => Ok(RemarkKind::Neutral),
        _ => Err(HandlerErr::bad_params(
            "type must be positive, negative or neutral",
        )),
    }
}

fn remarks_add(
    roster: &mut Roster,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let text = get_required_str(params, "text")?;
    if text.trim().is_empty() {
        return Err(HandlerErr::bad_params("text must be non-empty"));
    }
    let kind = parse_kind(&get_required_str(params, "type")?)?;
    let remark = roster.add_remark(&student_id, text, kind)?;
    Ok(json!({ "remark": remark }))
}

fn remarks_delete(
    roster: &mut Roster,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let remark_id = get_required_str(params, "remarkId")?;
    roster.delete_remark(&student_id, &remark_id)?;
    Ok(json!({ "ok": true }))
}

fn dispatch(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(roster) = state.roster.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let result = match req.method.as_str() {
        "remarks.add" => remarks_add(roster, &req.params),
        "remarks.delete" => remarks_delete(roster, &req.params),
        _ => unreachable!("routed method"),
    };
    match result {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "remarks.add" | "remarks.delete" => Some(dispatch(state, req)),
        _ => None,
    }
}
