use serde_json::json;

use crate::csv;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{get_optional_str, get_required_str, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::store::Roster;

fn exchange_export_csv(
    roster: &Roster,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let out_path = get_required_str(params, "outPath")?;
    let text = csv::export_roster_csv(roster.students());
    std::fs::write(&out_path, &text).map_err(|e| HandlerErr {
        code: "io_failed",
        message: e.to_string(),
        details: Some(json!({ "outPath": out_path })),
    })?;
    Ok(json!({
        "outPath": out_path,
        "rowCount": roster.students().len()
    }))
}

fn exchange_import_csv(
    roster: &mut Roster,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let in_path = get_required_str(params, "inPath")?;

    // An unreadable file is a one-entry error report, not a failure of
    // the request itself.
    let text = match std::fs::read_to_string(&in_path) {
        Ok(t) => t,
        Err(e) => {
            let report = csv::ImportReport {
                success: 0,
                errors: vec![format!("Failed to read file: {}", e)],
            };
            return serde_json::to_value(report)
                .map_err(|e| HandlerErr::new("serialize_failed", e.to_string()));
        }
    };

    let (accepted, mut errors) =
        csv::parse_roster_csv(&text, |roll| roster.roll_number_taken(roll));
    let success = match roster.import_batch(accepted) {
        Ok(n) => n,
        Err(e) => {
            // The batch commits atomically; a failed write applies none
            // of the accepted rows.
            errors.push(e.to_string());
            0
        }
    };
    let report = csv::ImportReport { success, errors };
    serde_json::to_value(report).map_err(|e| HandlerErr::new("serialize_failed", e.to_string()))
}

fn exchange_csv_template(params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let text = csv::import_template_csv();
    if let Some(out_path) = get_optional_str(params, "outPath") {
        std::fs::write(&out_path, &text).map_err(|e| HandlerErr {
            code: "io_failed",
            message: e.to_string(),
            details: Some(json!({ "outPath": out_path })),
        })?;
    }
    Ok(json!({ "csv": text }))
}

fn dispatch(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(roster) = state.roster.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let result = match req.method.as_str() {
        "exchange.exportCsv" => exchange_export_csv(roster, &req.params),
        "exchange.importCsv" => exchange_import_csv(roster, &req.params),
        "exchange.csvTemplate" => exchange_csv_template(&req.params),
        _ => unreachable!("routed method"),
    };
    match result {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "exchange.exportCsv" | "exchange.importCsv" | "exchange.csvTemplate" => {
            Some(dispatch(state, req))
        }
        _ => None,
    }
}
