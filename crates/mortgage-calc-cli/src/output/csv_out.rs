use serde_json::{Map, Value};
use std::io;

const SCHEDULE_COLUMNS: [&str; 6] = ["period", "date", "interest", "principal", "balance", "pmi"];

type StdoutWriter<'a> = csv::Writer<io::StdoutLock<'a>>;

/// Write output as CSV to stdout.
///
/// Calculator results are written as their amortization schedules, one row
/// per payment, with a leading `loan` column naming the schedule. Anything
/// without a schedule falls back to `field,value` rows.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value.as_object().and_then(|m| m.get("result"));
    match (result, value) {
        (Some(Value::Object(result)), _) => {
            let schedules = collect_schedules(result);
            if schedules.is_empty() {
                write_fields(&mut wtr, result);
            } else {
                write_schedules(&mut wtr, &schedules);
            }
        }
        (_, Value::Array(arr)) => write_array_csv(&mut wtr, arr),
        (_, Value::Object(map)) => write_fields(&mut wtr, map),
        _ => {
            let _ = wtr.write_record([format_csv_value(value)]);
        }
    }

    let _ = wtr.flush();
}

fn schedule_of(section: &Value) -> Option<&Vec<Value>> {
    section.get("amortization")?.get("schedule")?.as_array()
}

fn collect_schedules(result: &Map<String, Value>) -> Vec<(String, &Vec<Value>)> {
    let mut schedules = Vec::new();

    if let Some(schedule) = result.get("amortization").and_then(|a| a.get("schedule")) {
        if let Some(rows) = schedule.as_array() {
            schedules.push(("loan".to_string(), rows));
        }
    }

    if let Some(Value::Array(loans)) = result.get("loans") {
        for (i, loan) in loans.iter().enumerate() {
            if let Some(rows) = schedule_of(loan) {
                let label = loan
                    .get("label")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("offer_{}", i + 1));
                schedules.push((label, rows));
            }
        }
    }

    for section in ["current_loan", "refinance_loan"] {
        if let Some(rows) = result.get(section).and_then(schedule_of) {
            schedules.push((section.to_string(), rows));
        }
    }

    schedules
}

fn write_schedules(wtr: &mut StdoutWriter<'_>, schedules: &[(String, &Vec<Value>)]) {
    let mut header = vec!["loan"];
    header.extend(SCHEDULE_COLUMNS);
    let _ = wtr.write_record(&header);

    for (label, rows) in schedules {
        for row in rows.iter() {
            let mut record = vec![label.clone()];
            record.extend(
                SCHEDULE_COLUMNS
                    .iter()
                    .map(|c| row.get(*c).map(format_csv_value).unwrap_or_default()),
            );
            let _ = wtr.write_record(&record);
        }
    }
}

fn write_fields(wtr: &mut StdoutWriter<'_>, map: &Map<String, Value>) {
    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in map {
        let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
    }
}

fn write_array_csv(wtr: &mut StdoutWriter<'_>, arr: &[Value]) {
    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            let _ = wtr.write_record([format_csv_value(item)]);
        }
        return;
    };

    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    let _ = wtr.write_record(&headers);
    for item in arr {
        let row: Vec<String> = headers
            .iter()
            .map(|h| item.get(*h).map(format_csv_value).unwrap_or_default())
            .collect();
        let _ = wtr.write_record(&row);
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
